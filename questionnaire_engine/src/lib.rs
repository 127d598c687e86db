mod actions;
mod builder;
pub mod language;
pub mod mode;
mod model;
pub mod store;
pub mod translation;
pub mod validation;

use log::debug;

pub use crate::actions::*;
pub use crate::builder::*;
pub use crate::model::*;

/// Applies one edit action to a questionnaire document.
///
/// This is a pure function: the input document is never modified, and
/// the same `(document, action)` pair always produces the same result.
/// User-input validity is not checked here (invalid intermediate
/// states are stored as-is and reported by [`validation::validate`]);
/// the only errors are invariant violations such as an action
/// referencing a step id that is in neither step collection.
pub fn apply(doc: &Questionnaire, action: &Action) -> Result<Questionnaire, EditError> {
    debug!("apply: {:?}", action);
    match action {
        Action::ChangeName { new_name } => Ok(change_name(doc, new_name)),
        Action::SetActiveMode { mode } => Ok(set_active_mode(doc, *mode)),
        Action::AddMode { mode } => Ok(add_mode(doc, *mode)),
        Action::RemoveMode { mode } => Ok(remove_mode(doc, *mode)),
        Action::ToggleQuotaCompletedSteps => Ok(toggle_quota_completed_steps(doc)),
        Action::AddLanguage { language } => Ok(add_language(doc, language)),
        Action::RemoveLanguage { language } => Ok(remove_language(doc, language)),
        Action::SetDefaultLanguage { language } => Ok(set_default_language(doc, language)),
        Action::SetActiveLanguage { language } => Ok(set_active_language(doc, language)),
        Action::ReorderLanguages { language, index } => Ok(reorder_languages(doc, language, *index)),
        Action::SetSmsQuestionnaireMsg { msg_key, text } => {
            Ok(set_questionnaire_msg(doc, *msg_key, |p| {
                p.sms = text.trim().to_string();
            }))
        }
        Action::SetIvrQuestionnaireMsg {
            msg_key,
            text,
            audio_source,
            audio_id,
        } => Ok(set_questionnaire_msg(doc, *msg_key, |p| {
            p.ivr = IvrPrompt {
                text: text.trim().to_string(),
                audio_source: *audio_source,
                audio_id: audio_id.clone(),
            };
        })),
        Action::SetMobileWebQuestionnaireMsg { msg_key, text } => {
            Ok(set_questionnaire_msg(doc, *msg_key, |p| {
                p.mobileweb = text.trim().to_string();
            }))
        }
        Action::AutocompleteSmsQuestionnaireMsg { msg_key, item } => {
            Ok(autocomplete_sms_questionnaire_msg(doc, *msg_key, item))
        }
        Action::AutocompleteIvrQuestionnaireMsg { msg_key, item } => {
            Ok(autocomplete_ivr_questionnaire_msg(doc, *msg_key, item))
        }
        Action::UploadTranslation { rows } => Ok(translation::apply_rows(doc, rows)),
        Action::SetMobileWebSmsMessage { text } => {
            let mut new_doc = doc.clone();
            new_doc.settings.mobile_web_sms_message = text.clone();
            Ok(new_doc)
        }
        Action::SetMobileWebSurveyIsOverMessage { text } => {
            let mut new_doc = doc.clone();
            new_doc.settings.mobile_web_survey_is_over_message = text.clone();
            Ok(new_doc)
        }
        Action::SetPrimaryColor { color } => {
            let mut new_doc = doc.clone();
            new_doc.settings.mobile_web_color_style.primary_color = Some(color.clone());
            Ok(new_doc)
        }
        Action::SetSecondaryColor { color } => {
            let mut new_doc = doc.clone();
            new_doc.settings.mobile_web_color_style.secondary_color = Some(color.clone());
            Ok(new_doc)
        }
        Action::SetDisplayedTitle { msg } => {
            let mut new_doc = doc.clone();
            let lang = new_doc.active_language.clone();
            new_doc.settings.title.insert(lang, msg.clone());
            Ok(new_doc)
        }
        Action::SetSurveyAlreadyTakenMessage { msg } => {
            let mut new_doc = doc.clone();
            let lang = new_doc.active_language.clone();
            new_doc
                .settings
                .survey_already_taken_message
                .insert(lang, msg.clone());
            Ok(new_doc)
        }
        Action::AddStep => Ok(add_step(doc)),
        Action::AddQuotaCompletedStep => add_quota_completed_step(doc),
        Action::MoveStep {
            source_step_id,
            target_step_id,
        } => Ok(move_step(doc, source_step_id, target_step_id)),
        Action::MoveStepToTop { step_id } => move_step_to_top(doc, step_id),
        Action::ChangeStepTitle { step_id, new_title } => change_step(doc, step_id, |step| {
            with_title(step, new_title.trim())
        }),
        Action::ChangeStepType { step_id, step_type } => {
            change_step(doc, step_id, |step| change_step_type(step, *step_type))
        }
        Action::ChangeStepPromptSms { step_id, new_prompt } => {
            let lang = doc.active_language.clone();
            change_step(doc, step_id, |step| {
                set_step_prompt(step, &lang, |p| {
                    p.sms = new_prompt.trim().to_string();
                })
            })
        }
        Action::ChangeStepPromptIvr {
            step_id,
            text,
            audio_source,
        } => {
            let lang = doc.active_language.clone();
            change_step(doc, step_id, |step| {
                set_step_prompt(step, &lang, |p| {
                    p.ivr.text = text.trim().to_string();
                    p.ivr.audio_source = *audio_source;
                })
            })
        }
        Action::ChangeStepPromptMobileWeb { step_id, new_prompt } => {
            let lang = doc.active_language.clone();
            change_step(doc, step_id, |step| {
                set_step_prompt(step, &lang, |p| {
                    p.mobileweb = new_prompt.trim().to_string();
                })
            })
        }
        Action::ChangeStepAudioIdIvr { step_id, new_id } => {
            let lang = doc.active_language.clone();
            change_step(doc, step_id, |step| {
                set_step_prompt(step, &lang, |p| {
                    p.ivr.audio_id = Some(new_id.clone());
                    p.ivr.audio_source = AudioSource::Upload;
                })
            })
        }
        Action::ChangeStepStore { step_id, new_store } => change_step(doc, step_id, |step| {
            with_store(step, new_store.trim())
        }),
        Action::AutocompleteStepPromptSms { step_id, item } => {
            let default_lang = doc.default_language.clone();
            change_step(doc, step_id, |step| {
                autocomplete_step_sms_prompt(step, &default_lang, item)
            })
        }
        Action::AutocompleteStepPromptIvr { step_id, item } => {
            let default_lang = doc.default_language.clone();
            change_step(doc, step_id, |step| {
                autocomplete_step_ivr_prompt(step, &default_lang, item)
            })
        }
        Action::DeleteStep { step_id } => delete_step(doc, step_id),
        Action::AddChoice { step_id } => change_step(doc, step_id, |step| {
            with_choices(step, |choices| choices.push(new_choice()))
        }),
        Action::DeleteChoice { step_id, index } => {
            let index = *index;
            change_step(doc, step_id, |step| {
                with_choices(step, |choices| {
                    if index < choices.len() {
                        choices.remove(index);
                    }
                })
            })
        }
        Action::ChangeChoice {
            step_id,
            choice_change,
        } => change_choice(doc, step_id, choice_change),
        Action::AutocompleteChoiceSmsValues {
            step_id,
            index,
            item,
        } => {
            let default_lang = doc.default_language.clone();
            let index = *index;
            change_step(doc, step_id, |step| {
                with_choices(step, |choices| {
                    if let Some(choice) = choices.get_mut(index) {
                        autocomplete_choice_sms_values(choice, &default_lang, item);
                    }
                })
            })
        }
        Action::ChangeNumericRanges {
            step_id,
            min_value,
            max_value,
            ranges_delimiters,
        } => change_step(doc, step_id, |step| {
            change_numeric_ranges(step, *min_value, *max_value, ranges_delimiters.clone())
        }),
        Action::ChangeRangeSkipLogic {
            step_id,
            range_index,
            skip_logic,
        } => {
            let range_index = *range_index;
            change_step(doc, step_id, |step| {
                let mut new_step = step.clone();
                if let Step::Numeric { ranges, .. } = &mut new_step {
                    if let Some(range) = ranges.get_mut(range_index) {
                        range.skip_logic = skip_logic.clone();
                    }
                }
                new_step
            })
        }
        Action::ChangeExplanationStepSkipLogic {
            step_id,
            skip_logic,
        } => change_step(doc, step_id, |step| {
            let mut new_step = step.clone();
            match &mut new_step {
                Step::Explanation { skip_logic: sl, .. } => *sl = skip_logic.clone(),
                Step::Flag { skip_logic: sl, .. } => *sl = skip_logic.clone(),
                _ => {}
            }
            new_step
        }),
        Action::ChangeDisposition {
            step_id,
            disposition,
        } => change_step(doc, step_id, |step| {
            let mut new_step = step.clone();
            if let Step::Flag {
                disposition: d, ..
            } = &mut new_step
            {
                *d = *disposition;
            }
            new_step
        }),
        Action::ToggleAcceptRefusals { step_id } => change_step(doc, step_id, |step| {
            let mut new_step = step.clone();
            if let Step::Numeric { refusal, .. } = &mut new_step {
                refusal.enabled = !refusal.enabled;
            }
            new_step
        }),
        Action::ToggleAcceptsAlphabeticalAnswers { step_id } => {
            change_step(doc, step_id, |step| {
                let mut new_step = step.clone();
                if let Step::Numeric {
                    alphabetical_answers,
                    ..
                } = &mut new_step
                {
                    *alphabetical_answers = !*alphabetical_answers;
                }
                new_step
            })
        }
        Action::ChangeRefusal {
            step_id,
            sms_values,
            ivr_values,
            mobileweb_values,
            skip_logic,
        } => {
            let lang = doc.active_language.clone();
            change_step(doc, step_id, |step| {
                let mut new_step = step.clone();
                if let Step::Numeric { refusal, .. } = &mut new_step {
                    refusal.responses.ivr = split_values(ivr_values);
                    refusal
                        .responses
                        .sms
                        .insert(lang.clone(), split_values(sms_values));
                    refusal
                        .responses
                        .mobileweb
                        .insert(lang.clone(), mobileweb_values.clone());
                    refusal.skip_logic = skip_logic.clone();
                }
                new_step
            })
        }
        Action::SetDirty => Ok(doc.clone()),
    }
}

// ******** Step addressing *********

/// Locates `step_id` in whichever of the two step collections contains
/// it and replaces that single element with `func(step)`. The step id
/// being in neither collection is a programming error of the caller.
fn change_step<F>(doc: &Questionnaire, step_id: &str, func: F) -> Result<Questionnaire, EditError>
where
    F: FnOnce(&Step) -> Step,
{
    let mut new_doc = doc.clone();

    if let Some(idx) = new_doc.steps.iter().position(|s| s.id() == step_id) {
        new_doc.steps[idx] = func(&new_doc.steps[idx]);
        return Ok(new_doc);
    }

    if let Some(quota_steps) = new_doc.quota_completed_steps.as_mut() {
        if let Some(idx) = quota_steps.iter().position(|s| s.id() == step_id) {
            quota_steps[idx] = func(&quota_steps[idx]);
            return Ok(new_doc);
        }
    }

    Err(EditError::StepNotFound(step_id.to_string()))
}

/// Relocates the source step right after the target step, scoped to
/// whichever collection contains both. A source and target living in
/// different collections is reachable through an ordinary drag gesture
/// and is deliberately a no-op.
fn move_step(doc: &Questionnaire, source_step_id: &str, target_step_id: &str) -> Questionnaire {
    fn relocate(steps: &[Step], source_id: &str, target_id: &str) -> Option<Vec<Step>> {
        let moved = steps.iter().find(|s| s.id() == source_id)?.clone();
        steps.iter().find(|s| s.id() == target_id)?;
        let mut out: Vec<Step> = Vec::with_capacity(steps.len());
        for step in steps {
            if step.id() != source_id {
                out.push(step.clone());
            }
            if step.id() == target_id {
                out.push(moved.clone());
            }
        }
        Some(out)
    }

    if let Some(new_steps) = relocate(&doc.steps, source_step_id, target_step_id) {
        let mut new_doc = doc.clone();
        new_doc.steps = new_steps;
        return new_doc;
    }

    if let Some(quota_steps) = &doc.quota_completed_steps {
        if let Some(new_steps) = relocate(quota_steps, source_step_id, target_step_id) {
            let mut new_doc = doc.clone();
            new_doc.quota_completed_steps = Some(new_steps);
            return new_doc;
        }
    }

    doc.clone()
}

fn move_step_to_top(doc: &Questionnaire, step_id: &str) -> Result<Questionnaire, EditError> {
    fn to_top(steps: &[Step], step_id: &str) -> Option<Vec<Step>> {
        let moved = steps.iter().find(|s| s.id() == step_id)?.clone();
        let mut out = vec![moved];
        out.extend(steps.iter().filter(|s| s.id() != step_id).cloned());
        Some(out)
    }

    if let Some(new_steps) = to_top(&doc.steps, step_id) {
        let mut new_doc = doc.clone();
        new_doc.steps = new_steps;
        return Ok(new_doc);
    }

    if let Some(quota_steps) = &doc.quota_completed_steps {
        if let Some(new_steps) = to_top(quota_steps, step_id) {
            let mut new_doc = doc.clone();
            new_doc.quota_completed_steps = Some(new_steps);
            return Ok(new_doc);
        }
    }

    Err(EditError::StepNotFound(step_id.to_string()))
}

fn delete_step(doc: &Questionnaire, step_id: &str) -> Result<Questionnaire, EditError> {
    if doc.steps.iter().any(|s| s.id() == step_id) {
        let mut new_doc = doc.clone();
        new_doc.steps.retain(|s| s.id() != step_id);
        return Ok(new_doc);
    }

    if let Some(quota_steps) = &doc.quota_completed_steps {
        if quota_steps.iter().any(|s| s.id() == step_id) {
            let mut new_doc = doc.clone();
            if let Some(quota_steps) = new_doc.quota_completed_steps.as_mut() {
                quota_steps.retain(|s| s.id() != step_id);
            }
            return Ok(new_doc);
        }
    }

    Err(EditError::StepNotFound(step_id.to_string()))
}

// ******** Name, modes, languages *********

fn change_name(doc: &Questionnaire, new_name: &str) -> Questionnaire {
    let mut new_doc = doc.clone();
    new_doc.name = new_name.trim().to_string();
    new_doc
}

fn set_active_mode(doc: &Questionnaire, mode: Mode) -> Questionnaire {
    let mut new_doc = doc.clone();
    new_doc.active_mode = Some(mode);
    new_doc
}

fn add_mode(doc: &Questionnaire, mode: Mode) -> Questionnaire {
    if doc.modes.contains(&mode) {
        return doc.clone();
    }
    let mut new_doc = doc.clone();
    if new_doc.modes.is_empty() {
        new_doc.active_mode = Some(mode);
    }
    new_doc.modes.push(mode);
    new_doc
}

fn remove_mode(doc: &Questionnaire, mode: Mode) -> Questionnaire {
    let mut new_doc = doc.clone();
    new_doc.modes.retain(|m| *m != mode);
    if new_doc.active_mode == Some(mode) {
        new_doc.active_mode = mode::default_active_mode(&new_doc.modes);
    }
    new_doc
}

fn add_language(doc: &Questionnaire, language: &str) -> Questionnaire {
    if doc.languages.iter().any(|l| l == language) {
        return doc.clone();
    }
    let mut new_doc = doc.clone();
    if new_doc.languages.len() == 1 {
        let selection = new_language_selection_step(&new_doc.languages[0], language);
        new_doc.steps.insert(0, selection);
    } else if let Some(Step::LanguageSelection {
        language_choices, ..
    }) = new_doc.steps.first_mut()
    {
        language_choices.push(language.to_string());
    }
    new_doc.languages.push(language.to_string());
    new_doc
}

fn remove_language(doc: &Questionnaire, language: &str) -> Questionnaire {
    let index_to_delete = match doc.languages.iter().position(|l| l == language) {
        Some(idx) => idx,
        None => return doc.clone(),
    };
    let mut new_doc = doc.clone();
    new_doc.languages.remove(index_to_delete);

    if let Some(Step::LanguageSelection {
        language_choices, ..
    }) = new_doc.steps.first_mut()
    {
        language_choices.retain(|l| l != language);
    }

    // Once a single language remains the language-selection step
    // (always the first one) goes away as well.
    if new_doc.languages.len() == 1 && doc.languages.len() > 1 {
        new_doc.steps.remove(0);
    }

    if new_doc.active_language == language {
        new_doc.active_language = new_doc.default_language.clone();
    }
    new_doc
}

fn set_default_language(doc: &Questionnaire, language: &str) -> Questionnaire {
    let mut new_doc = doc.clone();
    new_doc.default_language = language.to_string();
    new_doc.active_language = language.to_string();
    new_doc
}

fn set_active_language(doc: &Questionnaire, language: &str) -> Questionnaire {
    let mut new_doc = doc.clone();
    new_doc.active_language = language.to_string();
    new_doc
}

fn reorder_languages(doc: &Questionnaire, language: &str, index: usize) -> Questionnaire {
    let mut new_doc = doc.clone();
    if let Some(Step::LanguageSelection {
        language_choices, ..
    }) = new_doc.steps.first_mut()
    {
        if let Some(pos) = language_choices.iter().position(|l| l == language) {
            language_choices.remove(pos);
            let insert_at = index.saturating_sub(1).min(language_choices.len());
            language_choices.insert(insert_at, language.to_string());
        }
    }
    new_doc
}

// ******** Quota-completed section and steps *********

fn toggle_quota_completed_steps(doc: &Questionnaire) -> Questionnaire {
    let mut new_doc = doc.clone();
    new_doc.quota_completed_steps = match doc.quota_completed_steps {
        Some(_) => None,
        None => Some(vec![new_explanation_step()]),
    };
    new_doc
}

fn add_step(doc: &Questionnaire) -> Questionnaire {
    let mut new_doc = doc.clone();
    new_doc.steps.push(new_multiple_choice_step());
    new_doc
}

fn add_quota_completed_step(doc: &Questionnaire) -> Result<Questionnaire, EditError> {
    let mut new_doc = doc.clone();
    match new_doc.quota_completed_steps.as_mut() {
        Some(steps) => {
            steps.push(new_multiple_choice_step());
            Ok(new_doc)
        }
        None => Err(EditError::MissingQuotaCompletedSteps),
    }
}

// ******** Step field edits *********

fn with_title(step: &Step, new_title: &str) -> Step {
    let mut new_step = step.clone();
    match &mut new_step {
        Step::MultipleChoice { title, .. } => *title = new_title.to_string(),
        Step::Numeric { title, .. } => *title = new_title.to_string(),
        Step::Explanation { title, .. } => *title = new_title.to_string(),
        Step::Flag { title, .. } => *title = new_title.to_string(),
        Step::LanguageSelection { title, .. } => *title = new_title.to_string(),
    }
    new_step
}

fn with_store(step: &Step, new_store: &str) -> Step {
    let mut new_step = step.clone();
    match &mut new_step {
        Step::MultipleChoice { store, .. } => *store = new_store.to_string(),
        Step::Numeric { store, .. } => *store = new_store.to_string(),
        Step::LanguageSelection { store, .. } => *store = new_store.to_string(),
        Step::Explanation { .. } | Step::Flag { .. } => {}
    }
    new_step
}

fn with_choices<F>(step: &Step, func: F) -> Step
where
    F: FnOnce(&mut Vec<Choice>),
{
    let mut new_step = step.clone();
    if let Step::MultipleChoice { choices, .. } = &mut new_step {
        func(choices);
    }
    new_step
}

/// Rebuilds a step as a new variant. This is a destructive migration:
/// the title always survives; store and prompt survive only between
/// the variants that carry them (multiple-choice and numeric keep
/// both, explanation keeps the prompt); everything else is reset. The
/// exact preservation rules are kept as the product defined them, not
/// generalized.
fn change_step_type(step: &Step, step_type: StepType) -> Step {
    let id = step.id().to_string();
    let title = step.title().to_string();

    let carried = match step {
        Step::MultipleChoice { store, prompt, .. } | Step::Numeric { store, prompt, .. } => {
            Some((store.clone(), prompt.clone()))
        }
        _ => None,
    };

    match step_type {
        StepType::MultipleChoice => {
            let (store, prompt) = carried.unwrap_or_default();
            Step::MultipleChoice {
                id,
                title,
                store,
                prompt,
                choices: vec![],
            }
        }
        StepType::Numeric => {
            let (store, prompt) = carried.unwrap_or_default();
            Step::Numeric {
                id,
                title,
                store,
                prompt,
                min_value: None,
                max_value: None,
                ranges_delimiters: None,
                ranges: vec![Range {
                    from: None,
                    to: None,
                    skip_logic: None,
                }],
                refusal: new_refusal(),
                alphabetical_answers: false,
            }
        }
        StepType::Explanation => {
            let prompt = carried.map(|(_, p)| p).unwrap_or_default();
            Step::Explanation {
                id,
                title,
                prompt,
                skip_logic: None,
            }
        }
        StepType::Flag => Step::Flag {
            id,
            title,
            disposition: Disposition::InterimPartial,
            skip_logic: None,
        },
    }
}

// ******** Choices *********

fn change_choice(
    doc: &Questionnaire,
    step_id: &str,
    change: &ChoiceChange,
) -> Result<Questionnaire, EditError> {
    let response = change.response.trim().to_string();
    let mut sms_values = change.sms_values.trim().to_string();
    let mut ivr_values = change.ivr_values.trim().to_string();
    let mut mobileweb_values = change.mobileweb_values.trim().to_string();

    if change.auto_complete && sms_values.is_empty() && ivr_values.is_empty() {
        let (sms, ivr, mobileweb) = auto_complete_responses(doc, &response);
        sms_values = sms;
        ivr_values = ivr;
        mobileweb_values = mobileweb;
    }

    let lang = doc.active_language.clone();
    let index = change.index;
    let skip_logic = change.skip_logic.clone();
    change_step(doc, step_id, |step| {
        with_choices(step, |choices| {
            if let Some(choice) = choices.get_mut(index) {
                choice.value = response;
                choice.responses.ivr = split_values(&ivr_values);
                choice
                    .responses
                    .sms
                    .insert(lang.clone(), split_values(&sms_values));
                choice
                    .responses
                    .mobileweb
                    .insert(lang.clone(), mobileweb_values);
                choice.skip_logic = skip_logic;
            }
        })
    })
}

/// Copies SMS/IVR/mobile-web response values from the first choice in
/// the main step sequence whose `value` matches `value` exactly. This
/// is a convenience so duplicate answer options across steps do not
/// have to be re-keyed.
fn auto_complete_responses(doc: &Questionnaire, value: &str) -> (String, String, String) {
    for step in &doc.steps {
        if let Step::MultipleChoice { choices, .. } = step {
            for choice in choices {
                if choice.value == value {
                    let sms = choice
                        .responses
                        .sms
                        .get(&doc.active_language)
                        .map(|rs| rs.join(","))
                        .unwrap_or_default();
                    let ivr = choice.responses.ivr.join(",");
                    let mobileweb = choice
                        .responses
                        .mobileweb
                        .get(&doc.active_language)
                        .cloned()
                        .unwrap_or_default();
                    return (sms, ivr, mobileweb);
                }
            }
        }
    }
    (String::new(), String::new(), String::new())
}

fn autocomplete_choice_sms_values(choice: &mut Choice, default_lang: &str, item: &TranslationItem) {
    // The default language is always overwritten.
    choice
        .responses
        .sms
        .insert(default_lang.to_string(), split_values(&item.text));

    // Other languages are only filled in when still empty.
    for translation in &item.translations {
        let lang = match &translation.language {
            Some(l) => l,
            None => continue,
        };
        let current_empty = choice
            .responses
            .sms
            .get(lang)
            .map(|rs| rs.is_empty())
            .unwrap_or(true);
        if current_empty {
            choice
                .responses
                .sms
                .insert(lang.clone(), split_values(&translation.text));
        }
    }
}

// ******** Prompt autocomplete *********

fn autocomplete_step_sms_prompt(step: &Step, default_lang: &str, item: &TranslationItem) -> Step {
    let mut new_step = set_step_prompt(step, default_lang, |p| {
        p.sms = item.text.trim().to_string();
    });

    for translation in &item.translations {
        let lang = match &translation.language {
            Some(l) => l,
            None => continue,
        };
        let current = new_step
            .prompt()
            .map(|p| prompt_sms(p, lang))
            .unwrap_or_default();
        if current.is_empty() {
            new_step = set_step_prompt(&new_step, lang, |p| {
                p.sms = translation.text.trim().to_string();
            });
        }
    }

    new_step
}

fn autocomplete_step_ivr_prompt(step: &Step, default_lang: &str, item: &TranslationItem) -> Step {
    let mut new_step = set_step_prompt(step, default_lang, |p| {
        p.ivr.text = item.text.trim().to_string();
    });

    for translation in &item.translations {
        let lang = match &translation.language {
            Some(l) => l,
            None => continue,
        };
        let current = new_step
            .prompt()
            .map(|p| prompt_ivr_text(p, lang))
            .unwrap_or_default();
        if current.is_empty() {
            new_step = set_step_prompt(&new_step, lang, |p| {
                p.ivr.text = translation.text.trim().to_string();
            });
        }
    }

    new_step
}

// ******** Questionnaire-level messages *********

fn questionnaire_msg_mut<'a>(settings: &'a mut Settings, msg_key: MsgKey) -> &'a mut LocalizedPrompt {
    match msg_key {
        MsgKey::ErrorMessage => &mut settings.error_message,
        MsgKey::ThankYouMessage => &mut settings.thank_you_message,
    }
}

fn set_questionnaire_msg<F>(doc: &Questionnaire, msg_key: MsgKey, func: F) -> Questionnaire
where
    F: FnOnce(&mut Prompt),
{
    let mut new_doc = doc.clone();
    let lang = new_doc.active_language.clone();
    let msg = questionnaire_msg_mut(&mut new_doc.settings, msg_key);
    set_prompt(msg, &lang, func);
    new_doc
}

fn autocomplete_sms_questionnaire_msg(
    doc: &Questionnaire,
    msg_key: MsgKey,
    item: &TranslationItem,
) -> Questionnaire {
    let mut new_doc = doc.clone();
    let default_lang = new_doc.default_language.clone();
    let msg = questionnaire_msg_mut(&mut new_doc.settings, msg_key);

    set_prompt(msg, &default_lang, |p| {
        p.sms = item.text.trim().to_string();
    });

    for translation in &item.translations {
        let lang = match &translation.language {
            Some(l) => l,
            None => continue,
        };
        if prompt_sms(msg, lang).is_empty() {
            set_prompt(msg, lang, |p| {
                p.sms = translation.text.trim().to_string();
            });
        }
    }

    new_doc
}

fn autocomplete_ivr_questionnaire_msg(
    doc: &Questionnaire,
    msg_key: MsgKey,
    item: &TranslationItem,
) -> Questionnaire {
    let mut new_doc = doc.clone();
    let default_lang = new_doc.default_language.clone();
    let msg = questionnaire_msg_mut(&mut new_doc.settings, msg_key);

    set_prompt(msg, &default_lang, |p| {
        p.ivr.text = item.text.trim().to_string();
    });

    for translation in &item.translations {
        let lang = match &translation.language {
            Some(l) => l,
            None => continue,
        };
        if prompt_ivr_text(msg, lang).is_empty() {
            set_prompt(msg, lang, |p| {
                p.ivr.text = translation.text.trim().to_string();
            });
        }
    }

    new_doc
}

// ******** Numeric ranges *********

/// Stores the new min/max/delimiters and, when all provided boundaries
/// parse and strictly increase, derives the contiguous range list. On
/// any parse failure or a non-monotonic sequence the raw inputs are
/// still stored but the previous `ranges` are kept untouched, so the
/// user never loses keystrokes while typing an intermediate value.
fn change_numeric_ranges(
    step: &Step,
    min_value: Option<i64>,
    max_value: Option<i64>,
    ranges_delimiters: Option<String>,
) -> Step {
    let mut values: Vec<i64> = Vec::new();
    let mut parse_ok = true;
    if let Some(min) = min_value {
        values.push(min);
    }
    if let Some(delimiters) = ranges_delimiters.as_deref().filter(|d| !d.is_empty()) {
        for delimiter in delimiters.split(',') {
            match delimiter.trim().parse::<i64>() {
                Ok(v) => values.push(v),
                Err(_) => parse_ok = false,
            }
        }
    }
    if let Some(max) = max_value {
        values.push(max);
    }

    let monotonic = values.windows(2).all(|w| w[0] < w[1]);

    let mut new_step = step.clone();
    if let Step::Numeric {
        min_value: step_min,
        max_value: step_max,
        ranges_delimiters: step_delimiters,
        ranges: step_ranges,
        ..
    } = &mut new_step
    {
        *step_min = min_value;
        *step_max = max_value;
        *step_delimiters = ranges_delimiters;

        if parse_ok && monotonic {
            // The lower bound of each range: an implicit open bound
            // comes first when no minimum was given, and the last
            // boundary is dropped when an explicit maximum closes the
            // final range.
            let mut froms: Vec<Option<i64>> = values.iter().map(|v| Some(*v)).collect();
            if min_value.is_none() {
                froms.insert(0, None);
            }
            if max_value.is_some() {
                froms.pop();
            }

            let old_ranges = std::mem::take(step_ranges);
            let mut ranges: Vec<Range> = Vec::with_capacity(froms.len());
            for (i, from) in froms.iter().enumerate() {
                let to = if i == froms.len() - 1 {
                    max_value
                } else {
                    froms[i + 1].map(|next_from| next_from - 1)
                };
                // Keep the skip logic of a range whose bounds did not
                // change.
                let prev = old_ranges
                    .iter()
                    .find(|r| r.from == *from && r.to == to)
                    .cloned();
                ranges.push(prev.unwrap_or(Range {
                    from: *from,
                    to,
                    skip_logic: None,
                }));
            }
            *step_ranges = ranges;
        }
    }
    new_step
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_step() -> (Questionnaire, String) {
        let doc = new_questionnaire(1);
        let step_id = doc.steps[0].id().to_string();
        (doc, step_id)
    }

    fn numeric_step(doc: &Questionnaire, step_id: &str) -> Questionnaire {
        apply(
            doc,
            &Action::ChangeStepType {
                step_id: step_id.to_string(),
                step_type: StepType::Numeric,
            },
        )
        .unwrap()
    }

    #[test]
    fn change_name_trims() {
        let (doc, _) = doc_with_step();
        let doc = apply(
            &doc,
            &Action::ChangeName {
                new_name: "  my survey  ".to_string(),
            },
        )
        .unwrap();
        assert_eq!(doc.name, "my survey");
    }

    #[test]
    fn second_language_creates_the_selection_step() {
        let (doc, _) = doc_with_step();
        let doc = apply(
            &doc,
            &Action::AddLanguage {
                language: "es".to_string(),
            },
        )
        .unwrap();
        assert_eq!(doc.languages, vec!["en", "es"]);
        match &doc.steps[0] {
            Step::LanguageSelection {
                language_choices, ..
            } => assert_eq!(language_choices, &vec!["en", "es"]),
            other => panic!("expected a language-selection step, got {:?}", other),
        }

        // A third language goes to the existing selection step.
        let doc = apply(
            &doc,
            &Action::AddLanguage {
                language: "fr".to_string(),
            },
        )
        .unwrap();
        match &doc.steps[0] {
            Step::LanguageSelection {
                language_choices, ..
            } => assert_eq!(language_choices, &vec!["en", "es", "fr"]),
            other => panic!("expected a language-selection step, got {:?}", other),
        }
    }

    #[test]
    fn adding_an_existing_language_is_a_no_op() {
        let (doc, _) = doc_with_step();
        let doc2 = apply(
            &doc,
            &Action::AddLanguage {
                language: "en".to_string(),
            },
        )
        .unwrap();
        assert_eq!(doc2, doc);
    }

    #[test]
    fn add_then_remove_language_restores_the_document_shape() {
        let (doc, _) = doc_with_step();
        let step_count = doc.steps.len();
        let doc = apply(
            &doc,
            &Action::AddLanguage {
                language: "es".to_string(),
            },
        )
        .unwrap();
        let doc = apply(
            &doc,
            &Action::RemoveLanguage {
                language: "es".to_string(),
            },
        )
        .unwrap();
        assert_eq!(doc.languages, vec!["en"]);
        assert_eq!(doc.steps.len(), step_count);
        assert!(!matches!(doc.steps[0], Step::LanguageSelection { .. }));
    }

    #[test]
    fn removing_the_active_language_falls_back_to_the_default() {
        let (doc, _) = doc_with_step();
        let doc = apply(
            &doc,
            &Action::AddLanguage {
                language: "es".to_string(),
            },
        )
        .unwrap();
        let doc = apply(
            &doc,
            &Action::SetActiveLanguage {
                language: "es".to_string(),
            },
        )
        .unwrap();
        let doc = apply(
            &doc,
            &Action::RemoveLanguage {
                language: "es".to_string(),
            },
        )
        .unwrap();
        assert_eq!(doc.active_language, "en");
        assert!(doc.languages.contains(&doc.default_language));
        assert!(doc.languages.contains(&doc.active_language));
    }

    #[test]
    fn set_default_language_also_sets_the_active_one() {
        let (doc, _) = doc_with_step();
        let doc = apply(
            &doc,
            &Action::AddLanguage {
                language: "es".to_string(),
            },
        )
        .unwrap();
        let doc = apply(
            &doc,
            &Action::SetDefaultLanguage {
                language: "es".to_string(),
            },
        )
        .unwrap();
        assert_eq!(doc.default_language, "es");
        assert_eq!(doc.active_language, "es");
    }

    #[test]
    fn reorder_languages_moves_within_the_selection_step() {
        let (doc, _) = doc_with_step();
        let mut doc = doc;
        for lang in ["es", "fr"] {
            doc = apply(
                &doc,
                &Action::AddLanguage {
                    language: lang.to_string(),
                },
            )
            .unwrap();
        }
        let doc = apply(
            &doc,
            &Action::ReorderLanguages {
                language: "fr".to_string(),
                index: 1,
            },
        )
        .unwrap();
        match &doc.steps[0] {
            Step::LanguageSelection {
                language_choices, ..
            } => assert_eq!(language_choices, &vec!["fr", "en", "es"]),
            other => panic!("expected a language-selection step, got {:?}", other),
        }
    }

    #[test]
    fn removing_the_active_mode_picks_a_new_one() {
        let (doc, _) = doc_with_step();
        assert_eq!(doc.active_mode, Some(Mode::Sms));
        let doc = apply(&doc, &Action::RemoveMode { mode: Mode::Sms }).unwrap();
        assert_eq!(doc.active_mode, Some(Mode::Ivr));
        let doc = apply(&doc, &Action::RemoveMode { mode: Mode::Ivr }).unwrap();
        assert_eq!(doc.active_mode, None);
        let doc = apply(&doc, &Action::AddMode { mode: Mode::MobileWeb }).unwrap();
        assert_eq!(doc.active_mode, Some(Mode::MobileWeb));
    }

    #[test]
    fn toggle_quota_completed_steps_seeds_an_explanation_step() {
        let (doc, _) = doc_with_step();
        assert!(apply(&doc, &Action::AddQuotaCompletedStep).is_err());

        let doc = apply(&doc, &Action::ToggleQuotaCompletedSteps).unwrap();
        let quota_steps = doc.quota_completed_steps.as_ref().unwrap();
        assert_eq!(quota_steps.len(), 1);
        assert!(matches!(quota_steps[0], Step::Explanation { .. }));

        let doc = apply(&doc, &Action::AddQuotaCompletedStep).unwrap();
        assert_eq!(doc.quota_completed_steps.as_ref().unwrap().len(), 2);

        let doc = apply(&doc, &Action::ToggleQuotaCompletedSteps).unwrap();
        assert!(doc.quota_completed_steps.is_none());
    }

    #[test]
    fn delete_step_with_unknown_id_is_fatal() {
        let (doc, _) = doc_with_step();
        let res = apply(
            &doc,
            &Action::DeleteStep {
                step_id: "nope".to_string(),
            },
        );
        assert_eq!(res, Err(EditError::StepNotFound("nope".to_string())));
    }

    #[test]
    fn delete_step_removes_from_either_collection() {
        let (doc, step_id) = doc_with_step();
        let doc = apply(&doc, &Action::ToggleQuotaCompletedSteps).unwrap();
        let quota_id = doc.quota_completed_steps.as_ref().unwrap()[0]
            .id()
            .to_string();

        let doc = apply(&doc, &Action::DeleteStep { step_id }).unwrap();
        assert!(doc.steps.is_empty());

        let doc = apply(&doc, &Action::DeleteStep { step_id: quota_id }).unwrap();
        assert!(doc.quota_completed_steps.as_ref().unwrap().is_empty());
    }

    #[test]
    fn move_step_relocates_after_the_target() {
        let (doc, first_id) = doc_with_step();
        let doc = apply(&doc, &Action::AddStep).unwrap();
        let doc = apply(&doc, &Action::AddStep).unwrap();
        let second_id = doc.steps[1].id().to_string();
        let third_id = doc.steps[2].id().to_string();

        let doc = apply(
            &doc,
            &Action::MoveStep {
                source_step_id: first_id.clone(),
                target_step_id: third_id.clone(),
            },
        )
        .unwrap();
        let order: Vec<&str> = doc.steps.iter().map(|s| s.id()).collect();
        assert_eq!(order, vec![&second_id, &third_id, &first_id]);
    }

    #[test]
    fn cross_collection_move_is_a_silent_no_op() {
        let (doc, step_id) = doc_with_step();
        let doc = apply(&doc, &Action::ToggleQuotaCompletedSteps).unwrap();
        let quota_id = doc.quota_completed_steps.as_ref().unwrap()[0]
            .id()
            .to_string();
        let moved = apply(
            &doc,
            &Action::MoveStep {
                source_step_id: step_id,
                target_step_id: quota_id,
            },
        )
        .unwrap();
        assert_eq!(moved, doc);
    }

    #[test]
    fn move_step_to_top_requires_a_known_id() {
        let (doc, step_id) = doc_with_step();
        let doc = apply(&doc, &Action::AddStep).unwrap();
        let last_id = doc.steps[1].id().to_string();
        let doc = apply(
            &doc,
            &Action::MoveStepToTop {
                step_id: last_id.clone(),
            },
        )
        .unwrap();
        assert_eq!(doc.steps[0].id(), last_id);
        assert_eq!(doc.steps[1].id(), step_id);

        assert!(apply(
            &doc,
            &Action::MoveStepToTop {
                step_id: "nope".to_string()
            }
        )
        .is_err());
    }

    #[test]
    fn change_step_type_keeps_store_and_prompt_between_value_steps() {
        let (doc, step_id) = doc_with_step();
        let doc = apply(
            &doc,
            &Action::ChangeStepStore {
                step_id: step_id.clone(),
                new_store: "smokes".to_string(),
            },
        )
        .unwrap();
        let doc = apply(
            &doc,
            &Action::ChangeStepPromptSms {
                step_id: step_id.clone(),
                new_prompt: "Do you smoke?".to_string(),
            },
        )
        .unwrap();

        let doc = numeric_step(&doc, &step_id);
        match &doc.steps[0] {
            Step::Numeric {
                store,
                prompt,
                ranges,
                ..
            } => {
                assert_eq!(store, "smokes");
                assert_eq!(prompt_sms(prompt, "en"), "Do you smoke?");
                assert_eq!(ranges.len(), 1);
            }
            other => panic!("expected a numeric step, got {:?}", other),
        }

        // Explanation keeps the prompt but loses the store.
        let doc = apply(
            &doc,
            &Action::ChangeStepType {
                step_id: step_id.clone(),
                step_type: StepType::Explanation,
            },
        )
        .unwrap();
        match &doc.steps[0] {
            Step::Explanation { prompt, .. } => {
                assert_eq!(prompt_sms(prompt, "en"), "Do you smoke?");
            }
            other => panic!("expected an explanation step, got {:?}", other),
        }

        // Coming back from explanation, the store and prompt are gone.
        let doc = apply(
            &doc,
            &Action::ChangeStepType {
                step_id: step_id.clone(),
                step_type: StepType::MultipleChoice,
            },
        )
        .unwrap();
        match &doc.steps[0] {
            Step::MultipleChoice { store, prompt, .. } => {
                assert_eq!(store, "");
                assert!(prompt.is_empty());
            }
            other => panic!("expected a multiple-choice step, got {:?}", other),
        }
    }

    #[test]
    fn change_step_type_to_flag_keeps_only_the_title() {
        let (doc, step_id) = doc_with_step();
        let doc = apply(
            &doc,
            &Action::ChangeStepTitle {
                step_id: step_id.clone(),
                new_title: "Smoking".to_string(),
            },
        )
        .unwrap();
        let doc = apply(
            &doc,
            &Action::ChangeStepType {
                step_id,
                step_type: StepType::Flag,
            },
        )
        .unwrap();
        match &doc.steps[0] {
            Step::Flag {
                title, disposition, ..
            } => {
                assert_eq!(title, "Smoking");
                assert_eq!(*disposition, Disposition::InterimPartial);
            }
            other => panic!("expected a flag step, got {:?}", other),
        }
    }

    #[test]
    fn change_choice_trims_and_splits_responses() {
        let (doc, step_id) = doc_with_step();
        let doc = apply(&doc, &Action::AddChoice { step_id: step_id.clone() }).unwrap();
        let doc = apply(
            &doc,
            &Action::ChangeChoice {
                step_id: step_id.clone(),
                choice_change: ChoiceChange {
                    index: 0,
                    response: " Yes ".to_string(),
                    sms_values: " Y, 1 ".to_string(),
                    ivr_values: "1".to_string(),
                    mobileweb_values: " Yes ".to_string(),
                    skip_logic: Some("end".to_string()),
                    auto_complete: false,
                },
            },
        )
        .unwrap();
        match &doc.steps[0] {
            Step::MultipleChoice { choices, .. } => {
                let choice = &choices[0];
                assert_eq!(choice.value, "Yes");
                assert_eq!(choice.responses.sms.get("en").unwrap(), &vec!["Y", "1"]);
                assert_eq!(choice.responses.ivr, vec!["1"]);
                assert_eq!(choice.responses.mobileweb.get("en").unwrap(), "Yes");
                assert_eq!(choice.skip_logic, Some("end".to_string()));
            }
            other => panic!("expected a multiple-choice step, got {:?}", other),
        }
    }

    #[test]
    fn change_choice_autocompletes_from_a_matching_value() {
        let (doc, first_id) = doc_with_step();
        let doc = apply(&doc, &Action::AddChoice { step_id: first_id.clone() }).unwrap();
        let doc = apply(
            &doc,
            &Action::ChangeChoice {
                step_id: first_id,
                choice_change: ChoiceChange {
                    index: 0,
                    response: "Yes".to_string(),
                    sms_values: "Y, 1".to_string(),
                    ivr_values: "1".to_string(),
                    mobileweb_values: "Yes".to_string(),
                    skip_logic: None,
                    auto_complete: false,
                },
            },
        )
        .unwrap();

        let doc = apply(&doc, &Action::AddStep).unwrap();
        let second_id = doc.steps[1].id().to_string();
        let doc = apply(&doc, &Action::AddChoice { step_id: second_id.clone() }).unwrap();
        let doc = apply(
            &doc,
            &Action::ChangeChoice {
                step_id: second_id,
                choice_change: ChoiceChange {
                    index: 0,
                    response: "Yes".to_string(),
                    sms_values: "".to_string(),
                    ivr_values: "".to_string(),
                    mobileweb_values: "".to_string(),
                    skip_logic: None,
                    auto_complete: true,
                },
            },
        )
        .unwrap();
        match &doc.steps[1] {
            Step::MultipleChoice { choices, .. } => {
                let choice = &choices[0];
                assert_eq!(choice.responses.sms.get("en").unwrap(), &vec!["Y", "1"]);
                assert_eq!(choice.responses.ivr, vec!["1"]);
                assert_eq!(choice.responses.mobileweb.get("en").unwrap(), "Yes");
            }
            other => panic!("expected a multiple-choice step, got {:?}", other),
        }
    }

    #[test]
    fn change_choice_autocomplete_needs_an_exact_value_match() {
        let (doc, first_id) = doc_with_step();
        let doc = apply(&doc, &Action::AddChoice { step_id: first_id.clone() }).unwrap();
        let doc = apply(
            &doc,
            &Action::ChangeChoice {
                step_id: first_id.clone(),
                choice_change: ChoiceChange {
                    index: 0,
                    response: "Yes".to_string(),
                    sms_values: "Y".to_string(),
                    ivr_values: "1".to_string(),
                    mobileweb_values: "Yes".to_string(),
                    skip_logic: None,
                    auto_complete: false,
                },
            },
        )
        .unwrap();

        let doc = apply(&doc, &Action::AddStep).unwrap();
        let second_id = doc.steps[1].id().to_string();
        let doc = apply(&doc, &Action::AddChoice { step_id: second_id.clone() }).unwrap();
        // "yes" does not match "Yes": the copy is case-sensitive.
        let doc = apply(
            &doc,
            &Action::ChangeChoice {
                step_id: second_id,
                choice_change: ChoiceChange {
                    index: 0,
                    response: "yes".to_string(),
                    sms_values: "".to_string(),
                    ivr_values: "".to_string(),
                    mobileweb_values: "".to_string(),
                    skip_logic: None,
                    auto_complete: true,
                },
            },
        )
        .unwrap();
        match &doc.steps[1] {
            Step::MultipleChoice { choices, .. } => {
                assert!(choices[0].responses.sms.get("en").unwrap().is_empty());
                assert!(choices[0].responses.ivr.is_empty());
            }
            other => panic!("expected a multiple-choice step, got {:?}", other),
        }
    }

    #[test]
    fn numeric_ranges_are_derived_from_the_delimiters() {
        let (doc, step_id) = doc_with_step();
        let doc = numeric_step(&doc, &step_id);
        let doc = apply(
            &doc,
            &Action::ChangeNumericRanges {
                step_id,
                min_value: Some(0),
                max_value: Some(100),
                ranges_delimiters: Some("30,60".to_string()),
            },
        )
        .unwrap();
        match &doc.steps[0] {
            Step::Numeric { ranges, .. } => {
                let bounds: Vec<(Option<i64>, Option<i64>)> =
                    ranges.iter().map(|r| (r.from, r.to)).collect();
                assert_eq!(
                    bounds,
                    vec![
                        (Some(0), Some(29)),
                        (Some(30), Some(59)),
                        (Some(60), Some(100))
                    ]
                );
            }
            other => panic!("expected a numeric step, got {:?}", other),
        }
    }

    #[test]
    fn open_bounds_appear_only_at_the_extremes() {
        let (doc, step_id) = doc_with_step();
        let doc = numeric_step(&doc, &step_id);
        let doc = apply(
            &doc,
            &Action::ChangeNumericRanges {
                step_id,
                min_value: None,
                max_value: None,
                ranges_delimiters: Some("10,20".to_string()),
            },
        )
        .unwrap();
        match &doc.steps[0] {
            Step::Numeric { ranges, .. } => {
                let bounds: Vec<(Option<i64>, Option<i64>)> =
                    ranges.iter().map(|r| (r.from, r.to)).collect();
                assert_eq!(
                    bounds,
                    vec![(None, Some(9)), (Some(10), Some(19)), (Some(20), None)]
                );
            }
            other => panic!("expected a numeric step, got {:?}", other),
        }
    }

    #[test]
    fn non_monotonic_input_keeps_the_previous_ranges() {
        let (doc, step_id) = doc_with_step();
        let doc = numeric_step(&doc, &step_id);
        let doc = apply(
            &doc,
            &Action::ChangeNumericRanges {
                step_id: step_id.clone(),
                min_value: Some(0),
                max_value: Some(100),
                ranges_delimiters: Some("30,60".to_string()),
            },
        )
        .unwrap();
        let doc = apply(
            &doc,
            &Action::ChangeNumericRanges {
                step_id,
                min_value: Some(50),
                max_value: Some(100),
                ranges_delimiters: Some("10".to_string()),
            },
        )
        .unwrap();
        match &doc.steps[0] {
            Step::Numeric {
                min_value,
                ranges_delimiters,
                ranges,
                ..
            } => {
                // The raw inputs are stored, the range list is frozen.
                assert_eq!(*min_value, Some(50));
                assert_eq!(ranges_delimiters.as_deref(), Some("10"));
                assert_eq!(ranges.len(), 3);
                assert_eq!(ranges[0].from, Some(0));
            }
            other => panic!("expected a numeric step, got {:?}", other),
        }
    }

    #[test]
    fn recomputed_ranges_keep_skip_logic_of_identical_bounds() {
        let (doc, step_id) = doc_with_step();
        let doc = numeric_step(&doc, &step_id);
        let doc = apply(
            &doc,
            &Action::ChangeNumericRanges {
                step_id: step_id.clone(),
                min_value: Some(0),
                max_value: Some(100),
                ranges_delimiters: Some("30,60".to_string()),
            },
        )
        .unwrap();
        let doc = apply(
            &doc,
            &Action::ChangeRangeSkipLogic {
                step_id: step_id.clone(),
                range_index: 1,
                skip_logic: Some("end".to_string()),
            },
        )
        .unwrap();
        // Narrowing the last range keeps [30, 59] intact.
        let doc = apply(
            &doc,
            &Action::ChangeNumericRanges {
                step_id,
                min_value: Some(0),
                max_value: Some(90),
                ranges_delimiters: Some("30,60".to_string()),
            },
        )
        .unwrap();
        match &doc.steps[0] {
            Step::Numeric { ranges, .. } => {
                assert_eq!(ranges[1].skip_logic, Some("end".to_string()));
                assert_eq!(ranges[2].skip_logic, None);
            }
            other => panic!("expected a numeric step, got {:?}", other),
        }
    }

    #[test]
    fn autocomplete_prompt_never_overwrites_existing_translations() {
        let (doc, step_id) = doc_with_step();
        let doc = apply(
            &doc,
            &Action::AddLanguage {
                language: "es".to_string(),
            },
        )
        .unwrap();
        let doc = apply(
            &doc,
            &Action::SetActiveLanguage {
                language: "es".to_string(),
            },
        )
        .unwrap();
        let doc = apply(
            &doc,
            &Action::ChangeStepPromptSms {
                step_id: step_id.clone(),
                new_prompt: "Fuma usted?".to_string(),
            },
        )
        .unwrap();

        let item = TranslationItem {
            text: "Do you smoke?".to_string(),
            translations: vec![
                ItemTranslation {
                    language: Some("es".to_string()),
                    text: "SHOULD NOT APPEAR".to_string(),
                },
                ItemTranslation {
                    language: None,
                    text: "ignored".to_string(),
                },
            ],
        };
        let doc = apply(
            &doc,
            &Action::AutocompleteStepPromptSms { step_id, item },
        )
        .unwrap();
        let prompt = doc.steps[1].prompt().unwrap();
        assert_eq!(prompt_sms(prompt, "en"), "Do you smoke?");
        assert_eq!(prompt_sms(prompt, "es"), "Fuma usted?");
    }

    #[test]
    fn autocomplete_prompt_fills_empty_translations() {
        let (doc, step_id) = doc_with_step();
        let doc = apply(
            &doc,
            &Action::AddLanguage {
                language: "es".to_string(),
            },
        )
        .unwrap();
        let item = TranslationItem {
            text: "Do you smoke?".to_string(),
            translations: vec![ItemTranslation {
                language: Some("es".to_string()),
                text: " Fuma usted? ".to_string(),
            }],
        };
        let doc = apply(
            &doc,
            &Action::AutocompleteStepPromptSms { step_id, item },
        )
        .unwrap();
        let prompt = doc.steps[1].prompt().unwrap();
        assert_eq!(prompt_sms(prompt, "es"), "Fuma usted?");
    }

    #[test]
    fn questionnaire_msg_edits_target_the_active_language() {
        let (doc, _) = doc_with_step();
        let doc = apply(
            &doc,
            &Action::SetSmsQuestionnaireMsg {
                msg_key: MsgKey::ErrorMessage,
                text: " Please try again ".to_string(),
            },
        )
        .unwrap();
        assert_eq!(
            prompt_sms(&doc.settings.error_message, "en"),
            "Please try again"
        );
    }

    #[test]
    fn refusal_edits_follow_the_choice_shape() {
        let (doc, step_id) = doc_with_step();
        let doc = numeric_step(&doc, &step_id);
        let doc = apply(&doc, &Action::ToggleAcceptRefusals { step_id: step_id.clone() }).unwrap();
        let doc = apply(
            &doc,
            &Action::ChangeRefusal {
                step_id,
                sms_values: " 9 , 99 ".to_string(),
                ivr_values: "9".to_string(),
                mobileweb_values: "Refuse".to_string(),
                skip_logic: Some("end".to_string()),
            },
        )
        .unwrap();
        match &doc.steps[0] {
            Step::Numeric { refusal, .. } => {
                assert!(refusal.enabled);
                assert_eq!(refusal.responses.sms.get("en").unwrap(), &vec!["9", "99"]);
                assert_eq!(refusal.responses.ivr, vec!["9"]);
                assert_eq!(refusal.skip_logic, Some("end".to_string()));
            }
            other => panic!("expected a numeric step, got {:?}", other),
        }
    }

    #[test]
    fn unknown_step_id_is_fatal_for_edits() {
        let (doc, _) = doc_with_step();
        let res = apply(
            &doc,
            &Action::ChangeStepTitle {
                step_id: "nope".to_string(),
                new_title: "x".to_string(),
            },
        );
        assert_eq!(res, Err(EditError::StepNotFound("nope".to_string())));
    }
}

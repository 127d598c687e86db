//! The validation pass. It never blocks an edit: the processor stores
//! whatever the user typed, and this pass reports what is still
//! missing or inconsistent. The store runs it exactly once per
//! mutating action.

use crate::model::*;

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ValidationError {
    /// Where the problem is, e.g. `steps[2].choices[0]`.
    pub path: String,
    pub lang: Option<String>,
    pub mode: Option<Mode>,
    pub message: String,
}

pub fn validate(doc: &Questionnaire) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    validate_steps(&doc.steps, "steps", doc, &mut errors);
    if let Some(quota_steps) = &doc.quota_completed_steps {
        validate_steps(quota_steps, "quotaCompletedSteps", doc, &mut errors);
    }

    errors
}

fn validate_steps(
    steps: &[Step],
    prefix: &str,
    doc: &Questionnaire,
    errors: &mut Vec<ValidationError>,
) {
    for (idx, step) in steps.iter().enumerate() {
        let path = format!("{}[{}]", prefix, idx);
        if let Some(prompt) = step.prompt() {
            validate_prompt(prompt, &path, doc, errors);
        }
        match step {
            Step::MultipleChoice { choices, .. } => {
                validate_choices(choices, &path, doc, errors);
            }
            Step::Numeric {
                min_value,
                max_value,
                ..
            } => {
                if let (Some(min), Some(max)) = (min_value, max_value) {
                    if max < min {
                        errors.push(ValidationError {
                            path: path.clone(),
                            lang: None,
                            mode: None,
                            message: "max value must be greater than min value".to_string(),
                        });
                    }
                }
            }
            _ => {}
        }
    }
}

fn validate_prompt(
    prompt: &LocalizedPrompt,
    path: &str,
    doc: &Questionnaire,
    errors: &mut Vec<ValidationError>,
) {
    for mode in &doc.modes {
        for lang in &doc.languages {
            let missing = match mode {
                Mode::Sms => prompt_sms(prompt, lang).is_empty(),
                Mode::MobileWeb => prompt_mobileweb(prompt, lang).is_empty(),
                // An uploaded recording does not need prompt text.
                Mode::Ivr => {
                    prompt_ivr_text(prompt, lang).is_empty()
                        && prompt
                            .get(lang)
                            .map(|p| p.ivr.audio_id.is_none())
                            .unwrap_or(true)
                }
            };
            if missing {
                errors.push(ValidationError {
                    path: format!("{}.prompt", path),
                    lang: Some(lang.clone()),
                    mode: Some(*mode),
                    message: "prompt is missing".to_string(),
                });
            }
        }
    }
}

fn validate_choices(
    choices: &[Choice],
    path: &str,
    doc: &Questionnaire,
    errors: &mut Vec<ValidationError>,
) {
    if choices.is_empty() {
        errors.push(ValidationError {
            path: format!("{}.choices", path),
            lang: None,
            mode: None,
            message: "the step should have at least one choice".to_string(),
        });
        return;
    }

    for (idx, choice) in choices.iter().enumerate() {
        let choice_path = format!("{}.choices[{}]", path, idx);
        if choice.value.is_empty() {
            errors.push(ValidationError {
                path: choice_path.clone(),
                lang: None,
                mode: None,
                message: "the choice value is empty".to_string(),
            });
        }
        if choices[..idx].iter().any(|c| c.value == choice.value) {
            errors.push(ValidationError {
                path: choice_path.clone(),
                lang: None,
                mode: None,
                message: "the choice value is a duplicate".to_string(),
            });
        }

        if doc.modes.contains(&Mode::Sms) {
            for lang in &doc.languages {
                let responses = choice.responses.sms.get(lang);
                if responses.map(|rs| rs.is_empty()).unwrap_or(true) {
                    errors.push(ValidationError {
                        path: choice_path.clone(),
                        lang: Some(lang.clone()),
                        mode: Some(Mode::Sms),
                        message: "SMS responses are missing".to_string(),
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{apply, new_questionnaire, Action, ChoiceChange};

    #[test]
    fn fresh_questionnaire_is_incomplete() {
        let doc = new_questionnaire(1);
        let errors = validate(&doc);
        // The initial multiple-choice step has no prompt and no
        // choices yet.
        assert!(errors.iter().any(|e| e.message.contains("prompt")));
        assert!(errors.iter().any(|e| e.message.contains("choice")));
    }

    #[test]
    fn duplicate_choice_values_are_reported() {
        let mut doc = new_questionnaire(1);
        let step_id = doc.steps[0].id().to_string();
        for _ in 0..2 {
            doc = apply(&doc, &Action::AddChoice { step_id: step_id.clone() }).unwrap();
        }
        for index in 0..2 {
            doc = apply(
                &doc,
                &Action::ChangeChoice {
                    step_id: step_id.clone(),
                    choice_change: ChoiceChange {
                        index,
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
        }
        let errors = validate(&doc);
        assert!(errors.iter().any(|e| e.message.contains("duplicate")));
    }
}

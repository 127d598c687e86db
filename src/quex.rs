use log::{debug, info, warn};

use questionnaire_engine::store::{QuestionnaireStore, StoreAction};
use questionnaire_engine::translation;
use questionnaire_engine::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::quex::doc::*;
use crate::quex::script::*;

pub mod io_common;
pub mod io_csv;
pub mod io_xlsx;

#[derive(Debug, Snafu)]
pub enum QuexError {
    #[snafu(display(""))]
    OpeningJson { source: std::io::Error },
    #[snafu(display(""))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing output to {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display(""))]
    CsvOpen { source: csv::Error },
    #[snafu(display(""))]
    CsvLineParse { source: csv::Error },
    #[snafu(display(""))]
    CsvWrite { source: csv::Error },
    #[snafu(display(""))]
    CsvFlush { source: std::io::Error },
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display(""))]
    EmptyExcel {},
    #[snafu(display("Unexpected cell content at line {lineno}: {content}"))]
    ExcelWrongCellType { lineno: u64, content: String },

    #[snafu(display("Unknown mode {value}"))]
    UnknownMode { value: String },
    #[snafu(display("Unknown step type {value}"))]
    UnknownStepType { value: String },
    #[snafu(display("Unknown disposition {value}"))]
    UnknownDisposition { value: String },
    #[snafu(display("Unknown audio source {value}"))]
    UnknownAudioSource { value: String },
    #[snafu(display("Unknown questionnaire message key {value}"))]
    UnknownMsgKey { value: String },

    #[snafu(display("Error editing the questionnaire"))]
    Edit { source: EditError },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

type QuexResult<T> = Result<T, QuexError>;

/// The questionnaire document as exchanged on the wire: camelCase
/// field names, steps tagged by a `type` field. Everything that the
/// server may omit is optional; the conversion to the model fills in
/// the defaults.
pub mod doc {
    use crate::quex::*;
    use serde::{Deserialize, Serialize};
    use std::collections::BTreeMap;

    #[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
    pub struct IvrPromptDoc {
        pub text: Option<String>,
        #[serde(rename = "audioSource")]
        pub audio_source: Option<String>,
        #[serde(rename = "audioId")]
        pub audio_id: Option<String>,
    }

    #[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
    pub struct PromptDoc {
        pub sms: Option<String>,
        pub ivr: Option<IvrPromptDoc>,
        pub mobileweb: Option<String>,
    }

    pub type LocalizedPromptDoc = BTreeMap<String, PromptDoc>;

    #[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
    pub struct ResponsesDoc {
        pub sms: Option<BTreeMap<String, Vec<String>>>,
        pub ivr: Option<Vec<String>>,
        pub mobileweb: Option<BTreeMap<String, String>>,
    }

    #[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
    pub struct ChoiceDoc {
        pub value: Option<String>,
        pub responses: Option<ResponsesDoc>,
        #[serde(rename = "skipLogic")]
        pub skip_logic: Option<String>,
    }

    #[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
    pub struct RefusalDoc {
        pub enabled: Option<bool>,
        pub responses: Option<ResponsesDoc>,
        #[serde(rename = "skipLogic")]
        pub skip_logic: Option<String>,
    }

    #[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
    pub struct RangeDoc {
        pub from: Option<i64>,
        pub to: Option<i64>,
        #[serde(rename = "skipLogic")]
        pub skip_logic: Option<String>,
    }

    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    #[serde(tag = "type")]
    pub enum StepDoc {
        #[serde(rename = "multiple-choice")]
        MultipleChoice {
            id: String,
            title: Option<String>,
            store: Option<String>,
            prompt: Option<LocalizedPromptDoc>,
            choices: Option<Vec<ChoiceDoc>>,
        },
        #[serde(rename = "numeric")]
        Numeric {
            id: String,
            title: Option<String>,
            store: Option<String>,
            prompt: Option<LocalizedPromptDoc>,
            #[serde(rename = "minValue")]
            min_value: Option<i64>,
            #[serde(rename = "maxValue")]
            max_value: Option<i64>,
            #[serde(rename = "rangesDelimiters")]
            ranges_delimiters: Option<String>,
            ranges: Option<Vec<RangeDoc>>,
            refusal: Option<RefusalDoc>,
            #[serde(rename = "alphabeticalAnswers")]
            alphabetical_answers: Option<bool>,
        },
        #[serde(rename = "explanation")]
        Explanation {
            id: String,
            title: Option<String>,
            prompt: Option<LocalizedPromptDoc>,
            #[serde(rename = "skipLogic")]
            skip_logic: Option<String>,
        },
        #[serde(rename = "flag")]
        Flag {
            id: String,
            title: Option<String>,
            disposition: Option<String>,
            #[serde(rename = "skipLogic")]
            skip_logic: Option<String>,
        },
        #[serde(rename = "language-selection")]
        LanguageSelection {
            id: String,
            title: Option<String>,
            store: Option<String>,
            prompt: Option<PromptDoc>,
            #[serde(rename = "languageChoices")]
            language_choices: Option<Vec<String>>,
        },
    }

    #[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
    pub struct ColorStyleDoc {
        #[serde(rename = "primaryColor")]
        pub primary_color: Option<String>,
        #[serde(rename = "secondaryColor")]
        pub secondary_color: Option<String>,
    }

    #[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
    pub struct SettingsDoc {
        #[serde(rename = "errorMessage")]
        pub error_message: Option<LocalizedPromptDoc>,
        #[serde(rename = "thankYouMessage")]
        pub thank_you_message: Option<LocalizedPromptDoc>,
        pub title: Option<BTreeMap<String, String>>,
        #[serde(rename = "surveyAlreadyTakenMessage")]
        pub survey_already_taken_message: Option<BTreeMap<String, String>>,
        #[serde(rename = "mobileWebSmsMessage")]
        pub mobile_web_sms_message: Option<String>,
        #[serde(rename = "mobileWebSurveyIsOverMessage")]
        pub mobile_web_survey_is_over_message: Option<String>,
        #[serde(rename = "mobileWebColorStyle")]
        pub mobile_web_color_style: Option<ColorStyleDoc>,
    }

    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct QuestionnaireDoc {
        pub id: Option<i64>,
        #[serde(rename = "projectId")]
        pub project_id: i64,
        pub name: Option<String>,
        pub modes: Vec<String>,
        #[serde(rename = "activeMode")]
        pub active_mode: Option<String>,
        pub languages: Vec<String>,
        #[serde(rename = "defaultLanguage")]
        pub default_language: String,
        #[serde(rename = "activeLanguage")]
        pub active_language: Option<String>,
        pub steps: Vec<StepDoc>,
        #[serde(rename = "quotaCompletedSteps")]
        pub quota_completed_steps: Option<Vec<StepDoc>>,
        pub settings: Option<SettingsDoc>,
        pub valid: Option<bool>,
    }

    pub fn mode_to_model(value: &str) -> QuexResult<Mode> {
        Mode::parse(value).context(UnknownModeSnafu { value })
    }

    fn audio_source_to_model(value: &Option<String>) -> QuexResult<AudioSource> {
        match value.as_deref() {
            None | Some("tts") => Ok(AudioSource::Tts),
            Some("upload") => Ok(AudioSource::Upload),
            Some(value) => UnknownAudioSourceSnafu { value }.fail(),
        }
    }

    fn audio_source_from_model(a: AudioSource) -> &'static str {
        match a {
            AudioSource::Tts => "tts",
            AudioSource::Upload => "upload",
        }
    }

    fn ivr_prompt_to_model(d: &IvrPromptDoc) -> QuexResult<IvrPrompt> {
        Ok(IvrPrompt {
            text: d.text.clone().unwrap_or_default(),
            audio_source: audio_source_to_model(&d.audio_source)?,
            audio_id: d.audio_id.clone(),
        })
    }

    fn ivr_prompt_from_model(p: &IvrPrompt) -> IvrPromptDoc {
        IvrPromptDoc {
            text: Some(p.text.clone()),
            audio_source: Some(audio_source_from_model(p.audio_source).to_string()),
            audio_id: p.audio_id.clone(),
        }
    }

    fn prompt_to_model(d: &PromptDoc) -> QuexResult<Prompt> {
        Ok(Prompt {
            sms: d.sms.clone().unwrap_or_default(),
            ivr: match &d.ivr {
                Some(i) => ivr_prompt_to_model(i)?,
                None => IvrPrompt::default(),
            },
            mobileweb: d.mobileweb.clone().unwrap_or_default(),
        })
    }

    fn prompt_from_model(p: &Prompt) -> PromptDoc {
        PromptDoc {
            sms: Some(p.sms.clone()),
            ivr: Some(ivr_prompt_from_model(&p.ivr)),
            mobileweb: Some(p.mobileweb.clone()),
        }
    }

    fn localized_to_model(d: &Option<LocalizedPromptDoc>) -> QuexResult<LocalizedPrompt> {
        let mut res = LocalizedPrompt::new();
        if let Some(map) = d {
            for (lang, p) in map {
                res.insert(lang.clone(), prompt_to_model(p)?);
            }
        }
        Ok(res)
    }

    fn localized_from_model(p: &LocalizedPrompt) -> LocalizedPromptDoc {
        p.iter()
            .map(|(lang, prompt)| (lang.clone(), prompt_from_model(prompt)))
            .collect()
    }

    fn responses_to_model(d: &Option<ResponsesDoc>) -> Responses {
        match d {
            Some(r) => Responses {
                sms: r.sms.clone().unwrap_or_default(),
                ivr: r.ivr.clone().unwrap_or_default(),
                mobileweb: r.mobileweb.clone().unwrap_or_default(),
            },
            None => Responses::default(),
        }
    }

    fn responses_from_model(r: &Responses) -> ResponsesDoc {
        ResponsesDoc {
            sms: Some(r.sms.clone()),
            ivr: Some(r.ivr.clone()),
            mobileweb: Some(r.mobileweb.clone()),
        }
    }

    fn choice_to_model(d: &ChoiceDoc) -> Choice {
        Choice {
            value: d.value.clone().unwrap_or_default(),
            responses: responses_to_model(&d.responses),
            skip_logic: d.skip_logic.clone(),
        }
    }

    fn choice_from_model(c: &Choice) -> ChoiceDoc {
        ChoiceDoc {
            value: Some(c.value.clone()),
            responses: Some(responses_from_model(&c.responses)),
            skip_logic: c.skip_logic.clone(),
        }
    }

    fn refusal_to_model(d: &Option<RefusalDoc>) -> Refusal {
        match d {
            Some(r) => Refusal {
                enabled: r.enabled.unwrap_or(false),
                responses: responses_to_model(&r.responses),
                skip_logic: r.skip_logic.clone(),
            },
            None => new_refusal(),
        }
    }

    fn refusal_from_model(r: &Refusal) -> RefusalDoc {
        RefusalDoc {
            enabled: Some(r.enabled),
            responses: Some(responses_from_model(&r.responses)),
            skip_logic: r.skip_logic.clone(),
        }
    }

    pub fn step_to_model(d: &StepDoc) -> QuexResult<Step> {
        let res = match d {
            StepDoc::MultipleChoice {
                id,
                title,
                store,
                prompt,
                choices,
            } => Step::MultipleChoice {
                id: id.clone(),
                title: title.clone().unwrap_or_default(),
                store: store.clone().unwrap_or_default(),
                prompt: localized_to_model(prompt)?,
                choices: choices
                    .clone()
                    .unwrap_or_default()
                    .iter()
                    .map(choice_to_model)
                    .collect(),
            },
            StepDoc::Numeric {
                id,
                title,
                store,
                prompt,
                min_value,
                max_value,
                ranges_delimiters,
                ranges,
                refusal,
                alphabetical_answers,
            } => Step::Numeric {
                id: id.clone(),
                title: title.clone().unwrap_or_default(),
                store: store.clone().unwrap_or_default(),
                prompt: localized_to_model(prompt)?,
                min_value: *min_value,
                max_value: *max_value,
                ranges_delimiters: ranges_delimiters.clone(),
                ranges: ranges
                    .clone()
                    .unwrap_or_default()
                    .iter()
                    .map(|r| Range {
                        from: r.from,
                        to: r.to,
                        skip_logic: r.skip_logic.clone(),
                    })
                    .collect(),
                refusal: refusal_to_model(refusal),
                alphabetical_answers: alphabetical_answers.unwrap_or(false),
            },
            StepDoc::Explanation {
                id,
                title,
                prompt,
                skip_logic,
            } => Step::Explanation {
                id: id.clone(),
                title: title.clone().unwrap_or_default(),
                prompt: localized_to_model(prompt)?,
                skip_logic: skip_logic.clone(),
            },
            StepDoc::Flag {
                id,
                title,
                disposition,
                skip_logic,
            } => Step::Flag {
                id: id.clone(),
                title: title.clone().unwrap_or_default(),
                disposition: match disposition {
                    Some(value) => {
                        Disposition::parse(value).context(UnknownDispositionSnafu { value })?
                    }
                    None => Disposition::default(),
                },
                skip_logic: skip_logic.clone(),
            },
            StepDoc::LanguageSelection {
                id,
                title,
                store,
                prompt,
                language_choices,
            } => Step::LanguageSelection {
                id: id.clone(),
                title: title.clone().unwrap_or_default(),
                store: store.clone().unwrap_or_default(),
                prompt: match prompt {
                    Some(p) => prompt_to_model(p)?,
                    None => Prompt::default(),
                },
                language_choices: language_choices.clone().unwrap_or_default(),
            },
        };
        Ok(res)
    }

    pub fn step_from_model(s: &Step) -> StepDoc {
        match s {
            Step::MultipleChoice {
                id,
                title,
                store,
                prompt,
                choices,
            } => StepDoc::MultipleChoice {
                id: id.clone(),
                title: Some(title.clone()),
                store: Some(store.clone()),
                prompt: Some(localized_from_model(prompt)),
                choices: Some(choices.iter().map(choice_from_model).collect()),
            },
            Step::Numeric {
                id,
                title,
                store,
                prompt,
                min_value,
                max_value,
                ranges_delimiters,
                ranges,
                refusal,
                alphabetical_answers,
            } => StepDoc::Numeric {
                id: id.clone(),
                title: Some(title.clone()),
                store: Some(store.clone()),
                prompt: Some(localized_from_model(prompt)),
                min_value: *min_value,
                max_value: *max_value,
                ranges_delimiters: ranges_delimiters.clone(),
                ranges: Some(
                    ranges
                        .iter()
                        .map(|r| RangeDoc {
                            from: r.from,
                            to: r.to,
                            skip_logic: r.skip_logic.clone(),
                        })
                        .collect(),
                ),
                refusal: Some(refusal_from_model(refusal)),
                alphabetical_answers: Some(*alphabetical_answers),
            },
            Step::Explanation {
                id,
                title,
                prompt,
                skip_logic,
            } => StepDoc::Explanation {
                id: id.clone(),
                title: Some(title.clone()),
                prompt: Some(localized_from_model(prompt)),
                skip_logic: skip_logic.clone(),
            },
            Step::Flag {
                id,
                title,
                disposition,
                skip_logic,
            } => StepDoc::Flag {
                id: id.clone(),
                title: Some(title.clone()),
                disposition: Some(disposition.as_str().to_string()),
                skip_logic: skip_logic.clone(),
            },
            Step::LanguageSelection {
                id,
                title,
                store,
                prompt,
                language_choices,
            } => StepDoc::LanguageSelection {
                id: id.clone(),
                title: Some(title.clone()),
                store: Some(store.clone()),
                prompt: Some(prompt_from_model(prompt)),
                language_choices: Some(language_choices.clone()),
            },
        }
    }

    pub fn questionnaire_to_model(d: &QuestionnaireDoc) -> QuexResult<Questionnaire> {
        let modes = d
            .modes
            .iter()
            .map(|m| mode_to_model(m))
            .collect::<QuexResult<Vec<Mode>>>()?;
        let active_mode = match &d.active_mode {
            Some(m) => Some(mode_to_model(m)?),
            None => None,
        };
        let settings_doc = d.settings.clone().unwrap_or_default();
        let settings = Settings {
            error_message: localized_to_model(&settings_doc.error_message)?,
            thank_you_message: localized_to_model(&settings_doc.thank_you_message)?,
            title: settings_doc.title.unwrap_or_default(),
            survey_already_taken_message: settings_doc
                .survey_already_taken_message
                .unwrap_or_default(),
            mobile_web_sms_message: settings_doc.mobile_web_sms_message.unwrap_or_default(),
            mobile_web_survey_is_over_message: settings_doc
                .mobile_web_survey_is_over_message
                .unwrap_or_default(),
            mobile_web_color_style: match settings_doc.mobile_web_color_style {
                Some(c) => ColorStyle {
                    primary_color: c.primary_color,
                    secondary_color: c.secondary_color,
                },
                None => ColorStyle::default(),
            },
        };
        Ok(Questionnaire {
            id: d.id,
            project_id: d.project_id,
            name: d.name.clone().unwrap_or_default(),
            modes,
            active_mode,
            languages: d.languages.clone(),
            default_language: d.default_language.clone(),
            active_language: d
                .active_language
                .clone()
                .unwrap_or_else(|| d.default_language.clone()),
            steps: d
                .steps
                .iter()
                .map(step_to_model)
                .collect::<QuexResult<Vec<Step>>>()?,
            quota_completed_steps: match &d.quota_completed_steps {
                Some(steps) => Some(
                    steps
                        .iter()
                        .map(step_to_model)
                        .collect::<QuexResult<Vec<Step>>>()?,
                ),
                None => None,
            },
            settings,
            valid: d.valid.unwrap_or(true),
        })
    }

    pub fn questionnaire_from_model(q: &Questionnaire) -> QuestionnaireDoc {
        QuestionnaireDoc {
            id: q.id,
            project_id: q.project_id,
            name: Some(q.name.clone()),
            modes: q.modes.iter().map(|m| m.as_str().to_string()).collect(),
            active_mode: q.active_mode.map(|m| m.as_str().to_string()),
            languages: q.languages.clone(),
            default_language: q.default_language.clone(),
            active_language: Some(q.active_language.clone()),
            steps: q.steps.iter().map(step_from_model).collect(),
            quota_completed_steps: q
                .quota_completed_steps
                .as_ref()
                .map(|steps| steps.iter().map(step_from_model).collect()),
            settings: Some(SettingsDoc {
                error_message: Some(localized_from_model(&q.settings.error_message)),
                thank_you_message: Some(localized_from_model(&q.settings.thank_you_message)),
                title: Some(q.settings.title.clone()),
                survey_already_taken_message: Some(
                    q.settings.survey_already_taken_message.clone(),
                ),
                mobile_web_sms_message: Some(q.settings.mobile_web_sms_message.clone()),
                mobile_web_survey_is_over_message: Some(
                    q.settings.mobile_web_survey_is_over_message.clone(),
                ),
                mobile_web_color_style: Some(ColorStyleDoc {
                    primary_color: q.settings.mobile_web_color_style.primary_color.clone(),
                    secondary_color: q.settings.mobile_web_color_style.secondary_color.clone(),
                }),
            }),
            valid: Some(q.valid),
        }
    }
}

/// The edit-action script: a JSON array of `type`-tagged actions with
/// camelCase payloads.
pub mod script {
    use crate::quex::doc::mode_to_model;
    use crate::quex::*;
    use serde::{Deserialize, Serialize};

    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct ItemTranslationDoc {
        pub language: Option<String>,
        pub text: String,
    }

    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct TranslationItemDoc {
        pub text: String,
        pub translations: Vec<ItemTranslationDoc>,
    }

    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct ChoiceChangeDoc {
        pub index: usize,
        pub response: String,
        #[serde(rename = "smsValues")]
        pub sms_values: String,
        #[serde(rename = "ivrValues")]
        pub ivr_values: String,
        #[serde(rename = "mobilewebValues")]
        pub mobileweb_values: String,
        #[serde(rename = "skipLogic")]
        pub skip_logic: Option<String>,
        #[serde(rename = "autoComplete", default)]
        pub auto_complete: bool,
    }

    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    #[serde(tag = "type", rename_all = "camelCase")]
    pub enum ActionDoc {
        ChangeName {
            #[serde(rename = "newName")]
            new_name: String,
        },
        SetActiveMode {
            mode: String,
        },
        AddMode {
            mode: String,
        },
        RemoveMode {
            mode: String,
        },
        ToggleQuotaCompletedSteps,
        AddLanguage {
            language: String,
        },
        RemoveLanguage {
            language: String,
        },
        SetDefaultLanguage {
            language: String,
        },
        SetActiveLanguage {
            language: String,
        },
        ReorderLanguages {
            language: String,
            index: usize,
        },
        SetSmsQuestionnaireMsg {
            #[serde(rename = "msgKey")]
            msg_key: String,
            text: String,
        },
        SetIvrQuestionnaireMsg {
            #[serde(rename = "msgKey")]
            msg_key: String,
            text: String,
            #[serde(rename = "audioSource")]
            audio_source: Option<String>,
            #[serde(rename = "audioId")]
            audio_id: Option<String>,
        },
        SetMobileWebQuestionnaireMsg {
            #[serde(rename = "msgKey")]
            msg_key: String,
            text: String,
        },
        AutocompleteSmsQuestionnaireMsg {
            #[serde(rename = "msgKey")]
            msg_key: String,
            item: TranslationItemDoc,
        },
        AutocompleteIvrQuestionnaireMsg {
            #[serde(rename = "msgKey")]
            msg_key: String,
            item: TranslationItemDoc,
        },
        UploadTranslation {
            rows: Vec<Vec<String>>,
        },
        SetMobileWebSmsMessage {
            text: String,
        },
        SetMobileWebSurveyIsOverMessage {
            text: String,
        },
        SetPrimaryColor {
            color: String,
        },
        SetSecondaryColor {
            color: String,
        },
        SetDisplayedTitle {
            msg: String,
        },
        SetSurveyAlreadyTakenMessage {
            msg: String,
        },
        AddStep,
        AddQuotaCompletedStep,
        MoveStep {
            #[serde(rename = "sourceStepId")]
            source_step_id: String,
            #[serde(rename = "targetStepId")]
            target_step_id: String,
        },
        MoveStepToTop {
            #[serde(rename = "stepId")]
            step_id: String,
        },
        ChangeStepTitle {
            #[serde(rename = "stepId")]
            step_id: String,
            #[serde(rename = "newTitle")]
            new_title: String,
        },
        ChangeStepType {
            #[serde(rename = "stepId")]
            step_id: String,
            #[serde(rename = "stepType")]
            step_type: String,
        },
        ChangeStepPromptSms {
            #[serde(rename = "stepId")]
            step_id: String,
            #[serde(rename = "newPrompt")]
            new_prompt: String,
        },
        ChangeStepPromptIvr {
            #[serde(rename = "stepId")]
            step_id: String,
            text: String,
            #[serde(rename = "audioSource")]
            audio_source: Option<String>,
        },
        ChangeStepPromptMobileWeb {
            #[serde(rename = "stepId")]
            step_id: String,
            #[serde(rename = "newPrompt")]
            new_prompt: String,
        },
        ChangeStepAudioIdIvr {
            #[serde(rename = "stepId")]
            step_id: String,
            #[serde(rename = "newId")]
            new_id: String,
        },
        ChangeStepStore {
            #[serde(rename = "stepId")]
            step_id: String,
            #[serde(rename = "newStore")]
            new_store: String,
        },
        AutocompleteStepPromptSms {
            #[serde(rename = "stepId")]
            step_id: String,
            item: TranslationItemDoc,
        },
        AutocompleteStepPromptIvr {
            #[serde(rename = "stepId")]
            step_id: String,
            item: TranslationItemDoc,
        },
        DeleteStep {
            #[serde(rename = "stepId")]
            step_id: String,
        },
        AddChoice {
            #[serde(rename = "stepId")]
            step_id: String,
        },
        DeleteChoice {
            #[serde(rename = "stepId")]
            step_id: String,
            index: usize,
        },
        ChangeChoice {
            #[serde(rename = "stepId")]
            step_id: String,
            #[serde(rename = "choiceChange")]
            choice_change: ChoiceChangeDoc,
        },
        AutocompleteChoiceSmsValues {
            #[serde(rename = "stepId")]
            step_id: String,
            index: usize,
            item: TranslationItemDoc,
        },
        ChangeNumericRanges {
            #[serde(rename = "stepId")]
            step_id: String,
            #[serde(rename = "minValue")]
            min_value: Option<i64>,
            #[serde(rename = "maxValue")]
            max_value: Option<i64>,
            #[serde(rename = "rangesDelimiters")]
            ranges_delimiters: Option<String>,
        },
        ChangeRangeSkipLogic {
            #[serde(rename = "stepId")]
            step_id: String,
            #[serde(rename = "rangeIndex")]
            range_index: usize,
            #[serde(rename = "skipLogic")]
            skip_logic: Option<String>,
        },
        ChangeExplanationStepSkipLogic {
            #[serde(rename = "stepId")]
            step_id: String,
            #[serde(rename = "skipLogic")]
            skip_logic: Option<String>,
        },
        ChangeDisposition {
            #[serde(rename = "stepId")]
            step_id: String,
            disposition: String,
        },
        ToggleAcceptRefusals {
            #[serde(rename = "stepId")]
            step_id: String,
        },
        ToggleAcceptsAlphabeticalAnswers {
            #[serde(rename = "stepId")]
            step_id: String,
        },
        ChangeRefusal {
            #[serde(rename = "stepId")]
            step_id: String,
            #[serde(rename = "smsValues")]
            sms_values: String,
            #[serde(rename = "ivrValues")]
            ivr_values: String,
            #[serde(rename = "mobilewebValues")]
            mobileweb_values: String,
            #[serde(rename = "skipLogic")]
            skip_logic: Option<String>,
        },
        SetDirty,
    }

    fn msg_key_to_model(value: &str) -> QuexResult<MsgKey> {
        match value {
            "errorMessage" => Ok(MsgKey::ErrorMessage),
            "thankYouMessage" => Ok(MsgKey::ThankYouMessage),
            value => UnknownMsgKeySnafu { value }.fail(),
        }
    }

    fn step_type_to_model(value: &str) -> QuexResult<StepType> {
        match value {
            "multiple-choice" => Ok(StepType::MultipleChoice),
            "numeric" => Ok(StepType::Numeric),
            "explanation" => Ok(StepType::Explanation),
            "flag" => Ok(StepType::Flag),
            value => UnknownStepTypeSnafu { value }.fail(),
        }
    }

    fn audio_source_to_model(value: &Option<String>) -> QuexResult<AudioSource> {
        match value.as_deref() {
            None | Some("tts") => Ok(AudioSource::Tts),
            Some("upload") => Ok(AudioSource::Upload),
            Some(value) => UnknownAudioSourceSnafu { value }.fail(),
        }
    }

    fn item_to_model(d: &TranslationItemDoc) -> TranslationItem {
        TranslationItem {
            text: d.text.clone(),
            translations: d
                .translations
                .iter()
                .map(|t| ItemTranslation {
                    language: t.language.clone(),
                    text: t.text.clone(),
                })
                .collect(),
        }
    }

    pub fn action_to_model(d: &ActionDoc) -> QuexResult<Action> {
        let res = match d {
            ActionDoc::ChangeName { new_name } => Action::ChangeName {
                new_name: new_name.clone(),
            },
            ActionDoc::SetActiveMode { mode } => Action::SetActiveMode {
                mode: mode_to_model(mode)?,
            },
            ActionDoc::AddMode { mode } => Action::AddMode {
                mode: mode_to_model(mode)?,
            },
            ActionDoc::RemoveMode { mode } => Action::RemoveMode {
                mode: mode_to_model(mode)?,
            },
            ActionDoc::ToggleQuotaCompletedSteps => Action::ToggleQuotaCompletedSteps,
            ActionDoc::AddLanguage { language } => Action::AddLanguage {
                language: language.clone(),
            },
            ActionDoc::RemoveLanguage { language } => Action::RemoveLanguage {
                language: language.clone(),
            },
            ActionDoc::SetDefaultLanguage { language } => Action::SetDefaultLanguage {
                language: language.clone(),
            },
            ActionDoc::SetActiveLanguage { language } => Action::SetActiveLanguage {
                language: language.clone(),
            },
            ActionDoc::ReorderLanguages { language, index } => Action::ReorderLanguages {
                language: language.clone(),
                index: *index,
            },
            ActionDoc::SetSmsQuestionnaireMsg { msg_key, text } => {
                Action::SetSmsQuestionnaireMsg {
                    msg_key: msg_key_to_model(msg_key)?,
                    text: text.clone(),
                }
            }
            ActionDoc::SetIvrQuestionnaireMsg {
                msg_key,
                text,
                audio_source,
                audio_id,
            } => Action::SetIvrQuestionnaireMsg {
                msg_key: msg_key_to_model(msg_key)?,
                text: text.clone(),
                audio_source: audio_source_to_model(audio_source)?,
                audio_id: audio_id.clone(),
            },
            ActionDoc::SetMobileWebQuestionnaireMsg { msg_key, text } => {
                Action::SetMobileWebQuestionnaireMsg {
                    msg_key: msg_key_to_model(msg_key)?,
                    text: text.clone(),
                }
            }
            ActionDoc::AutocompleteSmsQuestionnaireMsg { msg_key, item } => {
                Action::AutocompleteSmsQuestionnaireMsg {
                    msg_key: msg_key_to_model(msg_key)?,
                    item: item_to_model(item),
                }
            }
            ActionDoc::AutocompleteIvrQuestionnaireMsg { msg_key, item } => {
                Action::AutocompleteIvrQuestionnaireMsg {
                    msg_key: msg_key_to_model(msg_key)?,
                    item: item_to_model(item),
                }
            }
            ActionDoc::UploadTranslation { rows } => Action::UploadTranslation {
                rows: rows.clone(),
            },
            ActionDoc::SetMobileWebSmsMessage { text } => Action::SetMobileWebSmsMessage {
                text: text.clone(),
            },
            ActionDoc::SetMobileWebSurveyIsOverMessage { text } => {
                Action::SetMobileWebSurveyIsOverMessage { text: text.clone() }
            }
            ActionDoc::SetPrimaryColor { color } => Action::SetPrimaryColor {
                color: color.clone(),
            },
            ActionDoc::SetSecondaryColor { color } => Action::SetSecondaryColor {
                color: color.clone(),
            },
            ActionDoc::SetDisplayedTitle { msg } => Action::SetDisplayedTitle { msg: msg.clone() },
            ActionDoc::SetSurveyAlreadyTakenMessage { msg } => {
                Action::SetSurveyAlreadyTakenMessage { msg: msg.clone() }
            }
            ActionDoc::AddStep => Action::AddStep,
            ActionDoc::AddQuotaCompletedStep => Action::AddQuotaCompletedStep,
            ActionDoc::MoveStep {
                source_step_id,
                target_step_id,
            } => Action::MoveStep {
                source_step_id: source_step_id.clone(),
                target_step_id: target_step_id.clone(),
            },
            ActionDoc::MoveStepToTop { step_id } => Action::MoveStepToTop {
                step_id: step_id.clone(),
            },
            ActionDoc::ChangeStepTitle { step_id, new_title } => Action::ChangeStepTitle {
                step_id: step_id.clone(),
                new_title: new_title.clone(),
            },
            ActionDoc::ChangeStepType { step_id, step_type } => Action::ChangeStepType {
                step_id: step_id.clone(),
                step_type: step_type_to_model(step_type)?,
            },
            ActionDoc::ChangeStepPromptSms {
                step_id,
                new_prompt,
            } => Action::ChangeStepPromptSms {
                step_id: step_id.clone(),
                new_prompt: new_prompt.clone(),
            },
            ActionDoc::ChangeStepPromptIvr {
                step_id,
                text,
                audio_source,
            } => Action::ChangeStepPromptIvr {
                step_id: step_id.clone(),
                text: text.clone(),
                audio_source: audio_source_to_model(audio_source)?,
            },
            ActionDoc::ChangeStepPromptMobileWeb {
                step_id,
                new_prompt,
            } => Action::ChangeStepPromptMobileWeb {
                step_id: step_id.clone(),
                new_prompt: new_prompt.clone(),
            },
            ActionDoc::ChangeStepAudioIdIvr { step_id, new_id } => Action::ChangeStepAudioIdIvr {
                step_id: step_id.clone(),
                new_id: new_id.clone(),
            },
            ActionDoc::ChangeStepStore { step_id, new_store } => Action::ChangeStepStore {
                step_id: step_id.clone(),
                new_store: new_store.clone(),
            },
            ActionDoc::AutocompleteStepPromptSms { step_id, item } => {
                Action::AutocompleteStepPromptSms {
                    step_id: step_id.clone(),
                    item: item_to_model(item),
                }
            }
            ActionDoc::AutocompleteStepPromptIvr { step_id, item } => {
                Action::AutocompleteStepPromptIvr {
                    step_id: step_id.clone(),
                    item: item_to_model(item),
                }
            }
            ActionDoc::DeleteStep { step_id } => Action::DeleteStep {
                step_id: step_id.clone(),
            },
            ActionDoc::AddChoice { step_id } => Action::AddChoice {
                step_id: step_id.clone(),
            },
            ActionDoc::DeleteChoice { step_id, index } => Action::DeleteChoice {
                step_id: step_id.clone(),
                index: *index,
            },
            ActionDoc::ChangeChoice {
                step_id,
                choice_change,
            } => Action::ChangeChoice {
                step_id: step_id.clone(),
                choice_change: ChoiceChange {
                    index: choice_change.index,
                    response: choice_change.response.clone(),
                    sms_values: choice_change.sms_values.clone(),
                    ivr_values: choice_change.ivr_values.clone(),
                    mobileweb_values: choice_change.mobileweb_values.clone(),
                    skip_logic: choice_change.skip_logic.clone(),
                    auto_complete: choice_change.auto_complete,
                },
            },
            ActionDoc::AutocompleteChoiceSmsValues {
                step_id,
                index,
                item,
            } => Action::AutocompleteChoiceSmsValues {
                step_id: step_id.clone(),
                index: *index,
                item: item_to_model(item),
            },
            ActionDoc::ChangeNumericRanges {
                step_id,
                min_value,
                max_value,
                ranges_delimiters,
            } => Action::ChangeNumericRanges {
                step_id: step_id.clone(),
                min_value: *min_value,
                max_value: *max_value,
                ranges_delimiters: ranges_delimiters.clone(),
            },
            ActionDoc::ChangeRangeSkipLogic {
                step_id,
                range_index,
                skip_logic,
            } => Action::ChangeRangeSkipLogic {
                step_id: step_id.clone(),
                range_index: *range_index,
                skip_logic: skip_logic.clone(),
            },
            ActionDoc::ChangeExplanationStepSkipLogic {
                step_id,
                skip_logic,
            } => Action::ChangeExplanationStepSkipLogic {
                step_id: step_id.clone(),
                skip_logic: skip_logic.clone(),
            },
            ActionDoc::ChangeDisposition {
                step_id,
                disposition,
            } => Action::ChangeDisposition {
                step_id: step_id.clone(),
                disposition: Disposition::parse(disposition).context(UnknownDispositionSnafu {
                    value: disposition,
                })?,
            },
            ActionDoc::ToggleAcceptRefusals { step_id } => Action::ToggleAcceptRefusals {
                step_id: step_id.clone(),
            },
            ActionDoc::ToggleAcceptsAlphabeticalAnswers { step_id } => {
                Action::ToggleAcceptsAlphabeticalAnswers {
                    step_id: step_id.clone(),
                }
            }
            ActionDoc::ChangeRefusal {
                step_id,
                sms_values,
                ivr_values,
                mobileweb_values,
                skip_logic,
            } => Action::ChangeRefusal {
                step_id: step_id.clone(),
                sms_values: sms_values.clone(),
                ivr_values: ivr_values.clone(),
                mobileweb_values: mobileweb_values.clone(),
                skip_logic: skip_logic.clone(),
            },
            ActionDoc::SetDirty => Action::SetDirty,
        };
        Ok(res)
    }
}

pub fn read_questionnaire(path: &str) -> QuexResult<Questionnaire> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu {})?;
    let d: QuestionnaireDoc = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    debug!("read questionnaire doc: {:?}", d);
    questionnaire_to_model(&d)
}

fn read_script(path: &str) -> QuexResult<Vec<Action>> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu {})?;
    let docs: Vec<ActionDoc> = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    docs.iter().map(action_to_model).collect()
}

fn write_output(pretty: &str, out: &str) -> QuexResult<()> {
    if out == "stdout" {
        println!("{}", pretty);
        Ok(())
    } else {
        fs::write(out, pretty).context(WritingOutputSnafu { path: out })
    }
}

fn export_translations(doc: &Questionnaire, path: &str) -> QuexResult<()> {
    let p = Path::new(path);
    // A directory target gets the questionnaire's own file name.
    let target: PathBuf = if p.is_dir() {
        p.join(translation::translation_filename(doc))
    } else {
        p.to_path_buf()
    };
    let rows = translation::export_rows(doc);
    io_csv::write_rows(&target, &rows)?;
    info!("wrote {} translation rows to {:?}", rows.len(), target);
    Ok(())
}

fn import_translations(store: &mut QuestionnaireStore, path: &str) -> QuexResult<()> {
    let rows = if io_common::is_excel(path) {
        io_xlsx::read_rows(path)?
    } else {
        io_csv::read_rows(path)?
    };
    info!("importing {} translation rows from {}", rows.len(), path);
    store
        .dispatch(StoreAction::Edit(Action::UploadTranslation { rows }))
        .context(EditSnafu {})
}

pub fn run_session(args: &Args) -> QuexResult<()> {
    let mut store = QuestionnaireStore::new();

    match (&args.input, args.new_project) {
        (Some(path), _) => {
            let doc = read_questionnaire(path)?;
            store
                .dispatch(StoreAction::Fetch {
                    project_id: doc.project_id,
                    questionnaire_id: doc.id,
                })
                .context(EditSnafu {})?;
            store.dispatch(StoreAction::Receive(doc)).context(EditSnafu {})?;
        }
        (None, Some(project_id)) => {
            store
                .dispatch(StoreAction::New { project_id })
                .context(EditSnafu {})?;
        }
        (None, None) => {
            whatever!("either --input or --new-project must be provided")
        }
    }

    if let Some(path) = &args.import_translations {
        import_translations(&mut store, path)?;
    }

    if let Some(path) = &args.script {
        for action in read_script(path)? {
            debug!("applying action {:?}", action);
            store
                .dispatch(StoreAction::Edit(action))
                .context(EditSnafu {})?;
        }
    }

    let doc = match &store.data {
        Some(d) => d,
        None => whatever!("no questionnaire loaded after the session"),
    };
    info!(
        "session done: dirty: {:?} valid: {:?} validation errors: {}",
        store.dirty,
        doc.valid,
        store.errors.len()
    );
    for e in &store.errors {
        debug!("validation: {:?}", e);
    }

    if let Some(path) = &args.export_translations {
        export_translations(doc, path)?;
    }

    let doc_out = questionnaire_from_model(doc);
    let pretty = serde_json::to_string_pretty(&doc_out).context(ParsingJsonSnafu {})?;
    if let Some(out) = &args.out {
        write_output(&pretty, out)?;
    }

    // The reference document, if provided for comparison
    if let Some(ref_path) = &args.reference {
        let ref_contents = fs::read_to_string(ref_path).context(OpeningJsonSnafu {})?;
        let ref_js: JSValue =
            serde_json::from_str(ref_contents.as_str()).context(ParsingJsonSnafu {})?;
        let pretty_ref = serde_json::to_string_pretty(&ref_js).context(ParsingJsonSnafu {})?;
        if pretty_ref != pretty {
            warn!("Found differences with the reference document");
            print_diff(pretty_ref.as_str(), pretty.as_str(), "\n");
            whatever!("Difference detected between edited questionnaire and reference document")
        }
    }

    Ok(())
}

// ********* Document data structures ***********

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::Display;

/// A survey channel over which a questionnaire can run.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, PartialOrd, Ord)]
pub enum Mode {
    Sms,
    Ivr,
    MobileWeb,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Sms => "sms",
            Mode::Ivr => "ivr",
            Mode::MobileWeb => "mobileweb",
        }
    }

    pub fn parse(s: &str) -> Option<Mode> {
        match s {
            "sms" => Some(Mode::Sms),
            "ivr" => Some(Mode::Ivr),
            "mobileweb" => Some(Mode::MobileWeb),
            _ => None,
        }
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum AudioSource {
    Tts,
    Upload,
}

impl Default for AudioSource {
    fn default() -> AudioSource {
        AudioSource::Tts
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct IvrPrompt {
    pub text: String,
    pub audio_source: AudioSource,
    pub audio_id: Option<String>,
}

/// The prompt of a step for a single language, over all channels.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Prompt {
    pub sms: String,
    pub ivr: IvrPrompt,
    pub mobileweb: String,
}

/// Per-language prompts, keyed by language code.
pub type LocalizedPrompt = BTreeMap<String, Prompt>;

/// The accepted responses of a choice or a refusal, per channel.
/// SMS and mobile-web responses are per-language; IVR responses are
/// expected to be digits and are shared across languages.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Responses {
    pub sms: BTreeMap<String, Vec<String>>,
    pub ivr: Vec<String>,
    pub mobileweb: BTreeMap<String, String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Choice {
    pub value: String,
    pub responses: Responses,
    pub skip_logic: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Refusal {
    pub enabled: bool,
    pub responses: Responses,
    pub skip_logic: Option<String>,
}

/// A numeric bucket. `None` bounds are only valid at the extremes of
/// the range list (open ended below or above).
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Range {
    pub from: Option<i64>,
    pub to: Option<i64>,
    pub skip_logic: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Disposition {
    Completed,
    InterimPartial,
    Ineligible,
    Refused,
}

impl Default for Disposition {
    fn default() -> Disposition {
        Disposition::InterimPartial
    }
}

impl Disposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Disposition::Completed => "completed",
            Disposition::InterimPartial => "interim partial",
            Disposition::Ineligible => "ineligible",
            Disposition::Refused => "refused",
        }
    }

    pub fn parse(s: &str) -> Option<Disposition> {
        match s {
            "completed" => Some(Disposition::Completed),
            "interim partial" => Some(Disposition::InterimPartial),
            "ineligible" => Some(Disposition::Ineligible),
            "refused" => Some(Disposition::Refused),
            _ => None,
        }
    }
}

/// The kind of a step, used when migrating a step to a new variant.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum StepType {
    MultipleChoice,
    Numeric,
    Explanation,
    Flag,
}

/// One step of the questionnaire. The variant determines which fields
/// exist: there is no way to build, say, a flag step with choices.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Step {
    MultipleChoice {
        id: String,
        title: String,
        store: String,
        prompt: LocalizedPrompt,
        choices: Vec<Choice>,
    },
    Numeric {
        id: String,
        title: String,
        store: String,
        prompt: LocalizedPrompt,
        min_value: Option<i64>,
        max_value: Option<i64>,
        ranges_delimiters: Option<String>,
        ranges: Vec<Range>,
        refusal: Refusal,
        alphabetical_answers: bool,
    },
    Explanation {
        id: String,
        title: String,
        prompt: LocalizedPrompt,
        skip_logic: Option<String>,
    },
    Flag {
        id: String,
        title: String,
        disposition: Disposition,
        skip_logic: Option<String>,
    },
    LanguageSelection {
        id: String,
        title: String,
        store: String,
        prompt: Prompt,
        language_choices: Vec<String>,
    },
}

impl Step {
    pub fn id(&self) -> &str {
        match self {
            Step::MultipleChoice { id, .. } => id,
            Step::Numeric { id, .. } => id,
            Step::Explanation { id, .. } => id,
            Step::Flag { id, .. } => id,
            Step::LanguageSelection { id, .. } => id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Step::MultipleChoice { title, .. } => title,
            Step::Numeric { title, .. } => title,
            Step::Explanation { title, .. } => title,
            Step::Flag { title, .. } => title,
            Step::LanguageSelection { title, .. } => title,
        }
    }

    /// The localized prompt of the step, if the variant carries one.
    pub fn prompt(&self) -> Option<&LocalizedPrompt> {
        match self {
            Step::MultipleChoice { prompt, .. } => Some(prompt),
            Step::Numeric { prompt, .. } => Some(prompt),
            Step::Explanation { prompt, .. } => Some(prompt),
            Step::Flag { .. } => None,
            Step::LanguageSelection { .. } => None,
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct ColorStyle {
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
}

/// Questionnaire-level messages and mobile-web presentation settings.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Settings {
    pub error_message: LocalizedPrompt,
    pub thank_you_message: LocalizedPrompt,
    pub title: BTreeMap<String, String>,
    pub survey_already_taken_message: BTreeMap<String, String>,
    pub mobile_web_sms_message: String,
    pub mobile_web_survey_is_over_message: String,
    pub mobile_web_color_style: ColorStyle,
}

/// The canonical questionnaire document.
///
/// Invariants:
/// - `languages` is non-empty and has no duplicates;
/// - `default_language` and `active_language` belong to `languages`;
/// - step ids are unique across `steps` and `quota_completed_steps`;
/// - when more than one language is configured, the first element of
///   `steps` is a language-selection step over `languages`.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Questionnaire {
    pub id: Option<i64>,
    pub project_id: i64,
    pub name: String,
    pub modes: Vec<Mode>,
    pub active_mode: Option<Mode>,
    pub languages: Vec<String>,
    pub default_language: String,
    pub active_language: String,
    pub steps: Vec<Step>,
    pub quota_completed_steps: Option<Vec<Step>>,
    pub settings: Settings,
    pub valid: bool,
}

// ******** Prompt accessors *********

// Missing language slots read as empty text, like the rest of the
// editor expects.

pub fn prompt_sms(prompt: &LocalizedPrompt, lang: &str) -> String {
    prompt.get(lang).map(|p| p.sms.clone()).unwrap_or_default()
}

pub fn prompt_ivr_text(prompt: &LocalizedPrompt, lang: &str) -> String {
    prompt
        .get(lang)
        .map(|p| p.ivr.text.clone())
        .unwrap_or_default()
}

pub fn prompt_mobileweb(prompt: &LocalizedPrompt, lang: &str) -> String {
    prompt
        .get(lang)
        .map(|p| p.mobileweb.clone())
        .unwrap_or_default()
}

/// SMS responses of a choice for one language, joined for display and
/// export. The inverse is a comma split with per-item trim.
pub fn choice_sms_joined(choice: &Choice, lang: &str) -> String {
    choice
        .responses
        .sms
        .get(lang)
        .map(|rs| rs.join(", "))
        .unwrap_or_default()
}

pub fn choice_mobileweb(choice: &Choice, lang: &str) -> String {
    choice
        .responses
        .mobileweb
        .get(lang)
        .cloned()
        .unwrap_or_default()
}

// ******** Errors *********

/// Unrecoverable invariant violations. These indicate a broken action
/// dispatcher, not bad user input: malformed user input is stored
/// as-is and reported by the validation pass instead.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum EditError {
    /// The referenced step id is in neither step collection.
    StepNotFound(String),
    /// A quota-completed step was added while the quota section is off.
    MissingQuotaCompletedSteps,
}

impl Error for EditError {}

impl Display for EditError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditError::StepNotFound(id) => write!(f, "bug: couldn't find step {}", id),
            EditError::MissingQuotaCompletedSteps => {
                write!(f, "bug: expected quota completed steps to be present")
            }
        }
    }
}

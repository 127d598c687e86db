pub use crate::model::*;

use uuid::Uuid;

/// Constructors for fresh documents and steps.
///
/// ```
/// use questionnaire_engine::{new_questionnaire, Mode};
///
/// let q = new_questionnaire(42);
/// assert_eq!(q.languages, vec!["en".to_string()]);
/// assert_eq!(q.active_mode, Some(Mode::Sms));
/// assert_eq!(q.steps.len(), 1);
/// ```
pub fn new_questionnaire(project_id: i64) -> Questionnaire {
    Questionnaire {
        id: None,
        project_id,
        name: String::new(),
        modes: vec![Mode::Sms, Mode::Ivr],
        active_mode: Some(Mode::Sms),
        languages: vec!["en".to_string()],
        default_language: "en".to_string(),
        active_language: "en".to_string(),
        steps: vec![new_multiple_choice_step()],
        quota_completed_steps: None,
        settings: Settings::default(),
        valid: true,
    }
}

pub fn new_multiple_choice_step() -> Step {
    Step::MultipleChoice {
        id: new_step_id(),
        title: String::new(),
        store: String::new(),
        prompt: LocalizedPrompt::new(),
        choices: vec![],
    }
}

pub fn new_explanation_step() -> Step {
    Step::Explanation {
        id: new_step_id(),
        title: String::new(),
        prompt: LocalizedPrompt::new(),
        skip_logic: None,
    }
}

pub fn new_language_selection_step(first: &str, second: &str) -> Step {
    Step::LanguageSelection {
        id: new_step_id(),
        title: "Language selection".to_string(),
        store: "language".to_string(),
        prompt: Prompt::default(),
        language_choices: vec![first.to_string(), second.to_string()],
    }
}

pub fn new_choice() -> Choice {
    Choice {
        value: String::new(),
        responses: Responses::default(),
        skip_logic: None,
    }
}

pub fn new_refusal() -> Refusal {
    Refusal {
        enabled: false,
        responses: Responses::default(),
        skip_logic: None,
    }
}

pub fn new_prompt() -> Prompt {
    Prompt::default()
}

pub fn new_ivr_prompt() -> IvrPrompt {
    IvrPrompt {
        text: String::new(),
        audio_source: AudioSource::Tts,
        audio_id: None,
    }
}

fn new_step_id() -> String {
    Uuid::new_v4().to_string()
}

/// Updates (or creates) the prompt slot of `lang` in place.
pub fn set_prompt<F>(prompt: &mut LocalizedPrompt, lang: &str, func: F)
where
    F: FnOnce(&mut Prompt),
{
    let slot = prompt.entry(lang.to_string()).or_default();
    func(slot);
}

/// Updates the prompt of a step for `lang`, when the variant carries
/// one. Flag steps have no prompt and are left untouched. The
/// language-selection prompt is not localized; edits go to its single
/// slot whatever the language.
pub fn set_step_prompt<F>(step: &Step, lang: &str, func: F) -> Step
where
    F: FnOnce(&mut Prompt),
{
    let mut new_step = step.clone();
    match &mut new_step {
        Step::MultipleChoice { prompt, .. } => set_prompt(prompt, lang, func),
        Step::Numeric { prompt, .. } => set_prompt(prompt, lang, func),
        Step::Explanation { prompt, .. } => set_prompt(prompt, lang, func),
        Step::LanguageSelection { prompt, .. } => func(prompt),
        Step::Flag { .. } => {}
    }
    new_step
}

/// Splits a comma-separated response list, trimming each item and
/// dropping empty ones.
pub fn split_values(values: &str) -> Vec<String> {
    values
        .split(',')
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .collect()
}

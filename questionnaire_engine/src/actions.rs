// ********* Edit-action protocol ***********

use crate::model::{AudioSource, Disposition, Mode, StepType};

/// Which questionnaire-level message an action targets.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum MsgKey {
    ErrorMessage,
    ThankYouMessage,
}

/// A suggestion picked from the translation autocomplete: the
/// default-language text plus known translations.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TranslationItem {
    pub text: String,
    pub translations: Vec<ItemTranslation>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ItemTranslation {
    pub language: Option<String>,
    pub text: String,
}

/// The full edit of one choice row, as submitted by the form.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ChoiceChange {
    pub index: usize,
    pub response: String,
    pub sms_values: String,
    pub ivr_values: String,
    pub mobileweb_values: String,
    pub skip_logic: Option<String>,
    pub auto_complete: bool,
}

/// The discrete messages that mutate a questionnaire. Feeding these to
/// [`crate::apply`] is the only way a document changes.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Action {
    ChangeName {
        new_name: String,
    },
    SetActiveMode {
        mode: Mode,
    },
    AddMode {
        mode: Mode,
    },
    RemoveMode {
        mode: Mode,
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
    /// `index` is 1-based, matching the positions shown in the
    /// language list of the editor.
    ReorderLanguages {
        language: String,
        index: usize,
    },
    SetSmsQuestionnaireMsg {
        msg_key: MsgKey,
        text: String,
    },
    SetIvrQuestionnaireMsg {
        msg_key: MsgKey,
        text: String,
        audio_source: AudioSource,
        audio_id: Option<String>,
    },
    SetMobileWebQuestionnaireMsg {
        msg_key: MsgKey,
        text: String,
    },
    AutocompleteSmsQuestionnaireMsg {
        msg_key: MsgKey,
        item: TranslationItem,
    },
    AutocompleteIvrQuestionnaireMsg {
        msg_key: MsgKey,
        item: TranslationItem,
    },
    /// Applies an imported translation table (header row of language
    /// names, then one row per source string).
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
        source_step_id: String,
        target_step_id: String,
    },
    MoveStepToTop {
        step_id: String,
    },
    ChangeStepTitle {
        step_id: String,
        new_title: String,
    },
    ChangeStepType {
        step_id: String,
        step_type: StepType,
    },
    ChangeStepPromptSms {
        step_id: String,
        new_prompt: String,
    },
    ChangeStepPromptIvr {
        step_id: String,
        text: String,
        audio_source: AudioSource,
    },
    ChangeStepPromptMobileWeb {
        step_id: String,
        new_prompt: String,
    },
    ChangeStepAudioIdIvr {
        step_id: String,
        new_id: String,
    },
    ChangeStepStore {
        step_id: String,
        new_store: String,
    },
    AutocompleteStepPromptSms {
        step_id: String,
        item: TranslationItem,
    },
    AutocompleteStepPromptIvr {
        step_id: String,
        item: TranslationItem,
    },
    DeleteStep {
        step_id: String,
    },
    AddChoice {
        step_id: String,
    },
    DeleteChoice {
        step_id: String,
        index: usize,
    },
    ChangeChoice {
        step_id: String,
        choice_change: ChoiceChange,
    },
    AutocompleteChoiceSmsValues {
        step_id: String,
        index: usize,
        item: TranslationItem,
    },
    ChangeNumericRanges {
        step_id: String,
        min_value: Option<i64>,
        max_value: Option<i64>,
        ranges_delimiters: Option<String>,
    },
    ChangeRangeSkipLogic {
        step_id: String,
        range_index: usize,
        skip_logic: Option<String>,
    },
    ChangeExplanationStepSkipLogic {
        step_id: String,
        skip_logic: Option<String>,
    },
    ChangeDisposition {
        step_id: String,
        disposition: Disposition,
    },
    ToggleAcceptRefusals {
        step_id: String,
    },
    ToggleAcceptsAlphabeticalAnswers {
        step_id: String,
    },
    ChangeRefusal {
        step_id: String,
        sms_values: String,
        ivr_values: String,
        mobileweb_values: String,
        skip_logic: Option<String>,
    },
    /// Forces the autosave cycle without changing the document.
    SetDirty,
}

impl Action {
    /// Whether the action represents a real edit. View-only actions
    /// never mark the document dirty (they must not trigger autosave).
    pub fn is_view_only(&self) -> bool {
        matches!(
            self,
            Action::SetActiveLanguage { .. } | Action::SetActiveMode { .. }
        )
    }
}

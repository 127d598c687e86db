//! The questionnaire document store: owns the canonical document, its
//! fetch/save lifecycle flags, and the validation status. Editing goes
//! through [`crate::apply`]; the store adds dirty tracking (for the
//! autosave collaborator) and runs the validation pass once per
//! mutating action.

use log::debug;

use crate::actions::Action;
use crate::model::{EditError, Questionnaire};
use crate::validation::{validate, ValidationError};
use crate::{apply, new_questionnaire};

/// Identifies which document the store is editing. A fetched document
/// whose identity does not match the installed filter is stale and
/// gets dropped.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Filter {
    pub project_id: i64,
    pub questionnaire_id: Option<i64>,
}

impl Filter {
    fn of(doc: &Questionnaire) -> Filter {
        Filter {
            project_id: doc.project_id,
            questionnaire_id: doc.id,
        }
    }
}

/// Lifecycle messages around the pure edit actions.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum StoreAction {
    /// A fetch has started for the given document identity.
    Fetch {
        project_id: i64,
        questionnaire_id: Option<i64>,
    },
    /// A fetched document arrived.
    Receive(Questionnaire),
    /// Start a brand new questionnaire for a project.
    New { project_id: i64 },
    /// The save collaborator started persisting the document.
    Saving,
    /// The save finished; the server may echo an updated document.
    Saved(Option<Questionnaire>),
    /// A regular edit.
    Edit(Action),
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct QuestionnaireStore {
    pub fetching: bool,
    pub dirty: bool,
    pub saving: bool,
    pub filter: Option<Filter>,
    pub data: Option<Questionnaire>,
    pub errors: Vec<ValidationError>,
}

impl QuestionnaireStore {
    pub fn new() -> QuestionnaireStore {
        QuestionnaireStore::default()
    }

    pub fn dispatch(&mut self, action: StoreAction) -> Result<(), EditError> {
        match action {
            StoreAction::Fetch {
                project_id,
                questionnaire_id,
            } => {
                let new_filter = Filter {
                    project_id,
                    questionnaire_id,
                };
                // Refetching the same document keeps showing the data
                // we have; switching documents does not.
                if self.filter.as_ref() != Some(&new_filter) {
                    self.data = None;
                }
                self.filter = Some(new_filter);
                self.fetching = true;
                Ok(())
            }
            StoreAction::Receive(doc) => {
                if self.filter.as_ref() == Some(&Filter::of(&doc)) {
                    self.fetching = false;
                    self.data = Some(doc);
                    self.revalidate();
                } else {
                    debug!("dropping stale questionnaire {:?}", Filter::of(&doc));
                }
                Ok(())
            }
            StoreAction::New { project_id } => {
                self.filter = Some(Filter {
                    project_id,
                    questionnaire_id: None,
                });
                self.fetching = false;
                self.data = Some(new_questionnaire(project_id));
                self.revalidate();
                Ok(())
            }
            StoreAction::Saving => {
                self.dirty = false;
                self.saving = true;
                Ok(())
            }
            StoreAction::Saved(doc) => {
                self.saving = false;
                if let Some(doc) = doc {
                    self.data = Some(doc);
                    self.revalidate();
                }
                Ok(())
            }
            StoreAction::Edit(action) => self.edit(&action),
        }
    }

    fn edit(&mut self, action: &Action) -> Result<(), EditError> {
        let data = match &self.data {
            Some(d) => d,
            None => return Ok(()),
        };
        let new_data = apply(data, action)?;

        // SetDirty exists to force an autosave: it produces an equal
        // document but still counts as a change.
        let changed = new_data != *data || matches!(action, Action::SetDirty);
        if changed {
            if !action.is_view_only() {
                self.dirty = true;
            }
            self.data = Some(new_data);
            self.revalidate();
        }
        Ok(())
    }

    fn revalidate(&mut self) {
        if let Some(data) = self.data.as_mut() {
            self.errors = validate(data);
            data.valid = self.errors.is_empty();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Mode;

    fn store_with_new_doc() -> QuestionnaireStore {
        let mut store = QuestionnaireStore::new();
        store.dispatch(StoreAction::New { project_id: 7 }).unwrap();
        store
    }

    #[test]
    fn edits_mark_the_store_dirty() {
        let mut store = store_with_new_doc();
        assert!(!store.dirty);
        store
            .dispatch(StoreAction::Edit(Action::ChangeName {
                new_name: "  survey  ".to_string(),
            }))
            .unwrap();
        assert!(store.dirty);
        assert_eq!(store.data.as_ref().unwrap().name, "survey");
    }

    #[test]
    fn view_only_actions_do_not_mark_dirty() {
        let mut store = store_with_new_doc();
        store
            .dispatch(StoreAction::Edit(Action::SetActiveMode { mode: Mode::Ivr }))
            .unwrap();
        assert!(!store.dirty);
        assert_eq!(store.data.as_ref().unwrap().active_mode, Some(Mode::Ivr));
    }

    #[test]
    fn set_dirty_forces_the_flag() {
        let mut store = store_with_new_doc();
        store.dispatch(StoreAction::Edit(Action::SetDirty)).unwrap();
        assert!(store.dirty);
    }

    #[test]
    fn stale_receive_is_dropped() {
        let mut store = QuestionnaireStore::new();
        store
            .dispatch(StoreAction::Fetch {
                project_id: 1,
                questionnaire_id: Some(10),
            })
            .unwrap();

        let mut stale = new_questionnaire(1);
        stale.id = Some(99);
        store.dispatch(StoreAction::Receive(stale)).unwrap();
        assert!(store.data.is_none());
        assert!(store.fetching);

        let mut fresh = new_questionnaire(1);
        fresh.id = Some(10);
        store.dispatch(StoreAction::Receive(fresh)).unwrap();
        assert!(store.data.is_some());
        assert!(!store.fetching);
    }

    #[test]
    fn saving_clears_dirty() {
        let mut store = store_with_new_doc();
        store
            .dispatch(StoreAction::Edit(Action::ChangeName {
                new_name: "s".to_string(),
            }))
            .unwrap();
        assert!(store.dirty);
        store.dispatch(StoreAction::Saving).unwrap();
        assert!(!store.dirty);
        assert!(store.saving);
        store.dispatch(StoreAction::Saved(None)).unwrap();
        assert!(!store.saving);
    }

    #[test]
    fn validation_runs_after_each_edit() {
        let mut store = store_with_new_doc();
        assert!(!store.errors.is_empty());
        assert!(!store.data.as_ref().unwrap().valid);
    }
}

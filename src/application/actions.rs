//! Confirmation state machine gating row actions.
//!
//! One controller owns one [`ActionMachine`]. A mutation can only be started
//! from `Confirming`, hands out a [`Submission`] ticket, and the machine stays
//! in `Submitting` until that ticket is returned through
//! [`ActionMachine::finish`]. Opening, cancelling or starting another action
//! while a ticket is outstanding is refused.

use std::mem;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::entities::Listable;
use crate::domain::error::DomainError;

/// Phrase a destructive action must be confirmed with, verbatim.
pub const DELETE_CONFIRMATION_PHRASE: &str = "PERMANENTLY DELETE";

/// Minimum length of the reason attached to a destructive action.
pub const MIN_DELETE_REASON_CHARS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionVerb {
    Publish,
    Unpublish,
    Archive,
    Delete,
    Activate,
    Deactivate,
}

impl ActionVerb {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionVerb::Publish => "publish",
            ActionVerb::Unpublish => "unpublish",
            ActionVerb::Archive => "archive",
            ActionVerb::Delete => "delete",
            ActionVerb::Activate => "activate",
            ActionVerb::Deactivate => "deactivate",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ActionVerb::Publish => "Publish",
            ActionVerb::Unpublish => "Unpublish",
            ActionVerb::Archive => "Archive",
            ActionVerb::Delete => "Delete",
            ActionVerb::Activate => "Activate",
            ActionVerb::Deactivate => "Deactivate",
        }
    }

    pub fn past_tense(self) -> &'static str {
        match self {
            ActionVerb::Publish => "published",
            ActionVerb::Unpublish => "unpublished",
            ActionVerb::Archive => "archived",
            ActionVerb::Delete => "deleted",
            ActionVerb::Activate => "activated",
            ActionVerb::Deactivate => "deactivated",
        }
    }

    pub fn is_destructive(self) -> bool {
        matches!(self, ActionVerb::Delete)
    }

    pub fn parse(value: &str) -> Result<Self, DomainError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "publish" => Ok(ActionVerb::Publish),
            "unpublish" => Ok(ActionVerb::Unpublish),
            "archive" => Ok(ActionVerb::Archive),
            "delete" => Ok(ActionVerb::Delete),
            "activate" => Ok(ActionVerb::Activate),
            "deactivate" => Ok(ActionVerb::Deactivate),
            other => Err(DomainError::validation(
                "action",
                format!("unknown action `{other}`"),
            )),
        }
    }
}

/// What the operator typed into the confirmation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfirmationInput {
    pub reason: String,
    pub confirmation_text: String,
    pub message: Option<String>,
}

impl ConfirmationInput {
    /// Optional note for non-destructive actions, blank treated as absent.
    pub fn note(&self) -> Option<&str> {
        self.message
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("reason must be at least {min} characters (got {actual})")]
    ReasonTooShort { min: usize, actual: usize },
    #[error("type `{DELETE_CONFIRMATION_PHRASE}` exactly to confirm")]
    PhraseMismatch,
}

/// Whether `input` unlocks the confirm control for `verb`.
pub fn check_gate(verb: ActionVerb, input: &ConfirmationInput) -> Result<(), GateError> {
    if !verb.is_destructive() {
        return Ok(());
    }
    let actual = input.reason.trim().chars().count();
    if actual < MIN_DELETE_REASON_CHARS {
        return Err(GateError::ReasonTooShort {
            min: MIN_DELETE_REASON_CHARS,
            actual,
        });
    }
    if input.confirmation_text != DELETE_CONFIRMATION_PHRASE {
        return Err(GateError::PhraseMismatch);
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("another action is still being submitted")]
    InFlight,
    #[error("no action is awaiting confirmation")]
    NothingToConfirm,
    #[error(transparent)]
    Gate(#[from] GateError),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PendingAction<T> {
    #[default]
    Idle,
    Confirming {
        target: T,
        verb: ActionVerb,
        input: ConfirmationInput,
    },
    Submitting {
        target: T,
        verb: ActionVerb,
    },
    Failed {
        target: T,
        verb: ActionVerb,
        reason: String,
    },
}

/// Ticket for the one in-flight mutation. Must be handed back to `finish`.
#[derive(Debug)]
#[must_use = "a submission must be finished to release the action machine"]
pub struct Submission<T> {
    target: T,
    verb: ActionVerb,
    input: ConfirmationInput,
}

impl<T> Submission<T> {
    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn verb(&self) -> ActionVerb {
        self.verb
    }

    pub fn input(&self) -> &ConfirmationInput {
        &self.input
    }
}

#[derive(Debug, Default)]
pub struct ActionMachine<T> {
    state: PendingAction<T>,
}

impl<T: Listable> ActionMachine<T> {
    pub fn new() -> Self {
        Self {
            state: PendingAction::Idle,
        }
    }

    pub fn state(&self) -> &PendingAction<T> {
        &self.state
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.state, PendingAction::Submitting { .. })
    }

    /// Whether row actions for `id` must be disabled.
    pub fn is_locked(&self, id: Uuid) -> bool {
        match &self.state {
            PendingAction::Submitting { target, .. } => target.id() == id,
            _ => false,
        }
    }

    /// Open the confirmation for `verb` on `target`, replacing any idle, failed or
    /// unconfirmed action.
    pub fn open(&mut self, target: T, verb: ActionVerb) -> Result<(), ActionError> {
        if self.is_submitting() {
            return Err(ActionError::InFlight);
        }
        self.state = PendingAction::Confirming {
            target,
            verb,
            input: ConfirmationInput::default(),
        };
        Ok(())
    }

    pub fn input_mut(&mut self) -> Option<&mut ConfirmationInput> {
        match &mut self.state {
            PendingAction::Confirming { input, .. } => Some(input),
            _ => None,
        }
    }

    /// Whether the confirm control is enabled.
    pub fn can_confirm(&self) -> bool {
        match &self.state {
            PendingAction::Confirming { verb, input, .. } => check_gate(*verb, input).is_ok(),
            _ => false,
        }
    }

    pub fn cancel(&mut self) -> Result<(), ActionError> {
        if self.is_submitting() {
            return Err(ActionError::InFlight);
        }
        self.state = PendingAction::Idle;
        Ok(())
    }

    /// Move from `Confirming` to `Submitting` if the gate allows it.
    pub fn begin(&mut self) -> Result<Submission<T>, ActionError> {
        match mem::take(&mut self.state) {
            PendingAction::Confirming {
                target,
                verb,
                input,
            } => {
                if let Err(err) = check_gate(verb, &input) {
                    self.state = PendingAction::Confirming {
                        target,
                        verb,
                        input,
                    };
                    return Err(err.into());
                }
                self.state = PendingAction::Submitting {
                    target: target.clone(),
                    verb,
                };
                Ok(Submission {
                    target,
                    verb,
                    input,
                })
            }
            submitting @ PendingAction::Submitting { .. } => {
                self.state = submitting;
                Err(ActionError::InFlight)
            }
            other => {
                self.state = other;
                Err(ActionError::NothingToConfirm)
            }
        }
    }

    /// Release the machine after the mutation settled.
    pub fn finish(&mut self, submission: Submission<T>, outcome: Result<(), String>) {
        let Submission { target, verb, .. } = submission;
        self.state = match outcome {
            Ok(()) => PendingAction::Idle,
            Err(reason) => PendingAction::Failed {
                target,
                verb,
                reason,
            },
        };
    }
}

#[cfg(test)]
mod tests {
    use collabdesk_api_types::ProjectStatus;
    use time::macros::datetime;

    use super::*;
    use crate::domain::entities::ProjectRecord;

    fn project() -> ProjectRecord {
        ProjectRecord {
            id: Uuid::new_v4(),
            title: "Soil microbiome".into(),
            abstract_text: None,
            category: None,
            status: ProjectStatus::Active,
            owner: None,
            assigned_instructor: None,
            institution: None,
            created_at: datetime!(2025-04-01 00:00 UTC),
        }
    }

    fn delete_input(reason: &str, phrase: &str) -> ConfirmationInput {
        ConfirmationInput {
            reason: reason.into(),
            confirmation_text: phrase.into(),
            message: None,
        }
    }

    #[test]
    fn delete_gate_requires_reason_and_exact_phrase() {
        let long_reason = "Duplicate of an existing project entry";
        assert_eq!(
            check_gate(ActionVerb::Delete, &delete_input(long_reason, DELETE_CONFIRMATION_PHRASE)),
            Ok(())
        );
        assert_eq!(
            check_gate(ActionVerb::Delete, &delete_input(long_reason, "permanently delete")),
            Err(GateError::PhraseMismatch)
        );
        assert_eq!(
            check_gate(ActionVerb::Delete, &delete_input("short", DELETE_CONFIRMATION_PHRASE)),
            Err(GateError::ReasonTooShort { min: 20, actual: 5 })
        );
    }

    #[test]
    fn every_reason_shorter_than_twenty_chars_is_blocked() {
        for len in 0..MIN_DELETE_REASON_CHARS {
            let reason = "x".repeat(len);
            assert!(
                check_gate(ActionVerb::Delete, &delete_input(&reason, DELETE_CONFIRMATION_PHRASE))
                    .is_err(),
                "len={len}"
            );
        }
        let padded = format!("{:>25}", "abc");
        assert!(check_gate(ActionVerb::Delete, &delete_input(&padded, DELETE_CONFIRMATION_PHRASE)).is_err());
    }

    #[test]
    fn non_destructive_actions_have_no_guard() {
        for verb in [
            ActionVerb::Publish,
            ActionVerb::Unpublish,
            ActionVerb::Archive,
            ActionVerb::Activate,
            ActionVerb::Deactivate,
        ] {
            assert_eq!(check_gate(verb, &ConfirmationInput::default()), Ok(()));
        }
    }

    #[test]
    fn short_reason_keeps_confirmation_open() {
        let mut machine = ActionMachine::new();
        machine.open(project(), ActionVerb::Delete).expect("open");
        {
            let input = machine.input_mut().expect("confirming");
            input.reason = "short".into();
            input.confirmation_text = DELETE_CONFIRMATION_PHRASE.into();
        }

        assert!(!machine.can_confirm());
        let err = machine.begin().expect_err("gate closed");
        assert!(matches!(err, ActionError::Gate(GateError::ReasonTooShort { .. })));
        assert!(matches!(machine.state(), PendingAction::Confirming { .. }));
    }

    #[test]
    fn single_flight_while_submitting() {
        let target = project();
        let id = target.id;
        let mut machine = ActionMachine::new();
        machine.open(target, ActionVerb::Deactivate).expect("open");
        let ticket = machine.begin().expect("no gate for deactivate");

        assert!(machine.is_locked(id));
        assert!(!machine.is_locked(Uuid::new_v4()));
        assert_eq!(machine.open(project(), ActionVerb::Delete), Err(ActionError::InFlight));
        assert_eq!(machine.cancel(), Err(ActionError::InFlight));
        assert!(matches!(machine.begin(), Err(ActionError::InFlight)));

        machine.finish(ticket, Ok(()));
        assert_eq!(machine.state(), &PendingAction::Idle);
        assert!(!machine.is_locked(id));
    }

    #[test]
    fn failure_is_recorded_and_non_blocking() {
        let mut machine = ActionMachine::new();
        machine.open(project(), ActionVerb::Activate).expect("open");
        let ticket = machine.begin().expect("begin");
        machine.finish(ticket, Err("Project owner is suspended".into()));

        match machine.state() {
            PendingAction::Failed { verb, reason, .. } => {
                assert_eq!(*verb, ActionVerb::Activate);
                assert_eq!(reason, "Project owner is suspended");
            }
            other => panic!("unexpected state {other:?}"),
        }

        machine.open(project(), ActionVerb::Deactivate).expect("reopen after failure");
        machine.cancel().expect("cancel");
        assert_eq!(machine.state(), &PendingAction::Idle);
    }

    #[test]
    fn begin_without_confirmation_is_refused() {
        let mut machine: ActionMachine<ProjectRecord> = ActionMachine::new();
        assert!(matches!(machine.begin(), Err(ActionError::NothingToConfirm)));
        assert!(!machine.can_confirm());
        assert!(machine.input_mut().is_none());
    }

    #[test]
    fn blank_message_is_not_a_note() {
        let input = ConfirmationInput {
            message: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(input.note(), None);
    }
}

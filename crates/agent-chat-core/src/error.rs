use thiserror::Error;

use crate::flow::{FlowEvent, Screen};

/// Errors raised by the session state machine.
///
/// Network failures are not represented here: they are reduced into the
/// transcript by the dispatcher and never surface as `ChatError`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    #[error("missing credential: {0}")]
    MissingCredential(&'static str),

    #[error("cannot apply {event} while {from}")]
    InvalidTransition { from: Screen, event: &'static str },
}

impl ChatError {
    pub(crate) fn invalid(from: Screen, event: &FlowEvent) -> Self {
        ChatError::InvalidTransition {
            from,
            event: event.name(),
        }
    }
}

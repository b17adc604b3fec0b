//! State machine plumbing shared by transfers, allocations and pick lists
//!
//! Each workflow entity owns a status enum with an explicit transition table.
//! Illegal transitions are rejected here rather than at individual call sites.

use thiserror::Error;

/// Rejected state transition
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Cannot {action} this {entity} (status: {from})")]
pub struct TransitionError {
    pub entity: &'static str,
    pub action: String,
    pub from: String,
}

/// Error returned when a stored status string is not recognised
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown {kind}: {value}")]
pub struct ParseStatusError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseStatusError {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// A status enum driven by a transition table
pub trait StateMachine: Copy + std::fmt::Display {
    type Action: Copy + std::fmt::Display;

    /// Entity name used in error messages
    const ENTITY: &'static str;

    /// Transition table; `None` means the action is not allowed from `self`
    fn next(self, action: Self::Action) -> Option<Self>;

    /// Apply an action, rejecting illegal transitions
    fn apply(self, action: Self::Action) -> Result<Self, TransitionError> {
        self.next(action).ok_or_else(|| TransitionError {
            entity: Self::ENTITY,
            action: action.to_string(),
            from: self.to_string(),
        })
    }

    fn can(self, action: Self::Action) -> bool {
        self.next(action).is_some()
    }
}

//! Lookup state record and its transitions.
//!
//! `LookupState` is immutable from the outside. Each transition consumes the
//! old record and returns the next one; the controller is the only caller.

use crate::types::Address;

/// Whether a lookup is outstanding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Awaiting,
}

/// What the last resolved lookup produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing has resolved yet.
    #[default]
    Empty,
    Found(Address),
    Failed(String),
}

/// Snapshot handed to the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupState {
    code: String,
    outcome: Outcome,
    phase: Phase,
}

impl LookupState {
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_awaiting(&self) -> bool {
        self.phase == Phase::Awaiting
    }

    /// The resolved address, if the last lookup succeeded.
    pub fn result(&self) -> Option<&Address> {
        match &self.outcome {
            Outcome::Found(address) => Some(address),
            _ => None,
        }
    }

    /// The error message, if the last lookup failed.
    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub(crate) fn with_code(self, code: String) -> Self {
        Self { code, ..self }
    }

    /// Enter `Awaiting`. The previous outcome stays visible.
    pub(crate) fn awaiting(self) -> Self {
        Self {
            phase: Phase::Awaiting,
            ..self
        }
    }

    /// Replace the outcome wholesale and return to `Idle`.
    pub(crate) fn resolved(self, outcome: Outcome) -> Self {
        Self {
            outcome,
            phase: Phase::Idle,
            ..self
        }
    }
}

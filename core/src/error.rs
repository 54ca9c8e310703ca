//! Error types for the lookup client and controller.
//!
//! # Design
//! `LookupError` keeps the kinds apart so logs and tests can tell them
//! apart, while `user_message` collapses them into the one string the
//! presentation layer shows. Only a server-reported failure can carry its
//! own text; every other failure shows the generic fallback.

use thiserror::Error;

/// Shown for any failure that carries no server-supplied message.
pub const FALLBACK_MESSAGE: &str = "Erro ao buscar o endereço";

/// Shown when the input is rejected before any request is made.
pub const INVALID_POSTAL_CODE_MESSAGE: &str = "CEP inválido";

/// A request that never produced a response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("transport failure: {0}")]
pub struct TransportError(pub String);

impl TransportError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Errors returned by `ViaCepClient` and recorded by the controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// A response arrived and the service reported a failure, either through
    /// a non-2xx status or ViaCEP's `erro` marker.
    #[error("lookup failed with HTTP {status}")]
    ServerReported {
        status: u16,
        message: Option<String>,
    },

    /// The request could not be completed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A 2xx body could not be decoded into an address.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The input is not a well-formed postal code.
    #[error("invalid postal code: {0:?}")]
    InvalidPostalCode(String),
}

impl LookupError {
    /// The message the presentation layer displays for this failure.
    pub fn user_message(&self) -> String {
        match self {
            LookupError::ServerReported {
                message: Some(message),
                ..
            } if !message.is_empty() => message.clone(),
            LookupError::InvalidPostalCode(_) => INVALID_POSTAL_CODE_MESSAGE.to_string(),
            _ => FALLBACK_MESSAGE.to_string(),
        }
    }
}

/// Controller steps called out of order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// `begin_submit` while a lookup is still outstanding.
    #[error("a lookup is already in flight")]
    InFlight,

    /// A completion arrived while no lookup was outstanding.
    #[error("no lookup is in flight")]
    NotAwaiting,

    /// The code failed validation; the state already holds the error.
    #[error("invalid postal code: {0:?}")]
    InvalidPostalCode(String),
}

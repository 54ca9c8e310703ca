//! Stateless HTTP request builder and response parser for ViaCEP.
//!
//! # Design
//! `ViaCepClient` holds only a `base_url`. A lookup is split into
//! `build_lookup`, which produces an `HttpRequest`, and `parse_lookup`, which
//! consumes an `HttpResponse`. The caller executes the HTTP round trip,
//! keeping the core deterministic and free of I/O dependencies.

use crate::error::LookupError;
use crate::http::{HttpRequest, HttpResponse};
use crate::postal_code::PostalCode;
use crate::types::{Address, FailurePayload};

/// Public ViaCEP endpoint.
pub const DEFAULT_BASE_URL: &str = "https://viacep.com.br/ws";

/// The only response format the parser understands.
pub const RESPONSE_FORMAT: &str = "json";

/// Synchronous, stateless client for the ViaCEP API.
#[derive(Debug, Clone)]
pub struct ViaCepClient {
    base_url: String,
}

impl Default for ViaCepClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl ViaCepClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET {base_url}/{code}/json/`
    pub fn build_lookup(&self, code: &PostalCode) -> HttpRequest {
        HttpRequest {
            url: format!("{}/{code}/{RESPONSE_FORMAT}/", self.base_url),
            headers: vec![("accept".to_string(), "application/json".to_string())],
        }
    }

    pub fn parse_lookup(&self, response: HttpResponse) -> Result<Address, LookupError> {
        if !response.is_success() {
            // Non-JSON error bodies are common (HTML error pages); they just
            // carry no message.
            let failure: FailurePayload = serde_json::from_str(&response.body).unwrap_or_default();
            return Err(LookupError::ServerReported {
                status: response.status,
                message: failure.message,
            });
        }

        let value: serde_json::Value = serde_json::from_str(&response.body)
            .map_err(|e| LookupError::Deserialization(e.to_string()))?;

        let failure: FailurePayload = serde_json::from_value(value.clone()).unwrap_or_default();
        if failure.is_failure_marker() {
            return Err(LookupError::ServerReported {
                status: response.status,
                message: failure.message,
            });
        }

        serde_json::from_value(value).map_err(|e| LookupError::Deserialization(e.to_string()))
    }
}

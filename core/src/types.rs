//! Domain DTOs for the ViaCEP API.
//!
//! # Design
//! `Address` keeps only the five fields the component renders and maps them
//! from ViaCEP's Portuguese keys. Values are kept verbatim: no trimming, no
//! case folding. The mock-server defines its own payload type; integration
//! tests catch drift between the two.
//!
//! `cep`, `localidade` and `uf` are required. ViaCEP sends all three for every
//! code it knows, including city-wide codes, so a 2xx body without them is not
//! an address and decodes to `LookupError::Deserialization` (the user sees the
//! generic message, never an address block with blank lines). `logradouro` and
//! `bairro` are legitimately empty or absent for city-wide codes and default
//! to `""`.

use serde::{Deserialize, Serialize};

/// An address resolved from a postal code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Address {
    #[serde(rename = "cep")]
    pub postal_code: String,
    #[serde(rename = "logradouro", default)]
    pub street: String,
    #[serde(rename = "bairro", default)]
    pub district: String,
    #[serde(rename = "localidade")]
    pub city: String,
    #[serde(rename = "uf")]
    pub state_code: String,
}

/// Failure body. ViaCEP signals an unknown code with `{"erro": true}` (older
/// deployments send the string `"true"`); other errors may carry a `message`.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct FailurePayload {
    #[serde(default)]
    pub erro: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl FailurePayload {
    pub(crate) fn is_failure_marker(&self) -> bool {
        match &self.erro {
            Some(serde_json::Value::Bool(flag)) => *flag,
            Some(serde_json::Value::String(flag)) => flag.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }
}

//! Client-side validation of user-entered postal codes.
//!
//! # Design
//! A CEP is eight ASCII digits. Users commonly type the display form
//! `NNNNN-NNN`, so one hyphen in that position is accepted and stripped.
//! Surrounding whitespace is ignored. Anything else is rejected before a
//! request is built, which also keeps arbitrary text out of the URL path.

use std::fmt;

use crate::error::LookupError;

/// Number of digits in a CEP.
pub const POSTAL_CODE_DIGITS: usize = 8;

/// A validated, normalized CEP (exactly eight ASCII digits).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PostalCode(String);

impl PostalCode {
    /// Normalize and validate raw input.
    pub fn parse(raw: &str) -> Result<Self, LookupError> {
        let trimmed = raw.trim();
        let digits = match trimmed.split_once('-') {
            Some((head, tail)) if head.len() == 5 && tail.len() == 3 => {
                format!("{head}{tail}")
            }
            Some(_) => return Err(LookupError::InvalidPostalCode(raw.to_string())),
            None => trimmed.to_string(),
        };

        if digits.len() != POSTAL_CODE_DIGITS || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(LookupError::InvalidPostalCode(raw.to_string()));
        }
        Ok(Self(digits))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `NNNNN-NNN` form shown to users.
    pub fn display_form(&self) -> String {
        format!("{}-{}", &self.0[..5], &self.0[5..])
    }
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

use std::fmt;

use ahavault_protocol::constants::{PICKUP_CODE_CHARSET, PICKUP_CODE_LEN, PICKUP_INPUT_MAX_LEN};

/// Rejections raised before any lookup is attempted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodeError {
    #[error("Please enter a valid 8-digit code")]
    TooShort,
}

/// A pickup code that passed local validation.
///
/// Validation is deliberately lenient: only the length is checked, and the
/// backend has the final say on whether a code exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PickupCode(String);

impl PickupCode {
    /// Normalizes raw keystrokes the way the input box does: uppercased and
    /// capped at [`PICKUP_INPUT_MAX_LEN`] characters.
    pub fn normalize_input(input: &str) -> String {
        input
            .chars()
            .take(PICKUP_INPUT_MAX_LEN)
            .collect::<String>()
            .to_uppercase()
    }

    /// Validates `input`, returning the uppercased code.
    pub fn parse(input: &str) -> Result<Self, CodeError> {
        let code = Self::normalize_input(input);
        if code.chars().count() < PICKUP_CODE_LEN {
            return Err(CodeError::TooShort);
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Alphanumeric characters only, separators dropped.
    pub fn significant(&self) -> String {
        self.0.chars().filter(char::is_ascii_alphanumeric).collect()
    }

    /// Whether the code is exactly eight characters from the backend's
    /// alphabet. Codes that fail this are still sent as typed.
    pub fn is_canonical(&self) -> bool {
        let significant = self.significant();
        significant.len() == PICKUP_CODE_LEN
            && significant.chars().all(|c| PICKUP_CODE_CHARSET.contains(c))
    }

    /// `XXXX-XXXX` for canonical codes, the code as typed otherwise.
    pub fn display_form(&self) -> String {
        if !self.is_canonical() {
            return self.0.clone();
        }
        let significant = self.significant();
        let (head, tail) = significant.split_at(PICKUP_CODE_LEN / 2);
        format!("{head}-{tail}")
    }
}

impl fmt::Display for PickupCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PickupCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

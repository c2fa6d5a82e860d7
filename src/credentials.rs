//! Replicate API token checks
//!
//! The check is advisory: callers warn on a bad token but keep going.

const TOKEN_PREFIX: &str = "r8_";
const TOKEN_LEN: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    Missing,
    Malformed,
    Valid,
}

impl TokenStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Message shown next to the token input.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Missing | Self::Malformed => "Please enter your credentials!",
            Self::Valid => "Proceed to entering your prompt message!",
        }
    }
}

/// A token is well-formed when it starts with `r8_` and is 40 characters long.
///
/// The token is checked as entered; surrounding whitespace makes it malformed.
pub fn check_token(token: Option<&str>) -> TokenStatus {
    match token {
        None | Some("") => TokenStatus::Missing,
        Some(token) if token.starts_with(TOKEN_PREFIX) && token.chars().count() == TOKEN_LEN => {
            TokenStatus::Valid
        }
        Some(_) => TokenStatus::Malformed,
    }
}

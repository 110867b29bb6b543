//! Closed set of upstream providers.

use bigstep_core::constants::{PROVIDER_GEMINI, PROVIDER_OPENAI};

use crate::error::RelayError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    Gemini,
}

impl Provider {
    /// Parse a stored provider tag. Tags are matched case-insensitively.
    pub fn from_tag(tag: &str) -> Result<Self, RelayError> {
        match tag.trim().to_lowercase().as_str() {
            PROVIDER_OPENAI => Ok(Provider::OpenAi),
            PROVIDER_GEMINI => Ok(Provider::Gemini),
            _ => Err(RelayError::ProviderUnsupported(tag.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => PROVIDER_OPENAI,
            Provider::Gemini => PROVIDER_GEMINI,
        }
    }
}

use thiserror::Error;

/// Message shown when no API key could be found at startup.
pub const MISSING_API_KEY_MESSAGE: &str =
    "The Gemini API key is not configured. Set GEMINI_API_KEY or add api_key to the config file.";

/// Message shown when a 2xx response carries no usable text.
pub const UNEXPECTED_SHAPE_MESSAGE: &str = "The API response was in an unexpected format.";

/// Everything that can end a single submission without a response.
///
/// The `Display` output of each variant is exactly what the user sees in the
/// error panel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    #[error("{}", MISSING_API_KEY_MESSAGE)]
    MissingApiKey,

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("{}", UNEXPECTED_SHAPE_MESSAGE)]
    UnexpectedShape,

    #[error("{0}")]
    Unexpected(String),
}

impl ChatError {
    /// Build an API error, falling back to the generic status message when the
    /// provider did not supply one.
    pub fn api(status: u16, provider_message: Option<String>) -> Self {
        let message = provider_message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("API error: {}", status));
        ChatError::Api { status, message }
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        ChatError::Unexpected(err.without_url().to_string())
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        ChatError::Unexpected(err.to_string())
    }
}

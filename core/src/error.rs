use serde::Deserialize;
use thiserror::Error;

/// Failure of a call to the remote pantry API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("not found")]
    NotFound,

    #[error("API returned {status}{}", detail(.message))]
    Status { status: u16, message: Option<String> },

    #[error("failed to reach the API: {0}")]
    Transport(String),

    #[error("failed to decode API response: {0}")]
    Decode(String),
}

#[allow(clippy::ref_option)]
fn detail(message: &Option<String>) -> String {
    message.as_deref().map(|m| format!(": {m}")).unwrap_or_default()
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// The `{ "error": "..." }` body the API sends alongside failures.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: Option<String>,
}

impl ApiError {
    /// Build a status error from a raw response body, keeping the server's
    /// `error` text when the body carries one.
    #[must_use]
    pub fn from_status(status: u16, body: &str) -> Self {
        if status == 404 {
            return Self::NotFound;
        }
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.error)
            .filter(|m| !m.trim().is_empty());
        Self::Status { status, message }
    }

    /// Text to show the user: the server's own message when it sent one,
    /// `fallback` otherwise.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Status {
                message: Some(m), ..
            } => m.clone(),
            _ => fallback.to_string(),
        }
    }
}

/// Input problems caught before anything reaches the network.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Unfortunately, I will need your email to proceed.")]
    EmailRequired,

    #[error("Oops, looks like your email address is not valid. Please try again.")]
    EmailInvalid,

    #[error("You need at least one ingredient before I can show you what you can cook")]
    NoIngredients,

    #[error("Please add at least one ingredient.")]
    NothingToAdd,

    #[error("Pick an ingredient before saving.")]
    NothingSelected,
}

/// Errors surfaced by the registration and pantry flows.
#[derive(Error, Debug)]
pub enum FlowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("{0}")]
    InvalidState(&'static str),
}

use thiserror::Error;

/// Errors raised while talking to the caseworker backend or loading local state
#[derive(Error, Debug)]
pub enum SetuError {
    #[error("Configuration Error: {0}")]
    ConfigError(String),

    #[error("Request Error: {0}")]
    RequestError(String),

    #[error("Parsing Error: {0}")]
    ParsingError(String),

    #[error("Session Error: {0}")]
    SessionError(String),

    #[error("HTTP Error: {status_code} - {message}")]
    HttpError { status_code: u16, message: String },

    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
}

impl From<config::ConfigError> for SetuError {
    fn from(e: config::ConfigError) -> Self {
        SetuError::ConfigError(e.to_string())
    }
}

/// Result type for Yojana-Setu operations
pub type SetuResult<T> = Result<T, SetuError>;

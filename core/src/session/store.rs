use std::error::Error;
use std::fmt::{Debug, Display};

use async_trait::async_trait;

use crate::errors::SetuError;

/// Key holding the registered citizen's phone number
pub const USER_PHONE_KEY: &str = "user_phone";
/// Key holding the registered citizen's name
pub const USER_NAME_KEY: &str = "user_name";
/// Key holding the registered citizen's email
pub const USER_EMAIL_KEY: &str = "user_email";

/// Error type for session store operations
#[derive(Debug)]
pub enum SessionStoreError {
    /// Error occurred while reading or writing the backing storage
    StorageError(String),
    /// Stored data could not be encoded or decoded
    SerializationError(String),
}

impl Display for SessionStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStoreError::StorageError(msg) => write!(f, "Storage error: {}", msg),
            SessionStoreError::SerializationError(msg) => {
                write!(f, "Serialization error: {}", msg)
            }
        }
    }
}

impl Error for SessionStoreError {}

impl From<SessionStoreError> for SetuError {
    fn from(e: SessionStoreError) -> Self {
        SetuError::SessionError(e.to_string())
    }
}

/// String key/value storage that survives across surfaces within a session
#[async_trait]
pub trait SessionStore: Send + Sync + Debug {
    /// Get the value stored under `key`, if any
    async fn get_item(&self, key: &str) -> Result<Option<String>, SessionStoreError>;

    /// Store `value` under `key`, replacing any previous value
    async fn set_item(&self, key: &str, value: &str) -> Result<(), SessionStoreError>;

    /// Remove `key`, returning the value it held
    async fn remove_item(&self, key: &str) -> Result<Option<String>, SessionStoreError>;

    /// Remove every key
    async fn clear(&self) -> Result<(), SessionStoreError>;
}

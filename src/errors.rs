use std::str::Utf8Error;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProfileError>;

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("Session is not authenticated")]
    Unauthenticated,
    #[error("Unrecognized representation: {0}")]
    UnrecognizedRepresentation(String),
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("Unexpected status: {0}")]
    Status(u16),
    #[error("Response body is empty")]
    EmptyBody,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parsing error")]
    Parse,
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ProfileError {
    /// Whether the error happened before any request left the process
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            ProfileError::Unauthenticated
                | ProfileError::Parse
                | ProfileError::Config(_)
        )
    }
}

impl From<Utf8Error> for ProfileError {
    fn from(_: Utf8Error) -> Self {
        Self::Parse
    }
}

impl From<serde_json::Error> for ProfileError {
    fn from(_: serde_json::Error) -> Self {
        Self::Parse
    }
}

impl From<url::ParseError> for ProfileError {
    fn from(_: url::ParseError) -> Self {
        Self::Parse
    }
}

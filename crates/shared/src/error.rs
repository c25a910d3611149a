use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error payload the TMDb API attaches to non-success responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiStatus {
    pub status_code: i32,
    pub status_message: String,
}

#[derive(Debug, Error)]
#[error("api status {status_code}: {status_message}")]
pub struct ApiException {
    pub status_code: i32,
    pub status_message: String,
}

impl ApiException {
    pub fn new(status_code: i32, status_message: impl Into<String>) -> Self {
        Self {
            status_code,
            status_message: status_message.into(),
        }
    }
}

impl From<ApiStatus> for ApiException {
    fn from(value: ApiStatus) -> Self {
        Self {
            status_code: value.status_code,
            status_message: value.status_message,
        }
    }
}

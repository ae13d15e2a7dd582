//! Backend error taxonomy

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend error (status {status}): {message}")]
    Backend { status: u16, message: String },

    #[error("failed to decode backend response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("invalid backend URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("record not found in {0}")]
    NotFound(String),

    #[error("{failed} of {total} line items could not be saved; the new record was discarded")]
    PartialChildren { failed: usize, total: usize },
}

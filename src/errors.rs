// Error types for the clone pipeline. Terminal errors (CloneError) abort a
// run; per-photo upload errors are recorded in that photo's result and the
// loop moves on to the next one.

use std::fmt;

use thiserror::Error;

/// Terminal pipeline failures. Variants that came out of an HTTP exchange
/// carry the raw status and body so the API's reply can be read as-is.
#[derive(Debug, Error)]
pub enum CloneError {
    /// Input rejected before any network call was made.
    #[error("{0}")]
    Input(String),

    /// Reading the source listing, or its photo list, failed.
    #[error("failed to fetch listing data: HTTP {status}: {body}")]
    Fetch { status: u16, body: String },

    /// The draft-creation request returned a non-success status.
    #[error("draft creation failed: HTTP {status}: {body}")]
    DraftCreation { status: u16, body: String },

    /// Draft creation succeeded but the response carried no id to address
    /// the photo endpoints with.
    #[error("draft id not returned by the API: {body}")]
    DraftIdMissing { body: String },

    /// The request never produced an HTTP response.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// One photo's transfer failure: download, file read, or upload. `status`
/// is present when a server answered with a non-success code; transport and
/// I/O problems leave it empty and put their message in `body`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadError {
    pub status: Option<u16>,
    pub body: String,
}

impl UploadError {
    /// Failure with an HTTP status and the raw response body.
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        UploadError {
            status: Some(status),
            body: body.into(),
        }
    }

    /// Failure without a response: connection errors, unreadable files.
    pub fn other(detail: impl ToString) -> Self {
        UploadError {
            status: None,
            body: detail.to_string(),
        }
    }
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(code) => write!(f, "HTTP {}: {}", code, self.body),
            None => write!(f, "{}", self.body),
        }
    }
}

impl std::error::Error for UploadError {}

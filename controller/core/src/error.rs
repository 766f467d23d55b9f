//! Error Types
//!
//! Failures are split the same way the operator sees them:
//!
//! - [`PreconditionFailure`]: checked locally, no request was issued
//! - [`GatewayError`]: a request was sent and failed (transport, status, decode)
//! - [`ActionError`]: what a dispatched action returns, one of the two above
//!
//! None of these are fatal to a running controller. The dispatcher turns
//! every one of them into a status line.

use thiserror::Error;

/// Errors talking to the content gateway
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Network-level failure (connect, TLS, body read)
    #[error("Request to {endpoint} failed: {source}")]
    Transport {
        /// Endpoint path, e.g. `/latest`
        endpoint: &'static str,
        /// Underlying reqwest error
        source: reqwest::Error,
    },

    /// The gateway answered with a non-success status
    #[error("{endpoint} returned {status}")]
    Status {
        /// Endpoint path
        endpoint: &'static str,
        /// HTTP status code
        status: u16,
    },

    /// The response body did not have the expected shape
    #[error("Unexpected response from {endpoint}: {reason}")]
    Decode {
        /// Endpoint path
        endpoint: &'static str,
        /// What was wrong with it
        reason: String,
    },

    /// A base URL or image path could not be turned into a URL
    #[error("Invalid URL '{input}': {source}")]
    InvalidUrl {
        /// The string that failed to parse
        input: String,
        /// Parse error
        source: url::ParseError,
    },

    /// Reading a local file for upload failed
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File that was being read
        path: String,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Decoding or re-encoding an image for cropping failed
    #[error("Image processing failed: {0}")]
    Image(#[from] image::ImageError),
}

impl GatewayError {
    /// HTTP status code, if the gateway answered at all
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Client-side checks that failed before any request was made
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PreconditionFailure {
    /// Text to stage was empty after trimming
    #[error("Write something first")]
    EmptyText,

    /// No file was chosen for an upload
    #[error("Choose an image")]
    NoFileSelected,

    /// AI prompt was empty after trimming
    #[error("Describe the image first")]
    EmptyPrompt,

    /// No filename given for deletion
    #[error("No idle art selected")]
    NoFilename,

    /// The operator declined a destructive action
    #[error("Deletion cancelled")]
    NotConfirmed,
}

/// Error returned by a dispatched action
#[derive(Debug, Error)]
pub enum ActionError {
    /// Rejected locally, nothing was sent
    #[error(transparent)]
    Precondition(#[from] PreconditionFailure),

    /// Sent, but the gateway call failed
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl ActionError {
    /// Whether the action was rejected before reaching the network
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition(_))
    }
}

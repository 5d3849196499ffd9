use thiserror::Error;

/// Failure of a single facade call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("failed to get {service} auth token: {message}")]
    Auth {
        service: &'static str,
        message: String,
    },

    #[error("{service} request failed: {message}")]
    Transport {
        service: &'static str,
        message: String,
    },

    #[error("{service} API error {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{service} returned an unexpected payload: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },

    #[error("{service} rejected the request: {message}")]
    Rejected {
        service: &'static str,
        message: String,
    },

    #[error("{0}")]
    NotFound(String),

    #[error("operation {operation_id} {state}: {message}")]
    Operation {
        operation_id: String,
        state: String,
        message: String,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RemoteError {
    /// HTTP status, when the service answered with one
    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Every way a request can fail. The pipeline maps each kind to exactly one
/// status code.
#[derive(Error, Debug)]
pub enum ServeError {
    #[error("Path is outside root directory: {0}")]
    SecurityViolation(String),

    #[error("Request body too large: {size} bytes exceeds limit of {limit} bytes")]
    BodyTooLarge { size: u64, limit: u64 },

    #[error("Invalid upload request: {0}")]
    InvalidUpload(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Unclassified(String),
}

impl ServeError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServeError::SecurityViolation(_) => StatusCode::FORBIDDEN,
            ServeError::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ServeError::InvalidUpload(_) => StatusCode::BAD_REQUEST,
            ServeError::NotFound(_) => StatusCode::NOT_FOUND,
            ServeError::Unclassified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Map an I/O error from opening `what`, keeping "not found" distinct.
    pub fn from_open(err: std::io::Error, what: &str) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            ServeError::NotFound(what.to_string())
        } else {
            ServeError::Unclassified(err.to_string())
        }
    }
}

impl From<std::io::Error> for ServeError {
    fn from(err: std::io::Error) -> Self {
        ServeError::Unclassified(err.to_string())
    }
}

/// Plain-text response naming the status, or `message` when given.
pub fn status_response(status: StatusCode, message: Option<String>) -> Response {
    let body = message.unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("Unknown Status")
            .to_string()
    });

    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response()
}

impl IntoResponse for ServeError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Only upload validation failures are descriptive; everything else
        // would leak paths or internals.
        let message = match self {
            ServeError::InvalidUpload(message) => Some(message),
            _ => None,
        };
        status_response(status, message)
    }
}

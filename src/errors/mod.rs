use std::io;
use std::path::PathBuf;

use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;

/// Error type shared by the upload, listing and search services
#[derive(Debug, thiserror::Error)]
pub enum DocError {
    #[error("{0}")]
    NotFound(String),
    #[error("'{}' is not a directory.", .0.display())]
    NotADirectory(PathBuf),
    #[error("File type '{extension}' not allowed. Allowed types: {allowed}")]
    UnsupportedType { extension: String, allowed: String },
    #[error("Failed to parse file '{file}': {cause}")]
    ConversionFailure { file: String, cause: String },
    #[error("Invalid regex pattern '{pattern}': {cause}")]
    InvalidPattern { pattern: String, cause: String },
    #[error("Error reading file '{file}': {source}")]
    Io {
        file: String,
        #[source]
        source: io::Error,
    },
    #[error("Too many files: {count} uploaded, at most {max} allowed")]
    TooManyFiles { count: usize, max: usize },
    #[error("Invalid file name '{0}'")]
    InvalidFileName(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Server I/O failure on {target}: {source}")]
    Server {
        target: String,
        #[source]
        source: io::Error,
    },
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DocError {
    /// Wrap an I/O error together with the file it happened on
    pub fn io(file: impl Into<String>, source: io::Error) -> Self {
        DocError::Io { file: file.into(), source }
    }

    /// Wrap an I/O error raised by a listener or transport, not a stored file
    pub fn server(target: impl Into<String>, source: io::Error) -> Self {
        DocError::Server { target: target.into(), source }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            DocError::NotFound(_) => StatusCode::NOT_FOUND,
            DocError::UnsupportedType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            DocError::InvalidPattern { .. }
            | DocError::TooManyFiles { .. }
            | DocError::InvalidFileName(_)
            | DocError::BadRequest(_) => StatusCode::BAD_REQUEST,
            DocError::NotADirectory(_)
            | DocError::ConversionFailure { .. }
            | DocError::Io { .. }
            | DocError::Server { .. }
            | DocError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<axum::extract::multipart::MultipartError> for DocError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        DocError::BadRequest(err.body_text())
    }
}

impl From<tokio::task::JoinError> for DocError {
    fn from(err: tokio::task::JoinError) -> Self {
        DocError::Internal(err.to_string())
    }
}

impl IntoResponse for DocError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("Request failed: {}", self);
        } else {
            log::warn!("Request rejected: {}", self);
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(DocError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        let unsupported = DocError::UnsupportedType {
            extension: "exe".into(),
            allowed: "txt".into(),
        };
        assert_eq!(unsupported.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        let conversion = DocError::ConversionFailure {
            file: "a.pdf".into(),
            cause: "broken".into(),
        };
        assert_eq!(conversion.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            DocError::TooManyFiles { count: 11, max: 10 }.status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn messages_name_the_offending_file() {
        let err = DocError::io("notes.txt", io::Error::new(io::ErrorKind::Other, "boom"));
        assert_eq!(err.to_string(), "Error reading file 'notes.txt': boom");

        let err = DocError::ConversionFailure {
            file: "deck.pptx".into(),
            cause: "bad zip".into(),
        };
        assert_eq!(err.to_string(), "Failed to parse file 'deck.pptx': bad zip");
    }

    #[test]
    fn transport_failures_do_not_claim_a_file() {
        let err = DocError::server(
            "0.0.0.0:8000",
            io::Error::new(io::ErrorKind::AddrInUse, "address in use"),
        );
        assert_eq!(err.to_string(), "Server I/O failure on 0.0.0.0:8000: address in use");
        assert!(!err.to_string().contains("reading file"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

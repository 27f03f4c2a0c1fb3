use reqwest::StatusCode;
use thiserror::Error;

use crate::http::HttpError;

#[derive(Error, Debug)]
pub enum MirrorError {
    // Could not reach the provider (connect, TLS, timeout)
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    // Provider answered outside 2xx; the body is not trusted
    #[error("{status}")]
    Upstream { status: StatusCode },

    #[error("Failed to decode release: {0}")]
    Decode(String),

    // Missing or unusable Content-Disposition filename
    #[error("Invalid download metadata: {0}")]
    Metadata(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    // A fetch task ended without handing back its outcome
    #[error("Fetch task aborted: {0}")]
    Task(String),
}

impl From<HttpError> for MirrorError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Request(e) => MirrorError::Transport(e),
            HttpError::HttpStatus { status, .. } => MirrorError::Upstream { status },
        }
    }
}

pub type Result<T> = std::result::Result<T, MirrorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_display_is_status_line() {
        let err = MirrorError::Upstream { status: StatusCode::FORBIDDEN };
        assert_eq!(err.to_string(), "403 Forbidden");

        let err = MirrorError::Upstream { status: StatusCode::NOT_FOUND };
        assert_eq!(err.to_string(), "404 Not Found");
    }

    #[test]
    fn test_http_status_maps_to_upstream() {
        let err: MirrorError = HttpError::HttpStatus {
            status: StatusCode::UNAUTHORIZED,
            url: "https://api.github.com/repos/o/r/releases/latest".to_string(),
        }
        .into();

        assert!(matches!(err, MirrorError::Upstream { status } if status == StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn test_error_display() {
        let err = MirrorError::Metadata("no filename".to_string());
        assert_eq!(err.to_string(), "Invalid download metadata: no filename");

        let err = MirrorError::Decode("missing field `id`".to_string());
        assert_eq!(err.to_string(), "Failed to decode release: missing field `id`");

        let err = MirrorError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
        assert_eq!(err.to_string(), "IO error: disk full");
    }
}

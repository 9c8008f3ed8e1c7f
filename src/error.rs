use std::fmt;
use std::io;
use std::path::Path;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

// Custom Error Type
#[derive(Debug)]
pub enum AppError {
    Io(io::Error, Option<String>),
    Network(reqwest::Error),
    Api(String), // Upstream answered, but with something we can't use
    JsonParse(serde_json::Error),
    NotFound(String), // Lookup came back empty or with a failed status
    Config(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::BAD_REQUEST,
            AppError::Network(_) | AppError::Api(_) => StatusCode::BAD_GATEWAY,
            AppError::Io(..) | AppError::JsonParse(_) | AppError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Io(err, path) => {
                if let Some(p) = path {
                    write!(f, "File I/O error for '{}': {}", p, err)
                } else {
                    write!(f, "File I/O error: {}", err)
                }
            }
            AppError::Network(err) => write!(f, "Network error: {}", err),
            AppError::Api(msg) => write!(f, "API error: {}", msg),
            AppError::JsonParse(err) => write!(f, "JSON parsing error: {}", err),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Config(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Io(err, _) => Some(err),
            AppError::Network(err) => Some(err),
            AppError::JsonParse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> AppError {
        AppError::Io(err, None)
    }
}

// Helper to create AppError::Io with a path
pub fn io_error_with_path(err: io::Error, path: &Path) -> AppError {
    AppError::Io(err, Some(path.display().to_string()))
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> AppError {
        AppError::Network(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> AppError {
        AppError::JsonParse(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        // Server-side detail stays in the log.
        let body = match &self {
            AppError::NotFound(msg) => msg.clone(),
            _ => status.canonical_reason().unwrap_or("error").to_string(),
        };
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_a_client_error() {
        let err = AppError::NotFound("no place matched 'Nowhere'".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Not found: no place matched 'Nowhere'");
    }

    #[test]
    fn io_error_keeps_path_in_message() {
        let err = io_error_with_path(
            io::Error::new(io::ErrorKind::NotFound, "missing"),
            Path::new("wwwroot/airports.dat"),
        );
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("wwwroot/airports.dat"));
    }

    #[test]
    fn upstream_failures_map_to_bad_gateway() {
        let err = AppError::Api("truncated body".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }
}

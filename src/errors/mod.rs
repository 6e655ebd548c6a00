//! Error handling module for the ReleaseRite client.
//!
//! Provides a single error type covering transport failures, HTTP error
//! responses from the API, and local failures (config, credential store, files).

use reqwest::StatusCode;
use serde::Deserialize;

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const TRANSPORT_ERROR: &str = "TRANSPORT_ERROR";
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const FORBIDDEN: &str = "FORBIDDEN";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const API_ERROR: &str = "API_ERROR";
    pub const DECODE_ERROR: &str = "DECODE_ERROR";
    pub const BUSY: &str = "BUSY";
    pub const NOT_LOGGED_IN: &str = "NOT_LOGGED_IN";
    pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
    pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
    pub const IO_ERROR: &str = "IO_ERROR";
}

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Network or connection failure before a response arrived
    #[error("request failed: {0}")]
    Transport(String),
    /// The API rejected the bearer token (401)
    #[error("{0}")]
    Unauthorized(String),
    /// The API refused the action for this user (403)
    #[error("{0}")]
    Forbidden(String),
    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),
    /// Any other non-success response
    #[error("{message} (HTTP {status})")]
    Api { status: u16, message: String },
    /// A success response whose body did not have the expected shape
    #[error("unexpected response: {0}")]
    Decode(String),
    /// Another deploy/undeploy is still running on the same view
    #[error("another deployment change is already in progress")]
    Busy,
    /// No stored credentials
    #[error("not logged in; run `releaserite login` first")]
    NotLoggedIn,
    /// Credential store error
    #[error("session store error: {0}")]
    Storage(String),
    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(String),
    /// Local file error
    #[error("file error: {0}")]
    Io(String),
}

impl AppError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Transport(_) => codes::TRANSPORT_ERROR,
            AppError::Unauthorized(_) => codes::UNAUTHORIZED,
            AppError::Forbidden(_) => codes::FORBIDDEN,
            AppError::NotFound(_) => codes::NOT_FOUND,
            AppError::Api { .. } => codes::API_ERROR,
            AppError::Decode(_) => codes::DECODE_ERROR,
            AppError::Busy => codes::BUSY,
            AppError::NotLoggedIn => codes::NOT_LOGGED_IN,
            AppError::Storage(_) => codes::STORAGE_ERROR,
            AppError::Config(_) => codes::CONFIG_ERROR,
            AppError::Io(_) => codes::IO_ERROR,
        }
    }

    /// HTTP status of the response that caused this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::Unauthorized(_) => Some(StatusCode::UNAUTHORIZED.as_u16()),
            AppError::Forbidden(_) => Some(StatusCode::FORBIDDEN.as_u16()),
            AppError::NotFound(_) => Some(StatusCode::NOT_FOUND.as_u16()),
            AppError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Build the error for a non-success HTTP response.
    ///
    /// The backend's `detail` message is kept verbatim when present.
    pub fn from_response(status: StatusCode, body: &[u8]) -> Self {
        let message = detail_message(body).unwrap_or_else(|| fallback_message(status, body));
        match status {
            StatusCode::UNAUTHORIZED => AppError::Unauthorized(message),
            StatusCode::FORBIDDEN => AppError::Forbidden(message),
            StatusCode::NOT_FOUND => AppError::NotFound(message),
            _ => AppError::Api {
                status: status.as_u16(),
                message,
            },
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        tracing::debug!("Transport error: {:?}", err);
        if err.is_decode() {
            AppError::Decode(err.to_string())
        } else {
            AppError::Transport(err.to_string())
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Session store error: {:?}", err);
        AppError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Decode(format!("JSON error: {}", err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

/// Error body as produced by the API (`{"detail": ...}`).
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<ErrorDetail>,
}

/// `detail` is a plain message, or a list of field errors for request validation failures.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Message(String),
    Fields(Vec<FieldError>),
}

#[derive(Debug, Deserialize)]
struct FieldError {
    #[serde(default)]
    loc: Vec<serde_json::Value>,
    msg: String,
}

impl FieldError {
    fn describe(&self) -> String {
        // loc is e.g. ["body", "name"]; the leading "body"/"query" adds nothing
        let field = self
            .loc
            .iter()
            .skip(1)
            .map(|part| match part {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(".");
        if field.is_empty() {
            self.msg.clone()
        } else {
            format!("{}: {}", field, self.msg)
        }
    }
}

fn detail_message(body: &[u8]) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
    match parsed.detail? {
        ErrorDetail::Message(msg) => Some(msg),
        ErrorDetail::Fields(fields) if !fields.is_empty() => Some(
            fields
                .iter()
                .map(FieldError::describe)
                .collect::<Vec<_>>()
                .join("; "),
        ),
        ErrorDetail::Fields(_) => None,
    }
}

fn fallback_message(status: StatusCode, body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if !text.is_empty() && !text.starts_with('{') && text.len() <= 200 {
        return text.to_string();
    }
    match status.canonical_reason() {
        Some(reason) => format!("Request failed: {}", reason),
        None => format!("Request failed with status {}", status.as_u16()),
    }
}

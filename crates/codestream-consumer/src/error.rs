//! Error types for the clone-detection consumer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;
use thiserror::Error;

use crate::types::Stage;

/// Result type alias for consumer operations
pub type Result<T> = std::result::Result<T, Error>;

/// How a stage timer was misused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerMisuseKind {
    /// `start` on a stage that is already open
    AlreadyStarted,
    /// `end` on a stage that was never opened
    NotStarted,
}

impl fmt::Display for TimerMisuseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyStarted => f.write_str("already started"),
            Self::NotStarted => f.write_str("not started"),
        }
    }
}

/// Consumer errors
#[derive(Debug, Error)]
pub enum Error {
    /// Uploaded content could not be read as text
    #[error("Failed to read upload '{filename}': {message}")]
    UploadRead { filename: String, message: String },

    /// The analysis engine rejected the file at some stage
    #[error("Stage {stage} failed for '{filename}': {message}")]
    Stage {
        stage: Stage,
        filename: String,
        message: String,
    },

    /// Double start or end-without-start on a stage timer
    #[error("Timer misuse on '{stage}': {kind}")]
    TimerMisuse { stage: String, kind: TimerMisuseKind },

    /// A stage exceeded the configured per-stage timeout
    #[error("Stage {stage} timed out after {secs}s for '{filename}'")]
    StageTimeout {
        stage: Stage,
        filename: String,
        secs: u64,
    },

    /// The invocation was cancelled between stages
    #[error("Pipeline cancelled for '{0}'")]
    Cancelled(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an upload read error
    pub fn upload_read(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UploadRead {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create a stage failure
    pub fn stage(stage: Stage, filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Stage {
            stage,
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create a timer misuse error
    pub fn timer_misuse(stage: impl Into<String>, kind: TimerMisuseKind) -> Self {
        Self::TimerMisuse {
            stage: stage.into(),
            kind,
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Stage the failure is attributed to, if any
    pub fn stage_kind(&self) -> Option<Stage> {
        match self {
            Error::Stage { stage, .. } | Error::StageTimeout { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            Error::UploadRead { .. } => (StatusCode::BAD_REQUEST, "upload_read_error"),
            Error::Stage { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "stage_error"),
            Error::TimerMisuse { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "timer_misuse"),
            Error::StageTimeout { .. } => (StatusCode::GATEWAY_TIMEOUT, "stage_timeout"),
            Error::Cancelled(_) => (StatusCode::SERVICE_UNAVAILABLE, "cancelled"),
            Error::Config(_) => (StatusCode::BAD_REQUEST, "config_error"),
            Error::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
            Error::Json(_) => (StatusCode::BAD_REQUEST, "json_error"),
            Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

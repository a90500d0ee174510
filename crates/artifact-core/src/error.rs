use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

use crate::types::OperationKind;

#[derive(Debug, Error)]
pub enum CrudError {
    #[error("unknown artifact type: {0}")]
    UnknownArtifactType(String),

    #[error("invalid artifact id '{0}': {1}")]
    InvalidId(String, String),

    #[error("expected a {expected} artifact, got {found}")]
    KindMismatch { expected: String, found: String },

    #[error("invalid frontmatter in {path}: {reason}")]
    Frontmatter { path: String, reason: String },

    #[error("invalid artifact data: {0}")]
    Validation(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("malformed settings file: {0}")]
    Settings(String),

    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CrudError>;

impl CrudError {
    /// Map an internal failure to the result code reported for `operation`.
    pub fn code_for(&self, operation: OperationKind) -> ErrorCode {
        match self {
            CrudError::UnknownArtifactType(_)
            | CrudError::InvalidId(..)
            | CrudError::KindMismatch { .. }
            | CrudError::Frontmatter { .. }
            | CrudError::Validation(_)
            | CrudError::InvalidConfig(_) => ErrorCode::ValidationFailed,
            CrudError::Write { .. } => ErrorCode::WriteError,
            _ => match operation {
                OperationKind::Create => ErrorCode::CreateFailed,
                OperationKind::Read => ErrorCode::ReadFailed,
                OperationKind::Update => ErrorCode::UpdateFailed,
                OperationKind::Delete => ErrorCode::DeleteError,
                OperationKind::Query => ErrorCode::ListFailed,
            },
        }
    }

    pub fn into_operation_error(self, operation: OperationKind) -> OperationError {
        let code = self.code_for(operation);
        let mut err = OperationError::new(code, self.to_string());
        if let CrudError::Write { path, .. } = &self {
            err = err.with_context("path", path.as_str());
        }
        err
    }
}

// ---------------------------------------------------------------------------
// ErrorCode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    AlreadyExists,
    ReadFailed,
    WriteError,
    CreateFailed,
    UpdateFailed,
    DeleteError,
    ListFailed,
    ValidationFailed,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::AlreadyExists => "ALREADY_EXISTS",
            ErrorCode::ReadFailed => "READ_FAILED",
            ErrorCode::WriteError => "WRITE_ERROR",
            ErrorCode::CreateFailed => "CREATE_FAILED",
            ErrorCode::UpdateFailed => "UPDATE_FAILED",
            ErrorCode::DeleteError => "DELETE_ERROR",
            ErrorCode::ListFailed => "LIST_FAILED",
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// OperationError
// ---------------------------------------------------------------------------

/// Error value carried by a failed `OperationResult`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub context: Map<String, Value>,
}

impl OperationError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: Map::new(),
        }
    }

    pub fn not_found(what: impl fmt::Display) -> Self {
        Self::new(ErrorCode::NotFound, format!("{what} not found"))
    }

    pub fn already_exists(what: impl fmt::Display) -> Self {
        Self::new(ErrorCode::AlreadyExists, format!("{what} already exists"))
    }

    pub fn with_context(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.context.insert(key.to_string(), value.into());
        self
    }
}

impl fmt::Display for OperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

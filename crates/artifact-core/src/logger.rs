//! Operation logging sinks.
//!
//! The engine hands every completed operation to an [`OperationLogger`]
//! chosen at construction. [`TracingLogger`] forwards to `tracing`;
//! [`MemoryLogger`] keeps records for inspection in tests.

use crate::config::{LogLevel, LoggingConfig};
use crate::error::ErrorCode;
use crate::result::OperationResult;
use crate::types::{ArtifactKind, OperationKind};
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, Mutex};

/// One log record per completed operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationLog {
    pub level: LogLevel,
    pub log_id: String,
    pub operation: OperationKind,
    pub artifact_type: ArtifactKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_id: Option<String>,
    pub success: bool,
    pub dry_run: bool,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<Value>,
}

impl OperationLog {
    /// Reads and queries log at debug, successful mutations at info,
    /// failures at warn.
    pub fn level_for(operation: OperationKind, success: bool) -> LogLevel {
        match (success, operation) {
            (false, _) => LogLevel::Warn,
            (true, OperationKind::Read | OperationKind::Query) => LogLevel::Debug,
            (true, _) => LogLevel::Info,
        }
    }

    pub fn from_result<T>(result: &OperationResult<T>, include_state: bool) -> Self {
        let snapshot = |s: &Option<crate::artifact::Artifact>| {
            if include_state {
                s.as_ref().and_then(|a| serde_json::to_value(a).ok())
            } else {
                None
            }
        };
        Self {
            level: Self::level_for(result.operation, result.success),
            log_id: result.log_id.clone(),
            operation: result.operation,
            artifact_type: result.artifact_type,
            artifact_id: result.artifact_id.clone(),
            success: result.success,
            dry_run: result.dry_run,
            duration_ms: result.duration_ms,
            error_code: result.error_code(),
            error_message: result.error.as_ref().map(|e| e.message.clone()),
            before: snapshot(&result.before_state),
            after: snapshot(&result.after_state),
        }
    }

    /// True when this record clears the configured minimum level.
    pub fn enabled_by(&self, config: &LoggingConfig) -> bool {
        self.level >= config.level
    }
}

/// A sink for operation logs.
pub trait OperationLogger: Send + Sync {
    fn log(&self, record: &OperationLog);
}

// ---------------------------------------------------------------------------
// TracingLogger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl OperationLogger for TracingLogger {
    fn log(&self, r: &OperationLog) {
        let artifact_id = r.artifact_id.as_deref().unwrap_or("");
        let error_code = r.error_code.map(ErrorCode::as_str).unwrap_or("");
        let before = r.before.as_ref().map(Value::to_string);
        let after = r.after.as_ref().map(Value::to_string);
        macro_rules! emit {
            ($level:expr) => {
                tracing::event!(
                    $level,
                    log_id = %r.log_id,
                    operation = %r.operation,
                    artifact_type = %r.artifact_type,
                    artifact_id,
                    success = r.success,
                    dry_run = r.dry_run,
                    duration_ms = r.duration_ms,
                    error_code,
                    before = before.as_deref(),
                    after = after.as_deref(),
                    "{}",
                    r.error_message.as_deref().unwrap_or("artifact operation")
                )
            };
        }
        match r.level {
            LogLevel::Debug => emit!(tracing::Level::DEBUG),
            LogLevel::Info => emit!(tracing::Level::INFO),
            LogLevel::Warn => emit!(tracing::Level::WARN),
            LogLevel::Error => emit!(tracing::Level::ERROR),
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryLogger
// ---------------------------------------------------------------------------

/// Collects records in memory. Clones share the same buffer, so a test can
/// keep one handle and give another to the engine.
#[derive(Debug, Clone, Default)]
pub struct MemoryLogger {
    records: Arc<Mutex<Vec<OperationLog>>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<OperationLog> {
        match self.records.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl OperationLogger for MemoryLogger {
    fn log(&self, record: &OperationLog) {
        let mut guard = match self.records.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push(record.clone());
    }
}

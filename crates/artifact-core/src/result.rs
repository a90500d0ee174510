//! Uniform success/error envelope returned by every CRUD call.

use crate::artifact::{Artifact, ArtifactRecord};
use crate::error::{CrudError, ErrorCode, OperationError};
use crate::types::{ArtifactKind, OperationKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;

// ---------------------------------------------------------------------------
// OperationResult
// ---------------------------------------------------------------------------

/// Outcome of one handler call.
///
/// `success` is true exactly when `error` is `None`. Optional fields are left
/// out of the serialized form when they do not apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResult<T> {
    pub success: bool,
    pub operation: OperationKind,
    pub artifact_type: ArtifactKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<OperationError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_state: Option<Artifact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_state: Option<Artifact>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub dry_run: bool,
    pub duration_ms: u64,
    pub timestamp: DateTime<Utc>,
    pub log_id: String,
}

impl<T> OperationResult<T> {
    pub fn error_code(&self) -> Option<ErrorCode> {
        self.error.as_ref().map(|e| e.code)
    }

    /// Drop the before/after snapshots.
    pub fn without_snapshots(mut self) -> Self {
        self.before_state = None;
        self.after_state = None;
        self
    }

    fn with_data<U>(self, data: Option<U>) -> OperationResult<U> {
        OperationResult {
            success: self.success,
            operation: self.operation,
            artifact_type: self.artifact_type,
            artifact_id: self.artifact_id,
            data,
            error: self.error,
            path: self.path,
            before_state: self.before_state,
            after_state: self.after_state,
            dry_run: self.dry_run,
            duration_ms: self.duration_ms,
            timestamp: self.timestamp,
            log_id: self.log_id,
        }
    }

    fn mark_failed(&mut self, err: CrudError) {
        self.success = false;
        self.error = Some(err.into_operation_error(self.operation));
    }
}

impl OperationResult<Artifact> {
    /// Narrow the payload to a concrete artifact type.
    ///
    /// A payload of the wrong type turns the result into a `VALIDATION_FAILED`
    /// failure rather than panicking.
    pub fn narrow<A: ArtifactRecord>(mut self) -> OperationResult<A> {
        let data = self.data.take();
        let mut out = self.with_data(None);
        match data.map(Artifact::into_record::<A>) {
            Some(Ok(record)) => out.data = Some(record),
            Some(Err(e)) => out.mark_failed(e),
            None => {}
        }
        out
    }
}

impl OperationResult<Vec<Artifact>> {
    pub fn narrow_all<A: ArtifactRecord>(mut self) -> OperationResult<Vec<A>> {
        let data = self.data.take();
        let mut out = self.with_data(None);
        let Some(items) = data else {
            return out;
        };
        match items
            .into_iter()
            .map(Artifact::into_record::<A>)
            .collect::<crate::error::Result<Vec<A>>>()
        {
            Ok(records) => out.data = Some(records),
            Err(e) => out.mark_failed(e),
        }
        out
    }
}

// ---------------------------------------------------------------------------
// ResultBuilder
// ---------------------------------------------------------------------------

/// Collects the details of one call and stamps the result when it completes.
///
/// `duration_ms` is measured from the start instant handed in by the caller
/// to the moment `succeed`/`fail` is called.
#[derive(Debug, Clone)]
pub struct ResultBuilder {
    started: Instant,
    operation: OperationKind,
    artifact_type: ArtifactKind,
    artifact_id: Option<String>,
    path: Option<PathBuf>,
    before: Option<Artifact>,
    after: Option<Artifact>,
    dry_run: bool,
}

impl ResultBuilder {
    pub fn new(started: Instant, operation: OperationKind, artifact_type: ArtifactKind) -> Self {
        Self {
            started,
            operation,
            artifact_type,
            artifact_id: None,
            path: None,
            before: None,
            after: None,
            dry_run: false,
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.artifact_id = Some(id.into());
        self
    }

    pub fn path(mut self, path: &Path) -> Self {
        self.path = Some(path.to_path_buf());
        self
    }

    pub fn before(mut self, state: Option<Artifact>) -> Self {
        self.before = state;
        self
    }

    pub fn after(mut self, state: Option<Artifact>) -> Self {
        self.after = state;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn operation(&self) -> OperationKind {
        self.operation
    }

    pub fn succeed<T>(self, data: Option<T>) -> OperationResult<T> {
        self.finish(data, None)
    }

    pub fn fail<T>(self, error: OperationError) -> OperationResult<T> {
        self.finish(None, Some(error))
    }

    /// Fail with the code appropriate for this builder's operation.
    pub fn fail_with<T>(self, err: CrudError) -> OperationResult<T> {
        let error = err.into_operation_error(self.operation);
        self.fail(error)
    }

    fn finish<T>(self, data: Option<T>, error: Option<OperationError>) -> OperationResult<T> {
        let duration_ms = self.started.elapsed().as_millis() as u64;
        OperationResult {
            success: error.is_none(),
            operation: self.operation,
            artifact_type: self.artifact_type,
            artifact_id: self.artifact_id,
            data,
            error,
            path: self.path,
            before_state: self.before,
            after_state: self.after,
            dry_run: self.dry_run,
            duration_ms,
            timestamp: Utc::now(),
            log_id: new_log_id(),
        }
    }
}

/// Short random correlation token, e.g. `op-3f9a1c2b`.
pub fn new_log_id() -> String {
    let token = uuid::Uuid::new_v4().simple().to_string();
    format!("op-{}", &token[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{Rule, Skill};

    fn builder(op: OperationKind) -> ResultBuilder {
        ResultBuilder::new(Instant::now(), op, ArtifactKind::Skill)
    }

    #[test]
    fn success_has_no_error() {
        let skill = Artifact::from(Skill::new("core", "x", "d"));
        let result = builder(OperationKind::Create)
            .id("core/x")
            .after(Some(skill.clone()))
            .succeed(Some(skill));
        assert!(result.success);
        assert!(result.error.is_none());
        assert!(result.before_state.is_none());
        assert!(result.log_id.starts_with("op-"));
        assert_eq!(result.log_id.len(), 11);
    }

    #[test]
    fn failure_has_error_and_no_data() {
        let result: OperationResult<Artifact> =
            builder(OperationKind::Read).fail(OperationError::not_found("skill 'core/x'"));
        assert!(!result.success);
        assert_eq!(result.error_code(), Some(ErrorCode::NotFound));
        assert!(result.data.is_none());
    }

    #[test]
    fn absent_fields_are_omitted_when_serialized() {
        let result: OperationResult<()> = builder(OperationKind::Delete).succeed(None);
        let value = serde_json::to_value(&result).unwrap();
        let obj = value.as_object().unwrap();
        for key in ["data", "error", "path", "beforeState", "afterState", "dryRun"] {
            assert!(!obj.contains_key(key), "unexpected key {key}");
        }
        assert!(obj.contains_key("durationMs"));
        assert!(obj.contains_key("logId"));
    }

    #[test]
    fn log_ids_are_unique() {
        let a = new_log_id();
        let b = new_log_id();
        assert_ne!(a, b);
    }

    #[test]
    fn narrow_to_concrete_type() {
        let skill = Skill::new("core", "x", "d");
        let result = builder(OperationKind::Read).succeed(Some(Artifact::from(skill.clone())));
        let narrowed: OperationResult<Skill> = result.narrow();
        assert!(narrowed.success);
        assert_eq!(narrowed.data, Some(skill));
    }

    #[test]
    fn narrow_mismatch_fails() {
        let rule = Artifact::from(Rule::new("r", "body"));
        let narrowed: OperationResult<Skill> = builder(OperationKind::Read).succeed(Some(rule)).narrow();
        assert!(!narrowed.success);
        assert_eq!(narrowed.error_code(), Some(ErrorCode::ValidationFailed));
    }
}

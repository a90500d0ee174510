//! Bounded, insertion-ordered ledger of completed operations.
//!
//! Every attempt is recorded, successful or not, together with the before and
//! after snapshots the handler reported and a diff computed once at record
//! time. When the ledger is full the oldest entry is evicted first.

use crate::artifact::Artifact;
use crate::merge;
use crate::operation::Operation;
use crate::result::OperationResult;
use crate::types::{ArtifactKind, OperationKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Fields whose change reshapes an artifact rather than editing it.
pub const STRUCTURAL_FIELDS: &[&str] = &["category", "contextMode", "event", "type"];

// ---------------------------------------------------------------------------
// Diff
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diff {
    pub is_structural_change: bool,
    pub changed_fields: Vec<String>,
}

impl Diff {
    /// Classify the change between two snapshots produced by `operation`.
    ///
    /// Create and delete are always structural. Reads and queries never
    /// change anything. Updates compare top-level keys; a missing side on an
    /// update (a failed attempt) yields no changed fields.
    pub fn compute(
        operation: OperationKind,
        before: Option<&Artifact>,
        after: Option<&Artifact>,
    ) -> Self {
        match operation {
            OperationKind::Read | OperationKind::Query => Diff::default(),
            OperationKind::Create | OperationKind::Delete => Diff {
                is_structural_change: true,
                changed_fields: keys_of(before.or(after)),
            },
            OperationKind::Update => {
                let (Some(before), Some(after)) = (before, after) else {
                    return Diff::default();
                };
                let (Ok(b), Ok(a)) = (before.to_fields(), after.to_fields()) else {
                    return Diff::default();
                };
                let changed_fields = merge::changed_keys(&b, &a);
                let is_structural_change = before.kind() != after.kind()
                    || changed_fields
                        .iter()
                        .any(|f| STRUCTURAL_FIELDS.contains(&f.as_str()));
                Diff {
                    is_structural_change,
                    changed_fields,
                }
            }
        }
    }
}

fn keys_of(state: Option<&Artifact>) -> Vec<String> {
    let Some(Ok(fields)) = state.map(Artifact::to_fields) else {
        return Vec::new();
    };
    fields.into_iter().map(|(k, _)| k).collect()
}

// ---------------------------------------------------------------------------
// HistoryEntry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub state: Option<Artifact>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub operation: Operation,
    pub before: Snapshot,
    pub after: Snapshot,
    pub diff: Diff,
    pub success: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub dry_run: bool,
    pub log_id: String,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    /// Build an entry from the operation that was requested and the result it produced.
    pub fn from_result<T>(operation: Operation, result: &OperationResult<T>) -> Self {
        let kind = operation.kind();
        let mut before = result.before_state.clone();
        let mut after = result.after_state.clone();
        match kind {
            OperationKind::Create => before = None,
            OperationKind::Delete => after = None,
            _ => {}
        }
        let diff = Diff::compute(kind, before.as_ref(), after.as_ref());
        Self {
            operation,
            before: Snapshot { state: before },
            after: Snapshot { state: after },
            diff,
            success: result.success,
            dry_run: result.dry_run,
            log_id: result.log_id.clone(),
            timestamp: result.timestamp,
        }
    }

    pub fn targets(&self, artifact_key: &str) -> bool {
        self.operation.target_id() == Some(artifact_key)
    }
}

// ---------------------------------------------------------------------------
// OperationHistory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct OperationHistory {
    capacity: usize,
    entries: VecDeque<HistoryEntry>,
}

impl OperationHistory {
    /// A ledger holding at most `capacity` entries. A capacity of zero is
    /// raised to one so the ledger can always hold the latest attempt.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Append an entry, evicting the oldest one when full.
    pub fn record(&mut self, entry: HistoryEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> impl DoubleEndedIterator<Item = &HistoryEntry> + ExactSizeIterator {
        self.entries.iter()
    }

    /// The last `n` entries, newest first.
    pub fn get_recent(&self, n: usize) -> Vec<&HistoryEntry> {
        self.entries.iter().rev().take(n).collect()
    }

    /// Entries targeting `artifact_key`, oldest first.
    pub fn find_by_artifact(&self, artifact_key: &str) -> Vec<&HistoryEntry> {
        self.entries
            .iter()
            .filter(|e| e.targets(artifact_key))
            .collect()
    }

    pub fn find_by_artifact_type(&self, kind: ArtifactKind) -> Vec<&HistoryEntry> {
        self.entries
            .iter()
            .filter(|e| e.operation.artifact_type() == kind)
            .collect()
    }

    pub fn find_by_operation(&self, kind: OperationKind) -> Vec<&HistoryEntry> {
        self.entries
            .iter()
            .filter(|e| e.operation.kind() == kind)
            .collect()
    }

    pub fn failures(&self) -> Vec<&HistoryEntry> {
        self.entries.iter().filter(|e| !e.success).collect()
    }

    /// Drop every entry. Capacity is unchanged.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for OperationHistory {
    fn default() -> Self {
        Self::new(crate::config::DEV_CONFIG.versioning.history_size)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{Hook, Skill, SubAgent};
    use crate::result::ResultBuilder;
    use std::time::Instant;

    fn read_entry(id: &str) -> HistoryEntry {
        let op = Operation::Read {
            artifact_type: ArtifactKind::Skill,
            id: id.to_string(),
        };
        let result: OperationResult<Artifact> =
            ResultBuilder::new(Instant::now(), OperationKind::Read, ArtifactKind::Skill)
                .id(id)
                .succeed(None);
        HistoryEntry::from_result(op, &result)
    }

    fn ids(entries: &[&HistoryEntry]) -> Vec<String> {
        entries
            .iter()
            .map(|e| e.operation.target_id().unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn size_never_exceeds_capacity() {
        let mut history = OperationHistory::new(3);
        for i in 0..10 {
            history.record(read_entry(&format!("c/{i}")));
            assert!(history.size() <= 3);
        }
        assert!(history.is_full());
        let kept: Vec<_> = history.entries().collect();
        assert_eq!(ids(&kept), vec!["c/7", "c/8", "c/9"]);
    }

    #[test]
    fn eviction_drops_oldest_first() {
        let mut history = OperationHistory::new(2);
        history.record(read_entry("c/first"));
        history.record(read_entry("c/second"));
        history.record(read_entry("c/third"));
        assert!(history.find_by_artifact("c/first").is_empty());
        let oldest = history.entries().next().unwrap();
        assert_eq!(oldest.operation.target_id(), Some("c/second"));
    }

    #[test]
    fn recent_is_newest_first() {
        let mut history = OperationHistory::new(10);
        for i in 0..5 {
            history.record(read_entry(&format!("c/{i}")));
        }
        for k in 1..=5 {
            let recent = history.get_recent(k);
            assert_eq!(recent.len(), k);
            assert_eq!(recent[0].operation.target_id(), Some("c/4"));
        }
        assert_eq!(ids(&history.get_recent(2)), vec!["c/4", "c/3"]);
        assert_eq!(history.get_recent(50).len(), 5);
    }

    #[test]
    fn find_by_artifact_is_chronological() {
        let mut history = OperationHistory::new(10);
        history.record(read_entry("core/x"));
        history.record(read_entry("core/y"));
        history.record(read_entry("core/x"));
        let found = history.find_by_artifact("core/x");
        assert_eq!(found.len(), 2);
        assert!(found[0].timestamp <= found[1].timestamp);
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut history = OperationHistory::new(4);
        history.record(read_entry("c/a"));
        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.capacity(), 4);
    }

    #[test]
    fn zero_capacity_is_raised() {
        let mut history = OperationHistory::new(0);
        history.record(read_entry("c/a"));
        history.record(read_entry("c/b"));
        assert_eq!(history.size(), 1);
    }

    #[test]
    fn create_and_delete_are_structural() {
        let skill: Artifact = Skill::new("core", "x", "d").into();
        let create = Diff::compute(OperationKind::Create, None, Some(&skill));
        assert!(create.is_structural_change);
        assert!(create.changed_fields.contains(&"description".to_string()));
        let delete = Diff::compute(OperationKind::Delete, Some(&skill), None);
        assert!(delete.is_structural_change);
        let failed_create = Diff::compute(OperationKind::Create, None, None);
        assert!(failed_create.is_structural_change);
        assert!(failed_create.changed_fields.is_empty());
    }

    #[test]
    fn read_never_changes_fields() {
        let skill: Artifact = Skill::new("core", "x", "d").into();
        let diff = Diff::compute(OperationKind::Read, Some(&skill), Some(&skill));
        assert_eq!(diff, Diff::default());
    }

    #[test]
    fn update_lists_changed_fields() {
        let before: Artifact = Skill::new("core", "x", "d").into();
        let after: Artifact = Skill::new("core", "x", "d2").into();
        let diff = Diff::compute(OperationKind::Update, Some(&before), Some(&after));
        assert_eq!(diff.changed_fields, vec!["description"]);
        assert!(!diff.is_structural_change);

        let same = Diff::compute(OperationKind::Update, Some(&before), Some(&before));
        assert!(same.changed_fields.is_empty());
        assert!(!same.is_structural_change);
    }

    #[test]
    fn reshaping_update_is_structural() {
        let before: Artifact = Skill::new("core", "x", "d").into();
        let after: Artifact = Skill::new("util", "x", "d").into();
        let diff = Diff::compute(OperationKind::Update, Some(&before), Some(&after));
        assert!(diff.is_structural_change);
        assert!(diff.changed_fields.contains(&"category".to_string()));

        let mut sub = SubAgent::new("s", "d", "fork");
        let before: Artifact = sub.clone().into();
        sub.context_mode = "inherit".into();
        let diff = Diff::compute(OperationKind::Update, Some(&before), Some(&sub.into()));
        assert!(diff.is_structural_change);
    }

    #[test]
    fn entry_forces_null_sides() {
        let hook: Artifact = Hook::new("fmt", "PostToolUse", "cargo fmt").into();
        let result: OperationResult<()> =
            ResultBuilder::new(Instant::now(), OperationKind::Delete, ArtifactKind::Hook)
                .before(Some(hook.clone()))
                .after(Some(hook))
                .succeed(None);
        let op = Operation::Delete {
            artifact_type: ArtifactKind::Hook,
            id: "fmt".into(),
        };
        let entry = HistoryEntry::from_result(op, &result);
        assert!(entry.before.state.is_some());
        assert!(entry.after.state.is_none());
        assert!(entry.diff.is_structural_change);
        assert_eq!(entry.log_id, result.log_id);
    }

    #[test]
    fn failures_are_tracked() {
        let mut history = OperationHistory::new(5);
        let op = Operation::Read {
            artifact_type: ArtifactKind::Rule,
            id: "missing".into(),
        };
        let result: OperationResult<Artifact> =
            ResultBuilder::new(Instant::now(), OperationKind::Read, ArtifactKind::Rule)
                .fail(crate::error::OperationError::not_found("rule 'missing'"));
        history.record(HistoryEntry::from_result(op, &result));
        history.record(read_entry("c/ok"));
        assert_eq!(history.failures().len(), 1);
        assert_eq!(history.find_by_artifact_type(ArtifactKind::Rule).len(), 1);
        assert_eq!(history.find_by_operation(OperationKind::Read).len(), 2);
    }
}

//! The CRUD façade: dispatch to handlers, record history, log.

use crate::artifact::{Agent, Artifact, Command, Hook, McpServer, Rule, Skill, SubAgent};
use crate::config::CrudEngineConfig;
use crate::error::Result;
use crate::handler::{
    Call, CreateOptions, DeleteOptions, HandlerRegistry, ReadOptions, UpdateOptions,
};
use crate::history::{HistoryEntry, OperationHistory};
use crate::logger::{OperationLog, OperationLogger, TracingLogger};
use crate::operation::Operation;
use crate::result::{OperationResult, ResultBuilder};
use crate::types::{ArtifactKind, OperationKind};
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

pub struct CrudEngine {
    project_root: PathBuf,
    config: CrudEngineConfig,
    registry: HandlerRegistry,
    history: OperationHistory,
    logger: Box<dyn OperationLogger>,
}

impl fmt::Debug for CrudEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrudEngine")
            .field("project_root", &self.project_root)
            .field("config", &self.config)
            .field("history", &self.history.size())
            .finish()
    }
}

impl CrudEngine {
    /// Engine that logs through `tracing`.
    pub fn new(project_root: impl Into<PathBuf>, config: CrudEngineConfig) -> Self {
        Self::with_logger(project_root, config, TracingLogger)
    }

    pub fn with_logger(
        project_root: impl Into<PathBuf>,
        config: CrudEngineConfig,
        logger: impl OperationLogger + 'static,
    ) -> Self {
        Self {
            project_root: project_root.into(),
            config,
            registry: HandlerRegistry::new(),
            history: OperationHistory::new(config.versioning.history_size),
            logger: Box::new(logger),
        }
    }

    pub fn config(&self) -> &CrudEngineConfig {
        &self.config
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn history(&self) -> &OperationHistory {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// The last `n` recorded operations, newest first.
    pub fn recent_operations(&self, n: usize) -> Vec<&HistoryEntry> {
        self.history.get_recent(n)
    }

    pub fn exists(&self, kind: ArtifactKind, id: &str) -> bool {
        self.registry.get(kind).exists(&self.project_root, id)
    }

    pub fn path_of(&self, kind: ArtifactKind, id: &str) -> Result<PathBuf> {
        self.registry.get(kind).path(&self.project_root, id)
    }

    // -----------------------------------------------------------------------
    // Generic operations
    // -----------------------------------------------------------------------

    pub fn create(
        &mut self,
        kind: ArtifactKind,
        mut artifact: Artifact,
        opts: CreateOptions,
    ) -> OperationResult<Artifact> {
        artifact.derive_id();
        let op = Operation::Create {
            artifact_type: kind,
            id: artifact.id().to_string(),
            artifact: artifact.to_fields().unwrap_or_default(),
        };
        let result = self
            .registry
            .get(kind)
            .create(Call::new(&self.project_root), artifact, opts);
        self.finish(op, result)
    }

    /// Create from a raw field object such as a parsed input document. Fields
    /// that do not decode into `kind` fail with `VALIDATION_FAILED`, and the
    /// attempt is logged and recorded like any other failure.
    pub fn create_from_fields(
        &mut self,
        kind: ArtifactKind,
        mut fields: Map<String, Value>,
        opts: CreateOptions,
    ) -> OperationResult<Artifact> {
        let started = Instant::now();
        fields.remove("artifactType");
        match Artifact::from_fields(kind, fields.clone()) {
            Ok(artifact) => self.create(kind, artifact, opts),
            Err(e) => {
                let op = Operation::Create {
                    artifact_type: kind,
                    id: String::new(),
                    artifact: fields,
                };
                let result = ResultBuilder::new(started, OperationKind::Create, kind)
                    .dry_run(opts.dry_run)
                    .fail_with(e);
                self.finish(op, result)
            }
        }
    }

    pub fn read(&mut self, kind: ArtifactKind, id: &str, opts: ReadOptions) -> OperationResult<Artifact> {
        let op = Operation::Read {
            artifact_type: kind,
            id: id.to_string(),
        };
        let result = self.registry.get(kind).read(Call::new(&self.project_root), id, opts);
        self.finish(op, result)
    }

    pub fn update(
        &mut self,
        kind: ArtifactKind,
        id: &str,
        changes: &Map<String, Value>,
        opts: UpdateOptions,
    ) -> OperationResult<Artifact> {
        let op = Operation::Update {
            artifact_type: kind,
            id: id.to_string(),
            changes: changes.clone(),
        };
        let result = self
            .registry
            .get(kind)
            .update(Call::new(&self.project_root), id, changes, opts);
        self.finish(op, result)
    }

    pub fn delete(&mut self, kind: ArtifactKind, id: &str, opts: DeleteOptions) -> OperationResult<()> {
        let op = Operation::Delete {
            artifact_type: kind,
            id: id.to_string(),
        };
        let result = self.registry.get(kind).delete(Call::new(&self.project_root), id, opts);
        self.finish(op, result)
    }

    pub fn list(&mut self, kind: ArtifactKind) -> OperationResult<Vec<Artifact>> {
        let op = Operation::Query { artifact_type: kind };
        let result = self.registry.get(kind).list(Call::new(&self.project_root));
        self.finish(op, result)
    }

    fn finish<T>(&mut self, op: Operation, result: OperationResult<T>) -> OperationResult<T> {
        let logging = self.config.logging;
        let record = OperationLog::from_result(&result, logging.include_state_in_logs);
        if record.enabled_by(&logging) {
            self.logger.log(&record);
        }
        if self.config.versioning.capture_snapshots {
            self.history.record(HistoryEntry::from_result(op, &result));
            result
        } else {
            result.without_snapshots()
        }
    }
}

// ---------------------------------------------------------------------------
// Typed wrappers
// ---------------------------------------------------------------------------

macro_rules! typed_wrappers {
    ($($ty:ident => $kind:ident: $create:ident, $read:ident, $update:ident, $delete:ident, $list:ident;)*) => {
        impl CrudEngine {
            $(
                pub fn $create(&mut self, artifact: $ty, opts: CreateOptions) -> OperationResult<$ty> {
                    self.create(ArtifactKind::$kind, artifact.into(), opts).narrow()
                }

                pub fn $read(&mut self, id: &str, opts: ReadOptions) -> OperationResult<$ty> {
                    self.read(ArtifactKind::$kind, id, opts).narrow()
                }

                pub fn $update(
                    &mut self,
                    id: &str,
                    changes: &Map<String, Value>,
                    opts: UpdateOptions,
                ) -> OperationResult<$ty> {
                    self.update(ArtifactKind::$kind, id, changes, opts).narrow()
                }

                pub fn $delete(&mut self, id: &str, opts: DeleteOptions) -> OperationResult<()> {
                    self.delete(ArtifactKind::$kind, id, opts)
                }

                pub fn $list(&mut self) -> OperationResult<Vec<$ty>> {
                    self.list(ArtifactKind::$kind).narrow_all()
                }
            )*
        }
    };
}

typed_wrappers! {
    Skill => Skill: create_skill, read_skill, update_skill, delete_skill, list_skills;
    Hook => Hook: create_hook, read_hook, update_hook, delete_hook, list_hooks;
    Agent => Agent: create_agent, read_agent, update_agent, delete_agent, list_agents;
    SubAgent => SubAgent: create_subagent, read_subagent, update_subagent, delete_subagent, list_subagents;
    Rule => Rule: create_rule, read_rule, update_rule, delete_rule, list_rules;
    Command => Command: create_command, read_command, update_command, delete_command, list_commands;
    McpServer => McpServer: create_mcp_server, read_mcp_server, update_mcp_server, delete_mcp_server, list_mcp_servers;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

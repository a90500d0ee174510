//! Per-artifact-type storage adapters.
//!
//! Every handler exposes the same contract. Handlers catch their own I/O and
//! parse failures and report them as failed [`OperationResult`]s; nothing
//! escapes as a panic or an `Err`.
//!
//! Two storage patterns exist:
//!
//! ```text
//! one-to-one   MarkdownHandler<A>   .claude/{skills,agents,rules,commands}/…  one file each
//! aggregated   SettingsHandler<A>   .claude/settings.json  hooks[] / mcpServers{}
//! ```

pub mod markdown;
pub mod settings;

use crate::artifact::{Agent, Artifact, Command, Hook, McpServer, Rule, Skill, SubAgent};
use crate::error::Result;
use crate::result::OperationResult;
use crate::types::{ArtifactKind, StorageKind};
use markdown::MarkdownHandler;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use settings::SettingsHandler;
use std::path::{Path, PathBuf};
use std::time::Instant;

// ---------------------------------------------------------------------------
// Call context and options
// ---------------------------------------------------------------------------

/// Per-call context: the project root and the instant the call started.
#[derive(Debug, Clone, Copy)]
pub struct Call<'a> {
    pub root: &'a Path,
    pub started: Instant,
}

impl<'a> Call<'a> {
    pub fn new(root: &'a Path) -> Self {
        Self {
            root,
            started: Instant::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateOptions {
    pub overwrite: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReadOptions {
    pub include_content: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            include_content: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateOptions {
    pub merge: bool,
    pub dry_run: bool,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            merge: true,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeleteOptions {
    pub soft: bool,
    pub dry_run: bool,
}

// ---------------------------------------------------------------------------
// ArtifactHandler
// ---------------------------------------------------------------------------

pub trait ArtifactHandler {
    fn kind(&self) -> ArtifactKind;

    fn storage(&self) -> StorageKind {
        self.kind().storage()
    }

    /// Where the artifact with `id` is stored. No I/O.
    fn path(&self, root: &Path, id: &str) -> Result<PathBuf>;

    /// True when the artifact is present and of this handler's type.
    fn exists(&self, root: &Path, id: &str) -> bool;

    fn create(
        &self,
        call: Call<'_>,
        artifact: Artifact,
        opts: CreateOptions,
    ) -> OperationResult<Artifact>;

    fn read(&self, call: Call<'_>, id: &str, opts: ReadOptions) -> OperationResult<Artifact>;

    fn update(
        &self,
        call: Call<'_>,
        id: &str,
        changes: &Map<String, Value>,
        opts: UpdateOptions,
    ) -> OperationResult<Artifact>;

    fn delete(&self, call: Call<'_>, id: &str, opts: DeleteOptions) -> OperationResult<()>;

    /// Every stored artifact of this type. Missing storage is an empty list.
    fn list(&self, call: Call<'_>) -> OperationResult<Vec<Artifact>>;
}

// ---------------------------------------------------------------------------
// HandlerRegistry
// ---------------------------------------------------------------------------

/// One handler per artifact type, resolved by an exhaustive match.
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    skill: MarkdownHandler<Skill>,
    agent: MarkdownHandler<Agent>,
    subagent: MarkdownHandler<SubAgent>,
    rule: MarkdownHandler<Rule>,
    command: MarkdownHandler<Command>,
    hook: SettingsHandler<Hook>,
    mcp_server: SettingsHandler<McpServer>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: ArtifactKind) -> &dyn ArtifactHandler {
        match kind {
            ArtifactKind::Skill => &self.skill,
            ArtifactKind::Hook => &self.hook,
            ArtifactKind::Agent => &self.agent,
            ArtifactKind::SubAgent => &self.subagent,
            ArtifactKind::Rule => &self.rule,
            ArtifactKind::Command => &self.command,
            ArtifactKind::McpServer => &self.mcp_server,
        }
    }
}

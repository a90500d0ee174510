use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CrudError;

// ---------------------------------------------------------------------------
// ArtifactKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ArtifactKind {
    #[serde(rename = "skill")]
    Skill,
    #[serde(rename = "hook")]
    Hook,
    #[serde(rename = "agent")]
    Agent,
    #[serde(rename = "subagent")]
    SubAgent,
    #[serde(rename = "rule")]
    Rule,
    #[serde(rename = "command")]
    Command,
    #[serde(rename = "mcp-server")]
    McpServer,
}

impl ArtifactKind {
    pub fn all() -> &'static [ArtifactKind] {
        &[
            ArtifactKind::Skill,
            ArtifactKind::Hook,
            ArtifactKind::Agent,
            ArtifactKind::SubAgent,
            ArtifactKind::Rule,
            ArtifactKind::Command,
            ArtifactKind::McpServer,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::Skill => "skill",
            ArtifactKind::Hook => "hook",
            ArtifactKind::Agent => "agent",
            ArtifactKind::SubAgent => "subagent",
            ArtifactKind::Rule => "rule",
            ArtifactKind::Command => "command",
            ArtifactKind::McpServer => "mcp-server",
        }
    }

    pub fn storage(self) -> StorageKind {
        match self {
            ArtifactKind::Hook | ArtifactKind::McpServer => StorageKind::Aggregated,
            _ => StorageKind::OneToOne,
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ArtifactKind {
    type Err = CrudError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "skill" => Ok(ArtifactKind::Skill),
            "hook" => Ok(ArtifactKind::Hook),
            "agent" => Ok(ArtifactKind::Agent),
            "subagent" | "sub-agent" => Ok(ArtifactKind::SubAgent),
            "rule" => Ok(ArtifactKind::Rule),
            "command" => Ok(ArtifactKind::Command),
            "mcp-server" | "mcp" => Ok(ArtifactKind::McpServer),
            _ => Err(CrudError::UnknownArtifactType(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// StorageKind
// ---------------------------------------------------------------------------

/// How a handler lays artifacts out on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    /// One file per artifact.
    OneToOne,
    /// Many artifacts sharing a section of one JSON file.
    Aggregated,
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageKind::OneToOne => f.write_str("one-to-one"),
            StorageKind::Aggregated => f.write_str("aggregated"),
        }
    }
}

// ---------------------------------------------------------------------------
// OperationKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Create,
    Read,
    Update,
    Delete,
    Query,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Create => "create",
            OperationKind::Read => "read",
            OperationKind::Update => "update",
            OperationKind::Delete => "delete",
            OperationKind::Query => "query",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

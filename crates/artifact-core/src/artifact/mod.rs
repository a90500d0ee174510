//! Artifact model: one struct per artifact type plus the closed [`Artifact`] sum.
//!
//! Every variant serializes to a camelCase JSON object that always carries
//! `id`, `pluginId` and `name`. That object form is what snapshots, diffs and
//! partial updates operate on.

mod agent;
mod command;
mod hook;
mod mcp_server;
mod rule;
mod skill;

pub use agent::{Agent, SubAgent};
pub use command::Command;
pub use hook::Hook;
pub use mcp_server::McpServer;
pub use rule::Rule;
pub use skill::Skill;

use crate::error::{CrudError, Result};
use crate::types::ArtifactKind;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Keys that identify an artifact and survive any update.
pub const IDENTITY_FIELDS: &[&str] = &["id", "pluginId", "name"];

// ---------------------------------------------------------------------------
// ArtifactRecord
// ---------------------------------------------------------------------------

/// Behaviour shared by every concrete artifact struct.
pub trait ArtifactRecord: Clone + PartialEq + Serialize + DeserializeOwned {
    const KIND: ArtifactKind;

    fn id(&self) -> &str;

    /// Recompute `id` from the fields that make up the artifact's key.
    fn derive_id(&mut self);

    /// Check key fields before the artifact is written.
    fn validate(&self) -> Result<()>;

    /// Drop large body fields, keeping metadata.
    fn strip_content(&mut self) {}

    /// Fields carried over from the existing record on a full replace when
    /// the replacement omits them.
    fn retained_on_replace() -> &'static [&'static str] {
        &[]
    }

    fn into_artifact(self) -> Artifact;

    fn from_artifact(artifact: Artifact) -> std::result::Result<Self, Artifact>;
}

// ---------------------------------------------------------------------------
// Artifact
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "artifactType")]
pub enum Artifact {
    #[serde(rename = "skill")]
    Skill(Skill),
    #[serde(rename = "hook")]
    Hook(Hook),
    #[serde(rename = "agent")]
    Agent(Agent),
    #[serde(rename = "subagent")]
    SubAgent(SubAgent),
    #[serde(rename = "rule")]
    Rule(Rule),
    #[serde(rename = "command")]
    Command(Command),
    #[serde(rename = "mcp-server")]
    McpServer(McpServer),
}

macro_rules! each_variant {
    ($value:expr, $inner:ident => $body:expr) => {
        match $value {
            Artifact::Skill($inner) => $body,
            Artifact::Hook($inner) => $body,
            Artifact::Agent($inner) => $body,
            Artifact::SubAgent($inner) => $body,
            Artifact::Rule($inner) => $body,
            Artifact::Command($inner) => $body,
            Artifact::McpServer($inner) => $body,
        }
    };
}

impl Artifact {
    pub fn kind(&self) -> ArtifactKind {
        match self {
            Artifact::Skill(_) => ArtifactKind::Skill,
            Artifact::Hook(_) => ArtifactKind::Hook,
            Artifact::Agent(_) => ArtifactKind::Agent,
            Artifact::SubAgent(_) => ArtifactKind::SubAgent,
            Artifact::Rule(_) => ArtifactKind::Rule,
            Artifact::Command(_) => ArtifactKind::Command,
            Artifact::McpServer(_) => ArtifactKind::McpServer,
        }
    }

    pub fn id(&self) -> &str {
        each_variant!(self, a => a.id())
    }

    pub fn validate(&self) -> Result<()> {
        each_variant!(self, a => a.validate())
    }

    pub fn strip_content(&mut self) {
        each_variant!(self, a => a.strip_content())
    }

    pub(crate) fn derive_id(&mut self) {
        each_variant!(self, a => a.derive_id())
    }

    /// The artifact's fields as a JSON object, without the type tag.
    pub fn to_fields(&self) -> Result<Map<String, Value>> {
        let value = each_variant!(self, a => serde_json::to_value(a)?);
        match value {
            Value::Object(map) => Ok(map),
            other => Err(CrudError::Validation(format!(
                "artifact serialized to non-object: {other}"
            ))),
        }
    }

    /// Build an artifact of `kind` from a field object, recomputing its id.
    pub fn from_fields(kind: ArtifactKind, fields: Map<String, Value>) -> Result<Self> {
        let value = Value::Object(fields);
        let mut artifact = match kind {
            ArtifactKind::Skill => Artifact::Skill(decode(value)?),
            ArtifactKind::Hook => Artifact::Hook(decode(value)?),
            ArtifactKind::Agent => Artifact::Agent(decode(value)?),
            ArtifactKind::SubAgent => Artifact::SubAgent(decode(value)?),
            ArtifactKind::Rule => Artifact::Rule(decode(value)?),
            ArtifactKind::Command => Artifact::Command(decode(value)?),
            ArtifactKind::McpServer => Artifact::McpServer(decode(value)?),
        };
        artifact.derive_id();
        Ok(artifact)
    }

    /// Narrow to a concrete artifact struct.
    pub fn into_record<A: ArtifactRecord>(self) -> Result<A> {
        let found = self.kind();
        A::from_artifact(self).map_err(|_| CrudError::KindMismatch {
            expected: A::KIND.to_string(),
            found: found.to_string(),
        })
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| CrudError::Validation(e.to_string()))
}

macro_rules! impl_conversions {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Artifact {
                fn from(a: $variant) -> Self {
                    Artifact::$variant(a)
                }
            }
        )*
    };
}

impl_conversions!(Skill, Hook, Agent, SubAgent, Rule, Command, McpServer);

// ---------------------------------------------------------------------------
// Serde helpers
// ---------------------------------------------------------------------------

/// Accept either a YAML list or a comma-separated string (`tools: Read, Grep`).
pub(crate) fn string_or_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        List(Vec<String>),
        Csv(String),
        Nothing(()),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::List(items) => items,
        Raw::Csv(s) => s
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect(),
        Raw::Nothing(()) => Vec::new(),
    })
}

/// Reject extra frontmatter keys that would shadow a modelled key once the
/// extras are flattened into the same YAML block.
pub(crate) fn check_extra_keys(extra: &Map<String, Value>, reserved: &[&str]) -> Result<()> {
    match extra.keys().find(|k| reserved.contains(&k.as_str())) {
        Some(key) => Err(CrudError::Validation(format!(
            "frontmatterConfig key '{key}' is reserved for a modelled field"
        ))),
        None => Ok(()),
    }
}

pub(crate) fn default_true() -> bool {
    true
}

pub(crate) fn is_true(b: &bool) -> bool {
    *b
}

use super::{string_or_list, Artifact, ArtifactRecord};
use crate::error::{CrudError, Result};
use crate::frontmatter;
use crate::handler::markdown::{Decoded, MarkdownArtifact};
use crate::io;
use crate::paths;
use crate::types::ArtifactKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// A top-level agent definition in `.claude/agents/{name}.md`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub plugin_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub frontmatter_config: Map<String, Value>,
}

impl Agent {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            plugin_id: String::new(),
            name,
            description: description.into(),
            tools: Vec::new(),
            model: None,
            content: String::new(),
            frontmatter_config: Map::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// SubAgent
// ---------------------------------------------------------------------------

/// An agent spawned by another agent. Shares the agents directory and is told
/// apart from [`Agent`] by its `contextMode` frontmatter key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubAgent {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub plugin_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub context_mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_agent: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub frontmatter_config: Map<String, Value>,
}

impl SubAgent {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        context_mode: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            plugin_id: String::new(),
            name,
            description: description.into(),
            tools: Vec::new(),
            model: None,
            context_mode: context_mode.into(),
            parent_agent: None,
            content: String::new(),
            frontmatter_config: Map::new(),
        }
    }
}

macro_rules! agent_record {
    ($ty:ident, $kind:expr) => {
        impl ArtifactRecord for $ty {
            const KIND: ArtifactKind = $kind;

            fn id(&self) -> &str {
                &self.id
            }

            fn derive_id(&mut self) {
                self.id = self.name.clone();
            }

            fn validate(&self) -> Result<()> {
                paths::validate_name(&self.name)?;
                super::check_extra_keys(&self.frontmatter_config, AGENT_KEYS)
            }

            fn strip_content(&mut self) {
                self.content.clear();
            }

            fn into_artifact(self) -> Artifact {
                Artifact::$ty(self)
            }

            fn from_artifact(artifact: Artifact) -> std::result::Result<Self, Artifact> {
                match artifact {
                    Artifact::$ty(a) => Ok(a),
                    other => Err(other),
                }
            }
        }
    };
}

agent_record!(Agent, ArtifactKind::Agent);
agent_record!(SubAgent, ArtifactKind::SubAgent);

// ---------------------------------------------------------------------------
// Markdown encoding
// ---------------------------------------------------------------------------

const AGENT_KEYS: &[&str] = &[
    "name",
    "description",
    "tools",
    "model",
    "contextMode",
    "parentAgent",
    "pluginId",
];

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AgentFrontmatter {
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
    #[serde(
        default,
        deserialize_with = "string_or_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    tools: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    context_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent_agent: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    plugin_id: String,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

fn agent_ids(root: &Path) -> Result<Vec<String>> {
    let files = io::files_with_extension(&root.join(paths::AGENTS_DIR), "md")?;
    Ok(files
        .iter()
        .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .collect())
}

fn agent_path(root: &Path, id: &str) -> Result<PathBuf> {
    paths::validate_name(id)?;
    Ok(paths::agent_file(root, id))
}

impl MarkdownArtifact for Agent {
    fn file_path(root: &Path, id: &str) -> Result<PathBuf> {
        agent_path(root, id)
    }

    fn stored_ids(root: &Path) -> Result<Vec<String>> {
        agent_ids(root)
    }

    fn render(&self) -> Result<String> {
        let fm = AgentFrontmatter {
            name: self.name.clone(),
            description: self.description.clone(),
            tools: self.tools.clone(),
            model: self.model.clone(),
            context_mode: None,
            parent_agent: None,
            plugin_id: self.plugin_id.clone(),
            extra: self.frontmatter_config.clone(),
        };
        frontmatter::render(&fm, &self.content)
    }

    fn decode(id: &str, text: &str, path: &Path) -> Result<Decoded<Self>> {
        let (fm, body): (AgentFrontmatter, String) = frontmatter::parse(text, path)?;
        if fm.context_mode.is_some() {
            return Ok(Decoded::Other(ArtifactKind::SubAgent));
        }
        Ok(Decoded::Match(Agent {
            id: id.to_string(),
            plugin_id: fm.plugin_id,
            name: id.to_string(),
            description: fm.description,
            tools: fm.tools,
            model: fm.model,
            content: body,
            frontmatter_config: fm.extra,
        }))
    }
}

impl MarkdownArtifact for SubAgent {
    fn file_path(root: &Path, id: &str) -> Result<PathBuf> {
        agent_path(root, id)
    }

    fn stored_ids(root: &Path) -> Result<Vec<String>> {
        agent_ids(root)
    }

    fn render(&self) -> Result<String> {
        if self.context_mode.trim().is_empty() {
            return Err(CrudError::Validation(format!(
                "subagent '{}' requires a contextMode",
                self.name
            )));
        }
        let fm = AgentFrontmatter {
            name: self.name.clone(),
            description: self.description.clone(),
            tools: self.tools.clone(),
            model: self.model.clone(),
            context_mode: Some(self.context_mode.clone()),
            parent_agent: self.parent_agent.clone(),
            plugin_id: self.plugin_id.clone(),
            extra: self.frontmatter_config.clone(),
        };
        frontmatter::render(&fm, &self.content)
    }

    fn decode(id: &str, text: &str, path: &Path) -> Result<Decoded<Self>> {
        let (fm, body): (AgentFrontmatter, String) = frontmatter::parse(text, path)?;
        let Some(context_mode) = fm.context_mode else {
            return Ok(Decoded::Other(ArtifactKind::Agent));
        };
        Ok(Decoded::Match(SubAgent {
            id: id.to_string(),
            plugin_id: fm.plugin_id,
            name: id.to_string(),
            description: fm.description,
            tools: fm.tools,
            model: fm.model,
            context_mode,
            parent_agent: fm.parent_agent,
            content: body,
            frontmatter_config: fm.extra,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extra_keys_may_not_shadow_frontmatter() {
        let mut agent = Agent::new("lead", "Leads");
        agent.frontmatter_config.insert("color".into(), "blue".into());
        assert!(agent.validate().is_ok());
        agent.frontmatter_config.insert("contextMode".into(), "fork".into());
        assert!(matches!(agent.validate(), Err(CrudError::Validation(_))));

        let mut sub = SubAgent::new("scout", "Scouts", "fork");
        sub.frontmatter_config.insert("parentAgent".into(), "lead".into());
        assert!(matches!(sub.validate(), Err(CrudError::Validation(_))));
    }

    #[test]
    fn agent_round_trip() {
        let mut agent = Agent::new("reviewer", "Reviews diffs");
        agent.tools = vec!["Read".into(), "Grep".into()];
        agent.model = Some("sonnet".into());
        agent.content = "You are a careful reviewer.".into();
        let text = agent.render().unwrap();
        assert!(!text.contains("contextMode"));
        let Decoded::Match(back) = Agent::decode("reviewer", &text, Path::new("r.md")).unwrap()
        else {
            panic!("expected agent");
        };
        assert_eq!(back, agent);
    }

    #[test]
    fn subagent_is_discriminated_by_context_mode() {
        let mut sub = SubAgent::new("scout", "Explores", "fork");
        sub.parent_agent = Some("lead".into());
        let text = sub.render().unwrap();
        assert!(text.contains("contextMode: fork"));

        assert!(matches!(
            Agent::decode("scout", &text, Path::new("s.md")).unwrap(),
            Decoded::Other(ArtifactKind::SubAgent)
        ));
        let Decoded::Match(back) = SubAgent::decode("scout", &text, Path::new("s.md")).unwrap()
        else {
            panic!("expected subagent");
        };
        assert_eq!(back, sub);
    }

    #[test]
    fn plain_agent_is_not_a_subagent() {
        let text = "---\nname: helper\ndescription: Helps\ntools: Read, Write\n---\n\nBody\n";
        assert!(matches!(
            SubAgent::decode("helper", text, Path::new("h.md")).unwrap(),
            Decoded::Other(ArtifactKind::Agent)
        ));
        let Decoded::Match(agent) = Agent::decode("helper", text, Path::new("h.md")).unwrap()
        else {
            panic!("expected agent");
        };
        assert_eq!(agent.tools, vec!["Read", "Write"]);
        assert_eq!(agent.content, "Body");
    }

    #[test]
    fn subagent_requires_context_mode() {
        let sub = SubAgent::new("x", "d", "  ");
        assert!(sub.render().is_err());
    }
}

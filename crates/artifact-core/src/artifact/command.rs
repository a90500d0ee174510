use super::{string_or_list, Artifact, ArtifactRecord};
use crate::error::Result;
use crate::frontmatter;
use crate::handler::markdown::{Decoded, MarkdownArtifact};
use crate::io;
use crate::paths;
use crate::types::ArtifactKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A slash command in `.claude/commands/{name}.md`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub plugin_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argument_hint: Option<String>,
    #[serde(default)]
    pub allowed_tools: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub content: String,
}

impl Command {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            plugin_id: String::new(),
            name,
            description: description.into(),
            argument_hint: None,
            allowed_tools: Vec::new(),
            model: None,
            content: String::new(),
        }
    }
}

impl ArtifactRecord for Command {
    const KIND: ArtifactKind = ArtifactKind::Command;

    fn id(&self) -> &str {
        &self.id
    }

    fn derive_id(&mut self) {
        self.id = self.name.clone();
    }

    fn validate(&self) -> Result<()> {
        paths::validate_name(&self.name)
    }

    fn strip_content(&mut self) {
        self.content.clear();
    }

    fn into_artifact(self) -> Artifact {
        Artifact::Command(self)
    }

    fn from_artifact(artifact: Artifact) -> std::result::Result<Self, Artifact> {
        match artifact {
            Artifact::Command(c) => Ok(c),
            other => Err(other),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct CommandFrontmatter {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    argument_hint: Option<String>,
    #[serde(
        default,
        deserialize_with = "string_or_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    allowed_tools: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    #[serde(default, rename = "pluginId", skip_serializing_if = "String::is_empty")]
    plugin_id: String,
}

impl MarkdownArtifact for Command {
    fn file_path(root: &Path, id: &str) -> Result<PathBuf> {
        paths::validate_name(id)?;
        Ok(paths::command_file(root, id))
    }

    fn stored_ids(root: &Path) -> Result<Vec<String>> {
        let files = io::files_with_extension(&root.join(paths::COMMANDS_DIR), "md")?;
        Ok(files
            .iter()
            .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect())
    }

    fn render(&self) -> Result<String> {
        let fm = CommandFrontmatter {
            description: self.description.clone(),
            argument_hint: self.argument_hint.clone(),
            allowed_tools: self.allowed_tools.clone(),
            model: self.model.clone(),
            plugin_id: self.plugin_id.clone(),
        };
        frontmatter::render(&fm, &self.content)
    }

    fn decode(id: &str, text: &str, path: &Path) -> Result<Decoded<Self>> {
        let (fm, body): (CommandFrontmatter, String) = frontmatter::parse_or_default(text, path)?;
        Ok(Decoded::Match(Command {
            id: id.to_string(),
            plugin_id: fm.plugin_id,
            name: id.to_string(),
            description: fm.description,
            argument_hint: fm.argument_hint,
            allowed_tools: fm.allowed_tools,
            model: fm.model,
            content: body,
        }))
    }
}

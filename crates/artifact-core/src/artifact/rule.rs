use super::{string_or_list, Artifact, ArtifactRecord};
use crate::error::Result;
use crate::frontmatter;
use crate::handler::markdown::{Decoded, MarkdownArtifact};
use crate::io;
use crate::paths;
use crate::types::ArtifactKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A project rule in `.claude/rules/{name}.md`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub plugin_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Globs the rule is scoped to. Empty means always applied.
    #[serde(default)]
    pub paths: Vec<String>,
    #[serde(default)]
    pub content: String,
}

impl Rule {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            plugin_id: String::new(),
            name,
            description: String::new(),
            paths: Vec::new(),
            content: content.into(),
        }
    }
}

impl ArtifactRecord for Rule {
    const KIND: ArtifactKind = ArtifactKind::Rule;

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
        Artifact::Rule(self)
    }

    fn from_artifact(artifact: Artifact) -> std::result::Result<Self, Artifact> {
        match artifact {
            Artifact::Rule(r) => Ok(r),
            other => Err(other),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RuleFrontmatter {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    description: String,
    #[serde(
        default,
        deserialize_with = "string_or_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    paths: Vec<String>,
    #[serde(default, rename = "pluginId", skip_serializing_if = "String::is_empty")]
    plugin_id: String,
}

impl MarkdownArtifact for Rule {
    fn file_path(root: &Path, id: &str) -> Result<PathBuf> {
        paths::validate_name(id)?;
        Ok(paths::rule_file(root, id))
    }

    fn stored_ids(root: &Path) -> Result<Vec<String>> {
        let files = io::files_with_extension(&root.join(paths::RULES_DIR), "md")?;
        Ok(files
            .iter()
            .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect())
    }

    fn render(&self) -> Result<String> {
        let fm = RuleFrontmatter {
            description: self.description.clone(),
            paths: self.paths.clone(),
            plugin_id: self.plugin_id.clone(),
        };
        if fm.description.is_empty() && fm.paths.is_empty() && fm.plugin_id.is_empty() {
            return Ok(format!("{}\n", self.content));
        }
        frontmatter::render(&fm, &self.content)
    }

    fn decode(id: &str, text: &str, path: &Path) -> Result<Decoded<Self>> {
        let (fm, body): (RuleFrontmatter, String) = frontmatter::parse_or_default(text, path)?;
        Ok(Decoded::Match(Rule {
            id: id.to_string(),
            plugin_id: fm.plugin_id,
            name: id.to_string(),
            description: fm.description,
            paths: fm.paths,
            content: body,
        }))
    }
}

use super::{string_or_list, Artifact, ArtifactRecord};
use crate::error::Result;
use crate::frontmatter;
use crate::handler::markdown::{Decoded, MarkdownArtifact};
use crate::io;
use crate::paths;
use crate::types::ArtifactKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

const CONTENT_HEADING: &str = "## Content";
const PATTERNS_HEADING: &str = "## Patterns";
const WORKFLOWS_HEADING: &str = "## Workflows";

// ---------------------------------------------------------------------------
// Skill
// ---------------------------------------------------------------------------

/// A skill pack stored at `.claude/skills/{category}/{name}/SKILL.md`.
///
/// The body is written as `## Content`, `## Patterns` and `## Workflows`
/// sections, so `content` loses leading and trailing blank lines and each
/// pattern or workflow is stored as one trimmed line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub plugin_id: String,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub workflows: Vec<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub frontmatter_config: Map<String, Value>,
}

impl Skill {
    pub fn new(
        category: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let mut skill = Self {
            id: String::new(),
            plugin_id: String::new(),
            name: name.into(),
            category: category.into(),
            description: description.into(),
            version: None,
            tools: Vec::new(),
            content: String::new(),
            patterns: Vec::new(),
            workflows: Vec::new(),
            frontmatter_config: Map::new(),
        };
        skill.derive_id();
        skill
    }
}

impl ArtifactRecord for Skill {
    const KIND: ArtifactKind = ArtifactKind::Skill;

    fn id(&self) -> &str {
        &self.id
    }

    fn derive_id(&mut self) {
        self.id = format!("{}/{}", self.category, self.name);
    }

    fn validate(&self) -> Result<()> {
        paths::validate_name(&self.category)?;
        paths::validate_name(&self.name)?;
        super::check_extra_keys(&self.frontmatter_config, SKILL_KEYS)
    }

    fn strip_content(&mut self) {
        self.content.clear();
        self.patterns.clear();
        self.workflows.clear();
    }

    fn retained_on_replace() -> &'static [&'static str] {
        &["category"]
    }

    fn into_artifact(self) -> Artifact {
        Artifact::Skill(self)
    }

    fn from_artifact(artifact: Artifact) -> std::result::Result<Self, Artifact> {
        match artifact {
            Artifact::Skill(s) => Ok(s),
            other => Err(other),
        }
    }
}

// ---------------------------------------------------------------------------
// SKILL.md encoding
// ---------------------------------------------------------------------------

/// Keys written by [`SkillFrontmatter`] itself.
const SKILL_KEYS: &[&str] = &[
    "name",
    "description",
    "category",
    "version",
    "allowed-tools",
    "pluginId",
];

#[derive(Debug, Serialize, Deserialize)]
struct SkillFrontmatter {
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(
        default,
        rename = "allowed-tools",
        deserialize_with = "string_or_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    tools: Vec<String>,
    #[serde(default, rename = "pluginId", skip_serializing_if = "String::is_empty")]
    plugin_id: String,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Clone, Copy, PartialEq)]
enum Section {
    Preamble,
    Content,
    Patterns,
    Workflows,
}

fn render_list(out: &mut String, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    out.push_str(heading);
    out.push_str("\n\n");
    for item in items {
        out.push_str("- ");
        out.push_str(&item.replace('\n', " "));
        out.push('\n');
    }
    out.push('\n');
}

fn render_body(skill: &Skill) -> String {
    let mut out = format!("# {}\n\n", skill.name);
    let content = skill.content.trim();
    if !content.is_empty() {
        out.push_str(CONTENT_HEADING);
        out.push_str("\n\n");
        out.push_str(content);
        out.push_str("\n\n");
    }
    render_list(&mut out, PATTERNS_HEADING, &skill.patterns);
    render_list(&mut out, WORKFLOWS_HEADING, &skill.workflows);
    out
}

fn parse_body(body: &str) -> (String, Vec<String>, Vec<String>) {
    let mut section = Section::Preamble;
    let mut content: Vec<&str> = Vec::new();
    let mut patterns = Vec::new();
    let mut workflows = Vec::new();

    for line in body.lines() {
        match line.trim_end() {
            CONTENT_HEADING => {
                section = Section::Content;
                continue;
            }
            PATTERNS_HEADING => {
                section = Section::Patterns;
                continue;
            }
            WORKFLOWS_HEADING => {
                section = Section::Workflows;
                continue;
            }
            _ => {}
        }
        match section {
            Section::Preamble => {}
            Section::Content => content.push(line),
            Section::Patterns | Section::Workflows => {
                if let Some(item) = line.trim_start().strip_prefix("- ") {
                    let target = if section == Section::Patterns {
                        &mut patterns
                    } else {
                        &mut workflows
                    };
                    target.push(item.trim().to_string());
                }
            }
        }
    }

    (content.join("\n").trim().to_string(), patterns, workflows)
}

impl MarkdownArtifact for Skill {
    fn file_path(root: &Path, id: &str) -> Result<PathBuf> {
        let (category, name) = paths::split_skill_id(id)?;
        Ok(paths::skill_file(root, category, name))
    }

    fn stored_ids(root: &Path) -> Result<Vec<String>> {
        let skills_dir = root.join(paths::SKILLS_DIR);
        let mut ids = Vec::new();
        for category in io::subdirectories(&skills_dir)? {
            for name in io::subdirectories(&skills_dir.join(&category))? {
                if paths::skill_file(root, &category, &name).is_file() {
                    ids.push(format!("{category}/{name}"));
                }
            }
        }
        Ok(ids)
    }

    fn render(&self) -> Result<String> {
        let fm = SkillFrontmatter {
            name: self.name.clone(),
            description: self.description.clone(),
            category: Some(self.category.clone()),
            version: self.version.clone(),
            tools: self.tools.clone(),
            plugin_id: self.plugin_id.clone(),
            extra: self.frontmatter_config.clone(),
        };
        frontmatter::render(&fm, &render_body(self))
    }

    fn decode(id: &str, text: &str, path: &Path) -> Result<Decoded<Self>> {
        let (category, name) = paths::split_skill_id(id)?;
        let (fm, body): (SkillFrontmatter, String) = frontmatter::parse(text, path)?;
        let (content, patterns, workflows) = parse_body(&body);
        let mut skill = Skill {
            id: String::new(),
            plugin_id: fm.plugin_id,
            name: name.to_string(),
            category: category.to_string(),
            description: fm.description,
            version: fm.version,
            tools: fm.tools,
            content,
            patterns,
            workflows,
            frontmatter_config: fm.extra,
        };
        skill.derive_id();
        Ok(Decoded::Match(skill))
    }

    /// Removes the skill directory but keeps earlier soft-delete backups.
    /// The directory itself goes only once nothing is left in it.
    fn remove(root: &Path, id: &str) -> Result<()> {
        let (category, name) = paths::split_skill_id(id)?;
        let dir = paths::skill_dir(root, category, name);
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                std::fs::remove_dir_all(&path)?;
            } else if !io::is_backup(&path) {
                std::fs::remove_file(&path)?;
            }
        }
        io::remove_dir_if_empty(&dir);
        io::remove_dir_if_empty(&root.join(paths::SKILLS_DIR).join(category));
        Ok(())
    }

    /// Moves the whole skill directory so bundled scripts follow the skill.
    fn relocate(root: &Path, from: &str, to: &str) -> Result<()> {
        let (old_category, old_name) = paths::split_skill_id(from)?;
        let (new_category, new_name) = paths::split_skill_id(to)?;
        let target = paths::skill_dir(root, new_category, new_name);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::rename(paths::skill_dir(root, old_category, old_name), target)?;
        io::remove_dir_if_empty(&root.join(paths::SKILLS_DIR).join(old_category));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Skill {
        let mut skill = Skill::new("core", "tdd", "Test-driven development");
        skill.version = Some("1.0.0".into());
        skill.tools = vec!["Read".into(), "Bash".into()];
        skill.content = "Write the failing test first.\n\n## Notes\nKeep cycles short.".into();
        skill.patterns = vec!["red-green-refactor".into()];
        skill.workflows = vec!["write test".into(), "make it pass".into()];
        skill
            .frontmatter_config
            .insert("license".into(), json!("MIT"));
        skill
    }

    #[test]
    fn new_derives_id() {
        assert_eq!(Skill::new("core", "x", "d").id, "core/x");
    }

    #[test]
    fn markdown_round_trip() {
        let skill = sample();
        let text = skill.render().unwrap();
        assert!(text.contains("allowed-tools:"));
        assert!(text.contains("## Content\n\nWrite the failing test first."));
        assert!(text.contains("## Patterns\n\n- red-green-refactor\n"));
        assert!(text.contains("license: MIT"));

        let Decoded::Match(back) = Skill::decode("core/tdd", &text, Path::new("SKILL.md")).unwrap()
        else {
            panic!("expected a skill");
        };
        assert_eq!(back, skill);
    }

    #[test]
    fn sectioned_body_is_normalized() {
        let mut skill = Skill::new("core", "x", "d");
        skill.content = "\n\nKeep it short.\n\n".into();
        skill.patterns = vec![" spaced ".into(), "two\nlines".into()];
        let text = skill.render().unwrap();
        let Decoded::Match(back) = Skill::decode("core/x", &text, Path::new("SKILL.md")).unwrap()
        else {
            panic!("expected a skill");
        };
        assert_eq!(back.content, "Keep it short.");
        assert_eq!(back.patterns, vec!["spaced", "two lines"]);
    }

    #[test]
    fn empty_sections_are_omitted() {
        let text = Skill::new("core", "x", "d").render().unwrap();
        assert!(!text.contains("## Patterns"));
        assert!(!text.contains("## Content"));
    }

    #[test]
    fn strip_content_keeps_metadata() {
        let mut skill = sample();
        skill.strip_content();
        assert!(skill.content.is_empty());
        assert!(skill.patterns.is_empty());
        assert_eq!(skill.tools.len(), 2);
        assert_eq!(skill.description, "Test-driven development");
    }

    #[test]
    fn stored_ids_require_skill_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path();
        crate::io::atomic_write(&paths::skill_file(root, "core", "x"), b"---\nname: x\n---\n")
            .unwrap();
        std::fs::create_dir_all(paths::skill_dir(root, "core", "empty")).unwrap();
        assert_eq!(Skill::stored_ids(root).unwrap(), vec!["core/x"]);
    }
}

use crate::error::{CrudError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const SKILLS_DIR: &str = ".claude/skills";
pub const AGENTS_DIR: &str = ".claude/agents";
pub const RULES_DIR: &str = ".claude/rules";
pub const COMMANDS_DIR: &str = ".claude/commands";

pub const SETTINGS_FILE: &str = ".claude/settings.json";
pub const ENGINE_CONFIG_FILE: &str = ".claude/artifact-engine.yaml";

pub const SKILL_FILE: &str = "SKILL.md";
pub const DELETED_SUFFIX: &str = ".deleted";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn skill_dir(root: &Path, category: &str, name: &str) -> PathBuf {
    root.join(SKILLS_DIR).join(category).join(name)
}

pub fn skill_file(root: &Path, category: &str, name: &str) -> PathBuf {
    skill_dir(root, category, name).join(SKILL_FILE)
}

pub fn agent_file(root: &Path, name: &str) -> PathBuf {
    root.join(AGENTS_DIR).join(format!("{name}.md"))
}

pub fn rule_file(root: &Path, name: &str) -> PathBuf {
    root.join(RULES_DIR).join(format!("{name}.md"))
}

pub fn command_file(root: &Path, name: &str) -> PathBuf {
    root.join(COMMANDS_DIR).join(format!("{name}.md"))
}

pub fn settings_path(root: &Path) -> PathBuf {
    root.join(SETTINGS_FILE)
}

pub fn engine_config_path(root: &Path) -> PathBuf {
    root.join(ENGINE_CONFIG_FILE)
}

/// Sibling path a soft-deleted file is moved to.
pub fn deleted_path(path: &Path) -> PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(DELETED_SUFFIX);
    PathBuf::from(s)
}

// ---------------------------------------------------------------------------
// Name validation
// ---------------------------------------------------------------------------

static NAME_RE: OnceLock<Regex> = OnceLock::new();

fn name_re() -> &'static Regex {
    NAME_RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").unwrap())
}

/// Validate a single path segment used as an artifact name or category.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(CrudError::InvalidId(name.to_string(), "empty".to_string()));
    }
    if name.len() > 128 {
        return Err(CrudError::InvalidId(
            name.to_string(),
            "longer than 128 characters".to_string(),
        ));
    }
    if name.contains("..") || !name_re().is_match(name) {
        return Err(CrudError::InvalidId(
            name.to_string(),
            "must be alphanumeric with '.', '_' or '-'".to_string(),
        ));
    }
    Ok(())
}

/// Split a skill id of the form `category/name`.
pub fn split_skill_id(id: &str) -> Result<(&str, &str)> {
    let Some((category, name)) = id.split_once('/') else {
        return Err(CrudError::InvalidId(
            id.to_string(),
            "skill ids have the form 'category/name'".to_string(),
        ));
    };
    validate_name(category)?;
    validate_name(name)?;
    Ok((category, name))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

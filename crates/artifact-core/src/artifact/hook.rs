use super::{default_true, Artifact, ArtifactRecord};
use crate::error::{CrudError, Result};
use crate::handler::settings::{SectionShape, SettingsEntry};
use crate::paths;
use crate::types::ArtifactKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A lifecycle hook, stored as an element of the `hooks` array in `settings.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hook {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub plugin_id: String,
    pub name: String,
    /// Lifecycle event, e.g. `PreToolUse` or `SessionStart`.
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matcher: Option<String>,
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Hook {
    pub fn new(
        name: impl Into<String>,
        event: impl Into<String>,
        command: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            plugin_id: String::new(),
            name,
            event: event.into(),
            matcher: None,
            command: command.into(),
            timeout: None,
            enabled: true,
        }
    }
}

impl ArtifactRecord for Hook {
    const KIND: ArtifactKind = ArtifactKind::Hook;

    fn id(&self) -> &str {
        &self.id
    }

    fn derive_id(&mut self) {
        self.id = self.name.clone();
    }

    fn validate(&self) -> Result<()> {
        paths::validate_name(&self.name)?;
        if self.event.trim().is_empty() {
            return Err(CrudError::Validation(format!(
                "hook '{}' has no event",
                self.name
            )));
        }
        Ok(())
    }

    fn into_artifact(self) -> Artifact {
        Artifact::Hook(self)
    }

    fn from_artifact(artifact: Artifact) -> std::result::Result<Self, Artifact> {
        match artifact {
            Artifact::Hook(h) => Ok(h),
            other => Err(other),
        }
    }
}

impl SettingsEntry for Hook {
    const SECTION: &'static str = "hooks";
    const SHAPE: SectionShape = SectionShape::List;

    fn encode(&self) -> Result<Value> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(map) = &mut value {
            map.remove("id");
            if self.plugin_id.is_empty() {
                map.remove("pluginId");
            }
        }
        Ok(value)
    }

    fn decode(id: &str, raw: &Value) -> Result<Self> {
        let mut hook: Hook = serde_json::from_value(raw.clone())
            .map_err(|e| CrudError::Settings(format!("hook '{id}': {e}")))?;
        hook.derive_id();
        Ok(hook)
    }

    fn disable(&mut self) {
        self.enabled = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn encode_drops_derived_keys() {
        let hook = Hook::new("fmt", "PostToolUse", "cargo fmt");
        let value = hook.encode().unwrap();
        assert_eq!(
            value,
            json!({"name": "fmt", "event": "PostToolUse", "command": "cargo fmt", "enabled": true})
        );
    }

    #[test]
    fn decode_defaults_enabled() {
        let raw = json!({"name": "lint", "event": "PreToolUse", "matcher": "Edit", "command": "make lint"});
        let hook = Hook::decode("lint", &raw).unwrap();
        assert!(hook.enabled);
        assert_eq!(hook.id, "lint");
        assert_eq!(hook.matcher.as_deref(), Some("Edit"));
    }

    #[test]
    fn validate_requires_event() {
        let hook = Hook::new("x", " ", "true");
        assert!(hook.validate().is_err());
    }
}

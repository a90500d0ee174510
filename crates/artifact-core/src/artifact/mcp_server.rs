use super::{default_true, is_true, Artifact, ArtifactRecord};
use crate::error::{CrudError, Result};
use crate::handler::settings::{SectionShape, SettingsEntry};
use crate::paths;
use crate::types::ArtifactKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An MCP server, stored as `mcpServers.<name>` in `settings.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpServer {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub plugin_id: String,
    pub name: String,
    /// `stdio`, `http` or `sse`.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub transport: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub env: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub enabled: bool,
}

impl McpServer {
    pub fn stdio(name: impl Into<String>, command: impl Into<String>, args: Vec<String>) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            plugin_id: String::new(),
            name,
            transport: Some("stdio".to_string()),
            command: Some(command.into()),
            args,
            env: Map::new(),
            url: None,
            enabled: true,
        }
    }

    pub fn http(name: impl Into<String>, url: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            plugin_id: String::new(),
            name,
            transport: Some("http".to_string()),
            command: None,
            args: Vec::new(),
            env: Map::new(),
            url: Some(url.into()),
            enabled: true,
        }
    }
}

impl ArtifactRecord for McpServer {
    const KIND: ArtifactKind = ArtifactKind::McpServer;

    fn id(&self) -> &str {
        &self.id
    }

    fn derive_id(&mut self) {
        self.id = self.name.clone();
    }

    fn validate(&self) -> Result<()> {
        paths::validate_name(&self.name)?;
        if self.command.is_none() && self.url.is_none() {
            return Err(CrudError::Validation(format!(
                "mcp server '{}' needs a command or a url",
                self.name
            )));
        }
        Ok(())
    }

    fn into_artifact(self) -> Artifact {
        Artifact::McpServer(self)
    }

    fn from_artifact(artifact: Artifact) -> std::result::Result<Self, Artifact> {
        match artifact {
            Artifact::McpServer(m) => Ok(m),
            other => Err(other),
        }
    }
}

impl SettingsEntry for McpServer {
    const SECTION: &'static str = "mcpServers";
    const SHAPE: SectionShape = SectionShape::Map;

    fn encode(&self) -> Result<Value> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(map) = &mut value {
            map.remove("id");
            map.remove("name");
            if self.plugin_id.is_empty() {
                map.remove("pluginId");
            }
        }
        Ok(value)
    }

    fn decode(id: &str, raw: &Value) -> Result<Self> {
        let Value::Object(fields) = raw else {
            return Err(CrudError::Settings(format!(
                "mcp server '{id}' is not an object"
            )));
        };
        let mut fields = fields.clone();
        fields.insert("name".to_string(), Value::String(id.to_string()));
        let mut server: McpServer = serde_json::from_value(Value::Object(fields))
            .map_err(|e| CrudError::Settings(format!("mcp server '{id}': {e}")))?;
        server.derive_id();
        Ok(server)
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
    fn encode_is_keyed_by_name() {
        let server = McpServer::stdio("github", "npx", vec!["-y".into(), "gh-mcp".into()]);
        assert_eq!(
            server.encode().unwrap(),
            json!({"type": "stdio", "command": "npx", "args": ["-y", "gh-mcp"]})
        );
    }

    #[test]
    fn disabled_flag_is_written() {
        let mut server = McpServer::http("docs", "https://example.com/mcp");
        server.disable();
        assert_eq!(server.encode().unwrap()["enabled"], false);
    }

    #[test]
    fn decode_takes_name_from_key() {
        let raw = json!({"command": "uvx", "args": ["mcp-server-git"], "env": {"GIT_DIR": "."}});
        let server = McpServer::decode("git", &raw).unwrap();
        assert_eq!(server.id, "git");
        assert_eq!(server.name, "git");
        assert!(server.transport.is_none());
        assert_eq!(server.env["GIT_DIR"], ".");
        assert!(server.enabled);
    }

    #[test]
    fn validate_needs_endpoint() {
        let mut server = McpServer::http("x", "https://x");
        server.url = None;
        assert!(server.validate().is_err());
    }
}

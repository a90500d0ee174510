pub mod artifact;
pub mod batch;
pub mod types;

use anyhow::Context;
use artifact_core::{CrudEngine, CrudEngineConfig, OperationResult};
use serde_json::{Map, Value};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Everything a command needs to build an engine and print.
pub struct Ctx {
    pub root: PathBuf,
    pub config: CrudEngineConfig,
    pub json: bool,
}

impl Ctx {
    pub fn engine(&self) -> CrudEngine {
        CrudEngine::new(&self.root, self.config)
    }
}

/// Turn a failed result into an error carrying its code and hints.
pub fn check<T>(result: &OperationResult<T>) -> anyhow::Result<()> {
    let Some(err) = &result.error else {
        return Ok(());
    };
    let mut msg = format!("{}: {}", err.code, err.message);
    if let Some(Value::Array(available)) = err.context.get("available") {
        let names: Vec<&str> = available.iter().filter_map(Value::as_str).collect();
        if !names.is_empty() {
            msg.push_str(&format!(" (available: {})", names.join(", ")));
        }
    }
    if let Some(found) = err.context.get("foundType").and_then(Value::as_str) {
        msg.push_str(&format!(" (file holds a {found})"));
    }
    anyhow::bail!(msg)
}

/// Read a document from `path`, or stdin when `path` is `-`.
pub fn read_input(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Parse JSON or YAML text. JSON is tried first so error messages for JSON
/// input stay JSON-shaped.
pub fn parse_document(text: &str) -> anyhow::Result<Value> {
    if let Ok(v) = serde_json::from_str(text) {
        return Ok(v);
    }
    serde_yaml::from_str(text).context("input is neither valid JSON nor valid YAML")
}

pub fn parse_object(text: &str) -> anyhow::Result<Map<String, Value>> {
    match parse_document(text)? {
        Value::Object(map) => Ok(map),
        other => anyhow::bail!("expected an object, got {other}"),
    }
}

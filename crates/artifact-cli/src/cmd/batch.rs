//! Run a list of operations through a single engine so they share history.

use super::{parse_document, read_input, Ctx};
use crate::output::{print_json, print_table};
use anyhow::Context;
use artifact_core::history::HistoryEntry;
use artifact_core::{
    ArtifactKind, CreateOptions, CrudEngine, DeleteOptions, ReadOptions, UpdateOptions,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::path::Path;

/// One step of a batch file.
///
/// ```yaml
/// - type: create
///   artifactType: skill
///   artifact: { category: core, name: x, description: d }
/// - type: update
///   artifactType: skill
///   id: core/x
///   changes: { description: d2 }
///   options: { dryRun: true }
/// ```
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Step {
    Create {
        #[serde(rename = "artifactType")]
        kind: ArtifactKind,
        artifact: Map<String, Value>,
        #[serde(default)]
        options: CreateOptions,
    },
    Read {
        #[serde(rename = "artifactType")]
        kind: ArtifactKind,
        id: String,
        #[serde(default)]
        options: ReadOptions,
    },
    Update {
        #[serde(rename = "artifactType")]
        kind: ArtifactKind,
        id: String,
        #[serde(default)]
        changes: Map<String, Value>,
        #[serde(default)]
        options: UpdateOptions,
    },
    Delete {
        #[serde(rename = "artifactType")]
        kind: ArtifactKind,
        id: String,
        #[serde(default)]
        options: DeleteOptions,
    },
    #[serde(alias = "list")]
    Query {
        #[serde(rename = "artifactType")]
        kind: ArtifactKind,
    },
}

/// Execute one step and return its result as JSON.
fn execute(engine: &mut CrudEngine, step: Step) -> anyhow::Result<Value> {
    let value = match step {
        Step::Create {
            kind,
            artifact,
            options,
        } => serde_json::to_value(engine.create_from_fields(kind, artifact, options))?,
        Step::Read { kind, id, options } => serde_json::to_value(engine.read(kind, &id, options))?,
        Step::Update {
            kind,
            id,
            changes,
            options,
        } => serde_json::to_value(engine.update(kind, &id, &changes, options))?,
        Step::Delete { kind, id, options } => {
            serde_json::to_value(engine.delete(kind, &id, options))?
        }
        Step::Query { kind } => serde_json::to_value(engine.list(kind))?,
    };
    Ok(value)
}

pub fn run(ctx: &Ctx, file: &Path, history: usize) -> anyhow::Result<()> {
    let text = read_input(file)?;
    let steps: Vec<Step> = serde_json::from_value(parse_document(&text)?)
        .context("batch file must be a list of operations")?;
    let total = steps.len();

    let mut engine = ctx.engine();
    let mut results = Vec::with_capacity(total);
    for (i, step) in steps.into_iter().enumerate() {
        let value = execute(&mut engine, step).with_context(|| format!("step {}", i + 1))?;
        results.push(value);
    }
    let failed = results
        .iter()
        .filter(|r| r.get("success") != Some(&Value::Bool(true)))
        .count();
    let recent = engine.recent_operations(history);

    if ctx.json {
        print_json(&json!({ "results": results, "history": recent }))?;
    } else {
        let rows = results.iter().enumerate().map(|(i, r)| result_row(i, r)).collect();
        print_table(&["#", "OPERATION", "TYPE", "ID", "RESULT"], rows);
        if !recent.is_empty() {
            println!();
            println!("Recent operations (newest first):");
            print_table(
                &["LOG ID", "OPERATION", "TYPE", "ID", "OK", "STRUCTURAL", "CHANGED"],
                recent.iter().map(|e| history_row(e)).collect(),
            );
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {total} operations failed");
    }
    Ok(())
}

fn str_field(v: &Value, key: &str) -> String {
    v.get(key).and_then(Value::as_str).unwrap_or_default().to_string()
}

fn result_row(i: usize, r: &Value) -> Vec<String> {
    let outcome = match r.get("error") {
        Some(err) => format!("{}: {}", str_field(err, "code"), str_field(err, "message")),
        None if r.get("dryRun") == Some(&Value::Bool(true)) => "ok (dry run)".to_string(),
        None => "ok".to_string(),
    };
    vec![
        (i + 1).to_string(),
        str_field(r, "operation"),
        str_field(r, "artifactType"),
        str_field(r, "artifactId"),
        outcome,
    ]
}

fn history_row(e: &HistoryEntry) -> Vec<String> {
    let yes_no = |b: bool| if b { "yes" } else { "no" }.to_string();
    vec![
        e.log_id.clone(),
        e.operation.kind().to_string(),
        e.operation.artifact_type().to_string(),
        e.operation.target_id().unwrap_or("-").to_string(),
        yes_no(e.success),
        yes_no(e.diff.is_structural_change),
        e.diff.changed_fields.join(", "),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_parse_from_yaml() {
        let doc = parse_document(
            "- type: create\n  artifactType: rule\n  artifact: {name: style, content: Tidy}\n\
             - type: list\n  artifactType: rule\n\
             - type: delete\n  artifactType: rule\n  id: style\n  options: {soft: true}\n",
        )
        .unwrap();
        let steps: Vec<Step> = serde_json::from_value(doc).unwrap();
        assert_eq!(steps.len(), 3);
        assert!(matches!(steps[1], Step::Query { kind: ArtifactKind::Rule }));
        let Step::Delete { options, .. } = &steps[2] else {
            panic!("expected delete");
        };
        assert!(options.soft);
    }

    #[test]
    fn invalid_create_fails_its_step_only() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut engine = CrudEngine::new(dir.path(), artifact_core::DEV_CONFIG);
        let doc = parse_document(
            "- type: create\n  artifactType: rule\n  artifact: {content: missing name}\n\
             - type: create\n  artifactType: rule\n  artifact: {name: style, content: Tidy}\n",
        )
        .unwrap();
        let steps: Vec<Step> = serde_json::from_value(doc).unwrap();
        let results: Vec<Value> = steps
            .into_iter()
            .map(|step| execute(&mut engine, step).unwrap())
            .collect();
        assert_eq!(results[0]["success"], false);
        assert_eq!(results[0]["error"]["code"], "VALIDATION_FAILED");
        assert_eq!(results[1]["success"], true);
        assert_eq!(engine.history().size(), 2);
        assert!(engine.exists(ArtifactKind::Rule, "style"));
    }

    #[test]
    fn unknown_artifact_type_is_rejected() {
        let doc = parse_document(r#"[{"type": "read", "artifactType": "widget", "id": "x"}]"#).unwrap();
        assert!(serde_json::from_value::<Vec<Step>>(doc).is_err());
    }
}

#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

fn cli(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("claude-artifacts").unwrap();
    cmd.current_dir(dir.path())
        .env("CLAUDE_ARTIFACTS_ROOT", dir.path())
        .env_remove("CLAUDE_ARTIFACTS_PROFILE")
        .env_remove("RUST_LOG");
    cmd
}

fn write(dir: &TempDir, name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, text).unwrap();
    path
}

fn json_out(cmd: &mut Command) -> Value {
    let out = cmd.arg("--json").output().unwrap();
    serde_json::from_slice(&out.stdout).unwrap()
}

// ---------------------------------------------------------------------------
// types / list
// ---------------------------------------------------------------------------

#[test]
fn types_lists_every_kind() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .arg("types")
        .assert()
        .success()
        .stdout(predicate::str::contains("skill"))
        .stdout(predicate::str::contains("mcp-server"))
        .stdout(predicate::str::contains("aggregated"));
}

#[test]
fn list_on_empty_project() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .args(["list", "agent"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No agent artifacts."));
}

#[test]
fn unknown_type_is_rejected() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .args(["list", "widget"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown artifact type"));
}

// ---------------------------------------------------------------------------
// create / show / update / delete
// ---------------------------------------------------------------------------

#[test]
fn skill_lifecycle() {
    let dir = TempDir::new().unwrap();
    let doc = write(
        &dir,
        "skill.yaml",
        "category: core\nname: x\ndescription: d\ntools: [Read]\ncontent: Do the thing.\n",
    );

    cli(&dir)
        .args(["create", "skill", "--file"])
        .arg(&doc)
        .assert()
        .success()
        .stdout(predicate::str::contains("created skill 'core/x'"));
    assert!(dir.path().join(".claude/skills/core/x/SKILL.md").exists());

    cli(&dir)
        .args(["show", "skill", "core/x"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Do the thing."));

    cli(&dir)
        .args(["update", "skill", "core/x", "--set", r#"{"description": "d2", "tools": ["Write"]}"#])
        .assert()
        .success()
        .stdout(predicate::str::contains("description, tools"));

    let shown = json_out(cli(&dir).args(["show", "skill", "core/x"]));
    assert_eq!(shown["data"]["description"], "d2");
    assert_eq!(shown["data"]["tools"], serde_json::json!(["Read", "Write"]));

    cli(&dir).args(["delete", "skill", "core/x"]).assert().success();
    assert!(!dir.path().join(".claude/skills/core").exists());
}

#[test]
fn create_collision_fails_without_overwrite() {
    let dir = TempDir::new().unwrap();
    let doc = write(&dir, "rule.json", r#"{"name": "style", "content": "Tidy"}"#);
    cli(&dir).args(["create", "rule", "-f"]).arg(&doc).assert().success();
    cli(&dir)
        .args(["create", "rule", "-f"])
        .arg(&doc)
        .assert()
        .failure()
        .stderr(predicate::str::contains("ALREADY_EXISTS"));
    cli(&dir)
        .args(["create", "rule", "--overwrite", "-f"])
        .arg(&doc)
        .assert()
        .success();
}

#[test]
fn create_reads_stdin() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .args(["create", "command", "-f", "-"])
        .write_stdin("name: deploy\ndescription: Ship it\nargumentHint: '<env>'\n")
        .assert()
        .success();
    assert!(dir.path().join(".claude/commands/deploy.md").exists());
}

#[test]
fn dry_run_create_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let doc = write(&dir, "agent.yaml", "name: reviewer\ndescription: Reviews\n");
    cli(&dir)
        .args(["create", "agent", "--dry-run", "-f"])
        .arg(&doc)
        .assert()
        .success()
        .stdout(predicate::str::contains("would create"));
    assert!(!dir.path().join(".claude/agents/reviewer.md").exists());
}

#[test]
fn show_missing_suggests_alternatives() {
    let dir = TempDir::new().unwrap();
    let doc = write(&dir, "agent.yaml", "name: reviewer\ndescription: Reviews\n");
    cli(&dir).args(["create", "agent", "-f"]).arg(&doc).assert().success();
    cli(&dir)
        .args(["show", "agent", "reveiwer"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("NOT_FOUND"))
        .stderr(predicate::str::contains("available: reviewer"));
}

#[test]
fn failed_result_still_prints_json() {
    let dir = TempDir::new().unwrap();
    let out = cli(&dir)
        .args(["--json", "show", "rule", "nope"])
        .output()
        .unwrap();
    assert!(!out.status.success());
    let v: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["success"], false);
    assert_eq!(v["error"]["code"], "NOT_FOUND");
    assert!(v["logId"].as_str().unwrap().starts_with("op-"));
}

#[test]
fn hook_soft_delete_keeps_entry_disabled() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join(".claude")).unwrap();
    std::fs::write(
        dir.path().join(".claude/settings.json"),
        r#"{"model": "opus"}"#,
    )
    .unwrap();
    let doc = write(&dir, "hook.json", r#"{"name": "fmt", "event": "PostToolUse", "command": "cargo fmt"}"#);
    cli(&dir).args(["create", "hook", "-f"]).arg(&doc).assert().success();
    cli(&dir).args(["delete", "hook", "fmt", "--soft"]).assert().success();
    cli(&dir)
        .args(["list", "hook"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[disabled]"));

    let settings: Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join(".claude/settings.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(settings["model"], "opus");
    assert_eq!(settings["hooks"][0]["enabled"], false);
}

#[test]
fn soft_delete_rule_leaves_backup() {
    let dir = TempDir::new().unwrap();
    let doc = write(&dir, "rule.json", r#"{"name": "style", "content": "Tidy"}"#);
    cli(&dir).args(["create", "rule", "-f"]).arg(&doc).assert().success();
    cli(&dir).args(["delete", "rule", "style", "--soft"]).assert().success();
    assert!(dir.path().join(".claude/rules/style.md.deleted").exists());
    cli(&dir).args(["show", "rule", "style"]).assert().failure();
}

// ---------------------------------------------------------------------------
// batch / config
// ---------------------------------------------------------------------------

#[test]
fn batch_prints_history_newest_first() {
    let dir = TempDir::new().unwrap();
    let batch = write(
        &dir,
        "batch.yaml",
        "- type: create\n  artifactType: skill\n  artifact: {category: core, name: x, description: d}\n\
         - type: update\n  artifactType: skill\n  id: core/x\n  changes: {description: d2}\n",
    );
    let v = json_out(cli(&dir).args(["batch", "--history", "2", "-f"]).arg(&batch));
    assert_eq!(v["results"].as_array().unwrap().len(), 2);
    assert_eq!(v["results"][1]["data"]["description"], "d2");
    let history = v["history"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["operation"]["type"], "update");
    assert_eq!(history[1]["operation"]["type"], "create");
    assert_eq!(history[1]["diff"]["isStructuralChange"], true);
}

#[test]
fn batch_with_failure_exits_nonzero() {
    let dir = TempDir::new().unwrap();
    let batch = write(
        &dir,
        "batch.json",
        r#"[{"type": "read", "artifactType": "skill", "id": "missing/x"},
            {"type": "list", "artifactType": "rule"}]"#,
    );
    cli(&dir)
        .args(["batch", "-f"])
        .arg(&batch)
        .assert()
        .failure()
        .stdout(predicate::str::contains("NOT_FOUND"))
        .stderr(predicate::str::contains("1 of 2 operations failed"));
}

#[test]
fn batch_continues_past_invalid_create() {
    let dir = TempDir::new().unwrap();
    let batch = write(
        &dir,
        "batch.json",
        r#"[{"type": "create", "artifactType": "skill", "artifact": {"name": "x"}},
            {"type": "create", "artifactType": "rule", "artifact": {"name": "style", "content": "Tidy"}}]"#,
    );
    let out = cli(&dir)
        .args(["--json", "batch", "-f"])
        .arg(&batch)
        .assert()
        .failure()
        .stderr(predicate::str::contains("1 of 2 operations failed"))
        .get_output()
        .stdout
        .clone();
    let v: Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(v["results"][0]["error"]["code"], "VALIDATION_FAILED");
    assert_eq!(v["results"][1]["success"], true);
    assert_eq!(v["history"].as_array().unwrap().len(), 2);
    assert!(dir.path().join(".claude/rules/style.md").exists());
}

#[test]
fn invalid_engine_config_is_reported() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join(".claude")).unwrap();
    std::fs::write(
        dir.path().join(".claude/artifact-engine.yaml"),
        "versioning:\n  historySize: 0\n",
    )
    .unwrap();
    cli(&dir)
        .arg("types")
        .assert()
        .failure()
        .stderr(predicate::str::contains("historySize"));
    cli(&dir).args(["--profile", "prod", "types"]).assert().success();
}

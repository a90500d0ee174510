use super::{check, parse_object, read_input, Ctx};
use crate::output::{cell, emit, print_artifact, print_table, summary};
use anyhow::Context;
use artifact_core::{
    Artifact, ArtifactKind, CreateOptions, DeleteOptions, ReadOptions, UpdateOptions,
};
use std::path::Path;

pub fn list(ctx: &Ctx, kind: ArtifactKind) -> anyhow::Result<()> {
    let mut engine = ctx.engine();
    let result = engine.list(kind);
    emit(&result, ctx.json, |r| {
        let items = r.data.as_deref().unwrap_or_default();
        if items.is_empty() {
            println!("No {kind} artifacts.");
            return Ok(());
        }
        let mut rows = Vec::with_capacity(items.len());
        for a in items {
            rows.push(row(a)?);
        }
        print_table(&["ID", "PLUGIN", "DESCRIPTION"], rows);
        Ok(())
    })?;
    check(&result)
}

fn row(artifact: &Artifact) -> anyhow::Result<Vec<String>> {
    let fields = artifact.to_fields()?;
    let text = |key: &str| fields.get(key).map(cell).unwrap_or_default();
    let detail = match artifact {
        Artifact::Hook(h) => {
            let state = if h.enabled { "" } else { " [disabled]" };
            format!("{} → {}{state}", h.event, summary(&h.command, 48))
        }
        Artifact::McpServer(s) => {
            let target = s.url.clone().unwrap_or_else(|| s.command.clone().unwrap_or_default());
            let state = if s.enabled { "" } else { " [disabled]" };
            format!("{target}{state}")
        }
        Artifact::Rule(r) if r.description.is_empty() => summary(&r.content, 60),
        _ => summary(&text("description"), 60),
    };
    Ok(vec![artifact.id().to_string(), text("pluginId"), detail])
}

pub fn show(ctx: &Ctx, kind: ArtifactKind, id: &str, no_content: bool) -> anyhow::Result<()> {
    let mut engine = ctx.engine();
    let result = engine.read(
        kind,
        id,
        ReadOptions {
            include_content: !no_content,
        },
    );
    // The snapshots duplicate `data` for a read.
    let result = result.without_snapshots();
    emit(&result, ctx.json, |r| match &r.data {
        Some(a) => print_artifact(a),
        None => Ok(()),
    })?;
    check(&result)
}

pub fn create(
    ctx: &Ctx,
    kind: ArtifactKind,
    file: &Path,
    overwrite: bool,
    dry_run: bool,
) -> anyhow::Result<()> {
    let text = read_input(file)?;
    let fields = parse_object(&text)?;
    let mut engine = ctx.engine();
    let result = engine.create_from_fields(kind, fields, CreateOptions { overwrite, dry_run });
    emit(&result, ctx.json, |r| {
        let id = r.artifact_id.as_deref().unwrap_or_default();
        let verb = if dry_run { "would create" } else { "created" };
        match &r.path {
            Some(p) => println!("{verb} {kind} '{id}' at {}", p.display()),
            None => println!("{verb} {kind} '{id}'"),
        }
        Ok(())
    })?;
    check(&result)
}

pub fn update(
    ctx: &Ctx,
    kind: ArtifactKind,
    id: &str,
    set: &str,
    replace: bool,
    dry_run: bool,
) -> anyhow::Result<()> {
    let changes = parse_object(set).context("--set must be a JSON object")?;
    let mut engine = ctx.engine();
    let result = engine.update(
        kind,
        id,
        &changes,
        UpdateOptions {
            merge: !replace,
            dry_run,
        },
    );
    let changed = engine
        .recent_operations(1)
        .first()
        .map(|e| e.diff.changed_fields.clone());
    emit(&result, ctx.json, |r| {
        let verb = if dry_run { "would update" } else { "updated" };
        let new_id = r.data.as_ref().map(Artifact::id).unwrap_or(id);
        match changed.as_deref() {
            None => println!("{verb} {kind} '{new_id}'"),
            Some([]) => println!("{verb} {kind} '{new_id}' (no changes)"),
            Some(fields) => println!("{verb} {kind} '{new_id}': {}", fields.join(", ")),
        }
        Ok(())
    })?;
    check(&result)
}

pub fn delete(
    ctx: &Ctx,
    kind: ArtifactKind,
    id: &str,
    soft: bool,
    dry_run: bool,
) -> anyhow::Result<()> {
    let mut engine = ctx.engine();
    let result = engine.delete(kind, id, DeleteOptions { soft, dry_run });
    emit(&result, ctx.json, |_| {
        let verb = match (dry_run, soft) {
            (true, _) => "would delete",
            (false, true) => "soft-deleted",
            (false, false) => "deleted",
        };
        println!("{verb} {kind} '{id}'");
        Ok(())
    })?;
    check(&result)
}

use artifact_core::{Artifact, OperationResult};
use serde::Serialize;
use serde_json::Value;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let line = |cells: Vec<String>| {
        let padded: Vec<String> = cells
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let w = widths.get(i).copied().unwrap_or(0);
                format!("{cell:w$}")
            })
            .collect();
        println!("{}", padded.join("  ").trim_end());
    };

    line(headers.iter().map(|h| h.to_string()).collect());
    line(widths.iter().map(|&w| "-".repeat(w)).collect());
    for row in rows {
        line(row);
    }
}

/// First line of `text`, cut to `max` characters.
pub fn summary(text: &str, max: usize) -> String {
    let first = text.lines().next().unwrap_or("").trim();
    if first.chars().count() <= max && !text.trim().contains('\n') {
        return first.to_string();
    }
    let cut: String = first.chars().take(max.saturating_sub(1)).collect();
    format!("{cut}…")
}

/// Render a field value for a table cell.
pub fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => summary(s, 72),
        Value::Array(items) if items.iter().all(Value::is_string) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

/// One artifact as a FIELD / VALUE table.
pub fn print_artifact(artifact: &Artifact) -> anyhow::Result<()> {
    let rows = artifact
        .to_fields()?
        .iter()
        .map(|(k, v)| vec![k.clone(), cell(v)])
        .collect();
    print_table(&["FIELD", "VALUE"], rows);
    Ok(())
}

/// Print the whole result as JSON, or `human` when not in JSON mode.
pub fn emit<T: Serialize>(
    result: &OperationResult<T>,
    json: bool,
    human: impl FnOnce(&OperationResult<T>) -> anyhow::Result<()>,
) -> anyhow::Result<()> {
    if json {
        print_json(result)
    } else if result.success {
        human(result)
    } else {
        Ok(())
    }
}

use super::Ctx;
use crate::output::{print_json, print_table};
use artifact_core::paths;
use artifact_core::ArtifactKind;
use serde_json::json;

fn location(kind: ArtifactKind) -> String {
    match kind {
        ArtifactKind::Skill => format!("{}/<category>/<name>/{}", paths::SKILLS_DIR, paths::SKILL_FILE),
        ArtifactKind::Agent | ArtifactKind::SubAgent => format!("{}/<name>.md", paths::AGENTS_DIR),
        ArtifactKind::Rule => format!("{}/<name>.md", paths::RULES_DIR),
        ArtifactKind::Command => format!("{}/<name>.md", paths::COMMANDS_DIR),
        ArtifactKind::Hook => format!("{} hooks[]", paths::SETTINGS_FILE),
        ArtifactKind::McpServer => format!("{} mcpServers{{}}", paths::SETTINGS_FILE),
    }
}

pub fn run(ctx: &Ctx) -> anyhow::Result<()> {
    if ctx.json {
        let types: Vec<_> = ArtifactKind::all()
            .iter()
            .map(|&k| {
                json!({
                    "type": k.as_str(),
                    "storage": k.storage().to_string(),
                    "location": location(k),
                })
            })
            .collect();
        return print_json(&types);
    }
    let rows = ArtifactKind::all()
        .iter()
        .map(|&k| vec![k.to_string(), k.storage().to_string(), location(k)])
        .collect();
    print_table(&["TYPE", "STORAGE", "LOCATION"], rows);
    Ok(())
}

mod cmd;
mod output;
mod root;

use artifact_core::{ArtifactKind, CrudEngineConfig, Profile};
use clap::{Parser, Subcommand};
use cmd::Ctx;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "claude-artifacts",
    about = "Create, read, update and delete Claude Code project artifacts",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .claude/ or .git/)
    #[arg(long, global = true, env = "CLAUDE_ARTIFACTS_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Engine preset; overrides .claude/artifact-engine.yaml
    #[arg(long, global = true, env = "CLAUDE_ARTIFACTS_PROFILE")]
    profile: Option<Profile>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every artifact of a type
    List {
        #[arg(value_name = "TYPE")]
        kind: ArtifactKind,
    },

    /// Show one artifact
    Show {
        #[arg(value_name = "TYPE")]
        kind: ArtifactKind,
        id: String,
        /// Omit body content (skill sections, agent prompts, ...)
        #[arg(long)]
        no_content: bool,
    },

    /// Create an artifact from a JSON or YAML document
    Create {
        #[arg(value_name = "TYPE")]
        kind: ArtifactKind,
        /// Document to read; `-` reads stdin
        #[arg(long, short = 'f')]
        file: PathBuf,
        /// Replace an existing artifact with the same id
        #[arg(long)]
        overwrite: bool,
        #[arg(long)]
        dry_run: bool,
    },

    /// Apply changes to an artifact
    Update {
        #[arg(value_name = "TYPE")]
        kind: ArtifactKind,
        id: String,
        /// JSON object of fields to change
        #[arg(long)]
        set: String,
        /// Replace all non-identity fields instead of merging
        #[arg(long)]
        replace: bool,
        #[arg(long)]
        dry_run: bool,
    },

    /// Delete an artifact
    Delete {
        #[arg(value_name = "TYPE")]
        kind: ArtifactKind,
        id: String,
        /// Keep a recoverable copy (or disable, for settings entries)
        #[arg(long)]
        soft: bool,
        #[arg(long)]
        dry_run: bool,
    },

    /// Run a file of operations and print the resulting history
    Batch {
        /// JSON or YAML list of operations; `-` reads stdin
        #[arg(long, short = 'f')]
        file: PathBuf,
        /// Number of history entries to print
        #[arg(long, default_value = "10")]
        history: usize,
    },

    /// List supported artifact types and where they are stored
    Types,
}

fn load_config(root: &std::path::Path, profile: Option<Profile>) -> anyhow::Result<CrudEngineConfig> {
    use anyhow::Context;
    match profile {
        Some(p) => Ok(CrudEngineConfig::for_profile(p)),
        None => CrudEngineConfig::load(root).context("failed to load .claude/artifact-engine.yaml"),
    }
}

fn main() {
    let cli = Cli::parse();

    let root = root::resolve_root(cli.root.as_deref());
    let config = match load_config(&root, cli.profile) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
    };

    let default_level = if config.logging.log_to_console {
        config.logging.level.to_tracing()
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let ctx = Ctx {
        root,
        config,
        json: cli.json,
    };

    let result = match cli.command {
        Commands::List { kind } => cmd::artifact::list(&ctx, kind),
        Commands::Show {
            kind,
            id,
            no_content,
        } => cmd::artifact::show(&ctx, kind, &id, no_content),
        Commands::Create {
            kind,
            file,
            overwrite,
            dry_run,
        } => cmd::artifact::create(&ctx, kind, &file, overwrite, dry_run),
        Commands::Update {
            kind,
            id,
            set,
            replace,
            dry_run,
        } => cmd::artifact::update(&ctx, kind, &id, &set, replace, dry_run),
        Commands::Delete {
            kind,
            id,
            soft,
            dry_run,
        } => cmd::artifact::delete(&ctx, kind, &id, soft, dry_run),
        Commands::Batch { file, history } => cmd::batch::run(&ctx, &file, history),
        Commands::Types => cmd::types::run(&ctx),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

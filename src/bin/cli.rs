//! locus command-line interface.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use locus::{
    graph_path, node_context, overview, scan, store_stats, CancelToken, ClangProvider, GraphStore,
    ProjectConfig, ProjectId,
};

#[derive(Parser)]
#[command(name = "locus", about = "C++ codebase indexer", version)]
struct Cli {
    /// Project root (directory containing locus.toml).
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan all build targets and persist the graph.
    Scan,
    /// Print the full entity/edge graph as JSON.
    Overview,
    /// Print everything known about entities with the given name.
    Context { name: String },
    /// Print store counts.
    Stats,
    /// Attach a description to every entity with the given name.
    Annotate {
        name: String,
        text: String,
        /// Store as a user-authored description instead of a generated one.
        #[arg(long)]
        user: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let root = cli
        .root
        .canonicalize()
        .with_context(|| format!("project root {} not found", cli.root.display()))?;

    match cli.command {
        Command::Scan => {
            let config = ProjectConfig::load(&root)?;
            let provider = ClangProvider::new()?;
            let path = graph_path(&root);
            let mut store = if path.exists() {
                GraphStore::load(&path)?
            } else {
                GraphStore::new()
            };
            // Re-scans keep the project identity of the existing graph.
            let project = store
                .projects()
                .first()
                .copied()
                .unwrap_or_else(ProjectId::new);
            scan(
                &mut store,
                &provider,
                project,
                &root,
                &config.targets,
                CancelToken::new(),
            )?;
            store.compact();
            store.save(&path)?;
            let stats = store.stats();
            info!(
                entities = stats.entity_count,
                edges = stats.edge_count,
                "scan finished"
            );
        }
        Command::Overview => {
            let store = load_store(&root)?;
            let Some(project) = store.projects().first().copied() else {
                bail!("graph is empty; run `locus scan` first");
            };
            println!("{}", serde_json::to_string_pretty(&overview(&store, project))?);
        }
        Command::Context { name } => {
            let store = load_store(&root)?;
            let contexts = node_context(&store, &name);
            if contexts.is_empty() {
                bail!("no entity named {name:?}");
            }
            println!("{}", serde_json::to_string_pretty(&contexts)?);
        }
        Command::Stats => {
            let store = load_store(&root)?;
            println!("{}", serde_json::to_string_pretty(&store_stats(&store))?);
        }
        Command::Annotate { name, text, user } => {
            let mut store = load_store(&root)?;
            let touched = if user {
                store.set_user_description(&name, &text)
            } else {
                store.set_generated_description(&name, &text)
            };
            if touched == 0 {
                bail!("no entity named {name:?}");
            }
            store.save(&graph_path(&root))?;
            info!(entities = touched, "description attached");
        }
    }
    Ok(())
}

fn load_store(root: &std::path::Path) -> Result<GraphStore> {
    let path = graph_path(root);
    if !path.exists() {
        bail!("no graph at {}; run `locus scan` first", path.display());
    }
    Ok(GraphStore::load(&path)?)
}

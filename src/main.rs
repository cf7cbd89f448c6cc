//! Binary entry point for famgraph.
//!
//! This binary provides the CLI interface for editing, querying, laying out
//! and exporting family trees stored on the local filesystem.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

mod commands;

use clap::{Parser, Subcommand};
use commands::{EventAction, MediaAction, PersonAction, TreeAction};
use famgraph::config::FamgraphConfig;
use famgraph::observability::{self, LoggingConfig};
use std::path::PathBuf;
use std::process::ExitCode;

/// Famgraph - a family-graph engine for genealogy data.
#[derive(Parser)]
#[command(name = "famgraph")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Tree to operate on (defaults to the only tree, if there is one).
    #[arg(short, long, global = true, env = "FAMGRAPH_TREE")]
    tree: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Create or list trees.
    Tree {
        #[command(subcommand)]
        action: TreeAction,
    },

    /// Add, update, remove or show people.
    Person {
        #[command(subcommand)]
        action: PersonAction,
    },

    /// Relate two people.
    Relate {
        /// First person (the parent for parent-child).
        person_a: String,

        /// Second person (the child for parent-child).
        person_b: String,

        /// Relationship type: parent-child or spouse.
        #[arg(short = 'k', long = "type", default_value = "parent-child")]
        relationship_type: String,
    },

    /// Remove a relationship.
    Unrelate {
        /// Relationship ID.
        id: String,
    },

    /// Record life events.
    Event {
        #[command(subcommand)]
        action: EventAction,
    },

    /// Attach or remove media.
    Media {
        #[command(subcommand)]
        action: MediaAction,
    },

    /// Compute the generational layout.
    Layout {
        /// Output format: table or json.
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Export the tree.
    Export {
        /// Export format: document, genealogy-text, or table.
        #[arg(short, long)]
        format: Option<String>,

        /// Output file (prints to stdout when omitted).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import a structured document as a new tree.
    Import {
        /// Path to the document.
        document: PathBuf,

        /// Name of the new tree (defaults to the document's tree name).
        #[arg(short, long)]
        name: Option<String>,

        /// Owner of the new tree.
        #[arg(long, env = "FAMGRAPH_OWNER", default_value = "local")]
        owner: String,

        /// Assign new ids to every imported record.
        #[arg(long)]
        fresh_ids: bool,
    },

    /// Show tree statistics.
    Stats,

    /// Show the effective configuration.
    Config,
}

/// Main entry point.
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    let logging = LoggingConfig::from_settings(&config.logging, cli.verbose);
    if let Err(e) = observability::init(&logging) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        },
    }
}

/// Loads configuration from an explicit path or the default locations.
fn load_config(path: Option<&std::path::Path>) -> famgraph::Result<FamgraphConfig> {
    let config = match path {
        Some(path) => FamgraphConfig::load_from_file(path)?,
        None => FamgraphConfig::load_default(),
    };
    Ok(config.with_env_overrides())
}

/// Runs the selected command.
async fn run_command(cli: Cli, config: FamgraphConfig) -> anyhow::Result<()> {
    let tree = cli.tree.as_deref();

    match cli.command {
        Commands::Tree { action } => commands::cmd_tree(&config, action).await,

        Commands::Person { action } => commands::cmd_person(&config, tree, action).await,

        Commands::Relate {
            person_a,
            person_b,
            relationship_type,
        } => commands::cmd_relate(&config, tree, &person_a, &person_b, &relationship_type).await,

        Commands::Unrelate { id } => commands::cmd_unrelate(&config, tree, &id).await,

        Commands::Event { action } => commands::cmd_event(&config, tree, action).await,

        Commands::Media { action } => commands::cmd_media(&config, tree, action).await,

        Commands::Layout { format } => commands::cmd_layout(&config, tree, &format).await,

        Commands::Export { format, output } => {
            commands::cmd_export(&config, tree, format.as_deref(), output.as_deref()).await
        },

        Commands::Import {
            document,
            name,
            owner,
            fresh_ids,
        } => commands::cmd_import(&config, &document, name, &owner, fresh_ids).await,

        Commands::Stats => commands::cmd_stats(&config, tree).await,

        Commands::Config => commands::cmd_config(&config),
    }
}

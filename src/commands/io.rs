//! Export and import command handlers.

use super::open_session;
use anyhow::Context;
use famgraph::config::FamgraphConfig;
use famgraph::io::{ExportFormat, ExportService, ImportService};
use famgraph::models::Tree;
use famgraph::storage::{FilesystemPersistence, GraphStore, PersistenceClient};
use std::path::Path;

/// Executes the export command.
///
/// Without `--format` the format follows the output extension, or the
/// structured document when printing to stdout.
pub async fn cmd_export(
    config: &FamgraphConfig,
    tree: Option<&str>,
    format: Option<&str>,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let format = match (format, output) {
        (Some(f), _) => f.parse::<ExportFormat>()?,
        (None, Some(path)) => ExportFormat::from_path(path)?,
        (None, None) => ExportFormat::Document,
    };

    let session = open_session(config, tree).await?;

    match output {
        Some(path) => {
            let result =
                ExportService::new().export_to_path(&session.snapshot()?, path, Some(format))?;
            eprintln!(
                "Exported {} people, {} relationships to {} ({format}, {} bytes)",
                result.people,
                result.relationships,
                path.display(),
                result.bytes
            );
        },
        None => print!("{}", session.export(format)?),
    }

    Ok(())
}

/// Executes the import command.
pub async fn cmd_import(
    config: &FamgraphConfig,
    document: &Path,
    name: Option<String>,
    owner: &str,
    fresh_ids: bool,
) -> anyhow::Result<()> {
    let service = ImportService::new().with_fresh_ids(fresh_ids);
    let snapshot = service
        .import_from_path(document)
        .with_context(|| format!("failed to import {}", document.display()))?;

    let name = name
        .or_else(|| snapshot.tree.as_ref().map(|t| t.name.clone()))
        .or_else(|| document.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "Imported tree".to_string());
    let tree = Tree::new(name, owner);
    let data = service.into_tree_data(snapshot, tree.clone());

    // Must load back through the session
    GraphStore::from_tree_data(data.clone()).context("imported document is not a loadable tree")?;

    let client = FilesystemPersistence::new(&config.data_dir);
    client.create_tree(&tree).await?;
    client.save_tree(&data).await?;

    println!(
        "Imported tree '{}' ({}): {} people, {} relationships, {} events, {} media",
        tree.name,
        tree.id,
        data.people.len(),
        data.relationships.len(),
        data.events.len(),
        data.media.len()
    );
    Ok(())
}

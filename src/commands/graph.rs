//! Layout and statistics command handlers.

use super::{open_session, truncate};
use famgraph::LayoutEngine;
use famgraph::config::FamgraphConfig;

/// Executes the layout command.
pub async fn cmd_layout(
    config: &FamgraphConfig,
    tree: Option<&str>,
    format: &str,
) -> anyhow::Result<()> {
    let session = open_session(config, tree).await?;
    let layout = session.layout(&LayoutEngine::new(config.layout))?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&layout)?);
        return Ok(());
    }

    if layout.is_empty() {
        println!("No people in this tree.");
        return Ok(());
    }

    let snapshot = session.snapshot()?;
    let mut rows: Vec<_> = layout.nodes().iter().collect();
    rows.sort_by(|a, b| {
        a.position
            .generation
            .cmp(&b.position.generation)
            .then_with(|| a.position.x.total_cmp(&b.position.x))
    });

    println!("{:<6} {:>10} {:>10}  {:<30}", "Gen", "X", "Y", "Name");
    println!("{}", "-".repeat(60));
    for node in rows {
        let name = snapshot
            .person(&node.person_id)
            .map_or_else(|| node.person_id.to_string(), |p| p.display_name());
        println!(
            "{:<6} {:>10.1} {:>10.1}  {:<30}",
            node.position.generation,
            node.position.x,
            node.position.y,
            truncate(&name, 30)
        );
    }

    if let Some(bounds) = layout.bounds() {
        println!();
        println!(
            "Bounds: {:.1} x {:.1} ({} generations)",
            bounds.width(),
            bounds.height(),
            layout.generations().len()
        );
    }

    Ok(())
}

/// Executes the stats command.
pub async fn cmd_stats(config: &FamgraphConfig, tree: Option<&str>) -> anyhow::Result<()> {
    let session = open_session(config, tree).await?;
    let stats = session.stats()?;
    let name = session
        .snapshot()?
        .tree
        .map_or_else(|| "(unnamed)".to_string(), |t| t.name);

    println!("Family Tree Statistics: {name}");
    println!("========================{}", "=".repeat(name.len()));
    println!();
    println!("People:         {:>8}", stats.person_count);
    println!("  Living:       {:>8}", stats.living_count);
    println!("Relationships:  {:>8}", stats.relationship_count);
    println!("  Parent-child: {:>8}", stats.parent_child_count);
    println!("  Spouse:       {:>8}", stats.spouse_count);
    println!("Events:         {:>8}", stats.event_count);
    println!("Media:          {:>8}", stats.media_count);

    Ok(())
}

//! Tree command handlers.

use super::{TreeAction, truncate};
use famgraph::GraphSession;
use famgraph::config::FamgraphConfig;
use famgraph::storage::FilesystemPersistence;

/// Executes a tree command.
pub async fn cmd_tree(config: &FamgraphConfig, action: TreeAction) -> anyhow::Result<()> {
    let session = GraphSession::new(FilesystemPersistence::new(&config.data_dir));

    match action {
        TreeAction::Create { name, owner } => {
            let tree = session.create_tree(&name, &owner).await?;
            println!("Created tree '{}' ({})", tree.name, tree.id);
        },
        TreeAction::List => {
            let trees = session.list_trees().await?;
            if trees.is_empty() {
                println!("No trees found.");
                return Ok(());
            }

            println!("{:<40} {:<30} {:<15}", "ID", "Name", "Owner");
            println!("{}", "-".repeat(87));
            for tree in &trees {
                println!(
                    "{:<40} {:<30} {:<15}",
                    tree.id,
                    truncate(&tree.name, 30),
                    truncate(&tree.owner_id, 15)
                );
            }
            println!();
            println!("Total: {} trees", trees.len());
        },
    }

    Ok(())
}

//! Config command handler.

use famgraph::config::FamgraphConfig;

/// Config command.
pub fn cmd_config(config: &FamgraphConfig) -> anyhow::Result<()> {
    println!("Current Configuration");
    println!("=====================");
    println!();

    println!("Config Files Searched:");
    for path in FamgraphConfig::default_paths() {
        let marker = if path.exists() { "found" } else { "missing" };
        println!("  - {} ({marker})", path.display());
    }
    println!();

    println!("{}", config.to_toml()?);
    Ok(())
}

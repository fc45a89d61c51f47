//! Initialize .mealgate.toml configuration

use anyhow::Result;
use mealgate_core::config::CONFIG_FILENAME;
use mealgate_core::MealgateConfig;
use std::path::Path;

pub fn run(path: Option<&Path>) -> Result<()> {
    let target_path = path.unwrap_or_else(|| Path::new("."));
    let config_path = target_path.join(CONFIG_FILENAME);

    if config_path.exists() {
        println!("⚠️  {CONFIG_FILENAME} already exists at {:?}", config_path);
        return Ok(());
    }

    let config = MealgateConfig::default();
    config.save(&config_path)?;

    println!("✅ Created {CONFIG_FILENAME} at {:?}", config_path);
    println!("\nSign in and check your access with:");
    println!("  mealgate login --uid <id>");
    println!("  mealgate status");

    Ok(())
}

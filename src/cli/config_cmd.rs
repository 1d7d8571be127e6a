//! Config Command
//!
//! Manage TripWeaver configuration.
//!
//! Usage:
//!   tripweaver config show [-f json]
//!   tripweaver config path
//!   tripweaver config init [--force]

use crate::config::ConfigLoader;
use crate::types::Result;

/// Show current effective configuration (merged from all sources)
pub fn show(format: &str) -> Result<()> {
    ConfigLoader::show_config(format == "json")
}

/// Show configuration paths
pub fn path() -> Result<()> {
    ConfigLoader::show_path();
    Ok(())
}

/// Initialize the global configuration file
pub fn init(force: bool) -> Result<()> {
    let config_path = ConfigLoader::init_global(force)?;
    println!("✓ Initialized global configuration");
    println!("  Config: {}", config_path.display());
    Ok(())
}

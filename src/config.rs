use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;
use transgrid_core::GridConfig;

use crate::cli::Args;

/// Reads a TOML grid configuration
pub fn load_config(path: &Path) -> Result<GridConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    toml::from_str(&text)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

/// Configuration file (or defaults) with command line overrides applied
pub fn resolve_config(args: &Args) -> Result<GridConfig> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading grid configuration from {}", path.display());
            load_config(path)?
        }
        None => GridConfig::default(),
    };

    if let Some(width) = args.width {
        config.width = width;
    }
    if let Some(height) = args.height {
        config.height = height;
    }
    if args.threads.is_some() {
        config.threads = args.threads;
    }
    Ok(config)
}

//! Path utilities for galleryd.
//!
//! Provides centralized path resolution for everything galleryd keeps on
//! disk:
//!
//! # Base Directory
//! - [`get_galleryd_dir`] - `~/.galleryd/` (base directory for all data)
//!
//! # Defaults
//! - [`get_config_path`] - `~/.galleryd/galleryd.toml` (daemon settings)
//! - [`get_output_dir`] - `~/.galleryd/output/` (generated media root)
//! - [`get_input_dir`] - `~/.galleryd/input/` (uploaded media root)
//! - [`get_thumbs_dir`] - `~/.galleryd/thumbs/` (thumbnail cache)

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Environment variable overriding the base directory.
pub const HOME_ENV: &str = "GALLERYD_HOME";

/// Get the galleryd base directory.
///
/// Resolution order:
/// 1. `GALLERYD_HOME` environment variable (if set)
/// 2. `~/.galleryd/` (default)
pub fn get_galleryd_dir() -> Result<PathBuf> {
    if let Ok(home) = std::env::var(HOME_ENV)
        && !home.is_empty()
    {
        return Ok(PathBuf::from(home));
    }

    let home = dirs::home_dir().context("Failed to get home directory")?;
    Ok(home.join(".galleryd"))
}

/// Get the config path: `~/.galleryd/galleryd.toml`
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_galleryd_dir()?.join("galleryd.toml"))
}

/// Default output root: `~/.galleryd/output/`
pub fn get_output_dir() -> Result<PathBuf> {
    Ok(get_galleryd_dir()?.join("output"))
}

/// Default input root: `~/.galleryd/input/`
pub fn get_input_dir() -> Result<PathBuf> {
    Ok(get_galleryd_dir()?.join("input"))
}

/// Default thumbnail cache: `~/.galleryd/thumbs/`
pub fn get_thumbs_dir() -> Result<PathBuf> {
    Ok(get_galleryd_dir()?.join("thumbs"))
}

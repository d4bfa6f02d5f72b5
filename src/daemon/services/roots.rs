//! Configured media roots.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::gallery::SourceKind;

/// Canonical input and output directories.
///
/// Both are created if missing and canonicalized once at startup, so every
/// containment check compares against a symlink-free prefix.
#[derive(Debug, Clone)]
pub struct MediaRoots {
    input: PathBuf,
    output: PathBuf,
}

impl MediaRoots {
    /// Create (if needed) and canonicalize both roots.
    ///
    /// # Errors
    ///
    /// Returns an error if either directory cannot be created or resolved.
    pub fn open(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            input: prepare(input.as_ref())?,
            output: prepare(output.as_ref())?,
        })
    }

    /// Root directory for `kind`.
    pub fn root(&self, kind: SourceKind) -> &Path {
        match kind {
            SourceKind::Input => &self.input,
            SourceKind::Output => &self.output,
        }
    }
}

fn prepare(dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create media directory: {}", dir.display()))?;
    dir.canonicalize()
        .with_context(|| format!("Failed to resolve media directory: {}", dir.display()))
}

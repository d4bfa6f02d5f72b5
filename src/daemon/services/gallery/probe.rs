//! Latest-modification probe used by the change stream.

use std::path::Path;

use super::indexer::{ScanFilter, resolve_dir, scan};
use super::types::MediaKind;
use crate::error::Result;

/// Greatest mtime over the entries a listing of `subfolder` would report.
///
/// Flat probes consider visible directories and media files; recursive
/// probes consider media files at any depth. An empty tree yields `0.0`.
///
/// # Errors
///
/// Same as [`resolve_dir`]: forbidden escapes and missing directories.
pub fn latest_modified(
    root: &Path,
    subfolder: &str,
    recursive: bool,
    show_hidden: bool,
) -> Result<f64> {
    let (dir, label) = resolve_dir(root, subfolder)?;
    let filter = ScanFilter {
        recursive,
        show_hidden,
        kind: MediaKind::All,
    };

    let mut latest = 0.0_f64;
    scan(&dir, &label, filter, |candidate| {
        latest = latest.max(candidate.modified_at);
    })?;
    Ok(latest)
}

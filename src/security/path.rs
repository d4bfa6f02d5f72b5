//! Root containment with symlink protection.
//!
//! Client paths are first normalized lexically (no filesystem access), then
//! joined onto a canonical root and re-checked after symlink resolution. A
//! symlink inside a root that points elsewhere is treated exactly like a
//! `..` escape.

use std::path::{Component, Path, PathBuf};

use tracing::warn;

use super::error::PathTraversalError;

/// Normalize a client-supplied relative path.
///
/// Backslashes are treated as separators, empty and `.` segments are
/// dropped, leading slashes are ignored (the path is always relative to a
/// root) and `..` pops the previous segment. A `..` with nothing left to pop
/// would climb above the root and is rejected.
///
/// An empty input normalizes to an empty path, meaning the root itself.
///
/// # Errors
///
/// - [`NullByte`](PathTraversalError::NullByte) if the input contains `\0`
/// - [`AbsolutePath`](PathTraversalError::AbsolutePath) for drive prefixes like `C:`
/// - [`EscapesBaseDirectory`](PathTraversalError::EscapesBaseDirectory) for `..` escapes
pub fn normalize_relative(raw: &str) -> Result<PathBuf, PathTraversalError> {
    if raw.contains('\0') {
        warn!(
            security_event = "path_traversal_attempt",
            path = %raw.replace('\0', "\\0"),
            reason = "null_byte",
            "Blocked path with null byte"
        );
        return Err(PathTraversalError::NullByte);
    }

    let unified = raw.replace('\\', "/");
    let mut normalized = PathBuf::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => {},
            ".." => {
                if !normalized.pop() {
                    warn!(
                        security_event = "path_traversal_attempt",
                        path = %raw,
                        reason = "parent_escape",
                        "Blocked path escaping its root"
                    );
                    return Err(PathTraversalError::EscapesBaseDirectory);
                }
            },
            other if is_drive_prefix(other) => {
                return Err(PathTraversalError::AbsolutePath);
            },
            other => normalized.push(other),
        }
    }

    Ok(normalized)
}

fn is_drive_prefix(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    bytes.len() == 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Join a normalized relative path onto a root and verify containment.
///
/// `root` must already be canonical. The deepest existing ancestor of the
/// joined path is canonicalized (resolving every symlink on the way) and
/// must still start with `root`; any missing tail is appended afterwards.
/// A missing path under a symlink that leaves the root is therefore refused
/// exactly like an existing one.
///
/// # Errors
///
/// Returns [`SymlinkEscape`](PathTraversalError::SymlinkEscape) when the
/// resolved path lies outside `root`.
pub fn resolve_within_root(root: &Path, relative: &Path) -> Result<PathBuf, PathTraversalError> {
    let full_path = root.join(relative);

    let mut existing = full_path.as_path();
    let mut missing = Vec::new();
    while existing.symlink_metadata().is_err() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name);
                existing = parent;
            },
            _ => break,
        }
    }

    let canonical = existing
        .canonicalize()
        .map_err(|_| PathTraversalError::SymlinkEscape)?;

    if !canonical.starts_with(root) {
        warn!(
            security_event = "path_traversal_attempt",
            path = %relative.display(),
            reason = "symlink_escape",
            "Blocked symlink escaping its root"
        );
        return Err(PathTraversalError::SymlinkEscape);
    }

    Ok(missing
        .into_iter()
        .rev()
        .fold(canonical, |path, name| path.join(name)))
}

/// Render a relative path with forward slashes regardless of platform.
pub fn to_posix(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        if let Component::Normal(name) = component {
            if !out.is_empty() {
                out.push('/');
            }
            out.push_str(&name.to_string_lossy());
        }
    }
    out
}

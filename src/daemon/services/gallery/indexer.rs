//! Directory scanning.
//!
//! Flat scans read immediate children with `read_dir`; recursive scans walk
//! the subtree with `walkdir`, pruning hidden branches before descending.
//! Symlinks are never followed. Entries that disappear or fail to stat
//! between readdir and stat are skipped silently.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use super::filters::{FileClass, is_hidden, mtime_secs};
use super::selector::{PageSelector, page_slice};
use super::types::{
    EntryKind, EntryMeta, ListingQuery, ListingResult, MediaEntry, MediaKind, Newest,
};
use crate::error::{Error, Result};
use crate::security::{normalize_relative, resolve_within_root, to_posix};

/// Resolve `subfolder` under a canonical `root` to an existing directory.
///
/// Returns the resolved directory and the normalized forward-slash
/// subfolder.
///
/// # Errors
///
/// - [`Error::PathForbidden`] if the subfolder escapes the root, lexically or
///   through a symlink
/// - [`Error::NotFound`] if the target is missing or not a directory
pub fn resolve_dir(root: &Path, subfolder: &str) -> Result<(PathBuf, String)> {
    let relative = normalize_relative(subfolder).map_err(|_| Error::forbidden(subfolder))?;
    let dir = resolve_within_root(root, &relative).map_err(|_| Error::forbidden(subfolder))?;

    let normalized = to_posix(&relative);
    match fs::metadata(&dir) {
        Ok(meta) if meta.is_dir() => Ok((dir, normalized)),
        Ok(_) => Err(Error::not_found(format!("'{normalized}' is not a directory"))),
        Err(e) => Err(Error::from_io_at(&normalized, e)),
    }
}

/// A filesystem object that passed the hidden and kind filters.
#[derive(Debug)]
pub(super) struct Candidate {
    pub path: PathBuf,
    pub kind: EntryKind,
    pub modified_at: f64,
    pub size_bytes: u64,
}

impl Candidate {
    /// Convert to an entry relative to `root`.
    ///
    /// `None` only if `path` is not under `root`, which the resolver rules
    /// out for every path produced by a scan.
    pub fn into_entry(self, root: &Path) -> Option<MediaEntry> {
        let relative = self.path.strip_prefix(root).ok()?;
        let name = relative.file_name()?.to_string_lossy().into_owned();
        let subfolder = relative.parent().map(to_posix).unwrap_or_default();
        Some(MediaEntry {
            name,
            kind: self.kind,
            relative_path: to_posix(relative),
            subfolder,
            modified_at: self.modified_at,
            size_bytes: self.size_bytes,
            meta: None,
        })
    }
}

/// Which entries a scan reports.
#[derive(Debug, Clone, Copy)]
pub(super) struct ScanFilter {
    pub recursive: bool,
    pub show_hidden: bool,
    pub kind: MediaKind,
}

impl From<&ListingQuery> for ScanFilter {
    fn from(query: &ListingQuery) -> Self {
        Self {
            recursive: query.recursive,
            show_hidden: query.show_hidden,
            kind: query.kind,
        }
    }
}

/// Visit every candidate under `dir`.
///
/// Flat scans report visible directories and media files; recursive scans
/// report media files only. `label` is the root-relative name of `dir` used
/// in errors.
///
/// # Errors
///
/// Fails only if `dir` itself cannot be read.
pub(super) fn scan(
    dir: &Path,
    label: &str,
    filter: ScanFilter,
    mut visit: impl FnMut(Candidate),
) -> Result<()> {
    if filter.recursive {
        scan_recursive(dir, filter, &mut visit);
        Ok(())
    } else {
        scan_flat(dir, label, filter, &mut visit)
    }
}

fn scan_flat(
    dir: &Path,
    label: &str,
    filter: ScanFilter,
    visit: &mut impl FnMut(Candidate),
) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|e| Error::from_io_at(label, e))?;

    for entry in entries {
        let Ok(entry) = entry else { continue };
        let name = entry.file_name();
        if !filter.show_hidden && is_hidden(&name) {
            continue;
        }
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_symlink() {
            continue;
        }
        let Ok(meta) = entry.metadata() else {
            debug!(path = %entry.path().display(), "Entry vanished during scan");
            continue;
        };

        if file_type.is_dir() {
            visit(Candidate {
                path: entry.path(),
                kind: EntryKind::Directory,
                modified_at: mtime_secs(&meta),
                size_bytes: 0,
            });
        } else if file_type.is_file() && admits(&name.to_string_lossy(), filter.kind) {
            visit(Candidate {
                path: entry.path(),
                kind: EntryKind::Media,
                modified_at: mtime_secs(&meta),
                size_bytes: meta.len(),
            });
        }
    }
    Ok(())
}

fn scan_recursive(dir: &Path, filter: ScanFilter, visit: &mut impl FnMut(Candidate)) {
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| filter.show_hidden || !is_hidden(e.file_name()));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!(error = %e, "Skipping unreadable entry");
                continue;
            },
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if !admits(&entry.file_name().to_string_lossy(), filter.kind) {
            continue;
        }
        let Ok(meta) = entry.metadata() else {
            continue;
        };
        visit(Candidate {
            path: entry.into_path(),
            kind: EntryKind::Media,
            modified_at: mtime_secs(&meta),
            size_bytes: meta.len(),
        });
    }
}

fn admits(name: &str, kind: MediaKind) -> bool {
    FileClass::of(name).is_some_and(|class| kind.admits(class))
}

/// Scan and paginate one listing.
///
/// Media entries go through bounded top-K selection sized to the end of the
/// requested page. In flat mode directories are collected in full, sorted by
/// name, and occupy the leading positions of the combined order.
pub fn list(query: &ListingQuery) -> Result<ListingResult> {
    let (dir, label) = resolve_dir(&query.root, &query.subfolder)?;
    let window = query.window();

    let mut directories = Vec::new();
    let mut media = match window {
        Some((_, end)) => PageSelector::bounded(end),
        None => PageSelector::unbounded(),
    };

    scan(&dir, &label, ScanFilter::from(query), |candidate| {
        let Some(entry) = candidate.into_entry(&query.root) else {
            return;
        };
        match entry.kind {
            EntryKind::Directory => directories.push(entry),
            EntryKind::Media => media.offer(Newest(entry)),
        }
    })?;

    directories.sort_by(MediaEntry::cmp_by_name);
    let (ranked, media_total) = media.finish();
    let total = directories.len() + media_total;

    let mut ordered = directories;
    ordered.extend(ranked.into_iter().map(|Newest(entry)| entry));

    let mut items = match window {
        Some((start, end)) => page_slice(ordered, start, end),
        None => ordered,
    };

    if query.include_meta {
        for entry in &mut items {
            entry.meta = describe(&query.root, entry);
        }
    }

    debug!(
        subfolder = %query.subfolder,
        recursive = query.recursive,
        total_items = total,
        returned = items.len(),
        "Listed directory"
    );

    Ok(ListingResult::new(items, query, total))
}

/// Metadata for a media entry; directories get none.
pub(super) fn describe(root: &Path, entry: &MediaEntry) -> Option<EntryMeta> {
    if entry.kind != EntryKind::Media {
        return None;
    }
    let class = FileClass::of(&entry.name)?;
    let content_type = mime_guess::from_path(&entry.name)
        .first_or_octet_stream()
        .essence_str()
        .to_string();

    let (width, height) = if class == FileClass::Image {
        match image::image_dimensions(root.join(&entry.relative_path)) {
            Ok((w, h)) => (Some(w), Some(h)),
            Err(e) => {
                debug!(path = %entry.relative_path, error = %e, "Unreadable image header");
                (None, None)
            },
        }
    } else {
        (None, None)
    };

    Some(EntryMeta {
        content_type,
        media_kind: class,
        width,
        height,
    })
}

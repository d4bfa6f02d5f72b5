//! On-demand thumbnails with a persistent on-disk cache.
//!
//! Thumbnails live under `<thumbs_dir>/<source>/...` mirroring the source
//! tree. An artifact is reused while it is non-empty, looks like a JPEG and
//! is at least as new as its source; otherwise it is regenerated and written
//! through a temporary file plus rename, so readers never observe a partial
//! artifact.
//!
//! Generation never fails for an existing source: any render error degrades
//! to a placeholder frame.

mod generate;
mod key;

#[cfg(test)]
mod tests;

use std::fs::{self, Metadata};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use anyhow::Context;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

pub use generate::{MediaThumbnailer, Thumbnailer, placeholder};
pub use key::{ThumbnailKey, etag_for, matches_if_none_match};

use super::gallery::SourceKind;
use super::roots::MediaRoots;
use crate::daemon::metrics;
use crate::error::{Error, Result};
use crate::security::{normalize_relative, resolve_within_root, to_posix};

/// How a thumbnail response was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailOutcome {
    /// Served from the on-disk cache.
    Cached,
    /// Rendered from the source.
    Generated,
    /// Rendering failed; a placeholder was served and cached.
    Degraded,
}

impl ThumbnailOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cached => "cached",
            Self::Generated => "generated",
            Self::Degraded => "degraded",
        }
    }
}

/// Result of a thumbnail lookup.
#[derive(Debug, Clone)]
pub enum ThumbnailResponse {
    /// The client's validator matched.
    NotModified { etag: String },
    /// JPEG bytes with their validator.
    Fresh {
        bytes: Vec<u8>,
        etag: String,
        outcome: ThumbnailOutcome,
    },
}

/// A thumbnail request after path resolution.
#[derive(Debug)]
struct ResolvedSource {
    path: PathBuf,
    key: ThumbnailKey,
    meta: Metadata,
}

/// Thumbnail service shared by HTTP handlers.
#[derive(Clone)]
pub struct ThumbnailService {
    roots: MediaRoots,
    thumbs_dir: PathBuf,
    thumbnailer: Arc<dyn Thumbnailer>,
    permits: Arc<Semaphore>,
}

impl std::fmt::Debug for ThumbnailService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThumbnailService")
            .field("thumbs_dir", &self.thumbs_dir)
            .field("available_permits", &self.permits.available_permits())
            .finish_non_exhaustive()
    }
}

impl ThumbnailService {
    /// Create the service, creating `thumbs_dir` if needed.
    ///
    /// `max_concurrent` bounds simultaneous renders; zero is treated as one.
    ///
    /// # Errors
    ///
    /// Returns an error if the thumbnail directory cannot be created.
    pub fn open(
        roots: MediaRoots,
        thumbs_dir: impl Into<PathBuf>,
        thumbnailer: Arc<dyn Thumbnailer>,
        max_concurrent: usize,
    ) -> anyhow::Result<Self> {
        let thumbs_dir = thumbs_dir.into();
        fs::create_dir_all(&thumbs_dir).with_context(|| {
            format!("Failed to create thumbnail directory: {}", thumbs_dir.display())
        })?;
        Ok(Self {
            roots,
            thumbs_dir,
            thumbnailer,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        })
    }

    /// Thumbnail cache directory.
    pub fn thumbs_dir(&self) -> &Path {
        &self.thumbs_dir
    }

    /// Fetch or generate the thumbnail for `subfolder/filename`.
    ///
    /// A matching `if_none_match` short-circuits before the cache is
    /// touched.
    ///
    /// # Errors
    ///
    /// - [`Error::PathForbidden`] if the source escapes its root
    /// - [`Error::NotFound`] if the source is missing or not a file
    pub async fn get(
        &self,
        source: SourceKind,
        subfolder: &str,
        filename: &str,
        width: u32,
        if_none_match: Option<&str>,
    ) -> Result<ThumbnailResponse> {
        let root = self.roots.root(source).to_path_buf();
        let raw = format!("{subfolder}/{filename}");
        let resolved =
            tokio::task::spawn_blocking(move || resolve_source(&root, source, &raw, width))
                .await??;

        let etag = etag_for(&resolved.meta, width);
        if let Some(header) = if_none_match
            && matches_if_none_match(header, &etag)
        {
            metrics::record_thumbnail("not_modified");
            return Ok(ThumbnailResponse::NotModified { etag });
        }

        let dest = resolved.key.dest_path(&self.thumbs_dir);
        let source_mtime = resolved.meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);

        let cached = {
            let dest = dest.clone();
            tokio::task::spawn_blocking(move || read_fresh(&dest, source_mtime)).await?
        };
        if let Some(bytes) = cached {
            metrics::record_thumbnail(ThumbnailOutcome::Cached.as_str());
            return Ok(ThumbnailResponse::Fresh {
                bytes,
                etag,
                outcome: ThumbnailOutcome::Cached,
            });
        }

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| Error::Worker(e.to_string()))?;

        let thumbnailer = Arc::clone(&self.thumbnailer);
        let (bytes, outcome) = tokio::task::spawn_blocking(move || {
            ensure_artifact(thumbnailer.as_ref(), &resolved, &dest, source_mtime)
        })
        .await??;

        metrics::record_thumbnail(outcome.as_str());
        Ok(ThumbnailResponse::Fresh {
            bytes,
            etag,
            outcome,
        })
    }
}

fn resolve_source(root: &Path, source: SourceKind, raw: &str, width: u32) -> Result<ResolvedSource> {
    let relative = normalize_relative(raw).map_err(|_| Error::forbidden(raw))?;
    if relative.as_os_str().is_empty() {
        return Err(Error::not_found("empty thumbnail source path"));
    }
    let path = resolve_within_root(root, &relative).map_err(|_| Error::forbidden(raw))?;
    let relative = to_posix(&relative);
    let meta = fs::metadata(&path).map_err(|e| Error::from_io_at(&relative, e))?;
    if !meta.is_file() {
        return Err(Error::not_found(format!("'{relative}' is not a file")));
    }
    Ok(ResolvedSource {
        path,
        key: ThumbnailKey::new(source, relative, width),
        meta,
    })
}

/// Artifact bytes if it exists, looks like a JPEG and is not older than the
/// source.
fn read_fresh(dest: &Path, source_mtime: SystemTime) -> Option<Vec<u8>> {
    let meta = fs::metadata(dest).ok()?;
    if meta.len() == 0 || meta.modified().ok()? < source_mtime {
        return None;
    }
    let bytes = fs::read(dest).ok()?;
    bytes.starts_with(&[0xFF, 0xD8]).then_some(bytes)
}

fn ensure_artifact(
    thumbnailer: &dyn Thumbnailer,
    source: &ResolvedSource,
    dest: &Path,
    source_mtime: SystemTime,
) -> Result<(Vec<u8>, ThumbnailOutcome)> {
    // Another request may have finished this key while we waited for a permit.
    if let Some(bytes) = read_fresh(dest, source_mtime) {
        return Ok((bytes, ThumbnailOutcome::Cached));
    }

    let width = source.key.width;
    let (bytes, outcome) = match thumbnailer.render(&source.path, width) {
        Ok(bytes) => (bytes, ThumbnailOutcome::Generated),
        Err(e) => {
            warn!(
                path = %source.key.relative_path,
                width,
                error = %format!("{e:#}"),
                "Thumbnail render failed, serving placeholder"
            );
            let bytes = placeholder(width).map_err(|e| Error::Worker(format!("{e:#}")))?;
            (bytes, ThumbnailOutcome::Degraded)
        },
    };

    // Stamp the artifact no older than its source so a source with a future
    // mtime is not regenerated on every request.
    let stamp = source_mtime.max(SystemTime::now());
    match write_atomic(dest, &bytes, stamp) {
        Ok(()) => info!(
            path = %source.key.relative_path,
            width,
            outcome = outcome.as_str(),
            "Thumbnail written"
        ),
        Err(e) => warn!(
            path = %dest.display(),
            error = %format!("{e:#}"),
            "Failed to persist thumbnail"
        ),
    }
    Ok((bytes, outcome))
}

fn write_atomic(dest: &Path, bytes: &[u8], modified: SystemTime) -> anyhow::Result<()> {
    let parent = dest
        .parent()
        .context("Thumbnail path has no parent directory")?;
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create {}", parent.display()))?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".thumb-")
        .suffix(".tmp")
        .tempfile_in(parent)
        .context("Failed to create temporary thumbnail")?;
    tmp.write_all(bytes).context("Failed to write thumbnail")?;
    tmp.as_file().set_modified(modified)?;
    tmp.persist(dest)
        .with_context(|| format!("Failed to rename into {}", dest.display()))?;
    debug!(path = %dest.display(), "Thumbnail persisted");
    Ok(())
}

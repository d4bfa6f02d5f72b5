//! Thumbnail cache addressing and validators.

use std::fs::Metadata;
use std::path::{Path, PathBuf};

use crate::daemon::services::gallery::SourceKind;

/// Identity of one derived thumbnail.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThumbnailKey {
    pub source: SourceKind,
    /// Normalized forward-slash path of the source relative to its root.
    pub relative_path: String,
    pub width: u32,
}

impl ThumbnailKey {
    pub fn new(source: SourceKind, relative_path: impl Into<String>, width: u32) -> Self {
        Self {
            source,
            relative_path: relative_path.into(),
            width,
        }
    }

    /// On-disk location: `<thumbs_dir>/<source>/<subfolder>/<stem>__w<width>.jpg`.
    ///
    /// Sources in one folder that share a stem (`a.png`, `a.mp4`) map to the
    /// same artifact.
    pub fn dest_path(&self, thumbs_dir: &Path) -> PathBuf {
        let relative = Path::new(&self.relative_path);
        let stem = relative
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut dest = thumbs_dir.join(self.source.as_str());
        if let Some(parent) = relative.parent() {
            for segment in parent.iter() {
                dest.push(segment);
            }
        }
        dest.push(format!("{stem}__w{}.jpg", self.width));
        dest
    }
}

/// Weak validator derived from the source's mtime and size plus the width.
pub fn etag_for(source: &Metadata, width: u32) -> String {
    let mtime = source
        .modified()
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map_or(0, |d| d.as_secs());
    format!("W/\"{mtime}-{}-w{width}\"", source.len())
}

/// Whether an `If-None-Match` header value matches `etag`.
///
/// Accepts `*` and comma-separated lists; comparison is weak, so a strong
/// form of the same opaque tag also matches.
pub fn matches_if_none_match(header: &str, etag: &str) -> bool {
    let opaque = strip_weak(etag);
    header
        .split(',')
        .map(str::trim)
        .any(|candidate| candidate == "*" || strip_weak(candidate) == opaque)
}

fn strip_weak(tag: &str) -> &str {
    tag.strip_prefix("W/").unwrap_or(tag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::{Duration, UNIX_EPOCH};
    use tempfile::tempdir;

    #[test]
    fn test_dest_path_layout() {
        let key = ThumbnailKey::new(SourceKind::Output, "renders/2024/cat.png", 384);
        assert_eq!(
            key.dest_path(Path::new("/thumbs")),
            Path::new("/thumbs/output/renders/2024/cat__w384.jpg")
        );

        let key = ThumbnailKey::new(SourceKind::Input, "dog.webp", 96);
        assert_eq!(
            key.dest_path(Path::new("/thumbs")),
            Path::new("/thumbs/input/dog__w96.jpg")
        );
    }

    #[test]
    fn test_etag_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.png");
        std::fs::write(&path, b"12345").unwrap();
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(UNIX_EPOCH + Duration::from_secs(1_700_000_000))
            .unwrap();

        let meta = std::fs::metadata(&path).unwrap();
        assert_eq!(etag_for(&meta, 256), "W/\"1700000000-5-w256\"");
    }

    #[test]
    fn test_if_none_match() {
        let etag = "W/\"10-5-w256\"";
        assert!(matches_if_none_match(etag, etag));
        assert!(matches_if_none_match("\"10-5-w256\"", etag));
        assert!(matches_if_none_match("\"other\", W/\"10-5-w256\"", etag));
        assert!(matches_if_none_match("*", etag));
        assert!(!matches_if_none_match("W/\"10-5-w384\"", etag));
    }
}

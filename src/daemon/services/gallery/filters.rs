//! Extension allow-lists, hidden-name detection and mtime helpers.

use std::ffi::OsStr;
use std::fs::Metadata;
use std::path::Path;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use super::types::MediaKind;

/// Still-image extensions (lowercase, without the dot).
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp", "tif", "tiff"];

/// Video extensions.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "mkv"];

/// Audio outputs; listed only when every kind is requested.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "flac"];

/// Coarse classification of a media file by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileClass {
    Image,
    Video,
    Audio,
}

impl FileClass {
    /// Classify a file name by its extension, case-insensitively.
    ///
    /// Returns `None` for anything outside the allow-lists.
    pub fn of(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
        let ext = ext.as_str();
        if IMAGE_EXTENSIONS.contains(&ext) {
            Some(Self::Image)
        } else if VIDEO_EXTENSIONS.contains(&ext) {
            Some(Self::Video)
        } else if AUDIO_EXTENSIONS.contains(&ext) {
            Some(Self::Audio)
        } else {
            None
        }
    }
}

impl MediaKind {
    /// Whether a file of class `class` passes this kind filter.
    pub fn admits(self, class: FileClass) -> bool {
        match self {
            Self::All => true,
            Self::Image => class == FileClass::Image,
            Self::Video => class == FileClass::Video,
        }
    }
}

/// Dot-files and dot-directories are hidden.
pub fn is_hidden(name: &OsStr) -> bool {
    name.as_encoded_bytes().first() == Some(&b'.')
}

/// Modification time in fractional seconds since the Unix epoch.
///
/// Platforms without mtime support, or times before the epoch, yield `0.0`.
pub fn mtime_secs(meta: &Metadata) -> f64 {
    meta.modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0.0, |d| d.as_secs_f64())
}

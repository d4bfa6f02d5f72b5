//! Core types for the gallery service.
//!
//! Contains the listing query (which doubles as the result-cache key), the
//! entries it produces and the page envelope returned to clients.

use std::cmp::Ordering;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::filters::FileClass;

/// Which configured root a request addresses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Uploaded inputs.
    Input,
    /// Generated outputs.
    #[default]
    Output,
}

impl SourceKind {
    /// Lowercase name, also used as the thumbnail cache subdirectory.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "input" => Ok(Self::Input),
            "output" => Ok(Self::Output),
            other => Err(format!("unknown source type '{other}' (expected input|output)")),
        }
    }
}

/// Media-kind filter for listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    All,
    Image,
    Video,
}

impl FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(Self::All),
            "image" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            other => Err(format!("unknown kind '{other}' (expected all|image|video)")),
        }
    }
}

/// Whether an entry is a directory or a media file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Directory,
    Media,
}

/// Extra per-entry information returned when `include_meta` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryMeta {
    /// MIME type guessed from the extension.
    pub content_type: String,
    /// Coarse media class.
    pub media_kind: FileClass,
    /// Pixel width for still images whose header could be read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Pixel height for still images whose header could be read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// One file or directory observed under a root.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaEntry {
    /// Leaf name.
    pub name: String,
    pub kind: EntryKind,
    /// Forward-slash path relative to the root.
    pub relative_path: String,
    /// Relative path of the containing directory (empty for the root).
    pub subfolder: String,
    /// Seconds since the Unix epoch.
    pub modified_at: f64,
    /// Zero for directories.
    pub size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<EntryMeta>,
}

impl MediaEntry {
    /// Newest first; equal times fall back to name, then full path.
    pub fn cmp_newest_first(&self, other: &Self) -> Ordering {
        other
            .modified_at
            .total_cmp(&self.modified_at)
            .then_with(|| self.name.cmp(&other.name))
            .then_with(|| self.relative_path.cmp(&other.relative_path))
    }

    /// Case-insensitive name order used for directories.
    pub fn cmp_by_name(&self, other: &Self) -> Ordering {
        self.name
            .to_lowercase()
            .cmp(&other.name.to_lowercase())
            .then_with(|| self.name.cmp(&other.name))
    }
}

/// Media entry ranked for top-K selection: greater means newer.
#[derive(Debug, Clone)]
pub struct Newest(pub MediaEntry);

impl PartialEq for Newest {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Newest {}

impl Ord for Newest {
    fn cmp(&self, other: &Self) -> Ordering {
        other.0.cmp_newest_first(&self.0)
    }
}

impl PartialOrd for Newest {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Selection parameters for a listing; also the result-cache key.
///
/// Two queries hit the same cache entry only when every field is equal, so
/// varying `cache_bust` forces a fresh scan.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListingQuery {
    /// Canonical root directory.
    pub root: PathBuf,
    /// Normalized forward-slash subfolder (empty for the root).
    pub subfolder: String,
    pub recursive: bool,
    pub show_hidden: bool,
    pub kind: MediaKind,
    /// 1-based page number.
    pub page: usize,
    /// Zero means unbounded.
    pub page_size: usize,
    pub cache_bust: Option<String>,
    pub include_meta: bool,
}

impl ListingQuery {
    /// A first-page query over `subfolder` with default filters.
    pub fn new(root: impl Into<PathBuf>, subfolder: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            subfolder: subfolder.into(),
            recursive: false,
            show_hidden: false,
            kind: MediaKind::All,
            page: 1,
            page_size: crate::constants::DEFAULT_PAGE_SIZE,
            cache_bust: None,
            include_meta: false,
        }
    }

    /// Half-open index range of the requested page within the full ordering.
    ///
    /// `None` when the page size is unbounded.
    pub fn window(&self) -> Option<(usize, usize)> {
        if self.page_size == 0 {
            return None;
        }
        let start = self.page.saturating_sub(1).saturating_mul(self.page_size);
        Some((start, start.saturating_add(self.page_size)))
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingResult {
    pub items: Vec<MediaEntry>,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

impl ListingResult {
    /// Wrap a page of items with paging totals.
    pub fn new(items: Vec<MediaEntry>, query: &ListingQuery, total_items: usize) -> Self {
        let total_pages = if query.page_size > 0 {
            total_items.div_ceil(query.page_size)
        } else {
            1
        };
        Self {
            items,
            page: query.page,
            page_size: query.page_size,
            total_pages,
            total_items,
        }
    }
}

//! Configuration types for galleryd.
//!
//! Settings are read from `galleryd.toml` (see [`crate::daemon::paths`]).
//! Every section and field is optional:
//!
//! - [`ServerConfig`] - bind address
//! - [`GallerySettings`] - media roots, listing cache, paging limits
//! - [`ThumbnailSettings`] - cache directory, widths, video decoder
//! - [`StreamSettings`] - change-stream timing and connection cap
//! - [`RuntimeSettings`] - blocking pool size

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants;
use crate::daemon::paths;

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Non-fatal warnings that should be logged but don't prevent operation.
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Returns true if there are any warnings.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// galleryd.toml configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    pub server: ServerConfig,
    pub gallery: GallerySettings,
    pub thumbnails: ThumbnailSettings,
    pub stream: StreamSettings,
    pub runtime: RuntimeSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: constants::DEFAULT_HOST.to_string(),
            port: constants::DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GallerySettings {
    /// Generated media root; `~/.galleryd/output` when unset.
    pub output_dir: Option<PathBuf>,
    /// Uploaded media root; `~/.galleryd/input` when unset.
    pub input_dir: Option<PathBuf>,
    pub cache_ttl_ms: u64,
    pub cache_capacity: usize,
    pub default_page_size: usize,
    pub max_page_size: usize,
}

impl Default for GallerySettings {
    fn default() -> Self {
        Self {
            output_dir: None,
            input_dir: None,
            cache_ttl_ms: constants::DEFAULT_CACHE_TTL_MS,
            cache_capacity: constants::DEFAULT_CACHE_CAPACITY,
            default_page_size: constants::DEFAULT_PAGE_SIZE,
            max_page_size: constants::MAX_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailSettings {
    /// Thumbnail cache directory; `~/.galleryd/thumbs` when unset.
    pub dir: Option<PathBuf>,
    pub min_width: u32,
    pub max_width: u32,
    pub default_width: u32,
    /// Video frame extractor, looked up on `PATH` when not absolute.
    pub ffmpeg: PathBuf,
    pub video_offset_secs: f64,
    pub max_concurrent: usize,
}

impl Default for ThumbnailSettings {
    fn default() -> Self {
        Self {
            dir: None,
            min_width: constants::MIN_THUMB_WIDTH,
            max_width: constants::MAX_THUMB_WIDTH,
            default_width: constants::DEFAULT_THUMB_WIDTH,
            ffmpeg: PathBuf::from("ffmpeg"),
            video_offset_secs: constants::DEFAULT_VIDEO_OFFSET_SECS,
            max_concurrent: constants::DEFAULT_MAX_CONCURRENT_THUMBS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StreamSettings {
    pub poll_interval_ms: u64,
    pub keepalive_secs: u64,
    pub max_connections: usize,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: constants::DEFAULT_POLL_INTERVAL_MS,
            keepalive_secs: constants::DEFAULT_KEEPALIVE_SECS,
            max_connections: constants::DEFAULT_MAX_STREAMS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeSettings {
    pub blocking_threads: usize,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            blocking_threads: constants::DEFAULT_BLOCKING_THREADS,
        }
    }
}

impl GalleryConfig {
    /// Load configuration from the specified path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or
    /// contains unknown keys.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load an explicit config file, or the default one if it exists.
    ///
    /// A missing default file yields built-in defaults; a missing explicit
    /// file is an error.
    ///
    /// # Errors
    ///
    /// As [`load_from`](Self::load_from), or if the home directory cannot be
    /// determined.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        let path = paths::get_config_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Resolved output root.
    pub fn output_dir(&self) -> Result<PathBuf> {
        self.gallery
            .output_dir
            .clone()
            .map_or_else(paths::get_output_dir, Ok)
    }

    /// Resolved input root.
    pub fn input_dir(&self) -> Result<PathBuf> {
        self.gallery
            .input_dir
            .clone()
            .map_or_else(paths::get_input_dir, Ok)
    }

    /// Resolved thumbnail cache directory.
    pub fn thumbs_dir(&self) -> Result<PathBuf> {
        self.thumbnails
            .dir
            .clone()
            .map_or_else(paths::get_thumbs_dir, Ok)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.gallery.cache_ttl_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.stream.poll_interval_ms)
    }

    pub fn keepalive(&self) -> Duration {
        Duration::from_secs(self.stream.keepalive_secs)
    }

    /// Validate configuration with comprehensive checks.
    ///
    /// Returns a `ValidationResult` containing any non-fatal warnings.
    ///
    /// # Errors
    ///
    /// Returns an error listing every fatal problem:
    /// - Port 0 or an empty host
    /// - Inconsistent thumbnail width bounds
    /// - Zero poll interval, keepalive, or blocking pool size
    /// - Zero default page size or a default above the maximum
    pub fn validate(&self) -> Result<ValidationResult> {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        // 1. Server
        if self.server.port == 0 {
            errors.push(
                "server.port cannot be 0. Use a valid port number (1-65535)".to_string(),
            );
        } else if self.server.port < 1024 {
            warnings.push(format!(
                "server.port {} is a system/privileged port (< 1024)\n  \
                 Recommendation: Use ports >= 1024 to avoid permission issues",
                self.server.port
            ));
        }
        if self.server.host.trim().is_empty() {
            errors.push("server.host cannot be empty".to_string());
        }

        // 2. Listing
        let gallery = &self.gallery;
        if gallery.default_page_size == 0 {
            errors.push("gallery.default_page_size cannot be 0".to_string());
        }
        if gallery.default_page_size > gallery.max_page_size {
            errors.push(format!(
                "gallery.default_page_size ({}) exceeds gallery.max_page_size ({})",
                gallery.default_page_size, gallery.max_page_size
            ));
        }
        if gallery.cache_ttl_ms == 0 || gallery.cache_capacity == 0 {
            warnings.push(
                "Listing cache is disabled (cache_ttl_ms or cache_capacity is 0)\n  \
                 Every listing request will rescan the filesystem"
                    .to_string(),
            );
        }
        if gallery.cache_ttl_ms > 60_000 {
            warnings.push(format!(
                "gallery.cache_ttl_ms {} is long; new files may take over a minute to appear",
                gallery.cache_ttl_ms
            ));
        }
        if let (Some(input), Some(output)) = (&gallery.input_dir, &gallery.output_dir)
            && input == output
        {
            warnings.push(format!(
                "gallery.input_dir and gallery.output_dir are the same: {}",
                input.display()
            ));
        }

        // 3. Thumbnails
        let thumbs = &self.thumbnails;
        if thumbs.min_width == 0 {
            errors.push("thumbnails.min_width cannot be 0".to_string());
        }
        if thumbs.min_width > thumbs.max_width {
            errors.push(format!(
                "thumbnails.min_width ({}) exceeds thumbnails.max_width ({})",
                thumbs.min_width, thumbs.max_width
            ));
        } else if !(thumbs.min_width..=thumbs.max_width).contains(&thumbs.default_width) {
            errors.push(format!(
                "thumbnails.default_width ({}) must be within {}..={}",
                thumbs.default_width, thumbs.min_width, thumbs.max_width
            ));
        }
        if thumbs.max_concurrent == 0 {
            warnings.push(
                "thumbnails.max_concurrent is 0; using 1 concurrent encode".to_string(),
            );
        }
        if !thumbs.video_offset_secs.is_finite() || thumbs.video_offset_secs < 0.0 {
            errors.push(format!(
                "thumbnails.video_offset_secs must be a non-negative number (got {})",
                thumbs.video_offset_secs
            ));
        }

        // 4. Stream
        if self.stream.poll_interval_ms == 0 {
            errors.push("stream.poll_interval_ms cannot be 0".to_string());
        }
        if self.stream.keepalive_secs == 0 {
            errors.push("stream.keepalive_secs cannot be 0".to_string());
        }
        if self.stream.max_connections == 0 {
            warnings.push(
                "stream.max_connections is 0; every change stream will be refused".to_string(),
            );
        }

        // 5. Runtime
        if self.runtime.blocking_threads == 0 {
            errors.push("runtime.blocking_threads cannot be 0".to_string());
        }

        if !errors.is_empty() {
            anyhow::bail!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            );
        }

        Ok(ValidationResult { warnings })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: GalleryConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.port, constants::DEFAULT_PORT);
        assert_eq!(config.gallery.cache_capacity, 256);
        assert_eq!(config.thumbnails.default_width, 384);
        assert_eq!(config.stream.max_connections, 64);
        assert_eq!(config.cache_ttl(), Duration::from_secs(3));

        let result = config.validate().unwrap();
        assert!(!result.has_warnings());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
[server]
host = "0.0.0.0"
port = 9000

[gallery]
output_dir = "/srv/media/output"
input_dir = "/srv/media/input"
cache_ttl_ms = 1500
cache_capacity = 32
default_page_size = 50
max_page_size = 200

[thumbnails]
dir = "/var/cache/galleryd"
min_width = 64
max_width = 512
default_width = 256
ffmpeg = "/usr/bin/ffmpeg"
video_offset_secs = 0.5
max_concurrent = 2

[stream]
poll_interval_ms = 500
keepalive_secs = 5
max_connections = 8

[runtime]
blocking_threads = 8
"#;
        let config: GalleryConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.output_dir().unwrap(), PathBuf::from("/srv/media/output"));
        assert_eq!(config.thumbs_dir().unwrap(), PathBuf::from("/var/cache/galleryd"));
        assert_eq!(config.thumbnails.ffmpeg, PathBuf::from("/usr/bin/ffmpeg"));
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.keepalive(), Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let result: Result<GalleryConfig, _> = toml::from_str("[gallery]\nroot = \"/x\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let toml_str = r#"
[server]
port = 0

[thumbnails]
min_width = 600
max_width = 300

[stream]
poll_interval_ms = 0
"#;
        let config: GalleryConfig = toml::from_str(toml_str).unwrap();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("server.port cannot be 0"));
        assert!(err.contains("min_width (600) exceeds"));
        assert!(err.contains("poll_interval_ms cannot be 0"));
    }

    #[test]
    fn test_validate_default_width_out_of_range() {
        let config: GalleryConfig =
            toml::from_str("[thumbnails]\ndefault_width = 2000\n").unwrap();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("default_width (2000)"));
    }

    #[test]
    fn test_validate_warnings() {
        let toml_str = r#"
[server]
port = 80

[gallery]
cache_ttl_ms = 0
"#;
        let config: GalleryConfig = toml::from_str(toml_str).unwrap();
        let result = config.validate().unwrap();
        assert_eq!(result.warnings.len(), 2);
        assert!(result.warnings[0].contains("privileged"));
        assert!(result.warnings[1].contains("cache is disabled"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("galleryd.toml");
        fs::write(&path, "[server]\nport = 9100\n").unwrap();

        let config = GalleryConfig::load(Some(&path)).unwrap();
        assert_eq!(config.server.port, 9100);

        let missing = dir.path().join("missing.toml");
        assert!(GalleryConfig::load(Some(&missing)).is_err());
    }
}

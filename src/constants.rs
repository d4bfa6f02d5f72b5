//! Shared defaults for the gallery daemon.
//!
//! Every tunable here can be overridden from `galleryd.toml`; these values
//! are what an empty config file resolves to.

/// Default HTTP port for the daemon.
pub const DEFAULT_PORT: u16 = 8189;

/// Default bind address.
pub const DEFAULT_HOST: &str = "127.0.0.1";

// =============================================================================
// Listing
// =============================================================================

/// Lifetime of a cached listing result in milliseconds.
pub const DEFAULT_CACHE_TTL_MS: u64 = 3_000;

/// Maximum number of cached listing results.
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Page size used when the client does not send one.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Upper bound for a requested page size.
pub const MAX_PAGE_SIZE: usize = 500;

// =============================================================================
// Thumbnails
// =============================================================================

/// Smallest thumbnail width a client may request.
pub const MIN_THUMB_WIDTH: u32 = 96;

/// Largest thumbnail width a client may request.
pub const MAX_THUMB_WIDTH: u32 = 1024;

/// Width used when the client does not send one.
pub const DEFAULT_THUMB_WIDTH: u32 = 384;

/// JPEG quality for generated thumbnails.
pub const THUMB_JPEG_QUALITY: u8 = 85;

/// Offset into a video where the representative frame is taken.
pub const DEFAULT_VIDEO_OFFSET_SECS: f64 = 0.10;

/// Concurrent thumbnail encodes.
pub const DEFAULT_MAX_CONCURRENT_THUMBS: usize = 4;

/// Cache-Control for thumbnail responses (one year, immutable).
pub const THUMB_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

// =============================================================================
// Change stream
// =============================================================================

/// Interval between modification-time probes.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;

/// Idle time after which a keepalive comment is sent.
pub const DEFAULT_KEEPALIVE_SECS: u64 = 15;

/// Maximum number of simultaneously open change streams.
pub const DEFAULT_MAX_STREAMS: usize = 64;

// =============================================================================
// Runtime
// =============================================================================

/// Size of the blocking worker pool used for filesystem and codec work.
pub const DEFAULT_BLOCKING_THREADS: usize = 32;

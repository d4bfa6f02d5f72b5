//! Input sanitization and root containment for gallery paths.
//!
//! Every path a client sends (a listing subfolder, a thumbnail filename) is
//! relative to one of the configured media roots. This module turns those
//! strings into filesystem paths that are guaranteed to stay under the root:
//!
//! - [`normalize_relative`] - lexical cleanup, rejects `..` that climbs out
//! - [`resolve_within_root`] - joins onto a root and re-checks after symlinks
//! - [`to_posix`] - renders a relative path with forward slashes
//!
//! # Examples
//!
//! ```
//! use galleryd::security::normalize_relative;
//!
//! assert!(normalize_relative("renders/2024").is_ok());
//! assert!(normalize_relative("renders/../portraits").is_ok());
//! assert!(normalize_relative("../../etc").is_err());
//! ```

mod error;
mod path;

pub use error::PathTraversalError;
pub use path::{normalize_relative, resolve_within_root, to_posix};

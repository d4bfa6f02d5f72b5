//! Services behind the HTTP API.
//!
//! - [`gallery`] - cached, paginated listings
//! - [`thumbs`] - on-demand thumbnails with an on-disk cache
//! - [`watch`] - poll-and-diff change streams
//! - [`roots`] - canonical media roots shared by all three

pub mod gallery;
pub mod roots;
pub mod thumbs;
pub mod watch;

//! galleryd: a media gallery daemon.
//!
//! Indexes trees of generated images and videos, serves paginated listings,
//! renders cached thumbnails on demand and pushes change notifications over
//! server-sent events.

#![deny(unsafe_code)]

pub mod config;
pub mod constants;
pub mod daemon;
pub mod error;
pub mod logging;
pub mod security;

pub use error::{Error, Result};

//! Error types for path validation.
//!
//! These describe why a client-supplied path was refused. The
//! gallery layer folds all of them into a single forbidden/bad-request
//! response, but the variants are kept distinct for audit logging.

use std::error::Error;
use std::fmt;

/// Error type for paths that would leave their root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathTraversalError {
    /// Path contains null bytes.
    NullByte,
    /// Path is a Windows drive or UNC prefix.
    AbsolutePath,
    /// Path climbs above the root using `..`.
    EscapesBaseDirectory,
    /// Path resolves outside the root once symlinks are followed.
    SymlinkEscape,
}

impl fmt::Display for PathTraversalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NullByte => write!(f, "Path contains null bytes"),
            Self::AbsolutePath => write!(f, "Absolute paths are not allowed"),
            Self::EscapesBaseDirectory => {
                write!(f, "Path attempts to escape base directory using '..'")
            },
            Self::SymlinkEscape => write!(f, "Path resolves outside base directory"),
        }
    }
}

impl Error for PathTraversalError {}

//! Gallery error types for typed error handling.
//!
//! Domain operations (indexing, thumbnailing, probing) return [`Error`];
//! the HTTP layer maps each variant onto a status code.

/// Result type for gallery operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Gallery errors with structured context.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Resolved path is not a descendant of its root.
    #[error("path escapes its root: {path}")]
    PathForbidden { path: String },

    /// Root, subfolder or source file is absent.
    #[error("not found: {what}")]
    NotFound { what: String },

    /// Unparsable paging or filter parameters.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Filesystem failure with context.
    #[error("IO error in {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Offloaded blocking task panicked or was cancelled.
    #[error("worker task failed: {0}")]
    Worker(String),
}

impl Error {
    /// Create a path-forbidden error.
    pub fn forbidden(path: impl Into<String>) -> Self {
        Self::PathForbidden { path: path.into() }
    }

    /// Create a not-found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Create an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Map an IO error on the root-relative path `what`, turning `NotFound`
    /// into [`Error::NotFound`].
    ///
    /// `what` ends up in client-facing messages, so it must never be an
    /// absolute server path.
    pub fn from_io_at(what: &str, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::not_found(what)
        } else {
            Self::io(what, source)
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Worker(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_io_at_maps_not_found() {
        let err = Error::from_io_at(
            "renders/a.png",
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(matches!(&err, Error::NotFound { what } if what == "renders/a.png"));

        let err = Error::from_io_at(
            "renders/a.png",
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert!(matches!(err, Error::Io { .. }));
    }
}

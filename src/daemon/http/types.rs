//! Request and response types for the HTTP API.
//!
//! Query parameters arrive as raw strings and are validated here, so every
//! malformed value produces the same JSON `400` body instead of an extractor
//! rejection.

use serde::{Deserialize, Serialize};

use super::AppError;
use crate::daemon::services::gallery::{MediaKind, SourceKind};

/// `GET /api/gallery` parameters.
#[derive(Debug, Default, Deserialize)]
pub struct GalleryParams {
    #[serde(rename = "type")]
    pub source: Option<String>,
    pub subfolder: Option<String>,
    pub show_hidden: Option<String>,
    pub recursive: Option<String>,
    pub kind: Option<String>,
    pub include_meta: Option<String>,
    pub page: Option<String>,
    #[serde(alias = "page_size")]
    pub per_page: Option<String>,
    #[serde(alias = "_")]
    pub cache_bust: Option<String>,
}

/// `GET /api/gallery/stream` parameters.
#[derive(Debug, Default, Deserialize)]
pub struct StreamParams {
    #[serde(rename = "type")]
    pub source: Option<String>,
    pub subfolder: Option<String>,
    pub recursive: Option<String>,
    pub show_hidden: Option<String>,
}

/// `GET /api/thumb` parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ThumbParams {
    #[serde(rename = "type")]
    pub source: Option<String>,
    pub filename: Option<String>,
    pub subfolder: Option<String>,
    #[serde(alias = "width")]
    pub w: Option<String>,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

/// JSON error body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Parse a bool-ish flag: `1/0`, `true/false`, `yes/no`, `on/off`.
///
/// Absent or empty values take `default`.
pub fn parse_bool(name: &str, raw: Option<&str>, default: bool) -> Result<bool, AppError> {
    let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(default);
    };
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(AppError::BadRequest(format!(
            "'{name}' must be a boolean (got '{raw}')"
        ))),
    }
}

/// Parse the `type` parameter, defaulting to `output`.
pub fn parse_source(raw: Option<&str>) -> Result<SourceKind, AppError> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(SourceKind::default()),
        Some(value) => value.parse().map_err(AppError::BadRequest),
    }
}

/// Parse the `kind` filter, defaulting to `all`.
pub fn parse_kind(raw: Option<&str>) -> Result<MediaKind, AppError> {
    raw.unwrap_or_default().parse().map_err(AppError::BadRequest)
}

/// Parse a 1-based page number.
pub fn parse_page(raw: Option<&str>) -> Result<usize, AppError> {
    let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(1);
    };
    match raw.parse::<usize>() {
        Ok(page) if page >= 1 => Ok(page),
        _ => Err(AppError::BadRequest(format!(
            "'page' must be an integer >= 1 (got '{raw}')"
        ))),
    }
}

/// Parse an integer and clamp it into `min..=max`.
///
/// Absent values take `default`; out-of-range integers (including negative
/// ones) are clamped rather than rejected.
pub fn parse_clamped(
    name: &str,
    raw: Option<&str>,
    default: i64,
    min: i64,
    max: i64,
) -> Result<i64, AppError> {
    let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(default.clamp(min, max));
    };
    raw.parse::<i64>()
        .map(|value| value.clamp(min, max))
        .map_err(|_| AppError::BadRequest(format!("'{name}' must be an integer (got '{raw}')")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_forms() {
        for raw in ["1", "true", "YES", "On"] {
            assert!(parse_bool("x", Some(raw), false).unwrap());
        }
        for raw in ["0", "false", "no", "OFF"] {
            assert!(!parse_bool("x", Some(raw), true).unwrap());
        }
        assert!(parse_bool("x", None, true).unwrap());
        assert!(!parse_bool("x", Some(""), false).unwrap());
        assert!(parse_bool("x", Some("maybe"), false).is_err());
    }

    #[test]
    fn test_parse_page() {
        assert_eq!(parse_page(None).unwrap(), 1);
        assert_eq!(parse_page(Some("3")).unwrap(), 3);
        assert!(parse_page(Some("0")).is_err());
        assert!(parse_page(Some("-2")).is_err());
        assert!(parse_page(Some("two")).is_err());
    }

    #[test]
    fn test_parse_clamped() {
        assert_eq!(parse_clamped("n", None, 20, 0, 500).unwrap(), 20);
        assert_eq!(parse_clamped("n", Some("9999"), 20, 0, 500).unwrap(), 500);
        assert_eq!(parse_clamped("n", Some("-5"), 20, 0, 500).unwrap(), 0);
        assert_eq!(parse_clamped("w", Some("10"), 384, 96, 1024).unwrap(), 96);
        assert!(parse_clamped("n", Some("ten"), 20, 0, 500).is_err());
    }

    #[test]
    fn test_parse_source_and_kind() {
        assert_eq!(parse_source(None).unwrap(), SourceKind::Output);
        assert_eq!(parse_source(Some("input")).unwrap(), SourceKind::Input);
        assert!(parse_source(Some("temp")).is_err());
        assert_eq!(parse_kind(None).unwrap(), MediaKind::All);
        assert!(parse_kind(Some("audio")).is_err());
    }
}

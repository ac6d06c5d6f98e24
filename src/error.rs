//! Centralized error handling for the equipscope pipeline.
//!
//! Every failure the pipeline can surface maps onto one variant of
//! [`EquipError`]. Ingestion failures (`Schema`, `Parse`, `EmptyDataset`)
//! are fatal to that ingestion and leave nothing persisted. `NotFound`
//! covers datasets that are absent or owned by someone else — the two
//! cases are indistinguishable on purpose. `ChartRender` never escapes the
//! chart module: it is logged there and the report simply omits the
//! visualization section. `Render` fails a single report request without
//! touching stored data.
//!
//! ```no_run
//! use equipscope::error::{Result, ResultExt as _};
//! use std::fs;
//!
//! fn read_upload(path: &str) -> Result<Vec<u8>> {
//!     // std::io::Error converts via the From impl, the context helper
//!     // wraps the message the way anyhow's does.
//!     fs::read(path).context("Failed to read upload")
//! }
//! ```

use std::fmt;

/// Main error type for equipscope operations.
#[derive(Debug)]
pub enum EquipError {
    /// Required columns missing from the input header.
    Schema(String),

    /// Malformed tabular data or a non-numeric value in a numeric column.
    Parse(String),

    /// Zero data rows after a successful parse.
    EmptyDataset,

    /// Dataset absent, or not owned by the caller.
    NotFound,

    /// Chart image generation failed (non-fatal, handled inside `chart`).
    ChartRender(String),

    /// Report document assembly failed.
    Render(String),

    /// I/O errors (file operations, directories, etc.)
    Io(std::io::Error),

    /// Storage backend errors other than not-found.
    Storage(String),

    /// Database operation errors.
    Database(String),

    /// Configuration errors.
    Config(String),

    /// Generic error with context.
    Other(String),
}

impl fmt::Display for EquipError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schema(msg) => write!(f, "Schema error: {msg}"),
            Self::Parse(msg) => write!(f, "Parse error: {msg}"),
            Self::EmptyDataset => write!(f, "Dataset contains no data rows"),
            Self::NotFound => write!(f, "Dataset not found"),
            Self::ChartRender(msg) => write!(f, "Chart rendering error: {msg}"),
            Self::Render(msg) => write!(f, "Report rendering error: {msg}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Storage(msg) => write!(f, "Storage error: {msg}"),
            Self::Database(msg) => write!(f, "Database error: {msg}"),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for EquipError {}

impl From<std::io::Error> for EquipError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<polars::error::PolarsError> for EquipError {
    fn from(err: polars::error::PolarsError) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<serde_json::Error> for EquipError {
    fn from(err: serde_json::Error) -> Self {
        Self::Storage(format!("JSON error: {err}"))
    }
}

impl From<sqlx::Error> for EquipError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::NotFound,
            other => Self::Database(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for EquipError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

/// Result type alias for equipscope operations.
pub type Result<T> = std::result::Result<T, EquipError>;

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<EquipError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err: EquipError = e.into();
            // NotFound must stay NotFound so ownership checks don't leak
            // detail through wrapped messages.
            if matches!(err, EquipError::NotFound) {
                return err;
            }
            EquipError::Other(format!("{}: {}", msg.into(), err))
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err: EquipError = e.into();
            if matches!(err, EquipError::NotFound) {
                return err;
            }
            EquipError::Other(format!("{}: {}", f(), err))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EquipError::Schema("missing columns".to_owned());
        assert_eq!(err.to_string(), "Schema error: missing columns");
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: EquipError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, EquipError::NotFound));
    }

    #[test]
    fn test_result_context() {
        let result: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "file.txt",
        ));

        let result: Result<()> = result.context("Failed to read file");
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read file")
        );
    }

    #[test]
    fn test_context_preserves_not_found() {
        let result: Result<()> = Err(EquipError::NotFound);
        let wrapped = result.context("while fetching");
        assert!(matches!(wrapped, Err(EquipError::NotFound)));
    }
}

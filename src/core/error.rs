use std::path::PathBuf;
use thiserror::Error;

use crate::core::classfile::ClassFormatError;

/// Central error type for the module universe.
/// Every module returns `Result<T, UniverseError>`.
#[derive(Debug, Error)]
pub enum UniverseError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Archive ─────────────────────────────────────────
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    // ── Class files ─────────────────────────────────────
    #[error("Class file error: {0}")]
    ClassFormat(#[from] ClassFormatError),

    // ── Manifest ────────────────────────────────────────
    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("Invalid module dependency: {0}")]
    InvalidDependency(String),

    // ── XML ─────────────────────────────────────────────
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::DeError),

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Universe ────────────────────────────────────────
    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    #[error("Platform not found: {0}")]
    PlatformNotFound(String),
}

/// Convenience alias used throughout the crate.
pub type UniverseResult<T> = Result<T, UniverseError>;

impl From<std::io::Error> for UniverseError {
    fn from(source: std::io::Error) -> Self {
        UniverseError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

impl UniverseError {
    /// Attach a path to an IO failure.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        UniverseError::Io {
            path: path.into(),
            source,
        }
    }
}

// ── Serialization for command responses ─────────────────
// Command results are printed as JSON, errors included.
impl serde::Serialize for UniverseError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

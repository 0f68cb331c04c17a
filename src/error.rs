//! Error taxonomy for the triage engine
//!
//! Configuration problems are fatal and surface before a scan starts.
//! File access problems are scoped to a single file and end up as
//! [`FileFailure`](crate::scanner::FileFailure) entries in the scan result.
//! Invalid byte sequences are never an error: the reader replaces them.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading rule or ignore configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported file format for {path} (expected .json, .yaml or .yml)")]
    UnsupportedFormat { path: PathBuf },

    #[error("Invalid content in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Entry {index} in {path} is malformed: {reason}")]
    MalformedEntry {
        path: PathBuf,
        index: usize,
        reason: String,
    },

    #[error("Entry {index} in {path} is missing the '{field}' field")]
    MissingField {
        path: PathBuf,
        index: usize,
        field: &'static str,
    },

    #[error("Unknown severity '{value}' (expected ERROR, FATAL or WARNING)")]
    InvalidSeverity { value: String },

    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid exclude glob '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

/// A single file could not be opened or read
#[derive(Debug, Error)]
pub enum FileAccessError {
    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {path} at line {line}: {source}")]
    Read {
        path: PathBuf,
        line: usize,
        #[source]
        source: std::io::Error,
    },
}

impl FileAccessError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            FileAccessError::Open { path, .. } | FileAccessError::Read { path, .. } => path,
        }
    }
}

/// Errors returned by the scan coordinator entry points
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("A scan is already running")]
    AlreadyScanning,

    #[error("Worker thread panicked during the scan")]
    WorkerPanic,

    #[error("Failed to spawn scan thread: {0}")]
    Spawn(#[source] std::io::Error),
}

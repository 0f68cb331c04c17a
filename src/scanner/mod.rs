//! Log classification, normalization and aggregation engine
//!
//! Data flows one way:
//!
//! ```text
//! ScanCoordinator ──▶ FileProcessor (per file, on the pool)
//!        │                 └─▶ LogReader ─▶ LineClassifier ─▶ MessageNormalizer
//!        ▼
//!   Aggregator (coordinator thread only) ──▶ ScanResult
//! ```

pub mod aggregate;
pub mod classify;
pub mod core;
pub mod directory;
pub mod file;
pub mod identity;
pub mod normalize;
pub mod progress;
pub mod reader;
pub mod types;

pub use aggregate::Aggregator;
pub use classify::{ClassifiedLine, LineClassifier, LineOutcome};
pub use core::{ScanCoordinator, ScanHandle, ScanOptions, ScanRequest, ScanState};
pub use directory::FileDiscovery;
pub use file::{ContentFilter, CountEntry, FileProcessor, PerFileCounts, ScoreboardFilter};
pub use identity::PathMetadataExtractor;
pub use normalize::{MessageNormalizer, normalize};
pub use progress::{CancellationToken, ScanEvent, ScanReporter};
pub use reader::{LineStream, LogReader};
pub use types::{
    AggregateKey, AggregateRecord, FileFailure, LogKind, Occurrence, RawLine, ScanResult,
    ScanStats, ScanStatus, SeverityTotals, TestIdentity,
};

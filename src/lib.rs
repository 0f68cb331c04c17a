//! # logtriage - triage for simulator logs
//!
//! Scans simulation and compile logs (plain or gzip-compressed), classifies
//! each line as ERROR, FATAL or WARNING with an ordered rule list, strips
//! run-specific noise from messages and counts identical messages per test.
//!
//! ```no_run
//! use logtriage::rules::{IgnoreSet, RuleSet};
//! use logtriage::scanner::{ScanCoordinator, ScanReporter, ScanRequest};
//! use std::sync::Arc;
//!
//! # fn main() -> anyhow::Result<()> {
//! let request = ScanRequest::new(Arc::new(RuleSet::builtin()?), Arc::new(IgnoreSet::empty()))
//!     .with_root("regressions/");
//! let result = ScanCoordinator::new().run(request, &ScanReporter::silent())?;
//! println!("{} errors", result.totals.error);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod parallel;
pub mod report;
pub mod rules;
pub mod scanner;

pub use cli::{Cli, Output};
pub use config::TriageConfig;
pub use error::{ConfigError, FileAccessError, ScanError};

/// Result type alias for logtriage operations
pub type Result<T> = anyhow::Result<T>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

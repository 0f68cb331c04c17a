//! Configuration for logtriage
//!
//! Settings are layered with figment: embedded defaults, user and project
//! files in TOML, JSON or YAML, then `LOGTRIAGE_` environment variables.
//! Command-line flags are applied on top by the CLI.

pub mod core;


pub use core::DEFAULT_CONFIG;

use crate::error::ConfigError;
use crate::parallel::ExecutionStrategy;
use crate::rules::{IgnoreSet, RuleSet};
use crate::scanner::{FileDiscovery, ScanOptions};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Fully merged configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriageConfig {
    pub rules: RulesConfig,
    pub scan: ScanConfig,
    pub discovery: DiscoveryConfig,
    pub identity: IdentityConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Classification rule file; the built-in set is used when unset
    pub file: Option<PathBuf>,
    pub ignore_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub include_simulate: bool,
    pub include_compile: bool,
    pub include_scoreboard: bool,
    pub scoreboard_marker: String,
    pub workers: usize,
    pub thread_percentage: u8,
    pub collapse_integers: bool,
    pub memory_warning_keys: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            include_simulate: true,
            include_compile: true,
            include_scoreboard: false,
            scoreboard_marker: "sbd_compare".to_string(),
            workers: 1,
            thread_percentage: 75,
            collapse_integers: false,
            memory_warning_keys: 500_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub prefixes: Vec<String>,
    pub extensions: Vec<String>,
    pub exclude_paths: Vec<String>,
    pub follow_symlinks: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            prefixes: vec!["simulate.log".to_string(), "compile.log".to_string()],
            extensions: vec![".log".to_string(), ".log.gz".to_string()],
            exclude_paths: Vec::new(),
            follow_symlinks: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub anchor: String,
    pub path_hint_prefix: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            anchor: "max".to_string(),
            path_hint_prefix: "LOG PATH:".to_string(),
        }
    }
}

impl TriageConfig {
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            include_simulate: self.scan.include_simulate,
            include_compile: self.scan.include_compile,
            include_scoreboard: self.scan.include_scoreboard,
            scoreboard_marker: self.scan.scoreboard_marker.clone(),
            collapse_integers: self.scan.collapse_integers,
            strategy: ExecutionStrategy::from_workers(self.scan.workers, self.scan.thread_percentage),
            memory_warning_keys: self.scan.memory_warning_keys,
            anchor: self.identity.anchor.clone(),
            path_hint_prefix: self.identity.path_hint_prefix.clone(),
        }
    }

    pub fn file_discovery(&self) -> Result<FileDiscovery, ConfigError> {
        Ok(FileDiscovery::new(
            self.discovery.prefixes.clone(),
            self.discovery.extensions.clone(),
        )
        .with_excludes(&self.discovery.exclude_paths)?
        .follow_symlinks(self.discovery.follow_symlinks))
    }

    pub fn load_rules(&self) -> Result<RuleSet, ConfigError> {
        RuleSet::load(self.rules.file.as_deref())
    }

    pub fn load_ignore(&self) -> Result<IgnoreSet, ConfigError> {
        IgnoreSet::load(self.rules.ignore_file.as_deref())
    }
}

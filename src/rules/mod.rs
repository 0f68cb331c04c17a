//! Classification and suppression rules
//!
//! Rules are loaded once per scan and shared read-only between workers.
//! Both rule kinds can come from a JSON or YAML file; classification rules
//! fall back to a built-in vendor set when no file is configured.

mod ignore;
mod loader;
mod patterns;

pub use ignore::{IgnoreRule, IgnoreSet};
pub use patterns::{ClassificationRule, RuleMatch, RuleSet};

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity assigned to a classified log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Error,
    Fatal,
    Warning,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Error, Severity::Fatal, Severity::Warning];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
            Severity::Warning => "WARNING",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ERROR" => Ok(Severity::Error),
            "FATAL" => Ok(Severity::Fatal),
            "WARNING" => Ok(Severity::Warning),
            _ => Err(ConfigError::InvalidSeverity {
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_parsing_is_case_insensitive() {
        assert_eq!("error".parse::<Severity>().unwrap(), Severity::Error);
        assert_eq!(" Fatal ".parse::<Severity>().unwrap(), Severity::Fatal);
        assert_eq!("WARNING".parse::<Severity>().unwrap(), Severity::Warning);
    }

    #[test]
    fn test_unknown_severity_is_config_error() {
        let err = "INFO".parse::<Severity>().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSeverity { .. }));
    }

    #[test]
    fn test_severity_serializes_uppercase() {
        let json = serde_json::to_string(&Severity::Warning).unwrap();
        assert_eq!(json, "\"WARNING\"");
    }
}

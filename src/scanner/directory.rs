use super::types::LogKind;
use crate::error::ConfigError;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Recursive discovery of candidate log files under a root directory.
///
/// A file is a candidate when its name starts with one of the configured
/// prefixes (`simulate.log`, `compile.log`), ends with one of the configured
/// extensions (`.log`, `.log.gz`), its log kind is enabled, and no exclusion
/// glob matches its path.
#[derive(Debug, Clone)]
pub struct FileDiscovery {
    prefixes: Vec<String>,
    extensions: Vec<String>,
    excludes: GlobSet,
    follow_symlinks: bool,
    include_simulate: bool,
    include_compile: bool,
}

impl Default for FileDiscovery {
    fn default() -> Self {
        Self {
            prefixes: vec!["simulate.log".to_string(), "compile.log".to_string()],
            extensions: vec![".log".to_string(), ".log.gz".to_string()],
            excludes: GlobSet::empty(),
            follow_symlinks: false,
            include_simulate: true,
            include_compile: true,
        }
    }
}

impl FileDiscovery {
    pub fn new(prefixes: Vec<String>, extensions: Vec<String>) -> Self {
        Self {
            prefixes,
            extensions,
            ..Self::default()
        }
    }

    pub fn with_excludes(mut self, patterns: &[String]) -> Result<Self, ConfigError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern).map_err(|source| ConfigError::InvalidGlob {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }
        self.excludes = builder.build().map_err(|source| ConfigError::InvalidGlob {
            pattern: patterns.join(", "),
            source,
        })?;
        Ok(self)
    }

    pub fn with_kinds(mut self, include_simulate: bool, include_compile: bool) -> Self {
        self.include_simulate = include_simulate;
        self.include_compile = include_compile;
        self
    }

    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Whether a log kind is enabled
    pub fn includes(&self, kind: LogKind) -> bool {
        match kind {
            LogKind::Simulate => self.include_simulate,
            LogKind::Compile => self.include_compile,
        }
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        self.excludes.is_match(path)
    }

    /// Name and exclusion checks only; the path is not touched
    pub fn is_candidate(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().map(|n| n.to_string_lossy()) else {
            return false;
        };

        let prefix_ok = self
            .prefixes
            .iter()
            .filter(|prefix| self.includes(LogKind::from_path(Path::new(prefix.as_str()))))
            .any(|prefix| name.starts_with(prefix.as_str()));
        let extension_ok = self.extensions.iter().any(|ext| name.ends_with(ext.as_str()));

        prefix_ok && extension_ok && !self.is_excluded(path)
    }

    /// Walk `root` and return candidate files in sorted order.
    ///
    /// A missing or unreadable root is an error; unreadable entries below
    /// the root are logged and skipped.
    pub fn discover(&self, root: &Path) -> std::io::Result<Vec<PathBuf>> {
        std::fs::read_dir(root)?;

        let walker = WalkBuilder::new(root)
            .standard_filters(false)
            .follow_links(self.follow_symlinks)
            .sort_by_file_path(|a, b| a.cmp(b))
            .build();

        let mut files = Vec::new();
        for entry in walker {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_some_and(|ft| ft.is_file())
                        && self.is_candidate(entry.path())
                    {
                        files.push(entry.into_path());
                    }
                }
                Err(e) => {
                    tracing::warn!("Walk error under {}: {}", root.display(), e);
                }
            }
        }

        tracing::debug!("Discovered {} log files under {}", files.len(), root.display());
        Ok(files)
    }
}

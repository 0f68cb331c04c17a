use super::TriageConfig;
use anyhow::{Context, Result, bail};
use figment::Figment;
use figment::providers::{Env, Format, Json, Toml, Yaml};
use std::path::Path;

// Embed the default config at compile time
pub const DEFAULT_CONFIG: &str = include_str!("../../default-config.toml");

impl TriageConfig {
    /// Load the layered configuration.
    ///
    /// An explicit `custom_config` replaces the user and project files; it
    /// must exist and its format is chosen by extension.
    pub fn load(custom_config: Option<&Path>) -> Result<Self> {
        Self::figment(custom_config)?
            .extract()
            .context("Failed to load configuration")
    }

    pub fn figment(custom_config: Option<&Path>) -> Result<Figment> {
        tracing::trace!("CONFIG LOAD: Starting");

        let mut figment = Figment::new().merge(Toml::string(DEFAULT_CONFIG));

        if let Some(custom_path) = custom_config {
            if !custom_path.is_file() {
                bail!("Config file not found: {}", custom_path.display());
            }
            figment = match extension(custom_path).as_deref() {
                Some("toml") => figment.merge(Toml::file(custom_path)),
                Some("json") => figment.merge(Json::file(custom_path)),
                Some("yaml") | Some("yml") => figment.merge(Yaml::file(custom_path)),
                _ => bail!(
                    "Unsupported config format: {} (expected .toml, .json, .yaml or .yml)",
                    custom_path.display()
                ),
            };
        } else {
            let user = Self::user_config_base_path();
            figment = figment
                // User config - support multiple formats
                .merge(Toml::file(format!("{user}.toml")))
                .merge(Json::file(format!("{user}.json")))
                .merge(Yaml::file(format!("{user}.yaml")))
                .merge(Yaml::file(format!("{user}.yml")))
                // Project config - support multiple formats
                .merge(Toml::file("logtriage.toml"))
                .merge(Json::file("logtriage.json"))
                .merge(Yaml::file("logtriage.yaml"))
                .merge(Yaml::file("logtriage.yml"));
        }

        // Environment variables always have highest priority
        Ok(figment.merge(Env::prefixed("LOGTRIAGE_").split("__")))
    }

    fn user_config_base_path() -> String {
        match std::env::var("HOME") {
            Ok(home) => format!("{}/.config/logtriage/config", home),
            Err(_) => "~/.config/logtriage/config".to_string(),
        }
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

use crate::config::TriageConfig;
use anyhow::Result;
use clap::{Args, Subcommand, ValueEnum};
use std::path::Path;
use std::process::ExitCode;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Display current merged configuration
    Show {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = ConfigFormat::Toml)]
        format: ConfigFormat,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    Toml,
    Json,
    Yaml,
}

pub async fn execute(args: ConfigArgs, custom_config: Option<&Path>) -> Result<ExitCode> {
    match args.command {
        ConfigCommand::Show { format } => {
            let config = TriageConfig::load(custom_config)?;
            print!("{}", render(&config, format)?);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn render(config: &TriageConfig, format: ConfigFormat) -> Result<String> {
    Ok(match format {
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Json => format!("{}\n", serde_json::to_string_pretty(config)?),
        ConfigFormat::Yaml => serde_yml::to_string(config)?,
    })
}

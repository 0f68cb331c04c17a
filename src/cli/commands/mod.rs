use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

pub mod config;
pub mod rules;
pub mod scan;

#[derive(Parser)]
#[command(
    name = "logtriage",
    version = env!("CARGO_PKG_VERSION"),
    about = "Classify, normalize and aggregate simulator log messages",
    long_about = "logtriage scans simulation and compile logs (plain or gzip), classifies \
                  lines as ERROR, FATAL or WARNING with ordered rules, normalizes away \
                  timestamps and FIFO details, and counts identical messages per test."
)]
pub struct Cli {
    /// Increase verbosity (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Use custom configuration file
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan log files or directories and report aggregated messages
    Scan(scan::ScanArgs),
    /// Inspect and validate classification and ignore rules
    Rules(rules::RulesArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    pub async fn run(self) -> Result<ExitCode> {
        setup_logging(self.verbose, self.quiet);

        let output = crate::cli::Output::new(self.verbose > 0, self.quiet);
        let custom_config = self.config.as_deref();

        match self.command {
            Some(Commands::Scan(args)) => scan::execute(args, &output, custom_config).await,
            Some(Commands::Rules(args)) => rules::execute(args, &output, custom_config).await,
            Some(Commands::Config(args)) => config::execute(args, custom_config).await,
            None => {
                Cli::command().print_help()?;
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

fn setup_logging(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    // Keep the walker crates quiet below -vvv
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => tracing_subscriber::EnvFilter::new("warn"),
        1 => tracing_subscriber::EnvFilter::new("info,ignore=warn,globset=warn"),
        2 => tracing_subscriber::EnvFilter::new("debug,ignore=warn,globset=warn"),
        _ => tracing_subscriber::EnvFilter::new("trace"),
    });

    // stdout carries report data
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

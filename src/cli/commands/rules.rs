use crate::cli::Output;
use crate::config::TriageConfig;
use crate::rules::{IgnoreSet, RuleSet};
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use console::style;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Args)]
pub struct RulesArgs {
    #[command(subcommand)]
    pub command: RulesCommand,
}

#[derive(Subcommand)]
pub enum RulesCommand {
    /// Print the effective classification rules in evaluation order
    List {
        /// Classification rule file (JSON or YAML)
        #[arg(long, value_name = "FILE")]
        rules: Option<PathBuf>,
    },
    /// Load and validate rule and ignore files
    Check {
        /// Classification rule file (JSON or YAML)
        #[arg(long, value_name = "FILE")]
        rules: Option<PathBuf>,

        /// Ignore pattern file (JSON or YAML)
        #[arg(long, value_name = "FILE")]
        ignore: Option<PathBuf>,
    },
}

pub async fn execute(args: RulesArgs, output: &Output, custom_config: Option<&Path>) -> Result<ExitCode> {
    let config = TriageConfig::load(custom_config)?;

    match args.command {
        RulesCommand::List { rules } => {
            let file = rules.or(config.rules.file);
            let rule_set = load_rules(file.as_deref())?;

            output.info(&format!(
                "{} rules from {}",
                rule_set.len(),
                source_label(file.as_deref())
            ));
            for (index, rule) in rule_set.rules().iter().enumerate() {
                println!(
                    "{:>3}. {:<8} {}",
                    index + 1,
                    rule.severity.as_str(),
                    rule.matcher.as_str()
                );
                if let Some(strip) = &rule.strip {
                    println!("     {}", style(format!("strip: {}", strip.as_str())).dim());
                }
            }
        }
        RulesCommand::Check { rules, ignore } => {
            let rules_file = rules.or(config.rules.file);
            let ignore_file = ignore.or(config.rules.ignore_file);

            let rule_set = load_rules(rules_file.as_deref())?;
            let ignore_set = IgnoreSet::load(ignore_file.as_deref()).with_context(|| {
                format!("Invalid ignore patterns in {}", source_label(ignore_file.as_deref()))
            })?;

            for rule in ignore_set.rules() {
                output.verbose(&format!("ignore: {}", rule.pattern.as_str()));
            }
            output.success(&format!(
                "{} classification rules ({}) and {} ignore patterns are valid",
                rule_set.len(),
                source_label(rules_file.as_deref()),
                ignore_set.len()
            ));
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn load_rules(file: Option<&Path>) -> Result<RuleSet> {
    RuleSet::load(file)
        .with_context(|| format!("Invalid classification rules in {}", source_label(file)))
}

fn source_label(file: Option<&Path>) -> String {
    match file {
        Some(path) => path.display().to_string(),
        None => "built-in set".to_string(),
    }
}

//! CLI module
//!
//! This module defines the command-line interface using clap and implements
//! the command execution logic.

use crate::{Config, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod commands;
pub mod output;

/// Moore machine runner and analyzer
#[derive(Parser, Debug)]
#[command(name = "moore-fsm")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, env = "MOORE_FSM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check that every (state, symbol) pair has a transition
    Analyze {
        /// Path to machine definition file
        definition: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Run the machine, reading input symbols from stdin
    Run {
        /// Path to machine definition file
        definition: PathBuf,

        /// Delay before the first tick in milliseconds (overrides config)
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Pause between ticks in milliseconds (overrides config)
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Latency before pending input is consumed in milliseconds (overrides config)
        #[arg(long)]
        consume_delay_ms: Option<u64>,

        /// Stop after this many seconds instead of waiting for Ctrl+C
        #[arg(long)]
        duration_secs: Option<u64>,
    },

    /// Validate a machine definition file
    Validate {
        /// Path to machine definition file
        definition: PathBuf,
    },

    /// Export the machine as a Graphviz DOT graph
    Graph {
        /// Path to machine definition file
        definition: PathBuf,

        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

/// Output format types
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human readable report
    Text,
    /// JSON output
    Json,
}

/// Execute the CLI command
pub async fn execute(args: Cli, config: Config) -> Result<()> {
    match args.command {
        Commands::Analyze { definition, output } => commands::analyze::execute(definition, output),
        Commands::Run { .. } => commands::run::execute(args, config).await,
        Commands::Validate { definition } => commands::validate::execute(definition),
        Commands::Graph { definition, out } => commands::graph::execute(definition, out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["moore-fsm", "analyze", "turnstile.toml", "--output", "json"])
            .unwrap();

        match cli.command {
            Commands::Analyze { definition, output } => {
                assert_eq!(definition, PathBuf::from("turnstile.toml"));
                assert_eq!(output, OutputFormat::Json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_run_overrides() {
        let cli = Cli::try_parse_from([
            "moore-fsm",
            "--config",
            "custom.toml",
            "run",
            "turnstile.toml",
            "--interval-ms",
            "250",
            "--duration-secs",
            "5",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        match cli.command {
            Commands::Run {
                interval_ms,
                delay_ms,
                duration_secs,
                ..
            } => {
                assert_eq!(interval_ms, Some(250));
                assert_eq!(delay_ms, None);
                assert_eq!(duration_secs, Some(5));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_missing_definition_rejected() {
        assert!(Cli::try_parse_from(["moore-fsm", "validate"]).is_err());
    }
}

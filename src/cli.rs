//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use env_logger::Env;

use crate::commands;
use layer_stack::output::OutputConfig;

/// Layer Stack - Merge layered directory trees and build image packages
#[derive(Parser, Debug)]
#[command(name = "layer-stack")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level. RUST_LOG overrides this when set.
    #[arg(
        long,
        global = true,
        value_name = "LEVEL",
        value_enum,
        default_value = "warn"
    )]
    log_level: LogLevel,
}

/// Log levels accepted by `--log-level`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Merge layer directories into one output directory
    Merge(commands::merge::MergeArgs),

    /// Build an image building package from image layers
    Build(commands::build::BuildArgs),

    /// List the files a merge of the layers would produce
    Ls(commands::ls::LsArgs),

    /// Create a new image layer folder
    New(commands::new::NewArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        // a second init (e.g. in tests) keeps the first logger
        let _ = env_logger::Builder::from_env(
            Env::default().default_filter_or(self.log_level.as_filter()),
        )
        .format_timestamp(None)
        .try_init();

        let output = OutputConfig::from_env_and_flag(&self.color);

        match self.command {
            Commands::Merge(args) => commands::merge::execute(args, &output),
            Commands::Build(args) => commands::build::execute(args, &output),
            Commands::Ls(args) => commands::ls::execute(args, &output),
            Commands::New(args) => commands::new::execute(args, &output),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Gymprobe: UI regression suite for the Gym System web application
#[derive(Parser, Debug)]
#[command(name = "gymprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the scenario suite
    Run(RunArgs),

    /// List the scenarios in the suite
    List(ListArgs),

    /// Show the effective configuration
    Config(ConfigArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Only run scenarios whose id or title contains this text
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Harness configuration file (YAML)
    #[arg(short, long, env = "GYMPROBE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the application base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Run against the in-memory Gym System instead of Chromium
    #[arg(long)]
    pub simulate: bool,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Stop at the first failing scenario
    #[arg(long)]
    pub fail_fast: bool,

    /// Write a JSON report to this file
    #[arg(short = 'o', long)]
    pub report: Option<PathBuf>,
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Only list scenarios whose id or title contains this text
    #[arg(short, long)]
    pub filter: Option<String>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Harness configuration file (YAML)
    #[arg(short, long, env = "GYMPROBE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Color argument
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "gantry", version, about = "Plate-placement gantry station")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/gantry.toml")]
    pub config: PathBuf,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the placement workflow
    Run {
        /// Override the scanned plate-target sequence ("5432" or "5,4,3,2")
        #[arg(long, value_name = "SEQ")]
        targets: Option<String>,
        /// Accept the camera feed on a TCP socket instead of stdin
        #[arg(long, value_name = "ADDR")]
        listen: Option<String>,
        /// Print a JSON placement summary on exit
        #[arg(long, action = ArgAction::SetTrue)]
        summary: bool,
    },
    /// Quick health check (simulated peripherals assemble and home)
    SelfCheck,
}

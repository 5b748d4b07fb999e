//! CLI interface for quote-stream
//!
//! Provides subcommands for:
//! - `stream`: Run one polling session
//! - `config`: Show the effective configuration

mod stream;

pub use stream::StreamArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "quote-stream")]
#[command(about = "Poll live quotes and feed them into a deduplicated aggregation sink")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one polling session
    Stream(StreamArgs),
    /// Show the effective configuration
    Config,
}

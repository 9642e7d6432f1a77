//! CLI argument definitions for udplog-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// udplog ingestion daemon.
///
/// Receives framed log datagrams over UDP, validates and normalizes them,
/// and writes the resulting events to the configured output.
#[derive(Parser, Debug)]
#[command(name = "udplog-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to udplog.toml configuration file.
    #[arg(short, long, default_value = "/etc/udplog/udplog.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Validate the configuration, and the schema files when json validation is enabled, then exit.
    #[arg(long)]
    pub validate: bool,
}

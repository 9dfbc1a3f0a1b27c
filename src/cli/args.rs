//! Command-line argument parsing for the DTS client
//!
//! This module defines the CLI structure using clap derive macros, covering
//! database discovery, file search, metadata lookup, the transfer lifecycle,
//! credential management, and configuration.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde_json::Value;

/// dts - search DTS databases and move files between them
#[derive(Parser, Debug)]
#[command(
    name = "dts",
    version,
    about = "Search and transfer files with the Data Transfer System",
    long_about = "A client for the Data Transfer System (DTS).
Lists databases, searches them for files, fetches file metadata, and submits,
monitors and cancels transfers between databases."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug, Default)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// DTS server root URL (overrides config and DTS_SERVER)
    #[arg(long, global = true, value_name = "URL")]
    pub server: Option<String>,

    /// DTS server port
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// ORCID of the requesting user
    #[arg(long, global = true)]
    pub orcid: Option<String>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List databases known to the server
    Databases,

    /// Search a database for files
    Search(SearchArgs),

    /// Fetch metadata for files by identifier
    Metadata(MetadataArgs),

    /// Submit, monitor and cancel transfers
    Transfer(TransferArgs),

    /// Manage the API key
    Auth(AuthArgs),

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Arguments for the search command
#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Database to search (e.g. "jdp")
    #[arg(short, long)]
    pub database: String,

    /// Search query, sent exactly as typed
    pub query: String,

    /// Only staged or unstaged files
    #[arg(short, long)]
    pub status: Option<String>,

    /// Index of the first result
    #[arg(long, allow_negative_numbers = true)]
    pub offset: Option<i64>,

    /// Maximum number of results
    #[arg(short, long, allow_negative_numbers = true)]
    pub limit: Option<i64>,

    /// Database-specific parameter as key=value (repeatable)
    #[arg(long = "specific", value_name = "KEY=VALUE", value_parser = parse_specific)]
    pub specific: Vec<(String, Value)>,

    /// Print the raw JSON of each resource
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the metadata command
#[derive(Args, Debug, Clone)]
pub struct MetadataArgs {
    /// Database holding the files
    #[arg(short, long)]
    pub database: String,

    /// File identifiers (e.g. "JDP:57f9e03f7ded5e3135bc069e")
    #[arg(required = true)]
    pub ids: Vec<String>,

    /// Index of the first result
    #[arg(long, allow_negative_numbers = true)]
    pub offset: Option<i64>,

    /// Maximum number of results
    #[arg(short, long, allow_negative_numbers = true)]
    pub limit: Option<i64>,

    /// Print the raw JSON of each resource
    #[arg(long)]
    pub json: bool,
}

/// Arguments for transfer management
#[derive(Args, Debug)]
pub struct TransferArgs {
    #[command(subcommand)]
    pub action: TransferAction,
}

/// Transfer lifecycle actions
#[derive(Subcommand, Debug)]
pub enum TransferAction {
    /// Start a transfer of files from one database to another
    Submit {
        /// Source database
        #[arg(short, long)]
        source: String,

        /// Destination database
        #[arg(short, long)]
        destination: String,

        /// File identifiers in the source database
        #[arg(required = true)]
        file_ids: Vec<String>,

        /// Human-readable description of the transfer
        #[arg(long)]
        description: Option<String>,

        /// Machine-readable instructions as a JSON object
        #[arg(long, value_parser = parse_json_object)]
        instructions: Option<Value>,

        /// Seconds to wait for the submission request
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Show the status of a transfer
    Status {
        /// Transfer UUID
        id: String,

        /// Keep polling until the transfer finishes
        #[arg(short, long)]
        watch: bool,

        /// Milliseconds between polls when watching
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Ask the server to cancel a transfer
    Cancel {
        /// Transfer UUID
        id: String,
    },
}

/// Arguments for authentication management
#[derive(Args, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub action: AuthAction,
}

/// Authentication actions
#[derive(Subcommand, Debug)]
pub enum AuthAction {
    /// Store the KBase developer token in .env
    Setup {
        /// Replace an existing key without asking
        #[arg(short, long)]
        force: bool,
    },

    /// Verify the current key against the server
    Verify,

    /// Show authentication status
    Status,
}

/// Arguments for configuration management
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a default config file
    Init {
        /// Where to write it (defaults to the user config directory)
        #[arg(value_name = "FILE")]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the logging level based on global arguments
    ///
    /// `None` means no flag was given and the configured level applies.
    pub fn log_level(&self) -> Option<tracing::Level> {
        if self.global.quiet {
            Some(tracing::Level::ERROR)
        } else if self.global.very_verbose {
            Some(tracing::Level::DEBUG)
        } else if self.global.verbose {
            Some(tracing::Level::INFO)
        } else {
            None
        }
    }
}

/// Parses `key=value`, reading the value as JSON and falling back to a string
pub fn parse_specific(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{}'", raw));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

fn parse_json_object(raw: &str) -> Result<Value, String> {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(_) => Err("instructions must be a JSON object".to_string()),
        Err(e) => Err(format!("invalid JSON: {}", e)),
    }
}

//! Command-line interface components
//!
//! This module contains CLI-specific code for the `dts` binary, including
//! argument parsing, command handlers, and the transfer progress display.

pub mod args;
pub mod commands;
pub mod progress;

pub use args::{
    AuthAction, AuthArgs, Cli, Commands, ConfigAction, ConfigArgs, GlobalArgs, MetadataArgs,
    SearchArgs, TransferAction, TransferArgs,
};
pub use commands::{
    handle_auth, handle_config, handle_databases, handle_metadata, handle_search,
    handle_transfer, Session,
};
pub use progress::{watch_transfer, ProgressConfig, TransferProgress};

//! DTS Client Library
//!
//! A Rust client for the Data Transfer System (DTS), a federated service that
//! searches file-hosting databases and moves files between them. Provides
//! database discovery, file search, metadata lookup, and a submit / poll /
//! cancel transfer lifecycle over an authenticated HTTP API.

pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};

//! Prelude module for the DTS client library
//!
//! Re-exports the items needed for typical library use with a single
//! `use dts_client::prelude::*;` statement.
//!
//! # Usage
//!
//! ```rust,no_run
//! use dts_client::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let key = ApiKey::from_env()?;
//!     let mut client = DtsClient::new();
//!     client.connect(&key, DEFAULT_SERVER, None).await?;
//!
//!     for db in client.list_databases().await? {
//!         println!("{}: {}", db.id, db.name);
//!     }
//!
//!     // Service failures become an empty list; bad arguments still fail
//!     let request = SearchRequest::new("jdp", "0000-0002-1825-0097", "prochlorococcus");
//!     let files = client.search(&request).await.or_empty("search")?;
//!     println!("{} files", files.len());
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, Result};

// Client and request/response types
pub use crate::app::{
    ApiKey, ClientConfig, ConnectionContext, DatabaseDescriptor, DtsClient, FileResource,
    MetadataRequest, Query, Recover, SearchRequest, StatusFilter, TransferHandle, TransferRequest,
    TransferStatus, TransferStatusRecord,
};

// Authentication functions
pub use crate::auth::{check_credentials, get_auth_status, verify_credentials, AuthStatus};

// Commonly used constants
pub use crate::constants::{API_VERSION, DEFAULT_SERVER, ENV_API_KEY, USER_AGENT};

// Common external crate re-exports for convenience
pub use tokio;

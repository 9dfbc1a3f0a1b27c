//! Core client logic for the Data Transfer System
//!
//! This module contains the HTTP client, request validation, the data models
//! returned by the service, and the failure classification policy.
//!
//! # Examples
//!
//! ```rust,no_run
//! use dts_client::app::{ApiKey, DtsClient, SearchRequest, TransferRequest};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let key = ApiKey::from_env()?;
//! let mut client = DtsClient::new();
//! client.connect(&key, "https://lb-dts.staging.kbase.us", None).await?;
//!
//! // Search the JGI Data Portal for files related to an IMG taxon OID
//! let request = SearchRequest::new("jdp", "0000-0002-1825-0097", 2708742931_u64)
//!     .specific(json!({"f": "img_taxon_oid", "extra": "project_id"}));
//! let files = client.search(&request).await?;
//!
//! let ids: Vec<String> = files.iter().map(|f| f.id.clone()).collect();
//! let transfer = TransferRequest::new("0000-0002-1825-0097", ids, "jdp", "kbase");
//! let handle = client.submit_transfer(&transfer).await?;
//! println!("{}", client.poll_status(handle).await?);
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod client;
pub mod models;
pub mod request;

// Re-export main public API
pub use classify::{classify, Disposition, Recover};
pub use client::{ApiKey, ClientConfig, ConnectionContext, DtsClient};
pub use models::{
    DatabaseDescriptor, FileResource, ParamMap, TransferHandle, TransferStatus,
    TransferStatusRecord,
};
pub use request::{MetadataRequest, Query, SearchRequest, StatusFilter, TransferRequest};

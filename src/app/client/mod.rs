//! HTTP client for the Data Transfer System
//!
//! [`DtsClient`] exposes database listing, file search, metadata lookup, and
//! the transfer lifecycle (submit, poll, cancel). Each call validates its
//! arguments, makes exactly one authorized round trip, and maps the JSON reply
//! into domain records.
//!
//! The module is organized into specialized components:
//! - `auth`: API key handling and the `Authorization` header
//! - `config`: HTTP client configuration and building
//! - `connection`: the handshake and the resulting connection context
//! - `http`: single-shot requests with status checking and failure logging

use std::fmt;

use tracing::{debug, info};

use crate::app::models::{
    DatabaseDescriptor, FileResource, ResourceList, TransferCreated, TransferHandle,
    TransferStatusRecord,
};
use crate::app::request::{to_query_pairs, MetadataRequest, SearchRequest, TransferRequest};
use crate::constants::api;
use crate::errors::{Result, ServiceError, UsageError};

// Module declarations
pub mod auth;
pub mod config;
pub mod connection;
pub mod http;

pub use auth::{ApiKey, Authenticator};
pub use config::ClientConfig;
pub use connection::{ConnectionContext, Handshake};

use http::HttpHandler;

/// Client for searching DTS databases and managing file transfers
///
/// A client starts disconnected; [`connect`](Self::connect) performs the
/// handshake and stores the resulting [`ConnectionContext`]. Every lifecycle
/// operation fails with [`UsageError::NotConnected`] until then.
pub struct DtsClient {
    config: ClientConfig,
    connection: Option<Connected>,
}

struct Connected {
    http: HttpHandler,
    context: ConnectionContext,
}

impl DtsClient {
    /// Creates a disconnected client with default HTTP settings
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// Creates a disconnected client with custom HTTP settings
    pub fn with_config(config: ClientConfig) -> Self {
        Self {
            config,
            connection: None,
        }
    }

    /// Creates a client and connects it in one step
    ///
    /// # Errors
    ///
    /// Same as [`connect`](Self::connect).
    pub async fn connect_with(
        config: ClientConfig,
        api_key: &ApiKey,
        server: &str,
        port: Option<u16>,
    ) -> Result<Self> {
        let mut client = Self::with_config(config);
        client.connect(api_key, server, port).await?;
        Ok(client)
    }

    /// Connects to a DTS server, replacing any previous connection
    ///
    /// Sends `GET` to the server root (with `port` applied if given) and
    /// records the service name and version it reports.
    ///
    /// # Errors
    ///
    /// Returns a usage error for a malformed address and a service error if
    /// the handshake fails for any reason. Handshake failures are never
    /// softened into an empty result.
    pub async fn connect(
        &mut self,
        api_key: &ApiKey,
        server: &str,
        port: Option<u16>,
    ) -> Result<&ConnectionContext> {
        let root = connection::server_root(server, port)?;
        let auth = Authenticator::new(api_key)?;
        let client = self.config.build_http_client()?;
        let http = HttpHandler::new(client, auth);

        info!("Connecting to DTS at {}", root);
        let handshake: Handshake = http.handshake(&root).await?;
        let context = ConnectionContext::new(&root, handshake)?;
        info!(
            "Connected to {} (version {}) at {}",
            context.service_name(),
            context.protocol_version(),
            context.service_uri()
        );

        let connected = self.connection.insert(Connected { http, context });
        Ok(&connected.context)
    }

    /// Drops the connection context; always succeeds
    pub fn disconnect(&mut self) {
        if let Some(previous) = self.connection.take() {
            info!("Disconnected from {}", previous.context.service_uri());
        }
    }

    /// Whether a handshake has succeeded and not been undone
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Current connection context, if connected
    pub fn context(&self) -> Option<&ConnectionContext> {
        self.connection.as_ref().map(|c| &c.context)
    }

    fn connected(&self) -> Result<&Connected> {
        self.connection
            .as_ref()
            .ok_or_else(|| UsageError::NotConnected.into())
    }

    /// Lists every database the service can search or transfer between
    pub async fn list_databases(&self) -> Result<Vec<DatabaseDescriptor>> {
        let conn = self.connected()?;
        let url = conn.context.endpoint(api::DATABASES)?;
        let databases: Vec<DatabaseDescriptor> = conn.http.get_json(&url, &[]).await?;
        debug!("Service reported {} databases", databases.len());
        Ok(databases)
    }

    /// Searches a database for files matching a query
    ///
    /// Results come back in service order. Pagination is driven entirely by
    /// the request's `offset` and `limit`; nothing is cached.
    ///
    /// # Errors
    ///
    /// Usage and value errors for invalid arguments (raised before any I/O),
    /// service errors for failed requests.
    pub async fn search(&self, request: &SearchRequest) -> Result<Vec<FileResource>> {
        let conn = self.connected()?;
        let body = request.to_wire()?;
        let url = conn.context.endpoint(api::FILES)?;
        let list: ResourceList = conn.http.post_json(&url, &body, None).await?;
        debug!(
            "Search of {} for '{}' returned {} resources",
            request.database,
            request.query,
            list.resources.len()
        );
        Ok(list.resources)
    }

    /// Fetches metadata for specific files by identifier
    ///
    /// The service decides the order of the returned resources; it is not
    /// guaranteed to follow the order of `request.ids`.
    pub async fn fetch_metadata(&self, request: &MetadataRequest) -> Result<Vec<FileResource>> {
        let conn = self.connected()?;
        let params = request.to_wire()?;
        let url = conn.context.endpoint(api::FILES_BY_ID)?;
        let list: ResourceList = conn.http.get_json(&url, &to_query_pairs(&params)).await?;
        debug!(
            "Metadata lookup for {} ids in {} returned {} resources",
            request.ids.len(),
            request.database,
            list.resources.len()
        );
        Ok(list.resources)
    }

    /// Submits a transfer from one database to another
    ///
    /// Not idempotent: submitting the same request twice starts two transfers.
    /// `request.timeout` bounds this call only, not the transfer itself.
    pub async fn submit_transfer(&self, request: &TransferRequest) -> Result<TransferHandle> {
        let conn = self.connected()?;
        let body = request.to_wire()?;
        let url = conn.context.endpoint(api::TRANSFERS)?;
        let created: TransferCreated = conn.http.post_json(&url, &body, request.timeout).await?;
        let handle: TransferHandle = created.id.parse().map_err(|_| ServiceError::Decode {
            endpoint: url.path().to_string(),
            reason: format!("transfer id is not a UUID: {}", created.id),
        })?;
        info!(
            "Submitted transfer {} of {} files from {} to {}",
            handle,
            request.file_ids.len(),
            request.source,
            request.destination
        );
        Ok(handle)
    }

    /// Fetches a fresh status snapshot for a transfer
    pub async fn poll_status(&self, handle: TransferHandle) -> Result<TransferStatusRecord> {
        let conn = self.connected()?;
        let url = conn.context.endpoint(&transfer_path(handle))?;
        let record: TransferStatusRecord = conn.http.get_json(&url, &[]).await?;
        debug!("Transfer {}: {}", handle, record);
        Ok(record)
    }

    /// Asks the service to suspend a transfer
    ///
    /// Cancellation is cooperative; status stays available through
    /// [`poll_status`](Self::poll_status) for a service-defined period.
    pub async fn cancel_transfer(&self, handle: TransferHandle) -> Result<()> {
        let conn = self.connected()?;
        let url = conn.context.endpoint(&transfer_path(handle))?;
        conn.http.delete(&url).await?;
        info!("Requested cancellation of transfer {}", handle);
        Ok(())
    }
}

impl Default for DtsClient {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DtsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.context() {
            Some(ctx) => write!(f, "dts.Client({})", ctx),
            None => f.write_str("dts.Client(disconnected)"),
        }
    }
}

impl fmt::Debug for DtsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DtsClient")
            .field("config", &self.config)
            .field("context", &self.context())
            .finish()
    }
}

fn transfer_path(handle: TransferHandle) -> String {
    format!("{}/{}", api::TRANSFERS, handle)
}

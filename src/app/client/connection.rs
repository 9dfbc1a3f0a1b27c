//! Connection context established by the DTS handshake
//!
//! A `GET` against the server root returns the service name and version. The
//! resulting [`ConnectionContext`] is an immutable value: reconnecting replaces
//! it, disconnecting drops it.

use std::fmt;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use url::Url;

use crate::constants::api;
use crate::errors::{Result, ServiceError, UsageError};

/// Where the service lives and what it reported about itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionContext {
    service_uri: Url,
    service_name: String,
    protocol_version: String,
}

impl ConnectionContext {
    /// Builds a context from a server root and the handshake reply
    pub fn new(server_root: &Url, handshake: Handshake) -> Result<Self> {
        let service_uri = api_base(server_root)?;
        Ok(Self {
            service_uri,
            service_name: handshake.name,
            protocol_version: handshake.version,
        })
    }

    /// Versioned API root, e.g. `https://dts.example.org/api/v1`
    pub fn service_uri(&self) -> &Url {
        &self.service_uri
    }

    /// Name the service reported
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Version the service reported
    pub fn protocol_version(&self) -> &str {
        &self.protocol_version
    }

    /// Resolves an endpoint path below the API root
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        let joined = format!(
            "{}/{}",
            self.service_uri.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|e| {
            ServiceError::InvalidUrl {
                url: joined,
                error: e.to_string(),
            }
            .into()
        })
    }
}

impl fmt::Display for ConnectionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "uri = {}, name = {}, version = {}",
            self.service_uri, self.service_name, self.protocol_version
        )
    }
}

/// Body of the root handshake response
#[derive(Debug, Clone, Deserialize)]
pub struct Handshake {
    pub name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub version: String,
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

/// Parses a server address and optional port into the handshake URL
///
/// Trailing slashes are ignored; an explicit `port` replaces any port already
/// present in the address.
pub fn server_root(address: &str, port: Option<u16>) -> Result<Url> {
    let trimmed = address.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(UsageError::MissingField {
            operation: "connect",
            field: "server",
        }
        .into());
    }
    let mut url = Url::parse(trimmed).map_err(|e| UsageError::InvalidServer {
        address: address.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(UsageError::InvalidServer {
            address: address.to_string(),
            reason: "address must be an absolute http(s) URL".to_string(),
        }
        .into());
    }
    if let Some(port) = port {
        url.set_port(Some(port))
            .map_err(|_| UsageError::InvalidServer {
                address: address.to_string(),
                reason: format!("cannot apply port {}", port),
            })?;
    }
    Ok(url)
}

fn api_base(server_root: &Url) -> Result<Url> {
    let base = format!(
        "{}/api/v{}",
        server_root.as_str().trim_end_matches('/'),
        api::VERSION
    );
    Url::parse(&base).map_err(|e| {
        ServiceError::InvalidUrl {
            url: base,
            error: e.to_string(),
        }
        .into()
    })
}

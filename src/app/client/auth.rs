//! Request authorization for the DTS
//!
//! The DTS accepts a KBase developer token encoded as
//! `Bearer base64(token + "\n")`. The encoded header is computed once per
//! client and attached to every request, including the handshake.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::RequestBuilder;

use crate::constants::auth;
use crate::errors::{AuthError, AuthResult};

/// An unencoded KBase developer token
///
/// `Debug` and `Display` are redacted so the key cannot leak into logs.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wraps a raw token verbatim, rejecting blank input
    pub fn new(key: impl Into<String>) -> AuthResult<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(AuthError::InvalidApiKey {
                reason: "API key cannot be empty".to_string(),
            });
        }
        Ok(Self(key))
    }

    /// Reads the key from `DTS_KBASE_DEV_TOKEN`
    pub fn from_env() -> AuthResult<Self> {
        match std::env::var(crate::constants::env::API_KEY) {
            Ok(key) => Self::new(key).map_err(|_| AuthError::MissingApiKey),
            Err(std::env::VarError::NotPresent) => Err(AuthError::MissingApiKey),
            Err(e) => Err(AuthError::EnvVar(e)),
        }
    }

    /// Raw token, for code that has to hand it on (credential storage)
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Attaches the DTS authorization header to outgoing requests
#[derive(Clone)]
pub struct Authenticator {
    header: HeaderValue,
}

impl Authenticator {
    /// Encodes the key into a ready-to-send header value
    pub fn new(api_key: &ApiKey) -> AuthResult<Self> {
        let mut header = HeaderValue::from_str(&Self::bearer_token(api_key)).map_err(|_| {
            AuthError::InvalidApiKey {
                reason: "API key contains characters not allowed in a header".to_string(),
            }
        })?;
        header.set_sensitive(true);
        Ok(Self { header })
    }

    /// Computes `Bearer base64(key + "\n")`
    pub fn bearer_token(api_key: &ApiKey) -> String {
        let encoded = STANDARD.encode(format!("{}\n", api_key.expose()));
        format!("{}{}", auth::BEARER_PREFIX, encoded)
    }

    /// Adds the authorization header to a request
    pub fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(AUTHORIZATION, self.header.clone())
    }
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authenticator")
            .field("header", &"Bearer ***")
            .finish()
    }
}

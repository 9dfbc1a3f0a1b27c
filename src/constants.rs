//! Application constants for the DTS client
//!
//! This module centralizes all constants used throughout the crate,
//! organized by functional domain.

use std::time::Duration;

/// Environment variable names
pub mod env {
    /// Environment variable holding the unencoded KBase developer token
    pub const API_KEY: &str = "DTS_KBASE_DEV_TOKEN";

    /// Overrides the configured server address
    pub const SERVER: &str = "DTS_SERVER";

    /// Overrides the configured server port
    pub const PORT: &str = "DTS_PORT";

    /// Overrides the configured ORCID
    pub const ORCID: &str = "DTS_ORCID";
}

/// Authentication and credential-related constants
pub mod auth {
    /// Minimum plausible API key length accepted by the setup prompt
    pub const MIN_API_KEY_LENGTH: usize = 8;

    /// File permissions for .env file (Unix only) - owner read/write only
    #[cfg(unix)]
    pub const ENV_FILE_PERMISSIONS: u32 = 0o600;

    /// Authorization scheme prefix
    pub const BEARER_PREFIX: &str = "Bearer ";
}

/// DTS REST surface
pub mod api {
    /// Protocol version the client speaks
    pub const VERSION: u32 = 1;

    /// Database listing endpoint
    pub const DATABASES: &str = "databases";

    /// File search endpoint
    pub const FILES: &str = "files";

    /// Metadata-by-identifier endpoint
    pub const FILES_BY_ID: &str = "files/by-id";

    /// Transfer submission / status / cancellation endpoint
    pub const TRANSFERS: &str = "transfers";

    /// Public staging deployment, used as the CLI default
    pub const DEFAULT_SERVER: &str = "https://lb-dts.staging.kbase.us";
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = concat!("dts-client/", env!("CARGO_PKG_VERSION"));

    /// Default HTTP request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// TCP keep-alive interval
    pub const TCP_KEEPALIVE: Duration = Duration::from_secs(30);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

    /// Maximum idle connections per host in pool
    pub const POOL_MAX_PER_HOST: usize = 4;

    /// Longest response body echoed into logs and errors
    pub const MAX_LOGGED_BODY: usize = 2048;
}

/// Transfer polling performed by the CLI
pub mod polling {
    use super::Duration;

    /// Default interval between status polls in `transfer status --watch`
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

    /// Shortest interval the CLI will accept
    pub const MIN_INTERVAL: Duration = Duration::from_millis(500);
}

/// Configuration file locations
pub mod config {
    /// Project-local config file name
    pub const LOCAL_FILE: &str = "dts-client.toml";

    /// Directory under the user config dir
    pub const APP_DIR: &str = "dts-client";

    /// File name inside the app directory
    pub const FILE_NAME: &str = "config.toml";

    /// System-wide config file (Unix only)
    #[cfg(unix)]
    pub const SYSTEM_FILE: &str = "/etc/dts-client/config.toml";
}

/// Logging constants
pub mod logging {
    /// Default log level
    pub const DEFAULT_LOG_LEVEL: &str = "info";
}

// Re-export commonly used constants for convenience
pub use api::{DEFAULT_SERVER, VERSION as API_VERSION};
pub use env::API_KEY as ENV_API_KEY;
pub use http::{DEFAULT_TIMEOUT as HTTP_TIMEOUT, USER_AGENT};

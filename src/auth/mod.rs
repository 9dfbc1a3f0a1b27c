//! API key management for the DTS
//!
//! This module provides functions for managing the KBase developer token used
//! to authorize DTS requests, including interactive setup, verification, and
//! storage in .env files.
//!
//! # Examples
//!
//! ```rust,no_run
//! use dts_client::app::ClientConfig;
//! use dts_client::auth::{check_credentials, setup_credentials};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! if !check_credentials() {
//!     setup_credentials(
//!         ClientConfig::default(),
//!         "https://lb-dts.staging.kbase.us",
//!         None,
//!         false,
//!     )
//!     .await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod credentials;

// Re-export main public API
pub use credentials::{
    check_credentials, get_auth_status, prompt_api_key, save_api_key, setup_credentials,
    show_auth_status, verify_credentials, AuthStatus,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_structure() {
        // Ensure public API is accessible
        let _ = check_credentials();
        let status = get_auth_status();
        assert!(status.key_valid.is_none());
        assert!(!status.status_message().is_empty());
    }
}

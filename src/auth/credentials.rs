//! API key management for the DTS
//!
//! The key is read from `DTS_KBASE_DEV_TOKEN`, which the binary may populate
//! from a `.env` file. Interactive setup stores the key in `.env` with
//! owner-only permissions. The key itself is never printed.

use std::env;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use crate::app::{ApiKey, ClientConfig, DtsClient};
use crate::constants::{auth, env as env_constants};
use crate::errors::{AuthError, AuthResult};

/// Authentication status information
#[derive(Debug, Clone)]
pub struct AuthStatus {
    /// Whether the API key environment variable is set
    pub api_key_set: bool,
    /// Whether .env file exists in current directory
    pub dotenv_file_exists: bool,
    /// Whether the key has been verified against a server (None = not tested)
    pub key_valid: Option<bool>,
}

impl AuthStatus {
    /// Get descriptive status message for display
    pub fn status_message(&self) -> String {
        match (self.api_key_set, self.key_valid) {
            (false, _) => "Missing API key - run 'dts auth setup' to configure".to_string(),
            (true, None) => "API key configured but not verified".to_string(),
            (true, Some(true)) => "API key configured and verified".to_string(),
            (true, Some(false)) => "API key configured but rejected".to_string(),
        }
    }
}

/// Check current authentication status
pub fn get_auth_status() -> AuthStatus {
    AuthStatus {
        api_key_set: check_credentials(),
        dotenv_file_exists: Path::new(".env").exists(),
        key_valid: None,
    }
}

/// Check if a non-blank API key exists in the environment
pub fn check_credentials() -> bool {
    ApiKey::from_env().is_ok()
}

/// Prompt the user for an API key without echoing it
pub fn prompt_api_key() -> AuthResult<ApiKey> {
    let key = rpassword::prompt_password("KBase developer token: ")
        .map_err(AuthError::CredentialStorage)?;
    let key = key.trim();
    validate_api_key(key)?;
    ApiKey::new(key)
}

fn validate_api_key(key: &str) -> AuthResult<()> {
    let key = key.trim();
    if key.is_empty() {
        return Err(AuthError::InvalidApiKey {
            reason: "API key cannot be empty".to_string(),
        });
    }
    if key.len() < auth::MIN_API_KEY_LENGTH {
        return Err(AuthError::InvalidApiKey {
            reason: format!(
                "API key is shorter than {} characters",
                auth::MIN_API_KEY_LENGTH
            ),
        });
    }
    if key.chars().any(char::is_whitespace) {
        return Err(AuthError::InvalidApiKey {
            reason: "API key cannot contain whitespace".to_string(),
        });
    }
    Ok(())
}

/// Save the API key to a .env file with secure permissions
///
/// Other lines in an existing file are preserved.
pub fn save_api_key(env_path: &Path, api_key: &ApiKey) -> AuthResult<()> {
    let prefix = format!("{}=", env_constants::API_KEY);
    let entry = format!("{}{}", prefix, api_key.expose());
    let mut lines = Vec::new();
    let mut key_found = false;

    if env_path.exists() {
        let file = File::open(env_path)?;
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().starts_with(&prefix) {
                lines.push(entry.clone());
                key_found = true;
            } else {
                lines.push(line);
            }
        }
    }

    if !key_found {
        lines.push(entry);
    }

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(env_path)?;

    for line in lines {
        writeln!(file, "{}", line)?;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = file.metadata()?.permissions();
        perms.set_mode(auth::ENV_FILE_PERMISSIONS);
        file.set_permissions(perms).map_err(|e| match e.kind() {
            io::ErrorKind::PermissionDenied => AuthError::PermissionDenied {
                path: env_path.to_path_buf(),
            },
            _ => AuthError::CredentialStorage(e),
        })?;
    }

    // Make the key visible to the rest of this process
    env::set_var(env_constants::API_KEY, api_key.expose());

    Ok(())
}

/// Verify the API key by connecting and listing databases
///
/// Returns `Ok(false)` when the server rejects the key or cannot be reached.
pub async fn verify_credentials(
    config: ClientConfig,
    server: &str,
    port: Option<u16>,
) -> AuthResult<bool> {
    let api_key = ApiKey::from_env()?;

    println!("Verifying API key with {}...", server);

    let client = match DtsClient::connect_with(config, &api_key, server, port).await {
        Ok(client) => client,
        Err(e) => {
            println!("Could not connect: {}", e);
            return Ok(false);
        }
    };

    match client.list_databases().await {
        Ok(databases) => {
            println!(
                "API key accepted; {} databases available.",
                databases.len()
            );
            Ok(true)
        }
        Err(e) => {
            println!("API key verification failed: {}", e);
            Ok(false)
        }
    }
}

/// Interactive API key setup workflow
pub async fn setup_credentials(
    config: ClientConfig,
    server: &str,
    port: Option<u16>,
    force: bool,
) -> AuthResult<()> {
    println!("DTS Authentication Setup");
    println!("========================");
    println!();
    println!("This stores your KBase developer token in a .env file in the current directory.");
    println!();

    if check_credentials() && !force {
        print!("An API key is already configured. Replace it? [y/N]: ");
        io::stdout().flush().map_err(AuthError::CredentialStorage)?;

        let mut response = String::new();
        io::stdin()
            .read_line(&mut response)
            .map_err(AuthError::CredentialStorage)?;

        if !response.trim().to_lowercase().starts_with('y') {
            println!("Setup cancelled.");
            return Ok(());
        }
        println!();
    }

    let api_key = prompt_api_key()?;
    save_api_key(Path::new(".env"), &api_key)?;
    println!("API key saved to .env");

    #[cfg(unix)]
    println!("File permissions set to owner-only (600)");

    println!();
    if verify_credentials(config, server, port).await? {
        println!("Setup complete.");
    } else {
        println!("The key was saved but could not be verified. Run 'dts auth verify' later.");
    }

    Ok(())
}

/// Show current authentication status
pub async fn show_auth_status(
    config: ClientConfig,
    server: &str,
    port: Option<u16>,
) -> AuthResult<()> {
    let mut status = get_auth_status();

    println!("DTS Authentication Status");
    println!("=========================");
    println!();
    println!(
        "API key ({}): {}",
        env_constants::API_KEY,
        if status.api_key_set { "Set" } else { "Not set" }
    );
    println!(
        ".env file: {}",
        if status.dotenv_file_exists {
            "Exists"
        } else {
            "Not found"
        }
    );
    println!();

    if status.api_key_set {
        status.key_valid = Some(verify_credentials(config, server, port).await?);
        println!();
    }

    println!("Status: {}", status.status_message());
    Ok(())
}

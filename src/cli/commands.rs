//! Command handlers for the DTS CLI
//!
//! This module implements the command handlers that sit between parsed CLI
//! arguments and the library. Each handler resolves its settings, connects a
//! [`DtsClient`], performs one operation, and prints the outcome.

use std::path::PathBuf;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::app::{
    ApiKey, DatabaseDescriptor, DtsClient, FileResource, MetadataRequest, ParamMap, Query,
    SearchRequest, TransferHandle, TransferRequest,
};
use crate::auth::{setup_credentials, show_auth_status, verify_credentials};
use crate::cli::{
    watch_transfer, AuthAction, AuthArgs, ConfigAction, ConfigArgs, GlobalArgs, MetadataArgs,
    ProgressConfig, SearchArgs, TransferAction, TransferArgs,
};
use crate::config::AppConfig;
use crate::errors::{AppError, Result};

/// Settings shared by every command, after CLI flags override the config
#[derive(Debug, Clone)]
pub struct Session {
    /// Loaded configuration (file and environment)
    pub config: AppConfig,
    /// Server root to connect to
    pub server: String,
    /// Optional server port
    pub port: Option<u16>,
    /// Requesting user's ORCID, if known
    pub orcid: Option<String>,
    /// Suppress non-essential output
    pub quiet: bool,
}

impl Session {
    /// Apply CLI flags on top of the loaded configuration
    pub fn resolve(global: &GlobalArgs, config: AppConfig) -> Self {
        let server = global
            .server
            .clone()
            .unwrap_or_else(|| config.server.url.clone());
        let port = global.port.or(config.server.port);
        let orcid = global.orcid.clone().or_else(|| config.server.orcid.clone());

        Self {
            config,
            server,
            port,
            orcid,
            quiet: global.quiet,
        }
    }

    fn orcid(&self) -> Result<&str> {
        self.orcid
            .as_deref()
            .filter(|o| !o.trim().is_empty())
            .ok_or_else(|| {
                AppError::generic("No ORCID configured. Pass --orcid or set DTS_ORCID.")
            })
    }

    async fn connect(&self) -> Result<DtsClient> {
        let api_key = ApiKey::from_env()?;
        let client = DtsClient::connect_with(
            self.config.client.to_runtime_config(),
            &api_key,
            &self.server,
            self.port,
        )
        .await?;
        debug!("{}", client);
        Ok(client)
    }
}

/// Handle the databases command
pub async fn handle_databases(session: &Session) -> Result<()> {
    let client = session.connect().await?;
    let databases = client.list_databases().await?;

    if databases.is_empty() {
        println!("The server reports no databases.");
        return Ok(());
    }

    print_database_table(&databases);
    Ok(())
}

fn print_database_table(databases: &[DatabaseDescriptor]) {
    let id_width = databases.iter().map(|d| d.id.len()).max().unwrap_or(2).max(2);
    let name_width = databases
        .iter()
        .map(|d| d.name.len())
        .max()
        .unwrap_or(4)
        .max(4);

    println!(
        "{:<id_width$}  {:<name_width$}  ORGANIZATION / URL",
        "ID",
        "NAME",
        id_width = id_width,
        name_width = name_width
    );
    for db in databases {
        println!(
            "{:<id_width$}  {:<name_width$}  {} <{}>",
            db.id,
            db.name,
            db.organization,
            db.url,
            id_width = id_width,
            name_width = name_width
        );
    }
}

/// Handle the search command
pub async fn handle_search(session: &Session, args: SearchArgs) -> Result<()> {
    let request = search_request(session.orcid()?, &args);

    let client = session.connect().await?;
    let resources = client.search(&request).await?;
    info!("Search returned {} resources", resources.len());

    print_resources(&resources, args.json)?;
    if !session.quiet {
        println!("{} file(s) found in {}", resources.len(), args.database);
    }
    Ok(())
}

/// The query is always sent as typed, so identifiers like "007" keep their zeros
fn search_request(orcid: &str, args: &SearchArgs) -> SearchRequest {
    let mut request = SearchRequest::new(&args.database, orcid, Query::from(args.query.as_str()));
    if let Some(status) = &args.status {
        request = request.status(status.clone());
    }
    if let Some(offset) = args.offset {
        request = request.offset(offset);
    }
    if let Some(limit) = args.limit {
        request = request.limit(limit);
    }
    if !args.specific.is_empty() {
        let specific: ParamMap = args.specific.iter().cloned().collect();
        request = request.specific(Value::Object(specific));
    }
    request
}

/// Handle the metadata command
pub async fn handle_metadata(session: &Session, args: MetadataArgs) -> Result<()> {
    let orcid = session.orcid()?;
    let mut request = MetadataRequest::new(&args.database, orcid, args.ids);
    if let Some(offset) = args.offset {
        request = request.offset(offset);
    }
    if let Some(limit) = args.limit {
        request = request.limit(limit);
    }

    let client = session.connect().await?;
    let resources = client.fetch_metadata(&request).await?;

    if resources.len() < request.ids.len() {
        warn!(
            "Requested {} ids, received {} resources",
            request.ids.len(),
            resources.len()
        );
    }
    print_resources(&resources, args.json)
}

fn print_resources(resources: &[FileResource], json: bool) -> Result<()> {
    for resource in resources {
        if json {
            let rendered = serde_json::to_string_pretty(resource)
                .map_err(|e| AppError::generic(format!("Failed to render resource: {}", e)))?;
            println!("{}", rendered);
        } else if resource.path.is_empty() {
            println!("{}", resource.id);
        } else {
            println!("{}\t{}", resource.id, resource.path);
        }
    }
    Ok(())
}

/// Handle transfer lifecycle commands
pub async fn handle_transfer(session: &Session, args: TransferArgs) -> Result<()> {
    match args.action {
        TransferAction::Submit {
            source,
            destination,
            file_ids,
            description,
            instructions,
            timeout,
        } => {
            let orcid = session.orcid()?;
            let mut request = TransferRequest::new(orcid, file_ids, &source, &destination);
            if let Some(description) = description {
                request = request.description(description);
            }
            if let Some(instructions) = instructions {
                request = request.instructions(instructions);
            }
            if let Some(secs) = timeout {
                request = request.timeout(Duration::from_secs(secs));
            }

            let client = session.connect().await?;
            let handle = client.submit_transfer(&request).await?;
            if session.quiet {
                println!("{}", handle);
            } else {
                println!("Transfer submitted: {}", handle);
                println!("Track it with: dts transfer status {} --watch", handle);
            }
            Ok(())
        }
        TransferAction::Status {
            id,
            watch,
            interval,
        } => {
            let handle: TransferHandle = id.parse()?;
            let client = session.connect().await?;

            let record = if watch {
                let config = ProgressConfig {
                    enable_progress_bar: !session.quiet,
                    poll_interval: interval
                        .map(Duration::from_millis)
                        .unwrap_or_else(|| session.config.poll.interval()),
                };
                watch_transfer(&client, handle, config).await?
            } else {
                client.poll_status(handle).await?
            };

            println!("{}", record);
            Ok(())
        }
        TransferAction::Cancel { id } => {
            let handle: TransferHandle = id.parse()?;
            let client = session.connect().await?;
            client.cancel_transfer(handle).await?;
            println!("Cancellation requested for {}", handle);
            Ok(())
        }
    }
}

/// Handle authentication commands
pub async fn handle_auth(session: &Session, args: AuthArgs) -> Result<()> {
    let client_config = session.config.client.to_runtime_config();
    match args.action {
        AuthAction::Setup { force } => {
            setup_credentials(client_config, &session.server, session.port, force).await?;
        }
        AuthAction::Verify => {
            let is_valid = verify_credentials(client_config, &session.server, session.port).await?;
            if !is_valid {
                return Err(AppError::generic("API key verification failed"));
            }
        }
        AuthAction::Status => {
            show_auth_status(client_config, &session.server, session.port).await?;
        }
    }

    Ok(())
}

/// Handle configuration commands
pub async fn handle_config(session: &Session, args: ConfigArgs) -> Result<()> {
    match args.action {
        ConfigAction::Init {
            path: None,
            force: false,
        } => {
            let path = AppConfig::initialize_first_run().await?;
            println!("Configuration file: {}", path.display());
            Ok(())
        }
        ConfigAction::Init { path, force } => {
            let path = match path {
                Some(path) => path,
                None => AppConfig::get_default_config_path()?,
            };
            init_config_file(path, force).await
        }
        ConfigAction::Show => {
            print!("{}", session.config.to_toml()?);
            Ok(())
        }
    }
}

async fn init_config_file(path: PathBuf, force: bool) -> Result<()> {
    if path.exists() && !force {
        println!(
            "Configuration already exists at {}. Use --force to overwrite.",
            path.display()
        );
        return Ok(());
    }

    AppConfig::write_default(&path).await?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

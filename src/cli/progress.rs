//! Live progress display for `transfer status --watch`
//!
//! The watcher polls the service at a fixed interval and renders each
//! snapshot either as an indicatif bar (on a terminal) or as one log line per
//! change (when stderr is redirected). Polling stops when the transfer is
//! finished, failed, unknown to the service, or when the user presses Ctrl-C.
//! Stopping the watcher never cancels the transfer.
//!
//! # Examples
//!
//! ```rust,no_run
//! use dts_client::app::{ApiKey, DtsClient};
//! use dts_client::cli::{watch_transfer, ProgressConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let key = ApiKey::from_env()?;
//! let mut client = DtsClient::new();
//! client.connect(&key, "https://lb-dts.staging.kbase.us", None).await?;
//!
//! let handle = "3f0c8a6e-2b7d-4c2e-9a55-5b1d0e6f7a11".parse()?;
//! let last = watch_transfer(&client, handle, ProgressConfig::default()).await?;
//! println!("{}", last);
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use crate::app::{DtsClient, TransferHandle, TransferStatusRecord};
use crate::constants::polling;
use crate::errors::Result;

/// Configuration for the transfer watcher
#[derive(Debug, Clone)]
pub struct ProgressConfig {
    /// Enable the visual progress bar (ignored when stderr is not a terminal)
    pub enable_progress_bar: bool,
    /// Time between status polls
    pub poll_interval: Duration,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            enable_progress_bar: true,
            poll_interval: polling::DEFAULT_INTERVAL,
        }
    }
}

/// Renders transfer snapshots
pub struct TransferProgress {
    bar: Option<ProgressBar>,
    last: Option<TransferStatusRecord>,
}

impl TransferProgress {
    /// Create a display for one transfer
    pub fn new(config: &ProgressConfig, handle: TransferHandle) -> Self {
        let is_terminal = atty::is(atty::Stream::Stderr);
        let bar = (config.enable_progress_bar && is_terminal).then(|| {
            let bar = ProgressBar::new(0);
            match ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}")
            {
                Ok(style) => bar.set_style(style.progress_chars("##-")),
                Err(e) => debug!("Progress bar template error: {}", e),
            }
            bar.enable_steady_tick(Duration::from_millis(120));
            bar
        });
        debug!("Progress display started for transfer {}", handle);

        Self { bar, last: None }
    }

    /// Show a new snapshot
    pub fn update(&mut self, record: &TransferStatusRecord) {
        match &self.bar {
            Some(bar) => {
                bar.set_length(record.num_files);
                bar.set_position(record.num_files_transferred.min(record.num_files));
                bar.set_message(status_message(record));
            }
            None => {
                if self.last.as_ref() != Some(record) {
                    eprintln!("{}", record);
                }
            }
        }
        self.last = Some(record.clone());
    }

    /// Tear down the bar, leaving the final state on screen
    pub fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            let message = self
                .last
                .as_ref()
                .map(status_message)
                .unwrap_or_default();
            bar.finish_with_message(message);
        }
    }
}

fn status_message(record: &TransferStatusRecord) -> String {
    match &record.message {
        Some(message) => format!("{} ({})", record.status, message),
        None => record.status.to_string(),
    }
}

/// Poll a transfer until it no longer needs watching
///
/// Returns the last snapshot seen. Poll failures end the watch with the
/// error; the display is torn down either way.
pub async fn watch_transfer(
    client: &DtsClient,
    handle: TransferHandle,
    config: ProgressConfig,
) -> Result<TransferStatusRecord> {
    let interval = config.poll_interval.max(polling::MIN_INTERVAL);
    let mut display = TransferProgress::new(&config, handle);
    info!("Watching transfer {} every {:?}", handle, interval);

    let outcome = poll_until_done(client, handle, interval, &mut display).await;
    display.finish();
    outcome
}

async fn poll_until_done(
    client: &DtsClient,
    handle: TransferHandle,
    interval: Duration,
    display: &mut TransferProgress,
) -> Result<TransferStatusRecord> {
    loop {
        let record = client.poll_status(handle).await?;
        display.update(&record);

        if record.should_stop_polling() {
            debug!("Transfer {} reached {}", handle, record.status);
            return Ok(record);
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Stopped watching transfer {}; it continues on the server", handle);
                return Ok(record);
            }
        }
    }
}

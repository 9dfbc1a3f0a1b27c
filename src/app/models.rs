//! Data models for the DTS client
//!
//! These types mirror the JSON the DTS returns: database descriptors, file
//! resources, transfer handles and transfer status snapshots. They are plain
//! values; nothing here talks to the network.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::errors::UsageError;

/// An ordered string-keyed map of loosely typed values
///
/// Used for database-specific search parameters, transfer instructions and
/// file metadata, whose schemas belong to each participating database.
pub type ParamMap = Map<String, Value>;

/// A database known to the DTS, usable as a transfer source or destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseDescriptor {
    /// Short identifier used in requests (e.g. "jdp")
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Organization operating the database
    pub organization: String,
    /// Home page of the database
    pub url: String,
}

/// Metadata for one file as returned by search or metadata lookup
///
/// Only `id` is interpreted by the client. Every other field the service sent
/// is kept, in order, in `metadata`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileResource {
    /// Service-qualified identifier (e.g. "JDP:57f9e03f7ded5e3135bc069e")
    pub id: String,
    /// Path of the file within its source database
    #[serde(default)]
    pub path: String,
    /// All remaining resource fields
    #[serde(flatten)]
    pub metadata: ParamMap,
}

impl FileResource {
    /// Database-specific `extra` object, if the source attached one
    pub fn extra(&self) -> Option<&ParamMap> {
        self.metadata.get("extra").and_then(Value::as_object)
    }

    /// Looks up a top-level metadata field by name
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.metadata.get(name)
    }

    /// Database prefix of the identifier (the part before the first ':')
    pub fn database_prefix(&self) -> Option<&str> {
        self.id.split_once(':').map(|(prefix, _)| prefix)
    }
}

/// Envelope the service wraps around resource lists
#[derive(Debug, Deserialize)]
pub(crate) struct ResourceList {
    pub resources: Vec<FileResource>,
}

/// Identifier of a submitted transfer
///
/// The only caller-visible handle on a transfer; used for status polling
/// and cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransferHandle(Uuid);

impl TransferHandle {
    /// Wraps a UUID
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// The underlying UUID
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for TransferHandle {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for TransferHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for TransferHandle {
    type Err = UsageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| UsageError::InvalidHandle {
                value: s.to_string(),
            })
    }
}

/// Body returned by a successful transfer submission
#[derive(Debug, Deserialize)]
pub(crate) struct TransferCreated {
    pub id: String,
}

/// Status of a transfer as reported by the service
///
/// The client only observes this state machine: `Staging` → `Active` →
/// `Finalizing`, with `Inactive` and `Failed` as terminal states. `Unknown`
/// means the service cannot say and is terminal for polling purposes.
/// Statuses added by newer services land in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TransferStatus {
    /// Files are being copied to the source database's staging area
    Staging,
    /// Files are in flight from source to destination
    Active,
    /// Files transferred, manifest being written
    Finalizing,
    /// Transfer suspended (including by cancellation)
    Inactive,
    /// Transfer could not be completed
    Failed,
    /// Handle unrecognized or status undeterminable
    Unknown,
    /// A status this client version does not know about
    Other(String),
}

impl TransferStatus {
    /// Wire form of the status
    pub fn as_str(&self) -> &str {
        match self {
            Self::Staging => "staging",
            Self::Active => "active",
            Self::Finalizing => "finalizing",
            Self::Inactive => "inactive",
            Self::Failed => "failed",
            Self::Unknown => "unknown",
            Self::Other(s) => s,
        }
    }

    /// Parses a wire status; never fails
    pub fn parse(s: &str) -> Self {
        match s {
            "staging" => Self::Staging,
            "active" => Self::Active,
            "finalizing" => Self::Finalizing,
            "inactive" => Self::Inactive,
            "failed" => Self::Failed,
            "unknown" | "" => Self::Unknown,
            other => Self::Other(other.to_string()),
        }
    }

    /// Whether no further progress should be expected by a poller
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Inactive | Self::Failed | Self::Unknown)
    }

    /// Whether the status is one of the values this client was built against
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TransferStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TransferStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map_or(Self::Unknown, |s| Self::parse(&s)))
    }
}

impl Default for TransferStatus {
    fn default() -> Self {
        Self::Unknown
    }
}

/// Point-in-time snapshot of a transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferStatusRecord {
    /// Transfer identifier as echoed by the service
    #[serde(default)]
    pub id: String,
    /// Current status
    #[serde(default)]
    pub status: TransferStatus,
    /// Optional human-readable detail (typically set on failure)
    #[serde(default)]
    pub message: Option<String>,
    /// Number of files in the transfer
    #[serde(default)]
    pub num_files: u64,
    /// Number of files that have reached the destination
    #[serde(default)]
    pub num_files_transferred: u64,
}

impl TransferStatusRecord {
    /// All files have arrived and the service is writing the manifest
    pub fn is_complete(&self) -> bool {
        self.status == TransferStatus::Finalizing
            && self.num_files > 0
            && self.num_files_transferred >= self.num_files
    }

    /// Whether a poller should stop asking about this transfer
    pub fn should_stop_polling(&self) -> bool {
        self.status.is_terminal() || self.is_complete()
    }

    /// Fraction of files transferred, in `[0, 1]`
    ///
    /// Clamped because the service does not promise
    /// `num_files_transferred <= num_files`.
    pub fn progress(&self) -> f64 {
        if self.num_files == 0 {
            return 0.0;
        }
        (self.num_files_transferred as f64 / self.num_files as f64).min(1.0)
    }
}

impl fmt::Display for TransferStatusRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}/{} files",
            self.id, self.status, self.num_files_transferred, self.num_files
        )?;
        if let Some(message) = &self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

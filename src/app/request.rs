//! Request construction and validation
//!
//! Every operation's arguments pass through here before any network I/O.
//! Validation distinguishes usage errors (wrong kind of argument) from value
//! errors (right kind, out of range), and produces the exact wire parameters:
//! an ordered map in which parameters the caller did not supply are omitted
//! rather than sent as null or zero.

use std::fmt;
use std::time::Duration;

use serde_json::{Number, Value};

use crate::app::models::ParamMap;
use crate::errors::{Result, UsageError, ValueError};

/// Search query text, accepted as a string or a number
///
/// Numbers are sent in their string form, so `Query::from(2708742931_u64)`
/// and `Query::from("2708742931")` produce identical requests.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Text(String),
    Number(Number),
}

impl Query {
    /// Accepts a loosely typed value from a dynamic source (CSV, CLI, JSON)
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(Self::Text(s)),
            Value::Number(n) => Ok(Self::Number(n)),
            other => Err(UsageError::InvalidQuery {
                operation: "search",
                found: json_kind(&other),
            }
            .into()),
        }
    }

    /// Normalized text sent to the service
    pub fn to_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<&str> for Query {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Query {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

macro_rules! query_from_integer {
    ($($t:ty),*) => {
        $(impl From<$t> for Query {
            fn from(n: $t) -> Self {
                Self::Number(Number::from(n))
            }
        })*
    };
}

query_from_integer!(i32, i64, u32, u64);

/// Filter on whether files are already staged at the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    Staged,
    Unstaged,
}

impl StatusFilter {
    /// Parses a caller-supplied filter, rejecting anything but the two values
    pub fn parse(operation: &'static str, value: &str) -> Result<Self> {
        match value {
            "staged" => Ok(Self::Staged),
            "unstaged" => Ok(Self::Unstaged),
            other => Err(UsageError::InvalidStatus {
                operation,
                value: other.to_string(),
            }
            .into()),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Staged => "staged",
            Self::Unstaged => "unstaged",
        }
    }
}

/// Arguments for a file search
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// Database to search
    pub database: String,
    /// ORCID of the requesting user
    pub orcid: String,
    /// Query interpreted by the database
    pub query: Query,
    /// Optional `"staged"` / `"unstaged"` filter
    pub status: Option<String>,
    /// 0-based index of the first result
    pub offset: Option<i64>,
    /// Maximum number of results
    pub limit: Option<i64>,
    /// Database-specific parameters, must be a JSON object
    pub specific: Option<Value>,
}

impl SearchRequest {
    /// Starts a search with only the required arguments set
    pub fn new(
        database: impl Into<String>,
        orcid: impl Into<String>,
        query: impl Into<Query>,
    ) -> Self {
        Self {
            database: database.into(),
            orcid: orcid.into(),
            query: query.into(),
            status: None,
            offset: None,
            limit: None,
            specific: None,
        }
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn specific(mut self, specific: impl Into<Value>) -> Self {
        self.specific = Some(specific.into());
        self
    }

    /// Validates the request and builds the JSON body for `POST /files`
    pub fn to_wire(&self) -> Result<ParamMap> {
        const OP: &str = "search";
        let mut params = ParamMap::new();
        params.insert("database".into(), required(OP, "database", &self.database)?);
        params.insert("orcid".into(), required(OP, "orcid", &self.orcid)?);
        params.insert("query".into(), Value::String(self.query.to_text()));
        if let Some(status) = &self.status {
            let filter = StatusFilter::parse(OP, status)?;
            params.insert("status".into(), Value::String(filter.as_str().to_string()));
        }
        insert_pagination(OP, &mut params, self.offset, self.limit)?;
        if let Some(specific) = &self.specific {
            params.insert("specific".into(), object(OP, "specific", specific)?);
        }
        Ok(params)
    }
}

/// Arguments for a metadata lookup by file identifier
#[derive(Debug, Clone)]
pub struct MetadataRequest {
    /// Database holding the files
    pub database: String,
    /// ORCID of the requesting user
    pub orcid: String,
    /// File identifiers, in caller order
    pub ids: Vec<String>,
    /// 0-based index of the first result
    pub offset: Option<i64>,
    /// Maximum number of results
    pub limit: Option<i64>,
}

impl MetadataRequest {
    pub fn new<I, S>(database: impl Into<String>, orcid: impl Into<String>, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            database: database.into(),
            orcid: orcid.into(),
            ids: ids.into_iter().map(Into::into).collect(),
            offset: None,
            limit: None,
        }
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Validates the request and builds the parameters for `GET /files/by-id`
    pub fn to_wire(&self) -> Result<ParamMap> {
        const OP: &str = "fetch_metadata";
        if self.ids.is_empty() {
            return Err(UsageError::EmptyFileIds { operation: OP }.into());
        }
        let mut params = ParamMap::new();
        params.insert("database".into(), required(OP, "database", &self.database)?);
        params.insert("orcid".into(), required(OP, "orcid", &self.orcid)?);
        params.insert("ids".into(), Value::String(self.ids.join(",")));
        insert_pagination(OP, &mut params, self.offset, self.limit)?;
        Ok(params)
    }
}

/// Arguments for a transfer submission
#[derive(Debug, Clone)]
pub struct TransferRequest {
    /// ORCID of the requesting user
    pub orcid: String,
    /// Files to transfer, in caller order
    pub file_ids: Vec<String>,
    /// Source database
    pub source: String,
    /// Destination database
    pub destination: String,
    /// Human-readable Markdown description
    pub description: Option<String>,
    /// Machine-readable instructions for the destination, must be a JSON object
    pub instructions: Option<Value>,
    /// Bound on this submission call only
    pub timeout: Option<Duration>,
}

impl TransferRequest {
    pub fn new<I, S>(
        orcid: impl Into<String>,
        file_ids: I,
        source: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            orcid: orcid.into(),
            file_ids: file_ids.into_iter().map(Into::into).collect(),
            source: source.into(),
            destination: destination.into(),
            description: None,
            instructions: None,
            timeout: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn instructions(mut self, instructions: impl Into<Value>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Validates the request and builds the JSON body for `POST /transfers`
    pub fn to_wire(&self) -> Result<ParamMap> {
        const OP: &str = "transfer";
        if self.timeout.is_some_and(|t| t.is_zero()) {
            return Err(ValueError::ZeroTimeout { operation: OP }.into());
        }
        if self.file_ids.is_empty() {
            return Err(UsageError::EmptyFileIds { operation: OP }.into());
        }
        let mut params = ParamMap::new();
        params.insert("orcid".into(), required(OP, "orcid", &self.orcid)?);
        params.insert("source".into(), required(OP, "source", &self.source)?);
        params.insert(
            "destination".into(),
            required(OP, "destination", &self.destination)?,
        );
        params.insert(
            "file_ids".into(),
            Value::Array(self.file_ids.iter().cloned().map(Value::String).collect()),
        );
        if let Some(description) = self.description.as_deref().filter(|d| !d.is_empty()) {
            params.insert("description".into(), Value::String(description.to_string()));
        }
        if let Some(instructions) = &self.instructions {
            params.insert("instructions".into(), object(OP, "instructions", instructions)?);
        }
        Ok(params)
    }
}

/// Renders wire parameters as `(key, value)` pairs for a GET query string
pub fn to_query_pairs(params: &ParamMap) -> Vec<(String, String)> {
    params
        .iter()
        .map(|(key, value)| {
            let rendered = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), rendered)
        })
        .collect()
}

fn required(operation: &'static str, field: &'static str, value: &str) -> Result<Value> {
    if value.trim().is_empty() {
        return Err(UsageError::MissingField { operation, field }.into());
    }
    Ok(Value::String(value.to_string()))
}

fn object(operation: &'static str, field: &'static str, value: &Value) -> Result<Value> {
    match value {
        Value::Object(_) => Ok(value.clone()),
        other => Err(UsageError::NotAnObject {
            operation,
            field,
            found: json_kind(other),
        }
        .into()),
    }
}

fn insert_pagination(
    operation: &'static str,
    params: &mut ParamMap,
    offset: Option<i64>,
    limit: Option<i64>,
) -> Result<()> {
    if let Some(offset) = offset {
        if offset < 0 {
            return Err(ValueError::NegativeOffset { operation, offset }.into());
        }
        params.insert("offset".into(), Value::from(offset));
    }
    if let Some(limit) = limit {
        if limit < 1 {
            return Err(ValueError::LimitTooSmall { operation, limit }.into());
        }
        params.insert("limit".into(), Value::from(limit));
    }
    Ok(())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

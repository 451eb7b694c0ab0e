//! Record gateway: the remote table API every storefront service sits on.
//!
//! # Architecture
//!
//! - Records are flat JSON objects keyed by field name; custom fields carry a
//!   `_c` suffix and every row has an integer `Id`.
//! - The gateway is the source of truth - NO local cache, every read re-fetches.
//! - Services receive the gateway as an explicit `Arc<dyn RecordGateway>`.
//!
//! # Implementations
//!
//! - [`HttpGateway`] - JSON over HTTPS via `reqwest`
//! - [`InMemoryGateway`] - process-local tables for tests and local development
//!
//! # Conditional writes
//!
//! Read-modify-write sequences (cart merges, wishlist inserts, order status
//! updates) go through [`RecordGateway::create_unique`] and
//! [`RecordGateway::update_if`] so concurrent callers cannot create duplicate
//! rows or silently drop each other's updates.

mod http;
mod memory;
mod params;
mod wire;

pub use http::HttpGateway;
pub use memory::{CallCounts, InMemoryGateway};
pub use params::{FetchQuery, Filter, Operator, OrderBy, Paging, SortDirection};

use async_trait::async_trait;
use atelier_core::RecordId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Name of the system ID field present on every table.
pub const ID_FIELD: &str = "Id";

/// Errors that can occur when talking to the record gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The gateway could not be reached at all.
    #[error("Gateway unavailable: {0}")]
    Unavailable(String),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway answered with `success: false`.
    #[error("Gateway rejected request: {}", .0.as_deref().unwrap_or("(no message)"))]
    Rejected(Option<String>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Rate limited by the gateway.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The response parsed but did not have the expected shape.
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl GatewayError {
    /// The gateway-supplied message, if the gateway rejected the call with one.
    #[must_use]
    pub fn gateway_message(&self) -> Option<&str> {
        match self {
            Self::Rejected(message) => message.as_deref(),
            _ => None,
        }
    }
}

/// A flat record as stored in a remote table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// An empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field setter.
    #[must_use]
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    /// Set a field, replacing any previous value.
    pub fn insert(&mut self, field: &str, value: impl Into<Value>) {
        self.0.insert(field.to_string(), value.into());
    }

    /// Get a field value.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Get a field value, treating a missing field as `null`.
    #[must_use]
    pub fn get_or_null(&self, field: &str) -> Value {
        self.0.get(field).cloned().unwrap_or(Value::Null)
    }

    /// The row ID, if present and integral.
    #[must_use]
    pub fn id(&self) -> Option<RecordId> {
        match self.0.get(ID_FIELD)? {
            Value::Number(n) => n.as_i64().map(RecordId::new),
            Value::String(s) => s.trim().parse().ok().map(RecordId::new),
            _ => None,
        }
    }

    /// Set the row ID.
    pub fn set_id(&mut self, id: RecordId) {
        self.insert(ID_FIELD, id.as_i64());
    }

    /// Iterate over `(field, value)` pairs.
    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Copy every field of `other` into this record.
    pub fn merge(&mut self, other: &Self) {
        for (field, value) in other.fields() {
            self.0.insert(field.clone(), value.clone());
        }
    }

    /// Keep only the listed fields (plus `Id`). An empty list keeps everything.
    #[must_use]
    pub fn project(&self, fields: &[String]) -> Self {
        if fields.is_empty() {
            return self.clone();
        }
        Self(
            self.0
                .iter()
                .filter(|(name, _)| name.as_str() == ID_FIELD || fields.contains(name))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
        )
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Outcome of one record in a create call.
#[derive(Debug, Clone, PartialEq)]
pub enum CreateResult {
    /// The record was stored; carries the stored record including its `Id`.
    Created(Record),
    /// The gateway refused this record.
    Failed(Option<String>),
}

/// Outcome of [`RecordGateway::create_unique`].
#[derive(Debug, Clone, PartialEq)]
pub enum UniqueCreate {
    /// No row matched the key; a new row was inserted.
    Created(RecordId),
    /// A row with the same key already exists; nothing was inserted.
    Existing(Record),
}

/// Remote CRUD over named tables.
#[async_trait]
pub trait RecordGateway: Send + Sync {
    /// Fetch records matching `query`.
    async fn fetch_records(&self, table: &str, query: &FetchQuery)
    -> Result<Vec<Record>, GatewayError>;

    /// Fetch one record by ID, projected to `fields`. `Ok(None)` when absent.
    async fn get_record_by_id(
        &self,
        table: &str,
        id: RecordId,
        fields: &[String],
    ) -> Result<Option<Record>, GatewayError>;

    /// Insert records, reporting a result per record in input order.
    async fn create_records(
        &self,
        table: &str,
        records: Vec<Record>,
    ) -> Result<Vec<CreateResult>, GatewayError>;

    /// Insert `record` unless a row with equal values in all `key_fields`
    /// already exists. The check and the insert are atomic on the gateway.
    async fn create_unique(
        &self,
        table: &str,
        record: Record,
        key_fields: &[&str],
    ) -> Result<UniqueCreate, GatewayError>;

    /// Update records by `Id`; only the supplied fields change.
    async fn update_records(&self, table: &str, records: Vec<Record>) -> Result<(), GatewayError>;

    /// Update one record by `Id` only if every field in `expected` still
    /// holds the given value. Returns whether the update was applied.
    async fn update_if(
        &self,
        table: &str,
        record: Record,
        expected: Record,
    ) -> Result<bool, GatewayError>;

    /// Delete records by ID.
    async fn delete_records(&self, table: &str, ids: &[RecordId]) -> Result<(), GatewayError>;
}

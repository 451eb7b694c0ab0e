//! In-memory record gateway.
//!
//! Implements the full [`RecordGateway`] contract over process-local tables,
//! including filter evaluation, grouping, ordering and paging, so services can
//! be exercised without a hosted backend. Also counts calls per operation and
//! can be switched into failure modes for error-path tests.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use atelier_core::RecordId;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{
    CreateResult, FetchQuery, Filter, GatewayError, ID_FIELD, Operator, Record, RecordGateway,
    SortDirection, UniqueCreate,
};

/// Number of gateway calls made, per operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub fetch: usize,
    pub get: usize,
    pub create: usize,
    pub update: usize,
    pub delete: usize,
}

#[derive(Debug, Clone)]
enum FailureMode {
    Unavailable,
    Reject(Option<String>),
}

#[derive(Debug, Default)]
struct MemoryState {
    tables: HashMap<String, Vec<Record>>,
    next_id: i64,
    calls: CallCounts,
    failure: Option<FailureMode>,
}

impl MemoryState {
    fn check(&self) -> Result<(), GatewayError> {
        match &self.failure {
            None => Ok(()),
            Some(FailureMode::Unavailable) => {
                Err(GatewayError::Unavailable("in-memory gateway offline".to_string()))
            }
            Some(FailureMode::Reject(message)) => Err(GatewayError::Rejected(message.clone())),
        }
    }

    fn insert(&mut self, table: &str, mut record: Record) -> Record {
        self.next_id += 1;
        record.set_id(RecordId::new(self.next_id));
        self.tables
            .entry(table.to_string())
            .or_default()
            .push(record.clone());
        record
    }

    fn find_mut(&mut self, table: &str, id: RecordId) -> Option<&mut Record> {
        self.tables
            .get_mut(table)?
            .iter_mut()
            .find(|r| r.id() == Some(id))
    }
}

/// Process-local implementation of [`RecordGateway`].
///
/// Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGateway {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryGateway {
    /// Create an empty gateway.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert rows directly, bypassing call counting. Returns assigned IDs.
    pub async fn seed(&self, table: &str, records: Vec<Record>) -> Vec<RecordId> {
        let mut state = self.state.write().await;
        records
            .into_iter()
            .filter_map(|record| state.insert(table, record).id())
            .collect()
    }

    /// Snapshot of every row in `table`, in insertion order.
    pub async fn records(&self, table: &str) -> Vec<Record> {
        let state = self.state.read().await;
        state.tables.get(table).cloned().unwrap_or_default()
    }

    /// Calls made so far.
    pub async fn calls(&self) -> CallCounts {
        self.state.read().await.calls
    }

    /// Make every subsequent call fail as if the gateway were unreachable.
    pub async fn go_offline(&self) {
        self.state.write().await.failure = Some(FailureMode::Unavailable);
    }

    /// Make every subsequent call fail with `success: false` and `message`.
    pub async fn reject_all(&self, message: Option<&str>) {
        self.state.write().await.failure =
            Some(FailureMode::Reject(message.map(ToString::to_string)));
    }

    /// Clear any failure mode.
    pub async fn recover(&self) {
        self.state.write().await.failure = None;
    }
}

// =============================================================================
// Filter evaluation
// =============================================================================

/// A lookup object (`{"Id": 7, ...}`) compares as the ID it carries.
fn reference_id(value: &Value) -> &Value {
    match value {
        Value::Object(map) => map.get(ID_FIELD).unwrap_or(value),
        other => other,
    }
}

/// Loose equality: numbers compare numerically, and a string equals a number
/// or boolean when it renders the same. A missing field equals `null`.
fn values_equal(left: &Value, right: &Value) -> bool {
    let (left, right) = (reference_id(left), reference_id(right));
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::String(s), other @ (Value::Number(_) | Value::Bool(_)))
        | (other @ (Value::Number(_) | Value::Bool(_)), Value::String(s)) => {
            s.trim() == other.to_string()
        }
        _ => left == right,
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn clause_matches(record: &Record, filter: &Filter) -> bool {
    let field = record.get_or_null(&filter.field_name);
    let hit = filter.values.iter().any(|value| match filter.operator {
        Operator::EqualTo => values_equal(&field, value),
        Operator::NotEqualTo => !values_equal(&field, value),
        Operator::Contains => as_text(&field)
            .to_lowercase()
            .contains(&as_text(value).to_lowercase()),
        Operator::GreaterThanOrEqualTo => {
            matches!((as_number(&field), as_number(value)), (Some(a), Some(b)) if a >= b)
        }
        Operator::LessThanOrEqualTo => {
            matches!((as_number(&field), as_number(value)), (Some(a), Some(b)) if a <= b)
        }
    });
    hit == filter.include
}

fn compare_field(a: &Record, b: &Record, field: &str) -> Ordering {
    let (left, right) = (a.get_or_null(field), b.get_or_null(field));
    match (as_number(&left), as_number(&right)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => as_text(&left).cmp(&as_text(&right)),
    }
}

fn group_key(record: &Record, fields: &[String]) -> Vec<String> {
    fields
        .iter()
        .map(|field| as_text(&record.get_or_null(field)))
        .collect()
}

fn run_query(rows: &[Record], query: &FetchQuery) -> Vec<Record> {
    let mut matched: Vec<&Record> = rows
        .iter()
        .filter(|record| query.filters.iter().all(|f| clause_matches(record, f)))
        .collect();

    if !query.group_by.is_empty() {
        let mut seen = Vec::new();
        matched.retain(|record| {
            let key = group_key(record, &query.group_by);
            if seen.contains(&key) {
                false
            } else {
                seen.push(key);
                true
            }
        });
    }

    matched.sort_by(|a, b| {
        query
            .order_by
            .iter()
            .map(|order| {
                let ordering = compare_field(a, b, &order.field_name);
                match order.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    });

    let (offset, limit) = query.paging.map_or((0, usize::MAX), |p| {
        (p.offset as usize, p.limit as usize)
    });

    matched
        .into_iter()
        .skip(offset)
        .take(limit)
        .map(|record| record.project(&query.fields))
        .collect()
}

#[async_trait]
impl RecordGateway for InMemoryGateway {
    async fn fetch_records(
        &self,
        table: &str,
        query: &FetchQuery,
    ) -> Result<Vec<Record>, GatewayError> {
        let mut state = self.state.write().await;
        state.calls.fetch += 1;
        state.check()?;
        Ok(state
            .tables
            .get(table)
            .map(|rows| run_query(rows, query))
            .unwrap_or_default())
    }

    async fn get_record_by_id(
        &self,
        table: &str,
        id: RecordId,
        fields: &[String],
    ) -> Result<Option<Record>, GatewayError> {
        let mut state = self.state.write().await;
        state.calls.get += 1;
        state.check()?;
        Ok(state
            .tables
            .get(table)
            .and_then(|rows| rows.iter().find(|r| r.id() == Some(id)))
            .map(|record| record.project(fields)))
    }

    async fn create_records(
        &self,
        table: &str,
        records: Vec<Record>,
    ) -> Result<Vec<CreateResult>, GatewayError> {
        let mut state = self.state.write().await;
        state.calls.create += 1;
        state.check()?;
        Ok(records
            .into_iter()
            .map(|record| CreateResult::Created(state.insert(table, record)))
            .collect())
    }

    async fn create_unique(
        &self,
        table: &str,
        record: Record,
        key_fields: &[&str],
    ) -> Result<UniqueCreate, GatewayError> {
        let mut state = self.state.write().await;
        state.calls.create += 1;
        state.check()?;

        let existing = state.tables.get(table).and_then(|rows| {
            rows.iter().find(|row| {
                key_fields
                    .iter()
                    .all(|field| values_equal(&row.get_or_null(field), &record.get_or_null(field)))
            })
        });

        if let Some(existing) = existing {
            return Ok(UniqueCreate::Existing(existing.clone()));
        }

        let created = state.insert(table, record);
        created
            .id()
            .map(UniqueCreate::Created)
            .ok_or_else(|| GatewayError::Malformed("created record without Id".to_string()))
    }

    async fn update_records(&self, table: &str, records: Vec<Record>) -> Result<(), GatewayError> {
        let mut state = self.state.write().await;
        state.calls.update += 1;
        state.check()?;

        for record in records {
            let id = record
                .id()
                .ok_or_else(|| GatewayError::Rejected(Some("Record is missing Id".to_string())))?;
            let row = state
                .find_mut(table, id)
                .ok_or_else(|| GatewayError::Rejected(Some(format!("Record {id} not found"))))?;
            row.merge(&record);
        }
        Ok(())
    }

    async fn update_if(
        &self,
        table: &str,
        record: Record,
        expected: Record,
    ) -> Result<bool, GatewayError> {
        let mut state = self.state.write().await;
        state.calls.update += 1;
        state.check()?;

        let id = record
            .id()
            .ok_or_else(|| GatewayError::Rejected(Some("Record is missing Id".to_string())))?;
        let row = state
            .find_mut(table, id)
            .ok_or_else(|| GatewayError::Rejected(Some(format!("Record {id} not found"))))?;

        let unchanged = expected
            .fields()
            .all(|(field, value)| values_equal(&row.get_or_null(field), value));
        if unchanged {
            row.merge(&record);
        }
        Ok(unchanged)
    }

    async fn delete_records(&self, table: &str, ids: &[RecordId]) -> Result<(), GatewayError> {
        let mut state = self.state.write().await;
        state.calls.delete += 1;
        state.check()?;

        if let Some(rows) = state.tables.get_mut(table) {
            rows.retain(|row| row.id().is_none_or(|id| !ids.contains(&id)));
        }
        Ok(())
    }
}

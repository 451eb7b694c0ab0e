//! JSON request and response bodies of the HTTP gateway.

use atelier_core::RecordId;
use serde::{Deserialize, Serialize};

use super::params::{FetchQuery, Filter, OrderBy, Paging};
use super::Record;

/// `{"field": {"Name": "..."}}` projection entry.
#[derive(Debug, Serialize)]
pub struct FieldRef<'a> {
    field: FieldName<'a>,
}

#[derive(Debug, Serialize)]
struct FieldName<'a> {
    #[serde(rename = "Name")]
    name: &'a str,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_empty_slice<T>(slice: &&[T]) -> bool {
    slice.is_empty()
}

fn field_refs(fields: &[String]) -> Vec<FieldRef<'_>> {
    fields
        .iter()
        .map(|name| FieldRef {
            field: FieldName { name },
        })
        .collect()
}

/// Body of `POST tables/{table}/fetch`.
#[derive(Debug, Serialize)]
pub struct FetchBody<'a> {
    fields: Vec<FieldRef<'a>>,
    #[serde(rename = "where", skip_serializing_if = "is_empty_slice")]
    filters: &'a [Filter],
    #[serde(rename = "orderBy", skip_serializing_if = "is_empty_slice")]
    order_by: &'a [OrderBy],
    #[serde(rename = "groupBy", skip_serializing_if = "is_empty_slice")]
    group_by: &'a [String],
    #[serde(rename = "pagingInfo", skip_serializing_if = "Option::is_none")]
    paging: Option<Paging>,
}

impl<'a> From<&'a FetchQuery> for FetchBody<'a> {
    fn from(query: &'a FetchQuery) -> Self {
        Self {
            fields: field_refs(&query.fields),
            filters: &query.filters,
            order_by: &query.order_by,
            group_by: &query.group_by,
            paging: query.paging,
        }
    }
}

/// Body of `POST tables/{table}/records/{id}`.
#[derive(Debug, Serialize)]
pub struct GetByIdBody<'a> {
    fields: Vec<FieldRef<'a>>,
}

impl<'a> GetByIdBody<'a> {
    pub fn new(fields: &'a [String]) -> Self {
        Self {
            fields: field_refs(fields),
        }
    }
}

/// Body of create and update calls.
#[derive(Debug, Serialize)]
pub struct RecordsBody {
    pub records: Vec<Record>,
    /// Preconditions of a conditional update, as `EqualTo` clauses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<Filter>>,
}

/// Body of `POST tables/{table}/records/unique`.
#[derive(Debug, Serialize)]
pub struct UniqueBody<'a> {
    pub records: Vec<Record>,
    #[serde(rename = "keyFields")]
    pub key_fields: &'a [&'a str],
}

/// Body of `DELETE tables/{table}/records`.
#[derive(Debug, Serialize)]
pub struct DeleteBody<'a> {
    #[serde(rename = "RecordIds")]
    pub record_ids: &'a [RecordId],
}

/// Response envelope shared by every endpoint.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub results: Vec<ResultEntry>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Per-record result of a create call.
#[derive(Debug, Deserialize)]
pub struct ResultEntry {
    pub success: bool,
    #[serde(default)]
    pub data: Option<Record>,
    #[serde(default)]
    pub message: Option<String>,
}

/// `data` of a unique-create response.
#[derive(Debug, Deserialize)]
pub struct UniqueData {
    pub created: bool,
    pub record: Record,
}

/// `data` of a conditional update response.
#[derive(Debug, Deserialize)]
pub struct ConditionalData {
    pub applied: bool,
}

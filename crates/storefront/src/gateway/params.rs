//! Fetch parameters: projection, filter clauses, ordering and paging.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Comparison operator of a filter clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    EqualTo,
    NotEqualTo,
    Contains,
    GreaterThanOrEqualTo,
    LessThanOrEqualTo,
}

/// A single `where` clause.
///
/// `values` has any-of semantics; `include = false` negates the clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(rename = "FieldName")]
    pub field_name: String,
    #[serde(rename = "Operator")]
    pub operator: Operator,
    #[serde(rename = "Values")]
    pub values: Vec<Value>,
    #[serde(rename = "Include")]
    pub include: bool,
}

impl Filter {
    /// Build an including clause with a single value.
    #[must_use]
    pub fn new(field_name: &str, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            field_name: field_name.to_string(),
            operator,
            values: vec![value.into()],
            include: true,
        }
    }

    /// `field == value`.
    #[must_use]
    pub fn equal_to(field_name: &str, value: impl Into<Value>) -> Self {
        Self::new(field_name, Operator::EqualTo, value)
    }

    /// `field` contains the substring `value`.
    #[must_use]
    pub fn contains(field_name: &str, value: impl Into<Value>) -> Self {
        Self::new(field_name, Operator::Contains, value)
    }
}

/// Sort direction of an `orderBy` directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    #[serde(rename = "ASC")]
    Asc,
    #[serde(rename = "DESC")]
    Desc,
}

/// One `orderBy` directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    #[serde(rename = "fieldName")]
    pub field_name: String,
    #[serde(rename = "sorttype")]
    pub direction: SortDirection,
}

/// Limit/offset paging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paging {
    pub limit: u32,
    pub offset: u32,
}

/// Parameters of a fetch call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchQuery {
    /// Fields to project. Empty means every field.
    pub fields: Vec<String>,
    pub filters: Vec<Filter>,
    pub order_by: Vec<OrderBy>,
    pub group_by: Vec<String>,
    pub paging: Option<Paging>,
}

impl FetchQuery {
    /// Start a query projecting `fields`.
    #[must_use]
    pub fn new(fields: &[&str]) -> Self {
        Self {
            fields: fields.iter().map(|f| (*f).to_string()).collect(),
            ..Self::default()
        }
    }

    /// Add a filter clause.
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Add several filter clauses.
    #[must_use]
    pub fn filters(mut self, filters: impl IntoIterator<Item = Filter>) -> Self {
        self.filters.extend(filters);
        self
    }

    /// Add an ordering directive.
    #[must_use]
    pub fn order_by(mut self, field_name: &str, direction: SortDirection) -> Self {
        self.order_by.push(OrderBy {
            field_name: field_name.to_string(),
            direction,
        });
        self
    }

    /// Group rows by a field.
    #[must_use]
    pub fn group_by(mut self, field_name: &str) -> Self {
        self.group_by.push(field_name.to_string());
        self
    }

    /// Return at most `limit` rows starting at `offset`.
    #[must_use]
    pub const fn page(mut self, limit: u32, offset: u32) -> Self {
        self.paging = Some(Paging { limit, offset });
        self
    }
}

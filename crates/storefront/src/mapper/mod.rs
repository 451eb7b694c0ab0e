//! Conversions between gateway records and domain models.
//!
//! Reading is forgiving: every field has a default, numbers may arrive as
//! JSON numbers or numeric strings, and negative amounts clamp to zero.
//! Writing produces exactly the fields a table expects. The round trip is
//! lossy (trimming, defaulting), so `write(read(x))` need not equal `x`.

pub mod cart;
pub mod order;
pub mod product;
pub mod wishlist;

use std::str::FromStr;

use atelier_core::Price;
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::gateway::{ID_FIELD, Record};

/// Delimiter of image lists.
pub const IMAGE_DELIMITER: char = '\n';

/// Delimiter of size and color lists.
pub const OPTION_DELIMITER: char = ',';

/// Owned copy of a field list, as `get_record_by_id` expects.
#[must_use]
pub fn owned_fields(fields: &[&str]) -> Vec<String> {
    fields.iter().map(|field| (*field).to_string()).collect()
}

/// Convert every record with `convert`, dropping (and logging) rows it rejects.
pub fn convert_all<T>(
    table: &str,
    records: &[Record],
    convert: impl Fn(&Record) -> Option<T>,
) -> Vec<T> {
    records
        .iter()
        .filter_map(|record| {
            let converted = convert(record);
            if converted.is_none() {
                warn!(table = %table, id = ?record.get(ID_FIELD), "Skipping unreadable record");
            }
            converted
        })
        .collect()
}

// =============================================================================
// Read helpers
// =============================================================================

/// Parse a decimal from a JSON number or numeric string.
fn parse_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .ok()
            .or_else(|| n.as_f64().and_then(Decimal::from_f64)),
        Value::String(s) => {
            let s = s.trim();
            Decimal::from_str(s)
                .ok()
                .or_else(|| Decimal::from_scientific(s).ok())
        }
        _ => None,
    }
}

/// Decimal field, `0` when missing or unparsable.
#[must_use]
pub fn decimal_field(record: &Record, field: &str) -> Decimal {
    record
        .get(field)
        .and_then(parse_decimal)
        .unwrap_or(Decimal::ZERO)
}

/// Price field, clamped to zero.
#[must_use]
pub fn price_field(record: &Record, field: &str) -> Price {
    Price::new(decimal_field(record, field))
}

/// Non-negative count field; fractions truncate and negatives clamp to zero.
///
/// Returns `default` when the field is missing or unparsable.
#[must_use]
pub fn count_field(record: &Record, field: &str, default: u32) -> u32 {
    let Some(decimal) = record.get(field).and_then(parse_decimal) else {
        return default;
    };
    let whole = decimal.trunc().max(Decimal::ZERO);
    whole.to_u32().unwrap_or(u32::MAX)
}

/// Text field; numbers are rendered, anything else reads as empty.
#[must_use]
pub fn text_field(record: &Record, field: &str) -> String {
    match record.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Boolean field, `false` when missing. Accepts `"true"`/`"false"` strings.
#[must_use]
pub fn bool_field(record: &Record, field: &str) -> bool {
    match record.get(field) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
        _ => false,
    }
}

/// Lookup field pointing at another table's row.
///
/// Accepts an integer, a numeric string, or an object carrying `Id`.
#[must_use]
pub fn reference_field(record: &Record, field: &str) -> Option<i64> {
    fn parse(value: &Value) -> Option<i64> {
        match value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            Value::Object(map) => map.get(ID_FIELD).and_then(parse),
            _ => None,
        }
    }
    record.get(field).and_then(parse)
}

/// Delimited list field: split, trim, drop empty segments.
#[must_use]
pub fn list_field(record: &Record, field: &str, delimiter: char) -> Vec<String> {
    match record.get(field) {
        Some(Value::String(s)) => split_list(s, delimiter),
        Some(Value::Array(values)) => values
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Split delimited text, trimming segments and dropping empty ones.
#[must_use]
pub fn split_list(text: &str, delimiter: char) -> Vec<String> {
    text.split(delimiter)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// JSON blob stored as text (or, leniently, as a JSON value).
///
/// Missing or empty blobs read as `T::default()`; unparsable ones are logged
/// and also read as the default.
pub fn json_field<T>(record: &Record, field: &str) -> T
where
    T: DeserializeOwned + Default,
{
    let parsed = match record.get(field) {
        None | Some(Value::Null) => return T::default(),
        Some(Value::String(text)) if text.trim().is_empty() => return T::default(),
        Some(Value::String(text)) => serde_json::from_str(text),
        Some(value) => serde_json::from_value(value.clone()),
    };
    parsed.unwrap_or_else(|e| {
        warn!(field = %field, id = ?record.id(), error = %e, "Unparsable JSON field, using default");
        T::default()
    })
}

// =============================================================================
// Write helpers
// =============================================================================

/// JSON value for a decimal amount.
///
/// Written as a JSON number; amounts outside `f64` range fall back to text.
#[must_use]
pub fn decimal_value(amount: Decimal) -> Value {
    amount
        .to_f64()
        .and_then(serde_json::Number::from_f64)
        .map_or_else(|| Value::String(amount.to_string()), Value::Number)
}

/// Join list items with `delimiter`.
#[must_use]
pub fn join_list(items: &[String], delimiter: char) -> String {
    items.join(&delimiter.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(field: &str, value: Value) -> Record {
        Record::new().with(field, value)
    }

    #[test]
    fn test_decimal_field_accepts_numbers_and_strings() {
        assert_eq!(decimal_field(&record("p", json!(12.5)), "p"), Decimal::new(125, 1));
        assert_eq!(decimal_field(&record("p", json!(" 40 ")), "p"), Decimal::new(40, 0));
        assert_eq!(decimal_field(&record("p", json!("abc")), "p"), Decimal::ZERO);
        assert_eq!(decimal_field(&Record::new(), "p"), Decimal::ZERO);
    }

    #[test]
    fn test_price_field_clamps_negative() {
        assert_eq!(price_field(&record("p", json!(-5)), "p"), Price::ZERO);
    }

    #[test]
    fn test_count_field() {
        assert_eq!(count_field(&record("q", json!(3)), "q", 1), 3);
        assert_eq!(count_field(&record("q", json!("4")), "q", 1), 4);
        assert_eq!(count_field(&record("q", json!(2.9)), "q", 1), 2);
        assert_eq!(count_field(&record("q", json!(-7)), "q", 1), 0);
        assert_eq!(count_field(&record("q", json!("many")), "q", 1), 1);
        assert_eq!(count_field(&Record::new(), "q", 0), 0);
    }

    #[test]
    fn test_bool_field() {
        assert!(bool_field(&record("f", json!(true)), "f"));
        assert!(bool_field(&record("f", json!("TRUE")), "f"));
        assert!(!bool_field(&record("f", json!("false")), "f"));
        assert!(!bool_field(&Record::new(), "f"));
    }

    #[test]
    fn test_reference_field_shapes() {
        assert_eq!(reference_field(&record("r", json!(5)), "r"), Some(5));
        assert_eq!(reference_field(&record("r", json!("6")), "r"), Some(6));
        assert_eq!(
            reference_field(&record("r", json!({"Id": 7, "Name": "Tote"})), "r"),
            Some(7)
        );
        assert_eq!(reference_field(&record("r", json!(null)), "r"), None);
    }

    #[test]
    fn test_list_field_trims_and_drops_empty() {
        let images = record("i", json!("a.jpg\n  b.jpg \n\n"));
        assert_eq!(list_field(&images, "i", IMAGE_DELIMITER), vec!["a.jpg", "b.jpg"]);

        let sizes = record("s", json!("S, M,,L "));
        assert_eq!(list_field(&sizes, "s", OPTION_DELIMITER), vec!["S", "M", "L"]);

        assert!(list_field(&Record::new(), "s", OPTION_DELIMITER).is_empty());
    }

    #[test]
    fn test_json_field_defaults_on_garbage() {
        let garbage = record("t", json!("{not json"));
        let parsed: Vec<String> = json_field(&garbage, "t");
        assert!(parsed.is_empty());

        let text = record("t", json!(r#"["a","b"]"#));
        let parsed: Vec<String> = json_field(&text, "t");
        assert_eq!(parsed, vec!["a", "b"]);
    }

    #[test]
    fn test_decimal_value_is_numeric() {
        assert_eq!(decimal_value(Decimal::new(4950, 2)), json!(49.5));
    }
}

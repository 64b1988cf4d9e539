//! SQL text helpers and conversion of OGR field values.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use gdal::vector::sql::Dialect;
use gdal::vector::{FieldValue, LayerAccess};
use serde_json::{Number, Value};

use crate::dataset::SourceDataset;
use crate::error::{Result, SourceError};

/// Double-quote an identifier.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Timestamp literal accepted by both OGR SQL and PostgreSQL, with
/// millisecond precision.
pub(crate) fn timestamp_literal(value: &DateTime<Utc>) -> String {
    format!("'{}'", value.format("%Y-%m-%dT%H:%M:%S%.3fZ"))
}

/// Run a query and return the first column of its first row.
pub(crate) fn first_row(source: &SourceDataset, query: &str, dialect: Dialect) -> Result<Option<FieldValue>> {
    let mut result = source
        .dataset()
        .execute_sql(query, None, dialect)?
        .ok_or_else(|| SourceError::UnexpectedResult(format!("no result set for '{}'", query)))?;

    let value = result
        .features()
        .next()
        .and_then(|feature| feature.fields().next())
        .and_then(|(_, value)| value);
    Ok(value)
}

/// Read a `COUNT(*)` style result.
pub(crate) fn field_value_as_u64(value: Option<FieldValue>) -> Result<u64> {
    match value {
        Some(FieldValue::IntegerValue(n)) if n >= 0 => Ok(n as u64),
        Some(FieldValue::Integer64Value(n)) if n >= 0 => Ok(n as u64),
        Some(FieldValue::StringValue(s)) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| SourceError::UnexpectedResult(format!("count '{}' is not an integer", s))),
        other => Err(SourceError::UnexpectedResult(format!("unexpected count value {:?}", other))),
    }
}

/// JSON form of an attribute value. Non-finite reals become `null`.
pub(crate) fn field_value_to_json(value: FieldValue) -> Value {
    match value {
        FieldValue::IntegerValue(n) => Value::from(n),
        FieldValue::Integer64Value(n) => Value::from(n),
        FieldValue::RealValue(x) => real_to_json(x),
        FieldValue::StringValue(s) => Value::String(s),
        FieldValue::DateValue(date) => Value::String(date.format("%Y-%m-%d").to_string()),
        FieldValue::DateTimeValue(dt) => {
            Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
        }
        FieldValue::IntegerListValue(list) => list.into_iter().map(Value::from).collect(),
        FieldValue::Integer64ListValue(list) => list.into_iter().map(Value::from).collect(),
        FieldValue::RealListValue(list) => list.into_iter().map(real_to_json).collect(),
        FieldValue::StringListValue(list) => list.into_iter().map(Value::String).collect(),
    }
}

fn real_to_json(x: f64) -> Value {
    Number::from_f64(x).map(Value::Number).unwrap_or(Value::Null)
}

/// ISO 8601 text of a date, datetime or datetime-like string value.
pub(crate) fn field_value_to_iso(value: FieldValue) -> Option<String> {
    match value {
        FieldValue::DateTimeValue(dt) => Some(
            dt.with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Secs, true),
        ),
        FieldValue::DateValue(date) => Some(date_start(date)),
        FieldValue::StringValue(s) => Some(normalize_datetime_text(&s)),
        _ => None,
    }
}

fn date_start(date: NaiveDate) -> String {
    format!("{}T00:00:00Z", date.format("%Y-%m-%d"))
}

/// Normalise the datetime spellings OGR produces (`2024/01/31 12:00:00`,
/// with or without an offset) to RFC 3339. Unrecognised text is returned
/// unchanged.
fn normalize_datetime_text(text: &str) -> String {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return dt.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Secs, true);
    }
    for format in ["%Y/%m/%d %H:%M:%S%#z", "%Y-%m-%d %H:%M:%S%#z"] {
        if let Ok(dt) = DateTime::parse_from_str(text, format) {
            return dt.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Secs, true);
        }
    }
    for format in ["%Y/%m/%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return naive.and_utc().to_rfc3339_opts(SecondsFormat::Secs, true);
        }
    }
    for format in ["%Y/%m/%d", "%Y-%m-%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date_start(date);
        }
    }
    text.to_string()
}

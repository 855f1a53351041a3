//! Per-type value checks and coercions.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Number, Value};

use super::FieldError;
use super::options::SelectConfig;
use crate::models::column::ColumnType;

const DATE_FORMAT: &str = "%Y-%m-%d";
const LOCAL_DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];

/// Check `value` against `column_type`, returning the coerced value.
pub(super) fn coerce(
    column_type: ColumnType,
    select: &SelectConfig,
    key: &str,
    value: &Value,
) -> Result<Value, FieldError> {
    let mismatch = || FieldError::TypeMismatch {
        key: key.to_string(),
        expected: column_type,
    };

    match column_type {
        ColumnType::Text | ColumnType::Textarea => match value {
            Value::String(_) => Ok(value.clone()),
            _ => Err(mismatch()),
        },
        ColumnType::Number => match value {
            Value::Number(_) => Ok(value.clone()),
            Value::String(s) => parse_number(s).map(Value::Number).ok_or_else(mismatch),
            _ => Err(mismatch()),
        },
        ColumnType::Boolean => match value {
            Value::Bool(_) => Ok(value.clone()),
            Value::String(s) if s.trim().eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
            Value::String(s) if s.trim().eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
            _ => Err(mismatch()),
        },
        ColumnType::Date | ColumnType::Datetime => match value {
            Value::String(s) if parse_temporal(column_type, s).is_some() => Ok(value.clone()),
            _ => Err(mismatch()),
        },
        ColumnType::Email => match value {
            Value::String(s) if looks_like_email(s) => Ok(value.clone()),
            _ => Err(mismatch()),
        },
        ColumnType::Url => match value {
            Value::String(s) if looks_like_url(s) => Ok(value.clone()),
            _ => Err(mismatch()),
        },
        ColumnType::Select => coerce_select(select, key, value).ok_or_else(mismatch)?,
    }
}

/// Parse a date or datetime literal into a comparable timestamp.
/// Dates map to midnight; offset datetimes are normalized to UTC.
pub(super) fn parse_temporal(column_type: ColumnType, raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    match column_type {
        ColumnType::Date => NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0)),
        ColumnType::Datetime => DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.naive_utc())
            .ok()
            .or_else(|| {
                LOCAL_DATETIME_FORMATS
                    .iter()
                    .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            }),
        _ => None,
    }
}

/// Outer `None` means the value has the wrong shape entirely.
fn coerce_select(
    select: &SelectConfig,
    key: &str,
    value: &Value,
) -> Option<Result<Value, FieldError>> {
    let check = |candidate: &Value| -> Option<Result<(), FieldError>> {
        let text = scalar_text(candidate)?;
        if select.allows(&text) {
            Some(Ok(()))
        } else {
            Some(Err(FieldError::InvalidOption {
                key: key.to_string(),
                value: text,
            }))
        }
    };

    match value {
        Value::Array(items) if select.multiple => {
            for item in items {
                if let Err(e) = check(item)? {
                    return Some(Err(e));
                }
            }
            Some(Ok(value.clone()))
        }
        Value::Array(_) => None,
        _ => Some(check(value)?.map(|()| value.clone())),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_number(raw: &str) -> Option<Number> {
    let raw = raw.trim();
    if let Ok(i) = raw.parse::<i64>() {
        return Some(Number::from(i));
    }
    raw.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .and_then(Number::from_f64)
}

/// Lightweight check: one `@`, non-empty local part, dotted domain,
/// no whitespace.
fn looks_like_email(raw: &str) -> bool {
    if raw.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = raw.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

fn looks_like_url(raw: &str) -> bool {
    url::Url::parse(raw.trim())
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host().is_some())
        .unwrap_or(false)
}

//! Column validation rules.
//!
//! Rules are stored as free-form JSON on the column so that businesses
//! can attach their own constraints. This module turns that JSON into a
//! typed [`RuleSet`]. Recognized rules:
//!
//! | Rule | Applies to |
//! |---|---|
//! | `min` / `max` | numeric value (`number`), character length (text-like and `select`), calendar bound (`date`, `datetime`) |
//! | `minLength` / `maxLength` | character length of string values |
//! | `pattern` | regular expression over string values |
//!
//! Unrecognized rule names are ignored.

use regex::Regex;
use serde_json::{Map, Value};

use super::coerce::parse_temporal;
use crate::models::column::ColumnType;

/// Lower or upper bound, numeric or a date/datetime literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Bound {
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    pub min: Option<Bound>,
    pub max: Option<Bound>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<Regex>,
}

impl RuleSet {
    /// Parse stored rules. `None` and JSON `null` yield an empty set.
    pub fn from_value(rules: Option<&Value>) -> Result<Self, String> {
        let map = match rules {
            None | Some(Value::Null) => return Ok(Self::default()),
            Some(Value::Object(map)) => map,
            Some(_) => return Err("validation rules must be an object".into()),
        };

        let pattern = match lookup(map, "pattern", "pattern") {
            None => None,
            Some(Value::String(p)) => Some(
                Regex::new(p).map_err(|e| format!("invalid `pattern` rule: {e}"))?,
            ),
            Some(_) => return Err("`pattern` rule must be a string".into()),
        };

        Ok(Self {
            min: bound(map, "min")?,
            max: bound(map, "max")?,
            min_length: length(map, "minLength", "min_length")?,
            max_length: length(map, "maxLength", "max_length")?,
            pattern,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.min.is_none()
            && self.max.is_none()
            && self.min_length.is_none()
            && self.max_length.is_none()
            && self.pattern.is_none()
    }

    /// Ensure bounds make sense for the column type: numeric bounds for
    /// numbers and lengths, parseable literals for dates.
    pub fn check_compatible(&self, column_type: ColumnType) -> Result<(), String> {
        for (name, bound) in [("min", &self.min), ("max", &self.max)] {
            match (column_type, bound) {
                (_, None) => {}
                (ColumnType::Date | ColumnType::Datetime, Some(Bound::Text(raw))) => {
                    if parse_temporal(column_type, raw).is_none() {
                        return Err(format!("`{name}` is not a valid {column_type}: {raw}"));
                    }
                }
                (ColumnType::Date | ColumnType::Datetime, Some(Bound::Number(_))) => {
                    return Err(format!("`{name}` for a {column_type} column must be a {column_type} literal"));
                }
                (_, Some(Bound::Text(raw))) => {
                    return Err(format!("`{name}` must be numeric, got {raw:?}"));
                }
                (_, Some(Bound::Number(_))) => {}
            }
        }
        Ok(())
    }

    /// Names of the rules that `value` (already coerced) fails.
    pub fn violations(&self, column_type: ColumnType, value: &Value) -> Vec<&'static str> {
        let mut failed = Vec::new();

        if let Some(min) = &self.min {
            if compare(column_type, value, min).is_some_and(|o| o.is_lt()) {
                failed.push("min");
            }
        }
        if let Some(max) = &self.max {
            if compare(column_type, value, max).is_some_and(|o| o.is_gt()) {
                failed.push("max");
            }
        }

        if let Value::String(s) = value {
            let len = s.chars().count();
            if self.min_length.is_some_and(|min| len < min) {
                failed.push("minLength");
            }
            if self.max_length.is_some_and(|max| len > max) {
                failed.push("maxLength");
            }
            if self.pattern.as_ref().is_some_and(|re| !re.is_match(s)) {
                failed.push("pattern");
            }
        }

        failed
    }
}

fn lookup<'a>(map: &'a Map<String, Value>, camel: &str, snake: &str) -> Option<&'a Value> {
    map.get(camel)
        .or_else(|| map.get(snake))
        .filter(|v| !v.is_null())
}

fn bound(map: &Map<String, Value>, name: &str) -> Result<Option<Bound>, String> {
    match lookup(map, name, name) {
        None => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(|f| Some(Bound::Number(f)))
            .ok_or_else(|| format!("`{name}` rule is out of range")),
        Some(Value::String(s)) => Ok(Some(Bound::Text(s.clone()))),
        Some(other) => Err(format!("`{name}` rule must be a number or string, got {other}")),
    }
}

fn length(map: &Map<String, Value>, camel: &str, snake: &str) -> Result<Option<usize>, String> {
    match lookup(map, camel, snake) {
        None => Ok(None),
        Some(v) => v
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| format!("`{camel}` rule must be a non-negative integer")),
    }
}

/// Ordering of `value` relative to `bound`; `None` when the rule does
/// not apply to this combination.
fn compare(column_type: ColumnType, value: &Value, bound: &Bound) -> Option<std::cmp::Ordering> {
    match (column_type, bound) {
        (ColumnType::Number, Bound::Number(b)) => value.as_f64()?.partial_cmp(b),
        (ColumnType::Date | ColumnType::Datetime, Bound::Text(b)) => {
            let lhs = parse_temporal(column_type, value.as_str()?)?;
            let rhs = parse_temporal(column_type, b)?;
            Some(lhs.cmp(&rhs))
        }
        (t, Bound::Number(b)) if t.is_textual() || t == ColumnType::Select => {
            let len = value.as_str()?.chars().count() as f64;
            len.partial_cmp(b)
        }
        _ => None,
    }
}

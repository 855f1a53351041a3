//! Schema engine: validates row payloads against a datagrid's columns.
//!
//! The column set of a datagrid is interpreted as the schema of its
//! rows. [`validate`] checks a candidate payload and returns it with
//! type coercions applied (e.g. `"42"` becomes `42` for a number
//! column). The schema is advisory by default: keys without a matching
//! column pass through untouched unless [`ValidationMode::Strict`] is
//! selected.

mod coerce;
pub mod options;
pub mod rules;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::column::{Column, ColumnType};
use crate::models::row::RowData;

pub use options::SelectConfig;
pub use rules::RuleSet;

/// How keys without a matching column are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Unknown keys pass through unchanged.
    #[default]
    Permissive,
    /// Unknown keys are rejected with [`FieldError::UnknownField`].
    Strict,
}

/// Schema engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaConfig {
    #[serde(default)]
    pub mode: ValidationMode,
}

/// A single field-level rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldError {
    #[error("missing required field `{key}`")]
    MissingField { key: String },

    #[error("field `{key}` is not a valid {expected}")]
    TypeMismatch { key: String, expected: ColumnType },

    #[error("field `{key}` value {value} is not one of the configured options")]
    InvalidOption { key: String, value: String },

    #[error("field `{key}` violates rule `{rule}`")]
    RuleViolation { key: String, rule: String },

    #[error("field `{key}` has no matching column")]
    UnknownField { key: String },

    #[error("field `{key}` holds an integer above the signed 64-bit range")]
    OutOfRange { key: String },
}

impl FieldError {
    pub fn key(&self) -> &str {
        match self {
            FieldError::MissingField { key }
            | FieldError::TypeMismatch { key, .. }
            | FieldError::InvalidOption { key, .. }
            | FieldError::RuleViolation { key, .. }
            | FieldError::UnknownField { key }
            | FieldError::OutOfRange { key } => key,
        }
    }
}

/// Validate `payload` against `columns` and return the normalized
/// payload, or every field error found.
pub fn validate(
    columns: &[Column],
    payload: &RowData,
    mode: ValidationMode,
) -> Result<RowData, Vec<FieldError>> {
    let mut errors = Vec::new();

    for column in columns.iter().filter(|c| c.required) {
        match payload.get(&column.key) {
            Some(value) if !is_empty(value) => {}
            _ => errors.push(FieldError::MissingField {
                key: column.key.clone(),
            }),
        }
    }

    let by_key: HashMap<&str, &Column> = columns.iter().map(|c| (c.key.as_str(), c)).collect();
    let mut normalized = RowData::new();

    for (key, value) in payload {
        let Some(column) = by_key.get(key.as_str()) else {
            if mode == ValidationMode::Strict {
                errors.push(FieldError::UnknownField { key: key.clone() });
            }
            normalized.insert(key.clone(), value.clone());
            continue;
        };

        // Blank optional values are kept as given; blank required values
        // were reported above.
        if is_empty(value) {
            normalized.insert(key.clone(), value.clone());
            continue;
        }

        match check_field(column, value) {
            Ok(coerced) => {
                normalized.insert(key.clone(), coerced);
            }
            Err(mut field_errors) => errors.append(&mut field_errors),
        }
    }

    for (key, value) in &normalized {
        if exceeds_signed_range(value) {
            errors.push(FieldError::OutOfRange { key: key.clone() });
        }
    }

    if errors.is_empty() {
        Ok(normalized)
    } else {
        Err(errors)
    }
}

/// Check that a column's rules and configuration are well formed for
/// its type. Run when columns are defined so that broken definitions
/// never reach row validation.
pub fn validate_definition(
    column_type: ColumnType,
    validation_rules: Option<&Value>,
    config: Option<&Value>,
) -> Result<(), String> {
    let rules = RuleSet::from_value(validation_rules)?;
    rules.check_compatible(column_type)?;
    match config {
        Some(value) if !value.is_null() && !value.is_object() => {
            Err("config must be an object".into())
        }
        _ if column_type == ColumnType::Select => SelectConfig::from_value(config).map(|_| ()),
        _ => Ok(()),
    }
}

fn check_field(column: &Column, value: &Value) -> Result<Value, Vec<FieldError>> {
    let key = &column.key;

    let select = if column.column_type == ColumnType::Select {
        SelectConfig::from_value(column.config.as_ref()).map_err(|_| {
            vec![FieldError::RuleViolation {
                key: key.clone(),
                rule: "config".into(),
            }]
        })?
    } else {
        SelectConfig::default()
    };

    let coerced = coerce::coerce(column.column_type, &select, key, value).map_err(|e| vec![e])?;

    let rules = RuleSet::from_value(column.validation_rules.as_ref()).map_err(|_| {
        vec![FieldError::RuleViolation {
            key: key.clone(),
            rule: "validationRules".into(),
        }]
    })?;

    let violations: Vec<FieldError> = rules
        .violations(column.column_type, &coerced)
        .into_iter()
        .map(|rule| FieldError::RuleViolation {
            key: key.clone(),
            rule: rule.into(),
        })
        .collect();

    if violations.is_empty() {
        Ok(coerced)
    } else {
        Err(violations)
    }
}

/// Null, blank strings and empty arrays count as "no value".
fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Integers above `i64::MAX` would come back from storage as floats.
fn exceeds_signed_range(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.is_u64() && n.as_i64().is_none(),
        Value::Array(items) => items.iter().any(exceeds_signed_range),
        Value::Object(map) => map.values().any(exceeds_signed_range),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    fn column(key: &str, column_type: ColumnType, required: bool) -> Column {
        Column {
            id: Uuid::new_v4(),
            tenant_id: Uuid::nil(),
            datagrid_id: Uuid::nil(),
            key: key.into(),
            label: key.into(),
            column_type,
            required,
            order: 0,
            validation_rules: None,
            config: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn payload(value: Value) -> RowData {
        match value {
            Value::Object(map) => map,
            other => panic!("payload must be an object, got {other}"),
        }
    }

    #[test]
    fn required_field_missing_is_reported() {
        let columns = vec![column("team", ColumnType::Text, true)];
        let errors = validate(&columns, &payload(json!({})), ValidationMode::Permissive)
            .unwrap_err();
        assert_eq!(
            errors,
            vec![FieldError::MissingField { key: "team".into() }]
        );
    }

    #[test]
    fn required_field_blank_or_null_is_reported() {
        let columns = vec![column("team", ColumnType::Text, true)];
        for blank in [json!(null), json!(""), json!("   "), json!([])] {
            let errors = validate(
                &columns,
                &payload(json!({ "team": blank })),
                ValidationMode::Permissive,
            )
            .unwrap_err();
            assert_eq!(errors.len(), 1);
            assert!(matches!(errors[0], FieldError::MissingField { .. }));
        }
    }

    #[test]
    fn required_field_present_passes_unchanged() {
        let columns = vec![column("team", ColumnType::Text, true)];
        let data = payload(json!({ "team": "Raptors" }));
        let normalized = validate(&columns, &data, ValidationMode::Permissive).unwrap();
        assert_eq!(normalized, data);
    }

    #[test]
    fn optional_blank_values_pass_through() {
        let columns = vec![column("age", ColumnType::Number, false)];
        let data = payload(json!({ "age": "" }));
        let normalized = validate(&columns, &data, ValidationMode::Permissive).unwrap();
        assert_eq!(normalized["age"], json!(""));
    }

    #[test]
    fn unknown_keys_pass_through_in_permissive_mode() {
        let columns = vec![column("team", ColumnType::Text, false)];
        let data = payload(json!({ "team": "Raptors", "nickname": { "a": 1 } }));
        let normalized = validate(&columns, &data, ValidationMode::Permissive).unwrap();
        assert_eq!(normalized["nickname"], json!({ "a": 1 }));
    }

    #[test]
    fn unknown_keys_rejected_in_strict_mode() {
        let columns = vec![column("team", ColumnType::Text, false)];
        let data = payload(json!({ "team": "Raptors", "nickname": "Dinos" }));
        let errors = validate(&columns, &data, ValidationMode::Strict).unwrap_err();
        assert_eq!(
            errors,
            vec![FieldError::UnknownField {
                key: "nickname".into()
            }]
        );
    }

    #[test]
    fn integers_beyond_i64_are_rejected_even_for_unknown_keys() {
        let columns = vec![column("age", ColumnType::Number, false)];
        let data = payload(json!({
            "age": u64::MAX,
            "big": 18446744073709551615u64,
            "nested": { "list": [1, 9223372036854775808u64] },
            "fine": i64::MAX,
        }));
        let mut keys: Vec<String> = validate(&columns, &data, ValidationMode::Permissive)
            .unwrap_err()
            .iter()
            .map(|e| {
                assert!(matches!(e, FieldError::OutOfRange { .. }));
                e.key().to_string()
            })
            .collect();
        keys.sort();
        assert_eq!(keys, ["age", "big", "nested"]);
    }

    #[test]
    fn numeric_strings_are_coerced() {
        let columns = vec![
            column("games", ColumnType::Number, false),
            column("average", ColumnType::Number, false),
        ];
        let data = payload(json!({ "games": " 82 ", "average": "12.5" }));
        let normalized = validate(&columns, &data, ValidationMode::Permissive).unwrap();
        assert_eq!(normalized["games"], json!(82));
        assert_eq!(normalized["average"], json!(12.5));
    }

    #[test]
    fn non_numeric_value_is_type_mismatch() {
        let columns = vec![column("games", ColumnType::Number, false)];
        let errors = validate(
            &columns,
            &payload(json!({ "games": "many" })),
            ValidationMode::Permissive,
        )
        .unwrap_err();
        assert_eq!(
            errors,
            vec![FieldError::TypeMismatch {
                key: "games".into(),
                expected: ColumnType::Number,
            }]
        );
    }

    #[test]
    fn boolean_strings_are_coerced() {
        let columns = vec![column("captain", ColumnType::Boolean, false)];
        let normalized = validate(
            &columns,
            &payload(json!({ "captain": "TRUE" })),
            ValidationMode::Permissive,
        )
        .unwrap();
        assert_eq!(normalized["captain"], json!(true));

        let errors = validate(
            &columns,
            &payload(json!({ "captain": "yes" })),
            ValidationMode::Permissive,
        )
        .unwrap_err();
        assert!(matches!(errors[0], FieldError::TypeMismatch { .. }));
    }

    #[test]
    fn dates_must_be_real_calendar_days() {
        let columns = vec![column("start", ColumnType::Date, false)];
        assert!(
            validate(
                &columns,
                &payload(json!({ "start": "2024-02-29" })),
                ValidationMode::Permissive
            )
            .is_ok()
        );
        assert!(
            validate(
                &columns,
                &payload(json!({ "start": "2023-02-29" })),
                ValidationMode::Permissive
            )
            .is_err()
        );
    }

    #[test]
    fn datetimes_accept_rfc3339_and_local_forms() {
        let columns = vec![column("at", ColumnType::Datetime, false)];
        for ok in ["2024-05-01T10:30:00Z", "2024-05-01T10:30:00+02:00", "2024-05-01T10:30"] {
            assert!(
                validate(
                    &columns,
                    &payload(json!({ "at": ok })),
                    ValidationMode::Permissive
                )
                .is_ok(),
                "{ok} should be accepted"
            );
        }
        assert!(
            validate(
                &columns,
                &payload(json!({ "at": "2024-13-01T10:30:00Z" })),
                ValidationMode::Permissive
            )
            .is_err()
        );
    }

    #[test]
    fn email_and_url_get_format_checks() {
        let columns = vec![
            column("email", ColumnType::Email, false),
            column("site", ColumnType::Url, false),
        ];
        assert!(
            validate(
                &columns,
                &payload(json!({ "email": "a@b.co", "site": "https://example.com/x" })),
                ValidationMode::Permissive
            )
            .is_ok()
        );

        let errors = validate(
            &columns,
            &payload(json!({ "email": "not-an-email", "site": "ftp//nope" })),
            ValidationMode::Permissive,
        )
        .unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn select_values_must_be_declared_options() {
        let mut position = column("position", ColumnType::Select, false);
        position.config = Some(json!({
            "options": ["Guard", { "value": "Forward", "label": "Forward (F)" }]
        }));
        let columns = vec![position];

        assert!(
            validate(
                &columns,
                &payload(json!({ "position": "Forward" })),
                ValidationMode::Permissive
            )
            .is_ok()
        );

        let errors = validate(
            &columns,
            &payload(json!({ "position": "Center" })),
            ValidationMode::Permissive,
        )
        .unwrap_err();
        assert_eq!(
            errors,
            vec![FieldError::InvalidOption {
                key: "position".into(),
                value: "Center".into(),
            }]
        );
    }

    #[test]
    fn select_without_options_accepts_any_scalar() {
        let columns = vec![column("position", ColumnType::Select, false)];
        assert!(
            validate(
                &columns,
                &payload(json!({ "position": "Anything" })),
                ValidationMode::Permissive
            )
            .is_ok()
        );
    }

    #[test]
    fn multi_select_checks_every_element() {
        let mut tags = column("tags", ColumnType::Select, false);
        tags.config = Some(json!({ "options": ["a", "b"], "multiple": true }));
        let columns = vec![tags];

        assert!(
            validate(
                &columns,
                &payload(json!({ "tags": ["a", "b"] })),
                ValidationMode::Permissive
            )
            .is_ok()
        );
        let errors = validate(
            &columns,
            &payload(json!({ "tags": ["a", "c"] })),
            ValidationMode::Permissive,
        )
        .unwrap_err();
        assert_eq!(
            errors,
            vec![FieldError::InvalidOption {
                key: "tags".into(),
                value: "c".into(),
            }]
        );
    }

    #[test]
    fn rules_apply_after_coercion() {
        let mut games = column("games", ColumnType::Number, false);
        games.validation_rules = Some(json!({ "min": 0, "max": 82 }));
        let columns = vec![games];

        assert!(
            validate(
                &columns,
                &payload(json!({ "games": "82" })),
                ValidationMode::Permissive
            )
            .is_ok()
        );
        let errors = validate(
            &columns,
            &payload(json!({ "games": "83" })),
            ValidationMode::Permissive,
        )
        .unwrap_err();
        assert_eq!(
            errors,
            vec![FieldError::RuleViolation {
                key: "games".into(),
                rule: "max".into(),
            }]
        );
    }

    #[test]
    fn every_failing_field_is_reported() {
        let mut code = column("code", ColumnType::Text, true);
        code.validation_rules = Some(json!({ "pattern": "^[A-Z]{3}$", "maxLength": 3 }));
        let columns = vec![code, column("team", ColumnType::Text, true)];

        let errors = validate(
            &columns,
            &payload(json!({ "code": "toolong" })),
            ValidationMode::Permissive,
        )
        .unwrap_err();

        assert!(errors.contains(&FieldError::MissingField { key: "team".into() }));
        assert!(errors.contains(&FieldError::RuleViolation {
            key: "code".into(),
            rule: "pattern".into(),
        }));
        assert!(errors.contains(&FieldError::RuleViolation {
            key: "code".into(),
            rule: "maxLength".into(),
        }));
    }

    #[test]
    fn definition_check_rejects_broken_rules() {
        assert!(validate_definition(ColumnType::Text, Some(&json!({ "pattern": "(" })), None).is_err());
        assert!(validate_definition(ColumnType::Number, Some(&json!({ "min": "low" })), None).is_err());
        assert!(validate_definition(ColumnType::Text, Some(&json!([1, 2])), None).is_err());
        assert!(
            validate_definition(ColumnType::Select, None, Some(&json!({ "options": "a,b" })))
                .is_err()
        );
        assert!(
            validate_definition(
                ColumnType::Date,
                Some(&json!({ "min": "2000-01-01" })),
                Some(&json!({ "anything": true }))
            )
            .is_ok()
        );
    }

    #[test]
    fn config_contents_are_opaque_for_non_select_columns() {
        let config = json!({ "placeholder": "Team name", "options": 12 });
        assert!(validate_definition(ColumnType::Text, None, Some(&config)).is_ok());
        assert!(validate_definition(ColumnType::Text, None, Some(&json!("just a string"))).is_err());
    }
}

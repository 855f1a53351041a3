//! Configuration of `select` columns.

use serde_json::Value;

/// Parsed `select` column configuration.
///
/// Accepted shape: `{"options": [..], "multiple": bool}`, where each
/// option is a string, a number, or an object with a `value` field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectConfig {
    /// Declared option values. `None` means any scalar is accepted.
    pub options: Option<Vec<String>>,
    /// When true the field holds an array of options.
    pub multiple: bool,
}

impl SelectConfig {
    pub fn from_value(config: Option<&Value>) -> Result<Self, String> {
        let map = match config {
            None | Some(Value::Null) => return Ok(Self::default()),
            Some(Value::Object(map)) => map,
            Some(_) => return Err("select config must be an object".into()),
        };

        let options = match map.get("options") {
            None | Some(Value::Null) => None,
            Some(Value::Array(items)) => Some(
                items
                    .iter()
                    .map(option_value)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Some(_) => return Err("select `options` must be a list".into()),
        };

        let multiple = match map.get("multiple") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(_) => return Err("select `multiple` must be a boolean".into()),
        };

        Ok(Self { options, multiple })
    }

    /// True when `candidate` is permitted by the declared options.
    pub fn allows(&self, candidate: &str) -> bool {
        match &self.options {
            Some(options) => options.iter().any(|o| o == candidate),
            None => true,
        }
    }
}

fn option_value(item: &Value) -> Result<String, String> {
    match item {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Object(obj) => match obj.get("value") {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            _ => Err("select option objects need a string or number `value`".into()),
        },
        _ => Err(format!("unsupported select option: {item}")),
    }
}

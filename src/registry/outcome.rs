use crate::errors::CastError;
use crate::registry::types::{stringify, ValueType};
use colored::Colorize;
use serde_json::Value;
use std::fmt;

/// Envelope around one invocation's raw return value. The typed value is
/// computed on access, not at construction, so the same raw value can be
/// re-cast after a cache hit.
#[derive(Debug, Clone)]
pub struct RequestOutcome {
    raw: Value,
    return_type: ValueType,
    cached: bool,
}

impl RequestOutcome {
    pub fn new(raw: Value, return_type: ValueType, cached: bool) -> Self {
        Self {
            raw,
            return_type,
            cached,
        }
    }

    pub fn cached(&self) -> bool {
        self.cached
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn return_type(&self) -> ValueType {
        self.return_type
    }

    /// Applies the declared return type to the raw value.
    pub fn value(&self) -> Result<Value, CastError> {
        self.return_type.cast(&self.raw)
    }

    pub fn is_null(&self) -> bool {
        self.raw.is_null()
    }
}

impl fmt::Display for RequestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let type_name = if self.return_type.is_constrained() {
            self.return_type.to_string()
        } else {
            value_kind(&self.raw).to_string()
        };
        let from_cache = if self.cached { ", from cache" } else { "" };
        let header = format!(
            "{} {}",
            "Result".bold(),
            format!("({}{})", type_name, from_cache).dimmed()
        );
        if self.raw.is_null() {
            return write!(f, "{}", header);
        }
        let body = match self.value() {
            Ok(value) => render_value(&value),
            Err(_) => render_value(&self.raw),
        };
        write!(f, "{}:\n{}", header, body)
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(num) if num.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Array(_) | Value::Object(_) => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| stringify(value))
        }
        _ => stringify(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::types::Primitive;
    use serde_json::json;

    fn plain(outcome: &RequestOutcome) -> String {
        colored::control::set_override(false);
        outcome.to_string()
    }

    #[test]
    fn value_is_cast_lazily() {
        let outcome =
            RequestOutcome::new(json!("41"), ValueType::Primitive(Primitive::Int), false);
        assert_eq!(outcome.raw(), &json!("41"));
        assert_eq!(outcome.value().unwrap(), json!(41));
    }

    #[test]
    fn cast_failure_surfaces_on_access() {
        let outcome =
            RequestOutcome::new(json!("nope"), ValueType::Primitive(Primitive::Int), false);
        assert!(outcome.value().is_err());
    }

    #[test]
    fn display_includes_cache_marker() {
        let outcome = RequestOutcome::new(json!(1), ValueType::Unconstrained, true);
        let rendered = plain(&outcome);
        assert!(rendered.starts_with("Result (int, from cache):"));
        assert!(rendered.ends_with("\n1"));
    }

    #[test]
    fn display_of_null_is_header_only() {
        let outcome = RequestOutcome::new(Value::Null, ValueType::Unconstrained, false);
        let rendered = plain(&outcome);
        assert_eq!(rendered, "Result (null)");
    }

    #[test]
    fn display_uses_declared_return_type_name() {
        let outcome =
            RequestOutcome::new(json!("5"), ValueType::Primitive(Primitive::Int), false);
        let rendered = plain(&outcome);
        assert!(rendered.starts_with("Result (int):"));
        assert!(rendered.ends_with("\n5"));
    }
}

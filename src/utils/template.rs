use crate::errors::ProbeError;
use crate::registry::types::stringify;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern must compile")
});

/// Substitutes `{name}` placeholders from the context. Unknown placeholders
/// are an error: a typo in a URL template should fail loudly, not ship a
/// literal brace to the server.
pub fn render_str(template: &str, context: &Map<String, Value>) -> Result<String, ProbeError> {
    let mut missing: Option<String> = None;
    let rendered = PLACEHOLDER_RE.replace_all(template, |caps: &regex::Captures| {
        match context.get(&caps[1]) {
            Some(value) => stringify(value),
            None => {
                if missing.is_none() {
                    missing = Some(caps[1].to_string());
                }
                String::new()
            }
        }
    });
    if let Some(name) = missing {
        return Err(ProbeError::UnresolvedPlaceholder(name));
    }
    Ok(rendered.into_owned())
}

/// Recursive rendering for JSON bodies: placeholders in every string leaf.
/// A string that is exactly one placeholder keeps the substituted value's
/// JSON type instead of degrading to text.
pub fn render_value(template: &Value, context: &Map<String, Value>) -> Result<Value, ProbeError> {
    match template {
        Value::String(text) => {
            if let Some(caps) = PLACEHOLDER_RE.captures(text) {
                if caps.get(0).map(|m| m.as_str() == text).unwrap_or(false) {
                    if let Some(value) = context.get(&caps[1]) {
                        return Ok(value.clone());
                    }
                    return Err(ProbeError::UnresolvedPlaceholder(caps[1].to_string()));
                }
            }
            Ok(Value::String(render_str(text, context)?))
        }
        Value::Array(items) => {
            let rendered: Result<Vec<Value>, ProbeError> = items
                .iter()
                .map(|item| render_value(item, context))
                .collect();
            Ok(Value::Array(rendered?))
        }
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, value) in map {
                out.insert(key.clone(), render_value(value, context)?);
            }
            Ok(Value::Object(out))
        }
        other => Ok(other.clone()),
    }
}

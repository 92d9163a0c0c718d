use serde_json::{Map, Value};

/// Parses raw CLI argument tokens. `key=value` splits on the first `=`;
/// a bare `key` is boolean-true shorthand.
pub fn parse_cmd_arguments<S: AsRef<str>>(tokens: &[S]) -> Map<String, Value> {
    let mut parsed = Map::new();
    for token in tokens {
        let token = token.as_ref();
        match token.split_once('=') {
            Some((key, value)) => {
                parsed.insert(key.to_string(), Value::String(value.to_string()));
            }
            None => {
                parsed.insert(token.to_string(), Value::Bool(true));
            }
        }
    }
    parsed
}

/// Splits an optional listing filter: `module`, `module:name`, or `:name`.
pub fn parse_module_name(filter: Option<&str>) -> (Option<String>, Option<String>) {
    let Some(filter) = filter else {
        return (None, None);
    };
    match filter.split_once(':') {
        Some((module, name)) => {
            let module = (!module.is_empty()).then(|| module.to_string());
            let name = (!name.is_empty()).then(|| name.to_string());
            (module, name)
        }
        None => (Some(filter.to_string()), None),
    }
}

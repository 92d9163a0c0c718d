use crate::errors::ProbeError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use walkdir::WalkDir;

pub const DEFAULT_ENVIRONMENT: &str = "default";

const ENV_SUFFIX: &str = ".env.json";

static VAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("var pattern must compile"));

/// Named configuration injected opaquely into request handlers. Loaded from
/// `<name>.env.json` in the working directory: a flat string map where
/// values may reference each other with `${key}`.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    name: String,
    values: BTreeMap<String, String>,
}

impl Environment {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_values(name: &str, values: BTreeMap<String, String>) -> Result<Self, ProbeError> {
        let values = interpolate(name, values)?;
        Ok(Self {
            name: name.to_string(),
            values,
        })
    }

    /// Loads a named environment. The default environment may be absent
    /// (an empty mapping); any other missing name is the caller's typo.
    pub fn load(dir: &Path, name: &str) -> Result<Self, ProbeError> {
        let path = dir.join(format!("{}{}", name, ENV_SUFFIX));
        if !path.exists() {
            if name == DEFAULT_ENVIRONMENT {
                return Ok(Self {
                    name: name.to_string(),
                    values: BTreeMap::new(),
                });
            }
            return Err(ProbeError::EnvironmentNotFound {
                name: name.to_string(),
            });
        }
        let raw = std::fs::read_to_string(&path).map_err(|err| ProbeError::EnvironmentInvalid {
            name: name.to_string(),
            reason: err.to_string(),
        })?;
        let parsed: Value =
            serde_json::from_str(&raw).map_err(|err| ProbeError::EnvironmentInvalid {
                name: name.to_string(),
                reason: err.to_string(),
            })?;
        let Some(object) = parsed.as_object() else {
            return Err(ProbeError::EnvironmentInvalid {
                name: name.to_string(),
                reason: "top level must be an object".to_string(),
            });
        };
        let mut values = BTreeMap::new();
        for (key, value) in object {
            let rendered = match value {
                Value::String(text) => text.clone(),
                Value::Null => continue,
                other => crate::registry::types::stringify(other),
            };
            values.insert(key.clone(), rendered);
        }
        Self::from_values(name, values)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    /// Template context form, for placeholder substitution.
    pub fn to_context(&self) -> Map<String, Value> {
        self.values
            .iter()
            .map(|(key, value)| (key.clone(), Value::String(value.clone())))
            .collect()
    }
}

/// Resolves `${key}` cross-references. Bounded iteration: leftover
/// references after the bound mean an unknown key or a cycle.
fn interpolate(
    name: &str,
    mut values: BTreeMap<String, String>,
) -> Result<BTreeMap<String, String>, ProbeError> {
    for _ in 0..10 {
        let mut changed = false;
        let snapshot = values.clone();
        for value in values.values_mut() {
            if !VAR_RE.is_match(value) {
                continue;
            }
            let rendered = VAR_RE
                .replace_all(value, |caps: &regex::Captures| {
                    snapshot
                        .get(&caps[1])
                        .cloned()
                        .unwrap_or_else(|| caps[0].to_string())
                })
                .to_string();
            if rendered != *value {
                *value = rendered;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    if let Some((key, value)) = values.iter().find(|(_, value)| VAR_RE.is_match(value)) {
        return Err(ProbeError::EnvironmentInvalid {
            name: name.to_string(),
            reason: format!("unresolvable reference in \"{}\": {}", key, value),
        });
    }
    Ok(values)
}

/// Names of every environment file in the working directory.
pub fn list_environments(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            entry
                .file_name()
                .to_str()
                .and_then(|file| file.strip_suffix(ENV_SUFFIX))
                .map(str::to_string)
        })
        .collect();
    names.sort();
    names
}

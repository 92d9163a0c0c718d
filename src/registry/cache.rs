use crate::errors::ProbeError;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

/// Process-lifetime memoization store for cache-enabled requests. Unbounded
/// on purpose: a debugging session is short-lived and entries are cleared
/// only by `reset` or process exit.
#[derive(Default)]
pub struct CacheStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Composite key over request identity and the resolved arguments that
    /// actually reach the underlying handler. Environment and session are
    /// opaque collaborator handles and never participate. Key equality is
    /// structural: argument insertion order does not matter.
    pub fn build_key(module: &str, name: &str, arguments: &Map<String, Value>) -> String {
        let mut payload = format!("{}:{}", module, name);
        payload.push_str(&stable_stringify(&Value::Object(arguments.clone())));
        let mut hasher = Sha256::new();
        hasher.update(payload.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn lookup(&self, key: &str) -> Option<Value> {
        self.entries
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .get(key)
            .cloned()
    }

    pub fn store(&self, key: &str, value: Value) {
        self.entries
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .insert(key.to_string(), value);
    }

    /// Returns the memoized value for `key`, or computes, stores, and
    /// returns it. The boolean reports whether the value came from cache.
    pub async fn get_or_compute<F, Fut>(&self, key: &str, compute: F) -> Result<(Value, bool), ProbeError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, ProbeError>>,
    {
        if let Some(hit) = self.lookup(key) {
            return Ok((hit, true));
        }
        let value = compute().await?;
        self.store(key, value.clone());
        Ok((value, false))
    }

    pub fn reset(&self) {
        self.entries
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// JSON rendering with object keys sorted at every level, so two maps with
/// the same contents hash identically.
fn stable_stringify(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let fields: Vec<String> = keys
                .into_iter()
                .map(|key| {
                    format!(
                        "{}:{}",
                        serde_json::to_string(key).unwrap_or_default(),
                        stable_stringify(&map[key])
                    )
                })
                .collect();
            format!("{{{}}}", fields.join(","))
        }
        Value::Array(items) => {
            let rendered: Vec<String> = items.iter().map(stable_stringify).collect();
            format!("[{}]", rendered.join(","))
        }
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

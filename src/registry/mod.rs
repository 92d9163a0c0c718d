pub mod arguments;
pub mod cache;
pub mod outcome;
pub mod request;
pub mod types;

use crate::errors::{ProbeError, RequestError};
use crate::logger::Logger;
use cache::CacheStore;
use once_cell::sync::Lazy;
use regex::Regex;
use request::Request;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("name pattern must compile"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadState {
    Uninitialized,
    Loading,
    Ready,
}

type ModuleMap = BTreeMap<String, BTreeMap<String, Arc<Request>>>;

/// Process-wide home of every discovered request, plus the memoization
/// store their invocations share. Explicit (not an ambient global) so tests
/// construct fresh instances.
pub struct RegistryContext {
    logger: Logger,
    modules: Mutex<ModuleMap>,
    state: Mutex<LoadState>,
    cache: CacheStore,
}

impl RegistryContext {
    pub fn new(logger: Logger) -> Self {
        Self {
            logger: logger.child("registry"),
            modules: Mutex::new(BTreeMap::new()),
            state: Mutex::new(LoadState::Uninitialized),
            cache: CacheStore::new(),
        }
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Validates name well-formedness and module-level uniqueness before
    /// insertion. A rejected request leaves the registry untouched.
    pub fn register(&self, request: Request) -> Result<(), RequestError> {
        if !NAME_RE.is_match(&request.name) {
            return Err(RequestError::InvalidName {
                module: request.module.clone(),
                name: request.name.clone(),
            });
        }
        let mut modules = self.modules.lock().unwrap_or_else(|err| err.into_inner());
        let entry = modules.entry(request.module.clone()).or_default();
        if entry.contains_key(&request.name) {
            return Err(RequestError::DuplicateName {
                module: request.module.clone(),
                name: request.name.clone(),
            });
        }
        self.logger
            .debug(&format!("registered {}", request.qualified_name()));
        entry.insert(request.name.clone(), Arc::new(request));
        Ok(())
    }

    /// Resolves a user-typed identifier, optionally module-qualified as
    /// `module:name`, to exactly one request.
    pub fn find(&self, identifier: &str) -> Result<Arc<Request>, RequestError> {
        let (module, name) = match identifier.split_once(':') {
            Some((module, name)) if !module.is_empty() => (Some(module), name),
            Some((_, name)) => (None, name),
            None => (None, identifier),
        };
        let modules = self.modules.lock().unwrap_or_else(|err| err.into_inner());

        if let Some(module) = module {
            let Some(entries) = modules.get(module) else {
                return Err(RequestError::missing_module(module));
            };
            return entries
                .get(name)
                .cloned()
                .ok_or_else(|| RequestError::missing_request(identifier));
        }

        let mut matches: Vec<Arc<Request>> = Vec::new();
        for entries in modules.values() {
            if let Some(request) = entries.get(name) {
                matches.push(request.clone());
            }
        }
        match matches.len() {
            1 => Ok(matches.remove(0)),
            0 => Err(RequestError::missing_request(identifier)),
            _ => Err(RequestError::Ambiguous {
                name: name.to_string(),
                modules: matches.iter().map(|r| r.module.clone()).collect(),
            }),
        }
    }

    /// Snapshot of module -> request, for listings and completion.
    pub fn snapshot(&self) -> ModuleMap {
        self.modules
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .clone()
    }

    pub fn module_names(&self) -> Vec<String> {
        self.modules
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .keys()
            .cloned()
            .collect()
    }

    /// Load-once gate: the first caller runs `loader` synchronously, later
    /// callers reuse the populated registry without re-scanning.
    pub fn ensure_loaded<F>(&self, loader: F) -> Result<(), ProbeError>
    where
        F: FnOnce(&RegistryContext) -> Result<(), ProbeError>,
    {
        {
            let mut state = self.state.lock().unwrap_or_else(|err| err.into_inner());
            if *state != LoadState::Uninitialized {
                return Ok(());
            }
            *state = LoadState::Loading;
        }
        let outcome = loader(self);
        let mut state = self.state.lock().unwrap_or_else(|err| err.into_inner());
        match outcome {
            Ok(()) => {
                *state = LoadState::Ready;
                Ok(())
            }
            Err(err) => {
                *state = LoadState::Uninitialized;
                Err(err)
            }
        }
    }

    /// Lifecycle hook for tests: back to a pristine, unloaded registry.
    pub fn reset(&self) {
        self.modules
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .clear();
        *self.state.lock().unwrap_or_else(|err| err.into_inner()) = LoadState::Uninitialized;
        self.cache.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::request::{FunctionSignature, Request, RequestHandler};
    use super::*;
    use crate::environment::Environment;
    use crate::session::Session;
    use async_trait::async_trait;
    use serde_json::{json, Map, Value};

    struct NullHandler;

    #[async_trait]
    impl RequestHandler for NullHandler {
        async fn invoke(
            &self,
            _env: &Environment,
            _session: &Session,
            _arguments: &Map<String, Value>,
        ) -> Result<Value, ProbeError> {
            Ok(json!(null))
        }
    }

    fn registry() -> RegistryContext {
        RegistryContext::new(Logger::new("test"))
    }

    fn request(module: &str, name: &str) -> Request {
        Request::new(
            name,
            module,
            FunctionSignature::default(),
            std::sync::Arc::new(NullHandler),
        )
    }

    #[test]
    fn register_and_find_qualified() {
        let registry = registry();
        registry.register(request("blog", "post")).unwrap();
        let found = registry.find("blog:post").unwrap();
        assert_eq!(found.qualified_name(), "blog:post");
    }

    #[test]
    fn register_rejects_malformed_names() {
        let registry = registry();
        for bad in ["invalid name", "1leading", "dash-ed", ""] {
            let err = registry.register(request("blog", bad)).unwrap_err();
            assert!(matches!(err, RequestError::InvalidName { .. }), "{}", bad);
        }
        assert!(registry.snapshot().is_empty());
    }

    #[test]
    fn register_rejects_duplicates_and_keeps_existing_entry() {
        let registry = registry();
        registry.register(request("blog", "post")).unwrap();
        let original = registry.find("blog:post").unwrap();

        let err = registry.register(request("blog", "post")).unwrap_err();
        assert!(matches!(err, RequestError::DuplicateName { .. }));

        let still_there = registry.find("blog:post").unwrap();
        assert!(Arc::ptr_eq(&original, &still_there));
    }

    #[test]
    fn same_name_in_different_modules_is_allowed() {
        let registry = registry();
        registry.register(request("a", "ping")).unwrap();
        registry.register(request("b", "ping")).unwrap();
    }

    #[test]
    fn find_bare_name_with_single_match() {
        let registry = registry();
        registry.register(request("blog", "post")).unwrap();
        registry.register(request("auth", "login")).unwrap();
        assert_eq!(registry.find("post").unwrap().module, "blog");
    }

    #[test]
    fn find_bare_name_ambiguous() {
        let registry = registry();
        registry.register(request("a", "ping")).unwrap();
        registry.register(request("b", "ping")).unwrap();
        let err = registry.find("ping").unwrap_err();
        match err {
            RequestError::Ambiguous { name, modules } => {
                assert_eq!(name, "ping");
                assert_eq!(modules, vec!["a".to_string(), "b".to_string()]);
            }
            other => panic!("expected ambiguity, got {:?}", other),
        }
    }

    #[test]
    fn qualified_find_is_deterministic_despite_duplicates() {
        let registry = registry();
        registry.register(request("a", "ping")).unwrap();
        registry.register(request("b", "ping")).unwrap();
        assert_eq!(registry.find("a:ping").unwrap().module, "a");
        assert_eq!(registry.find("b:ping").unwrap().module, "b");
    }

    #[test]
    fn find_missing_module_vs_missing_request() {
        let registry = registry();
        registry.register(request("blog", "post")).unwrap();

        let err = registry.find("nope:post").unwrap_err();
        assert!(matches!(err, RequestError::NotImplemented(ref msg) if msg.contains("Module")));

        let err = registry.find("blog:nope").unwrap_err();
        assert!(matches!(err, RequestError::NotImplemented(ref msg) if msg.contains("Request")));

        let err = registry.find("nothing").unwrap_err();
        assert!(matches!(err, RequestError::NotImplemented(_)));
    }

    #[test]
    fn colon_prefixed_identifier_searches_all_modules() {
        let registry = registry();
        registry.register(request("blog", "post")).unwrap();
        assert_eq!(registry.find(":post").unwrap().module, "blog");
    }

    #[test]
    fn ensure_loaded_runs_once() {
        let registry = registry();
        let mut runs = 0;
        registry
            .ensure_loaded(|ctx| {
                runs += 1;
                ctx.register(request("blog", "post")).map_err(Into::into)
            })
            .unwrap();
        registry
            .ensure_loaded(|_| panic!("loader must not run twice"))
            .unwrap();
        assert_eq!(runs, 1);
        assert!(registry.find("post").is_ok());
    }

    #[test]
    fn failed_load_allows_retry() {
        let registry = registry();
        let result = registry.ensure_loaded(|_| {
            Err(ProbeError::UnresolvedPlaceholder("boom".to_string()))
        });
        assert!(result.is_err());
        registry
            .ensure_loaded(|ctx| ctx.register(request("blog", "post")).map_err(Into::into))
            .unwrap();
        assert!(registry.find("post").is_ok());
    }

    #[test]
    fn reset_returns_registry_to_pristine_state() {
        let registry = registry();
        registry.register(request("blog", "post")).unwrap();
        registry.cache().store("key", json!(1));
        registry.reset();
        assert!(registry.snapshot().is_empty());
        assert!(registry.cache().is_empty());
    }
}

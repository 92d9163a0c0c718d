use crate::environment::Environment;
use crate::errors::ProbeError;
use crate::registry::arguments::Argument;
use crate::registry::cache::CacheStore;
use crate::registry::outcome::RequestOutcome;
use crate::registry::types::ValueType;
use crate::session::Session;
use crate::utils::prompt::Prompter;
use async_trait::async_trait;
use colored::Colorize;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Reserved parameter names. A signature parameter carrying one of these
/// names is matched by name, regardless of position, injected at invocation
/// time, and never surfaced as a user-facing argument.
pub const ENV_PARAM: &str = "env";
pub const SESSION_PARAM: &str = "session";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheMode {
    Session,
}

/// One declared parameter: name, optional type tag, optional default.
#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub value_type: ValueType,
    pub default: Option<Value>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            default: None,
        }
    }

    pub fn with_default(name: impl Into<String>, value_type: ValueType, default: Value) -> Self {
        Self {
            name: name.into(),
            value_type,
            default: Some(default),
        }
    }

    fn is_reserved(&self) -> bool {
        self.name == ENV_PARAM || self.name == SESSION_PARAM
    }
}

/// Ordered parameter list of the underlying handler, computed once at
/// registration time. Argument construction is a pure function of this.
#[derive(Debug, Clone, Default)]
pub struct FunctionSignature {
    pub parameters: Vec<Parameter>,
}

impl FunctionSignature {
    pub fn new(parameters: Vec<Parameter>) -> Self {
        Self { parameters }
    }

    /// User-facing arguments in declaration order, reserved parameters
    /// excluded.
    pub fn arguments(&self) -> Vec<Argument> {
        self.parameters
            .iter()
            .filter(|parameter| !parameter.is_reserved())
            .map(|parameter| match &parameter.default {
                Some(default) => Argument::defaulted(
                    parameter.name.clone(),
                    parameter.value_type,
                    default.clone(),
                ),
                None => Argument::required(parameter.name.clone(), parameter.value_type),
            })
            .collect()
    }
}

/// The underlying user-authored callable: one HTTP exchange, typically. The
/// core passes the environment and session through opaquely and never
/// inspects what the handler does with them.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn invoke(
        &self,
        env: &Environment,
        session: &Session,
        arguments: &Map<String, Value>,
    ) -> Result<Value, ProbeError>;
}

#[derive(Debug, Clone)]
pub struct CallOptions {
    pub use_defaults: bool,
    pub cache: bool,
    pub arguments: Map<String, Value>,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl CallOptions {
    pub fn new() -> Self {
        Self {
            use_defaults: false,
            cache: true,
            arguments: Map::new(),
        }
    }

    pub fn use_defaults(mut self, flag: bool) -> Self {
        self.use_defaults = flag;
        self
    }

    pub fn cache(mut self, flag: bool) -> Self {
        self.cache = flag;
        self
    }

    pub fn arguments(mut self, arguments: Map<String, Value>) -> Self {
        self.arguments = arguments;
        self
    }
}

/// A named, module-scoped, invocable unit. Immutable after registration;
/// the only side effects of calling one go through the cache store.
pub struct Request {
    pub name: String,
    pub module: String,
    pub cache_mode: Option<CacheMode>,
    pub doc: Option<String>,
    pub return_type: ValueType,
    signature: FunctionSignature,
    arguments: Vec<Argument>,
    handler: Arc<dyn RequestHandler>,
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("name", &self.name)
            .field("module", &self.module)
            .field("cache_mode", &self.cache_mode)
            .field("doc", &self.doc)
            .field("return_type", &self.return_type)
            .field("signature", &self.signature)
            .field("arguments", &self.arguments)
            .finish_non_exhaustive()
    }
}

impl Request {
    pub fn new(
        name: impl Into<String>,
        module: impl Into<String>,
        signature: FunctionSignature,
        handler: Arc<dyn RequestHandler>,
    ) -> Self {
        let arguments = signature.arguments();
        Self {
            name: name.into(),
            module: module.into(),
            cache_mode: None,
            doc: None,
            return_type: ValueType::Unconstrained,
            signature,
            arguments,
            handler,
        }
    }

    pub fn with_cache_mode(mut self, cache_mode: Option<CacheMode>) -> Self {
        self.cache_mode = cache_mode;
        self
    }

    pub fn with_doc(mut self, doc: Option<String>) -> Self {
        self.doc = doc.filter(|text| !text.trim().is_empty());
        self
    }

    pub fn with_return_type(mut self, return_type: ValueType) -> Self {
        self.return_type = return_type;
        self
    }

    /// Fully qualified identity, `module:name`.
    pub fn qualified_name(&self) -> String {
        format!("{}:{}", self.module, self.name)
    }

    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    pub fn signature(&self) -> &FunctionSignature {
        &self.signature
    }

    /// Resolves every user-facing argument in declaration order. Prompt
    /// order therefore follows the signature.
    pub fn resolve_arguments(
        &self,
        use_defaults: bool,
        supplied: &Map<String, Value>,
        prompter: &dyn Prompter,
    ) -> Result<Map<String, Value>, ProbeError> {
        let mut resolved = Map::new();
        for argument in &self.arguments {
            let value = argument.get_value(supplied, use_defaults, prompter)?;
            resolved.insert(argument.name().to_string(), value);
        }
        Ok(resolved)
    }

    /// Resolves arguments, consults the cache when this request is
    /// cache-enabled, invokes the handler, and wraps the raw return value.
    /// Argument resolution (including prompts) completes fully before the
    /// handler runs.
    pub async fn call(
        &self,
        env: &Environment,
        session: &Session,
        options: CallOptions,
        cache: &CacheStore,
        prompter: &dyn Prompter,
    ) -> Result<RequestOutcome, ProbeError> {
        let resolved = self.resolve_arguments(options.use_defaults, &options.arguments, prompter)?;

        if self.cache_mode.is_none() {
            let raw = self.handler.invoke(env, session, &resolved).await?;
            return Ok(RequestOutcome::new(raw, self.return_type, false));
        }

        let key = CacheStore::build_key(&self.module, &self.name, &resolved);
        if options.cache {
            let (raw, was_cached) = cache
                .get_or_compute(&key, || self.handler.invoke(env, session, &resolved))
                .await?;
            return Ok(RequestOutcome::new(raw, self.return_type, was_cached));
        }

        // Bypass reads the wire, but the fresh value still lands in cache.
        let raw = self.handler.invoke(env, session, &resolved).await?;
        cache.store(&key, raw.clone());
        Ok(RequestOutcome::new(raw, self.return_type, false))
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name.bold())?;
        let mut summary = Vec::new();
        if self.cache_mode.is_some() {
            summary.push("cache: session".to_string());
        }
        if self.return_type.is_constrained() {
            summary.push(format!("returns: {}", self.return_type));
        }
        if !summary.is_empty() {
            writeln!(f, "{}", format!("[{}]", summary.join(", ")).dimmed())?;
        }
        if let Some(doc) = &self.doc {
            writeln!(f, "{}", doc.trim())?;
        }
        if !self.arguments.is_empty() {
            writeln!(f, "Arguments:")?;
            for argument in &self.arguments {
                writeln!(f, "  {}", argument)?;
            }
        }
        Ok(())
    }
}

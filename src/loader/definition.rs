use crate::environment::Environment;
use crate::errors::{LoadError, ProbeError};
use crate::registry::request::{
    CacheMode, FunctionSignature, Parameter, Request, RequestHandler,
};
use crate::registry::types::ValueType;
use crate::session::{RequestPlan, Session};
use crate::utils::template::{render_str, render_value};
use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// One `<module>.requests.json` source unit.
#[derive(Debug, Deserialize)]
pub struct RequestSource {
    pub requests: Vec<RequestDefinition>,
}

/// Declarative form of one request: identity, declared arguments, and the
/// HTTP exchange template the generic handler executes.
#[derive(Debug, Deserialize)]
pub struct RequestDefinition {
    pub name: String,
    #[serde(default)]
    pub doc: Option<String>,
    #[serde(default)]
    pub cache: Option<String>,
    #[serde(default)]
    pub returns: Option<String>,
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub query: BTreeMap<String, String>,
    #[serde(default)]
    pub body: Option<Value>,
    #[serde(default)]
    pub args: Vec<ArgSpec>,
}

#[derive(Debug, Deserialize)]
pub struct ArgSpec {
    pub name: String,
    #[serde(rename = "type", default)]
    pub type_tag: Option<String>,
    #[serde(default)]
    pub default: Option<Value>,
}

impl RequestDefinition {
    /// Compiles the declaration into a registered-shape `Request`. All
    /// tag validation happens here so a typo fails at load time.
    pub fn compile(self, module: &str) -> Result<Request, LoadError> {
        let cache_mode = match self.cache.as_deref() {
            None => None,
            Some("session") => Some(CacheMode::Session),
            Some(other) => return Err(LoadError::UnknownCacheMode(other.to_string())),
        };
        Method::from_bytes(self.method.to_uppercase().as_bytes())
            .map_err(|_| LoadError::UnsupportedMethod(self.method.clone()))?;
        let return_type = ValueType::from_tag(self.returns.as_deref())?;

        let mut parameters = Vec::with_capacity(self.args.len());
        for arg in &self.args {
            let value_type = ValueType::from_tag(arg.type_tag.as_deref())?;
            parameters.push(match &arg.default {
                Some(default) => {
                    Parameter::with_default(arg.name.clone(), value_type, default.clone())
                }
                None => Parameter::new(arg.name.clone(), value_type),
            });
        }

        let handler = Arc::new(HttpHandler {
            method: self.method.to_uppercase(),
            url: self.url,
            headers: self.headers,
            query: self.query,
            body: self.body,
        });

        Ok(Request::new(
            self.name,
            module,
            FunctionSignature::new(parameters),
            handler,
        )
        .with_cache_mode(cache_mode)
        .with_doc(self.doc)
        .with_return_type(return_type))
    }
}

/// Generic handler behind every declarative request: renders the templates
/// against environment + resolved arguments and hands the plan to the
/// session. Arguments shadow environment variables on name collision.
struct HttpHandler {
    method: String,
    url: String,
    headers: BTreeMap<String, String>,
    query: BTreeMap<String, String>,
    body: Option<Value>,
}

impl HttpHandler {
    fn context(&self, env: &Environment, arguments: &Map<String, Value>) -> Map<String, Value> {
        let mut context = env.to_context();
        for (key, value) in arguments {
            context.insert(key.clone(), value.clone());
        }
        context
    }

    fn plan(
        &self,
        env: &Environment,
        arguments: &Map<String, Value>,
    ) -> Result<RequestPlan, ProbeError> {
        let context = self.context(env, arguments);
        let url = render_str(&self.url, &context)?;
        let mut headers = Vec::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            headers.push((name.clone(), render_str(value, &context)?));
        }
        let mut query = Vec::with_capacity(self.query.len());
        for (name, value) in &self.query {
            query.push((name.clone(), render_str(value, &context)?));
        }
        let body = match &self.body {
            Some(template) => Some(render_value(template, &context)?),
            None => None,
        };
        Ok(RequestPlan {
            method: self.method.clone(),
            url,
            headers,
            query,
            body,
        })
    }
}

#[async_trait]
impl RequestHandler for HttpHandler {
    async fn invoke(
        &self,
        env: &Environment,
        session: &Session,
        arguments: &Map<String, Value>,
    ) -> Result<Value, ProbeError> {
        let plan = self.plan(env, arguments)?;
        session.execute(&plan).await
    }
}

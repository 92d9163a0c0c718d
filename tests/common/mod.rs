use apiprobe::environment::Environment;
use apiprobe::errors::ProbeError;
use apiprobe::logger::Logger;
use apiprobe::registry::request::{
    FunctionSignature, Parameter, Request, RequestHandler,
};
use apiprobe::registry::types::ValueType;
use apiprobe::registry::RegistryContext;
use apiprobe::session::Session;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Handler that counts invocations and echoes its resolved arguments.
pub struct RecordingHandler {
    pub calls: AtomicUsize,
}

impl RecordingHandler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RequestHandler for RecordingHandler {
    async fn invoke(
        &self,
        _env: &Environment,
        _session: &Session,
        arguments: &Map<String, Value>,
    ) -> Result<Value, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Value::Object(arguments.clone()))
    }
}

pub fn fresh_registry() -> RegistryContext {
    RegistryContext::new(Logger::new("test"))
}

pub fn request_with_params(
    module: &str,
    name: &str,
    parameters: Vec<Parameter>,
    handler: Arc<dyn RequestHandler>,
) -> Request {
    Request::new(name, module, FunctionSignature::new(parameters), handler)
}

pub fn int_param_with_default(name: &str, default: i64) -> Parameter {
    Parameter::with_default(
        name,
        ValueType::from_tag(Some("int")).expect("int tag"),
        Value::from(default),
    )
}

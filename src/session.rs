use crate::errors::{LoadError, ProbeError};
use crate::reporting::Reporter;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use serde_json::Value;
use std::time::Instant;
use url::Url;

/// A fully rendered, ready-to-send HTTP exchange: what a request handler
/// hands to the transport after template substitution.
#[derive(Debug, Clone)]
pub struct RequestPlan {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// Opaque transport handle injected into request handlers. Wraps one
/// reqwest client for the whole interactive session so connections are
/// reused across invocations.
pub struct Session {
    client: Client,
    reporter: Reporter,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_reporter(Reporter::new())
    }

    pub fn with_reporter(reporter: Reporter) -> Self {
        Self {
            client: Client::new(),
            reporter,
        }
    }

    /// Sends the plan and returns the decoded response body: parsed JSON
    /// for JSON content types, text otherwise, null when empty. HTTP error
    /// statuses are reported, not raised; inspecting failures is the whole
    /// point of a debugging session.
    pub async fn execute(&self, plan: &RequestPlan) -> Result<Value, ProbeError> {
        let method = Method::from_bytes(plan.method.to_uppercase().as_bytes())
            .map_err(|_| LoadError::UnsupportedMethod(plan.method.clone()))?;
        let url = Url::parse(&plan.url).map_err(|err| {
            ProbeError::InvalidPlan(format!("invalid URL \"{}\": {}", plan.url, err))
        })?;

        let mut headers = HeaderMap::new();
        for (name, value) in &plan.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|err| {
                ProbeError::InvalidPlan(format!("invalid header name \"{}\": {}", name, err))
            })?;
            let value = HeaderValue::from_str(value).map_err(|err| {
                ProbeError::InvalidPlan(format!("invalid value for header \"{}\": {}", name, err))
            })?;
            headers.insert(name, value);
        }

        let mut builder = self.client.request(method.clone(), url).headers(headers);
        if !plan.query.is_empty() {
            builder = builder.query(&plan.query);
        }
        if let Some(body) = &plan.body {
            builder = builder.json(body);
        }

        self.reporter.request_sent(method.as_str(), &plan.url);
        let started = Instant::now();
        let response = builder.send().await?;
        let elapsed = started.elapsed();

        let status = response.status();
        let reason = status.canonical_reason().unwrap_or("");
        let header_pairs: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    value.to_str().unwrap_or("<binary>").to_string(),
                )
            })
            .collect();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("")
            .to_string();

        self.reporter
            .response_received(status.as_u16(), reason, &header_pairs, elapsed);

        let text = response.text().await?;
        let body = if text.is_empty() {
            Value::Null
        } else if content_type.contains("application/json") {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        } else {
            Value::String(text)
        };
        self.reporter.response_body(&content_type, &body);
        Ok(body)
    }
}

use colored::Colorize;
use serde_json::Value;
use std::time::Duration;

/// Pretty-prints one request/response exchange to the transcript. The core
/// engine never reads bodies; this is the only place they are rendered.
#[derive(Debug, Clone, Default)]
pub struct Reporter {
    enabled: bool,
}

impl Reporter {
    pub fn new() -> Self {
        Self { enabled: true }
    }

    pub fn silent() -> Self {
        Self { enabled: false }
    }

    pub fn request_sent(&self, method: &str, url: &str) {
        if !self.enabled {
            return;
        }
        println!(
            "{} {}",
            ">".dimmed(),
            format!("{} {}", method, url).bold()
        );
    }

    pub fn response_received(
        &self,
        status: u16,
        reason: &str,
        headers: &[(String, String)],
        elapsed: Duration,
    ) {
        if !self.enabled {
            return;
        }
        let status_line = format!("{} {}", status, reason);
        let status_line = if status < 400 {
            status_line.green()
        } else {
            status_line.red()
        };
        println!(
            "{} {} {}",
            "<".dimmed(),
            status_line,
            format!("[{:.3}s]", elapsed.as_secs_f64()).dimmed()
        );
        println!("{}", "<".dimmed());
        println!("{} {}", "<".dimmed(), "Headers:".bold());
        for (name, value) in headers {
            println!("{}  {}: {}", "<".dimmed(), name, value);
        }
    }

    pub fn response_body(&self, content_type: &str, body: &Value) {
        if !self.enabled || body.is_null() {
            return;
        }
        println!("{}", "<".dimmed());
        println!(
            "{} {} {}",
            "<".dimmed(),
            "Content".bold(),
            format!("({}):", content_type).dimmed()
        );
        let rendered = match body {
            Value::String(text) => text.clone(),
            other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
        };
        println!("{}", rendered);
    }
}

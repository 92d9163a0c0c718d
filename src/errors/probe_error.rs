use crate::errors::{CastError, RequestError};
use thiserror::Error;

/// Errors raised while reading and compiling request definition sources.
/// Each definition fails independently; the loader reports and moves on.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Cannot read request source {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Request source {path} is not valid JSON: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unknown cache mode \"{0}\", must be: session")]
    UnknownCacheMode(String),

    #[error("Unsupported HTTP method \"{0}\"")]
    UnsupportedMethod(String),

    #[error(transparent)]
    Cast(#[from] CastError),
}

/// Top-level error crossing the CLI boundary.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Cast(#[from] CastError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("Environment \"{name}\" does not exist")]
    EnvironmentNotFound { name: String },

    #[error("Environment \"{name}\" is invalid: {reason}")]
    EnvironmentInvalid { name: String, reason: String },

    #[error("Unresolved placeholder \"{{{0}}}\"")]
    UnresolvedPlaceholder(String),

    #[error("Cannot build request: {0}")]
    InvalidPlan(String),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ProbeError {
    /// True when the user aborted an interactive prompt (Ctrl-C / EOF).
    pub fn is_interrupt(&self) -> bool {
        matches!(
            self,
            ProbeError::Io(err) if err.kind() == std::io::ErrorKind::Interrupted
        )
    }
}

use thiserror::Error;

/// Errors raised while registering or resolving requests. Each variant is a
/// distinct, matchable kind so callers and tests can assert exact failure
/// semantics instead of string-matching.
#[derive(Debug, Clone, Error)]
pub enum RequestError {
    #[error("\"{module}:{name}\" is not a valid request identifier. Name can contain only letters, numbers and/or underscores")]
    InvalidName { module: String, name: String },

    #[error("\"{name}\" is already defined in module {module}")]
    DuplicateName { module: String, name: String },

    #[error("{0}")]
    NotImplemented(String),

    #[error("Request \"{name}\" found in multiple modules: {}", .modules.join(", "))]
    Ambiguous { name: String, modules: Vec<String> },
}

impl RequestError {
    pub fn missing_module(module: &str) -> Self {
        RequestError::NotImplemented(format!("Module \"{}\" does not exist.", module))
    }

    pub fn missing_request(identifier: &str) -> Self {
        RequestError::NotImplemented(format!("Request \"{}\" does not exist.", identifier))
    }
}

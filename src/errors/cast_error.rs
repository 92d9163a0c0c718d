use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum CastError {
    #[error("String \"{value}\" cannot be converted to {target}")]
    Incompatible { value: String, target: String },

    #[error("Unsupported type tag \"{0}\"")]
    UnsupportedTag(String),
}

impl CastError {
    pub fn incompatible(value: impl ToString, target: impl Into<String>) -> Self {
        CastError::Incompatible {
            value: value.to_string(),
            target: target.into(),
        }
    }
}

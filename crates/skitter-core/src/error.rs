use thiserror::Error;

/// Top-level error type for skitter-core.
#[derive(Debug, Error)]
pub enum SkitterError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Body plan error: {0}")]
    Plan(#[from] PlanError),
}

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Incompatible configuration: {0}")]
    Incompatible(String),

    #[error("Invalid body plan: {0}")]
    Plan(#[from] PlanError),
}

impl ConfigError {
    /// Shorthand for [`ConfigError::InvalidValue`].
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Body plan validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum PlanError {
    #[error("Body plan has no legs")]
    NoLegs,

    #[error("Leg {leg} has no segments")]
    NoSegments { leg: usize },

    #[error("Leg {leg} segment {segment} has non-positive length {length}")]
    NonPositiveSegment {
        leg: usize,
        segment: usize,
        length: f64,
    },

    #[error("Invalid scale factor: {0} (must be finite and > 0)")]
    InvalidScale(f64),
}

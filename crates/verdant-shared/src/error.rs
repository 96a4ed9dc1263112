//! Error types for Verdant.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VerdantError {
    #[error("Invalid rule '{id}': {reason}")]
    InvalidRule { id: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl VerdantError {
    /// Short machine-readable kind, used in log fields
    pub fn kind(&self) -> &'static str {
        match self {
            VerdantError::InvalidRule { .. } => "invalid_rule",
            VerdantError::Io(_) => "io",
            VerdantError::Json(_) => "json",
            VerdantError::Toml(_) => "toml",
        }
    }
}

pub type Result<T> = std::result::Result<T, VerdantError>;

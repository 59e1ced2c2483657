//! Error types for the navigation engine

use thiserror::Error;

/// Navigation engine error type
///
/// An unreachable target is not an error: the search returns an empty path.
#[derive(Error, Debug)]
pub enum NavError {
    #[error("position ({x},{y}) is outside the {width}x{height} grid")]
    OutOfBounds { x: i32, y: i32, width: i32, height: i32 },

    #[error("invalid {field}: {value} (accepted range {min}..={max})")]
    InvalidConfiguration {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("layout error: {0}")]
    Layout(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<toml::de::Error> for NavError {
    fn from(e: toml::de::Error) -> Self {
        NavError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, NavError>;

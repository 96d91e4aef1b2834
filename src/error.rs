//! @acp:module "Errors"
//! @acp:summary "Library error type and result alias"
//! @acp:domain core
//! @acp:layer types

use thiserror::Error;

/// Errors raised by the onboarding engine
#[derive(Debug, Error)]
pub enum ThriveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unknown node: {0}")]
    UnknownNode(String),

    #[error("Option {index} is out of range for '{node}' ({count} options)")]
    InvalidOption {
        node: String,
        index: usize,
        count: usize,
    },

    #[error("Node '{0}' is informational and takes no answer")]
    NotAQuestion(String),

    #[error("Condition error: {0}")]
    Condition(String),

    #[error("Duplicate node id: {0}")]
    DuplicateNode(String),

    #[error("Answer key '{key}' is asked by both '{first}' and '{second}'")]
    DuplicateKey {
        key: String,
        first: String,
        second: String,
    },

    #[error("Flow revisits node '{0}' without new answers")]
    FlowCycle(String),

    #[error("Schema validation failed: {0}")]
    Schema(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("{0}")]
    Other(String),
}

impl From<handlebars::RenderError> for ThriveError {
    fn from(err: handlebars::RenderError) -> Self {
        ThriveError::Template(err.to_string())
    }
}

impl From<handlebars::TemplateError> for ThriveError {
    fn from(err: handlebars::TemplateError) -> Self {
        ThriveError::Template(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ThriveError>;

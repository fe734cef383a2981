use crate::checker::CheckerError;
use crate::registry::ParseError;
use std::path::PathBuf;

/// Probe-config construction errors. Construction is all-or-nothing at
/// category and config granularity, so any of these aborts the whole load.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("config file is not valid JSON: {0}")]
    Syntax(#[from] serde_json::Error),

    #[error("bad config shape at {context}: {cause}")]
    Shape { context: String, cause: String },

    #[error("component '{component}': {source}")]
    Function {
        component: String,
        source: ParseError,
    },

    #[error("component '{component}' expect rules: {source}")]
    Checker {
        component: String,
        source: CheckerError,
    },
}

impl ConfigError {
    pub fn shape(context: impl Into<String>, cause: impl Into<String>) -> Self {
        Self::Shape {
            context: context.into(),
            cause: cause.into(),
        }
    }
}

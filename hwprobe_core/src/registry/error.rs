use crate::args::ArgError;

/// Configuration-time parse failures. Always fatal to the enclosing
/// construction step; never produced during evaluation.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("probe expression must be a JSON object")]
    NotAnObject,

    #[error("probe expression must have exactly one top-level key, found {found}")]
    NotSingleKey { found: usize },

    #[error("arguments for probe function '{name}' must be a JSON object")]
    ArgsNotAnObject { name: String },

    #[error("unknown probe function '{name}'")]
    UnknownFunction { name: String },

    #[error("invalid arguments for probe function '{name}': {}", format_causes(.causes))]
    InvalidArguments { name: String, causes: Vec<ArgError> },

    #[error("probe function '{name}' is already registered")]
    DuplicateFunction { name: String },
}

impl ParseError {
    /// Wrap accumulated argument errors for one function.
    pub fn invalid_arguments(name: &str, causes: Vec<ArgError>) -> Self {
        Self::InvalidArguments {
            name: name.to_string(),
            causes,
        }
    }
}

fn format_causes(causes: &[ArgError]) -> String {
    causes
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

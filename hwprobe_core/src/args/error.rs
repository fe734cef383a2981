/// Argument-level parsing errors, accumulated per function so one report
/// surfaces every problem in the dictionary.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ArgError {
    #[error("missing required argument '{key}'")]
    Missing { key: String },

    #[error("argument '{key}' expects {expected}, got {got}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        got: String,
    },

    #[error("unknown argument '{key}'")]
    UnknownKey { key: String },

    #[error("argument '{key}' element {index}: {cause}")]
    BadElement {
        key: String,
        index: usize,
        cause: String,
    },
}

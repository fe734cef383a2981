/// Configuration errors while building converters and checkers.
#[derive(Debug, thiserror::Error)]
pub enum CheckerError {
    #[error("unknown field type '{field_type}' (expected str, int, hex or double)")]
    UnknownFieldType { field_type: String },

    #[error("malformed comparison rule '{rule}'")]
    MalformedRule { rule: String },

    #[error("rule operand in '{rule}' does not parse as the field's type")]
    BadOperand { rule: String },

    #[error("invalid regex '{pattern}': {reason}")]
    InvalidRegex { pattern: String, reason: String },

    #[error("'!re' rule applied to non-string field type '{field_type}'")]
    RegexOnNonString { field_type: String },

    #[error("expect entry for field '{field}' is malformed: {cause}")]
    MalformedExpectEntry { field: String, cause: String },
}

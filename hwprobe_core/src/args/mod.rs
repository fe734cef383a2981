//! # Typed argument parsing for probe functions
//!
//! Converts a loosely-typed JSON dictionary into strongly-typed fields with
//! per-field defaults. Sibling fields are parsed independently so a single
//! parse attempt reports every problem at once; the overall parse fails if
//! any field failed.

pub mod error;

pub use error::ArgError;

use crate::functions::Probe;
use crate::registry::FunctionRegistry;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Human-readable name of a JSON value's type, for diagnostics.
pub fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) => {
            if n.is_f64() {
                "double"
            } else {
                "int"
            }
        }
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

/// Accumulating parser over one function's argument dictionary.
///
/// Every getter records errors instead of returning early; `finish` reports
/// them all, plus one error per key the function never asked for.
pub struct ArgParser<'a> {
    dict: &'a Map<String, Value>,
    requested: HashSet<String>,
    errors: Vec<ArgError>,
}

impl<'a> ArgParser<'a> {
    pub fn new(dict: &'a Map<String, Value>) -> Self {
        Self {
            dict,
            requested: HashSet::new(),
            errors: Vec::new(),
        }
    }

    fn lookup(&mut self, key: &str) -> Option<&'a Value> {
        self.requested.insert(key.to_string());
        self.dict.get(key)
    }

    fn mismatch(&mut self, key: &str, expected: &'static str, got: &Value) {
        self.errors.push(ArgError::TypeMismatch {
            key: key.to_string(),
            expected,
            got: value_type_name(got).to_string(),
        });
    }

    fn missing(&mut self, key: &str) {
        self.errors.push(ArgError::Missing {
            key: key.to_string(),
        });
    }

    pub fn string(&mut self, key: &str, default: Option<&str>) -> String {
        match self.lookup(key) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => {
                let other = other.clone();
                self.mismatch(key, "string", &other);
                default.unwrap_or("").to_string()
            }
            None => match default {
                Some(d) => d.to_string(),
                None => {
                    self.missing(key);
                    String::new()
                }
            },
        }
    }

    pub fn boolean(&mut self, key: &str, default: Option<bool>) -> bool {
        match self.lookup(key) {
            Some(Value::Bool(b)) => *b,
            Some(other) => {
                let other = other.clone();
                self.mismatch(key, "bool", &other);
                default.unwrap_or(false)
            }
            None => match default {
                Some(d) => d,
                None => {
                    self.missing(key);
                    false
                }
            },
        }
    }

    pub fn integer(&mut self, key: &str, default: Option<i64>) -> i64 {
        match self.lookup(key) {
            Some(Value::Number(n)) if n.as_i64().is_some() => n.as_i64().unwrap_or(0),
            Some(other) => {
                let other = other.clone();
                self.mismatch(key, "int", &other);
                default.unwrap_or(0)
            }
            None => match default {
                Some(d) => d,
                None => {
                    self.missing(key);
                    0
                }
            },
        }
    }

    pub fn double(&mut self, key: &str, default: Option<f64>) -> f64 {
        match self.lookup(key) {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            Some(other) => {
                let other = other.clone();
                self.mismatch(key, "double", &other);
                default.unwrap_or(0.0)
            }
            None => match default {
                Some(d) => d,
                None => {
                    self.missing(key);
                    0.0
                }
            },
        }
    }

    /// A list of plain strings. `default` of `None` makes the key required.
    pub fn string_list(&mut self, key: &str, default: Option<Vec<String>>) -> Vec<String> {
        match self.lookup(key) {
            Some(Value::Array(items)) => {
                let mut out = Vec::with_capacity(items.len());
                let mut ok = true;
                for (index, item) in items.iter().enumerate() {
                    match item {
                        Value::String(s) => out.push(s.clone()),
                        other => {
                            self.errors.push(ArgError::BadElement {
                                key: key.to_string(),
                                index,
                                cause: format!(
                                    "expected string, got {}",
                                    value_type_name(other)
                                ),
                            });
                            ok = false;
                        }
                    }
                }
                if ok {
                    out
                } else {
                    default.unwrap_or_default()
                }
            }
            Some(other) => {
                let other = other.clone();
                self.mismatch(key, "list of strings", &other);
                default.unwrap_or_default()
            }
            None => match default {
                Some(d) => d,
                None => {
                    self.missing(key);
                    Vec::new()
                }
            },
        }
    }

    /// A list of child probe-function expressions, parsed recursively.
    ///
    /// Child lists never have a default: absence is always an error, and
    /// every element must parse or the whole list fails.
    pub fn probe_list(&mut self, key: &str, registry: &FunctionRegistry) -> Vec<Probe> {
        match self.lookup(key) {
            Some(Value::Array(items)) => {
                let mut out = Vec::with_capacity(items.len());
                let mut ok = true;
                for (index, item) in items.iter().enumerate() {
                    match registry.parse(item) {
                        Ok(probe) => out.push(probe),
                        Err(e) => {
                            self.errors.push(ArgError::BadElement {
                                key: key.to_string(),
                                index,
                                cause: e.to_string(),
                            });
                            ok = false;
                        }
                    }
                }
                if ok {
                    out
                } else {
                    Vec::new()
                }
            }
            Some(other) => {
                let other = other.clone();
                self.mismatch(key, "list of probe functions", &other);
                Vec::new()
            }
            None => {
                self.missing(key);
                Vec::new()
            }
        }
    }

    /// Report unknown keys, then either succeed or surface every error found.
    pub fn finish(mut self) -> Result<(), Vec<ArgError>> {
        for key in self.dict.keys() {
            if !self.requested.contains(key) {
                self.errors.push(ArgError::UnknownKey { key: key.clone() });
            }
        }

        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dict(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test dict must be an object"),
        }
    }

    #[test]
    fn test_present_keys_of_matching_type() {
        let d = dict(json!({"a": "x", "b": true, "c": 7, "d": 1.5}));
        let mut parser = ArgParser::new(&d);

        assert_eq!(parser.string("a", None), "x");
        assert!(parser.boolean("b", None));
        assert_eq!(parser.integer("c", None), 7);
        assert_eq!(parser.double("d", None), 1.5);
        assert!(parser.finish().is_ok());
    }

    #[test]
    fn test_missing_key_uses_default() {
        let d = dict(json!({}));
        let mut parser = ArgParser::new(&d);

        assert_eq!(parser.string("a", Some("fallback")), "fallback");
        assert_eq!(parser.integer("b", Some(3)), 3);
        assert!(parser.finish().is_ok());
    }

    #[test]
    fn test_missing_key_without_default_fails() {
        let d = dict(json!({}));
        let mut parser = ArgParser::new(&d);

        parser.string("a", None);
        let errors = parser.finish().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(&errors[0], ArgError::Missing { key } if key == "a"));
    }

    #[test]
    fn test_type_mismatch_is_hard_failure() {
        let d = dict(json!({"a": 5}));
        let mut parser = ArgParser::new(&d);

        parser.string("a", Some("x"));
        let errors = parser.finish().unwrap_err();
        assert!(matches!(&errors[0], ArgError::TypeMismatch { key, .. } if key == "a"));
    }

    #[test]
    fn test_all_sibling_errors_reported() {
        let d = dict(json!({"a": 5, "c": []}));
        let mut parser = ArgParser::new(&d);

        parser.string("a", None); // wrong type
        parser.boolean("b", None); // missing
        parser.integer("c", None); // wrong type
        let errors = parser.finish().unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let d = dict(json!({"a": "x", "typo": 1}));
        let mut parser = ArgParser::new(&d);

        parser.string("a", None);
        let errors = parser.finish().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(&errors[0], ArgError::UnknownKey { key } if key == "typo"));
    }

    #[test]
    fn test_string_list_rejects_mixed_elements() {
        let d = dict(json!({"keys": ["ok", 3]}));
        let mut parser = ArgParser::new(&d);

        parser.string_list("keys", None);
        let errors = parser.finish().unwrap_err();
        assert!(matches!(&errors[0], ArgError::BadElement { index: 1, .. }));
    }
}

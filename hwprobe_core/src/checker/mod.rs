//! # Result validation
//!
//! A [`ProbeResultChecker`] holds the `expect` rules of one probe statement:
//! a set of required fields and a set of optional fields, each with a
//! [`FieldConverter`]. Required-field failure rejects the whole result map;
//! optional-field failure only drops that field.

pub mod converter;
pub mod error;

pub use converter::{CompareOp, ConvertStatus, FieldConverter};
pub use error::CheckerError;

use crate::result::ResultMap;
use serde_json::{Map, Value};

#[derive(Debug)]
pub struct ProbeResultChecker {
    required: Vec<(String, FieldConverter)>,
    optional: Vec<(String, FieldConverter)>,
}

impl ProbeResultChecker {
    /// Build from an `expect` dictionary:
    /// `{ "<field>": [<required:bool>, "<type>", "<rule?>"], ... }`.
    pub fn from_dict(expect: &Map<String, Value>) -> Result<Self, CheckerError> {
        let mut required = Vec::new();
        let mut optional = Vec::new();

        for (field, entry) in expect {
            let items = entry
                .as_array()
                .ok_or_else(|| CheckerError::MalformedExpectEntry {
                    field: field.clone(),
                    cause: "entry must be a list".to_string(),
                })?;

            if items.len() < 2 || items.len() > 3 {
                return Err(CheckerError::MalformedExpectEntry {
                    field: field.clone(),
                    cause: format!("expected 2 or 3 elements, found {}", items.len()),
                });
            }

            let is_required =
                items[0]
                    .as_bool()
                    .ok_or_else(|| CheckerError::MalformedExpectEntry {
                        field: field.clone(),
                        cause: "first element must be a bool".to_string(),
                    })?;
            let field_type =
                items[1]
                    .as_str()
                    .ok_or_else(|| CheckerError::MalformedExpectEntry {
                        field: field.clone(),
                        cause: "second element must be a type string".to_string(),
                    })?;
            let rule = match items.get(2) {
                None => "",
                Some(Value::String(rule)) => rule.as_str(),
                Some(_) => {
                    return Err(CheckerError::MalformedExpectEntry {
                        field: field.clone(),
                        cause: "third element must be a rule string".to_string(),
                    })
                }
            };

            let converter = FieldConverter::from_spec(field_type, rule)?;
            if is_required {
                required.push((field.clone(), converter));
            } else {
                optional.push((field.clone(), converter));
            }
        }

        Ok(Self { required, optional })
    }

    /// Convert and validate one result map in place.
    ///
    /// `false` means the map is rejected (a required field was missing,
    /// unconvertible or failed its rule). Optional-field failures only
    /// remove the field and never reject the map.
    pub fn apply(&self, map: &mut ResultMap) -> bool {
        for (field, converter) in &self.required {
            match converter.convert(field, map) {
                ConvertStatus::Ok => {
                    if !converter.validate(field, map) {
                        log::debug!("checker: required field '{}' failed its rule", field);
                        return false;
                    }
                }
                status => {
                    log::debug!("checker: required field '{}' failed: {:?}", field, status);
                    return false;
                }
            }
        }

        for (field, converter) in &self.optional {
            match converter.convert(field, map) {
                ConvertStatus::Ok => {
                    if !converter.validate(field, map) {
                        map.remove(field);
                    }
                }
                ConvertStatus::FieldNotFound => {}
                ConvertStatus::IncompatibleValue => {
                    map.remove(field);
                }
            }
        }

        true
    }
}

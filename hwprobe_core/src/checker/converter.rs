//! Field conversion and comparison rules.
//!
//! A converter coerces one named result field to its declared type in
//! place, then optionally checks it against a comparison rule. Rules use a
//! small grammar: `""`, `"!nop"`, `"!re <pattern>"`, `"!eq <value>"` and
//! friends; the operator token is the first whitespace-delimited word, the
//! remainder is the operand.

use crate::checker::error::CheckerError;
use crate::result::ResultMap;
use regex::Regex;
use serde_json::Value;

/// Outcome of coercing one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertStatus {
    Ok,
    FieldNotFound,
    IncompatibleValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Nop,
    Re,
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CompareOp {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "!nop" => Some(Self::Nop),
            "!re" => Some(Self::Re),
            "!eq" => Some(Self::Eq),
            "!ne" => Some(Self::Ne),
            "!gt" => Some(Self::Gt),
            "!ge" => Some(Self::Ge),
            "!lt" => Some(Self::Lt),
            "!le" => Some(Self::Le),
            _ => None,
        }
    }

    fn ordering_holds(self, ord: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::*;
        match self {
            Self::Eq => ord == Equal,
            Self::Ne => ord != Equal,
            Self::Gt => ord == Greater,
            Self::Ge => ord != Less,
            Self::Lt => ord == Less,
            Self::Le => ord != Greater,
            Self::Nop | Self::Re => false,
        }
    }
}

/// Split a rule string into operator and raw operand.
fn parse_rule(rule: &str) -> Result<(CompareOp, Option<&str>), CheckerError> {
    let rule = rule.trim();
    if rule.is_empty() {
        return Ok((CompareOp::Nop, None));
    }

    let (token, rest) = match rule.split_once(char::is_whitespace) {
        Some((token, rest)) => (token, Some(rest.trim())),
        None => (rule, None),
    };

    let op = CompareOp::from_token(token).ok_or_else(|| CheckerError::MalformedRule {
        rule: rule.to_string(),
    })?;

    match (op, rest) {
        (CompareOp::Nop, None) => Ok((op, None)),
        (CompareOp::Nop, Some(_)) | (_, None) => Err(CheckerError::MalformedRule {
            rule: rule.to_string(),
        }),
        (op, Some(operand)) => Ok((op, Some(operand))),
    }
}

/// Typed coerce-then-compare unit for one result field.
#[derive(Debug)]
pub enum FieldConverter {
    String {
        op: CompareOp,
        operand: Option<String>,
        pattern: Option<Regex>,
    },
    Integer {
        op: CompareOp,
        operand: Option<i64>,
    },
    Hex {
        op: CompareOp,
        operand: Option<i64>,
    },
    Double {
        op: CompareOp,
        operand: Option<f64>,
    },
}

impl FieldConverter {
    /// Build one converter from a declared type name and rule string.
    pub fn from_spec(field_type: &str, rule: &str) -> Result<Self, CheckerError> {
        let (op, operand) = parse_rule(rule)?;

        if op == CompareOp::Re && field_type != "str" {
            return Err(CheckerError::RegexOnNonString {
                field_type: field_type.to_string(),
            });
        }

        match field_type {
            "str" => {
                let pattern = match (op, operand) {
                    (CompareOp::Re, Some(raw)) => {
                        Some(Regex::new(raw).map_err(|e| CheckerError::InvalidRegex {
                            pattern: raw.to_string(),
                            reason: e.to_string(),
                        })?)
                    }
                    _ => None,
                };
                Ok(Self::String {
                    op,
                    operand: operand.map(str::to_string),
                    pattern,
                })
            }
            "int" => Ok(Self::Integer {
                op,
                operand: parse_operand(operand, rule, |s| s.parse().ok())?,
            }),
            "hex" => Ok(Self::Hex {
                op,
                operand: parse_operand(operand, rule, parse_hex)?,
            }),
            "double" => Ok(Self::Double {
                op,
                operand: parse_operand(operand, rule, |s| s.parse().ok())?,
            }),
            other => Err(CheckerError::UnknownFieldType {
                field_type: other.to_string(),
            }),
        }
    }

    /// Coerce `field` in `map` to this converter's native type, in place.
    pub fn convert(&self, field: &str, map: &mut ResultMap) -> ConvertStatus {
        let Some(value) = map.get(field) else {
            return ConvertStatus::FieldNotFound;
        };

        let coerced = match self {
            Self::String { .. } => coerce_string(value),
            Self::Integer { .. } => coerce_integer(value, false),
            Self::Hex { .. } => coerce_integer(value, true),
            Self::Double { .. } => coerce_double(value),
        };

        match coerced {
            Some(new_value) => {
                map.insert(field.to_string(), new_value);
                ConvertStatus::Ok
            }
            None => ConvertStatus::IncompatibleValue,
        }
    }

    /// Apply the stored comparison rule to an already-converted field.
    pub fn validate(&self, field: &str, map: &ResultMap) -> bool {
        let Some(value) = map.get(field) else {
            return false;
        };

        match self {
            Self::String {
                op,
                operand,
                pattern,
            } => match op {
                CompareOp::Nop => true,
                CompareOp::Re => match (pattern, value.as_str()) {
                    (Some(re), Some(s)) => re.is_match(s),
                    _ => false,
                },
                op => match (value.as_str(), operand) {
                    (Some(actual), Some(expected)) => {
                        op.ordering_holds(actual.cmp(expected.as_str()))
                    }
                    _ => false,
                },
            },
            Self::Integer { op, operand } | Self::Hex { op, operand } => match op {
                CompareOp::Nop => true,
                op => match (value.as_i64(), operand) {
                    (Some(actual), Some(expected)) => op.ordering_holds(actual.cmp(expected)),
                    _ => false,
                },
            },
            Self::Double { op, operand } => match op {
                CompareOp::Nop => true,
                op => match (value.as_f64(), operand) {
                    (Some(actual), Some(expected)) => actual
                        .partial_cmp(expected)
                        .map(|ord| op.ordering_holds(ord))
                        .unwrap_or(false),
                    _ => false,
                },
            },
        }
    }
}

fn parse_operand<T>(
    operand: Option<&str>,
    rule: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Option<T>, CheckerError> {
    match operand {
        None => Ok(None),
        Some(raw) => parse(raw)
            .map(Some)
            .ok_or_else(|| CheckerError::BadOperand {
                rule: rule.to_string(),
            }),
    }
}

fn parse_hex(s: &str) -> Option<i64> {
    let stripped = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    i64::from_str_radix(stripped, 16).ok()
}

fn coerce_string(value: &Value) -> Option<Value> {
    match value {
        Value::String(_) => Some(value.clone()),
        Value::Number(n) => Some(Value::String(n.to_string())),
        Value::Null => Some(Value::String("null".to_string())),
        _ => None,
    }
}

fn coerce_integer(value: &Value, hex: bool) -> Option<Value> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Value::from(i))
            } else {
                // Double truncated toward zero.
                n.as_f64().map(|f| Value::from(f as i64))
            }
        }
        Value::String(s) => {
            let trimmed = s.trim();
            let parsed = if hex {
                parse_hex(trimmed)
            } else {
                trimmed.parse::<i64>().ok()
            };
            parsed.map(Value::from)
        }
        _ => None,
    }
}

fn coerce_double(value: &Value) -> Option<Value> {
    match value {
        Value::Number(n) => n.as_f64().map(Value::from),
        Value::String(s) => s.trim().parse::<f64>().ok().map(Value::from),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map_with(field: &str, value: Value) -> ResultMap {
        let mut map = ResultMap::new();
        map.insert(field.to_string(), value);
        map
    }

    #[test]
    fn test_string_converter_stringifies_numbers() {
        let conv = FieldConverter::from_spec("str", "").unwrap();
        let mut map = map_with("f", json!(123));
        assert_eq!(conv.convert("f", &mut map), ConvertStatus::Ok);
        assert_eq!(map["f"], json!("123"));
    }

    #[test]
    fn test_string_converter_null_becomes_literal() {
        let conv = FieldConverter::from_spec("str", "").unwrap();
        let mut map = map_with("f", Value::Null);
        assert_eq!(conv.convert("f", &mut map), ConvertStatus::Ok);
        assert_eq!(map["f"], json!("null"));
    }

    #[test]
    fn test_string_converter_rejects_containers() {
        let conv = FieldConverter::from_spec("str", "").unwrap();
        let mut map = map_with("f", json!({"x": 1}));
        assert_eq!(conv.convert("f", &mut map), ConvertStatus::IncompatibleValue);
        let mut map = map_with("f", json!([1]));
        assert_eq!(conv.convert("f", &mut map), ConvertStatus::IncompatibleValue);
    }

    #[test]
    fn test_integer_converter_parses_trimmed_decimal() {
        let conv = FieldConverter::from_spec("int", "").unwrap();
        let mut map = map_with("f", json!("  123  "));
        assert_eq!(conv.convert("f", &mut map), ConvertStatus::Ok);
        assert_eq!(map["f"], json!(123));
    }

    #[test]
    fn test_integer_converter_truncates_double() {
        let conv = FieldConverter::from_spec("int", "").unwrap();
        let mut map = map_with("f", json!(12.9));
        assert_eq!(conv.convert("f", &mut map), ConvertStatus::Ok);
        assert_eq!(map["f"], json!(12));
    }

    #[test]
    fn test_hex_converter_parses_prefixed_and_bare() {
        let conv = FieldConverter::from_spec("hex", "").unwrap();
        let mut map = map_with("f", json!("0x7b"));
        assert_eq!(conv.convert("f", &mut map), ConvertStatus::Ok);
        assert_eq!(map["f"], json!(123));

        let mut map = map_with("f", json!("7b"));
        assert_eq!(conv.convert("f", &mut map), ConvertStatus::Ok);
        assert_eq!(map["f"], json!(123));
    }

    #[test]
    fn test_non_numeric_string_incompatible() {
        let conv = FieldConverter::from_spec("int", "").unwrap();
        let mut map = map_with("f", json!("12abc"));
        assert_eq!(conv.convert("f", &mut map), ConvertStatus::IncompatibleValue);
    }

    #[test]
    fn test_double_converter() {
        let conv = FieldConverter::from_spec("double", "").unwrap();
        let mut map = map_with("f", json!("123.5"));
        assert_eq!(conv.convert("f", &mut map), ConvertStatus::Ok);
        assert_eq!(map["f"], json!(123.5));

        let mut map = map_with("f", json!("   "));
        assert_eq!(conv.convert("f", &mut map), ConvertStatus::IncompatibleValue);
    }

    #[test]
    fn test_double_widens_integer() {
        let conv = FieldConverter::from_spec("double", "").unwrap();
        let mut map = map_with("f", json!(3));
        assert_eq!(conv.convert("f", &mut map), ConvertStatus::Ok);
        assert_eq!(map["f"].as_f64(), Some(3.0));
    }

    #[test]
    fn test_missing_field() {
        let conv = FieldConverter::from_spec("str", "").unwrap();
        let mut map = ResultMap::new();
        assert_eq!(conv.convert("f", &mut map), ConvertStatus::FieldNotFound);
    }

    #[test]
    fn test_gt_rule_is_strict() {
        let conv = FieldConverter::from_spec("int", "!gt 1").unwrap();
        for (value, expected) in [(0, false), (1, false), (2, true)] {
            let map = map_with("f", json!(value));
            assert_eq!(conv.validate("f", &map), expected, "value {}", value);
        }
    }

    #[test]
    fn test_regex_rule() {
        let conv = FieldConverter::from_spec("str", "!re ^abc.*$").unwrap();
        assert!(conv.validate("f", &map_with("f", json!("abcdef"))));
        assert!(!conv.validate("f", &map_with("f", json!("xabc"))));
    }

    #[test]
    fn test_eq_rule_on_string() {
        let conv = FieldConverter::from_spec("str", "!eq Battery").unwrap();
        assert!(conv.validate("f", &map_with("f", json!("Battery"))));
        assert!(!conv.validate("f", &map_with("f", json!("Mains"))));
    }

    #[test]
    fn test_nop_always_passes() {
        let conv = FieldConverter::from_spec("int", "!nop").unwrap();
        assert!(conv.validate("f", &map_with("f", json!(0))));
    }

    #[test]
    fn test_malformed_rules_rejected() {
        assert!(FieldConverter::from_spec("int", "!bogus 3").is_err());
        assert!(FieldConverter::from_spec("int", "!eq").is_err());
        assert!(FieldConverter::from_spec("int", "!eq abc").is_err());
        assert!(FieldConverter::from_spec("int", "!re x").is_err());
        assert!(FieldConverter::from_spec("str", "!re [").is_err());
        assert!(FieldConverter::from_spec("kelvin", "").is_err());
    }

    #[test]
    fn test_hex_rule_operand_parsed_as_hex() {
        let conv = FieldConverter::from_spec("hex", "!eq 0x7b").unwrap();
        assert!(conv.validate("f", &map_with("f", json!(123))));
    }
}

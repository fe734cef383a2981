//! Generic battery probe function.
//!
//! Fixed glob over `/sys/class/power_supply/BAT*`. A candidate whose `type`
//! attribute does not read `Battery` is rejected. Multi-battery systems are
//! unsupported outright: finding more than one is a hard failure, not a
//! multi-entry report.

use crate::args::ArgParser;
use crate::functions::{emit_results, ProbeFunction};
use crate::registry::{FunctionRegistry, ParseError};
use crate::result::{ProbeResult, ResultMap};
use crate::runtime::Context;
use serde_json::{Map, Value};

pub const NAME: &str = "generic_battery";

const BATTERY_GLOB: &str = "/sys/class/power_supply/BAT*";
const REQUIRED_FIELDS: &[&str] = &["manufacturer", "model_name", "technology"];
const OPTIONAL_FIELDS: &[&str] = &["charge_full_design", "cycle_count"];

pub struct GenericBatteryFunction;

pub fn factory(
    _registry: &FunctionRegistry,
    args: &Map<String, Value>,
) -> Result<Box<dyn ProbeFunction>, ParseError> {
    // Takes no arguments; anything present is a typo worth reporting.
    ArgParser::new(args)
        .finish()
        .map_err(|errors| ParseError::invalid_arguments(NAME, errors))?;
    Ok(Box::new(GenericBatteryFunction))
}

impl ProbeFunction for GenericBatteryFunction {
    fn name(&self) -> &'static str {
        NAME
    }

    fn eval_in_helper(&self, ctx: &Context, output: &mut String) -> i32 {
        let mut results: ProbeResult = Vec::new();

        'dirs: for dir in super::sysfs::glob_dirs(ctx, BATTERY_GLOB) {
            let type_value = match super::sysfs::read_trimmed(&dir.join("type")) {
                Some(v) => v,
                None => continue,
            };
            if type_value != "Battery" {
                log::debug!(
                    "generic_battery: '{}' has type '{}', skipping",
                    dir.display(),
                    type_value
                );
                continue;
            }

            let Some(index) = suffix_index(&dir) else {
                log::debug!(
                    "generic_battery: '{}' has no numeric suffix, skipping",
                    dir.display()
                );
                continue;
            };

            let mut map = ResultMap::new();
            for field in REQUIRED_FIELDS {
                match super::sysfs::read_trimmed(&dir.join(field)) {
                    Some(content) => {
                        map.insert(field.to_string(), Value::String(content));
                    }
                    None => continue 'dirs,
                }
            }
            for field in OPTIONAL_FIELDS {
                if let Some(content) = super::sysfs::read_trimmed(&dir.join(field)) {
                    map.insert(field.to_string(), Value::String(content));
                }
            }

            map.insert("type".to_string(), Value::String(type_value));
            map.insert(
                "path".to_string(),
                Value::String(dir.to_string_lossy().into_owned()),
            );
            map.insert("index".to_string(), Value::String((index + 1).to_string()));

            results.push(map);
        }

        if results.len() > 1 {
            log::error!(
                "generic_battery: found {} batteries, multi-battery is unsupported",
                results.len()
            );
            return 1;
        }

        emit_results(&results, output)
    }
}

/// Numeric index from the directory name's suffix digits (`BAT0` -> 0).
fn suffix_index(dir: &std::path::Path) -> Option<u32> {
    let name = dir.file_name()?.to_str()?;
    let digits: String = name
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::FunctionRegistry;
    use serde_json::json;
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;

    fn write_battery(root: &Path, name: &str, fields: &[(&str, &str)]) {
        let dir = root.join("sys/class/power_supply").join(name);
        fs::create_dir_all(&dir).unwrap();
        for (file, content) in fields {
            fs::write(dir.join(file), content).unwrap();
        }
    }

    fn test_ctx(root: &Path) -> Context {
        Context::new(Arc::new(FunctionRegistry::with_builtins())).with_sysfs_root(root)
    }

    fn parse_battery() -> crate::functions::Probe {
        FunctionRegistry::with_builtins()
            .parse(&json!({"generic_battery": {}}))
            .unwrap()
    }

    #[test]
    fn test_single_battery_probed() {
        let tmp = tempfile::tempdir().unwrap();
        write_battery(
            tmp.path(),
            "BAT0",
            &[
                ("type", "Battery\n"),
                ("manufacturer", "X"),
                ("model_name", "Y"),
                ("technology", "Z"),
            ],
        );

        let results = parse_battery().eval(&test_ctx(tmp.path()));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["manufacturer"], json!("X"));
        assert_eq!(results[0]["model_name"], json!("Y"));
        assert_eq!(results[0]["technology"], json!("Z"));
        assert_eq!(results[0]["type"], json!("Battery"));
        assert_eq!(results[0]["index"], json!("1"));
        assert!(results[0].contains_key("path"));
    }

    #[test]
    fn test_non_battery_type_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        write_battery(
            tmp.path(),
            "BAT0",
            &[
                ("type", "Mains"),
                ("manufacturer", "X"),
                ("model_name", "Y"),
                ("technology", "Z"),
            ],
        );

        assert!(parse_battery().eval(&test_ctx(tmp.path())).is_empty());
    }

    #[test]
    fn test_multi_battery_is_hard_failure() {
        let tmp = tempfile::tempdir().unwrap();
        for name in ["BAT0", "BAT1"] {
            write_battery(
                tmp.path(),
                name,
                &[
                    ("type", "Battery"),
                    ("manufacturer", "X"),
                    ("model_name", "Y"),
                    ("technology", "Z"),
                ],
            );
        }

        assert!(parse_battery().eval(&test_ctx(tmp.path())).is_empty());
    }

    #[test]
    fn test_arguments_rejected() {
        let registry = FunctionRegistry::with_builtins();
        assert!(registry
            .parse(&json!({"generic_battery": {"bogus": 1}}))
            .is_err());
    }

    #[test]
    fn test_suffix_index_extraction() {
        assert_eq!(suffix_index(Path::new("/x/BAT0")), Some(0));
        assert_eq!(suffix_index(Path::new("/x/BAT12")), Some(12));
        assert_eq!(suffix_index(Path::new("/x/BAT")), None);
    }
}

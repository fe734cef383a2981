//! # Probe function registry
//!
//! Name-to-factory table for probe functions. The table is populated by an
//! explicit, ordered registration pass at the composition root
//! (`FunctionRegistry::with_builtins`) and is read-only afterwards, so the
//! parse/evaluate phases never race a registration.

pub mod error;

pub use error::ParseError;

use crate::functions::{self, Probe, ProbeFunction};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Factory signature: build one probe function from its argument dictionary.
///
/// The registry itself is passed through so composite functions can parse
/// their children recursively.
pub type Factory =
    fn(&FunctionRegistry, &Map<String, Value>) -> Result<Box<dyn ProbeFunction>, ParseError>;

/// Write-once-per-name table from function name to factory.
pub struct FunctionRegistry {
    factories: HashMap<String, Factory>,
}

impl FunctionRegistry {
    /// An empty registry. Most callers want [`FunctionRegistry::with_builtins`].
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry with every built-in probe function registered, in a fixed
    /// order. This is the composition-root entry point.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        let builtins: &[(&str, Factory)] = &[
            (functions::sysfs::NAME, functions::sysfs::factory),
            (functions::battery::NAME, functions::battery::factory),
            (functions::storage::ATA_NAME, functions::storage::ata_factory),
            (functions::storage::MMC_NAME, functions::storage::mmc_factory),
            (
                functions::storage::NVME_NAME,
                functions::storage::nvme_factory,
            ),
            (
                functions::storage::GENERIC_NAME,
                functions::storage::generic_factory,
            ),
            (functions::network::NAME, functions::network::factory),
            (functions::vpd::NAME, functions::vpd::factory),
            (functions::shell::NAME, functions::shell::factory),
            (functions::ectool::NAME, functions::ectool::factory),
            (functions::sequence::NAME, functions::sequence::factory),
        ];

        for (name, factory) in builtins {
            // Built-in names are distinct; a collision is a programming error.
            registry
                .register(name, *factory)
                .unwrap_or_else(|_| panic!("duplicate built-in probe function '{}'", name));
        }

        registry
    }

    /// Register a factory under `name`. Each name may be registered once.
    pub fn register(&mut self, name: &str, factory: Factory) -> Result<(), ParseError> {
        if self.factories.contains_key(name) {
            return Err(ParseError::DuplicateFunction {
                name: name.to_string(),
            });
        }
        self.factories.insert(name.to_string(), factory);
        Ok(())
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn function_names(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    /// Parse a probe-function expression: an object with exactly one key
    /// naming a registered function, whose value is the argument dictionary.
    pub fn parse(&self, expr: &Value) -> Result<Probe, ParseError> {
        let map = match expr {
            Value::Object(map) => map,
            _ => return Err(ParseError::NotAnObject),
        };

        let (name, raw_args) = match (map.iter().next(), map.len()) {
            (Some(entry), 1) => entry,
            _ => return Err(ParseError::NotSingleKey { found: map.len() }),
        };

        let args = match raw_args {
            Value::Object(args) => args,
            _ => {
                return Err(ParseError::ArgsNotAnObject {
                    name: name.clone(),
                })
            }
        };

        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| ParseError::UnknownFunction { name: name.clone() })?;

        let imp = factory(self, args)?;
        Ok(Probe::new(name.clone(), args.clone(), imp))
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_round_trips_raw_configuration() {
        let registry = FunctionRegistry::with_builtins();
        let expr = json!({"sysfs": {
            "dir_path": "/sys/class/power_supply/BAT*",
            "keys": ["type"],
            "optional_keys": ["capacity"]
        }});

        let probe = registry.parse(&expr).unwrap();
        assert_eq!(probe.name(), "sysfs");
        assert_eq!(probe.to_expr(), expr);
    }

    #[test]
    fn test_parse_rejects_multiple_top_level_keys() {
        let registry = FunctionRegistry::with_builtins();
        let expr = json!({"sysfs": {}, "shell": {}});
        assert!(matches!(
            registry.parse(&expr),
            Err(ParseError::NotSingleKey { found: 2 })
        ));
    }

    #[test]
    fn test_parse_rejects_empty_expression() {
        let registry = FunctionRegistry::with_builtins();
        assert!(matches!(
            registry.parse(&json!({})),
            Err(ParseError::NotSingleKey { found: 0 })
        ));
    }

    #[test]
    fn test_parse_reports_unknown_function_name() {
        let registry = FunctionRegistry::with_builtins();
        let err = registry.parse(&json!({"no_such_probe": {}})).unwrap_err();
        match err {
            ParseError::UnknownFunction { name } => assert_eq!(name, "no_such_probe"),
            other => panic!("expected UnknownFunction, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = FunctionRegistry::new();
        registry
            .register("sysfs", crate::functions::sysfs::factory)
            .unwrap();
        assert!(matches!(
            registry.register("sysfs", crate::functions::sysfs::factory),
            Err(ParseError::DuplicateFunction { .. })
        ));
    }

    #[test]
    fn test_builtins_cover_all_function_names() {
        let registry = FunctionRegistry::with_builtins();
        for name in [
            "sysfs",
            "generic_battery",
            "ata_storage",
            "mmc_storage",
            "nvme_storage",
            "generic_storage",
            "network",
            "vpd_cached",
            "shell",
            "ectool_i2cread",
            "sequence",
        ] {
            assert!(registry.is_registered(name), "missing builtin '{}'", name);
        }
    }
}

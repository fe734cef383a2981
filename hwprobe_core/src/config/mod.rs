//! # Probe config orchestration
//!
//! The top-level document: category -> component name -> probe statement.
//! A statement binds one component to one probe function plus an optional
//! key filter and optional expect rules. Construction is fail-fast and
//! all-or-nothing; evaluation is read-only on the tree and never fails,
//! it only produces a possibly empty report.

pub mod error;

pub use error::ConfigError;

use crate::checker::ProbeResultChecker;
use crate::functions::Probe;
use crate::registry::FunctionRegistry;
use crate::result::ProbeResult;
use crate::runtime::Context;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

/// One named hardware component: probe root plus post-processing rules.
#[derive(Debug)]
pub struct ProbeStatement {
    component_name: String,
    probe: Probe,
    /// Result keys to retain; empty keeps all.
    keys: HashSet<String>,
    checker: Option<ProbeResultChecker>,
    /// Opaque payload copied into the report unchanged.
    information: Option<Value>,
}

impl ProbeStatement {
    pub fn from_dict(
        component_name: &str,
        dict: &Map<String, Value>,
        registry: &FunctionRegistry,
    ) -> Result<Self, ConfigError> {
        let eval_expr = dict.get("eval").ok_or_else(|| {
            ConfigError::shape(
                format!("component '{}'", component_name),
                "missing 'eval' probe function",
            )
        })?;
        let probe = registry
            .parse(eval_expr)
            .map_err(|source| ConfigError::Function {
                component: component_name.to_string(),
                source,
            })?;

        let keys = match dict.get("keys") {
            None => HashSet::new(),
            Some(Value::Array(items)) => {
                let mut keys = HashSet::new();
                for item in items {
                    match item {
                        Value::String(key) => {
                            keys.insert(key.clone());
                        }
                        _ => {
                            return Err(ConfigError::shape(
                                format!("component '{}' keys", component_name),
                                "keys must be strings",
                            ))
                        }
                    }
                }
                keys
            }
            Some(_) => {
                return Err(ConfigError::shape(
                    format!("component '{}'", component_name),
                    "'keys' must be a list",
                ))
            }
        };

        let checker = match dict.get("expect") {
            None => None,
            Some(Value::Object(expect)) => Some(
                ProbeResultChecker::from_dict(expect).map_err(|source| ConfigError::Checker {
                    component: component_name.to_string(),
                    source,
                })?,
            ),
            Some(_) => {
                return Err(ConfigError::shape(
                    format!("component '{}'", component_name),
                    "'expect' must be an object",
                ))
            }
        };

        for key in dict.keys() {
            if !matches!(key.as_str(), "eval" | "keys" | "expect" | "information") {
                log::warn!(
                    "component '{}': ignoring unrecognized statement key '{}'",
                    component_name,
                    key
                );
            }
        }

        Ok(Self {
            component_name: component_name.to_string(),
            probe,
            keys,
            checker,
            information: dict.get("information").cloned(),
        })
    }

    pub fn component_name(&self) -> &str {
        &self.component_name
    }

    pub fn information(&self) -> Option<&Value> {
        self.information.as_ref()
    }

    /// Probe, project to the key filter, then apply the expect rules where
    /// attached. Maps a present checker rejects are dropped.
    pub fn eval(&self, ctx: &Context) -> ProbeResult {
        let mut results = self.probe.eval(ctx);

        if !self.keys.is_empty() {
            for map in &mut results {
                map.retain(|key, _| self.keys.contains(key));
            }
        }

        if let Some(checker) = &self.checker {
            results.retain_mut(|map| checker.apply(map));
        }

        results
    }
}

/// A named group of probe statements, keyed by component name.
#[derive(Debug)]
pub struct ComponentCategory {
    category_name: String,
    statements: BTreeMap<String, ProbeStatement>,
}

impl ComponentCategory {
    pub fn from_dict(
        category_name: &str,
        dict: &Map<String, Value>,
        registry: &FunctionRegistry,
    ) -> Result<Self, ConfigError> {
        let mut statements = BTreeMap::new();

        for (component_name, statement_value) in dict {
            let statement_dict = statement_value.as_object().ok_or_else(|| {
                ConfigError::shape(
                    format!("category '{}'", category_name),
                    format!("component '{}' must be an object", component_name),
                )
            })?;
            let statement =
                ProbeStatement::from_dict(component_name, statement_dict, registry)?;
            statements.insert(component_name.clone(), statement);
        }

        Ok(Self {
            category_name: category_name.to_string(),
            statements,
        })
    }

    pub fn category_name(&self) -> &str {
        &self.category_name
    }

    pub fn component_names(&self) -> Vec<&str> {
        self.statements.keys().map(String::as_str).collect()
    }

    /// Evaluate every statement; each discovered instance set is tagged
    /// with its component name and passthrough information. Components
    /// that found nothing are absent from the report, never an error.
    pub fn eval(&self, ctx: &Context) -> Vec<Value> {
        let mut records = Vec::new();

        for statement in self.statements.values() {
            let values = statement.eval(ctx);
            if values.is_empty() {
                log::debug!(
                    "category '{}': component '{}' probed nothing",
                    self.category_name,
                    statement.component_name()
                );
                continue;
            }

            let mut record = Map::new();
            record.insert(
                "name".to_string(),
                Value::String(statement.component_name().to_string()),
            );
            record.insert(
                "values".to_string(),
                Value::Array(values.into_iter().map(Value::Object).collect()),
            );
            if let Some(information) = statement.information() {
                record.insert("information".to_string(), information.clone());
            }
            records.push(Value::Object(record));
        }

        records
    }
}

/// The whole document: all categories. Built once, evaluated many times.
#[derive(Debug)]
pub struct ProbeConfig {
    categories: BTreeMap<String, ComponentCategory>,
}

impl ProbeConfig {
    pub fn from_value(value: &Value, registry: &FunctionRegistry) -> Result<Self, ConfigError> {
        let dict = value
            .as_object()
            .ok_or_else(|| ConfigError::shape("document root", "must be a JSON object"))?;

        let mut categories = BTreeMap::new();
        for (category_name, category_value) in dict {
            let category_dict = category_value.as_object().ok_or_else(|| {
                ConfigError::shape(
                    "document root",
                    format!("category '{}' must be an object", category_name),
                )
            })?;
            let category =
                ComponentCategory::from_dict(category_name, category_dict, registry)?;
            categories.insert(category_name.clone(), category);
        }

        Ok(Self { categories })
    }

    /// Load and build from a JSON file. I/O, syntax and tree-construction
    /// failures stay distinguishable for the caller's exit-code mapping.
    pub fn from_file(path: &Path, registry: &FunctionRegistry) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let value: Value = serde_json::from_str(&content)?;
        Self::from_value(&value, registry)
    }

    pub fn category_names(&self) -> Vec<&str> {
        self.categories.keys().map(String::as_str).collect()
    }

    /// Evaluate a caller-selected subset of categories (default all) and
    /// assemble the report: `{category: [tagged records]}`.
    pub fn eval(&self, ctx: &Context, categories: Option<&[&str]>) -> Value {
        let selected: Vec<&ComponentCategory> = match categories {
            None => self.categories.values().collect(),
            Some(names) => names
                .iter()
                .filter_map(|name| {
                    let category = self.categories.get(*name);
                    if category.is_none() {
                        log::warn!("unknown category '{}' requested, skipping", name);
                    }
                    category
                })
                .collect(),
        };

        let mut report = Map::new();
        for category in selected {
            report.insert(
                category.category_name().to_string(),
                Value::Array(category.eval(ctx)),
            );
        }
        Value::Object(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::testing::registry_with_stub;
    use serde_json::json;
    use std::sync::Arc;

    fn stub_statement(results: Value, extra: Value) -> Value {
        let mut dict = Map::new();
        dict.insert(
            "eval".to_string(),
            json!({"stub": {"results": results}}),
        );
        if let Value::Object(extra) = extra {
            dict.extend(extra);
        }
        Value::Object(dict)
    }

    fn eval_config(config: Value) -> Value {
        let registry = Arc::new(registry_with_stub());
        let probe_config = ProbeConfig::from_value(&config, &registry).unwrap();
        let ctx = Context::new(registry);
        probe_config.eval(&ctx, None)
    }

    #[test]
    fn test_key_filter_is_pure_projection() {
        let config = json!({"soc": {"cpu": null}});
        let mut config = config;
        config["soc"]["cpu"] = stub_statement(
            json!([{"model": "X", "debug_id": "internal"}]),
            json!({"keys": ["model"]}),
        );

        let report = eval_config(config);
        assert_eq!(
            report["soc"][0]["values"],
            json!([{"model": "X"}])
        );
    }

    #[test]
    fn test_checker_drops_rejected_maps() {
        let mut config = json!({"storage": {"disk": null}});
        config["storage"]["disk"] = stub_statement(
            json!([{"sectors": "100"}, {"sectors": "9000"}]),
            json!({"expect": {"sectors": [true, "int", "!gt 1000"]}}),
        );

        let report = eval_config(config);
        assert_eq!(report["storage"][0]["values"], json!([{"sectors": 9000}]));
    }

    #[test]
    fn test_information_passthrough() {
        let mut config = json!({"soc": {"cpu": null}});
        config["soc"]["cpu"] = stub_statement(
            json!([{"model": "X"}]),
            json!({"information": {"part": "ABC-1"}}),
        );

        let report = eval_config(config);
        assert_eq!(report["soc"][0]["information"], json!({"part": "ABC-1"}));
        assert_eq!(report["soc"][0]["name"], json!("cpu"));
    }

    #[test]
    fn test_component_with_no_results_absent_from_report() {
        let mut config = json!({"soc": {"cpu": null, "gpu": null}});
        config["soc"]["cpu"] = stub_statement(json!([{"model": "X"}]), json!({}));
        config["soc"]["gpu"] = stub_statement(json!([]), json!({}));

        let report = eval_config(config);
        let records = report["soc"].as_array().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["name"], json!("cpu"));
    }

    #[test]
    fn test_category_selection() {
        let mut config = json!({"a": {"x": null}, "b": {"y": null}});
        config["a"]["x"] = stub_statement(json!([{"f": 1}]), json!({}));
        config["b"]["y"] = stub_statement(json!([{"f": 2}]), json!({}));

        let registry = Arc::new(registry_with_stub());
        let probe_config = ProbeConfig::from_value(&config, &registry).unwrap();
        let ctx = Context::new(registry);

        let report = probe_config.eval(&ctx, Some(&["b"]));
        let report = report.as_object().unwrap();
        assert!(report.contains_key("b"));
        assert!(!report.contains_key("a"));
    }

    #[test]
    fn test_category_construction_is_all_or_nothing() {
        let mut config = json!({"soc": {"cpu": null, "bad": null}});
        config["soc"]["cpu"] = stub_statement(json!([{"f": 1}]), json!({}));
        config["soc"]["bad"] = json!({"eval": {"no_such_function": {}}});

        let registry = registry_with_stub();
        assert!(ProbeConfig::from_value(&config, &registry).is_err());
    }

    #[test]
    fn test_statement_requires_eval() {
        let config = json!({"soc": {"cpu": {"keys": ["a"]}}});
        let registry = registry_with_stub();
        let err = ProbeConfig::from_value(&config, &registry).unwrap_err();
        assert!(matches!(err, ConfigError::Shape { .. }));
    }

    #[test]
    fn test_malformed_expect_aborts_load() {
        let mut config = json!({"soc": {"cpu": null}});
        config["soc"]["cpu"] = stub_statement(
            json!([{"f": 1}]),
            json!({"expect": {"f": [true, "int", "!gt abc"]}}),
        );

        let registry = registry_with_stub();
        assert!(ProbeConfig::from_value(&config, &registry).is_err());
    }
}

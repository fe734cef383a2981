//! End-to-end probe evaluation against a synthetic sysfs tree.

use hwprobe_core::prelude::*;
use serde_json::json;
use std::fs;
use std::path::Path;
use std::sync::Arc;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn battery_config_end_to_end() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "sys/class/power_supply/BAT0/type", "Battery\n");
    write(tmp.path(), "sys/class/power_supply/BAT0/manufacturer", "X\n");
    write(tmp.path(), "sys/class/power_supply/BAT0/model_name", "Y\n");
    write(tmp.path(), "sys/class/power_supply/BAT0/technology", "Z\n");

    let registry = Arc::new(FunctionRegistry::with_builtins());
    let config = ProbeConfig::from_value(
        &json!({"battery": {"generic": {"eval": {"generic_battery": {}}}}}),
        &registry,
    )
    .unwrap();

    let ctx = Context::new(registry).with_sysfs_root(tmp.path());
    let report = config.eval(&ctx, None);

    let records = report["battery"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["name"], json!("generic"));

    let values = records[0]["values"].as_array().unwrap();
    assert_eq!(values.len(), 1);
    assert_eq!(values[0]["manufacturer"], json!("X"));
    assert_eq!(values[0]["model_name"], json!("Y"));
    assert_eq!(values[0]["technology"], json!("Z"));
    assert_eq!(values[0]["type"], json!("Battery"));
    assert_eq!(values[0]["index"], json!("1"));
    assert!(values[0]["path"].as_str().unwrap().contains("BAT0"));
}

#[test]
fn statement_with_keys_and_expect_rules() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "sys/class/power_supply/BAT0/type", "Battery");
    write(tmp.path(), "sys/class/power_supply/BAT0/manufacturer", "X");
    write(tmp.path(), "sys/class/power_supply/BAT0/model_name", "Y");
    write(tmp.path(), "sys/class/power_supply/BAT0/technology", "Li-ion");

    let registry = Arc::new(FunctionRegistry::with_builtins());
    let config = ProbeConfig::from_value(
        &json!({"battery": {"generic": {
            "eval": {"generic_battery": {}},
            "keys": ["technology", "index"],
            "expect": {"technology": [true, "str", "!re ^Li-"]}
        }}}),
        &registry,
    )
    .unwrap();

    let ctx = Context::new(registry).with_sysfs_root(tmp.path());
    let report = config.eval(&ctx, None);

    let values = report["battery"][0]["values"].as_array().unwrap();
    assert_eq!(values[0], json!({"technology": "Li-ion", "index": "1"}));
}

#[test]
fn sequence_of_sysfs_reads_merges_into_one_component() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "sys/bus/soc/dev0/id", "17");
    write(tmp.path(), "sys/devices/board0/revision", "rev3");

    let registry = Arc::new(FunctionRegistry::with_builtins());
    let config = ProbeConfig::from_value(
        &json!({"soc": {"main": {"eval": {"sequence": {"functions": [
            {"sysfs": {"dir_path": "/sys/bus/soc/dev*", "keys": ["id"]}},
            {"sysfs": {"dir_path": "/sys/devices/board*", "keys": ["revision"]}}
        ]}}}}}),
        &registry,
    )
    .unwrap();

    let ctx = Context::new(registry).with_sysfs_root(tmp.path());
    let report = config.eval(&ctx, None);

    let values = report["soc"][0]["values"].as_array().unwrap();
    assert_eq!(values, &[json!({"id": "17", "revision": "rev3"})]);
}

#[test]
fn malformed_document_fails_before_any_probing() {
    let registry = FunctionRegistry::with_builtins();
    let result = ProbeConfig::from_value(
        &json!({"battery": {"generic": {"eval": {"generic_battery": {}, "sysfs": {}}}}}),
        &registry,
    );
    assert!(result.is_err());
}

#[test]
fn absent_hardware_yields_empty_report_not_error() {
    let tmp = tempfile::tempdir().unwrap();

    let registry = Arc::new(FunctionRegistry::with_builtins());
    let config = ProbeConfig::from_value(
        &json!({"battery": {"generic": {"eval": {"generic_battery": {}}}}}),
        &registry,
    )
    .unwrap();

    let ctx = Context::new(registry).with_sysfs_root(tmp.path());
    let report = config.eval(&ctx, None);
    assert_eq!(report["battery"], json!([]));
}

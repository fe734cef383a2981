//! Network probe function.
//!
//! Devices are enumerated through the context's network device source (a
//! bus-management service seam, not a sysfs walk), resolved to their sysfs
//! node, classified by the `subsystem` symlink target and probed for
//! bus-specific identifiers under `pci_`/`usb_`/`sdio_` key prefixes.

use crate::args::ArgParser;
use crate::functions::storage::subsystem_name;
use crate::functions::sysfs::read_trimmed;
use crate::functions::{emit_results, ProbeFunction};
use crate::registry::{FunctionRegistry, ParseError};
use crate::result::{ProbeResult, ResultMap};
use crate::runtime::Context;
use serde_json::{Map, Value};
use std::path::Path;

pub const NAME: &str = "network";

const DEVICE_TYPES: &[&str] = &["wifi", "ethernet", "cellular"];

pub struct NetworkFunction {
    /// Empty means no filter: report every enumerated device.
    device_type: String,
}

pub fn factory(
    _registry: &FunctionRegistry,
    args: &Map<String, Value>,
) -> Result<Box<dyn ProbeFunction>, ParseError> {
    let mut parser = ArgParser::new(args);
    let device_type = parser.string("device_type", Some(""));

    let mut errors = match parser.finish() {
        Ok(()) => Vec::new(),
        Err(errors) => errors,
    };

    if !device_type.is_empty() && !DEVICE_TYPES.contains(&device_type.as_str()) {
        errors.push(crate::args::ArgError::BadElement {
            key: "device_type".to_string(),
            index: 0,
            cause: format!("must be one of {:?}", DEVICE_TYPES),
        });
    }

    if !errors.is_empty() {
        return Err(ParseError::invalid_arguments(NAME, errors));
    }

    Ok(Box::new(NetworkFunction { device_type }))
}

impl ProbeFunction for NetworkFunction {
    fn name(&self) -> &'static str {
        NAME
    }

    fn eval_in_helper(&self, ctx: &Context, output: &mut String) -> i32 {
        let devices = match ctx.network().devices() {
            Ok(devices) => devices,
            Err(e) => {
                log::warn!("network: device enumeration failed: {}", e);
                return 1;
            }
        };

        let mut results: ProbeResult = Vec::new();

        for device in devices {
            if !self.device_type.is_empty() && device.device_type != self.device_type {
                continue;
            }

            let node = ctx.sysfs_path(&format!("/sys/class/net/{}/device", device.interface));
            if !node.exists() {
                log::debug!(
                    "network: '{}' has no sysfs device node, skipping",
                    device.interface
                );
                continue;
            }

            let Some(bus) = subsystem_name(&node) else {
                continue;
            };

            let Some(mut map) = extract_bus_fields(&node, &bus) else {
                log::debug!(
                    "network: '{}' on bus '{}' missing required attributes, skipping",
                    device.interface,
                    bus
                );
                continue;
            };

            map.insert("type".to_string(), Value::String(device.device_type));
            map.insert("bus_type".to_string(), Value::String(bus));
            map.insert(
                "path".to_string(),
                Value::String(node.to_string_lossy().into_owned()),
            );
            results.push(map);
        }

        emit_results(&results, output)
    }
}

/// (sysfs attribute, prefixed result key) pairs per bus.
fn extract_bus_fields(node: &Path, bus: &str) -> Option<ResultMap> {
    let mut map = ResultMap::new();

    match bus {
        "pci" => {
            insert_required(&mut map, node, "vendor", "pci_vendor_id")?;
            insert_required(&mut map, node, "device", "pci_device_id")?;
            insert_optional(&mut map, node, "subsystem_device", "pci_subsystem_id");
        }
        "usb" => {
            // USB interface nodes hang off the device directory.
            let parent = node.join("..");
            insert_required(&mut map, &parent, "idVendor", "usb_vendor_id")?;
            insert_required(&mut map, &parent, "idProduct", "usb_product_id")?;
            insert_optional(&mut map, &parent, "manufacturer", "usb_manufacturer");
            insert_optional(&mut map, &parent, "product", "usb_product");
        }
        "sdio" => {
            insert_required(&mut map, node, "vendor", "sdio_vendor_id")?;
            insert_required(&mut map, node, "device", "sdio_device_id")?;
        }
        other => {
            log::debug!("network: unrecognized bus '{}'", other);
            return None;
        }
    }

    Some(map)
}

fn insert_required(map: &mut ResultMap, dir: &Path, attr: &str, key: &str) -> Option<()> {
    let content = read_trimmed(&dir.join(attr))?;
    map.insert(key.to_string(), Value::String(content));
    Some(())
}

fn insert_optional(map: &mut ResultMap, dir: &Path, attr: &str, key: &str) {
    if let Some(content) = read_trimmed(&dir.join(attr)) {
        map.insert(key.to_string(), Value::String(content));
    }
}

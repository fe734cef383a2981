//! Storage probe family: ATA, MMC, NVMe and the generic dispatcher.
//!
//! All variants share one enumeration step (fixed block devices under
//! `/sys/class/block`, skipping removable, loop and device-mapper nodes)
//! followed by a per-subtype bus predicate and field extraction. The
//! generic variant tries ATA, then MMC, then NVMe in that fixed order and
//! takes the first subtype that matches a node; a node matching two
//! predicates is resolved by order, never reported twice.

use crate::args::ArgParser;
use crate::functions::sysfs::read_trimmed;
use crate::functions::{emit_results, ProbeFunction};
use crate::registry::{FunctionRegistry, ParseError};
use crate::result::{ProbeResult, ResultMap};
use crate::runtime::Context;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

pub const ATA_NAME: &str = "ata_storage";
pub const MMC_NAME: &str = "mmc_storage";
pub const NVME_NAME: &str = "nvme_storage";
pub const GENERIC_NAME: &str = "generic_storage";

const BLOCK_CLASS: &str = "/sys/class/block";

/// Per-bus behavior behind the shared enumeration step.
trait StorageSubtype {
    fn storage_type(&self) -> &'static str;

    /// Does this node's `device` directory belong to my bus?
    fn matches(&self, device: &Path) -> bool;

    /// Bus-specific fields. `None` when a required attribute is absent,
    /// which drops the candidate.
    fn extract(&self, device: &Path) -> Option<ResultMap>;
}

struct AtaSubtype;
struct MmcSubtype;
struct NvmeSubtype;

impl StorageSubtype for AtaSubtype {
    fn storage_type(&self) -> &'static str {
        "ATA"
    }

    fn matches(&self, device: &Path) -> bool {
        // ATA devices report the literal vendor marker through libata.
        read_trimmed(&device.join("vendor")).as_deref() == Some("ATA")
    }

    fn extract(&self, device: &Path) -> Option<ResultMap> {
        let mut map = ResultMap::new();
        map.insert(
            "ata_vendor".to_string(),
            Value::String(read_trimmed(&device.join("vendor"))?),
        );
        map.insert(
            "ata_model".to_string(),
            Value::String(read_trimmed(&device.join("model"))?),
        );
        Some(map)
    }
}

impl StorageSubtype for MmcSubtype {
    fn storage_type(&self) -> &'static str {
        "MMC"
    }

    fn matches(&self, device: &Path) -> bool {
        matches!(
            read_trimmed(&device.join("type")).as_deref(),
            Some("MMC") | Some("SD")
        )
    }

    fn extract(&self, device: &Path) -> Option<ResultMap> {
        let mut map = ResultMap::new();
        map.insert(
            "mmc_name".to_string(),
            Value::String(read_trimmed(&device.join("name"))?),
        );
        map.insert(
            "mmc_manfid".to_string(),
            Value::String(read_trimmed(&device.join("manfid"))?),
        );
        map.insert(
            "mmc_oemid".to_string(),
            Value::String(read_trimmed(&device.join("oemid"))?),
        );
        for optional in ["prv", "serial"] {
            if let Some(content) = read_trimmed(&device.join(optional)) {
                map.insert(format!("mmc_{}", optional), Value::String(content));
            }
        }
        Some(map)
    }
}

impl StorageSubtype for NvmeSubtype {
    fn storage_type(&self) -> &'static str {
        "NVMe"
    }

    fn matches(&self, device: &Path) -> bool {
        subsystem_name(device).as_deref() == Some("nvme")
    }

    fn extract(&self, device: &Path) -> Option<ResultMap> {
        // The NVMe class device hangs off the PCI function.
        let pci = device.join("device");
        let mut map = ResultMap::new();
        map.insert(
            "pci_vendor".to_string(),
            Value::String(read_trimmed(&pci.join("vendor"))?),
        );
        map.insert(
            "pci_device".to_string(),
            Value::String(read_trimmed(&pci.join("device"))?),
        );
        if let Some(class) = read_trimmed(&pci.join("class")) {
            map.insert("pci_class".to_string(), Value::String(class));
        }
        Some(map)
    }
}

/// Basename of a node's `subsystem` symlink target.
pub(crate) fn subsystem_name(node: &Path) -> Option<String> {
    let target = fs::read_link(node.join("subsystem")).ok()?;
    target
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
}

/// Fixed (non-removable, non-loop, non-dm) block device nodes.
fn fixed_block_devices(ctx: &Context) -> Vec<PathBuf> {
    let base = ctx.sysfs_path(BLOCK_CLASS);
    let Ok(entries) = fs::read_dir(&base) else {
        return Vec::new();
    };

    let mut devices: Vec<PathBuf> = entries
        .flatten()
        .filter(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            !name.starts_with("loop") && !name.starts_with("dm-")
        })
        .map(|entry| entry.path())
        .filter(|path| read_trimmed(&path.join("removable")).as_deref() != Some("1"))
        .filter(|path| path.join("device").exists())
        .collect();

    devices.sort();
    devices
}

/// Shared walk: first matching subtype wins per node.
fn probe_subtypes(subtypes: &[&dyn StorageSubtype], ctx: &Context) -> ProbeResult {
    let mut results = Vec::new();

    for node in fixed_block_devices(ctx) {
        let device = node.join("device");

        for subtype in subtypes {
            if !subtype.matches(&device) {
                continue;
            }
            log::debug!(
                "storage: '{}' matched subtype {}",
                node.display(),
                subtype.storage_type()
            );

            if let Some(mut map) = subtype.extract(&device) {
                map.insert(
                    "path".to_string(),
                    Value::String(node.to_string_lossy().into_owned()),
                );
                if let Some(sectors) = read_trimmed(&node.join("size")) {
                    map.insert("sectors".to_string(), Value::String(sectors));
                }
                map.insert(
                    "type".to_string(),
                    Value::String(subtype.storage_type().to_string()),
                );
                results.push(map);
            }
            break;
        }
    }

    results
}

pub struct StorageFunction {
    name: &'static str,
    order: &'static [StorageKind],
}

#[derive(Clone, Copy)]
enum StorageKind {
    Ata,
    Mmc,
    Nvme,
}

impl StorageKind {
    fn subtype(self) -> &'static dyn StorageSubtype {
        match self {
            StorageKind::Ata => &AtaSubtype,
            StorageKind::Mmc => &MmcSubtype,
            StorageKind::Nvme => &NvmeSubtype,
        }
    }
}

fn no_args_factory(
    args: &Map<String, Value>,
    name: &'static str,
    order: &'static [StorageKind],
) -> Result<Box<dyn ProbeFunction>, ParseError> {
    ArgParser::new(args)
        .finish()
        .map_err(|errors| ParseError::invalid_arguments(name, errors))?;
    Ok(Box::new(StorageFunction { name, order }))
}

pub fn ata_factory(
    _registry: &FunctionRegistry,
    args: &Map<String, Value>,
) -> Result<Box<dyn ProbeFunction>, ParseError> {
    no_args_factory(args, ATA_NAME, &[StorageKind::Ata])
}

pub fn mmc_factory(
    _registry: &FunctionRegistry,
    args: &Map<String, Value>,
) -> Result<Box<dyn ProbeFunction>, ParseError> {
    no_args_factory(args, MMC_NAME, &[StorageKind::Mmc])
}

pub fn nvme_factory(
    _registry: &FunctionRegistry,
    args: &Map<String, Value>,
) -> Result<Box<dyn ProbeFunction>, ParseError> {
    no_args_factory(args, NVME_NAME, &[StorageKind::Nvme])
}

pub fn generic_factory(
    _registry: &FunctionRegistry,
    args: &Map<String, Value>,
) -> Result<Box<dyn ProbeFunction>, ParseError> {
    no_args_factory(
        args,
        GENERIC_NAME,
        &[StorageKind::Ata, StorageKind::Mmc, StorageKind::Nvme],
    )
}

impl ProbeFunction for StorageFunction {
    fn name(&self) -> &'static str {
        self.name
    }

    fn eval_in_helper(&self, ctx: &Context, output: &mut String) -> i32 {
        let subtypes: Vec<&dyn StorageSubtype> =
            self.order.iter().map(|kind| kind.subtype()).collect();
        let results = probe_subtypes(&subtypes, ctx);
        emit_results(&results, output)
    }
}

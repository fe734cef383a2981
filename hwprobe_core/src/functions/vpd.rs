//! Cached-VPD probe function.
//!
//! Reads one key from the cached VPD sysfs mirror. The allow-list is
//! hard-coded: arbitrary VPD keys are never exposed through probing, even
//! for a well-formed request.

use crate::args::ArgParser;
use crate::functions::sysfs::read_trimmed;
use crate::functions::{emit_results, ProbeFunction};
use crate::registry::{FunctionRegistry, ParseError};
use crate::result::ResultMap;
use crate::runtime::Context;
use serde_json::{Map, Value};

pub const NAME: &str = "vpd_cached";

const VPD_RO_DIR: &str = "/sys/firmware/vpd/ro";
const ALLOWED_KEYS: &[&str] = &["sku_number"];

pub struct VpdCachedFunction {
    vpd_name: String,
}

pub fn factory(
    _registry: &FunctionRegistry,
    args: &Map<String, Value>,
) -> Result<Box<dyn ProbeFunction>, ParseError> {
    let mut parser = ArgParser::new(args);
    let vpd_name = parser.string("vpd_name", None);
    parser
        .finish()
        .map_err(|errors| ParseError::invalid_arguments(NAME, errors))?;
    Ok(Box::new(VpdCachedFunction { vpd_name }))
}

impl ProbeFunction for VpdCachedFunction {
    fn name(&self) -> &'static str {
        NAME
    }

    fn eval_in_helper(&self, ctx: &Context, output: &mut String) -> i32 {
        if !ALLOWED_KEYS.contains(&self.vpd_name.as_str()) {
            log::warn!("vpd_cached: key '{}' is not allow-listed", self.vpd_name);
            return 1;
        }

        let path = ctx.sysfs_path(&format!("{}/{}", VPD_RO_DIR, self.vpd_name));
        let Some(content) = read_trimmed(&path) else {
            // Absence of the cached key is ordinary absence, not failure.
            return emit_results(&[], output);
        };

        let mut map = ResultMap::new();
        map.insert(self.vpd_name.clone(), Value::String(content));
        emit_results(&[map], output)
    }
}

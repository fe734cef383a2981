//! `ectool i2cread` probe function.
//!
//! Issues one EC I2C read through the vendor tool and parses the textual
//! reply with a fixed regular expression into a single field.

use crate::args::{ArgError, ArgParser};
use crate::functions::{emit_results, ProbeFunction};
use crate::registry::{FunctionRegistry, ParseError};
use crate::result::ResultMap;
use crate::runtime::Context;
use regex::Regex;
use serde_json::{Map, Value};

pub const NAME: &str = "ectool_i2cread";

const OUTPUT_PATTERN: &str = r"Read from I2C port \d+ at .+ offset .+ = (0x[0-9a-f]+)";

pub struct EctoolI2cReadFunction {
    size: i64,
    port: i64,
    addr: i64,
    offset: i64,
    key: String,
}

pub fn factory(
    _registry: &FunctionRegistry,
    args: &Map<String, Value>,
) -> Result<Box<dyn ProbeFunction>, ParseError> {
    let mut parser = ArgParser::new(args);
    let size = parser.integer("size", None);
    let port = parser.integer("port", None);
    let addr = parser.integer("addr", None);
    let offset = parser.integer("offset", None);
    let key = parser.string("key", None);

    let mut errors = match parser.finish() {
        Ok(()) => Vec::new(),
        Err(errors) => errors,
    };

    if size != 8 && size != 16 {
        errors.push(ArgError::BadElement {
            key: "size".to_string(),
            index: 0,
            cause: "size must be 8 or 16".to_string(),
        });
    }

    if !errors.is_empty() {
        return Err(ParseError::invalid_arguments(NAME, errors));
    }

    Ok(Box::new(EctoolI2cReadFunction {
        size,
        port,
        addr,
        offset,
        key,
    }))
}

impl ProbeFunction for EctoolI2cReadFunction {
    fn name(&self) -> &'static str {
        NAME
    }

    fn eval_in_helper(&self, ctx: &Context, output: &mut String) -> i32 {
        let size = self.size.to_string();
        let port = self.port.to_string();
        let addr = format!("{:#x}", self.addr);
        let offset = format!("{:#x}", self.offset);
        let args: [&str; 5] = ["i2cread", &size, &port, &addr, &offset];

        let result = match ctx.executor().execute("ectool", &args, None) {
            Ok(result) if result.success() => result,
            Ok(result) => {
                log::debug!("ectool_i2cread: exited with status {}", result.status_code);
                return 1;
            }
            Err(e) => {
                log::debug!("ectool_i2cread: {}", e);
                return 1;
            }
        };

        let re = match Regex::new(OUTPUT_PATTERN) {
            Ok(re) => re,
            Err(_) => return 1,
        };
        let Some(captures) = re.captures(&result.stdout) else {
            log::debug!("ectool_i2cread: unrecognized tool output");
            return 1;
        };

        let mut map = ResultMap::new();
        map.insert(
            self.key.clone(),
            Value::String(captures[1].to_string()),
        );
        emit_results(&[map], output)
    }
}

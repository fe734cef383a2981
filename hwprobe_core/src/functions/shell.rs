//! Shell probe function: run one whitelisted command line, report its
//! trimmed stdout as a single field.

use crate::args::{ArgError, ArgParser};
use crate::functions::{emit_results, ProbeFunction};
use crate::registry::{FunctionRegistry, ParseError};
use crate::result::ResultMap;
use crate::runtime::Context;
use serde_json::{Map, Value};

pub const NAME: &str = "shell";

pub struct ShellFunction {
    command: String,
    key: String,
}

pub fn factory(
    _registry: &FunctionRegistry,
    args: &Map<String, Value>,
) -> Result<Box<dyn ProbeFunction>, ParseError> {
    let mut parser = ArgParser::new(args);
    let command = parser.string("command", None);
    let key = parser.string("key", Some("shell_raw"));

    let mut errors = match parser.finish() {
        Ok(()) => Vec::new(),
        Err(errors) => errors,
    };

    if command.split_whitespace().next().is_none() && errors.is_empty() {
        errors.push(ArgError::BadElement {
            key: "command".to_string(),
            index: 0,
            cause: "command must not be empty".to_string(),
        });
    }

    if !errors.is_empty() {
        return Err(ParseError::invalid_arguments(NAME, errors));
    }

    Ok(Box::new(ShellFunction { command, key }))
}

impl ProbeFunction for ShellFunction {
    fn name(&self) -> &'static str {
        NAME
    }

    fn eval_in_helper(&self, ctx: &Context, output: &mut String) -> i32 {
        let mut parts = self.command.split_whitespace();
        // Factory guarantees at least one token.
        let Some(program) = parts.next() else {
            return 1;
        };
        let args: Vec<&str> = parts.collect();

        let result = match ctx.executor().execute(program, &args, None) {
            Ok(result) => result,
            Err(e) => {
                log::debug!("shell: '{}' failed: {}", self.command, e);
                return 1;
            }
        };

        if !result.success() {
            log::debug!(
                "shell: '{}' exited with status {}",
                self.command,
                result.status_code
            );
            return 1;
        }

        let mut map = ResultMap::new();
        map.insert(
            self.key.clone(),
            Value::String(result.stdout.trim().to_string()),
        );
        emit_results(&[map], output)
    }
}

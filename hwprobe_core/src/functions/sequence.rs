//! Sequence combinator.
//!
//! Evaluates each child in declared order and merges their outputs into one
//! map, last-write-wins on key collision. Every child must produce exactly
//! one map; zero or more than one makes the merge undefined, so the whole
//! sequence yields nothing.

use crate::args::ArgParser;
use crate::functions::{emit_results, Probe, ProbeFunction};
use crate::registry::{FunctionRegistry, ParseError};
use crate::result::{ProbeResult, ResultMap};
use crate::runtime::Context;
use serde_json::{Map, Value};

pub const NAME: &str = "sequence";

pub struct SequenceFunction {
    children: Vec<Probe>,
}

pub fn factory(
    registry: &FunctionRegistry,
    args: &Map<String, Value>,
) -> Result<Box<dyn ProbeFunction>, ParseError> {
    let mut parser = ArgParser::new(args);
    let children = parser.probe_list("functions", registry);
    parser
        .finish()
        .map_err(|errors| ParseError::invalid_arguments(NAME, errors))?;
    Ok(Box::new(SequenceFunction { children }))
}

impl SequenceFunction {
    fn merge(&self, ctx: &Context) -> ProbeResult {
        let mut merged = ResultMap::new();

        for child in &self.children {
            let mut results = child.eval(ctx);
            if results.len() != 1 {
                log::warn!(
                    "sequence: child '{}' produced {} maps, expected exactly 1",
                    child.name(),
                    results.len()
                );
                return Vec::new();
            }
            for (key, value) in results.remove(0) {
                merged.insert(key, value);
            }
        }

        vec![merged]
    }
}

impl ProbeFunction for SequenceFunction {
    fn name(&self) -> &'static str {
        NAME
    }

    // Pure in-process composition; no privilege crossing of its own.
    fn eval_in_process(&self, ctx: &Context) -> Option<ProbeResult> {
        Some(self.merge(ctx))
    }

    fn eval_in_helper(&self, ctx: &Context, output: &mut String) -> i32 {
        let results = self.merge(ctx);
        emit_results(&results, output)
    }
}

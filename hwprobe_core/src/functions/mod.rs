//! # Probe functions
//!
//! Each variant is a named, typed unit of hardware-state evaluation. A
//! variant parses its own arguments exactly once at construction and is
//! immutable afterwards; composite variants own their children exclusively,
//! so the tree is acyclic by construction.

pub mod battery;
pub mod ectool;
pub mod network;
pub mod sequence;
pub mod shell;
pub mod storage;
pub mod sysfs;
pub mod vpd;

use crate::result::{from_helper_payload, to_helper_payload, ProbeResult, ResultMap};
use crate::runtime::Context;
use serde_json::{Map, Value};

/// One concrete probe function.
///
/// `eval_in_helper` is the restricted-context entry point: it performs the
/// actual hardware/OS interaction and serializes a JSON array of flat maps
/// into `output`, returning 0 on success and nonzero on failure (the value
/// is opaque beyond "not zero"). `eval_in_process` is overridden by the
/// variants whose full evaluation is pure in-process composition.
///
/// Implementations are immutable after construction; `Send + Sync` lets the
/// helper invoker evaluate them on a worker thread.
pub trait ProbeFunction: Send + Sync {
    fn name(&self) -> &'static str;

    fn eval_in_helper(&self, ctx: &Context, output: &mut String) -> i32;

    /// `None` means "evaluate through the helper seam".
    fn eval_in_process(&self, _ctx: &Context) -> Option<ProbeResult> {
        None
    }
}

/// A parsed probe-function node: the registered name, the raw captured
/// argument dictionary (kept for round-tripping and for the helper request)
/// and the variant implementation.
pub struct Probe {
    name: String,
    raw_args: Map<String, Value>,
    imp: Box<dyn ProbeFunction>,
}

impl std::fmt::Debug for Probe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Probe")
            .field("name", &self.name)
            .field("raw_args", &self.raw_args)
            .finish_non_exhaustive()
    }
}

impl Probe {
    pub(crate) fn new(name: String, raw_args: Map<String, Value>, imp: Box<dyn ProbeFunction>) -> Self {
        Self {
            name,
            raw_args,
            imp,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Re-serialize the raw captured configuration. Round-trips the
    /// original expression this node was parsed from.
    pub fn to_expr(&self) -> Value {
        let mut expr = Map::new();
        expr.insert(self.name.clone(), Value::Object(self.raw_args.clone()));
        Value::Object(expr)
    }

    /// Full-privilege evaluation. In-process variants compose directly;
    /// everything else crosses the helper seam and parses the payload back.
    /// Every failure downgrades to an empty result.
    pub fn eval(&self, ctx: &Context) -> ProbeResult {
        if let Some(results) = self.imp.eval_in_process(ctx) {
            return results;
        }

        match ctx.helper().run_probe(&self.to_expr(), ctx) {
            Ok(payload) => match from_helper_payload(&payload) {
                Some(results) => results,
                None => {
                    log::warn!("probe function '{}' returned a malformed payload", self.name);
                    Vec::new()
                }
            },
            Err(e) => {
                log::warn!("probe function '{}' helper call failed: {}", self.name, e);
                Vec::new()
            }
        }
    }

    /// Restricted-context evaluation, forwarded to the variant.
    pub fn eval_in_helper(&self, ctx: &Context, output: &mut String) -> i32 {
        self.imp.eval_in_helper(ctx, output)
    }
}

/// Serialize `results` into `output` and report success. Shared tail of
/// most `eval_in_helper` implementations.
pub(crate) fn emit_results(results: &[ResultMap], output: &mut String) -> i32 {
    output.push_str(&to_helper_payload(results));
    0
}

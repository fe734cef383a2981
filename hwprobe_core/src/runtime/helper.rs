//! Privilege-crossing seam for probe evaluation.
//!
//! `Eval` delegates the actual hardware interaction to a restricted helper
//! through this trait: a synchronous request/response call carrying the
//! probe expression out and a JSON payload back, bounded by a timeout.
//! Timeout or refusal is ordinary failure (empty result), never a
//! distinguished error kind at the call site.

use crate::registry::FunctionRegistry;
use crate::runtime::Context;
use serde_json::Value;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

/// Bound on one helper round trip.
pub const HELPER_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum HelperError {
    #[error("helper rejected probe expression: {0}")]
    Rejected(String),

    #[error("helper returned nonzero status {0}")]
    Failed(i32),

    #[error("helper call timed out after {0:?}")]
    Timeout(Duration),
}

/// Request/response transport to the restricted execution context.
pub trait HelperInvoker: Send + Sync {
    /// Run one probe expression under the helper and return its serialized
    /// JSON payload.
    fn run_probe(&self, expr: &Value, ctx: &Context) -> Result<String, HelperError>;
}

/// Default invoker: re-parses the expression through a registry and runs
/// `eval_in_helper` on a worker thread, waiting at most the configured
/// timeout. A worker that outlives the bound is abandoned; its eventual
/// result is discarded. Keeps the two-phase contract intact while the
/// transport stays swappable.
pub struct InProcessInvoker {
    registry: Arc<FunctionRegistry>,
    timeout: Duration,
}

impl InProcessInvoker {
    pub fn new(registry: Arc<FunctionRegistry>) -> Self {
        Self {
            registry,
            timeout: HELPER_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl HelperInvoker for InProcessInvoker {
    fn run_probe(&self, expr: &Value, ctx: &Context) -> Result<String, HelperError> {
        let probe = self
            .registry
            .parse(expr)
            .map_err(|e| HelperError::Rejected(e.to_string()))?;

        let ctx = ctx.clone();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut output = String::new();
            let status = probe.eval_in_helper(&ctx, &mut output);
            let _ = tx.send((status, output));
        });

        match rx.recv_timeout(self.timeout) {
            Ok((0, output)) => Ok(output),
            Ok((status, _)) => Err(HelperError::Failed(status)),
            Err(_) => Err(HelperError::Timeout(self.timeout)),
        }
    }
}

//! # Evaluation runtime
//!
//! The [`Context`] carries everything probe functions touch at evaluation
//! time: the sysfs root (remappable so tests run against a temp tree), the
//! whitelisted command executor, the network device source and the helper
//! invoker. Evaluation is single-threaded, synchronous and side-effect-free
//! on the probe tree itself.

pub mod command;
pub mod helper;
pub mod network;

pub use command::{CommandError, CommandExecutor, CommandOutput, DEFAULT_COMMAND_TIMEOUT};
pub use helper::{HelperError, HelperInvoker, InProcessInvoker, HELPER_TIMEOUT};
pub use network::{
    NetworkDevice, NetworkDeviceSource, NetworkSourceError, NmcliDeviceSource, StaticDeviceSource,
};

use crate::registry::FunctionRegistry;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Live external state handed to every `eval`/`eval_in_helper` call.
///
/// Cloning is cheap; the source and invoker are shared. The helper invoker
/// moves a clone onto its worker thread per probe call.
#[derive(Clone)]
pub struct Context {
    sysfs_root: PathBuf,
    executor: CommandExecutor,
    network: Arc<dyn NetworkDeviceSource>,
    helper: Arc<dyn HelperInvoker>,
}

impl Context {
    /// Production context: real filesystem root, default whitelist, nmcli
    /// device enumeration, in-process helper over `registry`.
    pub fn new(registry: Arc<FunctionRegistry>) -> Self {
        let executor = CommandExecutor::with_defaults();
        Self {
            sysfs_root: PathBuf::from("/"),
            network: Arc::new(NmcliDeviceSource::new(executor.clone())),
            helper: Arc::new(InProcessInvoker::new(registry)),
            executor,
        }
    }

    /// Remap absolute sysfs paths under `root` (test trees).
    pub fn with_sysfs_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.sysfs_root = root.into();
        self
    }

    pub fn with_executor(mut self, executor: CommandExecutor) -> Self {
        self.executor = executor;
        self
    }

    pub fn with_network_source(mut self, source: Box<dyn NetworkDeviceSource>) -> Self {
        self.network = Arc::from(source);
        self
    }

    pub fn with_helper(mut self, helper: Box<dyn HelperInvoker>) -> Self {
        self.helper = Arc::from(helper);
        self
    }

    /// Resolve an absolute sysfs-style path against the configured root.
    pub fn sysfs_path(&self, absolute: &str) -> PathBuf {
        let relative = Path::new(absolute)
            .strip_prefix("/")
            .unwrap_or_else(|_| Path::new(absolute));
        self.sysfs_root.join(relative)
    }

    pub fn executor(&self) -> &CommandExecutor {
        &self.executor
    }

    pub fn network(&self) -> &dyn NetworkDeviceSource {
        self.network.as_ref()
    }

    pub fn helper(&self) -> &dyn HelperInvoker {
        self.helper.as_ref()
    }
}

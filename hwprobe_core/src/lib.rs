//! # hwprobe - declarative hardware probe evaluation
//!
//! Evaluates trees of typed "probe functions" against live hardware state
//! (sysfs attributes, bus-management services, vendor tools) and validates
//! the results against a declared schema.

pub mod args;
pub mod checker;
pub mod config;
pub mod functions;
pub mod registry;
pub mod result;
pub mod runtime;

// Convenience re-exports
pub use config::{ComponentCategory, ProbeConfig, ProbeStatement};
pub use registry::FunctionRegistry;
pub use runtime::Context;

pub mod prelude {
    pub use crate::checker::{CompareOp, ConvertStatus, FieldConverter, ProbeResultChecker};
    pub use crate::config::{ComponentCategory, ConfigError, ProbeConfig, ProbeStatement};
    pub use crate::functions::{Probe, ProbeFunction};
    pub use crate::registry::{FunctionRegistry, ParseError};
    pub use crate::result::{ProbeResult, ResultMap};
    pub use crate::runtime::{
        CommandExecutor, Context, HelperInvoker, InProcessInvoker, NetworkDevice,
        NetworkDeviceSource,
    };
}

//! Per-process execution: virtual users replaying work items.
mod config;
mod result;
mod runner;
mod timer;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::ExecutionConfig;
pub use result::{ProcessResult, availability};
pub use runner::ExecutionEngine;
pub use timer::{SystemTimer, Timer};

#[cfg(test)]
pub(crate) use timer::FixedTimer;

//! safebox: run untrusted scripts inside resource-limited Docker containers.
//!
//! The library detects a script's language, builds a sandbox configuration
//! with memory, CPU, process and time limits, and drives a container engine
//! through one run, streaming output as it arrives.

pub mod cli;
pub mod config;
pub mod detection;
pub mod error;
pub mod execution;
pub mod output;
pub mod script;
pub mod validation;

pub use error::{ConfigError, DetectionError, EngineError, ExecutionError};
pub use execution::{ExecutionResult, Executor, RunOptions};
pub use script::ScriptReference;

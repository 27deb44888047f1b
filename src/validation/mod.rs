//! Validation of user input before it reaches the execution pipeline.
//!
//! Resource limits, language names and environment variables are checked
//! and normalized here; nothing downstream re-validates them.

pub mod env;
pub mod inputs;

pub use env::{load_env_file, parse_env_pair};
pub use inputs::{
    validate_cpus, validate_language, validate_memory, validate_pids_limit, validate_timeout,
};

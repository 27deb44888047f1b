//! Resource limits for sandboxed script execution.
//!
//! Limits are validated once, when they are constructed, and are carried
//! around as already-normalized values afterwards.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_CPUS, DEFAULT_MEMORY, DEFAULT_PIDS_LIMIT, DEFAULT_TIMEOUT_SECS};
use crate::validation::{validate_cpus, validate_memory, validate_pids_limit, validate_timeout};

/// Nano-units per CPU core, as expected by the container engine.
pub const NANO_CPUS_PER_CORE: f64 = 1_000_000_000.0;

/// Smallest memory limit accepted by Docker.
pub const MIN_MEMORY_BYTES: i64 = 4 * 1024 * 1024;

/// A validated memory limit.
///
/// Keeps both the normalized text form (`512m`) shown to users and the byte
/// count handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryLimit {
    text: String,
    bytes: i64,
}

impl MemoryLimit {
    /// Builds a limit from parts that have already been validated.
    pub(crate) fn from_parts(text: String, bytes: i64) -> Self {
        Self { text, bytes }
    }

    /// Normalized form, lower-case unit without a trailing `b`.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Limit in bytes.
    pub fn bytes(&self) -> i64 {
        self.bytes
    }
}

impl fmt::Display for MemoryLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Resource limits applied to one sandbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionLimits {
    /// Memory limit.
    pub memory: MemoryLimit,
    /// CPU cores available (e.g. 0.5, 1.0, 2.0).
    pub cpus: f64,
    /// Wall-clock timeout in seconds.
    pub timeout_seconds: u64,
    /// Maximum number of processes inside the container.
    pub pids_limit: i64,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            memory: validate_memory(DEFAULT_MEMORY).expect("default memory limit is valid"),
            cpus: DEFAULT_CPUS,
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            pids_limit: DEFAULT_PIDS_LIMIT,
        }
    }
}

impl ExecutionLimits {
    /// Validates raw values and builds limits from them.
    pub fn new(
        memory: &str,
        cpus: f64,
        timeout_seconds: u64,
        pids_limit: i64,
    ) -> Result<Self, crate::error::ConfigError> {
        Ok(Self {
            memory: validate_memory(memory)?,
            cpus: validate_cpus(cpus)?,
            timeout_seconds: validate_timeout(timeout_seconds)?,
            pids_limit: validate_pids_limit(pids_limit)?,
        })
    }

    /// Returns the memory limit in bytes.
    pub fn memory_bytes(&self) -> i64 {
        self.memory.bytes()
    }

    /// Returns the CPU limit in engine nano-units.
    ///
    /// e.g. 1.5 cores = 1_500_000_000
    pub fn nano_cpus(&self) -> i64 {
        nano_cpus(self.cpus)
    }

    /// Returns the timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Converts a CPU share to engine nano-units.
pub fn nano_cpus(cpus: f64) -> i64 {
    (cpus * NANO_CPUS_PER_CORE).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = ExecutionLimits::default();
        assert_eq!(limits.memory.as_str(), "256m");
        assert_eq!(limits.memory_bytes(), 256 * 1024 * 1024);
        assert_eq!(limits.cpus, 1.0);
        assert_eq!(limits.timeout_seconds, 60);
        assert_eq!(limits.pids_limit, 64);
    }

    #[test]
    fn test_default_memory_follows_runtime_table() {
        let limits = ExecutionLimits::default();
        assert_eq!(limits.memory.as_str(), DEFAULT_MEMORY);
        assert_eq!(limits.memory, validate_memory(DEFAULT_MEMORY).expect("valid"));
    }

    #[test]
    fn test_new_validates_every_field() {
        assert!(ExecutionLimits::new("512m", 2.0, 30, 10).is_ok());
        assert!(ExecutionLimits::new("1k", 2.0, 30, 10).is_err());
        assert!(ExecutionLimits::new("512m", 32.0, 30, 10).is_err());
        assert!(ExecutionLimits::new("512m", 2.0, 0, 10).is_err());
        assert!(ExecutionLimits::new("512m", 2.0, 30, 0).is_err());
    }

    #[test]
    fn test_nano_cpus_conversion() {
        assert_eq!(nano_cpus(1.0), 1_000_000_000);
        assert_eq!(nano_cpus(0.5), 500_000_000);
        assert_eq!(nano_cpus(0.1), 100_000_000);
        assert_eq!(nano_cpus(16.0), 16_000_000_000);
    }

    #[test]
    fn test_nano_cpus_rounds_float_error() {
        for tenths in 1..=160 {
            let cpus = tenths as f64 / 10.0;
            assert_eq!(nano_cpus(cpus), tenths * 100_000_000, "cpus = {cpus}");
        }
    }

    #[test]
    fn test_timeout_duration() {
        let limits = ExecutionLimits::new("64m", 1.0, 90, 32).expect("valid");
        assert_eq!(limits.timeout(), Duration::from_secs(90));
    }
}

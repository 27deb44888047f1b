//! Validators for user-supplied resource limits and language names.
//!
//! Each validator returns the normalized value on success so callers never
//! need to re-check it.

use std::sync::OnceLock;

use regex::Regex;

use crate::config::{canonical_language, runtime, supported_languages};
use crate::error::ConfigError;
use crate::execution::resources::{MemoryLimit, MIN_MEMORY_BYTES};

pub const MIN_CPUS: f64 = 0.1;
pub const MAX_CPUS: f64 = 16.0;
pub const MIN_TIMEOUT_SECS: u64 = 1;
pub const MAX_TIMEOUT_SECS: u64 = 3600;

fn memory_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d+(?:\.\d+)?)\s*([kmgKMG])[bB]?$").expect("memory regex is valid")
    })
}

fn unit_bytes(unit: &str) -> f64 {
    match unit {
        "k" => 1024.0,
        "m" => 1024.0 * 1024.0,
        _ => 1024.0 * 1024.0 * 1024.0,
    }
}

/// Validates and normalizes a memory string such as `512m`, `1G` or `256MB`.
///
/// The normalized form has a lower-case unit and no trailing `b`.
pub fn validate_memory(value: &str) -> Result<MemoryLimit, ConfigError> {
    let caps = memory_regex()
        .captures(value.trim())
        .ok_or_else(|| ConfigError::InvalidMemory(value.to_string()))?;

    let amount_text = &caps[1];
    let unit = caps[2].to_lowercase();
    let amount: f64 = amount_text
        .parse()
        .map_err(|_| ConfigError::InvalidMemory(value.to_string()))?;

    let bytes = (amount * unit_bytes(&unit)) as i64;
    if bytes < MIN_MEMORY_BYTES {
        return Err(ConfigError::MemoryTooSmall(value.to_string()));
    }

    Ok(MemoryLimit::from_parts(format!("{amount_text}{unit}"), bytes))
}

/// Validates a CPU share (0.1 to 16.0 cores).
pub fn validate_cpus(value: f64) -> Result<f64, ConfigError> {
    if !(MIN_CPUS..=MAX_CPUS).contains(&value) {
        return Err(ConfigError::InvalidCpus(value));
    }
    Ok(value)
}

/// Validates a timeout in seconds (1 to 3600).
pub fn validate_timeout(value: u64) -> Result<u64, ConfigError> {
    if !(MIN_TIMEOUT_SECS..=MAX_TIMEOUT_SECS).contains(&value) {
        return Err(ConfigError::InvalidTimeout(value));
    }
    Ok(value)
}

/// Validates a process-count ceiling.
pub fn validate_pids_limit(value: i64) -> Result<i64, ConfigError> {
    if value < 1 {
        return Err(ConfigError::InvalidPidsLimit(value));
    }
    Ok(value)
}

/// Resolves aliases and checks that `value` names a supported language.
pub fn validate_language(value: &str) -> Result<String, ConfigError> {
    let lang = canonical_language(value);
    if runtime(&lang).is_none() {
        return Err(ConfigError::UnsupportedLanguage {
            value: value.to_string(),
            supported: supported_languages().join(", "),
        });
    }
    Ok(lang)
}

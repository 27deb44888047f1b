//! Error types for safebox operations.
//!
//! Defines error types for each stage of a sandboxed run:
//! - Runtime detection
//! - Input and configuration validation
//! - Container engine interaction
//! - The execution pipeline as a whole
//!
//! A run that exceeds its timeout is not an error. It is reported through
//! [`crate::execution::ExecutionResult`] with `timed_out` set.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while resolving the runtime of a script.
#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("Cannot detect language for '{script}'. Use --language to specify it explicitly.")]
    Undetectable { script: String },
}

/// Errors caused by invalid user input or missing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid memory format: '{0}'. Expected format like 128m, 512m, 1g, 2g.")]
    InvalidMemory(String),

    #[error("Memory limit must be at least 4m (Docker minimum), got '{0}'.")]
    MemoryTooSmall(String),

    #[error("Invalid CPU value: {0}. Must be between 0.1 and 16.0.")]
    InvalidCpus(f64),

    #[error("Invalid timeout: {0}. Must be between 1 and 3600 seconds.")]
    InvalidTimeout(u64),

    #[error("Invalid pids limit: {0}. Must be at least 1.")]
    InvalidPidsLimit(i64),

    #[error("Unsupported language: '{value}'. Supported: {supported}")]
    UnsupportedLanguage { value: String, supported: String },

    #[error("No default image for language '{language}'. Use --image to specify one explicitly.")]
    NoImage { language: String },

    #[error("Script not found: {}", .0.display())]
    ScriptNotFound(PathBuf),

    #[error("Not a file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("Invalid env format: '{0}'. Expected KEY=VALUE.")]
    InvalidEnvPair(String),

    #[error("Environment variable name cannot be empty.")]
    EmptyEnvKey,

    #[error("Env file not found: {}", .0.display())]
    EnvFileNotFound(PathBuf),

    #[error("Bad format at {}:{line}: expected KEY=VALUE.", .path.display())]
    EnvFileSyntax { path: PathBuf, line: usize },

    #[error("Failed to parse config file '{}': {message}", .path.display())]
    ConfigFile { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors reported by the container engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Could not connect to the Docker daemon. Make sure Docker is running: {0}")]
    DaemonUnavailable(String),

    #[error("Failed to pull image '{image}': {reason}. Check your internet connection and Docker login.")]
    PullFailed { image: String, reason: String },

    #[error("Failed to create container: {0}")]
    CreateFailed(String),

    #[error("Failed to start container '{id}': {reason}")]
    StartFailed { id: String, reason: String },

    #[error("Error waiting for container '{id}': {reason}")]
    WaitFailed { id: String, reason: String },

    #[error("Failed to kill container '{id}': {reason}")]
    KillFailed { id: String, reason: String },

    #[error("Failed to remove container '{id}': {reason}")]
    RemoveFailed { id: String, reason: String },

    #[error("Error reading container output: {0}")]
    LogStream(String),

    #[error("Failed to list containers: {0}")]
    ListFailed(String),
}

/// Errors that abort a sandboxed run before it produces a result.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error(transparent)]
    Detection(#[from] DetectionError),

    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

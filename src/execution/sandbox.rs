//! Sandbox configuration and its translation into engine launch parameters.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::runtimes::{
    entrypoint_for, LANGUAGE_LABEL, MANAGED_LABEL, MANAGED_LABEL_VALUE, SANDBOX_DIR, SCRIPT_LABEL,
};
use crate::detection::RuntimeIdentity;
use crate::execution::resources::ExecutionLimits;
use crate::script::ScriptReference;

/// Everything needed to launch one sandbox. Built once per run.
#[derive(Debug, Clone, PartialEq)]
pub struct SandboxConfig {
    /// Container image.
    pub image: String,
    /// Runtime the script runs under.
    pub runtime: RuntimeIdentity,
    /// Script mounted into the sandbox.
    pub script: ScriptReference,
    /// Validated resource limits.
    pub limits: ExecutionLimits,
    /// Whether the container is removed after the run.
    pub remove: bool,
    /// Environment variables passed to the container.
    pub environment: BTreeMap<String, String>,
    /// Arguments appended after the script path.
    pub extra_args: Vec<String>,
}

impl SandboxConfig {
    /// Creates a configuration with default limits.
    pub fn new(image: impl Into<String>, runtime: RuntimeIdentity, script: ScriptReference) -> Self {
        Self {
            image: image.into(),
            runtime,
            script,
            limits: ExecutionLimits::default(),
            remove: true,
            environment: BTreeMap::new(),
            extra_args: Vec::new(),
        }
    }

    /// Sets the resource limits.
    pub fn with_limits(mut self, limits: ExecutionLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Sets whether the container is removed afterwards.
    pub fn with_remove(mut self, remove: bool) -> Self {
        self.remove = remove;
        self
    }

    /// Sets the environment variables.
    pub fn with_environment(mut self, environment: BTreeMap<String, String>) -> Self {
        self.environment = environment;
        self
    }

    /// Sets the extra script arguments.
    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    /// Path of the script inside the sandbox.
    pub fn sandbox_script_path(&self) -> String {
        format!("{}/{}", SANDBOX_DIR, self.script.name())
    }
}

/// Volume mount configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VolumeMount {
    /// Host path.
    pub host_path: String,
    /// Container path.
    pub container_path: String,
    /// Whether the mount is read-only.
    pub readonly: bool,
}

impl VolumeMount {
    /// Creates a read-only volume mount.
    pub fn readonly(host: impl Into<String>, container: impl Into<String>) -> Self {
        Self {
            host_path: host.into(),
            container_path: container.into(),
            readonly: true,
        }
    }

    /// Returns the Docker bind string (`host:container[:ro]`).
    pub fn to_docker_mount(&self) -> String {
        let ro = if self.readonly { ":ro" } else { "" };
        format!("{}:{}{}", self.host_path, self.container_path, ro)
    }
}

/// Engine-facing launch descriptor derived from a [`SandboxConfig`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaunchParameters {
    pub image: String,
    /// Command argv, entrypoint first.
    pub command: Vec<String>,
    pub memory_bytes: i64,
    pub nano_cpus: i64,
    pub pids_limit: i64,
    pub mount: VolumeMount,
    pub working_dir: String,
    pub labels: BTreeMap<String, String>,
    /// `KEY=VALUE` entries; `None` when no variables were given.
    pub env: Option<Vec<String>>,
}

impl LaunchParameters {
    /// Command as a single space-separated string, for display.
    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }
}

/// Translates a sandbox configuration into launch parameters.
///
/// Deterministic apart from host-path normalization, which may consult the
/// filesystem and the current directory.
pub fn build_launch_parameters(config: &SandboxConfig) -> LaunchParameters {
    let script_dest = config.sandbox_script_path();

    let mut command: Vec<String> = entrypoint_for(config.runtime.name())
        .split_whitespace()
        .map(str::to_string)
        .collect();
    command.push(script_dest.clone());
    command.extend(config.extra_args.iter().cloned());

    let labels = BTreeMap::from([
        (MANAGED_LABEL.to_string(), MANAGED_LABEL_VALUE.to_string()),
        (LANGUAGE_LABEL.to_string(), config.runtime.name().to_string()),
        (SCRIPT_LABEL.to_string(), config.script.name().to_string()),
    ]);

    let env = if config.environment.is_empty() {
        None
    } else {
        Some(
            config
                .environment
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect(),
        )
    };

    LaunchParameters {
        image: config.image.clone(),
        command,
        memory_bytes: config.limits.memory_bytes(),
        nano_cpus: config.limits.nano_cpus(),
        pids_limit: config.limits.pids_limit,
        mount: VolumeMount::readonly(host_mount_path(config.script.path()), script_dest),
        working_dir: SANDBOX_DIR.to_string(),
        labels,
        env,
    }
}

/// Absolute, forward-slash form of a host path suitable for a bind mount.
pub fn host_mount_path(path: &Path) -> String {
    let absolute: PathBuf = path
        .canonicalize()
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf());
    let text = absolute.to_string_lossy();
    if cfg!(windows) {
        text.trim_start_matches(r"\\?\").replace('\\', "/")
    } else {
        text.into_owned()
    }
}

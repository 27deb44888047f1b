//! Sandboxed script execution on a container engine.
//!
//! A run moves through these steps:
//! ```text
//! DETECT → RESOLVE IMAGE → PULL? → CREATE → START → STREAM → WAIT/TIMEOUT → REMOVE
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use safebox::execution::{DockerClient, Executor, RunOptions};
//! use safebox::script::ScriptReference;
//!
//! let engine = Arc::new(DockerClient::connect().await?);
//! let executor = Executor::new(engine);
//! let script = ScriptReference::resolve("hello.py")?;
//! let result = executor.execute(&script, &RunOptions::default()).await?;
//! std::process::exit(result.process_exit_code());
//! ```

pub mod container;
pub mod docker_client;
pub mod engine;
pub mod executor;
pub mod resources;
pub mod result;
pub mod sandbox;
pub mod watchdog;

#[cfg(test)]
pub(crate) mod testing;

pub use container::{ContainerStatus, SandboxContainer};
pub use docker_client::DockerClient;
pub use engine::{ContainerEngine, ManagedContainer};
pub use executor::{resolve_image, Executor, RunOptions};
pub use resources::{nano_cpus, ExecutionLimits, MemoryLimit};
pub use result::{ExecutionResult, Termination};
pub use sandbox::{build_launch_parameters, LaunchParameters, SandboxConfig, VolumeMount};
pub use watchdog::{wait_bounded, WatchdogError};

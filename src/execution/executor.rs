//! Execution orchestrator: detect, configure, launch, stream, wait, clean up.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use futures::StreamExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::image_for;
use crate::detection::{detect, RuntimeIdentity};
use crate::error::{ConfigError, EngineError, ExecutionError};
use crate::execution::container::SandboxContainer;
use crate::execution::engine::ContainerEngine;
use crate::execution::resources::ExecutionLimits;
use crate::execution::result::ExecutionResult;
use crate::execution::sandbox::{build_launch_parameters, SandboxConfig};
use crate::execution::watchdog::{wait_bounded, WatchdogError};
use crate::output::{Console, OutputSink};
use crate::script::ScriptReference;

/// Caller-supplied options for one run. Limits are already validated.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    /// Explicit language, bypassing detection.
    pub language: Option<String>,
    /// Explicit image, bypassing the runtime table.
    pub image: Option<String>,
    /// Resource limits.
    pub limits: ExecutionLimits,
    /// Remove the container after the run.
    pub remove: bool,
    /// Pull the image even if it is present locally.
    pub pull: bool,
    /// Arguments appended after the script path.
    pub extra_args: Vec<String>,
    /// Environment variables for the container.
    pub environment: BTreeMap<String, String>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            language: None,
            image: None,
            limits: ExecutionLimits::default(),
            remove: true,
            pull: false,
            extra_args: Vec::new(),
            environment: BTreeMap::new(),
        }
    }
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forces the language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Forces the image.
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Sets the resource limits.
    pub fn with_limits(mut self, limits: ExecutionLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Keeps the container after the run.
    pub fn keep_container(mut self) -> Self {
        self.remove = false;
        self
    }

    /// Always pulls the image.
    pub fn with_pull(mut self) -> Self {
        self.pull = true;
        self
    }

    /// Sets the extra script arguments.
    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    /// Adds an environment variable.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }
}

/// Why output streaming stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamEnd {
    /// The stream ended or failed before the deadline.
    Closed,
    /// The deadline passed while the stream was still open.
    Deadline,
}

/// Container currently owned by a run, kept for interrupt cleanup.
#[derive(Debug, Clone)]
struct ActiveContainer {
    id: String,
    remove: bool,
}

/// Runs scripts in sandbox containers.
///
/// One executor holds one engine connection and can run many scripts
/// sequentially.
pub struct Executor {
    engine: Arc<dyn ContainerEngine>,
    sink: Arc<dyn OutputSink>,
    active: Mutex<Option<ActiveContainer>>,
}

impl Executor {
    /// Creates an executor that reports to the terminal.
    pub fn new(engine: Arc<dyn ContainerEngine>) -> Self {
        Self {
            engine,
            sink: Arc::new(Console),
            active: Mutex::new(None),
        }
    }

    /// Replaces the output sink.
    pub fn with_sink(mut self, sink: Arc<dyn OutputSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Runs `script` to completion or timeout.
    ///
    /// Detection, image and engine failures are errors. A timeout is a
    /// normal result with `timed_out` set and exit code 124.
    pub async fn execute(
        &self,
        script: &ScriptReference,
        options: &RunOptions,
    ) -> Result<ExecutionResult, ExecutionError> {
        let runtime = detect(script.path(), options.language.as_deref())?;
        let image = resolve_image(&runtime, options.image.as_deref())?;

        info!(
            script = %script.path().display(),
            language = runtime.name(),
            detected_by = %runtime.source(),
            image = %image,
            "Resolved runtime"
        );
        self.sink.detection(script.name(), runtime.name(), &image);

        self.ensure_image(&image, options.pull).await?;

        let config = SandboxConfig::new(image.clone(), runtime.clone(), script.clone())
            .with_limits(options.limits.clone())
            .with_remove(options.remove)
            .with_environment(options.environment.clone())
            .with_extra_args(options.extra_args.clone());
        self.sink.resources(&config.limits, config.remove);

        let params = build_launch_parameters(&config);
        debug!(command = %params.command_line(), mount = %params.mount.to_docker_mount(), "Launch parameters");

        let name = container_name(runtime.name());
        let mut container = SandboxContainer::create(self.engine.as_ref(), &name, &params).await?;
        self.set_active(Some(ActiveContainer {
            id: container.id().to_string(),
            remove: config.remove,
        }));
        if let Err(e) = container.start(self.engine.as_ref()).await {
            self.set_active(None);
            return Err(e.into());
        }

        let started = Instant::now();
        let limit = config.limits.timeout();
        let deadline = tokio::time::Instant::now() + limit;

        let (output, stream_end) = self.stream_output(container.id(), deadline).await;

        // A stream that closed on its own leaves the wait a full window.
        let wait_limit = match stream_end {
            StreamEnd::Closed => limit,
            StreamEnd::Deadline => deadline.saturating_duration_since(tokio::time::Instant::now()),
        };
        let waited = wait_bounded(Arc::clone(&self.engine), container.id(), wait_limit).await;
        let duration = started.elapsed();

        let result = match waited {
            Ok(exit_code) => {
                container.mark_exited(exit_code);
                ExecutionResult::exited(exit_code, duration, output, runtime.name(), &image)
            }
            Err(WatchdogError::TimedOut { .. }) => {
                container.mark_timed_out();
                self.sink.timed_out(limit);
                ExecutionResult::timed_out(duration, output, runtime.name(), &image)
            }
            Err(WatchdogError::Engine(e)) => {
                if config.remove {
                    container.remove(self.engine.as_ref()).await;
                }
                self.set_active(None);
                return Err(e.into());
            }
        };

        if config.remove {
            container.remove(self.engine.as_ref()).await;
        }
        self.set_active(None);

        info!(
            container = container.id(),
            status = %container.status(),
            duration_ms = duration.as_millis() as u64,
            "Run finished"
        );

        self.sink.result(&result);
        Ok(result)
    }

    /// Kills the container of an interrupted run and removes it unless the
    /// caller asked to keep it. Errors are swallowed.
    pub async fn abort_active(&self) {
        let Some(active) = self.take_active() else {
            return;
        };
        warn!(container = %active.id, "Run interrupted, cleaning up container");
        if let Err(e) = self.engine.kill_container(&active.id).await {
            debug!(container = %active.id, error = %e, "Kill after interrupt failed");
        }
        if active.remove {
            if let Err(e) = self.engine.remove_container(&active.id, true).await {
                debug!(container = %active.id, error = %e, "Removal after interrupt failed");
            }
        }
    }

    /// Force-removes every container carrying the safebox label.
    ///
    /// Returns how many were removed.
    pub async fn clean_managed(&self) -> Result<usize, EngineError> {
        let containers = self.engine.list_managed().await?;
        let mut removed = 0;
        for container in &containers {
            match self.engine.remove_container(&container.id, true).await {
                Ok(()) => {
                    info!(container = %container.id, "Removed managed container");
                    removed += 1;
                }
                Err(e) => warn!(container = %container.id, error = %e, "Failed to remove managed container"),
            }
        }
        Ok(removed)
    }

    async fn ensure_image(&self, image: &str, force_pull: bool) -> Result<(), EngineError> {
        if !force_pull && self.engine.image_exists(image).await {
            debug!(image = image, "Image present locally");
            return Ok(());
        }
        self.sink.pulling(image);
        self.engine.pull_image(image).await?;
        self.sink.pulled(image);
        Ok(())
    }

    /// Forwards container output to the sink until the stream ends, fails,
    /// or the deadline passes. Returns everything received and how the
    /// stream stopped.
    async fn stream_output(
        &self,
        container_id: &str,
        deadline: tokio::time::Instant,
    ) -> (String, StreamEnd) {
        let mut output = String::new();
        let mut stream = self.engine.stream_logs(container_id);
        let end = loop {
            match tokio::time::timeout_at(deadline, stream.next()).await {
                Ok(Some(Ok(chunk))) => {
                    self.sink.chunk(&chunk);
                    output.push_str(&chunk);
                }
                Ok(Some(Err(e))) => {
                    debug!(container = container_id, error = %e, "Output stream failed, continuing");
                    break StreamEnd::Closed;
                }
                Ok(None) => break StreamEnd::Closed,
                Err(_) => {
                    debug!(container = container_id, "Output stream reached the time limit");
                    break StreamEnd::Deadline;
                }
            }
        };
        (output, end)
    }

    fn set_active(&self, active: Option<ActiveContainer>) {
        if let Ok(mut slot) = self.active.lock() {
            *slot = active;
        }
    }

    fn take_active(&self) -> Option<ActiveContainer> {
        self.active.lock().ok().and_then(|mut slot| slot.take())
    }
}

/// Picks the image: explicit override first, then the runtime table.
pub fn resolve_image(
    runtime: &RuntimeIdentity,
    image_override: Option<&str>,
) -> Result<String, ConfigError> {
    if let Some(image) = image_override.map(str::trim).filter(|i| !i.is_empty()) {
        return Ok(image.to_string());
    }
    image_for(runtime.name())
        .map(str::to_string)
        .ok_or_else(|| ConfigError::NoImage {
            language: runtime.name().to_string(),
        })
}

/// Unique Docker-safe container name for a run.
fn container_name(language: &str) -> String {
    let lang: String = language
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    let suffix = Uuid::new_v4().simple().to_string();
    format!("safebox-{}-{}", lang, &suffix[..12])
}

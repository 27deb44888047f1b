//! Scripted in-memory container engine for unit tests.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::EngineError;
use crate::execution::engine::{ContainerEngine, ManagedContainer};
use crate::execution::sandbox::{LaunchParameters, VolumeMount};

/// A call made against [`ScriptedEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Ping,
    ImageExists(String),
    Pull(String),
    Create { name: String, image: String },
    Start(String),
    Logs(String),
    Wait(String),
    Kill(String),
    Remove(String),
    List,
}

/// Engine whose behaviour is configured up front.
pub struct ScriptedEngine {
    calls: Mutex<Vec<EngineCall>>,
    last_params: Mutex<Option<LaunchParameters>>,
    image_present: bool,
    chunks: Vec<String>,
    log_error: bool,
    hang_logs: bool,
    exit_code: i64,
    exit_delay: Duration,
    start_delay: Duration,
    output_delay: Duration,
    fail_pull: bool,
    fail_create: bool,
    fail_start: bool,
    fail_wait: bool,
    fail_kill: bool,
    fail_remove: bool,
    managed: Vec<ManagedContainer>,
}

impl ScriptedEngine {
    pub const CONTAINER_ID: &'static str = "container-1";

    /// Image present, no output, exits 0 immediately.
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            last_params: Mutex::new(None),
            image_present: true,
            chunks: Vec::new(),
            log_error: false,
            hang_logs: false,
            exit_code: 0,
            exit_delay: Duration::ZERO,
            start_delay: Duration::ZERO,
            output_delay: Duration::ZERO,
            fail_pull: false,
            fail_create: false,
            fail_start: false,
            fail_wait: false,
            fail_kill: false,
            fail_remove: false,
            managed: Vec::new(),
        }
    }

    pub fn with_output(mut self, chunks: &[&str]) -> Self {
        self.chunks = chunks.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn exit_after(mut self, delay: Duration, code: i64) -> Self {
        self.exit_delay = delay;
        self.exit_code = code;
        self
    }

    /// Delays the first output chunk.
    pub fn output_after(mut self, delay: Duration) -> Self {
        self.output_delay = delay;
        self
    }

    pub fn start_after(mut self, delay: Duration) -> Self {
        self.start_delay = delay;
        self
    }

    pub fn without_image(mut self) -> Self {
        self.image_present = false;
        self
    }

    pub fn with_managed(mut self, managed: Vec<ManagedContainer>) -> Self {
        self.managed = managed;
        self
    }

    pub fn log_error_after_output(mut self) -> Self {
        self.log_error = true;
        self
    }

    pub fn hanging_logs(mut self) -> Self {
        self.hang_logs = true;
        self
    }

    pub fn failing_pull(mut self) -> Self {
        self.fail_pull = true;
        self
    }

    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    pub fn failing_wait(mut self) -> Self {
        self.fail_wait = true;
        self
    }

    pub fn failing_kill(mut self) -> Self {
        self.fail_kill = true;
        self
    }

    pub fn failing_remove(mut self) -> Self {
        self.fail_remove = true;
        self
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn calls_matching(&self, pred: impl Fn(&EngineCall) -> bool) -> Vec<EngineCall> {
        self.calls().into_iter().filter(|c| pred(c)).collect()
    }

    pub fn was_called(&self, call: &EngineCall) -> bool {
        self.calls().contains(call)
    }

    pub fn last_params(&self) -> Option<LaunchParameters> {
        self.last_params.lock().expect("params lock").clone()
    }

    fn record(&self, call: EngineCall) {
        self.calls.lock().expect("calls lock").push(call);
    }
}

#[async_trait]
impl ContainerEngine for ScriptedEngine {
    async fn ping(&self) -> Result<(), EngineError> {
        self.record(EngineCall::Ping);
        Ok(())
    }

    async fn image_exists(&self, image: &str) -> bool {
        self.record(EngineCall::ImageExists(image.to_string()));
        self.image_present
    }

    async fn pull_image(&self, image: &str) -> Result<(), EngineError> {
        self.record(EngineCall::Pull(image.to_string()));
        if self.fail_pull {
            return Err(EngineError::PullFailed {
                image: image.to_string(),
                reason: "manifest unknown".to_string(),
            });
        }
        Ok(())
    }

    async fn create_container(
        &self,
        name: &str,
        params: &LaunchParameters,
    ) -> Result<String, EngineError> {
        self.record(EngineCall::Create {
            name: name.to_string(),
            image: params.image.clone(),
        });
        *self.last_params.lock().expect("params lock") = Some(params.clone());
        if self.fail_create {
            return Err(EngineError::CreateFailed("no space left on device".to_string()));
        }
        Ok(Self::CONTAINER_ID.to_string())
    }

    async fn start_container(&self, id: &str) -> Result<(), EngineError> {
        self.record(EngineCall::Start(id.to_string()));
        tokio::time::sleep(self.start_delay).await;
        if self.fail_start {
            return Err(EngineError::StartFailed {
                id: id.to_string(),
                reason: "exec format error".to_string(),
            });
        }
        Ok(())
    }

    fn stream_logs(&self, id: &str) -> BoxStream<'static, Result<String, EngineError>> {
        self.record(EngineCall::Logs(id.to_string()));
        let chunks = self.chunks.clone();
        let log_error = self.log_error;
        let hang = self.hang_logs;
        let delay = self.output_delay;
        Box::pin(async_stream::stream! {
            tokio::time::sleep(delay).await;
            for chunk in chunks {
                yield Ok(chunk);
            }
            if log_error {
                yield Err(EngineError::LogStream("connection reset".to_string()));
            }
            if hang {
                futures::future::pending::<()>().await;
            }
        })
    }

    async fn wait_container(&self, id: &str) -> Result<i64, EngineError> {
        self.record(EngineCall::Wait(id.to_string()));
        if self.fail_wait {
            return Err(EngineError::WaitFailed {
                id: id.to_string(),
                reason: "daemon went away".to_string(),
            });
        }
        tokio::time::sleep(self.exit_delay).await;
        Ok(self.exit_code)
    }

    async fn kill_container(&self, id: &str) -> Result<(), EngineError> {
        self.record(EngineCall::Kill(id.to_string()));
        if self.fail_kill {
            return Err(EngineError::KillFailed {
                id: id.to_string(),
                reason: "container is not running".to_string(),
            });
        }
        Ok(())
    }

    async fn remove_container(&self, id: &str, _force: bool) -> Result<(), EngineError> {
        self.record(EngineCall::Remove(id.to_string()));
        if self.fail_remove {
            return Err(EngineError::RemoveFailed {
                id: id.to_string(),
                reason: "removal already in progress".to_string(),
            });
        }
        Ok(())
    }

    async fn list_managed(&self) -> Result<Vec<ManagedContainer>, EngineError> {
        self.record(EngineCall::List);
        Ok(self.managed.clone())
    }
}

/// Minimal launch parameters for engine-level tests.
pub fn sample_launch_parameters() -> LaunchParameters {
    LaunchParameters {
        image: "bash:5".to_string(),
        command: vec!["bash".to_string(), "/sandbox/run.sh".to_string()],
        memory_bytes: 256 * 1024 * 1024,
        nano_cpus: 1_000_000_000,
        pids_limit: 64,
        mount: VolumeMount::readonly("/tmp/run.sh", "/sandbox/run.sh"),
        working_dir: "/sandbox".to_string(),
        labels: BTreeMap::from([("safebox".to_string(), "true".to_string())]),
        env: None,
    }
}

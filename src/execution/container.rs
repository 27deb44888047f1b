//! Lifecycle tracking for the single container owned by a run.

use std::fmt;

use tracing::{debug, info};

use crate::error::EngineError;
use crate::execution::engine::ContainerEngine;
use crate::execution::sandbox::LaunchParameters;

/// Status of a sandbox container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerStatus {
    /// Container exists but has not been started.
    Created,
    /// Container is running.
    Running,
    /// Container exited with a status code.
    Exited(i64),
    /// Container was killed and removed by the watchdog.
    TimedOut,
    /// Container has been removed.
    Removed,
}

impl fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerStatus::Created => write!(f, "created"),
            ContainerStatus::Running => write!(f, "running"),
            ContainerStatus::Exited(code) => write!(f, "exited({code})"),
            ContainerStatus::TimedOut => write!(f, "timeout"),
            ContainerStatus::Removed => write!(f, "removed"),
        }
    }
}

/// A sandbox container and what has happened to it so far.
#[derive(Debug)]
pub struct SandboxContainer {
    id: String,
    name: String,
    status: ContainerStatus,
}

impl SandboxContainer {
    /// Creates a container without starting it.
    pub async fn create(
        engine: &dyn ContainerEngine,
        name: &str,
        params: &LaunchParameters,
    ) -> Result<Self, EngineError> {
        let id = engine.create_container(name, params).await?;
        debug!(container = %id, name = name, image = %params.image, "Container created");

        Ok(Self {
            id,
            name: name.to_string(),
            status: ContainerStatus::Created,
        })
    }

    /// Starts a created container.
    ///
    /// On failure the container is force-removed before the start error is
    /// returned.
    pub async fn start(&mut self, engine: &dyn ContainerEngine) -> Result<(), EngineError> {
        if let Err(e) = engine.start_container(&self.id).await {
            self.remove(engine).await;
            return Err(e);
        }
        info!(container = %self.id, name = %self.name, "Container started");
        self.status = ContainerStatus::Running;
        Ok(())
    }

    /// Returns the container ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the container name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the current status.
    pub fn status(&self) -> ContainerStatus {
        self.status
    }

    pub fn mark_exited(&mut self, exit_code: i64) {
        self.status = ContainerStatus::Exited(exit_code);
    }

    /// Records that the watchdog already killed and removed the container.
    pub fn mark_timed_out(&mut self) {
        self.status = ContainerStatus::TimedOut;
    }

    /// Returns true if nothing has removed the container yet.
    pub fn needs_removal(&self) -> bool {
        matches!(
            self.status,
            ContainerStatus::Created | ContainerStatus::Running | ContainerStatus::Exited(_)
        )
    }

    /// Force-removes the container unless it is already gone.
    ///
    /// Failures are logged and swallowed.
    pub async fn remove(&mut self, engine: &dyn ContainerEngine) {
        if !self.needs_removal() {
            return;
        }
        match engine.remove_container(&self.id, true).await {
            Ok(()) => debug!(container = %self.id, "Container removed"),
            Err(e) => debug!(container = %self.id, error = %e, "Container removal failed"),
        }
        self.status = ContainerStatus::Removed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::testing::{sample_launch_parameters, EngineCall, ScriptedEngine};

    async fn started(engine: &ScriptedEngine) -> SandboxContainer {
        let mut container =
            SandboxContainer::create(engine, "safebox-test", &sample_launch_parameters())
                .await
                .expect("create");
        container.start(engine).await.expect("start");
        container
    }

    #[test]
    fn test_container_status_display() {
        assert_eq!(ContainerStatus::Created.to_string(), "created");
        assert_eq!(ContainerStatus::Running.to_string(), "running");
        assert_eq!(ContainerStatus::Exited(2).to_string(), "exited(2)");
        assert_eq!(ContainerStatus::TimedOut.to_string(), "timeout");
        assert_eq!(ContainerStatus::Removed.to_string(), "removed");
    }

    #[tokio::test]
    async fn test_create_does_not_start() {
        let engine = ScriptedEngine::new();
        let container =
            SandboxContainer::create(&engine, "safebox-test", &sample_launch_parameters())
                .await
                .expect("create");

        assert_eq!(container.status(), ContainerStatus::Created);
        assert!(container.needs_removal());
        assert!(engine.calls_matching(|c| matches!(c, EngineCall::Start(_))).is_empty());
    }

    #[tokio::test]
    async fn test_start_runs_container() {
        let engine = ScriptedEngine::new();
        let container = started(&engine).await;

        assert_eq!(container.status(), ContainerStatus::Running);
        assert_eq!(container.name(), "safebox-test");
        assert!(engine.was_called(&EngineCall::Start(container.id().to_string())));
    }

    #[tokio::test]
    async fn test_start_failure_removes_container() {
        let engine = ScriptedEngine::new().failing_start();
        let mut container =
            SandboxContainer::create(&engine, "safebox-test", &sample_launch_parameters())
                .await
                .expect("create");
        let err = container.start(&engine).await.unwrap_err();

        assert!(matches!(err, EngineError::StartFailed { .. }));
        assert_eq!(container.status(), ContainerStatus::Removed);
        assert!(engine.was_called(&EngineCall::Remove(ScriptedEngine::CONTAINER_ID.to_string())));
    }

    #[tokio::test]
    async fn test_remove_runs_once() {
        let engine = ScriptedEngine::new();
        let mut container = started(&engine).await;

        container.mark_exited(0);
        container.remove(&engine).await;
        container.remove(&engine).await;

        assert_eq!(container.status(), ContainerStatus::Removed);
        assert_eq!(
            engine.calls_matching(|c| matches!(c, EngineCall::Remove(_))).len(),
            1
        );
    }

    #[tokio::test]
    async fn test_timed_out_container_is_not_removed_again() {
        let engine = ScriptedEngine::new();
        let mut container = started(&engine).await;

        container.mark_timed_out();
        container.remove(&engine).await;

        assert!(!engine.was_called(&EngineCall::Remove(container.id().to_string())));
    }
}

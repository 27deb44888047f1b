//! Container engine abstraction.
//!
//! The executor only talks to the engine through [`ContainerEngine`], which
//! keeps the run lifecycle independent of the Docker API and lets tests
//! substitute a scripted engine.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::Serialize;

use crate::error::EngineError;
use crate::execution::sandbox::LaunchParameters;

/// A container carrying the safebox management label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManagedContainer {
    pub id: String,
    pub name: Option<String>,
    pub image: Option<String>,
    pub state: Option<String>,
    pub language: Option<String>,
    pub script: Option<String>,
}

/// Operations safebox needs from a container engine.
#[async_trait]
pub trait ContainerEngine: Send + Sync {
    /// Checks that the engine is reachable.
    async fn ping(&self) -> Result<(), EngineError>;

    /// Returns whether `image` is present locally.
    async fn image_exists(&self, image: &str) -> bool;

    /// Pulls `image` from its registry.
    async fn pull_image(&self, image: &str) -> Result<(), EngineError>;

    /// Creates a container and returns its ID. The container is not started.
    async fn create_container(
        &self,
        name: &str,
        params: &LaunchParameters,
    ) -> Result<String, EngineError>;

    /// Starts a created container.
    async fn start_container(&self, id: &str) -> Result<(), EngineError>;

    /// Follows the combined stdout/stderr of a container, in order.
    ///
    /// The stream ends when the container stops producing output.
    fn stream_logs(&self, id: &str) -> BoxStream<'static, Result<String, EngineError>>;

    /// Blocks until the container reaches a terminal state and returns its
    /// status code.
    async fn wait_container(&self, id: &str) -> Result<i64, EngineError>;

    /// Sends SIGKILL to the container.
    async fn kill_container(&self, id: &str) -> Result<(), EngineError>;

    /// Removes the container, killing it first when `force` is set.
    async fn remove_container(&self, id: &str, force: bool) -> Result<(), EngineError>;

    /// Lists every container carrying the safebox management label.
    async fn list_managed(&self) -> Result<Vec<ManagedContainer>, EngineError>;
}

//! Docker API wrapper using the bollard crate.
//!
//! This module implements [`ContainerEngine`] on top of the local Docker
//! daemon.

use std::collections::HashMap;

use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, KillContainerOptions, ListContainersOptions, LogsOptions,
    RemoveContainerOptions, StartContainerOptions, WaitContainerOptions,
};
use bollard::errors::Error as BollardError;
use bollard::image::CreateImageOptions;
use bollard::models::HostConfig;
use bollard::Docker;
use futures::stream::BoxStream;
use futures::StreamExt;
use tracing::debug;

use crate::config::runtimes::{LANGUAGE_LABEL, MANAGED_LABEL, MANAGED_LABEL_VALUE, SCRIPT_LABEL};
use crate::error::EngineError;
use crate::execution::engine::{ContainerEngine, ManagedContainer};
use crate::execution::sandbox::LaunchParameters;

/// Docker client wrapper for container operations.
///
/// Construct once and share it (it is cheap to clone) for the lifetime of
/// the process.
#[derive(Debug, Clone)]
pub struct DockerClient {
    docker: Docker,
}

impl DockerClient {
    /// Creates a new Docker client using the local defaults (`DOCKER_HOST`
    /// or the platform socket).
    ///
    /// # Errors
    ///
    /// Returns `EngineError::DaemonUnavailable` if the client cannot be built.
    pub fn new() -> Result<Self, EngineError> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| EngineError::DaemonUnavailable(e.to_string()))?;

        Ok(Self { docker })
    }

    /// Creates a client and checks that the daemon answers.
    pub async fn connect() -> Result<Self, EngineError> {
        let client = Self::new()?;
        client.ping().await?;
        Ok(client)
    }

    /// Creates a new Docker client from an existing bollard Docker instance.
    pub fn from_docker(docker: Docker) -> Self {
        Self { docker }
    }
}

#[async_trait]
impl ContainerEngine for DockerClient {
    async fn ping(&self) -> Result<(), EngineError> {
        self.docker
            .ping()
            .await
            .map_err(|e| EngineError::DaemonUnavailable(e.to_string()))?;
        Ok(())
    }

    async fn image_exists(&self, image: &str) -> bool {
        self.docker.inspect_image(image).await.is_ok()
    }

    async fn pull_image(&self, image: &str) -> Result<(), EngineError> {
        let options = CreateImageOptions {
            from_image: image,
            ..Default::default()
        };

        let mut stream = self.docker.create_image(Some(options), None, None);

        while let Some(result) = stream.next().await {
            let info = result.map_err(|e| EngineError::PullFailed {
                image: image.to_string(),
                reason: e.to_string(),
            })?;
            if let Some(status) = info.status {
                debug!(image = image, status = %status, "Pull progress");
            }
        }

        Ok(())
    }

    async fn create_container(
        &self,
        name: &str,
        params: &LaunchParameters,
    ) -> Result<String, EngineError> {
        let host_config = HostConfig {
            memory: Some(params.memory_bytes),
            nano_cpus: Some(params.nano_cpus),
            pids_limit: Some(params.pids_limit),
            binds: Some(vec![params.mount.to_docker_mount()]),
            ..Default::default()
        };

        let labels: HashMap<String, String> = params
            .labels
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let container_config = Config {
            image: Some(params.image.clone()),
            cmd: Some(params.command.clone()),
            env: params.env.clone(),
            working_dir: Some(params.working_dir.clone()),
            labels: Some(labels),
            host_config: Some(host_config),
            tty: Some(false),
            attach_stdin: Some(false),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            ..Default::default()
        };

        let options = CreateContainerOptions {
            name: name.to_string(),
            platform: None,
        };

        let response = self
            .docker
            .create_container(Some(options), container_config)
            .await
            .map_err(|e| EngineError::CreateFailed(e.to_string()))?;

        for warning in &response.warnings {
            debug!(container = %response.id, warning = %warning, "Docker create warning");
        }

        Ok(response.id)
    }

    async fn start_container(&self, id: &str) -> Result<(), EngineError> {
        self.docker
            .start_container(id, None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| EngineError::StartFailed {
                id: id.to_string(),
                reason: e.to_string(),
            })?;

        Ok(())
    }

    fn stream_logs(&self, id: &str) -> BoxStream<'static, Result<String, EngineError>> {
        let options = LogsOptions::<String> {
            follow: true,
            stdout: true,
            stderr: true,
            timestamps: false,
            ..Default::default()
        };

        self.docker
            .logs(id, Some(options))
            .map(|chunk| {
                chunk
                    .map(|output| String::from_utf8_lossy(&output.into_bytes()).into_owned())
                    .map_err(|e| EngineError::LogStream(e.to_string()))
            })
            .boxed()
    }

    async fn wait_container(&self, id: &str) -> Result<i64, EngineError> {
        let options = WaitContainerOptions {
            condition: "not-running",
        };

        let mut stream = self.docker.wait_container(id, Some(options));

        match stream.next().await {
            Some(Ok(response)) => Ok(response.status_code),
            // bollard reports a non-zero exit status as an error
            Some(Err(BollardError::DockerContainerWaitError { code, .. })) => Ok(code),
            Some(Err(e)) => Err(EngineError::WaitFailed {
                id: id.to_string(),
                reason: e.to_string(),
            }),
            None => Err(EngineError::WaitFailed {
                id: id.to_string(),
                reason: "wait stream ended without a status".to_string(),
            }),
        }
    }

    async fn kill_container(&self, id: &str) -> Result<(), EngineError> {
        self.docker
            .kill_container(id, Some(KillContainerOptions { signal: "SIGKILL" }))
            .await
            .map_err(|e| EngineError::KillFailed {
                id: id.to_string(),
                reason: e.to_string(),
            })
    }

    async fn remove_container(&self, id: &str, force: bool) -> Result<(), EngineError> {
        let options = RemoveContainerOptions {
            force,
            v: true, // Remove anonymous volumes
            ..Default::default()
        };

        self.docker
            .remove_container(id, Some(options))
            .await
            .map_err(|e| EngineError::RemoveFailed {
                id: id.to_string(),
                reason: e.to_string(),
            })
    }

    async fn list_managed(&self) -> Result<Vec<ManagedContainer>, EngineError> {
        let filters = HashMap::from([(
            "label".to_string(),
            vec![format!("{MANAGED_LABEL}={MANAGED_LABEL_VALUE}")],
        )]);
        let options = ListContainersOptions::<String> {
            all: true,
            filters,
            ..Default::default()
        };

        let summaries = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(|e| EngineError::ListFailed(e.to_string()))?;

        Ok(summaries
            .into_iter()
            .filter_map(|summary| {
                let id = summary.id?;
                let labels = summary.labels.unwrap_or_default();
                Some(ManagedContainer {
                    id,
                    name: summary
                        .names
                        .and_then(|names| names.into_iter().next())
                        .map(|n| n.trim_start_matches('/').to_string()),
                    image: summary.image,
                    state: summary.state,
                    language: labels.get(LANGUAGE_LABEL).cloned(),
                    script: labels.get(SCRIPT_LABEL).cloned(),
                })
            })
            .collect())
    }
}

// Docker container inventory via bollard

use async_trait::async_trait;
use bollard::models::ContainerSummary;
use bollard::query_parameters::{
    ListContainersOptions, RestartContainerOptions, StopContainerOptions,
};
use bollard::{API_DEFAULT_VERSION, Docker};
use tracing::{info, instrument};

use crate::models::ContainerInfo;
use crate::ports::{InventoryError, InventoryPort};

const CONNECT_TIMEOUT_SECS: u64 = 120;
const SHORT_ID_LEN: usize = 12;

pub struct DockerRepo {
    docker: Docker,
}

impl DockerRepo {
    /// Connect to the local daemon (honours DOCKER_HOST), or to `host` when given
    /// (`tcp://`/`http://` or `unix://` addresses).
    pub fn connect(host: Option<&str>) -> anyhow::Result<Self> {
        let docker = match host {
            None => Docker::connect_with_local_defaults()?,
            Some(h) if h.starts_with("unix://") => {
                Docker::connect_with_unix(h, CONNECT_TIMEOUT_SECS, API_DEFAULT_VERSION)?
            }
            Some(h) => {
                let addr = h.replacen("tcp://", "http://", 1);
                Docker::connect_with_http(&addr, CONNECT_TIMEOUT_SECS, API_DEFAULT_VERSION)?
            }
        };
        info!(host = host.unwrap_or("local defaults"), "docker client configured");
        Ok(Self { docker })
    }
}

/// Map a Docker list entry to an inventory row: short id, first name without the
/// leading slash, human-readable status (e.g. "Up 3 days").
pub fn container_info(summary: &ContainerSummary) -> ContainerInfo {
    let full_id = summary.id.as_deref().unwrap_or_default();
    let id: String = full_id.chars().take(SHORT_ID_LEN).collect();
    let name = summary
        .names
        .as_ref()
        .and_then(|n| n.first())
        .map(|n| n.trim_start_matches('/').to_string())
        .unwrap_or_else(|| id.clone());
    ContainerInfo {
        id,
        name,
        raw_status: summary.status.clone().unwrap_or_default(),
        image: summary.image.clone().unwrap_or_default(),
    }
}

#[async_trait]
impl InventoryPort for DockerRepo {
    #[instrument(skip(self), fields(repo = "docker", operation = "list_containers"))]
    async fn list(&self, include_stopped: bool) -> Result<Vec<ContainerInfo>, InventoryError> {
        let options = ListContainersOptions {
            all: include_stopped,
            ..Default::default()
        };
        let containers = self.docker.list_containers(Some(options)).await?;
        Ok(containers.iter().map(container_info).collect())
    }

    #[instrument(skip(self), fields(repo = "docker", operation = "restart_container"))]
    async fn restart(&self, id: &str) -> Result<(), InventoryError> {
        self.docker
            .restart_container(id, None::<RestartContainerOptions>)
            .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(repo = "docker", operation = "stop_container"))]
    async fn stop(&self, id: &str) -> Result<(), InventoryError> {
        self.docker
            .stop_container(id, None::<StopContainerOptions>)
            .await?;
        Ok(())
    }
}

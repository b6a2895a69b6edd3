//! Docker integration - runtime gateway and container domain types

use async_trait::async_trait;
use bollard::container::{
    InspectContainerOptions, ListContainersOptions, LogsOptions, RestartContainerOptions, Stats,
    StatsOptions, StopContainerOptions,
};
use bollard::models::{ContainerInspectResponse, ContainerSummary as ApiContainerSummary};
use bollard::Docker;
use futures::{StreamExt, TryStreamExt};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::integrations::stats;
use crate::ui::text::truncate;

/// Lifecycle state reported by the runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerStatus {
    Running,
    Paused,
    Exited,
    Created,
    Restarting,
    Dead,
    Unknown,
}

impl ContainerStatus {
    /// Single-column glyph used in the container list
    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Running => "●",
            Self::Exited => "○",
            Self::Paused => "◐",
            Self::Restarting => "↻",
            Self::Dead => "✗",
            Self::Created => "◌",
            Self::Unknown => "?",
        }
    }
}

impl std::fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Paused => write!(f, "paused"),
            Self::Exited => write!(f, "exited"),
            Self::Created => write!(f, "created"),
            Self::Restarting => write!(f, "restarting"),
            Self::Dead => write!(f, "dead"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

impl From<&str> for ContainerStatus {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "running" => Self::Running,
            "paused" => Self::Paused,
            "exited" => Self::Exited,
            "created" => Self::Created,
            "restarting" => Self::Restarting,
            "dead" => Self::Dead,
            _ => Self::Unknown,
        }
    }
}

/// One row of the container list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSummary {
    pub id: String,
    pub name: String,
    pub image: String,
    pub status: ContainerStatus,
    /// Human readable status such as "Up 2 hours"
    pub status_text: String,
}

impl ContainerSummary {
    pub fn short_id(&self) -> &str {
        short_id(&self.id)
    }

    pub fn is_running(&self) -> bool {
        self.status == ContainerStatus::Running
    }
}

impl From<ApiContainerSummary> for ContainerSummary {
    fn from(container: ApiContainerSummary) -> Self {
        let name = container
            .names
            .and_then(|n| n.first().cloned())
            .unwrap_or_default()
            .trim_start_matches('/')
            .to_string();
        let state = container.state.unwrap_or_default();

        Self {
            id: container.id.unwrap_or_default(),
            name,
            image: container.image.unwrap_or_default(),
            status: ContainerStatus::from(state.as_str()),
            status_text: container.status.unwrap_or_default(),
        }
    }
}

/// First 8 characters of a container id
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

/// Raw point-in-time counters for one container
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsSnapshot {
    pub cpu_total_usage: u64,
    pub precpu_total_usage: u64,
    pub system_cpu_usage: u64,
    pub presystem_cpu_usage: u64,
    pub online_cpus: Option<u64>,
    pub percpu_count: usize,
    pub memory_usage: u64,
    pub memory_limit: u64,
    /// Cumulative bytes across every attached network
    pub net_rx_bytes: u64,
    pub net_tx_bytes: u64,
}

/// Sum `(rx, tx)` byte counters over a container's interfaces
pub fn network_totals(interfaces: impl IntoIterator<Item = (u64, u64)>) -> (u64, u64) {
    interfaces
        .into_iter()
        .fold((0u64, 0u64), |(rx, tx), (if_rx, if_tx)| {
            (rx.saturating_add(if_rx), tx.saturating_add(if_tx))
        })
}

impl From<&Stats> for StatsSnapshot {
    fn from(stats: &Stats) -> Self {
        let (net_rx_bytes, net_tx_bytes) = stats
            .networks
            .as_ref()
            .map(|networks| network_totals(networks.values().map(|n| (n.rx_bytes, n.tx_bytes))))
            .unwrap_or((0, 0));

        Self {
            cpu_total_usage: stats.cpu_stats.cpu_usage.total_usage,
            precpu_total_usage: stats.precpu_stats.cpu_usage.total_usage,
            system_cpu_usage: stats.cpu_stats.system_cpu_usage.unwrap_or(0),
            presystem_cpu_usage: stats.precpu_stats.system_cpu_usage.unwrap_or(0),
            online_cpus: stats.cpu_stats.online_cpus,
            percpu_count: stats
                .cpu_stats
                .cpu_usage
                .percpu_usage
                .as_ref()
                .map(|v| v.len())
                .unwrap_or(0),
            memory_usage: stats.memory_stats.usage.unwrap_or(0),
            memory_limit: stats.memory_stats.limit.unwrap_or(0),
            net_rx_bytes,
            net_tx_bytes,
        }
    }
}

/// Detail record for the selected container
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InspectDetail {
    pub id: String,
    pub name: String,
    pub image: String,
    pub state: Option<String>,
    pub ip_address: Option<String>,
    /// Published ports formatted as `host->container/proto`
    pub ports: Vec<String>,
}

impl From<ContainerInspectResponse> for InspectDetail {
    fn from(response: ContainerInspectResponse) -> Self {
        let network = response.network_settings.unwrap_or_default();

        // The bridge address is empty for user-defined networks
        let ip_address = network
            .ip_address
            .filter(|ip| !ip.is_empty())
            .or_else(|| {
                let mut attached: Vec<_> = network.networks.iter().flatten().collect();
                attached.sort_by(|a, b| a.0.cmp(b.0));
                attached.into_iter().find_map(|(_, endpoint)| {
                    endpoint.ip_address.clone().filter(|ip| !ip.is_empty())
                })
            });

        let mut ports: Vec<String> = network
            .ports
            .unwrap_or_default()
            .into_iter()
            .flat_map(|(container_port, bindings)| {
                bindings
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|b| b.host_port)
                    .map(move |host| format!("{}->{}", host, container_port))
                    .collect::<Vec<_>>()
            })
            .collect();
        ports.sort();
        ports.dedup();

        Self {
            id: response.id.unwrap_or_default(),
            name: response
                .name
                .unwrap_or_default()
                .trim_start_matches('/')
                .to_string(),
            image: response.config.and_then(|c| c.image).unwrap_or_default(),
            state: response
                .state
                .and_then(|s| s.status)
                .map(|s| s.to_string())
                .filter(|s| !s.is_empty()),
            ip_address,
            ports,
        }
    }
}

/// Failure of a single runtime call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("cannot reach the container runtime: {0}")]
    Unreachable(String),
    #[error("no such container: {0}")]
    NotFound(String),
    #[error("{0}")]
    Api(String),
    #[error("timed out after {0}s")]
    Timeout(u64),
}

impl From<bollard::errors::Error> for GatewayError {
    fn from(err: bollard::errors::Error) -> Self {
        match err {
            bollard::errors::Error::DockerResponseServerError {
                status_code: 404,
                message,
            } => Self::NotFound(message),
            bollard::errors::Error::DockerResponseServerError { message, .. } => {
                Self::Api(message)
            }
            other => Self::Api(other.to_string()),
        }
    }
}

/// Bound a runtime call, mapping an elapsed deadline to [`GatewayError::Timeout`]
pub async fn with_timeout<T, F>(limit: Duration, call: F) -> Result<T, GatewayError>
where
    F: Future<Output = Result<T, GatewayError>>,
{
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or(Err(GatewayError::Timeout(limit.as_secs())))
}

/// Operations the dashboard needs from a container runtime
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RuntimeGateway: Send + Sync {
    /// Cheap reachability probe used once at startup
    async fn ping(&self) -> Result<(), GatewayError>;

    async fn list_containers(&self) -> Result<Vec<ContainerSummary>, GatewayError>;

    /// A single snapshot, not a stream
    async fn get_stats(&self, id: &str) -> Result<StatsSnapshot, GatewayError>;

    async fn inspect(&self, id: &str) -> Result<InspectDetail, GatewayError>;

    async fn recent_logs(&self, id: &str, tail: usize) -> Result<String, GatewayError>;

    async fn start(&self, id: &str) -> Result<(), GatewayError>;

    async fn stop(&self, id: &str, timeout_secs: u32) -> Result<(), GatewayError>;

    async fn restart(&self, id: &str, timeout_secs: u32) -> Result<(), GatewayError>;
}

/// Docker client wrapper
pub struct DockerClient {
    docker: Docker,
}

impl DockerClient {
    /// Connect using a socket path, or the local defaults (DOCKER_HOST aware)
    pub fn connect(socket_path: Option<&str>) -> Result<Self, GatewayError> {
        let docker = match socket_path {
            Some(path) => Docker::connect_with_socket(path, 120, bollard::API_DEFAULT_VERSION),
            None => Docker::connect_with_local_defaults(),
        }
        .map_err(|e| GatewayError::Unreachable(e.to_string()))?;
        Ok(Self { docker })
    }
}

#[async_trait]
impl RuntimeGateway for DockerClient {
    async fn ping(&self) -> Result<(), GatewayError> {
        self.docker
            .ping()
            .await
            .map_err(|e| GatewayError::Unreachable(e.to_string()))?;
        Ok(())
    }

    async fn list_containers(&self) -> Result<Vec<ContainerSummary>, GatewayError> {
        let options = ListContainersOptions::<String> {
            all: true,
            ..Default::default()
        };

        let containers = self.docker.list_containers(Some(options)).await?;
        Ok(containers.into_iter().map(ContainerSummary::from).collect())
    }

    async fn get_stats(&self, id: &str) -> Result<StatsSnapshot, GatewayError> {
        // one_shot would leave precpu_stats empty and pin every delta at zero
        let options = StatsOptions {
            stream: false,
            one_shot: false,
        };

        let mut stream = self.docker.stats(id, Some(options));
        match stream.next().await {
            Some(Ok(stats)) => Ok(StatsSnapshot::from(&stats)),
            Some(Err(e)) => Err(e.into()),
            None => Err(GatewayError::Api(format!("empty stats response for {}", id))),
        }
    }

    async fn inspect(&self, id: &str) -> Result<InspectDetail, GatewayError> {
        let response = self
            .docker
            .inspect_container(id, None::<InspectContainerOptions>)
            .await?;
        Ok(InspectDetail::from(response))
    }

    async fn recent_logs(&self, id: &str, tail: usize) -> Result<String, GatewayError> {
        let options = LogsOptions::<String> {
            stdout: true,
            stderr: true,
            tail: tail.to_string(),
            ..Default::default()
        };

        let chunks: Vec<_> = self.docker.logs(id, Some(options)).try_collect().await?;
        Ok(chunks.iter().map(|chunk| chunk.to_string()).collect())
    }

    async fn start(&self, id: &str) -> Result<(), GatewayError> {
        self.docker.start_container::<String>(id, None).await?;
        Ok(())
    }

    async fn stop(&self, id: &str, timeout_secs: u32) -> Result<(), GatewayError> {
        let options = StopContainerOptions {
            t: timeout_secs.try_into().unwrap_or(10),
        };
        self.docker.stop_container(id, Some(options)).await?;
        Ok(())
    }

    async fn restart(&self, id: &str, timeout_secs: u32) -> Result<(), GatewayError> {
        let options = RestartContainerOptions {
            t: timeout_secs.try_into().unwrap_or(10),
        };
        self.docker.restart_container(id, Some(options)).await?;
        Ok(())
    }
}

/// One `ps` line; containers without stats show `-`
pub fn status_row(container: &ContainerSummary, metrics: Option<&stats::DerivedMetrics>) -> String {
    let (cpu, memory) = metrics
        .map(|m| (m.cpu_label(), m.memory.to_string()))
        .unwrap_or_else(|| ("-".to_string(), "-".to_string()));
    let status = if container.status_text.is_empty() {
        container.status.to_string()
    } else {
        container.status_text.clone()
    };

    format!(
        "{:<10} {:<20} {:<25} {:<20} {:>7}  {}",
        container.short_id(),
        truncate(&container.name, 20),
        truncate(&container.image, 25),
        truncate(&status, 20),
        cpu,
        memory
    )
}

/// Print a one-shot container table for `docktop ps`
pub async fn print_status(
    gateway: Arc<dyn RuntimeGateway>,
    timeout: Duration,
) -> Result<(), GatewayError> {
    let data = stats::poll(Arc::clone(&gateway), timeout).await?;

    if data.containers.is_empty() {
        println!("No containers found");
        return Ok(());
    }

    println!(
        "{:<10} {:<20} {:<25} {:<20} {:>7}  MEMORY",
        "ID", "NAME", "IMAGE", "STATUS", "CPU"
    );
    println!("{}", "-".repeat(110));

    for container in &data.containers {
        println!("{}", status_row(container, data.stats.get(&container.id)));
    }

    Ok(())
}

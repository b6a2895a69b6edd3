//! Stats aggregation - one concurrent batch of snapshots per poll, reduced to
//! the CPU, memory and network figures the dashboard displays.

use humansize::{format_size, FormatSizeOptions, DECIMAL};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

use crate::integrations::docker::{
    with_timeout, ContainerSummary, GatewayError, RuntimeGateway, StatsSnapshot,
};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Memory usage in MB with its share of the limit
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MemoryUsage {
    pub usage_mb: f64,
    pub limit_mb: f64,
    pub percent: f64,
}

impl std::fmt::Display for MemoryUsage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:.1}MB / {:.1}MB ({:.1}%)",
            self.usage_mb, self.limit_mb, self.percent
        )
    }
}

/// Bytes received and sent since the container started
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkIo {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

impl std::fmt::Display for NetworkIo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let options = FormatSizeOptions::from(DECIMAL).decimal_places(1);
        write!(
            f,
            "↓ {} / ↑ {}",
            format_size(self.rx_bytes, options),
            format_size(self.tx_bytes, options)
        )
    }
}

/// Display-ready figures derived from a [`StatsSnapshot`]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DerivedMetrics {
    pub cpu_percent: f64,
    pub memory: MemoryUsage,
    pub network: NetworkIo,
}

impl DerivedMetrics {
    pub fn from_snapshot(snapshot: &StatsSnapshot) -> Self {
        Self {
            cpu_percent: cpu_percent(snapshot),
            memory: memory_usage(snapshot),
            network: NetworkIo {
                rx_bytes: snapshot.net_rx_bytes,
                tx_bytes: snapshot.net_tx_bytes,
            },
        }
    }

    pub fn cpu_label(&self) -> String {
        format!("{:.1}%", self.cpu_percent)
    }
}

/// Container list plus the stats gathered for its running members
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollData {
    pub containers: Vec<ContainerSummary>,
    pub stats: HashMap<String, DerivedMetrics>,
}

/// `(cpuDelta / systemDelta) * onlineCPUs * 100`, zero for any non-positive delta
pub fn cpu_percent(snapshot: &StatsSnapshot) -> f64 {
    let cpu_delta = snapshot.cpu_total_usage as f64 - snapshot.precpu_total_usage as f64;
    let system_delta = snapshot.system_cpu_usage as f64 - snapshot.presystem_cpu_usage as f64;

    if cpu_delta <= 0.0 || system_delta <= 0.0 {
        return 0.0;
    }

    // cgroups v2 hosts leave percpu_usage empty, so prefer online_cpus
    let num_cpus = snapshot
        .online_cpus
        .filter(|&n| n > 0)
        .unwrap_or(snapshot.percpu_count as u64)
        .max(1);

    let percent = (cpu_delta / system_delta) * num_cpus as f64 * 100.0;
    if percent.is_finite() {
        percent
    } else {
        0.0
    }
}

pub fn memory_usage(snapshot: &StatsSnapshot) -> MemoryUsage {
    let usage = snapshot.memory_usage as f64;
    let limit = snapshot.memory_limit as f64;

    let percent = if limit > 0.0 {
        (usage / limit) * 100.0
    } else {
        0.0
    };

    MemoryUsage {
        usage_mb: usage / BYTES_PER_MB,
        limit_mb: limit / BYTES_PER_MB,
        percent,
    }
}

pub fn running_ids(containers: &[ContainerSummary]) -> Vec<String> {
    containers
        .iter()
        .filter(|c| c.is_running())
        .map(|c| c.id.clone())
        .collect()
}

/// Fetch one snapshot per id concurrently and fold the successes into a map.
///
/// Each fetch runs as its own task bounded by `timeout`. A failed or timed out
/// fetch only drops that id from the result; the batch itself never fails.
pub async fn collect_stats(
    gateway: Arc<dyn RuntimeGateway>,
    ids: Vec<String>,
    timeout: Duration,
) -> HashMap<String, DerivedMetrics> {
    let mut batch = JoinSet::new();
    for id in ids {
        let gateway = Arc::clone(&gateway);
        batch.spawn(async move {
            let result = with_timeout(timeout, gateway.get_stats(&id)).await;
            (id, result)
        });
    }

    let mut stats = HashMap::new();
    while let Some(joined) = batch.join_next().await {
        match joined {
            Ok((id, Ok(snapshot))) => {
                stats.insert(id, DerivedMetrics::from_snapshot(&snapshot));
            }
            Ok((id, Err(err))) => {
                tracing::debug!(container = %id, error = %err, "stats fetch failed");
            }
            Err(err) => {
                tracing::warn!(error = %err, "stats task aborted");
            }
        }
    }
    stats
}

/// List containers, then gather stats for the running ones
pub async fn poll(
    gateway: Arc<dyn RuntimeGateway>,
    timeout: Duration,
) -> Result<PollData, GatewayError> {
    let containers = with_timeout(timeout, gateway.list_containers()).await?;
    let stats = collect_stats(gateway, running_ids(&containers), timeout).await;
    Ok(PollData { containers, stats })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::docker::{ContainerStatus, InspectDetail, MockRuntimeGateway};
    use pretty_assertions::assert_eq;

    const MB: u64 = 1024 * 1024;

    fn snapshot(cpu: (u64, u64), system: (u64, u64)) -> StatsSnapshot {
        StatsSnapshot {
            cpu_total_usage: cpu.1,
            precpu_total_usage: cpu.0,
            system_cpu_usage: system.1,
            presystem_cpu_usage: system.0,
            online_cpus: Some(1),
            percpu_count: 0,
            memory_usage: 50 * MB,
            memory_limit: 512 * MB,
            net_rx_bytes: 0,
            net_tx_bytes: 0,
        }
    }

    fn container(id: &str, status: ContainerStatus) -> ContainerSummary {
        ContainerSummary {
            id: id.to_string(),
            name: format!("{}-name", id),
            image: "alpine".to_string(),
            status,
            status_text: String::new(),
        }
    }

    #[test]
    fn cpu_percent_scales_by_online_cpus() {
        let mut s = snapshot((1_000, 1_125), (10_000, 11_000));
        assert_eq!(cpu_percent(&s), 12.5);

        s.online_cpus = Some(4);
        assert_eq!(cpu_percent(&s), 50.0);
    }

    #[test]
    fn cpu_percent_falls_back_to_percpu_entries() {
        let mut s = snapshot((0, 250), (0, 1_000));
        s.online_cpus = None;
        s.percpu_count = 2;
        assert_eq!(cpu_percent(&s), 50.0);
    }

    #[test]
    fn non_positive_deltas_yield_zero_cpu() {
        let cases = [
            ((100, 100), (0, 1_000)),
            ((200, 100), (0, 1_000)),
            ((0, 100), (1_000, 1_000)),
            ((0, 100), (2_000, 1_000)),
            ((0, 0), (0, 0)),
        ];
        for (cpu, system) in cases {
            assert_eq!(cpu_percent(&snapshot(cpu, system)), 0.0, "{:?}", (cpu, system));
        }
    }

    #[test]
    fn memory_formats_usage_limit_and_percent() {
        let metrics = DerivedMetrics::from_snapshot(&snapshot((0, 125), (0, 1_000)));
        assert_eq!(metrics.cpu_label(), "12.5%");
        assert_eq!(metrics.memory.to_string(), "50.0MB / 512.0MB (9.8%)");
    }

    #[test]
    fn network_counters_carry_into_metrics() {
        let mut s = snapshot((0, 125), (0, 1_000));
        s.net_rx_bytes = 1_500_000;
        s.net_tx_bytes = 2_048;

        let metrics = DerivedMetrics::from_snapshot(&s);
        assert_eq!(
            metrics.network,
            NetworkIo {
                rx_bytes: 1_500_000,
                tx_bytes: 2_048
            }
        );

        let label = metrics.network.to_string();
        assert!(label.starts_with("↓ 1.5 MB"), "{label}");
        assert!(label.contains(" / ↑ 2"), "{label}");
        assert!(label.to_lowercase().ends_with("kb"), "{label}");
    }

    #[test]
    fn zero_memory_limit_yields_zero_percent() {
        let mut s = snapshot((0, 0), (0, 0));
        s.memory_limit = 0;
        let memory = memory_usage(&s);
        assert_eq!(memory.percent, 0.0);
        assert_eq!(memory.to_string(), "50.0MB / 0.0MB (0.0%)");
    }

    #[tokio::test]
    async fn failed_fetch_is_omitted_from_batch() {
        let mut gateway = MockRuntimeGateway::new();
        gateway.expect_get_stats().returning(|id| {
            if id == "broken" {
                Err(GatewayError::Api("boom".to_string()))
            } else {
                Ok(snapshot((0, 125), (0, 1_000)))
            }
        });

        let ids = vec!["a".to_string(), "broken".to_string(), "b".to_string()];
        let stats = collect_stats(Arc::new(gateway), ids, Duration::from_secs(1)).await;

        assert_eq!(stats.len(), 2);
        assert!(stats.contains_key("a"));
        assert!(stats.contains_key("b"));
        assert!(!stats.contains_key("broken"));
    }

    /// Gateway whose stats call for one id never finishes in time
    struct StuckGateway {
        stuck: &'static str,
    }

    #[async_trait::async_trait]
    impl RuntimeGateway for StuckGateway {
        async fn ping(&self) -> Result<(), GatewayError> {
            Ok(())
        }

        async fn list_containers(&self) -> Result<Vec<ContainerSummary>, GatewayError> {
            Ok(Vec::new())
        }

        async fn get_stats(&self, id: &str) -> Result<StatsSnapshot, GatewayError> {
            if id == self.stuck {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
            Ok(snapshot((0, 125), (0, 1_000)))
        }

        async fn inspect(&self, id: &str) -> Result<InspectDetail, GatewayError> {
            Err(GatewayError::NotFound(id.to_string()))
        }

        async fn recent_logs(&self, id: &str, _tail: usize) -> Result<String, GatewayError> {
            Err(GatewayError::NotFound(id.to_string()))
        }

        async fn start(&self, _id: &str) -> Result<(), GatewayError> {
            Ok(())
        }

        async fn stop(&self, _id: &str, _timeout_secs: u32) -> Result<(), GatewayError> {
            Ok(())
        }

        async fn restart(&self, _id: &str, _timeout_secs: u32) -> Result<(), GatewayError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn hanging_fetch_is_dropped_without_stalling_batch() {
        let gateway = Arc::new(StuckGateway { stuck: "stuck" });
        let ids = vec!["a".to_string(), "stuck".to_string(), "b".to_string()];

        let started = std::time::Instant::now();
        let stats = collect_stats(gateway, ids, Duration::from_millis(50)).await;

        assert_eq!(stats.len(), 2);
        assert!(stats.contains_key("a"));
        assert!(stats.contains_key("b"));
        assert!(!stats.contains_key("stuck"));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn poll_only_fetches_running_containers() {
        let mut gateway = MockRuntimeGateway::new();
        gateway.expect_list_containers().returning(|| {
            Ok(vec![
                container("up", ContainerStatus::Running),
                container("down", ContainerStatus::Exited),
            ])
        });
        gateway
            .expect_get_stats()
            .withf(|id| id == "up")
            .times(1)
            .returning(|_| Ok(snapshot((0, 125), (0, 1_000))));

        let data = poll(Arc::new(gateway), Duration::from_secs(1))
            .await
            .expect("poll should succeed");

        assert_eq!(data.containers.len(), 2);
        assert_eq!(
            data.stats.keys().cloned().collect::<Vec<_>>(),
            vec!["up".to_string()]
        );
    }

    #[tokio::test]
    async fn poll_propagates_list_failure() {
        let mut gateway = MockRuntimeGateway::new();
        gateway
            .expect_list_containers()
            .returning(|| Err(GatewayError::Unreachable("socket closed".to_string())));

        let result = poll(Arc::new(gateway), Duration::from_secs(1)).await;
        assert!(matches!(result, Err(GatewayError::Unreachable(_))));
    }
}

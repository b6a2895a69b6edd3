//! Turns [`Command`]s into background tasks
//!
//! Every gateway call runs on its own task with a timeout and reports back
//! through the event channel. Nothing here touches [`AppState`].
//!
//! [`AppState`]: crate::core::state::AppState

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::DockerConfig;
use crate::core::events::{Command, ControlAction, Event};
use crate::integrations::docker::{with_timeout, RuntimeGateway};
use crate::integrations::stats;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    pub poll_interval: Duration,
    pub fetch_timeout: Duration,
    pub log_tail: usize,
    pub stop_timeout_secs: u32,
}

impl From<&DockerConfig> for SchedulerSettings {
    fn from(config: &DockerConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            fetch_timeout: config.fetch_timeout(),
            log_tail: config.log_tail,
            stop_timeout_secs: config.stop_timeout_secs,
        }
    }
}

pub struct Scheduler {
    gateway: Arc<dyn RuntimeGateway>,
    event_tx: mpsc::UnboundedSender<Event>,
    settings: SchedulerSettings,
}

impl Scheduler {
    pub fn new(
        gateway: Arc<dyn RuntimeGateway>,
        event_tx: mpsc::UnboundedSender<Event>,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            gateway,
            event_tx,
            settings,
        }
    }

    /// Spawn the work for one command and return immediately
    pub fn dispatch(&self, command: Command) {
        match command {
            Command::Poll { generation } => {
                let gateway = Arc::clone(&self.gateway);
                let tx = self.event_tx.clone();
                let timeout = self.settings.fetch_timeout;
                tokio::spawn(async move {
                    let result = stats::poll(gateway, timeout).await;
                    let _ = tx.send(Event::PollResult { generation, result });
                });
            }
            Command::ScheduleTick => {
                let tx = self.event_tx.clone();
                let interval = self.settings.poll_interval;
                tokio::spawn(async move {
                    tokio::time::sleep(interval).await;
                    let _ = tx.send(Event::Tick);
                });
            }
            Command::FetchDetails { id, generation } => {
                tracing::debug!(container = %id, generation, "fetching details");
                self.fetch_inspect(id.clone(), generation);
                self.fetch_logs(id, generation);
            }
            Command::Control { action, id } => {
                tracing::info!(container = %id, ?action, "control action requested");
                self.control(action, id);
            }
        }
    }

    fn fetch_inspect(&self, id: String, generation: u64) {
        let gateway = Arc::clone(&self.gateway);
        let tx = self.event_tx.clone();
        let timeout = self.settings.fetch_timeout;
        tokio::spawn(async move {
            let result = with_timeout(timeout, gateway.inspect(&id)).await;
            let _ = tx.send(Event::InspectResult { generation, result });
        });
    }

    fn fetch_logs(&self, id: String, generation: u64) {
        let gateway = Arc::clone(&self.gateway);
        let tx = self.event_tx.clone();
        let timeout = self.settings.fetch_timeout;
        let tail = self.settings.log_tail;
        tokio::spawn(async move {
            let result = with_timeout(timeout, gateway.recent_logs(&id, tail)).await;
            let _ = tx.send(Event::LogResult { generation, result });
        });
    }

    fn control(&self, action: ControlAction, id: String) {
        let gateway = Arc::clone(&self.gateway);
        let tx = self.event_tx.clone();
        let grace = self.settings.stop_timeout_secs;
        // The runtime itself waits up to `grace` before killing
        let timeout = self.settings.fetch_timeout + Duration::from_secs(u64::from(grace));
        tokio::spawn(async move {
            let call = async {
                match action {
                    ControlAction::Start => gateway.start(&id).await,
                    ControlAction::Stop => gateway.stop(&id, grace).await,
                    ControlAction::Restart => gateway.restart(&id, grace).await,
                }
            };
            let result = with_timeout(timeout, call).await;
            let _ = tx.send(Event::ControlResult { action, id, result });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::docker::{
        ContainerStatus, ContainerSummary, GatewayError, InspectDetail, MockRuntimeGateway,
    };
    use pretty_assertions::assert_eq;

    fn settings() -> SchedulerSettings {
        SchedulerSettings {
            poll_interval: Duration::from_millis(20),
            fetch_timeout: Duration::from_millis(200),
            log_tail: 50,
            stop_timeout_secs: 0,
        }
    }

    async fn next(rx: &mut mpsc::UnboundedReceiver<Event>) -> Event {
        match tokio::time::timeout(Duration::from_secs(2), rx.recv()).await {
            Ok(Some(event)) => event,
            other => panic!("no event received: {:?}", other.is_ok()),
        }
    }

    #[tokio::test]
    async fn poll_reports_result_with_generation() {
        let mut gateway = MockRuntimeGateway::new();
        gateway.expect_list_containers().returning(|| {
            Ok(vec![ContainerSummary {
                id: "abc".to_string(),
                name: "web".to_string(),
                image: "nginx".to_string(),
                status: ContainerStatus::Exited,
                status_text: String::new(),
            }])
        });
        let (tx, mut rx) = mpsc::unbounded_channel();
        let scheduler = Scheduler::new(Arc::new(gateway), tx, settings());

        scheduler.dispatch(Command::Poll { generation: 4 });

        match next(&mut rx).await {
            Event::PollResult { generation, result } => {
                assert_eq!(generation, 4);
                assert_eq!(result.map(|d| d.containers.len()), Ok(1));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn schedule_tick_fires_after_interval() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let scheduler = Scheduler::new(Arc::new(MockRuntimeGateway::new()), tx, settings());

        scheduler.dispatch(Command::ScheduleTick);
        assert!(matches!(next(&mut rx).await, Event::Tick));
    }

    #[tokio::test]
    async fn details_fetch_inspect_and_logs() {
        let mut gateway = MockRuntimeGateway::new();
        gateway.expect_inspect().returning(|id| {
            Ok(InspectDetail {
                id: id.to_string(),
                ..Default::default()
            })
        });
        gateway
            .expect_recent_logs()
            .withf(|id, tail| id == "abc" && *tail == 50)
            .returning(|_, _| Ok("hello\n".to_string()));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let scheduler = Scheduler::new(Arc::new(gateway), tx, settings());

        scheduler.dispatch(Command::FetchDetails {
            id: "abc".to_string(),
            generation: 9,
        });

        let mut saw_inspect = false;
        let mut saw_logs = false;
        for _ in 0..2 {
            match next(&mut rx).await {
                Event::InspectResult { generation, result } => {
                    assert_eq!(generation, 9);
                    assert_eq!(result.map(|d| d.id), Ok("abc".to_string()));
                    saw_inspect = true;
                }
                Event::LogResult { generation, result } => {
                    assert_eq!(generation, 9);
                    assert_eq!(result, Ok("hello\n".to_string()));
                    saw_logs = true;
                }
                other => panic!("unexpected event {:?}", other),
            }
        }
        assert!(saw_inspect && saw_logs);
    }

    #[tokio::test]
    async fn control_failure_is_reported_not_raised() {
        let mut gateway = MockRuntimeGateway::new();
        gateway
            .expect_stop()
            .withf(|id, grace| id == "deadbeef0000" && *grace == 0)
            .returning(|id, _| Err(GatewayError::NotFound(id.to_string())));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let scheduler = Scheduler::new(Arc::new(gateway), tx, settings());

        scheduler.dispatch(Command::Control {
            action: ControlAction::Stop,
            id: "deadbeef0000".to_string(),
        });

        match next(&mut rx).await {
            Event::ControlResult { action, id, result } => {
                assert_eq!(action, ControlAction::Stop);
                assert_eq!(id, "deadbeef0000");
                assert_eq!(result, Err(GatewayError::NotFound("deadbeef0000".to_string())));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn settings_follow_config() {
        let config = DockerConfig {
            poll_interval_ms: 2500,
            log_tail: 10,
            ..Default::default()
        };
        let settings = SchedulerSettings::from(&config);
        assert_eq!(settings.poll_interval, Duration::from_millis(2500));
        assert_eq!(settings.fetch_timeout, Duration::from_secs(5));
        assert_eq!(settings.log_tail, 10);
        assert_eq!(settings.stop_timeout_secs, 10);
    }
}

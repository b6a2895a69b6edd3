//! Application state machine
//!
//! [`AppState`] is owned by the event loop and only changes through
//! [`AppState::update`]. Async work is never performed here: transitions
//! return [`Command`]s that the scheduler turns into tasks, whose results come
//! back as further events.

use chrono::{DateTime, Utc};
use crossterm::event::KeyEvent;
use std::collections::HashMap;

use crate::config::Config;
use crate::core::events::{Command, ControlAction, Event, EventResult, Intent, KeyMap};
use crate::core::history::HistoryRing;
use crate::integrations::docker::{short_id, ContainerSummary, InspectDetail};
use crate::integrations::stats::{DerivedMetrics, PollData};
use crate::ui::layout::LayoutManager;
use crate::ui::text::sanitize;

/// Log lines moved per PageUp/PageDown when the terminal is below the minimum size
pub const PAGE_SIZE: usize = 10;

/// Which panel receives navigation keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivePanel {
    #[default]
    List,
    Logs,
}

impl ActivePanel {
    pub fn toggle(self) -> Self {
        match self {
            Self::List => Self::Logs,
            Self::Logs => Self::List,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Error,
}

/// One-line status, overwritten rather than queued
#[derive(Debug, Clone, PartialEq)]
pub struct StatusMessage {
    pub text: String,
    pub level: StatusLevel,
    pub set_at: DateTime<Utc>,
}

/// Recent log tail for the selected container
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogBuffer {
    lines: Vec<String>,
}

impl LogBuffer {
    pub fn new(raw: String) -> Self {
        let lines = raw
            .lines()
            .map(sanitize)
            .filter(|line| !line.trim().is_empty())
            .collect();
        Self { lines }
    }

    /// Non-blank lines, oldest first
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Outcome of one transition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transition {
    pub result: EventResult,
    pub commands: Vec<Command>,
}

impl Transition {
    fn none() -> Self {
        Self::default()
    }

    fn quit() -> Self {
        Self {
            result: EventResult::Quit,
            commands: Vec::new(),
        }
    }

    fn with(commands: Vec<Command>) -> Self {
        Self {
            result: EventResult::Continue,
            commands,
        }
    }
}

/// Main application state
#[derive(Debug, Clone)]
pub struct AppState {
    pub containers: Vec<ContainerSummary>,
    pub stats: HashMap<String, DerivedMetrics>,
    pub history: HistoryRing,
    pub cursor: usize,
    pub active_panel: ActivePanel,
    pub inspect: Option<InspectDetail>,
    pub logs: LogBuffer,
    /// 0 pins the newest line; larger values scroll toward older lines
    pub log_offset: usize,
    pub terminal_size: (u16, u16),
    pub status: Option<StatusMessage>,
    pub last_updated: Option<DateTime<Utc>>,

    keymap: KeyMap,
    status_ttl: Option<chrono::Duration>,
    poll_generation: u64,
    poll_in_flight: bool,
    detail_generation: u64,
    detail_target: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            containers: Vec::new(),
            stats: HashMap::new(),
            history: HistoryRing::default(),
            cursor: 0,
            active_panel: ActivePanel::List,
            inspect: None,
            logs: LogBuffer::default(),
            log_offset: 0,
            terminal_size: (80, 24),
            status: None,
            last_updated: None,
            keymap: KeyMap::default(),
            status_ttl: Some(chrono::Duration::seconds(5)),
            poll_generation: 0,
            poll_in_flight: false,
            detail_generation: 0,
            detail_target: None,
        }
    }
}

impl AppState {
    pub fn new(config: &Config, terminal_size: (u16, u16)) -> Self {
        let ttl = config.display.status_ttl_secs;
        Self {
            keymap: KeyMap::from_config(&config.keybindings),
            status_ttl: (ttl > 0).then(|| chrono::Duration::seconds(ttl as i64)),
            terminal_size,
            ..Self::default()
        }
    }

    pub fn selected(&self) -> Option<&ContainerSummary> {
        self.containers.get(self.cursor)
    }

    pub fn running_count(&self) -> usize {
        self.containers.iter().filter(|c| c.is_running()).count()
    }

    pub fn stopped_count(&self) -> usize {
        self.containers.len() - self.running_count()
    }

    pub fn set_status(&mut self, text: impl Into<String>, level: StatusLevel) {
        self.status = Some(StatusMessage {
            text: text.into(),
            level,
            set_at: Utc::now(),
        });
    }

    pub fn expire_status(&mut self, now: DateTime<Utc>) {
        let (Some(ttl), Some(status)) = (self.status_ttl, self.status.as_ref()) else {
            return;
        };
        if now.signed_duration_since(status.set_at) >= ttl {
            self.status = None;
        }
    }

    /// Apply one event. This is the only place state changes.
    pub fn update(&mut self, event: Event) -> Transition {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Resize(w, h) => {
                self.terminal_size = (w, h);
                Transition::none()
            }
            Event::Tick => self.handle_tick(),
            Event::PollResult { generation, result } => {
                if generation != self.poll_generation {
                    tracing::debug!(generation, current = self.poll_generation, "stale poll result");
                    return Transition::none();
                }
                self.poll_in_flight = false;

                let mut commands = vec![Command::ScheduleTick];
                match result {
                    Ok(data) => commands.extend(self.apply_poll(data)),
                    Err(err) => {
                        tracing::warn!(error = %err, "poll failed");
                        self.set_status(format!("Error: {}", err), StatusLevel::Error);
                    }
                }
                Transition::with(commands)
            }
            Event::InspectResult { generation, result } => {
                if self.is_stale_detail(generation) {
                    return Transition::none();
                }
                match result {
                    Ok(detail) => self.inspect = Some(detail),
                    Err(err) => {
                        tracing::warn!(error = %err, "inspect failed");
                        self.set_status(format!("Error: {}", err), StatusLevel::Error);
                    }
                }
                Transition::none()
            }
            Event::LogResult { generation, result } => {
                if self.is_stale_detail(generation) {
                    return Transition::none();
                }
                match result {
                    Ok(raw) => {
                        self.logs = LogBuffer::new(raw);
                        self.log_offset = 0;
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "log fetch failed");
                        self.set_status(format!("Error: {}", err), StatusLevel::Error);
                    }
                }
                Transition::none()
            }
            Event::ControlResult { action, id, result } => {
                match result {
                    Ok(()) => {
                        tracing::info!(container = %id, ?action, "control action completed");
                        self.set_status(
                            format!("{} {}", action.past(), short_id(&id)),
                            StatusLevel::Success,
                        );
                    }
                    Err(err) => {
                        tracing::warn!(container = %id, ?action, error = %err, "control action failed");
                        self.set_status(format!("Error: {}", err), StatusLevel::Error);
                    }
                }
                Transition::none()
            }
        }
    }

    fn handle_tick(&mut self) -> Transition {
        self.expire_status(Utc::now());

        if self.poll_in_flight {
            tracing::debug!("poll still in flight, skipping tick");
            return Transition::none();
        }
        self.poll_generation = self.poll_generation.wrapping_add(1);
        self.poll_in_flight = true;
        Transition::with(vec![Command::Poll {
            generation: self.poll_generation,
        }])
    }

    fn apply_poll(&mut self, data: PollData) -> Option<Command> {
        self.containers = data.containers;
        self.stats = data.stats;
        self.last_updated = Some(Utc::now());

        for container in &self.containers {
            if let Some(metrics) = self.stats.get(&container.id) {
                self.history.record(&container.id, metrics.cpu_percent);
            }
        }
        self.history
            .prune(self.containers.iter().map(|c| c.id.as_str()));

        if self.cursor >= self.containers.len() {
            self.cursor = 0;
        }

        let Some(selected) = self.selected() else {
            self.detail_target = None;
            self.inspect = None;
            self.logs = LogBuffer::default();
            self.log_offset = 0;
            return None;
        };

        // First poll, or the list shifted under the cursor
        if self.detail_target.as_deref() != Some(selected.id.as_str()) {
            return self.request_details();
        }
        None
    }

    fn handle_key(&mut self, key: KeyEvent) -> Transition {
        let Some(intent) = self.keymap.resolve(&key) else {
            return Transition::none();
        };

        match intent {
            Intent::Quit => Transition::quit(),
            Intent::Up => match self.active_panel {
                ActivePanel::List => self.move_cursor(-1),
                ActivePanel::Logs => {
                    self.log_offset = self.log_offset.saturating_sub(1);
                    Transition::none()
                }
            },
            Intent::Down => match self.active_panel {
                ActivePanel::List => self.move_cursor(1),
                ActivePanel::Logs => {
                    self.scroll_older(1);
                    Transition::none()
                }
            },
            Intent::PageUp => {
                self.log_offset = self.log_offset.saturating_sub(self.page_size());
                Transition::none()
            }
            Intent::PageDown => {
                self.scroll_older(self.page_size());
                Transition::none()
            }
            Intent::Newest => {
                self.log_offset = 0;
                Transition::none()
            }
            Intent::SwitchPanel => {
                self.active_panel = self.active_panel.toggle();
                if self.active_panel == ActivePanel::List {
                    self.log_offset = 0;
                }
                Transition::none()
            }
            Intent::Start => self.control(ControlAction::Start),
            Intent::Stop => self.control(ControlAction::Stop),
            Intent::Restart => self.control(ControlAction::Restart),
            Intent::Refresh => Transition::with(self.request_details().into_iter().collect()),
        }
    }

    fn move_cursor(&mut self, delta: isize) -> Transition {
        if self.containers.is_empty() {
            return Transition::none();
        }
        let last = self.containers.len() - 1;
        let next = self.cursor.saturating_add_signed(delta).min(last);
        if next == self.cursor {
            return Transition::none();
        }
        self.cursor = next;
        Transition::with(self.request_details().into_iter().collect())
    }

    /// One screenful of the logs panel at the current terminal size
    pub fn page_size(&self) -> usize {
        LayoutManager::log_rows(self.terminal_size)
            .filter(|&rows| rows > 0)
            .unwrap_or(PAGE_SIZE)
    }

    /// Oldest line stays on screen
    fn scroll_older(&mut self, lines: usize) {
        let max_offset = self.logs.len().saturating_sub(1);
        self.log_offset = self.log_offset.saturating_add(lines).min(max_offset);
    }

    fn control(&mut self, action: ControlAction) -> Transition {
        if self.active_panel != ActivePanel::List {
            return Transition::none();
        }
        let Some(id) = self.selected().map(|c| c.id.clone()) else {
            return Transition::none();
        };

        self.set_status(
            format!("{} {}...", action.progressive(), short_id(&id)),
            StatusLevel::Info,
        );
        Transition::with(vec![Command::Control { action, id }])
    }

    fn request_details(&mut self) -> Option<Command> {
        let id = self.selected()?.id.clone();
        if self.detail_target.as_deref() != Some(id.as_str()) {
            // Details always describe the selection, even if the fetch fails
            self.inspect = None;
            self.logs = LogBuffer::default();
            self.log_offset = 0;
        }
        self.detail_generation = self.detail_generation.wrapping_add(1);
        self.detail_target = Some(id.clone());
        Some(Command::FetchDetails {
            id,
            generation: self.detail_generation,
        })
    }

    fn is_stale_detail(&self, generation: u64) -> bool {
        let stale = generation != self.detail_generation;
        if stale {
            tracing::debug!(generation, current = self.detail_generation, "stale detail result");
        }
        stale
    }
}

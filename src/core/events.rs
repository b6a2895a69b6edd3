//! Event envelope, outbound commands and key resolution

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::sync::mpsc;

use crate::config::KeybindingsConfig;
use crate::integrations::docker::{GatewayError, InspectDetail};
use crate::integrations::stats::PollData;

/// Everything the event loop reacts to
#[derive(Debug, Clone)]
pub enum Event {
    // Input events
    Key(KeyEvent),
    Resize(u16, u16),

    // Poll timer, re-armed after every poll result
    Tick,

    // Async completion events
    PollResult {
        generation: u64,
        result: Result<PollData, GatewayError>,
    },
    InspectResult {
        generation: u64,
        result: Result<InspectDetail, GatewayError>,
    },
    LogResult {
        generation: u64,
        result: Result<String, GatewayError>,
    },
    ControlResult {
        action: ControlAction,
        id: String,
        result: Result<(), GatewayError>,
    },
}

/// Result of handling an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventResult {
    #[default]
    Continue,
    Quit,
}

/// Asynchronous work requested by a state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List containers and gather stats for the running ones
    Poll { generation: u64 },
    /// Send the next [`Event::Tick`] after the poll interval
    ScheduleTick,
    /// Inspect plus log tail for one container
    FetchDetails { id: String, generation: u64 },
    Control { action: ControlAction, id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    Start,
    Stop,
    Restart,
}

impl ControlAction {
    /// "Stopping", shown while the call is in flight
    pub fn progressive(self) -> &'static str {
        match self {
            Self::Start => "Starting",
            Self::Stop => "Stopping",
            Self::Restart => "Restarting",
        }
    }

    pub fn past(self) -> &'static str {
        match self {
            Self::Start => "Started",
            Self::Stop => "Stopped",
            Self::Restart => "Restarted",
        }
    }
}

pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
    pub fn new() -> (Self, mpsc::UnboundedSender<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { rx }, tx)
    }

    /// Start the terminal input source. Ticks come from the scheduler.
    pub fn spawn_sources(event_tx: mpsc::UnboundedSender<Event>) {
        tokio::spawn(Self::terminal_events(event_tx));
    }

    async fn terminal_events(tx: mpsc::UnboundedSender<Event>) {
        use crossterm::event::{self, Event as CrosstermEvent};
        use futures::StreamExt;

        let mut reader = event::EventStream::new();
        while let Some(event_result) = reader.next().await {
            let docktop_event = match event_result {
                // Windows reports releases too
                Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => Event::Key(key),
                Ok(CrosstermEvent::Resize(w, h)) => Event::Resize(w, h),
                Ok(_) => continue,
                Err(err) => {
                    tracing::warn!(error = %err, "terminal input stream failed");
                    break;
                }
            };
            if tx.send(docktop_event).is_err() {
                break;
            }
        }
    }

    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

/// What a key press means to the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Quit,
    Up,
    Down,
    PageUp,
    PageDown,
    Newest,
    SwitchPanel,
    Start,
    Stop,
    Restart,
    Refresh,
}

/// Key binding helper
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBinding {
    pub key: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub fn new(key: KeyCode) -> Self {
        Self {
            key,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn ctrl(key: KeyCode) -> Self {
        Self {
            key,
            modifiers: KeyModifiers::CONTROL,
        }
    }

    /// Parse strings such as `"q"`, `"ctrl+c"`, `"pagedown"` or `"f5"`
    pub fn parse(spec: &str) -> Option<Self> {
        let spec = spec.trim();
        if spec.is_empty() {
            return None;
        }
        // "+" on its own, or as the last part of "ctrl++"
        let (mods, key) = match spec.strip_suffix("++") {
            Some(prefix) => (prefix, "+"),
            None => match spec.rsplit_once('+') {
                Some((mods, key)) if !key.is_empty() => (mods, key),
                Some(_) => return None,
                None => ("", spec),
            },
        };

        let mut modifiers = KeyModifiers::NONE;
        for part in mods.split('+').filter(|p| !p.is_empty()) {
            modifiers |= match part.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => KeyModifiers::CONTROL,
                "alt" | "meta" => KeyModifiers::ALT,
                "shift" => KeyModifiers::SHIFT,
                _ => return None,
            };
        }

        let mut chars = key.chars();
        let code = match (chars.next(), chars.next()) {
            (Some(c), None) => KeyCode::Char(c),
            _ => match key.to_ascii_lowercase().as_str() {
                "enter" | "return" => KeyCode::Enter,
                "tab" => KeyCode::Tab,
                "backtab" => KeyCode::BackTab,
                "esc" | "escape" => KeyCode::Esc,
                "space" => KeyCode::Char(' '),
                "backspace" => KeyCode::Backspace,
                "delete" | "del" => KeyCode::Delete,
                "up" => KeyCode::Up,
                "down" => KeyCode::Down,
                "left" => KeyCode::Left,
                "right" => KeyCode::Right,
                "home" => KeyCode::Home,
                "end" => KeyCode::End,
                "pageup" | "pgup" => KeyCode::PageUp,
                "pagedown" | "pgdn" => KeyCode::PageDown,
                other => {
                    let n = other.strip_prefix('f')?.parse::<u8>().ok()?;
                    if !(1..=12).contains(&n) {
                        return None;
                    }
                    KeyCode::F(n)
                }
            },
        };

        Some(Self {
            key: code,
            modifiers,
        })
    }

    pub fn matches(&self, event: &KeyEvent) -> bool {
        let mut modifiers = event.modifiers;
        // Shift is already folded into the character itself
        if matches!(event.code, KeyCode::Char(_) | KeyCode::BackTab) {
            modifiers.remove(KeyModifiers::SHIFT);
        }
        event.code == self.key && modifiers == self.modifiers
    }
}

/// Resolves key presses to intents, built once from configuration
#[derive(Debug, Clone)]
pub struct KeyMap {
    bindings: Vec<(Intent, Vec<KeyBinding>)>,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self::from_config(&KeybindingsConfig::default())
    }
}

impl KeyMap {
    pub fn from_config(config: &KeybindingsConfig) -> Self {
        let defaults = KeybindingsConfig::default();
        let table = [
            (Intent::Quit, &config.quit, &defaults.quit),
            (Intent::Up, &config.up, &defaults.up),
            (Intent::Down, &config.down, &defaults.down),
            (Intent::PageUp, &config.page_up, &defaults.page_up),
            (Intent::PageDown, &config.page_down, &defaults.page_down),
            (Intent::Newest, &config.newest, &defaults.newest),
            (Intent::SwitchPanel, &config.switch_panel, &defaults.switch_panel),
            (Intent::Start, &config.start, &defaults.start),
            (Intent::Stop, &config.stop, &defaults.stop),
            (Intent::Restart, &config.restart, &defaults.restart),
            (Intent::Refresh, &config.refresh, &defaults.refresh),
        ];

        let bindings = table
            .into_iter()
            .map(|(intent, configured, fallback)| {
                let parsed = parse_all(configured);
                if parsed.len() == configured.len() && !parsed.is_empty() {
                    (intent, parsed)
                } else {
                    tracing::warn!(
                        ?intent,
                        keys = ?configured,
                        "invalid key binding, using defaults"
                    );
                    (intent, parse_all(fallback))
                }
            })
            .collect();

        Self { bindings }
    }

    pub fn resolve(&self, event: &KeyEvent) -> Option<Intent> {
        self.bindings
            .iter()
            .find(|(_, keys)| keys.iter().any(|k| k.matches(event)))
            .map(|(intent, _)| *intent)
    }
}

fn parse_all(keys: &[String]) -> Vec<KeyBinding> {
    keys.iter().filter_map(|k| KeyBinding::parse(k)).collect()
}

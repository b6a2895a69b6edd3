//! Main application orchestrator

use anyhow::Result;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::Stdout;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Once};

use crate::config::Config;
use crate::core::events::{Event, EventHandler, EventResult};
use crate::core::scheduler::{Scheduler, SchedulerSettings};
use crate::core::state::AppState;
use crate::integrations::docker::RuntimeGateway;
use crate::ui::renderer::Renderer;
use crate::ui::theme::Theme;

/// Set once raw mode is on, cleared by the first restore
static TERMINAL_ACTIVE: AtomicBool = AtomicBool::new(false);
static PANIC_HOOK: Once = Once::new();

pub struct App {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    state: AppState,
    theme: Theme,
    gateway: Arc<dyn RuntimeGateway>,
    settings: SchedulerSettings,
}

impl App {
    pub fn new(config: &Config, gateway: Arc<dyn RuntimeGateway>) -> Result<Self> {
        let backend = CrosstermBackend::new(std::io::stdout());
        let terminal = Terminal::new(backend)?;

        let theme = Theme::from_name(&config.display.theme);
        tracing::info!(theme = %theme.name, "theme loaded");
        let size = crossterm::terminal::size().unwrap_or((0, 0));
        let state = AppState::new(config, size);

        Ok(Self {
            terminal,
            state,
            theme,
            gateway,
            settings: SchedulerSettings::from(&config.docker),
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        install_panic_hook();

        let result = match self.setup_terminal() {
            Ok(()) => self.event_loop().await,
            Err(err) => Err(err),
        };

        // Restore even when setup or the loop failed
        let restored = restore_terminal();
        result.and(restored)
    }

    fn setup_terminal(&mut self) -> Result<()> {
        crossterm::terminal::enable_raw_mode()?;
        TERMINAL_ACTIVE.store(true, Ordering::SeqCst);
        crossterm::execute!(
            std::io::stdout(),
            crossterm::terminal::EnterAlternateScreen,
            crossterm::cursor::Hide,
        )?;
        self.terminal.clear()?;
        Ok(())
    }

    async fn event_loop(&mut self) -> Result<()> {
        let (mut event_handler, event_tx) = EventHandler::new();
        EventHandler::spawn_sources(event_tx.clone());

        let scheduler = Scheduler::new(Arc::clone(&self.gateway), event_tx.clone(), self.settings);

        // First poll goes out immediately
        let _ = event_tx.send(Event::Tick);
        self.render()?;

        while let Some(event) = event_handler.next().await {
            let transition = self.state.update(event);
            for command in transition.commands {
                scheduler.dispatch(command);
            }
            if transition.result == EventResult::Quit {
                tracing::info!("quit requested");
                break;
            }
            self.render()?;
        }
        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        let state = &self.state;
        let theme = &self.theme;
        self.terminal.draw(|frame| {
            Renderer::render(frame, state, theme);
        })?;
        Ok(())
    }
}

/// Leave raw mode and the alternate screen. Only the first call after setup
/// touches the terminal.
fn restore_terminal() -> Result<()> {
    if !TERMINAL_ACTIVE.swap(false, Ordering::SeqCst) {
        return Ok(());
    }
    crossterm::terminal::disable_raw_mode()?;
    crossterm::execute!(
        std::io::stdout(),
        crossterm::terminal::LeaveAlternateScreen,
        crossterm::cursor::Show,
    )?;
    tracing::info!("terminal restored");
    Ok(())
}

/// Restore the terminal before the panic message is printed
fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = restore_terminal();
            previous(info);
        }));
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restore_without_setup_is_a_noop() {
        assert!(!TERMINAL_ACTIVE.load(Ordering::SeqCst));
        assert!(restore_terminal().is_ok());
        assert!(restore_terminal().is_ok());
        assert!(!TERMINAL_ACTIVE.load(Ordering::SeqCst));
    }
}

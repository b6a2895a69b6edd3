//! Footer widget: status line above the keybinding help

use ratatui::{buffer::Buffer, layout::Rect, text::Span, widgets::Widget};

use crate::core::state::AppState;
use crate::ui::text::truncate;
use crate::ui::theme::Theme;

pub const HELP: &str =
    "j/k: Nav • Tab: Switch Panel • u: Start • s: Stop • r: Restart • Enter: Refresh • q: Quit";

pub struct Footer<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> Footer<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }
}

impl<'a> Widget for Footer<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 {
            return;
        }
        buf.set_style(area, self.theme.styles.footer);
        let cols = area.width as usize;

        let help_y = area.bottom() - 1;
        let help = Span::styled(truncate(HELP, cols), self.theme.styles.keybind);
        buf.set_span(area.x, help_y, &help, area.width);

        if area.height < 2 {
            return;
        }
        if let Some(status) = &self.state.status {
            let span = Span::styled(
                truncate(&status.text, cols),
                self.theme.status_level(status.level),
            );
            buf.set_span(area.x, area.y, &span, area.width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::StatusLevel;
    use crate::ui::text::width;

    fn row(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf[(x, y)].symbol().to_string())
            .collect()
    }

    #[test]
    fn help_is_truncated_with_ellipsis() {
        let state = AppState::default();
        let theme = Theme::default();
        let area = Rect::new(0, 0, 40, 2);
        let mut buf = Buffer::empty(area);
        Footer::new(&state, &theme).render(area, &mut buf);

        let help = row(&buf, 1);
        assert!(help.ends_with('…'), "{help}");
        assert!(help.starts_with("j/k: Nav"));
        assert_eq!(width(&help), 40);
    }

    #[test]
    fn status_sits_above_help() {
        let mut state = AppState::default();
        state.set_status("Stopping deadbeef...", StatusLevel::Info);
        let theme = Theme::default();
        let area = Rect::new(0, 0, 100, 2);
        let mut buf = Buffer::empty(area);
        Footer::new(&state, &theme).render(area, &mut buf);

        assert_eq!(row(&buf, 0).trim_end(), "Stopping deadbeef...");
        assert_eq!(row(&buf, 1).trim_end(), HELP);
    }
}

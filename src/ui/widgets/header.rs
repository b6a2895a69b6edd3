//! Header widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::Widget,
};

use crate::core::state::AppState;
use crate::ui::text::{truncate, width};
use crate::ui::theme::Theme;

const BADGE: &str = " DOCKTOP ";

pub struct Header<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> Header<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }
}

impl<'a> Widget for Header<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, self.theme.styles.header);

        let mut counts = format!(
            "Running: {} | Stopped: {}",
            self.state.running_count(),
            self.state.stopped_count()
        );
        if let Some(updated) = self.state.last_updated {
            let local = updated.with_timezone(&chrono::Local);
            counts = format!("{} | {}", counts, local.format("%H:%M:%S"));
        }
        let counts = format!("{} ", counts);

        let total = area.width as usize;
        let badge = truncate(BADGE, total);
        let right = truncate(&counts, total.saturating_sub(width(&badge)));
        let spacer = total.saturating_sub(width(&badge) + width(&right));

        let line = Line::from(vec![
            Span::styled(badge, self.theme.styles.header_badge),
            Span::raw(" ".repeat(spacer)),
            Span::styled(right, self.theme.styles.header),
        ]);
        buf.set_line(area.x, area.y, &line, area.width);
    }
}

//! Logs panel: newest line first, status bar pinned to the bottom edge

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::Span,
    widgets::{Block, Borders, Widget},
};

use crate::core::state::{ActivePanel, AppState};
use crate::ui::text::{fit, truncate};
use crate::ui::theme::Theme;

pub struct LogsPanel<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> LogsPanel<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }
}

/// Lines shown for `offset`, newest first. Offsets past the oldest line
/// produce an empty window.
pub fn visible_window(lines: &[String], offset: usize, rows: usize) -> Vec<&str> {
    let Some(newest) = offset
        .checked_add(1)
        .and_then(|skip| lines.len().checked_sub(skip))
    else {
        return Vec::new();
    };
    lines[..=newest]
        .iter()
        .rev()
        .take(rows)
        .map(String::as_str)
        .collect()
}

impl<'a> Widget for LogsPanel<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let focused = self.state.active_panel == ActivePanel::Logs;
        let border_style = if focused {
            self.theme.styles.panel_border_focused
        } else {
            self.theme.styles.panel_border
        };

        let block = Block::default()
            .title(Span::styled(" LOGS ", self.theme.styles.panel_title))
            .borders(Borders::ALL)
            .border_style(border_style)
            .style(Style::default().bg(self.theme.colors.bg_primary));

        let inner = block.inner(area);
        block.render(area, buf);
        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let logs = &self.state.logs;
        let cols = inner.width as usize;

        if logs.is_empty() {
            let span = Span::styled(truncate("No logs available.", cols), self.theme.styles.placeholder);
            buf.set_span(inner.x, inner.y, &span, inner.width);
            return;
        }

        let rows = inner.height.saturating_sub(1) as usize;
        let window = visible_window(logs.lines(), self.state.log_offset, rows);
        for (i, line) in window.iter().enumerate() {
            let span = Span::styled(fit(line, cols), self.theme.styles.log_line);
            buf.set_span(inner.x, inner.y + i as u16, &span, inner.width);
        }

        // Rows between the window and the status bar stay blank
        let status = format!(
            " Total: {} | Offset: {} (↓ Older / ↑ Newer) ",
            logs.len(),
            self.state.log_offset
        );
        let span = Span::styled(fit(&status, cols), self.theme.styles.log_status);
        buf.set_span(inner.x, inner.bottom() - 1, &span, inner.width);
    }
}

//! Container list panel

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

use crate::core::state::{ActivePanel, AppState};
use crate::integrations::docker::ContainerSummary;
use crate::ui::text::fit;
use crate::ui::theme::Theme;

pub struct ContainerPanel<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> ContainerPanel<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    fn render_container_row(
        &self,
        container: &ContainerSummary,
        selected: bool,
        width: u16,
    ) -> Line<'a> {
        let base_style = if selected {
            self.theme.styles.list_item_selected
        } else {
            self.theme.styles.list_item
        };
        let indicator = if selected { "│" } else { " " };

        // indicator, space, glyph, space
        let name = fit(&container.name, width.saturating_sub(4) as usize);

        Line::from(vec![
            Span::styled(indicator, base_style.fg(self.theme.colors.accent_primary)),
            Span::styled(" ", base_style),
            Span::styled(
                container.status.glyph(),
                base_style.patch(self.theme.container_status(&container.status)),
            ),
            Span::styled(" ", base_style),
            Span::styled(name, base_style),
        ])
    }
}

/// First visible row so that `cursor` stays inside a window of `height` rows
pub fn window_start(cursor: usize, height: usize) -> usize {
    if height == 0 || cursor < height {
        0
    } else {
        cursor - height + 1
    }
}

impl<'a> Widget for ContainerPanel<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let focused = self.state.active_panel == ActivePanel::List;
        let border_style = if focused {
            self.theme.styles.panel_border_focused
        } else {
            self.theme.styles.panel_border
        };

        let block = Block::default()
            .title(Span::styled(" CONTAINERS ", self.theme.styles.panel_title))
            .borders(Borders::ALL)
            .border_style(border_style)
            .style(Style::default().bg(self.theme.colors.bg_primary));

        let inner = block.inner(area);
        block.render(area, buf);

        let containers = &self.state.containers;
        if containers.is_empty() {
            let span = Span::styled("No containers", self.theme.styles.placeholder);
            buf.set_span(inner.x + 1, inner.y, &span, inner.width.saturating_sub(2));
            return;
        }

        let height = inner.height as usize;
        let start = window_start(self.state.cursor, height);

        for (row, (i, container)) in containers
            .iter()
            .enumerate()
            .skip(start)
            .take(height)
            .enumerate()
        {
            let line = self.render_container_row(container, i == self.state.cursor, inner.width);
            buf.set_line(inner.x, inner.y + row as u16, &line, inner.width);
        }
    }
}

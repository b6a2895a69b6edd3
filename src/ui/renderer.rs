//! Main UI renderer

use ratatui::{widgets::Block, Frame};

use crate::core::state::AppState;
use crate::ui::layout::{LayoutManager, LayoutPlan};
use crate::ui::theme::Theme;
use crate::ui::widgets::*;

pub struct Renderer;

impl Renderer {
    /// Draw one frame. Reads state, never changes it.
    pub fn render(frame: &mut Frame, state: &AppState, theme: &Theme) {
        let area = frame.area();

        // Clear background
        frame.render_widget(
            Block::default().style(ratatui::style::Style::default().bg(theme.colors.bg_primary)),
            area,
        );

        let layout = match LayoutManager::compute(area) {
            LayoutPlan::TooSmall(area) => {
                frame.render_widget(TooSmall::new(theme), area);
                return;
            }
            LayoutPlan::Dashboard(layout) => layout,
        };

        frame.render_widget(Header::new(state, theme), layout.header);
        frame.render_widget(ContainerPanel::new(state, theme), layout.list_panel);
        frame.render_widget(DetailPanel::new(state, theme), layout.detail_panel);
        frame.render_widget(LogsPanel::new(state, theme), layout.logs_panel);
        frame.render_widget(Footer::new(state, theme), layout.footer);
    }
}

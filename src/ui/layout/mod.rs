//! Layout management system
//!
//! The dashboard geometry is fixed: header row, body, two footer rows. The
//! body splits into the container list (left) and a detail block stacked on
//! the logs block (right).

use ratatui::layout::{Constraint, Direction, Layout, Rect};

pub const MIN_WIDTH: u16 = 80;
pub const MIN_HEIGHT: u16 = 24;
pub const HEADER_HEIGHT: u16 = 1;
/// Status line plus key help
pub const FOOTER_HEIGHT: u16 = 2;
pub const DETAIL_HEIGHT: u16 = 10;
pub const LIST_WIDTH_PERCENT: u16 = 35;

/// Computed layout rects for all panels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComputedLayout {
    pub header: Rect,
    pub footer: Rect,
    pub list_panel: Rect,
    pub detail_panel: Rect,
    pub logs_panel: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutPlan {
    /// Below the minimum size only a warning is drawn over the whole area
    TooSmall(Rect),
    Dashboard(ComputedLayout),
}

pub struct LayoutManager;

impl LayoutManager {
    pub fn compute(area: Rect) -> LayoutPlan {
        if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
            return LayoutPlan::TooSmall(area);
        }

        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(HEADER_HEIGHT),
                Constraint::Min(0),
                Constraint::Length(FOOTER_HEIGHT),
            ])
            .split(area);

        // Integer share so the two columns always sum to the full width
        let list_width = area.width * LIST_WIDTH_PERCENT / 100;
        let body_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(list_width), Constraint::Min(0)])
            .split(main_chunks[1]);

        let right_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(DETAIL_HEIGHT), Constraint::Min(0)])
            .split(body_chunks[1]);

        LayoutPlan::Dashboard(ComputedLayout {
            header: main_chunks[0],
            footer: main_chunks[2],
            list_panel: body_chunks[0],
            detail_panel: right_chunks[0],
            logs_panel: right_chunks[1],
        })
    }

    /// Log lines the logs panel shows at `size`, `None` below the minimum.
    /// Borders take two rows and the status bar one.
    pub fn log_rows(size: (u16, u16)) -> Option<usize> {
        match Self::compute(Rect::new(0, 0, size.0, size.1)) {
            LayoutPlan::Dashboard(layout) => Some(layout.logs_panel.height.saturating_sub(3) as usize),
            LayoutPlan::TooSmall(_) => None,
        }
    }
}

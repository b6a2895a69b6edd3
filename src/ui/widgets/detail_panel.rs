//! Detail block for the inspected container

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

use crate::core::state::AppState;
use crate::integrations::docker::{short_id, InspectDetail};
use crate::ui::text::truncate;
use crate::ui::theme::Theme;

const LABEL_WIDTH: usize = 7;
const SEPARATOR: &str = " : ";
const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

pub struct DetailPanel<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> DetailPanel<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    /// Label/value pairs, `None` values render as the placeholder
    fn rows(&self, detail: &InspectDetail) -> Vec<(&'static str, Option<String>, &'static str)> {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());

        let metrics = self.state.stats.get(&detail.id);
        let (cpu, memory) = metrics
            .map(|m| (m.cpu_label(), m.memory.to_string()))
            .unwrap_or_else(|| ("0%".to_string(), "0MB".to_string()));

        let id = match (short_id(&detail.id), detail.name.as_str()) {
            ("", _) => None,
            (id, "") => Some(id.to_string()),
            (id, name) => Some(format!("{} ({})", id, name)),
        };

        vec![
            ("ID", id, "Unknown"),
            ("Image", non_empty(&detail.image), "Unknown"),
            ("State", detail.state.clone(), "Unknown"),
            ("IP", detail.ip_address.clone(), "N/A"),
            (
                "Ports",
                (!detail.ports.is_empty()).then(|| detail.ports.join(", ")),
                "N/A",
            ),
            ("CPU/Mem", Some(format!("{} / {}", cpu, memory)), ""),
            ("Net", metrics.map(|m| m.network.to_string()), "N/A"),
        ]
    }
}

/// One bar per sample, scaled against 100% or the peak if higher
pub fn sparkline(samples: &[f64], width: usize) -> String {
    let recent = &samples[samples.len().saturating_sub(width)..];
    let peak = recent.iter().copied().fold(100.0_f64, f64::max);
    recent
        .iter()
        .map(|&v| {
            let idx = ((v.max(0.0) / peak) * 7.0).round() as usize;
            BARS[idx.min(7)]
        })
        .collect()
}

impl<'a> Widget for DetailPanel<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(Span::styled(" DETAILS ", self.theme.styles.panel_title))
            .borders(Borders::ALL)
            .border_style(self.theme.styles.panel_border)
            .style(Style::default().bg(self.theme.colors.bg_primary));

        let inner = block.inner(area);
        block.render(area, buf);

        let Some(detail) = &self.state.inspect else {
            let span = Span::styled(
                truncate("Select a container to view details...", inner.width as usize),
                self.theme.styles.placeholder,
            );
            buf.set_span(inner.x, inner.y, &span, inner.width);
            return;
        };

        let value_width = (inner.width as usize).saturating_sub(LABEL_WIDTH + SEPARATOR.len());
        let mut y = inner.y;

        for (label, value, placeholder) in self.rows(detail) {
            if y >= inner.bottom() {
                return;
            }
            let value_span = match value {
                Some(v) => Span::styled(truncate(&v, value_width), self.theme.styles.value),
                None => Span::styled(placeholder, self.theme.styles.placeholder),
            };
            let line = Line::from(vec![
                Span::styled(format!("{:<width$}", label, width = LABEL_WIDTH), self.theme.styles.label),
                Span::styled(SEPARATOR, self.theme.styles.placeholder),
                value_span,
            ]);
            buf.set_line(inner.x, y, &line, inner.width);
            y += 1;
        }

        if y < inner.bottom() {
            let samples: Vec<f64> = self.state.history.samples(&detail.id).collect();
            let history = if samples.is_empty() {
                Span::styled("N/A", self.theme.styles.placeholder)
            } else {
                Span::styled(sparkline(&samples, value_width), self.theme.styles.sparkline)
            };
            let line = Line::from(vec![
                Span::styled(format!("{:<width$}", "History", width = LABEL_WIDTH), self.theme.styles.label),
                Span::styled(SEPARATOR, self.theme.styles.placeholder),
                history,
            ]);
            buf.set_line(inner.x, y, &line, inner.width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::stats::{DerivedMetrics, MemoryUsage, NetworkIo};
    use pretty_assertions::assert_eq;

    fn row(buf: &Buffer, y: u16) -> String {
        (buf.area.x..buf.area.right())
            .map(|x| buf[(x, y)].symbol().to_string())
            .collect()
    }

    fn render(state: &AppState, w: u16) -> Buffer {
        let theme = Theme::default();
        let area = Rect::new(0, 0, w, 10);
        let mut buf = Buffer::empty(area);
        DetailPanel::new(state, &theme).render(area, &mut buf);
        buf
    }

    #[test]
    fn nothing_inspected_shows_prompt() {
        let buf = render(&AppState::default(), 52);
        assert!(row(&buf, 1).contains("Select a container to view details..."));
    }

    #[test]
    fn selected_container_shows_cpu_and_memory() {
        let mut state = AppState::default();
        state.inspect = Some(InspectDetail {
            id: "abc123".to_string(),
            name: "web".to_string(),
            image: "nginx:latest".to_string(),
            state: Some("running".to_string()),
            ..Default::default()
        });
        state.stats.insert(
            "abc123".to_string(),
            DerivedMetrics {
                cpu_percent: 12.5,
                memory: MemoryUsage {
                    usage_mb: 50.0,
                    limit_mb: 512.0,
                    percent: 9.765625,
                },
                network: NetworkIo {
                    rx_bytes: 1_500_000,
                    tx_bytes: 0,
                },
            },
        );
        state.history.record("abc123", 12.5);

        let buf = render(&state, 52);
        assert_eq!(row(&buf, 1).trim_end_matches(['│', ' ']), "│ID      : abc123 (web)");
        assert!(row(&buf, 4).contains("IP      : N/A"));
        assert!(row(&buf, 5).contains("Ports   : N/A"));
        assert!(row(&buf, 6).contains("CPU/Mem : 12.5% / 50.0MB / 512.0MB (9.8%)"));
        assert!(row(&buf, 7).contains("Net     : ↓ 1.5 MB / ↑ "));
        assert!(row(&buf, 8).contains("History : ▂"));
    }

    #[test]
    fn missing_stats_use_placeholders() {
        let mut state = AppState::default();
        state.inspect = Some(InspectDetail {
            id: "fff000".to_string(),
            ..Default::default()
        });

        let buf = render(&state, 52);
        assert!(row(&buf, 1).contains("ID      : fff000"));
        assert!(row(&buf, 2).contains("Image   : Unknown"));
        assert!(row(&buf, 3).contains("State   : Unknown"));
        assert!(row(&buf, 6).contains("CPU/Mem : 0% / 0MB"));
        assert!(row(&buf, 7).contains("Net     : N/A"));
        assert!(row(&buf, 8).contains("History : N/A"));
    }

    #[test]
    fn long_image_is_truncated_to_panel() {
        let mut state = AppState::default();
        state.inspect = Some(InspectDetail {
            id: "abc".to_string(),
            image: "registry.example.com/team/very/deep/path/image:2024.10.01".to_string(),
            ..Default::default()
        });

        let buf = render(&state, 40);
        let image_row = row(&buf, 2);
        assert!(image_row.contains('…'), "{image_row}");
        assert!(image_row.ends_with('│'));
    }

    #[test]
    fn sparkline_scales_and_windows() {
        assert_eq!(sparkline(&[0.0, 50.0, 100.0], 10), "▁▅█");
        assert_eq!(sparkline(&[0.0, 100.0, 200.0], 10), "▁▅█");
        assert_eq!(sparkline(&[1.0, 2.0, 100.0], 1), "█");
        assert_eq!(sparkline(&[], 5), "");
    }
}

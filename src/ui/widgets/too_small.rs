//! Warning shown instead of the dashboard on undersized terminals

use ratatui::{buffer::Buffer, layout::Rect, text::Span, widgets::Widget};

use crate::ui::layout::{MIN_HEIGHT, MIN_WIDTH};
use crate::ui::text::{truncate, width};
use crate::ui::theme::Theme;

pub struct TooSmall<'a> {
    theme: &'a Theme,
}

impl<'a> TooSmall<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        Self { theme }
    }
}

impl<'a> Widget for TooSmall<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.is_empty() {
            return;
        }
        buf.set_style(area, self.theme.styles.placeholder);

        let lines = [
            "Terminal too small".to_string(),
            format!("Need {}x{}, have {}x{}", MIN_WIDTH, MIN_HEIGHT, area.width, area.height),
        ];
        let first_y = area.y + area.height.saturating_sub(lines.len() as u16) / 2;

        for (i, text) in lines.iter().enumerate() {
            let y = first_y + i as u16;
            if y >= area.bottom() {
                break;
            }
            let text = truncate(text, area.width as usize);
            let x = area.x + (area.width.saturating_sub(width(&text) as u16)) / 2;
            let style = if i == 0 {
                self.theme.styles.notification_error
            } else {
                self.theme.styles.placeholder
            };
            buf.set_span(x, y, &Span::styled(text, style), area.width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_is_centered() {
        let theme = Theme::default();
        let area = Rect::new(0, 0, 40, 10);
        let mut buf = Buffer::empty(area);
        TooSmall::new(&theme).render(area, &mut buf);

        let row: String = (0..40).map(|x| buf[(x, 4u16)].symbol().to_string()).collect();
        assert_eq!(row.trim(), "Terminal too small");
        assert_eq!(row.find('T'), Some(11));

        let row: String = (0..40).map(|x| buf[(x, 5u16)].symbol().to_string()).collect();
        assert_eq!(row.trim(), "Need 80x24, have 40x10");
    }

    #[test]
    fn tiny_area_does_not_panic() {
        let theme = Theme::default();
        let area = Rect::new(0, 0, 3, 1);
        let mut buf = Buffer::empty(area);
        TooSmall::new(&theme).render(area, &mut buf);
    }
}

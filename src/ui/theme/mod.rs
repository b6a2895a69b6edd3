//! Theme system
//!
//! A [`Theme`] is built once at startup and handed to the renderer by
//! reference; nothing mutates it afterwards.

use ratatui::style::{Color, Modifier, Style};

use crate::core::state::StatusLevel;
use crate::integrations::docker::ContainerStatus;

/// Complete theme definition
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,
    pub colors: ThemeColors,
    pub styles: ThemeStyles,
}

#[derive(Debug, Clone)]
pub struct ThemeColors {
    pub bg_primary: Color,
    pub bg_secondary: Color,

    pub fg_primary: Color,
    pub fg_muted: Color,

    pub accent_primary: Color,
    pub accent_secondary: Color,

    // Semantic colors
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,

    pub border: Color,
    pub border_focused: Color,
    pub selection: Color,
}

#[derive(Debug, Clone)]
pub struct ThemeStyles {
    pub header: Style,
    pub header_badge: Style,
    pub footer: Style,
    pub panel_title: Style,
    pub panel_border: Style,
    pub panel_border_focused: Style,
    pub list_item: Style,
    pub list_item_selected: Style,
    pub status_running: Style,
    pub status_stopped: Style,
    pub status_warning: Style,
    pub label: Style,
    pub value: Style,
    pub placeholder: Style,
    pub sparkline: Style,
    pub log_line: Style,
    pub log_status: Style,
    pub keybind: Style,
    pub notification_info: Style,
    pub notification_success: Style,
    pub notification_error: Style,
}

impl Theme {
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "tokyo-night" | "tokyo_night" | "tokyonight" => Self::tokyo_night(),
            "catppuccin" | "catppuccin-mocha" => Self::catppuccin_mocha(),
            "monochrome" | "mono" => Self::monochrome(),
            other => {
                tracing::warn!(theme = other, "unknown theme, using monochrome");
                Self::monochrome()
            }
        }
    }

    /// Grey scale palette that works on any 256-color terminal (default)
    pub fn monochrome() -> Self {
        let colors = ThemeColors {
            bg_primary: Color::Reset,
            bg_secondary: Color::Indexed(236),

            fg_primary: Color::Indexed(252),
            fg_muted: Color::Indexed(244),

            accent_primary: Color::Indexed(255),
            accent_secondary: Color::Indexed(250),

            success: Color::Indexed(255),
            warning: Color::Indexed(248),
            error: Color::Indexed(203),
            info: Color::Indexed(250),

            border: Color::Indexed(240),
            border_focused: Color::Indexed(255),
            selection: Color::Indexed(238),
        };

        Self::from_colors("Monochrome", colors)
    }

    pub fn tokyo_night() -> Self {
        let colors = ThemeColors {
            bg_primary: Color::Rgb(26, 27, 38),
            bg_secondary: Color::Rgb(36, 40, 59),

            fg_primary: Color::Rgb(192, 202, 245),
            fg_muted: Color::Rgb(86, 95, 137),

            accent_primary: Color::Rgb(122, 162, 247),
            accent_secondary: Color::Rgb(187, 154, 247),

            success: Color::Rgb(158, 206, 106),
            warning: Color::Rgb(224, 175, 104),
            error: Color::Rgb(247, 118, 142),
            info: Color::Rgb(125, 207, 255),

            border: Color::Rgb(41, 46, 66),
            border_focused: Color::Rgb(122, 162, 247),
            selection: Color::Rgb(52, 59, 88),
        };

        Self::from_colors("Tokyo Night", colors)
    }

    pub fn catppuccin_mocha() -> Self {
        let colors = ThemeColors {
            bg_primary: Color::Rgb(30, 30, 46),
            bg_secondary: Color::Rgb(49, 50, 68),

            fg_primary: Color::Rgb(205, 214, 244),
            fg_muted: Color::Rgb(147, 153, 178),

            accent_primary: Color::Rgb(137, 180, 250),
            accent_secondary: Color::Rgb(203, 166, 247),

            success: Color::Rgb(166, 227, 161),
            warning: Color::Rgb(249, 226, 175),
            error: Color::Rgb(243, 139, 168),
            info: Color::Rgb(148, 226, 213),

            border: Color::Rgb(69, 71, 90),
            border_focused: Color::Rgb(137, 180, 250),
            selection: Color::Rgb(88, 91, 112),
        };

        Self::from_colors("Catppuccin Mocha", colors)
    }

    fn from_colors(name: &str, colors: ThemeColors) -> Self {
        let styles = ThemeStyles {
            header: Style::default().bg(colors.bg_secondary).fg(colors.fg_primary),
            header_badge: Style::default()
                .bg(colors.accent_primary)
                .fg(colors.bg_secondary)
                .add_modifier(Modifier::BOLD),
            footer: Style::default().fg(colors.fg_muted),
            panel_title: Style::default()
                .fg(colors.accent_primary)
                .add_modifier(Modifier::BOLD),
            panel_border: Style::default().fg(colors.border),
            panel_border_focused: Style::default().fg(colors.border_focused),
            list_item: Style::default().fg(colors.fg_primary),
            list_item_selected: Style::default()
                .fg(colors.fg_primary)
                .bg(colors.selection)
                .add_modifier(Modifier::BOLD),
            status_running: Style::default().fg(colors.success),
            status_stopped: Style::default().fg(colors.error),
            status_warning: Style::default().fg(colors.warning),
            label: Style::default()
                .fg(colors.accent_secondary)
                .add_modifier(Modifier::BOLD),
            value: Style::default().fg(colors.fg_primary),
            placeholder: Style::default().fg(colors.fg_muted),
            sparkline: Style::default().fg(colors.accent_primary),
            log_line: Style::default().fg(colors.fg_primary),
            log_status: Style::default().bg(colors.bg_secondary).fg(colors.fg_muted),
            keybind: Style::default().fg(colors.fg_muted),
            notification_info: Style::default().fg(colors.info),
            notification_success: Style::default().fg(colors.success),
            notification_error: Style::default()
                .fg(colors.error)
                .add_modifier(Modifier::BOLD),
        };

        Self {
            name: name.to_string(),
            colors,
            styles,
        }
    }

    pub fn container_status(&self, status: &ContainerStatus) -> Style {
        match status {
            ContainerStatus::Running => self.styles.status_running,
            ContainerStatus::Exited | ContainerStatus::Dead => self.styles.status_stopped,
            _ => self.styles.status_warning,
        }
    }

    pub fn status_level(&self, level: StatusLevel) -> Style {
        match level {
            StatusLevel::Info => self.styles.notification_info,
            StatusLevel::Success => self.styles.notification_success,
            StatusLevel::Error => self.styles.notification_error,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::monochrome()
    }
}

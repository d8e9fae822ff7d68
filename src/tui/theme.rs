//! Theme module for centralized color and style definitions

use ratatui::style::{Color, Modifier, Style};

use crate::logger::LogLevel;

/// Application theme with all color definitions
#[derive(Debug, Clone)]
pub struct Theme {
    // === Levels ===
    pub level_debug: Color,
    pub level_info: Color,
    pub level_warn: Color,
    pub level_error: Color,

    // === UI Elements ===
    /// Primary accent color (headers, titles)
    pub accent: Color,
    /// Text color for normal content
    pub text: Color,
    /// Text color for muted/secondary content (timestamps, hints)
    pub text_muted: Color,
    /// Logger name badge
    pub logger_name: Color,
    /// Background of the selected row
    pub selected_bg: Color,
    /// Color for input prompts
    pub input_prompt: Color,

    // === Banners ===
    pub error_bg: Color,
    pub error_fg: Color,

    // === Borders ===
    pub border: Color,
    pub border_focused: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    /// Dark theme (default)
    pub fn dark() -> Self {
        Self {
            level_debug: Color::DarkGray,
            level_info: Color::Blue,
            level_warn: Color::Yellow,
            level_error: Color::Red,

            accent: Color::Cyan,
            text: Color::White,
            text_muted: Color::DarkGray,
            logger_name: Color::Magenta,
            selected_bg: Color::Rgb(40, 40, 60),
            input_prompt: Color::Magenta,

            error_bg: Color::Red,
            error_fg: Color::White,

            border: Color::White,
            border_focused: Color::Cyan,
        }
    }

    /// Get the color for a log level
    pub fn level_color(&self, level: LogLevel) -> Color {
        match level {
            LogLevel::Debug => self.level_debug,
            LogLevel::Info => self.level_info,
            LogLevel::Warn => self.level_warn,
            LogLevel::Error => self.level_error,
        }
    }

    // === Style Builders ===

    /// Style for headers/titles
    pub fn header_style(&self) -> Style {
        Style::default().fg(self.accent).add_modifier(Modifier::BOLD)
    }

    /// Style for muted text
    pub fn muted_style(&self) -> Style {
        Style::default().fg(self.text_muted)
    }

    /// Bold level badge
    pub fn level_style(&self, level: LogLevel) -> Style {
        Style::default()
            .fg(self.level_color(level))
            .add_modifier(Modifier::BOLD)
    }

    /// Message text; warnings and errors take their level color
    pub fn message_style(&self, level: LogLevel) -> Style {
        if level.is_alert() {
            Style::default().fg(self.level_color(level))
        } else {
            Style::default().fg(self.text)
        }
    }

    /// Style for input prompts
    pub fn input_style(&self) -> Style {
        Style::default().fg(self.input_prompt)
    }

    /// Style for error banners
    pub fn error_banner_style(&self) -> Style {
        Style::default().fg(self.error_fg).bg(self.error_bg)
    }

    /// Border style depending on focus
    pub fn border_style(&self, focused: bool) -> Style {
        let color = if focused {
            self.border_focused
        } else {
            self.border
        };
        Style::default().fg(color)
    }
}

/// Global theme instance
static THEME: std::sync::OnceLock<Theme> = std::sync::OnceLock::new();

/// Get the current theme
pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::default)
}

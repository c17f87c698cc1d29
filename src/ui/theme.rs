//! Theme configuration

use iced::widget::container;
use iced::{Background, Border, Color, Theme};

/// Dark theme colors
pub struct DarkTheme;

impl DarkTheme {
    pub const BACKGROUND: Color = Color::from_rgb(0.09, 0.09, 0.11);
    pub const SURFACE: Color = Color::from_rgb(0.12, 0.12, 0.14);
    pub const BORDER: Color = Color::from_rgb(0.25, 0.25, 0.28);
    pub const PRIMARY: Color = Color::from_rgb(0.4, 0.55, 1.0);
    pub const TEXT: Color = Color::from_rgb(0.95, 0.95, 0.95);
    pub const TEXT_MUTED: Color = Color::from_rgb(0.55, 0.55, 0.6);
    pub const TEXT_PLACEHOLDER: Color = Color::from_rgb(0.4, 0.4, 0.45);
    pub const ERROR: Color = Color::from_rgb(0.95, 0.45, 0.45);
    pub const ERROR_SURFACE: Color = Color::from_rgb(0.25, 0.1, 0.1);
}

/// Rounded panel used for cards, the answer and the settings form.
pub fn panel(_theme: &Theme) -> container::Style {
    container::Style {
        background: Some(Background::Color(DarkTheme::SURFACE)),
        border: Border {
            color: DarkTheme::BORDER,
            width: 1.0,
            radius: 12.0.into(),
        },
        ..Default::default()
    }
}

pub fn error_banner(_theme: &Theme) -> container::Style {
    container::Style {
        background: Some(Background::Color(DarkTheme::ERROR_SURFACE)),
        border: Border {
            color: DarkTheme::ERROR,
            width: 1.0,
            radius: 8.0.into(),
        },
        ..Default::default()
    }
}

pub fn window(_theme: &Theme) -> container::Style {
    container::Style {
        background: Some(Background::Color(DarkTheme::BACKGROUND)),
        ..Default::default()
    }
}

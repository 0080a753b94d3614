use iced::{Background, Border, Color, Theme, Vector};

use statusboard_core::ItemState;

pub(crate) fn heading_color() -> Color {
    Color::from_rgb8(0x10, 0x1a, 0x24)
}

pub(crate) fn muted_color() -> Color {
    Color::from_rgb8(0x5f, 0x6b, 0x7a)
}

pub(crate) fn error_color() -> Color {
    Color::from_rgb8(0xe0, 0x4f, 0x4f)
}

pub(crate) fn state_color(state: ItemState) -> Color {
    match state {
        ItemState::Connecting => Color::from_rgb8(0x9c, 0xa3, 0xaf),
        ItemState::Online => Color::from_rgb8(0x22, 0xa0, 0x5a),
        ItemState::Offline => Color::from_rgb8(0xe0, 0x4f, 0x4f),
    }
}

pub(crate) fn level_color(level: tracing::Level) -> Color {
    match level {
        tracing::Level::ERROR => Color::from_rgb8(0xe0, 0x4f, 0x4f),
        tracing::Level::WARN => Color::from_rgb8(0xe0, 0xb0, 0x4f),
        tracing::Level::INFO => Color::from_rgb8(0x3b, 0x82, 0xf6),
        tracing::Level::DEBUG => Color::from_rgb8(0x22, 0x7d, 0x64),
        tracing::Level::TRACE => Color::from_rgb8(0x6b, 0x72, 0x80),
    }
}

fn lift(color: Color, amount: f32) -> Color {
    Color {
        r: (color.r + amount).clamp(0.0, 1.0),
        g: (color.g + amount).clamp(0.0, 1.0),
        b: (color.b + amount).clamp(0.0, 1.0),
        a: color.a,
    }
}

/// Group menu entry; the selected group reads as the open tab.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MenuTabStyle {
    pub(crate) active: bool,
}

impl iced::widget::button::StyleSheet for MenuTabStyle {
    type Style = Theme;

    fn active(&self, style: &Self::Style) -> iced::widget::button::Appearance {
        let palette = style.extended_palette();
        let (background, text_color) = if self.active {
            (palette.primary.base.color, palette.primary.base.text)
        } else {
            (palette.background.weak.color, palette.background.weak.text)
        };

        iced::widget::button::Appearance {
            background: Some(Background::Color(background)),
            text_color,
            border: Border {
                color: palette.background.strong.color,
                width: 1.0,
                radius: [8.0, 8.0, 0.0, 0.0].into(),
            },
            shadow_offset: if self.active {
                Vector::new(0.0, 0.0)
            } else {
                Vector::new(0.0, 1.0)
            },
            ..iced::widget::button::Appearance::default()
        }
    }

    fn hovered(&self, style: &Self::Style) -> iced::widget::button::Appearance {
        let mut appearance = self.active(style);
        if !self.active {
            if let Some(Background::Color(color)) = appearance.background {
                appearance.background = Some(Background::Color(lift(color, 0.05)));
            }
        }
        appearance
    }
}

/// Item card filled with the colour of its status.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CardStyle {
    pub(crate) state: ItemState,
}

impl iced::widget::button::StyleSheet for CardStyle {
    type Style = Theme;

    fn active(&self, _style: &Self::Style) -> iced::widget::button::Appearance {
        let fill = state_color(self.state);
        iced::widget::button::Appearance {
            background: Some(Background::Color(fill)),
            text_color: Color::WHITE,
            border: Border {
                color: lift(fill, -0.12),
                width: 1.0,
                radius: 6.0.into(),
            },
            shadow_offset: Vector::new(0.0, 1.0),
            ..iced::widget::button::Appearance::default()
        }
    }

    fn hovered(&self, style: &Self::Style) -> iced::widget::button::Appearance {
        let mut appearance = self.active(style);
        if let Some(Background::Color(color)) = appearance.background {
            appearance.background = Some(Background::Color(lift(color, 0.06)));
        }
        appearance
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct BannerStyle {
    pub(crate) color: Color,
}

impl iced::widget::container::StyleSheet for BannerStyle {
    type Style = Theme;

    fn appearance(&self, _style: &Self::Style) -> iced::widget::container::Appearance {
        iced::widget::container::Appearance {
            text_color: Some(self.color),
            background: None,
            border: Border {
                color: self.color,
                width: 1.0,
                radius: 999.0.into(),
            },
            ..iced::widget::container::Appearance::default()
        }
    }
}

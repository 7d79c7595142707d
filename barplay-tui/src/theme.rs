//! Light and dark palettes.
//!
//! Every widget takes colours from a [`Palette`]; the session's persisted
//! [`Theme`] picks which one.

use ratatui::style::{Color, Modifier, Style};

use barplay_core::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    /// Chart surface
    pub background: Color,
    /// Borders, focus, prompt
    pub accent: Color,
    /// Rising candles and volume
    pub positive: Color,
    /// Falling candles and volume
    pub negative: Color,
    pub warning: Color,
    /// Moving average line
    pub ma_line: Color,
    /// Oscillator line
    pub osc_line: Color,
    /// Axis labels, guides, hints
    pub muted: Color,
    pub text_primary: Color,
    pub text_secondary: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self::light()
    }
}

impl Palette {
    pub fn light() -> Self {
        Self {
            background: Color::Rgb(250, 250, 248),
            accent: Color::Rgb(33, 102, 172),
            positive: Color::Rgb(22, 150, 90),
            negative: Color::Rgb(200, 40, 60),
            warning: Color::Rgb(210, 120, 0),
            ma_line: Color::Rgb(230, 140, 20),
            osc_line: Color::Rgb(120, 70, 200),
            muted: Color::Rgb(140, 140, 150),
            text_primary: Color::Rgb(25, 25, 30),
            text_secondary: Color::Rgb(90, 90, 100),
        }
    }

    pub fn dark() -> Self {
        Self {
            background: Color::Rgb(18, 18, 20),
            accent: Color::Rgb(0, 200, 255),
            positive: Color::Rgb(0, 230, 118),
            negative: Color::Rgb(255, 60, 110),
            warning: Color::Rgb(255, 140, 0),
            ma_line: Color::Rgb(255, 200, 60),
            osc_line: Color::Rgb(170, 130, 255),
            muted: Color::Rgb(100, 110, 130),
            text_primary: Color::White,
            text_secondary: Color::Rgb(170, 170, 170),
        }
    }

    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Self::light(),
            Theme::Dark => Self::dark(),
        }
    }

    pub fn candle_color(&self, rising: bool) -> Color {
        if rising {
            self.positive
        } else {
            self.negative
        }
    }

    /// Overbought (>= 70) and oversold (<= 30) readings get their own colours.
    pub fn oscillator_color(&self, value: f64) -> Color {
        match value {
            v if v >= 70.0 => self.negative,
            v if v <= 30.0 => self.positive,
            _ => self.osc_line,
        }
    }

    pub fn base(&self) -> Style {
        Style::default().fg(self.text_primary).bg(self.background)
    }

    pub fn border(&self, focused: bool) -> Style {
        if focused {
            Style::default().fg(self.accent)
        } else {
            Style::default().fg(self.muted)
        }
    }

    pub fn title(&self) -> Style {
        Style::default()
            .fg(self.accent)
            .add_modifier(Modifier::BOLD)
    }

    pub fn muted(&self) -> Style {
        Style::default().fg(self.muted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_selects_palette() {
        assert_eq!(Palette::for_theme(Theme::Light), Palette::light());
        assert_eq!(Palette::for_theme(Theme::Dark), Palette::dark());
        assert_ne!(Palette::light().background, Palette::dark().background);
    }

    #[test]
    fn candle_color_follows_direction() {
        let p = Palette::dark();
        assert_eq!(p.candle_color(true), p.positive);
        assert_eq!(p.candle_color(false), p.negative);
    }

    #[test]
    fn oscillator_zones() {
        let p = Palette::light();
        assert_eq!(p.oscillator_color(85.0), p.negative);
        assert_eq!(p.oscillator_color(50.0), p.osc_line);
        assert_eq!(p.oscillator_color(12.0), p.positive);
    }
}

use gamelist_core::{GameStatus, ThemeChoice};
use ratatui::style::Color;

/// Colours used by every widget.
#[derive(Debug, Clone)]
pub struct Theme {
    pub primary_bg: Color,
    pub primary_fg: Color,
    pub accent: Color,
    pub muted: Color,
    pub selection_bg: Color,
    pub selection_fg: Color,
    pub success: Color,
    pub warning: Color,
    pub danger: Color,
    pub info: Color,
    pub on_accent: Color,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            primary_bg: Color::Black,
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            selection_fg: Color::White,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
            info: Color::LightBlue,
            on_accent: Color::Black,
        }
    }

    pub fn light() -> Self {
        Self {
            primary_bg: Color::White,
            primary_fg: Color::Black,
            accent: Color::Blue,
            muted: Color::Gray,
            selection_bg: Color::Rgb(220, 228, 240),
            selection_fg: Color::Black,
            success: Color::Rgb(0, 128, 0),
            warning: Color::Rgb(176, 112, 0),
            danger: Color::Rgb(190, 0, 0),
            info: Color::Rgb(0, 90, 170),
            on_accent: Color::White,
        }
    }

    /// Palette for a resolved theme choice.
    pub fn for_choice(choice: ThemeChoice) -> Self {
        match choice.resolve() {
            ThemeChoice::Light => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Badge colour for a status.
    pub fn status_color(&self, status: &GameStatus) -> Color {
        match status {
            GameStatus::Playing => self.info,
            GameStatus::Completed => self.success,
            GameStatus::Planned => self.warning,
            GameStatus::Dropped => self.danger,
            GameStatus::Unknown(_) => self.muted,
        }
    }

    /// Readable text colour on top of `color`.
    pub fn contrast(&self, color: Color) -> Color {
        match color {
            Color::Rgb(r, g, b) => {
                let luminance =
                    0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b);
                if luminance > 186.0 {
                    Color::Black
                } else {
                    Color::White
                }
            }
            _ => self.on_accent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concrete_choices_pick_matching_palette() {
        assert_eq!(Theme::for_choice(ThemeChoice::Light).primary_bg, Color::White);
        assert_eq!(Theme::for_choice(ThemeChoice::Dark).primary_bg, Color::Black);
    }

    #[test]
    fn contrast_prefers_dark_text_on_pale_colours() {
        let theme = Theme::light();
        assert_eq!(theme.contrast(Color::Rgb(250, 250, 250)), Color::Black);
        assert_eq!(theme.contrast(Color::Rgb(10, 10, 40)), Color::White);
        assert_eq!(theme.contrast(Color::Cyan), theme.on_accent);
    }
}

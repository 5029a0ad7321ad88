use code_route::view::OptionState;
use code_route::ThemeKind;
use ratatui::style::Color;

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub fg: Color,
    pub muted: Color,
    pub accent: Color,
    pub bar_bg: Color,
    pub selection_bg: Color,
    pub good: Color,
    pub bad: Color,
    pub warn: Color,
}

pub fn theme_of(kind: ThemeKind) -> Theme {
    match kind {
        ThemeKind::Dark => Theme {
            fg: Color::Rgb(220, 220, 220),
            muted: Color::Rgb(140, 140, 140),
            accent: Color::Rgb(95, 175, 255),
            bar_bg: Color::Rgb(35, 40, 46),
            selection_bg: Color::Rgb(60, 65, 72),
            good: Color::Rgb(130, 200, 120),
            bad: Color::Rgb(235, 110, 110),
            warn: Color::Rgb(255, 200, 110),
        },
        ThemeKind::Light => Theme {
            fg: Color::Rgb(30, 30, 30),
            muted: Color::Rgb(120, 120, 120),
            accent: Color::Rgb(0, 85, 164),
            bar_bg: Color::Rgb(235, 240, 245),
            selection_bg: Color::Rgb(210, 220, 235),
            good: Color::Rgb(38, 166, 91),
            bad: Color::Rgb(200, 40, 50),
            warn: Color::Rgb(200, 120, 0),
        },
    }
}

impl Theme {
    pub fn option_color(&self, state: OptionState) -> Color {
        match state {
            OptionState::Neutral => self.fg,
            OptionState::Correct => self.good,
            OptionState::Wrong => self.bad,
        }
    }
}

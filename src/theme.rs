//! Storefront palettes, picked with `--theme` / `THEME`.
//!
//! Colours are named after what they mark in the shop (prices, sales,
//! sold-out stock, rate-limit notices) rather than after widgets.

use ratatui::style::Color;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    /// Warm daylight colours
    #[default]
    Market,
    /// Low-glare palette for dark terminals
    Night,
    /// Terminal defaults plus bold/reverse; safe on 16-colour consoles
    Mono,
}

impl Theme {
    pub const ALL: [Theme; 3] = [Theme::Market, Theme::Night, Theme::Mono];

    pub fn name(self) -> &'static str {
        match self {
            Theme::Market => "market",
            Theme::Night => "night",
            Theme::Mono => "mono",
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            Theme::Market => Palette::MARKET,
            Theme::Night => Palette::NIGHT,
            Theme::Mono => Palette::MONO,
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Theme::ALL
            .into_iter()
            .find(|t| t.name() == wanted)
            .or(match wanted.as_str() {
                "day" => Some(Theme::Market),
                "dark" => Some(Theme::Night),
                "plain" => Some(Theme::Mono),
                _ => None,
            })
            .ok_or_else(|| {
                let names: Vec<&str> = Theme::ALL.iter().map(|t| t.name()).collect();
                format!("Unknown theme '{s}'. Available: {}", names.join(", "))
            })
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub text: Color,
    /// Descriptions, units, hints, inactive dots
    pub muted: Color,
    pub border: Color,
    /// Focused pane border, key hints, active tab
    pub border_focus: Color,
    pub highlight_bg: Color,
    pub highlight_fg: Color,
    /// Banner call-to-action and active dot
    pub brand: Color,
    pub price: Color,
    pub sale: Color,
    pub sold_out: Color,
    /// 429 notices and partial results
    pub rate_limited: Color,
    /// Not-found and failed loads
    pub error: Color,
    /// Toast border and text
    pub notice: Color,
    pub debug: Color,
}

impl Palette {
    pub const MARKET: Palette = Palette {
        text: Color::Rgb(238, 232, 220),
        muted: Color::Rgb(150, 140, 125),
        border: Color::Rgb(110, 100, 90),
        border_focus: Color::Rgb(242, 153, 74),
        highlight_bg: Color::Rgb(242, 153, 74),
        highlight_fg: Color::Rgb(30, 24, 18),
        brand: Color::Rgb(46, 160, 110),
        price: Color::Rgb(250, 210, 120),
        sale: Color::Rgb(235, 87, 87),
        sold_out: Color::Rgb(120, 110, 100),
        rate_limited: Color::Rgb(245, 190, 60),
        error: Color::Rgb(220, 70, 60),
        notice: Color::Rgb(46, 160, 110),
        debug: Color::Rgb(170, 120, 220),
    };

    pub const NIGHT: Palette = Palette {
        text: Color::Rgb(200, 205, 215),
        muted: Color::Rgb(105, 112, 128),
        border: Color::Rgb(70, 76, 90),
        border_focus: Color::Rgb(120, 170, 255),
        highlight_bg: Color::Rgb(45, 60, 95),
        highlight_fg: Color::Rgb(235, 240, 250),
        brand: Color::Rgb(120, 170, 255),
        price: Color::Rgb(150, 220, 200),
        sale: Color::Rgb(255, 130, 150),
        sold_out: Color::Rgb(90, 95, 105),
        rate_limited: Color::Rgb(230, 200, 110),
        error: Color::Rgb(240, 110, 110),
        notice: Color::Rgb(150, 220, 200),
        debug: Color::Rgb(200, 150, 255),
    };

    pub const MONO: Palette = Palette {
        text: Color::Reset,
        muted: Color::DarkGray,
        border: Color::DarkGray,
        border_focus: Color::White,
        highlight_bg: Color::White,
        highlight_fg: Color::Black,
        brand: Color::White,
        price: Color::White,
        sale: Color::White,
        sold_out: Color::DarkGray,
        rate_limited: Color::Yellow,
        error: Color::Red,
        notice: Color::White,
        debug: Color::Gray,
    };
}

impl Default for Palette {
    fn default() -> Self {
        Theme::default().palette()
    }
}

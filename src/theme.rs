//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use crate::Palette;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

const ONEDARK_TILES: [Color; 6] = [
    Color::Rgb(0xE5, 0xC0, 0x7B), // yellow
    Color::Rgb(0x61, 0xAF, 0xEF), // blue
    Color::Rgb(0xE0, 0x6C, 0x75), // red
    Color::Rgb(0x56, 0xB6, 0xC2), // cyan
    Color::Rgb(0xC6, 0x78, 0xDD), // magenta
    Color::Rgb(0x98, 0xC3, 0x79), // green
];

const HIGH_CONTRAST_TILES: [Color; 6] = [
    Color::Rgb(0xFF, 0xFF, 0x00),
    Color::Rgb(0x00, 0x88, 0xFF),
    Color::Rgb(0xFF, 0x00, 0x00),
    Color::Rgb(0x00, 0xFF, 0xFF),
    Color::Rgb(0xFF, 0x00, 0xFF),
    Color::Rgb(0x00, 0xFF, 0x00),
];

/// Avoids leaning on red against green.
const COLORBLIND_TILES: [Color; 6] = [
    Color::Rgb(0xBB, 0xBB, 0x00),
    Color::Rgb(0x00, 0x77, 0xBB),
    Color::Rgb(0xEE, 0x77, 0x33),
    Color::Rgb(0x00, 0x99, 0x88),
    Color::Rgb(0xEE, 0x33, 0x77),
    Color::Rgb(0xCC, 0x33, 0x11),
];

/// Board and sidebar colours.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Cell tint per emoji index (0..=5).
    pub tiles: [Color; 6],
    pub bg: Color,
    /// Borders.
    pub div_line: Color,
    pub main_fg: Color,
    pub title: Color,
    /// Cursor highlight.
    pub selected_bg: Color,
    /// Secondary text (hints, item lifetimes).
    pub inactive_fg: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::onedark()
    }
}

impl Theme {
    pub fn onedark() -> Self {
        Self {
            tiles: ONEDARK_TILES,
            bg: Color::Rgb(0x28, 0x2C, 0x34),
            div_line: Color::Rgb(0x3F, 0x44, 0x4F),
            main_fg: Color::Rgb(0xAB, 0xB2, 0xBF),
            title: Color::Rgb(0xE5, 0xC0, 0x7B),
            selected_bg: Color::Rgb(0x4B, 0x52, 0x63),
            inactive_fg: Color::Rgb(0x5C, 0x63, 0x70),
        }
    }

    /// Load a btop-style theme file. No path, or a path that does not exist,
    /// gives the One Dark defaults. `palette` then overrides the tile colours.
    pub fn load(path: Option<&Path>, palette: Palette) -> Result<Self, ThemeError> {
        let mut theme = match path {
            Some(p) if p.exists() => {
                let s = std::fs::read_to_string(p)?;
                Self::from_map(&parse_theme_file(&s))
            }
            _ => Self::onedark(),
        };
        theme.apply_palette(palette);
        Ok(theme)
    }

    pub fn apply_palette(&mut self, palette: Palette) {
        match palette {
            Palette::Normal => {}
            Palette::HighContrast => self.tiles = HIGH_CONTRAST_TILES,
            Palette::Colorblind => self.tiles = COLORBLIND_TILES,
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| map.get(key).and_then(|v| parse_hex(v).ok());
        let base = Self::onedark();
        Self {
            tiles: [
                get("title").or_else(|| get("cpu_mid")).unwrap_or(base.tiles[0]),
                get("cpu_box").unwrap_or(base.tiles[1]),
                get("cpu_end").or_else(|| get("temp_end")).unwrap_or(base.tiles[2]),
                get("hi_fg").or_else(|| get("proc_misc")).unwrap_or(base.tiles[3]),
                get("net_box").unwrap_or(base.tiles[4]),
                get("mem_box").or_else(|| get("cpu_start")).unwrap_or(base.tiles[5]),
            ],
            bg: get("main_bg").unwrap_or(base.bg),
            div_line: get("div_line").unwrap_or(base.div_line),
            main_fg: get("main_fg").unwrap_or(base.main_fg),
            title: get("title").unwrap_or(base.title),
            selected_bg: get("selected_bg").unwrap_or(base.selected_bg),
            inactive_fg: get("inactive_fg").unwrap_or(base.inactive_fg),
        }
    }

    #[inline]
    pub fn tile_color(&self, index: usize) -> Color {
        self.tiles[index % self.tiles.len()]
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(rest) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some((key, rest)) = rest.split_once(']') else {
            continue;
        };
        let Some((_, value)) = rest.split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches('"').trim_matches('\'');
        if !value.is_empty() {
            map.insert(key.trim().to_string(), value.to_string());
        }
    }
    map
}

/// Parse "#RRGGBB" or "#RGB".
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let bad = || ThemeError::InvalidHex(s.to_string());
    let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| bad());
    if !s.is_ascii() {
        return Err(bad());
    }
    match s.len() {
        6 => Ok(Color::Rgb(channel(&s[0..2])?, channel(&s[2..4])?, channel(&s[4..6])?)),
        3 => Ok(Color::Rgb(
            channel(&s[0..1])? * 17,
            channel(&s[1..2])? * 17,
            channel(&s[2..3])? * 17,
        )),
        _ => Err(bad()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hex_long_and_short() {
        assert_eq!(parse_hex("#98C379").unwrap(), Color::Rgb(0x98, 0xC3, 0x79));
        assert_eq!(parse_hex("fff").unwrap(), Color::Rgb(255, 255, 255));
        assert!(matches!(parse_hex("#12345"), Err(ThemeError::InvalidHex(_))));
        assert!(parse_hex("#GG0000").is_err());
        assert!(parse_hex("#ééé").is_err());
    }

    #[test]
    fn theme_file_lines() {
        let map = parse_theme_file(
            "# comment\ntheme[main_bg]=\"#101010\"\ntheme[cpu_box]='#0000FF'\nnot a theme line\ntheme[empty]=\"\"",
        );
        assert_eq!(map.get("main_bg").map(String::as_str), Some("#101010"));
        assert_eq!(map.get("cpu_box").map(String::as_str), Some("#0000FF"));
        assert!(!map.contains_key("empty"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn file_keys_override_defaults() {
        let map = parse_theme_file("theme[main_bg]=\"#101010\"\ntheme[cpu_box]=\"#0000FF\"");
        let t = Theme::from_map(&map);
        assert_eq!(t.bg, Color::Rgb(0x10, 0x10, 0x10));
        assert_eq!(t.tiles[1], Color::Rgb(0, 0, 0xFF));
        assert_eq!(t.main_fg, Theme::onedark().main_fg);
    }

    #[test]
    fn palette_swaps_tiles_only() {
        let mut t = Theme::onedark();
        t.apply_palette(Palette::Colorblind);
        assert_eq!(t.tiles, COLORBLIND_TILES);
        assert_eq!(t.bg, Theme::onedark().bg);
        assert_eq!(t.tile_color(7), COLORBLIND_TILES[1]);
    }

    #[test]
    fn missing_file_falls_back() {
        let t = Theme::load(Some(Path::new("/nonexistent/emoji.theme")), Palette::HighContrast).unwrap();
        assert_eq!(t.tiles, HIGH_CONTRAST_TILES);
    }
}

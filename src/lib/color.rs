//! Color values used by styles and draw operations.
//!
//! Styles carry colors as hex strings (`#rrggbb`) because that is how they arrive from
//! configuration files and enrichment responses. Layout and rendering work with [`Color`],
//! a plain RGB triple decoded from those strings.

use std::fmt;

/// An opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rrggbb`, `rrggbb`, `#rgb` or `rgb` (surrounding whitespace is ignored).
    ///
    /// Returns `None` for anything else, including named colors.
    pub fn parse_hex(input: &str) -> Option<Color> {
        let s = input.trim();
        let s = s.strip_prefix('#').unwrap_or(s);
        if !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let expanded: String = match s.len() {
            3 => s.chars().flat_map(|c| [c, c]).collect(),
            6 => s.to_string(),
            _ => return None,
        };
        let v = u32::from_str_radix(&expanded, 16).ok()?;
        Some(Color::from_u32(v))
    }

    /// Decodes a hex string, falling back to black when it is malformed.
    pub fn from_hex(input: &str) -> Color {
        Self::parse_hex(input).unwrap_or(Color::BLACK)
    }

    fn from_u32(v: u32) -> Color {
        Color {
            r: ((v >> 16) & 255) as u8,
            g: ((v >> 8) & 255) as u8,
            b: (v & 255) as u8,
        }
    }

    /// Moves each channel towards white: `c + (255 - c) * factor`, clamped to `0..=255`.
    pub fn lighten(self, factor: f32) -> Color {
        let f = if factor.is_finite() { factor } else { 0.0 };
        let channel = |c: u8| -> u8 {
            let c = c as f32;
            (c + (255.0 - c) * f).round().clamp(0.0, 255.0) as u8
        };
        Color {
            r: channel(self.r),
            g: channel(self.g),
            b: channel(self.b),
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Channels as fractions in `0.0..=1.0`, the form PDF color operators expect.
    pub fn as_unit_floats(self) -> (f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        )
    }

    pub fn is_white(self) -> bool {
        self == Color::WHITE
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Splits a comma-separated color list and keeps the tokens that parse.
pub fn parse_color_list(input: &str) -> Vec<Color> {
    input
        .split(',')
        .filter_map(|token| Color::parse_hex(token))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_variants() {
        assert_eq!(Color::parse_hex("#2c3e50"), Some(Color::rgb(0x2c, 0x3e, 0x50)));
        assert_eq!(Color::parse_hex("2C3E50"), Some(Color::rgb(0x2c, 0x3e, 0x50)));
        assert_eq!(Color::parse_hex(" #fff "), Some(Color::WHITE));
        assert_eq!(Color::parse_hex("#abc"), Some(Color::rgb(0xaa, 0xbb, 0xcc)));
        assert_eq!(Color::parse_hex("navy"), None);
        assert_eq!(Color::parse_hex("#12345"), None);
        assert_eq!(Color::parse_hex(""), None);
    }

    #[test]
    fn test_parse_hex_rejects_signs_and_extra_marks() {
        assert_eq!(Color::parse_hex("#+12345"), None);
        assert_eq!(Color::parse_hex("-fff"), None);
        assert_eq!(Color::parse_hex("##ffffff"), None);
        assert_eq!(Color::parse_hex("#ééé"), None);
    }

    #[test]
    fn test_from_hex_decomposes_channels() {
        let c = Color::from_hex("#123456");
        assert_eq!((c.r, c.g, c.b), (0x12, 0x34, 0x56));
        assert_eq!(Color::from_hex("garbage"), Color::BLACK);
    }

    #[test]
    fn test_lighten() {
        let c = Color::rgb(100, 0, 255);
        assert_eq!(c.lighten(0.0), c);
        assert_eq!(c.lighten(1.0), Color::WHITE);
        // 100 + 155 * 0.5 = 177.5 -> 178, 0 + 255 * 0.5 = 127.5 -> 128
        assert_eq!(c.lighten(0.5), Color::rgb(178, 128, 255));
        // factors outside the unit range clamp instead of wrapping
        assert_eq!(c.lighten(4.0), Color::WHITE);
        assert_eq!(Color::rgb(10, 10, 10).lighten(-1.0), Color::BLACK);
        assert_eq!(c.lighten(f32::NAN), c);
    }

    #[test]
    fn test_hex_round_trip_and_list() {
        assert_eq!(Color::rgb(1, 2, 3).to_hex(), "#010203");
        let list = parse_color_list("#000000, nope, #ffffff,#ff0000");
        assert_eq!(list, vec![Color::BLACK, Color::WHITE, Color::rgb(255, 0, 0)]);
    }
}

//! Hex colour parsing and the small set of adjustments palettes derive from.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rgb` or `#rrggbb` (the `#` is optional)
    pub fn parse_hex(input: &str) -> Option<Self> {
        let hex = input.trim().trim_start_matches('#');
        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_string(),
            _ => return None,
        };
        let value = u32::from_str_radix(&expanded, 16).ok()?;
        Some(Self::new(
            ((value >> 16) & 0xff) as u8,
            ((value >> 8) & 0xff) as u8,
            (value & 0xff) as u8,
        ))
    }

    /// Shift every channel down by `percent` of full scale
    pub fn darken(self, percent: f32) -> Self {
        self.shift(-percent)
    }

    /// Shift every channel up by `percent` of full scale
    pub fn lighten(self, percent: f32) -> Self {
        self.shift(percent)
    }

    fn shift(self, percent: f32) -> Self {
        let amount = (2.55 * percent).round() as i32;
        let channel = |c: u8| (c as i32 + amount).clamp(0, 255) as u8;
        Self::new(channel(self.r), channel(self.g), channel(self.b))
    }

    /// Relative luminance per WCAG, 0.0 (black) to 1.0 (white)
    pub fn luminance(self) -> f32 {
        let linear = |c: u8| {
            let c = c as f32 / 255.0;
            if c <= 0.039_28 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        };
        0.2126 * linear(self.r) + 0.7152 * linear(self.g) + 0.0722 * linear(self.b)
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn rgba(self, alpha: f32) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, alpha.clamp(0.0, 1.0))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Whether a palette value is usable as-is in CSS.
///
/// Hex colours and `rgb()`/`rgba()` functions are accepted.
pub fn is_css_color(value: &str) -> bool {
    let v = value.trim();
    Rgb::parse_hex(v).is_some()
        || ((v.starts_with("rgb(") || v.starts_with("rgba(")) && v.ends_with(')'))
}

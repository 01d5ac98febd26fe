//! Palette types and the normalisation rules that fill missing roles.

use serde::{Deserialize, Serialize};

use super::color::{is_css_color, Rgb};

/// Used when a palette has no usable accent
const FALLBACK_ACCENT: Rgb = Rgb::new(0x8b, 0xc3, 0x4a);
/// Used when a palette has no usable background
const FALLBACK_BG: Rgb = Rgb::new(0x0f, 0x11, 0x14);

const SUCCESS: &str = "#4caf50";
const WARNING: &str = "#ffb74d";
const ERROR: &str = "#ef5350";
const INFO: &str = "#4fc3f7";

/// Below this luminance a background counts as near-black
const NEAR_BLACK: f32 = 0.02;
/// Above this luminance a background gets dark text
const LIGHT_BACKGROUND: f32 = 0.45;

/// A palette as a user or table provides it: any role may be missing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartialPalette {
    pub accent: Option<String>,
    pub accent2: Option<String>,
    pub accent_muted: Option<String>,
    pub bg: Option<String>,
    pub bg2: Option<String>,
    pub surface: Option<String>,
    pub surface2: Option<String>,
    pub border: Option<String>,
    pub text: Option<String>,
    pub text2: Option<String>,
    pub text_muted: Option<String>,
    pub glass_bg: Option<String>,
    pub glass_border: Option<String>,
    pub glass_shadow: Option<String>,
    pub success: Option<String>,
    pub warning: Option<String>,
    pub error: Option<String>,
    pub info: Option<String>,
    pub scrollbar: Option<String>,
    pub selection: Option<String>,
}

impl PartialPalette {
    /// Palette with just the two anchor colours
    pub fn from_anchors(accent: &str, bg: &str) -> Self {
        Self {
            accent: Some(accent.to_string()),
            bg: Some(bg.to_string()),
            ..Default::default()
        }
    }
}

/// A complete palette: every role has a CSS colour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Palette {
    pub accent: String,
    pub accent2: String,
    pub accent_muted: String,
    pub bg: String,
    pub bg2: String,
    pub surface: String,
    pub surface2: String,
    pub border: String,
    pub text: String,
    pub text2: String,
    pub text_muted: String,
    pub glass_bg: String,
    pub glass_border: String,
    pub glass_shadow: String,
    pub success: String,
    pub warning: String,
    pub error: String,
    pub info: String,
    pub scrollbar: String,
    pub selection: String,
}

/// CSS custom property names, in the order `Palette::css_variables` yields them
pub const CSS_VARIABLES: [&str; 20] = [
    "--accent",
    "--accent-2",
    "--accent-muted",
    "--bg",
    "--bg-2",
    "--surface",
    "--surface-2",
    "--border",
    "--text",
    "--text-2",
    "--text-muted",
    "--glass-bg",
    "--glass-border",
    "--glass-shadow",
    "--success",
    "--warning",
    "--error",
    "--info",
    "--scrollbar",
    "--selection",
];

impl Palette {
    /// `(css property, value)` for every role
    pub fn css_variables(&self) -> [(&'static str, &str); 20] {
        let values = [
            &self.accent,
            &self.accent2,
            &self.accent_muted,
            &self.bg,
            &self.bg2,
            &self.surface,
            &self.surface2,
            &self.border,
            &self.text,
            &self.text2,
            &self.text_muted,
            &self.glass_bg,
            &self.glass_border,
            &self.glass_shadow,
            &self.success,
            &self.warning,
            &self.error,
            &self.info,
            &self.scrollbar,
            &self.selection,
        ];
        let mut out = [("", ""); 20];
        for (i, value) in values.into_iter().enumerate() {
            out[i] = (CSS_VARIABLES[i], value.as_str());
        }
        out
    }
}

impl From<&Palette> for PartialPalette {
    fn from(p: &Palette) -> Self {
        Self {
            accent: Some(p.accent.clone()),
            accent2: Some(p.accent2.clone()),
            accent_muted: Some(p.accent_muted.clone()),
            bg: Some(p.bg.clone()),
            bg2: Some(p.bg2.clone()),
            surface: Some(p.surface.clone()),
            surface2: Some(p.surface2.clone()),
            border: Some(p.border.clone()),
            text: Some(p.text.clone()),
            text2: Some(p.text2.clone()),
            text_muted: Some(p.text_muted.clone()),
            glass_bg: Some(p.glass_bg.clone()),
            glass_border: Some(p.glass_border.clone()),
            glass_shadow: Some(p.glass_shadow.clone()),
            success: Some(p.success.clone()),
            warning: Some(p.warning.clone()),
            error: Some(p.error.clone()),
            info: Some(p.info.clone()),
            scrollbar: Some(p.scrollbar.clone()),
            selection: Some(p.selection.clone()),
        }
    }
}

/// A usable value for a role, or `None` if absent or not a colour
fn given(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| is_css_color(v))
        .map(str::to_string)
}

/// Keep the given value or fall back to `derived`
fn or_derive(value: &Option<String>, derived: impl FnOnce() -> String) -> String {
    given(value).unwrap_or_else(derived)
}

/// Fill every missing role of `partial` from the roles that are present.
///
/// Derived roles come from hex anchors; a non-hex anchor (e.g. `rgba(...)`)
/// is kept as the role's value but derivations use the fallback colour.
pub fn normalize(partial: &PartialPalette) -> Palette {
    let hex = |value: &Option<String>| given(value).and_then(|v| Rgb::parse_hex(&v));

    let accent_rgb = hex(&partial.accent).unwrap_or(FALLBACK_ACCENT);
    let bg_rgb = hex(&partial.bg).unwrap_or(FALLBACK_BG);
    let dark_bg = bg_rgb.luminance() < NEAR_BLACK;

    let surface_rgb = hex(&partial.surface).unwrap_or_else(|| {
        if dark_bg {
            bg_rgb.lighten(6.0)
        } else {
            bg_rgb.darken(8.0)
        }
    });

    let text_rgb = hex(&partial.text).unwrap_or_else(|| {
        if bg_rgb.luminance() > LIGHT_BACKGROUND {
            Rgb::new(0x1b, 0x1b, 0x1f)
        } else {
            Rgb::new(0xf2, 0xf2, 0xf5)
        }
    });

    let border = or_derive(&partial.border, || surface_rgb.lighten(12.0).to_hex());

    Palette {
        accent: or_derive(&partial.accent, || accent_rgb.to_hex()),
        accent2: or_derive(&partial.accent2, || accent_rgb.lighten(15.0).to_hex()),
        accent_muted: or_derive(&partial.accent_muted, || accent_rgb.darken(20.0).to_hex()),
        bg: or_derive(&partial.bg, || bg_rgb.to_hex()),
        bg2: or_derive(&partial.bg2, || bg_rgb.darken(4.0).to_hex()),
        surface: or_derive(&partial.surface, || surface_rgb.to_hex()),
        surface2: or_derive(&partial.surface2, || surface_rgb.lighten(6.0).to_hex()),
        text: or_derive(&partial.text, || text_rgb.to_hex()),
        text2: or_derive(&partial.text2, || text_rgb.rgba(0.78)),
        text_muted: or_derive(&partial.text_muted, || text_rgb.rgba(0.55)),
        glass_bg: or_derive(&partial.glass_bg, || surface_rgb.rgba(0.35)),
        glass_border: or_derive(&partial.glass_border, || text_rgb.rgba(0.12)),
        glass_shadow: or_derive(&partial.glass_shadow, || bg_rgb.darken(50.0).rgba(0.45)),
        success: or_derive(&partial.success, || SUCCESS.to_string()),
        warning: or_derive(&partial.warning, || WARNING.to_string()),
        error: or_derive(&partial.error, || ERROR.to_string()),
        info: or_derive(&partial.info, || INFO.to_string()),
        scrollbar: or_derive(&partial.scrollbar, || border.clone()),
        selection: or_derive(&partial.selection, || accent_rgb.rgba(0.35)),
        border,
    }
}

//! Built-in palettes.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;

use super::palette::{normalize, Palette, PartialPalette};

/// Name of the palette used for unknown variants
pub const DEFAULT_VARIANT: &str = "onyx";

/// `(variant, display name, accent, accent2, bg, surface, text)`
const TABLE: [(&str, &str, &str, &str, &str, &str, &str); 7] = [
    ("onyx", "Onyx", "#8bc34a", "#aed581", "#0f1114", "#181b20", "#eef1f4"),
    ("amethyst", "Amethyst", "#b388ff", "#d1b3ff", "#120e1a", "#1c1628", "#efe9fb"),
    ("neon", "Neon", "#00e5ff", "#ff4081", "#07080c", "#11131b", "#e6fbff"),
    ("aqua", "Aqua", "#26c6da", "#80deea", "#0a1518", "#112227", "#e0f7fa"),
    ("crimson", "Crimson", "#ef5350", "#ff8a80", "#160b0c", "#221214", "#fbeaea"),
    ("forest", "Forest", "#66bb6a", "#a5d6a7", "#0c140d", "#142016", "#e8f5e9"),
    ("daylight", "Daylight", "#3f7de0", "#6c9cf0", "#f4f5f7", "#ffffff", "#1b1d22"),
];

static BUILTINS: Lazy<BTreeMap<&'static str, Palette>> = Lazy::new(|| {
    TABLE
        .iter()
        .map(|&(name, _, accent, accent2, bg, surface, text)| {
            let partial = PartialPalette {
                accent: Some(accent.into()),
                accent2: Some(accent2.into()),
                bg: Some(bg.into()),
                surface: Some(surface.into()),
                text: Some(text.into()),
                ..Default::default()
            };
            (name, normalize(&partial))
        })
        .collect()
});

/// Built-in palette by variant name
pub fn builtin(name: &str) -> Option<&'static Palette> {
    BUILTINS.get(name)
}

/// `(variant, display name)` for every built-in, in table order
pub fn builtin_variants() -> impl Iterator<Item = (&'static str, &'static str)> {
    TABLE.iter().map(|&(name, display, ..)| (name, display))
}

pub fn default_palette() -> &'static Palette {
    &BUILTINS[DEFAULT_VARIANT]
}

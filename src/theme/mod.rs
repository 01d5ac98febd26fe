//! Theme manager
//!
//! Resolves a theme variant (built-in, `custom:<name>`, or unknown) to a
//! complete palette and projects it onto the style document as CSS custom
//! properties plus a `data-theme` attribute. Custom palettes live in the
//! preference store under `CustomThemes`.

mod builtin;
pub mod color;
mod palette;

pub use builtin::{builtin, builtin_variants, default_palette, DEFAULT_VARIANT};
pub use palette::{normalize, Palette, PartialPalette, CSS_VARIABLES};

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::prefs::{keys, PreferenceStore};
use crate::style::StyleDocument;

/// Prefix marking a user-defined variant
pub const CUSTOM_PREFIX: &str = "custom:";

const THEME_ATTRIBUTE: &str = "data-theme";

#[derive(Debug, thiserror::Error)]
pub enum ThemeError {
    #[error("Theme name cannot be empty")]
    EmptyName,

    #[error("'{0}' is a built-in theme name")]
    ReservedName(String),

    #[error("Failed to encode theme: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Write every role of `palette` onto `doc`
fn project(doc: &mut StyleDocument, name: &str, palette: &Palette) {
    for (property, value) in palette.css_variables() {
        doc.set_property(property, value);
    }
    doc.set_attribute(THEME_ATTRIBUTE, name);
}

/// Normalise `partial` and apply it under `name`
pub fn apply_theme_from_object(
    doc: &mut StyleDocument,
    name: &str,
    partial: &PartialPalette,
) -> Palette {
    let palette = normalize(partial);
    project(doc, name, &palette);
    palette
}

pub struct ThemeManager {
    prefs: Arc<PreferenceStore>,
}

impl ThemeManager {
    pub fn new(prefs: Arc<PreferenceStore>) -> Self {
        Self { prefs }
    }

    /// Resolve `variant` to the name actually applied and its palette
    pub async fn resolve(&self, variant: &str) -> (String, Palette) {
        if let Some(custom) = variant.strip_prefix(CUSTOM_PREFIX) {
            if let Some(palette) = self.custom_theme(custom).await {
                return (variant.to_string(), palette);
            }
            warn!("Custom theme '{}' not found, using {}", custom, DEFAULT_VARIANT);
        } else if let Some(palette) = builtin(variant) {
            return (variant.to_string(), palette.clone());
        } else {
            warn!("Unknown theme variant '{}', using {}", variant, DEFAULT_VARIANT);
        }
        (DEFAULT_VARIANT.to_string(), default_palette().clone())
    }

    /// Apply `variant` to `doc`. Returns the variant name actually applied.
    pub async fn apply_theme_variables(&self, doc: &mut StyleDocument, variant: &str) -> String {
        let (name, palette) = self.resolve(variant).await;
        project(doc, &name, &palette);
        debug!("Applied theme {}", name);
        name
    }

    /// Apply the variant saved in preferences
    pub async fn apply_saved(&self, doc: &mut StyleDocument) -> String {
        let variant = self
            .prefs
            .get_string(keys::THEME_VARIANT)
            .await
            .unwrap_or_else(|| DEFAULT_VARIANT.to_string());
        self.apply_theme_variables(doc, &variant).await
    }

    /// Persist `variant` as the selected theme and apply it
    pub async fn select(&self, doc: &mut StyleDocument, variant: &str) -> String {
        let applied = self.apply_theme_variables(doc, variant).await;
        self.prefs.set(keys::THEME_VARIANT, applied.clone()).await;
        applied
    }

    /// Normalise and store a custom palette under `name`
    pub async fn set_custom_theme(
        &self,
        name: &str,
        partial: &PartialPalette,
    ) -> Result<Palette, ThemeError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ThemeError::EmptyName);
        }
        if builtin(name).is_some() {
            return Err(ThemeError::ReservedName(name.to_string()));
        }

        let palette = normalize(partial);
        let encoded = serde_json::to_value(&palette)?;
        let mut themes = self.custom_theme_map().await;
        themes.insert(name.to_string(), encoded);
        self.prefs.set(keys::CUSTOM_THEMES, Value::Object(themes)).await;
        Ok(palette)
    }

    /// Remove a custom palette. Returns whether it existed.
    pub async fn delete_custom_theme(&self, name: &str) -> bool {
        let mut themes = self.custom_theme_map().await;
        if themes.remove(name).is_none() {
            return false;
        }
        self.prefs.set(keys::CUSTOM_THEMES, Value::Object(themes)).await;

        // A deleted theme can't stay selected
        let selected = self.prefs.get_string(keys::THEME_VARIANT).await;
        let custom_variant = format!("{}{}", CUSTOM_PREFIX, name);
        if selected.as_deref() == Some(custom_variant.as_str()) {
            self.prefs.set(keys::THEME_VARIANT, DEFAULT_VARIANT).await;
        }
        true
    }

    /// Every stored custom palette, normalised
    pub async fn custom_themes(&self) -> BTreeMap<String, Palette> {
        self.custom_theme_map()
            .await
            .into_iter()
            .filter_map(|(name, value)| decode_palette(&name, value).map(|p| (name, p)))
            .collect()
    }

    async fn custom_theme(&self, name: &str) -> Option<Palette> {
        let value = self.custom_theme_map().await.remove(name)?;
        decode_palette(name, value)
    }

    async fn custom_theme_map(&self) -> Map<String, Value> {
        match self.prefs.get(keys::CUSTOM_THEMES).await {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

fn decode_palette(name: &str, value: Value) -> Option<Palette> {
    match serde_json::from_value::<PartialPalette>(value) {
        Ok(partial) => Some(normalize(&partial)),
        Err(e) => {
            warn!("Ignoring malformed custom theme '{}': {}", name, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefs::MemoryHost;
    use serde_json::json;

    fn manager() -> (ThemeManager, Arc<PreferenceStore>) {
        let prefs = Arc::new(PreferenceStore::new(MemoryHost::new()));
        (ThemeManager::new(prefs.clone()), prefs)
    }

    #[tokio::test]
    async fn test_every_builtin_sets_all_variables() {
        let (themes, _) = manager();
        for (variant, _) in builtin_variants() {
            let mut doc = StyleDocument::new();
            let applied = themes.apply_theme_variables(&mut doc, variant).await;
            assert_eq!(applied, variant);
            assert_eq!(doc.attribute("data-theme"), Some(variant));
            for property in CSS_VARIABLES {
                let value = doc.property(property).unwrap_or("");
                assert!(!value.is_empty(), "{} missing for {}", property, variant);
            }
        }
    }

    #[tokio::test]
    async fn test_unknown_variant_falls_back() {
        let (themes, _) = manager();
        let mut doc = StyleDocument::new();
        let applied = themes.apply_theme_variables(&mut doc, "vaporwave").await;
        assert_eq!(applied, DEFAULT_VARIANT);
        assert_eq!(doc.property("--accent"), Some(default_palette().accent.as_str()));
    }

    #[test]
    fn test_apply_from_partial_object() {
        let mut doc = StyleDocument::new();
        let partial = PartialPalette::from_anchors("#112233", "#000000");
        apply_theme_from_object(&mut doc, "preview", &partial);

        assert_eq!(doc.attribute("data-theme"), Some("preview"));
        for property in ["--accent-muted", "--surface", "--glass-bg", "--text", "--border"] {
            let value = doc.property(property).unwrap();
            assert!(!value.is_empty() && !value.contains("undefined"));
        }
    }

    #[tokio::test]
    async fn test_custom_theme_lifecycle() {
        let (themes, prefs) = manager();
        let stored = themes
            .set_custom_theme("Swamp", &PartialPalette::from_anchors("#33aa55", "#0b140d"))
            .await
            .unwrap();

        let raw = prefs.get(keys::CUSTOM_THEMES).await.unwrap();
        assert_eq!(raw["Swamp"]["accent"], json!("#33aa55"));

        let mut doc = StyleDocument::new();
        let applied = themes.select(&mut doc, "custom:Swamp").await;
        assert_eq!(applied, "custom:Swamp");
        assert_eq!(doc.property("--glass-bg"), Some(stored.glass_bg.as_str()));

        assert!(themes.delete_custom_theme("Swamp").await);
        assert!(!themes.delete_custom_theme("Swamp").await);
        assert_eq!(
            prefs.get_string(keys::THEME_VARIANT).await.as_deref(),
            Some(DEFAULT_VARIANT)
        );

        let applied = themes.apply_theme_variables(&mut doc, "custom:Swamp").await;
        assert_eq!(applied, DEFAULT_VARIANT);
    }

    #[tokio::test]
    async fn test_custom_theme_name_rules() {
        let (themes, _) = manager();
        let partial = PartialPalette::default();
        assert!(matches!(
            themes.set_custom_theme("  ", &partial).await,
            Err(ThemeError::EmptyName)
        ));
        assert!(matches!(
            themes.set_custom_theme("onyx", &partial).await,
            Err(ThemeError::ReservedName(_))
        ));
    }

    #[tokio::test]
    async fn test_custom_theme_stored_as_full_object() {
        let (themes, prefs) = manager();
        let stored = themes
            .set_custom_theme("Bog", &PartialPalette::from_anchors("#112233", "#000000"))
            .await
            .unwrap();

        let raw = prefs.get(keys::CUSTOM_THEMES).await.unwrap();
        let entry = raw["Bog"].as_object().unwrap();
        assert!(entry.values().all(|v| v.as_str().is_some_and(|s| !s.is_empty())));
        assert_eq!(themes.custom_themes().await["Bog"], stored);
    }

    #[test]
    fn test_encode_error_is_reported() {
        let source = serde_json::from_str::<Value>("{").unwrap_err();
        let err = ThemeError::from(source);
        assert!(matches!(err, ThemeError::Encode(_)));
        assert!(err.to_string().starts_with("Failed to encode theme"));
    }

    #[tokio::test]
    async fn test_malformed_custom_theme_is_skipped() {
        let (themes, prefs) = manager();
        prefs
            .set(
                keys::CUSTOM_THEMES,
                json!({"Broken": "nope", "Partial": {"accent": "#ff0000"}}),
            )
            .await;

        let customs = themes.custom_themes().await;
        assert_eq!(customs.len(), 1);
        assert_eq!(customs["Partial"].accent, "#ff0000");
    }
}

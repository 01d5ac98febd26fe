//! Font manager
//!
//! Lists font files from the fonts directory and projects the selected font
//! onto the style document as an embedded `@font-face` plus selectors that
//! force the family everywhere. The preference store's `SelectedFont` is the
//! only authoritative state; the document is recomputed from it.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use base64::Engine;
use tracing::{debug, info, warn};

use crate::prefs::{keys, PreferenceStore};
use crate::style::StyleDocument;

/// Name of the synthetic entry meaning "no custom font"
pub const SYSTEM_FONT: &str = "system";

/// Upper bound on reading a font file before giving up
const FONT_LOAD_TIMEOUT: Duration = Duration::from_secs(5);

const FONT_STYLE_ID: &str = "frog-custom-font";
const FONT_ATTRIBUTE: &str = "data-font";
const FONT_PROPERTY: &str = "--app-font";

const FONT_EXTENSIONS: [&str; 4] = ["ttf", "otf", "woff", "woff2"];

/// Filename patterns (lowercase, separators stripped) with canonical names
const KNOWN_FONTS: [(&str, &str); 6] = [
    ("jetbrainsmono", "JetBrains Mono"),
    ("firacode", "Fira Code"),
    ("cascadiacode", "Cascadia Code"),
    ("comicneue", "Comic Neue"),
    ("beaufortforlol", "Beaufort for LoL"),
    ("spiegel", "Spiegel"),
];

/// Component classes that set their own font family
const FORCED_CLASSES: [&str; 10] = [
    ".MuiTypography-root",
    ".MuiButton-root",
    ".MuiInputBase-root",
    ".MuiInputBase-input",
    ".MuiMenuItem-root",
    ".MuiTab-root",
    ".MuiChip-label",
    ".MuiTooltip-tooltip",
    ".MuiFormLabel-root",
    ".MuiListItemText-primary",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontEntry {
    /// File stem, or `system`
    pub name: String,
    pub display_name: String,
    /// `None` for the system entry
    pub file: Option<PathBuf>,
}

impl FontEntry {
    fn system() -> Self {
        Self {
            name: SYSTEM_FONT.to_string(),
            display_name: "System Default".to_string(),
            file: None,
        }
    }
}

/// What the document currently shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontState {
    System,
    Custom(String),
}

impl FontState {
    pub fn of(doc: &StyleDocument) -> Self {
        match doc.attribute(FONT_ATTRIBUTE) {
            Some(name) => FontState::Custom(name.to_string()),
            None => FontState::System,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            FontState::System => SYSTEM_FONT,
            FontState::Custom(name) => name,
        }
    }
}

/// Web font format from magic bytes
fn detect_font_format(bytes: &[u8]) -> Option<&'static str> {
    if bytes.len() < 4 {
        return None;
    }
    match bytes[..4] {
        [0x00, 0x01, 0x00, 0x00] | [b't', b'r', b'u', b'e'] => Some("truetype"),
        [b'O', b'T', b'T', b'O'] => Some("opentype"),
        [b'w', b'O', b'F', b'F'] => Some("woff"),
        [b'w', b'O', b'F', b'2'] => Some("woff2"),
        _ => None,
    }
}

/// Display name for a font file stem
fn display_name(stem: &str) -> String {
    let squashed: String = stem
        .chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .flat_map(char::to_lowercase)
        .collect();
    for (pattern, canonical) in KNOWN_FONTS {
        if squashed.starts_with(pattern) {
            return canonical.to_string();
        }
    }
    stem.replace(['-', '_'], " ")
}

fn family_name(name: &str) -> String {
    format!("FrogCustom-{}", name.replace(|c: char| !c.is_ascii_alphanumeric(), ""))
}

/// Style block declaring the embedded face and forcing it onto everything
fn font_css(family: &str, format: &str, encoded: &str) -> String {
    let mime = match format {
        "truetype" => "font/ttf",
        "opentype" => "font/otf",
        "woff2" => "font/woff2",
        _ => "font/woff",
    };

    let mut selectors = vec![
        "html body *".to_string(),
        "html body *::before".to_string(),
        "html body *::after".to_string(),
        "html body input".to_string(),
        "html body textarea".to_string(),
        "html body button".to_string(),
        "html body select".to_string(),
    ];
    selectors.extend(FORCED_CLASSES.iter().map(|c| format!("html body {}", c)));

    format!(
        "@font-face {{\n  font-family: '{family}';\n  src: url(data:{mime};base64,{encoded}) format('{format}');\n  font-display: block;\n}}\n\n{} {{\n  font-family: '{family}', sans-serif !important;\n}}\n",
        selectors.join(",\n")
    )
}

pub struct FontManager {
    prefs: Arc<PreferenceStore>,
    fonts_dir: PathBuf,
}

impl FontManager {
    pub fn new(prefs: Arc<PreferenceStore>, fonts_dir: impl Into<PathBuf>) -> Self {
        Self {
            prefs,
            fonts_dir: fonts_dir.into(),
        }
    }

    /// Fonts directory from preferences, else `~/.local/share/frogtools/fonts`
    pub async fn from_prefs(prefs: Arc<PreferenceStore>) -> Result<Self> {
        let dir = match prefs.get_path(keys::FONTS_DIRECTORY).await {
            Some(dir) => dir,
            None => dirs::data_dir()
                .context("Could not determine data directory")?
                .join("frogtools")
                .join("fonts"),
        };
        Ok(Self::new(prefs, dir))
    }

    pub fn fonts_dir(&self) -> &Path {
        &self.fonts_dir
    }

    /// Available fonts, `system` first. Creates the directory if missing.
    pub fn scan_fonts(&self) -> Result<Vec<FontEntry>> {
        std::fs::create_dir_all(&self.fonts_dir)
            .with_context(|| format!("Failed to create {:?}", self.fonts_dir))?;

        let mut fonts = Vec::new();
        for entry in std::fs::read_dir(&self.fonts_dir)
            .with_context(|| format!("Failed to read {:?}", self.fonts_dir))?
        {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let is_font = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| FONT_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if !is_font || stem == SYSTEM_FONT {
                continue;
            }
            fonts.push(FontEntry {
                name: stem.to_string(),
                display_name: display_name(stem),
                file: Some(path.clone()),
            });
        }

        fonts.sort_by(|a, b| {
            a.display_name
                .to_lowercase()
                .cmp(&b.display_name.to_lowercase())
                .then_with(|| a.name.cmp(&b.name))
        });
        fonts.insert(0, FontEntry::system());
        Ok(fonts)
    }

    /// Apply `name` and persist it. Returns `false` if the font could not be
    /// loaded, in which case nothing changes.
    pub async fn apply_font(&self, doc: &mut StyleDocument, name: &str) -> bool {
        let saved = self.prefs.get_string(keys::SELECTED_FONT).await;
        if FontState::of(doc).name() == name && saved.as_deref() == Some(name) {
            debug!("Font {} already applied", name);
            return true;
        }

        if name == SYSTEM_FONT {
            clear_projection(doc);
            self.prefs.set(keys::SELECTED_FONT, SYSTEM_FONT).await;
            info!("Switched to system font");
            return true;
        }

        let entry = match self.scan_fonts() {
            Ok(fonts) => fonts.into_iter().find(|f| f.name == name),
            Err(e) => {
                warn!("Could not scan fonts: {:#}", e);
                None
            }
        };
        let Some(path) = entry.and_then(|e| e.file) else {
            warn!("Font {} not found in {:?}", name, self.fonts_dir);
            return false;
        };

        let css = match load_font_css(name, &path).await {
            Ok(css) => css,
            Err(e) => {
                warn!("Failed to load font {}: {:#}", name, e);
                return false;
            }
        };

        doc.inject_style(FONT_STYLE_ID, css);
        doc.set_attribute(FONT_ATTRIBUTE, name);
        doc.set_property(FONT_PROPERTY, format!("'{}', sans-serif", family_name(name)));
        self.prefs.set(keys::SELECTED_FONT, name).await;
        info!("Applied font {}", name);
        true
    }

    /// Re-project the saved font onto `doc`.
    ///
    /// A saved font that no longer exists falls back to `system` and the
    /// stale preference is overwritten.
    pub async fn ensure_font_persistence(&self, doc: &mut StyleDocument) -> FontState {
        let saved = self
            .prefs
            .get_string(keys::SELECTED_FONT)
            .await
            .unwrap_or_else(|| SYSTEM_FONT.to_string());

        if saved != SYSTEM_FONT {
            let available = self
                .scan_fonts()
                .map(|fonts| fonts.iter().any(|f| f.name == saved))
                .unwrap_or(false);
            if !available {
                warn!("Saved font {} is missing, reverting to system", saved);
                clear_projection(doc);
                self.prefs.set(keys::SELECTED_FONT, SYSTEM_FONT).await;
                return FontState::System;
            }
        }

        if FontState::of(doc).name() != saved && !self.apply_font(doc, &saved).await {
            clear_projection(doc);
            self.prefs.set(keys::SELECTED_FONT, SYSTEM_FONT).await;
        }
        FontState::of(doc)
    }
}

fn clear_projection(doc: &mut StyleDocument) {
    doc.remove_style(FONT_STYLE_ID);
    doc.remove_attribute(FONT_ATTRIBUTE);
    doc.remove_property(FONT_PROPERTY);
}

/// Read, validate and embed a font file
async fn load_font_css(name: &str, path: &Path) -> Result<String> {
    let bytes = tokio::time::timeout(FONT_LOAD_TIMEOUT, tokio::fs::read(path))
        .await
        .with_context(|| format!("Timed out reading {:?}", path))?
        .with_context(|| format!("Failed to read {:?}", path))?;

    let format = detect_font_format(&bytes)
        .with_context(|| format!("{:?} is not a TrueType, OpenType or WOFF font", path))?;

    let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
    Ok(font_css(&family_name(name), format, &encoded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefs::MemoryHost;
    use tempfile::TempDir;

    const TTF_HEADER: [u8; 8] = [0x00, 0x01, 0x00, 0x00, 0x00, 0x0a, 0x00, 0x80];

    fn setup() -> (TempDir, FontManager, Arc<PreferenceStore>) {
        let temp = TempDir::new().unwrap();
        let prefs = Arc::new(PreferenceStore::new(MemoryHost::new()));
        let manager = FontManager::new(prefs.clone(), temp.path().join("fonts"));
        (temp, manager, prefs)
    }

    #[test]
    fn test_scan_creates_dir_and_lists_system_first() {
        let (_temp, manager, _) = setup();
        let fonts = manager.scan_fonts().unwrap();
        assert!(manager.fonts_dir().exists());
        assert_eq!(fonts, vec![FontEntry::system()]);

        std::fs::write(manager.fonts_dir().join("JetBrainsMono-Regular.ttf"), TTF_HEADER).unwrap();
        std::fs::write(manager.fonts_dir().join("my_cool-font.otf"), b"OTTO....").unwrap();
        std::fs::write(manager.fonts_dir().join("readme.txt"), b"hi").unwrap();

        let fonts = manager.scan_fonts().unwrap();
        let names: Vec<_> = fonts.iter().map(|f| f.display_name.as_str()).collect();
        assert_eq!(names, vec!["System Default", "JetBrains Mono", "my cool font"]);
    }

    #[test]
    fn test_detect_font_format() {
        assert_eq!(detect_font_format(&TTF_HEADER), Some("truetype"));
        assert_eq!(detect_font_format(b"wOF2abcd"), Some("woff2"));
        assert_eq!(detect_font_format(b"PK\x03\x04"), None);
        assert_eq!(detect_font_format(b"ab"), None);
    }

    #[tokio::test]
    async fn test_apply_custom_then_system() {
        let (_temp, manager, prefs) = setup();
        manager.scan_fonts().unwrap();
        std::fs::write(manager.fonts_dir().join("Spiegel.ttf"), TTF_HEADER).unwrap();

        let mut doc = StyleDocument::new();
        assert!(manager.apply_font(&mut doc, "Spiegel").await);
        assert_eq!(FontState::of(&doc), FontState::Custom("Spiegel".into()));
        assert_eq!(doc.property("--app-font"), Some("'FrogCustom-Spiegel', sans-serif"));
        let css = doc.style(FONT_STYLE_ID).unwrap();
        assert!(css.contains("@font-face"));
        assert!(css.contains("format('truetype')"));
        assert!(css.contains(".MuiButton-root"));
        assert_eq!(prefs.get_string(keys::SELECTED_FONT).await.as_deref(), Some("Spiegel"));

        assert!(manager.apply_font(&mut doc, SYSTEM_FONT).await);
        assert_eq!(doc, StyleDocument::new());
        assert_eq!(prefs.get_string(keys::SELECTED_FONT).await.as_deref(), Some("system"));
    }

    #[tokio::test]
    async fn test_unreadable_font_changes_nothing() {
        let (_temp, manager, prefs) = setup();
        manager.scan_fonts().unwrap();
        std::fs::write(manager.fonts_dir().join("Broken.ttf"), b"not a font").unwrap();

        let mut doc = StyleDocument::new();
        assert!(!manager.apply_font(&mut doc, "Broken").await);
        assert!(!manager.apply_font(&mut doc, "Missing").await);
        assert_eq!(doc, StyleDocument::new());
        assert_eq!(prefs.get_string(keys::SELECTED_FONT).await.as_deref(), Some("system"));
    }

    #[tokio::test]
    async fn test_persistence_reprojects_saved_font() {
        let (_temp, manager, prefs) = setup();
        manager.scan_fonts().unwrap();
        std::fs::write(manager.fonts_dir().join("FiraCode-Bold.woff"), b"wOFFxxxx").unwrap();
        prefs.set(keys::SELECTED_FONT, "FiraCode-Bold").await;

        let mut doc = StyleDocument::new();
        let state = manager.ensure_font_persistence(&mut doc).await;
        assert_eq!(state, FontState::Custom("FiraCode-Bold".into()));
        assert!(doc.style(FONT_STYLE_ID).unwrap().contains("font/woff;base64"));
    }

    #[tokio::test]
    async fn test_persistence_drops_missing_font() {
        let (_temp, manager, prefs) = setup();
        prefs.set(keys::SELECTED_FONT, "Gone").await;

        let mut doc = StyleDocument::new();
        doc.set_attribute(FONT_ATTRIBUTE, "Gone");
        let state = manager.ensure_font_persistence(&mut doc).await;

        assert_eq!(state, FontState::System);
        assert_eq!(doc.attribute(FONT_ATTRIBUTE), None);
        assert_eq!(prefs.get_string(keys::SELECTED_FONT).await.as_deref(), Some("system"));
    }
}

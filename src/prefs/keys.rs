//! Well-known preference keys and their defaults.

use serde_json::{json, Map, Value};

pub const LEAGUE_PATH: &str = "LeaguePath";
pub const EXTRACTION_PATH: &str = "ExtractionPath";
pub const HASHES_PATH: &str = "HashesPath";
pub const RITOBIN_PATH: &str = "RitobinPath";
pub const BACKEND_URL: &str = "BackendUrl";
pub const SELECTED_FONT: &str = "SelectedFont";
pub const FONTS_DIRECTORY: &str = "FontsDirectory";
pub const THEME_VARIANT: &str = "ThemeVariant";
pub const CUSTOM_THEMES: &str = "CustomThemes";
pub const EXTRACT_VOICEOVER: &str = "ExtractVoiceover";
pub const AUTO_UPDATE_ENABLED: &str = "AutoUpdateEnabled";
pub const GITHUB_USERNAME: &str = "GitHubUsername";
pub const GITHUB_TOKEN: &str = "GitHubToken";
pub const GITHUB_REPO: &str = "GitHubRepo";

pub const SHOW_FROG_CHANGER: &str = "ShowFrogChanger";
pub const SHOW_PAINT: &str = "ShowPaint";
pub const SHOW_PORT: &str = "ShowPort";
pub const SHOW_VFX_HUB: &str = "ShowVfxHub";
pub const SHOW_BIN_EDITOR: &str = "ShowBinEditor";
pub const SHOW_UPSCALE: &str = "ShowUpscale";
pub const SHOW_HUD_EDITOR: &str = "ShowHudEditor";

/// Page visibility toggles shown on the settings screen
pub const PAGE_VISIBILITY: [&str; 7] = [
    SHOW_FROG_CHANGER,
    SHOW_PAINT,
    SHOW_PORT,
    SHOW_VFX_HUB,
    SHOW_BIN_EDITOR,
    SHOW_UPSCALE,
    SHOW_HUD_EDITOR,
];

/// Keys whose value is `true` unless the host explicitly stored `false`
pub const DEFAULT_TRUE: [&str; 9] = [
    EXTRACT_VOICEOVER,
    AUTO_UPDATE_ENABLED,
    SHOW_FROG_CHANGER,
    SHOW_PAINT,
    SHOW_PORT,
    SHOW_VFX_HUB,
    SHOW_BIN_EDITOR,
    SHOW_UPSCALE,
    SHOW_HUD_EDITOR,
];

pub const DEFAULT_FONT: &str = "system";
pub const DEFAULT_THEME: &str = "onyx";

/// The mapping used when no host is available, and the base every host
/// read is merged over.
pub fn defaults() -> Map<String, Value> {
    let mut map = Map::new();
    for key in DEFAULT_TRUE {
        map.insert(key.to_string(), Value::Bool(true));
    }
    map.insert(SELECTED_FONT.to_string(), json!(DEFAULT_FONT));
    map.insert(THEME_VARIANT.to_string(), json!(DEFAULT_THEME));
    map.insert(CUSTOM_THEMES.to_string(), Value::Object(Map::new()));
    map
}

/// Merge a host read over the defaults.
///
/// Absent keys take their default. Default-true keys stay `true` unless the
/// host holds the boolean `false`.
pub fn merge_with_defaults(stored: Map<String, Value>) -> Map<String, Value> {
    let mut merged = defaults();
    for (key, value) in stored {
        merged.insert(key, value);
    }
    for key in DEFAULT_TRUE {
        let explicit_false = matches!(merged.get(key), Some(Value::Bool(false)));
        merged.insert(key.to_string(), Value::Bool(!explicit_false));
    }
    if !merged.get(CUSTOM_THEMES).is_some_and(Value::is_object) {
        merged.insert(CUSTOM_THEMES.to_string(), Value::Object(Map::new()));
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_booleans() {
        let map = defaults();
        for key in DEFAULT_TRUE {
            assert_eq!(map.get(key), Some(&Value::Bool(true)));
        }
        assert_eq!(map.get(THEME_VARIANT), Some(&json!("onyx")));
    }

    #[test]
    fn test_merge_respects_explicit_false_only() {
        let mut stored = Map::new();
        stored.insert(SHOW_PAINT.into(), Value::Bool(false));
        stored.insert(SHOW_PORT.into(), json!("false"));
        stored.insert(LEAGUE_PATH.into(), json!("C:/Riot Games/League of Legends"));
        stored.insert(CUSTOM_THEMES.into(), json!(null));

        let merged = merge_with_defaults(stored);
        assert_eq!(merged.get(SHOW_PAINT), Some(&Value::Bool(false)));
        // Only the boolean false counts as explicit
        assert_eq!(merged.get(SHOW_PORT), Some(&Value::Bool(true)));
        assert_eq!(
            merged.get(LEAGUE_PATH),
            Some(&json!("C:/Riot Games/League of Legends"))
        );
        assert!(merged.get(CUSTOM_THEMES).unwrap().is_object());
    }
}

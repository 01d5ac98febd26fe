//! Champion, skin and chroma types, plus the raw CDN shapes they decode from.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

/// A playable champion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Champion {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub alias: String,
}

impl Champion {
    /// Name safe for WAD filenames (`MonkeyKing`, `KSante`, ...)
    pub fn file_safe_name(&self) -> String {
        let source = if self.alias.is_empty() { &self.name } else { &self.alias };
        source.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
    }

    /// The synthetic "None" row the summary endpoint starts with
    pub(crate) fn is_placeholder(&self) -> bool {
        self.id == "-1" || self.name.eq_ignore_ascii_case("none")
    }
}

/// A skin of one champion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skin {
    /// Skin number within the champion (0 = base skin)
    pub id: u32,
    pub name: String,
    pub rarity: String,
    /// Composite id, `"<championId><NNN>"`
    pub full_id: String,
}

/// A colour variant of a skin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chroma {
    /// Global skin id of the chroma
    pub id: u64,
    pub name: String,
    /// Primary swatch colour
    pub color: String,
    pub image_url: String,
}

/// Composite skin id: champion id followed by the 3-digit skin number
pub fn composite_skin_id(champion_id: &str, skin_number: u32) -> String {
    format!("{}{:03}", champion_id, skin_number)
}

/// Skin number from a composite id, if it belongs to `champion_id`
pub fn skin_number_for(champion_id: &str, composite: &str) -> Option<u32> {
    let suffix = composite.strip_prefix(champion_id)?;
    if suffix.len() != 3 || !suffix.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}

/// Entry of the bulk skins catalog
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct RawSkin {
    pub name: String,
    pub rarity: Option<String>,
}

impl RawSkin {
    /// `kEpic` -> `Epic`, missing -> `NoRarity`
    pub fn rarity_label(&self) -> String {
        let raw = self.rarity.as_deref().unwrap_or("kNoRarity");
        match raw.strip_prefix('k') {
            Some(rest) if rest.starts_with(|c: char| c.is_ascii_uppercase()) => rest.to_string(),
            _ => raw.to_string(),
        }
    }
}

pub(crate) type RawSkinCatalog = HashMap<String, RawSkin>;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct RawChroma {
    pub id: u64,
    pub name: String,
    pub colors: Vec<String>,
}

/// Per-champion detail document
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawChampionDetail {
    pub skins: Vec<RawDetailSkin>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawDetailSkin {
    pub id: u64,
    pub name: String,
    pub chromas: Vec<RawChroma>,
}

/// Accept ids sent either as JSON strings or numbers
fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

//! CDN endpoints and image URL templates.

const DDRAGON: &str = "https://ddragon.leagueoflegends.com";
const CDRAGON_GAME_DATA: &str =
    "https://raw.communitydragon.org/latest/plugins/rcp-be-lol-game-data/global/default";

/// JSON endpoints the catalog reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub versions: String,
    pub champion_summary: String,
    pub skins: String,
    /// Prefix for `<id>.json` per-champion documents
    pub champion_detail_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            versions: format!("{}/api/versions.json", DDRAGON),
            champion_summary: format!("{}/v1/champion-summary.json", CDRAGON_GAME_DATA),
            skins: format!("{}/v1/skins.json", CDRAGON_GAME_DATA),
            champion_detail_base: format!("{}/v1/champions", CDRAGON_GAME_DATA),
        }
    }
}

impl Endpoints {
    pub fn champion_detail(&self, champion_id: &str) -> String {
        format!("{}/{}.json", self.champion_detail_base, champion_id)
    }
}

/// Square champion icon for a patch version
pub fn champion_icon_url(version: &str, alias: &str) -> String {
    format!("{}/cdn/{}/img/champion/{}.png", DDRAGON, version, alias)
}

/// Full splash art of a skin
pub fn skin_splash_url(alias: &str, skin_number: u32) -> String {
    format!("{}/cdn/img/champion/splash/{}_{}.jpg", DDRAGON, alias, skin_number)
}

/// Loading-screen tile of a skin
pub fn skin_tile_url(alias: &str, skin_number: u32) -> String {
    format!("{}/cdn/img/champion/loading/{}_{}.jpg", DDRAGON, alias, skin_number)
}

/// Preview image of a chroma
pub fn chroma_image_url(champion_id: &str, chroma_id: u64) -> String {
    format!(
        "{}/v1/champion-chroma-images/{}/{}.png",
        CDRAGON_GAME_DATA, champion_id, chroma_id
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_templates() {
        assert_eq!(
            champion_icon_url("14.1.1", "Annie"),
            "https://ddragon.leagueoflegends.com/cdn/14.1.1/img/champion/Annie.png"
        );
        assert!(skin_splash_url("Annie", 3).ends_with("/splash/Annie_3.jpg"));
        assert!(skin_tile_url("Olaf", 0).ends_with("/loading/Olaf_0.jpg"));
        assert!(chroma_image_url("1", 1012).ends_with("/champion-chroma-images/1/1012.png"));
    }

    #[test]
    fn test_detail_endpoint() {
        let endpoints = Endpoints::default();
        assert!(endpoints.champion_detail("103").ends_with("/v1/champions/103.json"));
    }
}

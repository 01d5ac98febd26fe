//! Locating champion WADs and naming extraction output.

use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::backend::ExtractRequest;
use crate::catalog::Champion;

use super::selection::Selection;

const WAD_SUFFIX: &str = ".wad.client";

/// `<league>/Game/DATA/FINAL/Champions`, also accepting a league path that
/// already points at the `Game` folder
pub fn champions_dir(league_path: &Path) -> PathBuf {
    let direct = league_path.join("DATA").join("FINAL").join("Champions");
    if direct.is_dir() {
        return direct;
    }
    league_path
        .join("Game")
        .join("DATA")
        .join("FINAL")
        .join("Champions")
}

/// Main archive of a champion, e.g. `MonkeyKing.wad.client`
pub fn main_wad(league_path: &Path, champion: &Champion) -> PathBuf {
    champions_dir(league_path).join(format!("{}{}", champion.file_safe_name(), WAD_SUFFIX))
}

/// Voiceover archives `<Name>.<locale>.wad.client` next to the main WAD,
/// sorted by file name
pub fn voiceover_wads(league_path: &Path, champion: &Champion) -> Vec<PathBuf> {
    let dir = champions_dir(league_path);
    let pattern = format!(
        r"(?i)^{}\.[a-z]{{2}}_[a-z]{{2}}\.wad\.client$",
        regex::escape(&champion.file_safe_name())
    );
    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(e) => {
            warn!("Bad voiceover pattern for {}: {}", champion.name, e);
            return Vec::new();
        }
    };

    let mut found: Vec<PathBuf> = WalkDir::new(&dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| re.is_match(&e.file_name().to_string_lossy()))
        .map(|e| e.into_path())
        .collect();
    found.sort();
    debug!("{} voiceover WADs for {} in {}", found.len(), champion.name, dir.display());
    found
}

/// Output folder for one selection: `<Alias>_skin<N>[_chroma<id>]`
pub fn output_dir(extraction_root: &Path, selection: &Selection) -> PathBuf {
    let mut name = format!(
        "{}_skin{}",
        selection.champion.file_safe_name(),
        selection.skin.id
    );
    if let Some(chroma) = &selection.chroma {
        name.push_str(&format!("_chroma{}", chroma.id));
    }
    extraction_root.join(name)
}

/// Request for `wad` carrying the selection's own identifiers
pub fn extract_request(
    selection: &Selection,
    wad: PathBuf,
    extraction_root: &Path,
    hash_path: &Path,
) -> ExtractRequest {
    ExtractRequest {
        wad_path: wad,
        output_dir: output_dir(extraction_root, selection),
        skin_id: selection.skin.id,
        chroma_id: selection.chroma.as_ref().map(|c| c.id),
        hash_path: hash_path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn wukong() -> Champion {
        Champion {
            id: "62".into(),
            name: "Wukong".into(),
            alias: "MonkeyKing".into(),
        }
    }

    #[test]
    fn test_main_wad_uses_file_safe_name() {
        let wad = main_wad(Path::new("/league"), &wukong());
        assert_eq!(
            wad,
            PathBuf::from("/league/Game/DATA/FINAL/Champions/MonkeyKing.wad.client")
        );
    }

    #[test]
    fn test_voiceover_discovery() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("Game/DATA/FINAL/Champions");
        fs::create_dir_all(&dir).unwrap();
        for name in [
            "MonkeyKing.wad.client",
            "MonkeyKing.en_US.wad.client",
            "MonkeyKing.ko_KR.wad.client",
            "MonkeyKingX.en_US.wad.client",
            "Annie.en_US.wad.client",
        ] {
            fs::write(dir.join(name), b"").unwrap();
        }

        let found: Vec<_> = voiceover_wads(temp.path(), &wukong())
            .into_iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            found,
            vec!["MonkeyKing.en_US.wad.client", "MonkeyKing.ko_KR.wad.client"]
        );
    }

    #[test]
    fn test_game_folder_as_league_path() {
        let temp = tempfile::tempdir().unwrap();
        let game = temp.path().join("Game");
        fs::create_dir_all(game.join("DATA/FINAL/Champions")).unwrap();
        assert_eq!(champions_dir(&game), game.join("DATA/FINAL/Champions"));
    }

    #[test]
    fn test_missing_champions_dir_has_no_voiceovers() {
        let temp = tempfile::tempdir().unwrap();
        assert!(voiceover_wads(temp.path(), &wukong()).is_empty());
    }
}

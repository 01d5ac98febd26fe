//! Repath job planning: selections grouped by champion.

use std::path::{Path, PathBuf};

use crate::backend::RepathRequest;
use crate::catalog::{Champion, Skin};

use super::prefix::{PrefixMap, PrefixTarget, DEFAULT_PREFIX};
use super::selection::Selection;

/// All selected skins of one champion; they share one source WAD
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChampionJob {
    pub champion: Champion,
    pub skins: Vec<Skin>,
}

impl ChampionJob {
    pub fn skin_ids(&self) -> Vec<u32> {
        self.skins.iter().map(|s| s.id).collect()
    }

    /// Distinct prefixes chosen for this champion's skins, in skin order
    pub fn distinct_prefixes(&self, prefixes: &PrefixMap) -> Vec<String> {
        let mut distinct: Vec<String> = Vec::new();
        for skin in &self.skins {
            let prefix = prefixes
                .get(&skin.full_id)
                .map(String::as_str)
                .unwrap_or(DEFAULT_PREFIX);
            if !distinct.iter().any(|p| p == prefix) {
                distinct.push(prefix.to_string());
            }
        }
        distinct
    }

    /// Extraction target feeding the repath step
    pub fn source_dir(&self, extraction_root: &Path) -> PathBuf {
        extraction_root.join(format!("{}_repath_source", self.champion.file_safe_name()))
    }

    pub fn output_dir(&self, extraction_root: &Path) -> PathBuf {
        extraction_root.join(format!("{}_bumpath", self.champion.file_safe_name()))
    }

    pub fn repath_request(
        &self,
        extraction_root: &Path,
        hash_path: &Path,
        prefix: &str,
    ) -> RepathRequest {
        RepathRequest {
            source_dir: self.source_dir(extraction_root),
            output_dir: self.output_dir(extraction_root),
            selected_skin_ids: self.skin_ids(),
            hash_path: hash_path.to_path_buf(),
            ignore_missing: true,
            combine_linked: true,
            custom_prefix: prefix.to_string(),
            process_together: self.skins.len() > 1,
        }
    }
}

/// Champions in first-selection order, each with its selected skins
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepathJobSpec {
    pub champions: Vec<ChampionJob>,
}

impl RepathJobSpec {
    /// Group `selections` by champion. Chromas of an already listed skin
    /// add nothing: repath works on whole skins.
    pub fn from_selections(selections: &[Selection]) -> Self {
        let mut champions: Vec<ChampionJob> = Vec::new();
        for selection in selections {
            let job = match champions
                .iter_mut()
                .position(|j| j.champion.id == selection.champion.id)
            {
                Some(pos) => &mut champions[pos],
                None => {
                    champions.push(ChampionJob {
                        champion: selection.champion.clone(),
                        skins: Vec::new(),
                    });
                    let last = champions.len() - 1;
                    &mut champions[last]
                }
            };
            if !job.skins.iter().any(|s| s.id == selection.skin.id) {
                job.skins.push(selection.skin.clone());
            }
        }
        Self { champions }
    }

    pub fn is_empty(&self) -> bool {
        self.champions.is_empty()
    }

    /// Every skin across every champion, in job order
    pub fn prefix_targets(&self) -> Vec<PrefixTarget> {
        self.champions
            .iter()
            .flat_map(|job| {
                job.skins.iter().map(|skin| PrefixTarget {
                    champion: job.champion.name.clone(),
                    skin_name: skin.name.clone(),
                    skin_id: skin.id,
                    full_id: skin.full_id.clone(),
                })
            })
            .collect()
    }
}

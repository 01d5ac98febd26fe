//! Champion, skin and chroma catalog backed by the public game-data CDNs.
//!
//! Responses are decoded into typed structs at this boundary; a shape
//! mismatch surfaces as `CatalogError::Decode` instead of being inspected
//! at call sites. Data lives for the session only.

mod fetch;
mod types;
pub mod urls;

pub use fetch::{fetch_with_retry, with_retry, FetchError, HttpFetcher, JsonFetcher, RetryPolicy};
pub use types::{composite_skin_id, skin_number_for, Champion, Chroma, Skin};
pub use urls::Endpoints;

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use types::{RawChampionDetail, RawSkinCatalog};

/// Swatch colour for chromas without colour data
const DEFAULT_CHROMA_COLOR: &str = "#808080";

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Unexpected {what} format: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0} is empty")]
    Empty(&'static str),
}

fn decode<T: DeserializeOwned>(what: &'static str, value: Value) -> Result<T, CatalogError> {
    serde_json::from_value(value).map_err(|source| CatalogError::Decode { what, source })
}

/// Session-scoped catalog with its caches
pub struct CatalogClient<F> {
    fetcher: F,
    endpoints: Endpoints,
    retry: RetryPolicy,
    version: Option<String>,
    skins: Option<RawSkinCatalog>,
    /// Chromas keyed by `"<championName>_<skinNumber>"`
    chromas: HashMap<String, Vec<Chroma>>,
}

impl<F: JsonFetcher> CatalogClient<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            endpoints: Endpoints::default(),
            retry: RetryPolicy::CATALOG,
            version: None,
            skins: None,
            chromas: HashMap::new(),
        }
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Latest patch version (first entry of the versions list)
    pub async fn latest_version(&mut self) -> Result<String, CatalogError> {
        if let Some(version) = &self.version {
            return Ok(version.clone());
        }
        let value = fetch_with_retry(&self.fetcher, &self.endpoints.versions, self.retry).await?;
        let versions: Vec<String> = decode("versions list", value)?;
        let latest = versions
            .into_iter()
            .next()
            .ok_or(CatalogError::Empty("versions list"))?;
        self.version = Some(latest.clone());
        Ok(latest)
    }

    /// All champions sorted by name, without the placeholder row
    pub async fn champions(&self) -> Result<Vec<Champion>, CatalogError> {
        let value =
            fetch_with_retry(&self.fetcher, &self.endpoints.champion_summary, self.retry).await?;
        let mut champions: Vec<Champion> = decode("champion summary", value)?;
        champions.retain(|c| !c.is_placeholder());
        champions.sort_by(|a, b| a.name.cmp(&b.name));
        info!("Loaded {} champions", champions.len());
        Ok(champions)
    }

    /// Skins of `champion` sorted by skin number.
    ///
    /// The bulk skins catalog is fetched once and reused.
    pub async fn skins_for(&mut self, champion: &Champion) -> Result<Vec<Skin>, CatalogError> {
        if self.skins.is_none() {
            let value = self.fetcher.get_json(&self.endpoints.skins).await?;
            let catalog: RawSkinCatalog = decode("skins catalog", value)?;
            debug!("Skins catalog has {} entries", catalog.len());
            self.skins = Some(catalog);
        }
        let Some(catalog) = &self.skins else {
            return Ok(Vec::new());
        };

        let mut skins: Vec<Skin> = catalog
            .iter()
            .filter_map(|(full_id, raw)| {
                let number = skin_number_for(&champion.id, full_id)?;
                Some(Skin {
                    id: number,
                    name: raw.name.clone(),
                    rarity: raw.rarity_label(),
                    full_id: full_id.clone(),
                })
            })
            .collect();
        skins.sort_by_key(|s| s.id);
        Ok(skins)
    }

    /// Chromas of one skin, fetched at most once per session
    pub async fn chromas_for(
        &mut self,
        champion: &Champion,
        skin: &Skin,
    ) -> Result<Vec<Chroma>, CatalogError> {
        let key = format!("{}_{}", champion.name, skin.id);
        if let Some(cached) = self.chromas.get(&key) {
            return Ok(cached.clone());
        }

        let url = self.endpoints.champion_detail(&champion.id);
        let value = self.fetcher.get_json(&url).await?;
        let detail: RawChampionDetail = decode("champion detail", value)?;

        let full_id = composite_skin_id(&champion.id, skin.id);
        let chromas: Vec<Chroma> = detail
            .skins
            .into_iter()
            .find(|s| s.id.to_string() == full_id)
            .map(|s| {
                s.chromas
                    .into_iter()
                    .map(|c| Chroma {
                        id: c.id,
                        name: c.name,
                        color: c
                            .colors
                            .into_iter()
                            .next()
                            .unwrap_or_else(|| DEFAULT_CHROMA_COLOR.to_string()),
                        image_url: urls::chroma_image_url(&champion.id, c.id),
                    })
                    .collect()
            })
            .unwrap_or_default();

        debug!("{} has {} chromas", key, chromas.len());
        self.chromas.insert(key, chromas.clone());
        Ok(chromas)
    }

    /// Whether chromas for this skin are already cached
    pub fn has_cached_chromas(&self, champion: &Champion, skin: &Skin) -> bool {
        self.chromas
            .contains_key(&format!("{}_{}", champion.name, skin.id))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-process CDN fake shared by catalog and wizard tests

    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct FakeCdn {
        responses: HashMap<String, Value>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeCdn {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with(mut self, url: impl Into<String>, value: Value) -> Self {
            self.responses.insert(url.into(), value);
            self
        }

        pub fn calls_to(&self, url: &str) -> usize {
            self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
        }
    }

    impl JsonFetcher for FakeCdn {
        async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
            self.calls.lock().unwrap().push(url.to_string());
            self.responses.get(url).cloned().ok_or(FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FakeCdn;
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn annie() -> Champion {
        Champion {
            id: "1".into(),
            name: "Annie".into(),
            alias: "Annie".into(),
        }
    }

    fn cdn() -> FakeCdn {
        let endpoints = Endpoints::default();
        FakeCdn::new()
            .with(
                endpoints.champion_summary.clone(),
                json!([
                    {"id": -1, "name": "None", "alias": "None"},
                    {"id": 2, "name": "Olaf", "alias": "Olaf"},
                    {"id": 1, "name": "Annie", "alias": "Annie"}
                ]),
            )
            .with(
                endpoints.skins.clone(),
                json!({
                    "1001": {"name": "Goth Annie", "rarity": "kEpic"},
                    "1000": {"name": "Annie"},
                    "2000": {"name": "Olaf"},
                    "10001": {"name": "Not Annie"}
                }),
            )
            .with(
                endpoints.champion_detail("1"),
                json!({"skins": [
                    {"id": 1000, "name": "Annie", "chromas": []},
                    {"id": 1001, "name": "Goth Annie", "chromas": [
                        {"id": 1012, "name": "Goth Annie (Ruby)", "colors": ["#9b111e", "#000000"]},
                        {"id": 1013, "name": "Goth Annie (Pearl)"}
                    ]}
                ]}),
            )
            .with(endpoints.versions.clone(), json!(["14.2.1", "14.1.1"]))
    }

    fn client() -> CatalogClient<FakeCdn> {
        CatalogClient::new(cdn()).with_retry_policy(RetryPolicy::new(3, Duration::ZERO))
    }

    #[tokio::test]
    async fn test_champions_sorted_without_placeholder() {
        let champions = client().champions().await.unwrap();
        let names: Vec<_> = champions.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Annie", "Olaf"]);
    }

    #[tokio::test]
    async fn test_skins_filtered_by_composite_prefix() {
        let mut catalog = client();
        let skins = catalog.skins_for(&annie()).await.unwrap();
        assert_eq!(skins.len(), 2);
        assert_eq!((skins[0].id, skins[0].name.as_str()), (0, "Annie"));
        assert_eq!((skins[1].id, skins[1].name.as_str()), (1, "Goth Annie"));
        assert_eq!(skins[1].rarity, "Epic");
        assert_eq!(skins[0].rarity, "NoRarity");

        catalog.skins_for(&annie()).await.unwrap();
        assert_eq!(catalog.fetcher().calls_to(&Endpoints::default().skins), 1);
    }

    #[tokio::test]
    async fn test_chromas_fetched_once_per_skin() {
        let mut catalog = client();
        let skins = catalog.skins_for(&annie()).await.unwrap();
        let goth = &skins[1];

        let first = catalog.chromas_for(&annie(), goth).await.unwrap();
        let second = catalog.chromas_for(&annie(), goth).await.unwrap();
        assert_eq!(first, second);
        assert!(catalog.has_cached_chromas(&annie(), goth));

        let detail_url = Endpoints::default().champion_detail("1");
        assert_eq!(catalog.fetcher().calls_to(&detail_url), 1);

        assert_eq!(first.len(), 2);
        assert_eq!(first[0].color, "#9b111e");
        assert_eq!(first[1].color, DEFAULT_CHROMA_COLOR);
        assert!(first[0].image_url.ends_with("/1/1012.png"));
    }

    #[tokio::test]
    async fn test_latest_version_cached() {
        let mut catalog = client();
        assert_eq!(catalog.latest_version().await.unwrap(), "14.2.1");
        assert_eq!(catalog.latest_version().await.unwrap(), "14.2.1");
        assert_eq!(catalog.fetcher().calls_to(&Endpoints::default().versions), 1);
    }

    #[tokio::test]
    async fn test_bad_shape_is_decode_error() {
        let endpoints = Endpoints::default();
        let fake = FakeCdn::new().with(endpoints.champion_summary.clone(), json!({"not": "a list"}));
        let err = CatalogClient::new(fake).champions().await.unwrap_err();
        assert!(matches!(err, CatalogError::Decode { what: "champion summary", .. }));
    }

    #[tokio::test]
    async fn test_champion_load_retries_three_times() {
        let catalog = CatalogClient::new(FakeCdn::new())
            .with_retry_policy(RetryPolicy::new(3, Duration::ZERO));
        let err = catalog.champions().await.unwrap_err();
        assert!(matches!(err, CatalogError::Fetch(FetchError::Status { status: 404, .. })));
        assert_eq!(
            catalog.fetcher().calls_to(&Endpoints::default().champion_summary),
            3
        );
    }
}

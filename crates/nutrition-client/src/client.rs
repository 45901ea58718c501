//! HTTP client for the FSVO food composition API.

use crate::error::{LookupError, Result};
use crate::payload::{parse_details, parse_search, rank_matches, FoodMatch};
use async_trait::async_trait;
use data_loader::MacroTarget;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Anything that can look foods up by free text and by identifier.
#[async_trait]
pub trait NutritionLookup: Send + Sync {
    /// Hits for a free-text query, best match first. No hits is `Ok(vec![])`.
    async fn search(&self, query: &str) -> Result<Vec<FoodMatch>>;

    /// Energy and macros per 100 g for one food.
    async fn details(&self, id: u64) -> Result<MacroTarget>;
}

/// Resolve a free-text query to its best hit and that food's macros.
///
/// `Ok(None)` when the search has no hits.
pub async fn best_match(
    lookup: &dyn NutritionLookup,
    query: &str,
) -> Result<Option<(FoodMatch, MacroTarget)>> {
    let Some(hit) = lookup.search(query).await?.into_iter().next() else {
        return Ok(None);
    };
    let macros = lookup.details(hit.id).await?;
    Ok(Some((hit, macros)))
}

#[derive(Debug, Clone)]
pub struct FsvoConfig {
    pub base_url: String,
    pub lang: String,
    pub timeout: Duration,
}

impl Default for FsvoConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.webapp.prod.blv.foodcase-services.com/BLV_WebApp_WS/webresources/BLV-api"
                .to_string(),
            lang: "en".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl FsvoConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub struct FsvoClient {
    config: FsvoConfig,
    client: Client,
}

impl FsvoClient {
    pub fn new(config: FsvoConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        info!("FSVO client ready for {}", config.base_url);
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &FsvoConfig {
        &self.config
    }

    async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value> {
        let response = self.client.get(url).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!("FSVO request to {} failed with {}", url, status);
            return Err(LookupError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| LookupError::Payload(e.to_string()))
    }
}

#[async_trait]
impl NutritionLookup for FsvoClient {
    #[instrument(skip(self))]
    async fn search(&self, query: &str) -> Result<Vec<FoodMatch>> {
        let url = format!("{}/foods", self.config.base_url);
        let payload = self
            .get_json(&url, &[("search", query), ("lang", self.config.lang.as_str())])
            .await?;

        let mut hits = parse_search(&payload);
        rank_matches(query, &mut hits);
        debug!("FSVO search '{}' returned {} hits", query, hits.len());
        Ok(hits)
    }

    #[instrument(skip(self))]
    async fn details(&self, id: u64) -> Result<MacroTarget> {
        let url = format!("{}/food/{}", self.config.base_url, id);
        let payload = self.get_json(&url, &[("lang", self.config.lang.as_str())]).await?;
        parse_details(id, &payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// In-memory stand-in for the FSVO service.
    struct MockLookup {
        hits: Vec<FoodMatch>,
        details: HashMap<u64, MacroTarget>,
    }

    #[async_trait]
    impl NutritionLookup for MockLookup {
        async fn search(&self, query: &str) -> Result<Vec<FoodMatch>> {
            let mut hits: Vec<FoodMatch> = self
                .hits
                .iter()
                .filter(|h| h.name.to_lowercase().contains(&query.to_lowercase()))
                .cloned()
                .collect();
            rank_matches(query, &mut hits);
            Ok(hits)
        }

        async fn details(&self, id: u64) -> Result<MacroTarget> {
            self.details.get(&id).copied().ok_or(LookupError::Status {
                status: 404,
                url: format!("/food/{}", id),
            })
        }
    }

    fn mock() -> MockLookup {
        MockLookup {
            hits: vec![
                FoodMatch { name: "Chicken, breast, raw".to_string(), id: 123 },
                FoodMatch { name: "Chicken thigh".to_string(), id: 124 },
                FoodMatch { name: "Apple".to_string(), id: 456 },
            ],
            details: HashMap::from([(123, MacroTarget::new(165.0, 31.0, 3.6, 0.0))]),
        }
    }

    #[tokio::test]
    async fn test_best_match_fetches_details() {
        let lookup = mock();
        let (hit, macros) = best_match(&lookup, "chicken").await.unwrap().unwrap();
        assert_eq!(hit.id, 123);
        assert_eq!(macros.protein_g, 31.0);

        let portion = macros.per_portion(200.0);
        assert!((portion.kcal - 330.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_best_match_without_hits() {
        let lookup = mock();
        assert!(best_match(&lookup, "tofu").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_best_match_propagates_detail_errors() {
        let lookup = mock();
        let err = best_match(&lookup, "thigh").await.unwrap_err();
        assert!(matches!(err, LookupError::Status { status: 404, .. }));
    }

    #[test]
    fn test_config_defaults() {
        let config = FsvoConfig::default();
        assert!(config.base_url.ends_with("/BLV-api"));
        assert_eq!(config.lang, "en");
        assert_eq!(config.timeout, Duration::from_secs(10));

        let config = config.with_lang("de").with_timeout(Duration::from_secs(3));
        assert_eq!(config.lang, "de");
        assert_eq!(config.timeout.as_secs(), 3);
    }
}

//! Engine configuration.
//!
//! Every field has a default, so a JSON file only needs the values it
//! overrides:
//!
//! ```json
//! { "n_clusters": 10, "feature_space": "energy_and_macro_ratios" }
//! ```

use crate::error::{EngineError, Result};
use models::{FeatureSpace, KMeansConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // Cluster model
    pub n_clusters: usize,
    pub seed: u64,
    pub max_iterations: usize,
    pub tolerance: f64,
    pub n_init: usize,
    pub feature_space: FeatureSpace,

    // Similar foods
    pub overfetch_factor: usize,

    // Goal-aligned foods
    pub min_macro_density_g: f64,
    pub satisfied_completion: f64,
    pub satisfied_ratio_cap: f64,
    pub scarce_remaining_g: f64,
    pub scarce_ratio_cap: f64,
    pub distance_weight: f64,
    pub contribution_weight: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            n_clusters: 8,
            seed: 42,
            max_iterations: 300,
            tolerance: 1e-4,
            n_init: 4,
            feature_space: FeatureSpace::MacroRatios,
            overfetch_factor: 3,
            min_macro_density_g: 10.0,
            satisfied_completion: 0.5,
            satisfied_ratio_cap: 0.60,
            scarce_remaining_g: 10.0,
            scarce_ratio_cap: 0.50,
            distance_weight: 0.4,
            contribution_weight: 0.6,
        }
    }
}

impl EngineConfig {
    /// Read a JSON config file; missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| EngineError::Config(format!("cannot parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_n_clusters(mut self, n_clusters: usize) -> Self {
        self.n_clusters = n_clusters;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init;
        self
    }

    pub fn with_feature_space(mut self, feature_space: FeatureSpace) -> Self {
        self.feature_space = feature_space;
        self
    }

    pub fn with_overfetch_factor(mut self, factor: usize) -> Self {
        self.overfetch_factor = factor;
        self
    }

    pub fn with_min_macro_density(mut self, grams: f64) -> Self {
        self.min_macro_density_g = grams;
        self
    }

    pub fn with_weights(mut self, distance_weight: f64, contribution_weight: f64) -> Self {
        self.distance_weight = distance_weight;
        self.contribution_weight = contribution_weight;
        self
    }

    /// k-means settings derived from this config.
    pub fn kmeans(&self) -> KMeansConfig {
        KMeansConfig::new(self.n_clusters)
            .with_max_iterations(self.max_iterations)
            .with_tolerance(self.tolerance)
            .with_n_init(self.n_init)
            .with_seed(self.seed)
    }

    pub fn validate(&self) -> Result<()> {
        if self.overfetch_factor == 0 {
            return Err(EngineError::Config("overfetch_factor must be at least 1".to_string()));
        }
        let non_negative = [
            ("min_macro_density_g", self.min_macro_density_g),
            ("satisfied_completion", self.satisfied_completion),
            ("satisfied_ratio_cap", self.satisfied_ratio_cap),
            ("scarce_remaining_g", self.scarce_remaining_g),
            ("scarce_ratio_cap", self.scarce_ratio_cap),
            ("distance_weight", self.distance_weight),
            ("contribution_weight", self.contribution_weight),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::Config(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        self.kmeans()
            .validate()
            .map_err(|e| EngineError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"n_clusters": 5, "feature_space": "energy_and_macro_ratios"}"#)
                .unwrap();
        assert_eq!(config.n_clusters, 5);
        assert_eq!(config.feature_space, FeatureSpace::EnergyAndMacroRatios);
        assert_eq!(config.seed, 42);
        assert_eq!(config.distance_weight, 0.4);
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"seed": 7, "overfetch_factor": 5}}"#).unwrap();
        let config = EngineConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.overfetch_factor, 5);
        assert_eq!(config.kmeans().seed, 7);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(EngineConfig::default().validate().is_ok());
        assert!(matches!(
            EngineConfig::default().with_overfetch_factor(0).validate(),
            Err(EngineError::Config(_))
        ));
        assert!(matches!(
            EngineConfig::default().with_weights(-1.0, 0.6).validate(),
            Err(EngineError::Config(_))
        ));
        assert!(matches!(
            EngineConfig::default().with_n_clusters(0).validate(),
            Err(EngineError::Config(_))
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(EngineConfig::from_json_file(file.path()).is_err());
    }
}

//! Feature preparation.
//!
//! A [`FeatureSpace`] decides which raw values make up a feature row; a
//! [`FittedScaler`] holds the statistics frozen at fit time and applies
//! them identically to the training table and to query targets.

use crate::error::{ModelError, Result};
use data_loader::{FoodRecord, MacroRatios, MacroTarget};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Which values describe a food in feature space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureSpace {
    /// `[protein_pct, fat_pct, carbs_pct]`, passed through unscaled
    #[default]
    MacroRatios,
    /// `[kcal, protein_pct, fat_pct, carbs_pct]` with kcal standardized
    EnergyAndMacroRatios,
}

impl FeatureSpace {
    pub fn dimensions(&self) -> usize {
        match self {
            FeatureSpace::MacroRatios => 3,
            FeatureSpace::EnergyAndMacroRatios => 4,
        }
    }

    /// Unscaled feature row for the given energy and ratios.
    pub fn raw_row(&self, kcal: f64, ratios: &MacroRatios) -> Vec<f64> {
        let [p, f, c] = ratios.to_array();
        match self {
            FeatureSpace::MacroRatios => vec![p, f, c],
            FeatureSpace::EnergyAndMacroRatios => vec![kcal, p, f, c],
        }
    }

    /// Whether a column gets standardized. Ratio columns never do.
    fn is_standardized(&self, column: usize) -> bool {
        matches!(self, FeatureSpace::EnergyAndMacroRatios) && column == 0
    }

    pub fn label(&self) -> &'static str {
        match self {
            FeatureSpace::MacroRatios => "macro_ratios",
            FeatureSpace::EnergyAndMacroRatios => "energy_and_macro_ratios",
        }
    }
}

/// Column statistics frozen at fit time.
///
/// Passthrough columns carry mean 0 and scale 1, so `transform` is the
/// same affine map for every column.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedScaler {
    space: FeatureSpace,
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl FittedScaler {
    /// Fit on the full cleaned table.
    ///
    /// Standardized columns use the population standard deviation; a
    /// constant column gets scale 1.
    pub fn fit(space: FeatureSpace, records: &[FoodRecord]) -> Result<Self> {
        if records.is_empty() {
            return Err(ModelError::EmptyMatrix);
        }
        let raw = raw_matrix(space, records);
        let dims = space.dimensions();

        let mut mean = Array1::zeros(dims);
        let mut scale = Array1::ones(dims);
        for column in (0..dims).filter(|&c| space.is_standardized(c)) {
            let values = raw.column(column);
            let m = values.mean().unwrap_or(0.0);
            let std = values.std(0.0);
            mean[column] = m;
            scale[column] = if std > 0.0 && std.is_finite() { std } else { 1.0 };
        }

        debug!(
            "Fitted {} scaler on {} rows (mean={:?}, scale={:?})",
            space.label(),
            records.len(),
            mean,
            scale
        );
        Ok(Self { space, mean, scale })
    }

    pub fn space(&self) -> FeatureSpace {
        self.space
    }

    pub fn dimensions(&self) -> usize {
        self.space.dimensions()
    }

    /// Transform every record into a feature matrix aligned by row.
    pub fn transform_records(&self, records: &[FoodRecord]) -> Array2<f64> {
        let raw = raw_matrix(self.space, records);
        (raw - &self.mean) / &self.scale
    }

    /// Transform a single target into a feature vector.
    pub fn transform_target(&self, target: &MacroTarget) -> Array1<f64> {
        let row = Array1::from(self.space.raw_row(target.kcal, &target.ratios()));
        (row - &self.mean) / &self.scale
    }
}

fn raw_matrix(space: FeatureSpace, records: &[FoodRecord]) -> Array2<f64> {
    let rows: Vec<Vec<f64>> = records
        .iter()
        .map(|r| space.raw_row(r.energy_kcal, &r.ratios()))
        .collect();
    Array2::from_shape_fn((records.len(), space.dimensions()), |(i, j)| rows[i][j])
}

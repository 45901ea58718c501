//! Core domain types for the nutrition table.
//!
//! All macro values are grams (or kilocalories for energy) per 100 g of
//! food. Ratios always refer to the share of protein + fat + carbohydrate
//! grams; energy never takes part in a ratio.

use crate::error::{DataLoadError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Type Aliases
// =============================================================================

/// Position of a record in the cleaned table.
///
/// Row indices are the only identity a food has: names are not unique.
pub type RowIndex = usize;

/// Cluster identifier in `[0, k)`.
pub type ClusterId = usize;

// =============================================================================
// Macros
// =============================================================================

/// The three macronutrients that make up a ratio profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Macro {
    Protein,
    Fat,
    Carbs,
}

impl Macro {
    /// All macros in feature-vector order.
    pub const ALL: [Macro; 3] = [Macro::Protein, Macro::Fat, Macro::Carbs];

    pub fn label(&self) -> &'static str {
        match self {
            Macro::Protein => "protein",
            Macro::Fat => "fat",
            Macro::Carbs => "carbs",
        }
    }
}

/// Share of each macro in the total macro grams.
///
/// Either the three shares sum to 1.0, or all three are 0.0 because the
/// total was zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MacroRatios {
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
}

impl MacroRatios {
    /// Compute ratios from gram amounts.
    ///
    /// A zero total yields all-zero ratios instead of NaN.
    pub fn from_grams(protein_g: f64, fat_g: f64, carbs_g: f64) -> Self {
        let total = protein_g + fat_g + carbs_g;
        if total <= 0.0 {
            return Self::default();
        }
        Self {
            protein: protein_g / total,
            fat: fat_g / total,
            carbs: carbs_g / total,
        }
    }

    pub fn get(&self, m: Macro) -> f64 {
        match m {
            Macro::Protein => self.protein,
            Macro::Fat => self.fat,
            Macro::Carbs => self.carbs,
        }
    }

    pub fn sum(&self) -> f64 {
        self.protein + self.fat + self.carbs
    }

    pub fn is_zero(&self) -> bool {
        self.protein == 0.0 && self.fat == 0.0 && self.carbs == 0.0
    }

    /// Ratios in feature-vector order (protein, fat, carbs).
    pub fn to_array(&self) -> [f64; 3] {
        [self.protein, self.fat, self.carbs]
    }
}

// =============================================================================
// Food Records
// =============================================================================

/// One row of the cleaned nutrition table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodRecord {
    pub name: String,
    pub category: String,
    pub energy_kcal: f64,
    pub protein_g: f64,
    pub fat_g: f64,
    pub carbs_g: f64,
    pub protein_pct: f64,
    pub fat_pct: f64,
    pub carbs_pct: f64,
    /// Assigned once the cluster model has been fitted
    pub cluster_id: Option<ClusterId>,
}

impl FoodRecord {
    /// Build a record and derive its macro ratios.
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        energy_kcal: f64,
        protein_g: f64,
        fat_g: f64,
        carbs_g: f64,
    ) -> Self {
        let ratios = MacroRatios::from_grams(protein_g, fat_g, carbs_g);
        Self {
            name: name.into(),
            category: category.into(),
            energy_kcal,
            protein_g,
            fat_g,
            carbs_g,
            protein_pct: ratios.protein,
            fat_pct: ratios.fat,
            carbs_pct: ratios.carbs,
            cluster_id: None,
        }
    }

    pub fn grams(&self, m: Macro) -> f64 {
        match m {
            Macro::Protein => self.protein_g,
            Macro::Fat => self.fat_g,
            Macro::Carbs => self.carbs_g,
        }
    }

    pub fn total_macros_g(&self) -> f64 {
        self.protein_g + self.fat_g + self.carbs_g
    }

    pub fn ratios(&self) -> MacroRatios {
        MacroRatios {
            protein: self.protein_pct,
            fat: self.fat_pct,
            carbs: self.carbs_pct,
        }
    }
}

// =============================================================================
// Macro Targets
// =============================================================================

/// A caller-supplied macro quadruple: a remaining budget or a daily goal.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MacroTarget {
    pub kcal: f64,
    pub protein_g: f64,
    pub fat_g: f64,
    pub carbs_g: f64,
}

impl MacroTarget {
    pub fn new(kcal: f64, protein_g: f64, fat_g: f64, carbs_g: f64) -> Self {
        Self {
            kcal,
            protein_g,
            fat_g,
            carbs_g,
        }
    }

    pub fn grams(&self, m: Macro) -> f64 {
        match m {
            Macro::Protein => self.protein_g,
            Macro::Fat => self.fat_g,
            Macro::Carbs => self.carbs_g,
        }
    }

    pub fn total_macros_g(&self) -> f64 {
        self.protein_g + self.fat_g + self.carbs_g
    }

    pub fn ratios(&self) -> MacroRatios {
        MacroRatios::from_grams(self.protein_g, self.fat_g, self.carbs_g)
    }

    /// Amounts for a portion of `grams`, given per-100g values.
    pub fn per_portion(&self, grams: f64) -> Self {
        let factor = grams / 100.0;
        Self {
            kcal: self.kcal * factor,
            protein_g: self.protein_g * factor,
            fat_g: self.fat_g * factor,
            carbs_g: self.carbs_g * factor,
        }
    }

    /// True when every component is finite and non-negative.
    pub fn is_valid(&self) -> bool {
        [self.kcal, self.protein_g, self.fat_g, self.carbs_g]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0)
    }
}

// =============================================================================
// FoodTable - The Cleaned In-Memory Table
// =============================================================================

/// Where a name query matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchKind {
    Exact,
    Prefix,
    Substring,
}

/// The cleaned nutrition table plus lookup indices.
///
/// Records are kept in source order; every index stores row positions, so
/// nothing here ever reorders the records.
#[derive(Debug, Default)]
pub struct FoodTable {
    pub(crate) records: Vec<FoodRecord>,

    /// Lower-cased name -> first row carrying that name
    pub(crate) name_index: HashMap<String, RowIndex>,
    /// Category -> rows in table order
    pub(crate) category_index: HashMap<String, Vec<RowIndex>>,

    /// Header row detected while loading
    pub(crate) header_row: usize,
    /// Rows removed by the completeness check
    pub(crate) dropped_rows: usize,
}

impl FoodTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record and update the indices.
    pub fn insert(&mut self, record: FoodRecord) {
        let row = self.records.len();
        self.name_index
            .entry(record.name.to_lowercase())
            .or_insert(row);
        self.category_index
            .entry(record.category.clone())
            .or_default()
            .push(row);
        self.records.push(record);
    }

    pub fn get(&self, row: RowIndex) -> Option<&FoodRecord> {
        self.records.get(row)
    }

    pub fn records(&self) -> &[FoodRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<FoodRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn header_row(&self) -> usize {
        self.header_row
    }

    pub fn dropped_rows(&self) -> usize {
        self.dropped_rows
    }

    /// Store a cluster id on every record, aligned by row.
    pub fn assign_clusters(&mut self, labels: &[ClusterId]) -> Result<()> {
        if labels.len() != self.records.len() {
            return Err(DataLoadError::ValidationError(format!(
                "got {} cluster labels for {} records",
                labels.len(),
                self.records.len()
            )));
        }
        for (record, &label) in self.records.iter_mut().zip(labels) {
            record.cluster_id = Some(label);
        }
        Ok(())
    }

    /// First row whose name equals `name`, ignoring case.
    pub fn find_exact(&self, name: &str) -> Option<RowIndex> {
        self.name_index.get(&name.trim().to_lowercase()).copied()
    }

    /// Resolve a name: exact case-insensitive match first, then the first
    /// row (in table order) whose name contains `name`.
    pub fn resolve_name(&self, name: &str) -> Option<(RowIndex, MatchKind)> {
        let needle = name.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        if let Some(row) = self.name_index.get(&needle) {
            return Some((*row, MatchKind::Exact));
        }
        self.records
            .iter()
            .position(|r| r.name.to_lowercase().contains(&needle))
            .map(|row| (row, MatchKind::Substring))
    }

    /// Ranked local search: exact matches, then prefix, then substring,
    /// each group in table order.
    pub fn search(&self, query: &str, limit: usize) -> Vec<(RowIndex, MatchKind)> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut matches: Vec<(RowIndex, MatchKind)> = self
            .records
            .iter()
            .enumerate()
            .filter_map(|(row, record)| {
                let name = record.name.to_lowercase();
                if name == needle {
                    Some((row, MatchKind::Exact))
                } else if name.starts_with(&needle) {
                    Some((row, MatchKind::Prefix))
                } else if name.contains(&needle) {
                    Some((row, MatchKind::Substring))
                } else {
                    None
                }
            })
            .collect();

        // Stable sort keeps table order inside each group
        matches.sort_by_key(|(_, kind)| *kind);
        matches.truncate(limit);
        matches
    }

    /// Rows belonging to a category, in table order.
    pub fn rows_in_category(&self, category: &str) -> &[RowIndex] {
        self.category_index
            .get(category)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Category names sorted alphabetically.
    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = self.category_index.keys().map(|c| c.as_str()).collect();
        categories.sort_unstable();
        categories
    }
}

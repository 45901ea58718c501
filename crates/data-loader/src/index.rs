//! FoodTable building and cleaning logic.
//!
//! Raw rows coming out of the parser go through one completeness check
//! (name plus the four macro values). Rows failing it are dropped and
//! counted; everything that survives gets its ratio features derived.

use crate::error::{DataLoadError, Result};
use crate::parser::{self, LoaderOptions, RawFoodRow};
use crate::types::*;
use rayon::prelude::*;
use std::path::Path;
use tracing::{info, warn};

/// Category assigned to rows whose category cell is blank.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Tolerance for the ratio-sum invariant.
const RATIO_SUM_TOLERANCE: f64 = 1e-6;

impl FoodTable {
    /// Load and clean a nutrition table with default options.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        Self::load_with_options(path, &LoaderOptions::default())
    }

    /// Load and clean a nutrition table.
    ///
    /// Steps:
    /// 1. Locate the header and parse every data row
    /// 2. Drop rows failing the completeness check (logged, not fatal)
    /// 3. Derive macro ratios and build the lookup indices
    /// 4. Validate the ratio invariant
    pub fn load_with_options(path: &Path, options: &LoaderOptions) -> Result<Self> {
        if !path.exists() {
            return Err(DataLoadError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        info!("Loading nutrition table from {}", path.display());

        let sheet = parser::parse_food_sheet(path, options)?;
        info!("Using header row {}", sheet.header_row);

        let total_rows = sheet.rows.len();

        // par_iter + collect keeps the source order
        let cleaned: Vec<Option<FoodRecord>> = sheet.rows.into_par_iter().map(clean_row).collect();

        let mut table = FoodTable::new();
        table.header_row = sheet.header_row;
        for record in cleaned.into_iter().flatten() {
            table.insert(record);
        }
        table.dropped_rows = total_rows - table.len();

        if table.dropped_rows > 0 {
            warn!(
                "Dropped {} of {} rows with missing or non-numeric values",
                table.dropped_rows, total_rows
            );
        }

        if table.is_empty() {
            return Err(DataLoadError::EmptyDataset {
                path: path.display().to_string(),
                dropped: table.dropped_rows,
            });
        }

        table.validate()?;

        info!(
            "Loaded {} foods in {} categories",
            table.len(),
            table.category_index.len()
        );
        Ok(table)
    }

    /// Check the ratio invariant on every record.
    ///
    /// Ratios must sum to 1.0, or all be exactly 0.0 when the record has no
    /// macro grams at all.
    pub fn validate(&self) -> Result<()> {
        for (row, record) in self.records.iter().enumerate() {
            let ratios = record.ratios();
            let ok = if record.total_macros_g() == 0.0 {
                ratios.is_zero()
            } else {
                (ratios.sum() - 1.0).abs() <= RATIO_SUM_TOLERANCE
            };
            if !ok {
                return Err(DataLoadError::ValidationError(format!(
                    "row {} ({}) has macro ratios summing to {}",
                    row,
                    record.name,
                    ratios.sum()
                )));
            }
        }
        Ok(())
    }

    /// Summary counts: (foods, categories, dropped rows).
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.records.len(), self.category_index.len(), self.dropped_rows)
    }
}

/// Apply the completeness check and derive ratios.
fn clean_row(row: RawFoodRow) -> Option<FoodRecord> {
    let name = row.name?;
    let record = FoodRecord::new(
        name,
        row.category.unwrap_or_else(|| UNCATEGORIZED.to_string()),
        row.energy_kcal?,
        row.protein_g?,
        row.fat_g?,
        row.carbs_g?,
    );
    Some(record)
}

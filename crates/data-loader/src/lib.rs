//! # Data Loader Crate
//!
//! Loads a per-100g nutrition table (e.g. the Swiss Food Composition
//! Database exported as CSV) into a cleaned, immutable [`FoodTable`].
//!
//! ## Main Components
//!
//! - **types**: Domain types (FoodRecord, MacroRatios, MacroTarget, FoodTable)
//! - **parser**: Header probing and raw row parsing
//! - **index**: Cleaning, ratio derivation and validation
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::FoodTable;
//! use std::path::Path;
//!
//! let table = FoodTable::load_from_file(Path::new("data/foods.csv"))?;
//! let (row, _) = table.resolve_name("chicken").unwrap();
//! println!("{} -> {:?}", table.get(row).unwrap().name, table.get(row).unwrap().ratios());
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod index;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use index::UNCATEGORIZED;
pub use parser::{ColumnTitles, LoaderOptions};
pub use types::{
    // Type aliases
    ClusterId,
    RowIndex,
    // Core types
    FoodRecord,
    FoodTable,
    Macro,
    MacroRatios,
    MacroTarget,
    MatchKind,
};

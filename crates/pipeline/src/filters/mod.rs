//! Filter implementations for the candidate pipeline.
//!
//! This module contains all the concrete filter implementations
//! that can be composed into a FilterPipeline.

pub mod macro_density;
pub mod satisfied_macro;
pub mod scarce_macro;

// Re-export for convenience
pub use macro_density::MacroDensityFilter;
pub use satisfied_macro::SatisfiedMacroFilter;
pub use scarce_macro::ScarceMacroFilter;

//! # Models Crate
//!
//! The unsupervised models behind the recommendations:
//!
//! - **scaler**: `FeatureSpace` and the `FittedScaler` shared by training and queries
//! - **cluster**: seeded k-means (`ClusterModel`)
//! - **neighbors**: exact Euclidean k-nearest-neighbour search (`NeighborIndex`)
//!
//! Every model is fitted once and is read-only afterwards, so fitted
//! models can be shared across threads behind an `Arc`.
//!
//! ## Example Usage
//!
//! ```ignore
//! use models::{ClusterModel, FeatureSpace, FittedScaler, KMeansConfig, NeighborIndex};
//!
//! let scaler = FittedScaler::fit(FeatureSpace::MacroRatios, table.records())?;
//! let features = scaler.transform_records(table.records());
//! let clusters = ClusterModel::fit(&features, &KMeansConfig::new(8))?;
//! let neighbors = NeighborIndex::fit(&features)?;
//! ```

pub mod error;
pub mod scaler;
pub mod cluster;
pub mod neighbors;

pub use error::{ModelError, Result};
pub use scaler::{FeatureSpace, FittedScaler};
pub use cluster::{ClusterModel, KMeansConfig};
pub use neighbors::{euclidean, Neighbor, NeighborIndex};

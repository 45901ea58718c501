//! Brute-force Euclidean nearest-neighbour index.

use crate::error::{ModelError, Result};
use data_loader::RowIndex;
use ndarray::{Array2, ArrayView1};
use rayon::prelude::*;
use serde::Serialize;

/// Squared Euclidean distance between two equally sized vectors.
pub fn squared_euclidean(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

pub fn euclidean(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    squared_euclidean(a, b).sqrt()
}

/// One query hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Neighbor {
    pub row: RowIndex,
    pub distance: f64,
}

/// Exact k-nearest-neighbour search over a fixed feature matrix.
///
/// Results are ordered by ascending distance, ties by ascending row index,
/// so the same query always returns the same list.
#[derive(Debug, Clone)]
pub struct NeighborIndex {
    features: Array2<f64>,
}

impl NeighborIndex {
    pub fn fit(features: &Array2<f64>) -> Result<Self> {
        if features.nrows() == 0 {
            return Err(ModelError::EmptyMatrix);
        }
        Ok(Self {
            features: features.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.features.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.features.nrows() == 0
    }

    pub fn dimensions(&self) -> usize {
        self.features.ncols()
    }

    /// The `k` rows closest to `vector`. `k` above the row count returns
    /// every row.
    pub fn query(&self, vector: ArrayView1<f64>, k: usize) -> Result<Vec<Neighbor>> {
        if vector.len() != self.dimensions() {
            return Err(ModelError::DimensionMismatch {
                expected: self.dimensions(),
                found: vector.len(),
            });
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut hits: Vec<Neighbor> = (0..self.len())
            .into_par_iter()
            .map(|row| Neighbor {
                row,
                distance: euclidean(self.features.row(row), vector),
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.row.cmp(&b.row))
        });
        hits.truncate(k);
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1};

    fn index() -> NeighborIndex {
        let features = array![
            [0.0, 0.0],
            [1.0, 0.0],
            [0.0, 1.0],
            [3.0, 4.0],
            [1.0, 0.0],
        ];
        NeighborIndex::fit(&features).unwrap()
    }

    #[test]
    fn test_query_orders_by_distance_then_row() {
        let hits = index().query(array![1.0, 0.0].view(), 3).unwrap();
        let rows: Vec<RowIndex> = hits.iter().map(|h| h.row).collect();
        // Rows 1 and 4 are identical; the lower index wins
        assert_eq!(rows, vec![1, 4, 0]);
        assert_eq!(hits[0].distance, 0.0);
        assert!((hits[2].distance - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_query_k_larger_than_set() {
        let hits = index().query(array![0.0, 0.0].view(), 50).unwrap();
        assert_eq!(hits.len(), 5);
        assert_eq!(hits.last().unwrap().row, 3);
        assert!((hits.last().unwrap().distance - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_query_zero_k() {
        assert!(index().query(array![0.0, 0.0].view(), 0).unwrap().is_empty());
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = index().query(array![0.0, 0.0, 0.0].view(), 2).unwrap_err();
        assert_eq!(err, ModelError::DimensionMismatch { expected: 2, found: 3 });
    }

    #[test]
    fn test_fit_rejects_empty_matrix() {
        let empty = Array2::<f64>::zeros((0, 3));
        assert!(NeighborIndex::fit(&empty).is_err());
        let v = Array1::from(vec![3.0, 4.0]);
        assert_eq!(euclidean(v.view(), array![0.0, 0.0].view()), 5.0);
    }
}

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::embedding::{anti_diagonal_average, check_window, outer, Embedding, EmbeddingKind};
use crate::error::Result;

/// Basic SSA geometry.
///
/// A series `y` of length N is embedded with window L into the L×K Hankel
/// matrix `X[r, c] = y[r + c]`, K = N - L + 1. Every anti-diagonal of X is
/// constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trajectory {
    window: usize,
    k: usize,
}

impl Trajectory {
    pub fn new(window: usize, series_len: usize) -> Result<Self> {
        check_window(window, series_len)?;
        Ok(Self {
            window,
            k: series_len - window + 1,
        })
    }

    /// Number of lagged vectors K.
    pub fn k(&self) -> usize {
        self.k
    }
}

impl Embedding for Trajectory {
    fn kind(&self) -> EmbeddingKind {
        EmbeddingKind::Trajectory
    }

    fn window(&self) -> usize {
        self.window
    }

    fn series_len(&self) -> usize {
        self.window + self.k - 1
    }

    fn derived_size(&self) -> usize {
        self.k
    }

    fn decomposition_shape(&self) -> (usize, usize) {
        (self.window, self.k)
    }

    fn decomposition_matrix(&self, series: ArrayView1<f64>) -> Array2<f64> {
        self.trajectory_matrix(series)
    }

    fn trajectory_matrix(&self, series: ArrayView1<f64>) -> Array2<f64> {
        debug_assert_eq!(series.len(), self.series_len());
        Array2::from_shape_fn((self.window, self.k), |(r, c)| series[r + c])
    }

    // u ⊗ (Xᵗu), equal to s·u·vᵗ for an exact triplet
    fn elementary_matrix(&self, trajectory: ArrayView2<f64>, left: ArrayView1<f64>) -> Array2<f64> {
        let projection = trajectory.t().dot(&left);
        outer(left, projection.view())
    }

    fn diagonal_average(&self, matrix: ArrayView2<f64>) -> Array1<f64> {
        anti_diagonal_average(matrix, self.series_len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_hankel_layout() {
        let series = array![1.0, 2.0, 3.0, 4.0, 5.0];
        let embedding = Trajectory::new(2, series.len()).unwrap();
        assert_eq!(embedding.k(), 4);
        assert_eq!(embedding.decomposition_shape(), (2, 4));

        let x = embedding.trajectory_matrix(series.view());
        assert_eq!(x, array![[1.0, 2.0, 3.0, 4.0], [2.0, 3.0, 4.0, 5.0]]);
        assert_eq!(embedding.decomposition_matrix(series.view()), x);
    }

    #[test]
    fn test_anti_diagonals_are_constant() {
        let series = array![3.0, -1.0, 4.0, 1.0, -5.0, 9.0, 2.0];
        let embedding = Trajectory::new(3, series.len()).unwrap();
        let x = embedding.trajectory_matrix(series.view());
        for ((r, c), value) in x.indexed_iter() {
            assert_eq!(*value, series[r + c]);
        }
    }

    #[test]
    fn test_diagonal_average_inverts_embedding() {
        let series = array![0.5, 1.5, -2.0, 7.0, 3.25, 0.0];
        for window in 1..series.len() {
            let embedding = Trajectory::new(window, series.len()).unwrap();
            let x = embedding.trajectory_matrix(series.view());
            assert_eq!(embedding.diagonal_average(x.view()), series);
        }
    }

    #[test]
    fn test_elementary_matrices_sum_to_trajectory() {
        let series = array![1.0, 0.0, 2.0, 0.0, 3.0];
        let embedding = Trajectory::new(2, series.len()).unwrap();
        let x = embedding.trajectory_matrix(series.view());

        // any orthonormal basis of the column space reproduces X
        let e0 = array![1.0, 0.0];
        let e1 = array![0.0, 1.0];
        let total = embedding.elementary_matrix(x.view(), e0.view())
            + embedding.elementary_matrix(x.view(), e1.view());
        assert_eq!(total, x);
    }
}

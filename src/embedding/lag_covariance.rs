use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rayon::prelude::*;

use crate::embedding::{anti_diagonal_average, check_window, outer, Embedding, EmbeddingKind};
use crate::error::Result;

/// Toeplitz SSA geometry.
///
/// The factorized matrix is the L×L lag-covariance matrix
/// `C[i, j] = c(|i - j|)` with
///
/// ```text
/// c(h) = 1 / (N - h) * Σ_{t=0}^{N-h-1} y[t] * y[t + h]
/// ```
///
/// Reconstruction projects the N×L trajectory matrix `T[t, j] = y[t + j]`
/// (zero past the end of the series) onto the left vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LagCovariance {
    window: usize,
    series_len: usize,
}

impl LagCovariance {
    pub fn new(window: usize, series_len: usize) -> Result<Self> {
        check_window(window, series_len)?;
        Ok(Self { window, series_len })
    }

    /// Autocovariances c(0), …, c(L - 1).
    pub fn autocovariances(&self, series: ArrayView1<f64>) -> Vec<f64> {
        let n = series.len();
        (0..self.window)
            .into_par_iter()
            .map(|lag| {
                let overlap = n - lag;
                let sum: f64 = (0..overlap).map(|t| series[t] * series[t + lag]).sum();
                sum / overlap as f64
            })
            .collect()
    }
}

impl Embedding for LagCovariance {
    fn kind(&self) -> EmbeddingKind {
        EmbeddingKind::LagCovariance
    }

    fn window(&self) -> usize {
        self.window
    }

    fn series_len(&self) -> usize {
        self.series_len
    }

    fn derived_size(&self) -> usize {
        self.window
    }

    fn decomposition_shape(&self) -> (usize, usize) {
        (self.window, self.window)
    }

    fn decomposition_matrix(&self, series: ArrayView1<f64>) -> Array2<f64> {
        let acov = self.autocovariances(series);
        Array2::from_shape_fn((self.window, self.window), |(i, j)| acov[i.abs_diff(j)])
    }

    fn trajectory_matrix(&self, series: ArrayView1<f64>) -> Array2<f64> {
        debug_assert_eq!(series.len(), self.series_len);
        let n = self.series_len;
        Array2::from_shape_fn((n, self.window), |(t, j)| {
            if t + j < n {
                series[t + j]
            } else {
                0.0
            }
        })
    }

    // (T·u) ⊗ u
    fn elementary_matrix(&self, trajectory: ArrayView2<f64>, left: ArrayView1<f64>) -> Array2<f64> {
        let projection = trajectory.dot(&left);
        outer(projection.view(), left)
    }

    // offsets past N - 1 only hold padded cells and are dropped
    fn diagonal_average(&self, matrix: ArrayView2<f64>) -> Array1<f64> {
        anti_diagonal_average(matrix, self.series_len)
    }
}

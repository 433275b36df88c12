//! # Embedding
//!
//! Maps a series and a window length to the matrices SSA works on, and maps
//! component matrices back to series.
//!
//! ## Geometries
//! - **Trajectory** ([`Trajectory`]): the L×K Hankel matrix is both factorized
//!   and projected during reconstruction
//! - **Lag-covariance** ([`LagCovariance`]): the L×L Toeplitz matrix of lagged
//!   autocovariances is factorized, while the zero-padded N×L trajectory
//!   matrix is used for reconstruction

use std::fmt;
use std::str::FromStr;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::error::{Result, SsaError};

mod lag_covariance;
mod trajectory;

pub use lag_covariance::LagCovariance;
pub use trajectory::Trajectory;

/// One embedding/reconstruction geometry.
pub trait Embedding: Send + Sync + fmt::Debug {
    fn kind(&self) -> EmbeddingKind;

    /// Window length L.
    fn window(&self) -> usize;

    /// Series length N.
    fn series_len(&self) -> usize;

    /// K = N - L + 1 for the trajectory geometry, L for lag-covariance.
    fn derived_size(&self) -> usize;

    /// Shape of [`Embedding::decomposition_matrix`].
    fn decomposition_shape(&self) -> (usize, usize);

    /// Matrix handed to the factorization backend.
    fn decomposition_matrix(&self, series: ArrayView1<f64>) -> Array2<f64>;

    /// Matrix whose projection onto a left vector yields a component.
    fn trajectory_matrix(&self, series: ArrayView1<f64>) -> Array2<f64>;

    /// Rank-1 matrix of the component with left vector `left`, in the
    /// geometry of [`Embedding::trajectory_matrix`].
    fn elementary_matrix(&self, trajectory: ArrayView2<f64>, left: ArrayView1<f64>) -> Array2<f64>;

    /// Averages anti-diagonals of a trajectory-shaped matrix into a series of
    /// length N.
    fn diagonal_average(&self, matrix: ArrayView2<f64>) -> Array1<f64>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmbeddingKind {
    /// Basic SSA on the Hankel trajectory matrix
    #[default]
    Trajectory,
    /// Toeplitz SSA on the lag-covariance matrix
    LagCovariance,
}

impl EmbeddingKind {
    /// Builds the geometry for a series of length `series_len`.
    ///
    /// `window` must lie in `[1, series_len - 1]`.
    pub fn build(self, window: usize, series_len: usize) -> Result<Box<dyn Embedding>> {
        check_window(window, series_len)?;
        Ok(match self {
            EmbeddingKind::Trajectory => Box::new(Trajectory::new(window, series_len)?),
            EmbeddingKind::LagCovariance => Box::new(LagCovariance::new(window, series_len)?),
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            EmbeddingKind::Trajectory => "trajectory",
            EmbeddingKind::LagCovariance => "lag-covariance",
        }
    }
}

impl fmt::Display for EmbeddingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EmbeddingKind {
    type Err = SsaError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trajectory" | "basic" | "hankel" => Ok(EmbeddingKind::Trajectory),
            "lag-covariance" | "lag_covariance" | "toeplitz" => Ok(EmbeddingKind::LagCovariance),
            other => Err(SsaError::Configuration(format!(
                "unknown embedding '{}'",
                other
            ))),
        }
    }
}

pub(crate) fn check_window(window: usize, series_len: usize) -> Result<()> {
    if window < 1 || window >= series_len {
        return Err(SsaError::Configuration(format!(
            "window must be in [1, {}] for a series of length {}, got {}",
            series_len.saturating_sub(1),
            series_len,
            window
        )));
    }
    Ok(())
}

pub(crate) fn outer(a: ArrayView1<f64>, b: ArrayView1<f64>) -> Array2<f64> {
    Array2::from_shape_fn((a.len(), b.len()), |(i, j)| a[i] * b[j])
}

/// Mean of every anti-diagonal `row + col = t` for `t < len`.
pub(crate) fn anti_diagonal_average(matrix: ArrayView2<f64>, len: usize) -> Array1<f64> {
    let mut sums = Array1::<f64>::zeros(len);
    let mut counts = vec![0usize; len];

    for ((r, c), &value) in matrix.indexed_iter() {
        let t = r + c;
        if t < len {
            sums[t] += value;
            counts[t] += 1;
        }
    }

    for (sum, &count) in sums.iter_mut().zip(counts.iter()) {
        if count > 0 {
            *sum /= count as f64;
        }
    }
    sums
}

use ndarray::{Array1, Array2, ArrayView1};

use crate::embedding::Embedding;
use crate::error::{Result, SsaError};
use crate::svd::Factorization;

/// Turns component indices back into series.
///
/// The trajectory matrix is built once and shared by every reconstruction
/// made through the same reconstructor.
pub struct Reconstructor<'a> {
    embedding: &'a dyn Embedding,
    factorization: &'a Factorization,
    trajectory: Array2<f64>,
}

impl<'a> Reconstructor<'a> {
    pub fn new(
        embedding: &'a dyn Embedding,
        series: ArrayView1<f64>,
        factorization: &'a Factorization,
    ) -> Self {
        Self {
            embedding,
            factorization,
            trajectory: embedding.trajectory_matrix(series),
        }
    }

    pub fn component_count(&self) -> usize {
        self.factorization.rank()
    }

    /// Rank-1 matrix of component `index`.
    pub fn elementary_matrix(&self, index: usize) -> Result<Array2<f64>> {
        self.check_index(index)?;
        Ok(self.embedding.elementary_matrix(
            self.trajectory.view(),
            self.factorization.u().column(index),
        ))
    }

    /// Sum of the elementary matrices of `indices`, averaged along
    /// anti-diagonals into a series of the input length.
    ///
    /// An empty index set yields a series of zeros.
    pub fn reconstruct(&self, indices: &[usize]) -> Result<Array1<f64>> {
        for &index in indices {
            self.check_index(index)?;
        }
        let mut grouped = Array2::<f64>::zeros(self.trajectory.dim());
        for &index in indices {
            grouped += &self.embedding.elementary_matrix(
                self.trajectory.view(),
                self.factorization.u().column(index),
            );
        }
        Ok(self.embedding.diagonal_average(grouped.view()))
    }

    fn check_index(&self, index: usize) -> Result<()> {
        let count = self.component_count();
        if index >= count {
            return Err(SsaError::GroupDefinition(format!(
                "component index {} out of range for {} components",
                index, count
            )));
        }
        Ok(())
    }
}

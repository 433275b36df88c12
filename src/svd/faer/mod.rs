use anyhow::anyhow;
use faer_ext::{IntoFaer, IntoNdarray};
use ndarray::{Array1, ArrayView2};

use crate::svd::{Factorization, SvdImplementation};

/// Exact-alternate backend: thin SVD through faer's divide-and-conquer routine.
#[derive(Debug, Clone, Copy, Default)]
pub struct FaerSVD;

impl SvdImplementation for FaerSVD {
    fn compute(&self, matrix: ArrayView2<f64>) -> anyhow::Result<Factorization> {
        let (m, n) = matrix.dim();
        let svd = matrix
            .into_faer()
            .thin_svd()
            .map_err(|e| anyhow!("faer SVD failed on a {}x{} matrix: {:?}", m, n, e))?;

        let s_ref = svd.S().column_vector();
        let u = svd.U().into_ndarray().to_owned();
        let s = Array1::from_shape_fn(m.min(n), |i| s_ref[i]);
        let vt = svd.V().transpose().into_ndarray().to_owned();

        Factorization::new(u, s, vt)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    use super::*;
    use crate::svd::nalgebra::NalgebraSVD;

    #[test]
    fn test_simple_svd() {
        let a = array![[1.0, 2.0], [3.0, 4.0]];
        let svd = FaerSVD.compute(a.view()).unwrap().canonicalize();
        assert_abs_diff_eq!(svd.s()[0], 5.4649857, epsilon = 1e-6);
        assert_abs_diff_eq!(svd.s()[1], 0.3659662, epsilon = 1e-6);

        let reconstructed = svd.reconstruct();
        for (x, y) in reconstructed.iter().zip(a.iter()) {
            assert_abs_diff_eq!(x, y, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_matches_nalgebra_after_canonicalization() {
        let a = array![
            [2.0, -1.0, 0.5, 3.0],
            [0.0, 4.0, 1.0, -2.0],
            [1.5, 0.5, -3.0, 1.0]
        ];
        let faer = FaerSVD.compute(a.view()).unwrap().canonicalize();
        let nalg = NalgebraSVD.compute(a.view()).unwrap().canonicalize();

        assert_eq!(faer.u().dim(), (3, 3));
        assert_eq!(faer.vt().dim(), (3, 4));
        for (x, y) in faer.s().iter().zip(nalg.s().iter()) {
            assert_abs_diff_eq!(x, y, epsilon = 1e-10);
        }
        for (x, y) in faer.u().iter().zip(nalg.u().iter()) {
            assert_abs_diff_eq!(x, y, epsilon = 1e-8);
        }
        for (x, y) in faer.vt().iter().zip(nalg.vt().iter()) {
            assert_abs_diff_eq!(x, y, epsilon = 1e-8);
        }
    }
}

use anyhow::anyhow;
use ndarray::{Array1, ArrayView2};
use nshare::{IntoNalgebra, IntoNdarray2};

use crate::svd::{Factorization, SvdImplementation};

/// Reference backend: thin SVD through nalgebra's bidiagonal QR iteration.
///
/// Yields R = min(shape) components.
#[derive(Debug, Clone, Copy, Default)]
pub struct NalgebraSVD;

impl SvdImplementation for NalgebraSVD {
    fn compute(&self, matrix: ArrayView2<f64>) -> anyhow::Result<Factorization> {
        let (m, n) = matrix.dim();
        let dense = matrix.to_owned().into_nalgebra();
        let svd = ::nalgebra::SVD::try_new(dense, true, true, f64::EPSILON, 0)
            .ok_or_else(|| anyhow!("nalgebra SVD did not converge on a {}x{} matrix", m, n))?;

        let u = svd
            .u
            .ok_or_else(|| anyhow!("nalgebra SVD returned no left singular vectors"))?;
        let vt = svd
            .v_t
            .ok_or_else(|| anyhow!("nalgebra SVD returned no right singular vectors"))?;
        let s = Array1::from(svd.singular_values.as_slice().to_vec());

        Factorization::new(u.into_ndarray2(), s, vt.into_ndarray2())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    use super::*;

    #[test]
    fn test_simple_svd() {
        let a = array![[1.0, 2.0], [3.0, 4.0]];
        let svd = NalgebraSVD.compute(a.view()).unwrap().canonicalize();
        let u = svd.u();
        let s = svd.s();
        let vt = svd.vt();

        assert_eq!(u.shape(), &[2, 2]);
        assert_eq!(s.len(), 2);
        assert_eq!(vt.shape(), &[2, 2]);

        assert_abs_diff_eq!(s[0], 5.4649857, epsilon = 1e-6);
        assert_abs_diff_eq!(s[1], 0.3659662, epsilon = 1e-6);

        let reconstructed = svd.reconstruct();
        for i in 0..2 {
            for j in 0..2 {
                assert_abs_diff_eq!(reconstructed[[i, j]], a[[i, j]], epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_rectangular_thin_shapes() {
        let wide = array![[1.0, 0.0, 2.0, 1.0], [0.0, 3.0, 1.0, 1.0]];
        let svd = NalgebraSVD.compute(wide.view()).unwrap();
        assert_eq!(svd.u().dim(), (2, 2));
        assert_eq!(svd.vt().dim(), (2, 4));

        let tall = wide.t().to_owned();
        let svd = NalgebraSVD.compute(tall.view()).unwrap();
        assert_eq!(svd.u().dim(), (4, 2));
        assert_eq!(svd.vt().dim(), (2, 2));
    }

    #[test]
    fn test_single_row() {
        let row = array![[3.0, 4.0]];
        let svd = NalgebraSVD.compute(row.view()).unwrap().canonicalize();
        assert_eq!(svd.rank(), 1);
        assert_abs_diff_eq!(svd.s()[0], 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(svd.u()[[0, 0]], 1.0, epsilon = 1e-12);
    }
}

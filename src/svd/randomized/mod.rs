//! # Randomized SVD
//!
//! Range finder from `single_svdlib`: a Gaussian sketch of the range of A,
//! refined by power iterations, followed by an exact SVD of the projected
//! matrix Qᵗ·A.

use log::debug;
use ndarray::ArrayView2;
use single_svdlib::randomized::randomized_svd;

use crate::svd::{Factorization, PowerIterationNormalizer, SvdImplementation, DEFAULT_OVERSAMPLES};
use crate::utils::to_csr;

pub struct RandomizedSVD {
    k: usize,
    n_oversamples: usize,
    n_power_iterations: Option<usize>,
    normalizer: Option<PowerIterationNormalizer>,
    seed: Option<u64>,
}

impl RandomizedSVD {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            n_oversamples: DEFAULT_OVERSAMPLES,
            n_power_iterations: None,
            normalizer: None,
            seed: None,
        }
    }

    pub fn n_oversamples(mut self, n_oversamples: usize) -> Self {
        self.n_oversamples = n_oversamples;
        self
    }

    /// `None` picks 7 iterations when k is below a tenth of the smaller
    /// dimension, 4 otherwise.
    pub fn n_power_iterations(mut self, n_power_iterations: Option<usize>) -> Self {
        self.n_power_iterations = n_power_iterations;
        self
    }

    /// `None` skips normalization for at most two power iterations and
    /// re-orthonormalizes (`QR`) otherwise. The solver's `LU` mode only
    /// rescales columns.
    pub fn normalizer(mut self, normalizer: Option<PowerIterationNormalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    fn resolved_iterations(&self, min_dim: usize) -> usize {
        self.n_power_iterations.unwrap_or_else(|| {
            if (self.k as f64) < 0.1 * min_dim as f64 {
                7
            } else {
                4
            }
        })
    }

    fn resolved_normalizer(&self, iterations: usize) -> PowerIterationNormalizer {
        match self.normalizer {
            Some(normalizer) => normalizer,
            None if iterations <= 2 => PowerIterationNormalizer::None,
            None => PowerIterationNormalizer::QR,
        }
    }
}

impl SvdImplementation for RandomizedSVD {
    fn compute(&self, matrix: ArrayView2<f64>) -> anyhow::Result<Factorization> {
        let (m, n) = matrix.dim();
        let min_dim = m.min(n);
        if self.k == 0 || self.k > min_dim {
            anyhow::bail!(
                "Randomized SVD needs 1 <= k <= {} on a {}x{} matrix, got {}",
                min_dim,
                m,
                n,
                self.k
            );
        }

        // sketch width k + oversamples never exceeds min(shape)
        let oversamples = self.n_oversamples.min(min_dim - self.k);
        let iterations = self.resolved_iterations(min_dim);
        let normalizer = self.resolved_normalizer(iterations);

        let rec = randomized_svd(
            &to_csr(matrix),
            self.k,
            oversamples,
            iterations,
            normalizer,
            self.seed,
        )?;

        debug!(
            "Randomized SVD: {} triplets on a {}x{} matrix (sketch {}, {} power iterations, {:?})",
            rec.d,
            m,
            n,
            self.k + oversamples,
            iterations,
            normalizer
        );

        Factorization::new(rec.ut.t().to_owned(), rec.s, rec.vt)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use ndarray::Array2;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rand_distr::StandardNormal;

    use super::*;
    use crate::svd::nalgebra::NalgebraSVD;

    fn low_rank_plus_noise(rows: usize, cols: usize) -> Array2<f64> {
        let mut rng = StdRng::seed_from_u64(11);
        let mut gaussian = |r: usize, c: usize| -> Array2<f64> {
            Array2::from_shape_fn((r, c), |_| rng.sample(StandardNormal))
        };
        let left = gaussian(rows, 3);
        let right = gaussian(3, cols);
        let noise = gaussian(rows, cols);
        let weights = Array2::from_diag(&ndarray::arr1(&[50.0, 20.0, 10.0]));
        left.dot(&weights).dot(&right) + noise * 0.01
    }

    #[test]
    fn test_full_sketch_is_exact() {
        let a = low_rank_plus_noise(20, 15);
        let exact = NalgebraSVD.compute(a.view()).unwrap().canonicalize();
        // k + oversamples is clamped to min(shape): the sketch spans the whole range
        let random = RandomizedSVD::new(14)
            .n_power_iterations(Some(0))
            .seed(Some(0))
            .compute(a.view())
            .unwrap()
            .canonicalize();
        assert_eq!(random.rank(), 14);
        for i in 0..14 {
            assert_abs_diff_eq!(random.s()[i], exact.s()[i], epsilon = 1e-9 * exact.s()[0]);
        }
    }

    #[test]
    fn test_leading_values_with_every_normalizer() {
        let a = low_rank_plus_noise(60, 40);
        let exact = NalgebraSVD.compute(a.view()).unwrap().canonicalize();

        for normalizer in [
            None,
            Some(PowerIterationNormalizer::QR),
            Some(PowerIterationNormalizer::LU),
            Some(PowerIterationNormalizer::None),
        ] {
            let random = RandomizedSVD::new(3)
                .normalizer(normalizer)
                .n_power_iterations(Some(2))
                .seed(Some(5))
                .compute(a.view())
                .unwrap()
                .canonicalize();
            assert_eq!(random.u().dim(), (60, 3));
            assert_eq!(random.vt().dim(), (3, 40));
            for i in 0..3 {
                assert_abs_diff_eq!(random.s()[i], exact.s()[i], epsilon = 1e-3 * exact.s()[0]);
            }
        }
    }

    #[test]
    fn test_seed_makes_output_reproducible() {
        let a = low_rank_plus_noise(30, 30);
        let first = RandomizedSVD::new(2).seed(Some(9)).compute(a.view()).unwrap();
        let second = RandomizedSVD::new(2).seed(Some(9)).compute(a.view()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_auto_resolution() {
        let svd = RandomizedSVD::new(2);
        assert_eq!(svd.resolved_iterations(100), 7);
        assert_eq!(svd.resolved_iterations(10), 4);
        assert_eq!(svd.resolved_normalizer(4), PowerIterationNormalizer::QR);
        let svd = svd.n_power_iterations(Some(1));
        assert_eq!(svd.resolved_iterations(100), 1);
        assert_eq!(svd.resolved_normalizer(1), PowerIterationNormalizer::None);
        let svd = svd.normalizer(Some(PowerIterationNormalizer::LU));
        assert_eq!(svd.resolved_normalizer(1), PowerIterationNormalizer::LU);
    }
}

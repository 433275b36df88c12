//! # Partial SVD by Lanczos iteration
//!
//! Runs `single_svdlib`'s LAS2 solver on a compressed-row copy of the
//! embedding matrix. Every Ritz triplet whose error bound is within
//! `tolerance` is returned, at least `k` of them, in no particular order.

use anyhow::{anyhow, bail};
use log::{debug, trace};
use ndarray::ArrayView2;
use single_svdlib::lanczos::svd_las2;
use single_svdlib::SvdRec;

use crate::svd::{Factorization, SvdImplementation, DEFAULT_LANCZOS_TOLERANCE};
use crate::utils::to_csr;

// eigenvalues of AᵗA inside this interval are treated as unwanted zeros
const END_INTERVAL: [f64; 2] = [-1.0e-30, 1.0e-30];

pub struct LanczosSVD {
    k: usize,
    max_iterations: Option<usize>,
    tolerance: f64,
    seed: Option<u64>,
}

impl LanczosSVD {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iterations: None,
            tolerance: DEFAULT_LANCZOS_TOLERANCE,
            seed: None,
        }
    }

    /// Upper limit on Lanczos steps, i.e. the size of the Krylov space.
    /// `None` runs up to the smaller matrix dimension.
    pub fn max_iterations(mut self, max_iterations: Option<usize>) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Relative accuracy a Ritz value needs to be accepted.
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Raw solver record with its diagnostics, `ut` and `vt` oriented to
    /// `matrix`.
    ///
    /// The solver is asked for as many dimensions as it takes Lanczos steps,
    /// so every converged triplet comes back. Wide matrices are handed over
    /// transposed so that a full run spans the whole Gram operator.
    pub fn run(&self, matrix: ArrayView2<f64>) -> anyhow::Result<SvdRec<f64>> {
        let (m, n) = matrix.dim();
        let min_dim = m.min(n);
        if self.k == 0 || self.k > min_dim {
            bail!(
                "Lanczos SVD needs 1 <= k <= {} on a {}x{} matrix, got {}",
                min_dim,
                m,
                n,
                self.k
            );
        }
        if min_dim < 2 {
            bail!("Lanczos SVD needs at least a 2x2 matrix, got {}x{}", m, n);
        }

        let steps = self
            .max_iterations
            .unwrap_or(min_dim)
            .max(self.k)
            .clamp(2, min_dim);
        let transposed = n > m;
        let csr = if transposed {
            to_csr(matrix.t())
        } else {
            to_csr(matrix)
        };
        trace!(
            "Lanczos SVD on a {}x{} matrix with {} stored entries, {} steps",
            m,
            n,
            csr.nnz(),
            steps
        );

        let mut rec = svd_las2(
            &csr,
            steps,
            steps,
            &END_INTERVAL,
            self.tolerance,
            solver_seed(self.seed),
        )
        .map_err(|e| anyhow!("Lanczos SVD failed on a {}x{} matrix: {}", m, n, e))?;
        if transposed {
            std::mem::swap(&mut rec.ut, &mut rec.vt);
        }

        debug!(
            "Lanczos SVD: {} converged triplets from {} steps on a {}x{} matrix",
            rec.d, rec.diagnostics.lanczos_steps, m, n
        );
        Ok(rec)
    }
}

impl SvdImplementation for LanczosSVD {
    fn compute(&self, matrix: ArrayView2<f64>) -> anyhow::Result<Factorization> {
        let rec = self.run(matrix)?;
        if rec.d < self.k {
            bail!(
                "Lanczos SVD converged {} of {} requested triplets within {} steps",
                rec.d,
                self.k,
                rec.diagnostics.iterations
            );
        }
        Factorization::new(rec.ut.t().to_owned(), rec.s, rec.vt)
    }
}

// the solver draws its own seed for 0, so explicit seeds map into [1, u32::MAX]
fn solver_seed(seed: Option<u64>) -> u32 {
    match seed {
        Some(seed) => (seed % u64::from(u32::MAX)) as u32 + 1,
        None => 0,
    }
}

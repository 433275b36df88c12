//! # Singular value decomposition backends
//!
//! Four interchangeable factorizations behind [`SvdImplementation`]:
//!
//! - **Exact** ([`nalgebra::NalgebraSVD`]): full thin SVD, the reference backend
//! - **Exact-alternate** ([`faer::FaerSVD`]): full thin SVD through a different routine
//! - **Partial-iterative** ([`lanczos::LanczosSVD`]): leading `k` triplets from
//!   `single_svdlib`'s Lanczos solver
//! - **Randomized-approximate** ([`randomized::RandomizedSVD`]): leading `k`
//!   triplets from `single_svdlib`'s randomized range finder
//!
//! Raw backend output differs in ordering and vector signs. Every result goes
//! through [`Factorization::canonicalize`] before it is handed out, so factors
//! from different backends are directly comparable.

use std::fmt;
use std::str::FromStr;

use anyhow::bail;
use ndarray::{Array1, Array2, ArrayView2, Axis};

use crate::error::SsaError;

#[cfg(feature = "faer")]
pub mod faer;
pub mod lanczos;
pub mod nalgebra;
pub mod randomized;

pub use single_svdlib::randomized::PowerIterationNormalizer;

/// A (U, S, Vᵗ) triple with matched component indices.
///
/// `u` is M×R with components as columns, `s` has length R, `vt` is R×N with
/// components as rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Factorization {
    u: Array2<f64>,
    s: Array1<f64>,
    vt: Array2<f64>,
}

impl Factorization {
    pub fn new(u: Array2<f64>, s: Array1<f64>, vt: Array2<f64>) -> anyhow::Result<Self> {
        let rank = s.len();
        if u.ncols() != rank || vt.nrows() != rank {
            bail!(
                "Inconsistent factor shapes: U is {:?}, S has {} values, Vt is {:?}",
                u.dim(),
                rank,
                vt.dim()
            );
        }
        if let Some(v) = s.iter().find(|v| !v.is_finite() || **v < 0.0) {
            bail!("Singular values must be finite and non-negative, got {}", v);
        }
        Ok(Factorization { u, s, vt })
    }

    /// Reorders components by descending singular value and fixes signs so the
    /// largest-magnitude entry of every left vector is non-negative.
    ///
    /// The matching row of `vt` is flipped together with its left vector, so
    /// the product U·diag(S)·Vᵗ is unchanged.
    pub fn canonicalize(self) -> Self {
        let rank = self.s.len();
        let mut order: Vec<usize> = (0..rank).collect();
        order.sort_by(|&a, &b| self.s[b].total_cmp(&self.s[a]));

        let mut u = self.u.select(Axis(1), &order);
        let s = self.s.select(Axis(0), &order);
        let mut vt = self.vt.select(Axis(0), &order);

        for i in 0..rank {
            let pivot = u
                .column(i)
                .iter()
                .copied()
                .fold((0.0f64, 0.0f64), |(best_abs, best), x| {
                    if x.abs() > best_abs {
                        (x.abs(), x)
                    } else {
                        (best_abs, best)
                    }
                })
                .1;
            if pivot < 0.0 {
                u.column_mut(i).mapv_inplace(|x| -x);
                vt.row_mut(i).mapv_inplace(|x| -x);
            }
        }

        Factorization { u, s, vt }
    }

    /// Keeps the first `k` components. Applied after [`Self::canonicalize`]
    /// this keeps the `k` largest.
    pub fn truncate(self, k: usize) -> Self {
        let k = k.min(self.s.len());
        Factorization {
            u: self.u.slice(ndarray::s![.., ..k]).to_owned(),
            s: self.s.slice(ndarray::s![..k]).to_owned(),
            vt: self.vt.slice(ndarray::s![..k, ..]).to_owned(),
        }
    }

    pub fn u(&self) -> &Array2<f64> {
        &self.u
    }

    pub fn s(&self) -> &Array1<f64> {
        &self.s
    }

    pub fn vt(&self) -> &Array2<f64> {
        &self.vt
    }

    /// Number of components R.
    pub fn rank(&self) -> usize {
        self.s.len()
    }

    // U·diag(S)·Vᵗ
    pub fn reconstruct(&self) -> Array2<f64> {
        let s_diag = Array2::from_diag(&self.s);
        self.u.dot(&s_diag).dot(&self.vt)
    }
}

/// Raw factorization routine. Output does not need to be ordered,
/// sign-normalized or cut to the requested rank; [`SvdMethod::factorize`]
/// canonicalizes and truncates it.
pub trait SvdImplementation: Send + Sync {
    fn compute(&self, matrix: ArrayView2<f64>) -> anyhow::Result<Factorization>;
}

pub const DEFAULT_LANCZOS_TOLERANCE: f64 = 1e-6;
pub const DEFAULT_OVERSAMPLES: usize = 10;

/// Backend selection with per-backend options.
///
/// `k: None` requests the default rank, `min(shape) - 1`. A `normalizer` of
/// `None` picks one from the power iteration count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SvdMethod {
    Exact,
    ExactAlternate,
    Lanczos {
        k: Option<usize>,
        max_iterations: Option<usize>,
        tolerance: f64,
        seed: Option<u64>,
    },
    Random {
        k: Option<usize>,
        n_oversamples: usize,
        n_power_iterations: Option<usize>,
        normalizer: Option<PowerIterationNormalizer>,
        seed: Option<u64>,
    },
}

impl Default for SvdMethod {
    fn default() -> Self {
        Self::Exact
    }
}

impl SvdMethod {
    pub fn lanczos() -> Self {
        Self::Lanczos {
            k: None,
            max_iterations: None,
            tolerance: DEFAULT_LANCZOS_TOLERANCE,
            seed: None,
        }
    }

    pub fn random() -> Self {
        Self::Random {
            k: None,
            n_oversamples: DEFAULT_OVERSAMPLES,
            n_power_iterations: None,
            normalizer: None,
            seed: None,
        }
    }

    /// Same method with the requested rank. No effect on the exact backends.
    pub fn with_rank(self, rank: usize) -> Self {
        match self {
            Self::Lanczos {
                max_iterations,
                tolerance,
                seed,
                ..
            } => Self::Lanczos {
                k: Some(rank),
                max_iterations,
                tolerance,
                seed,
            },
            Self::Random {
                n_oversamples,
                n_power_iterations,
                normalizer,
                seed,
                ..
            } => Self::Random {
                k: Some(rank),
                n_oversamples,
                n_power_iterations,
                normalizer,
                seed,
            },
            exact => exact,
        }
    }

    /// Same method with the given seed. No effect on the exact backends.
    pub fn with_seed(self, seed: u64) -> Self {
        match self {
            Self::Lanczos {
                k,
                max_iterations,
                tolerance,
                ..
            } => Self::Lanczos {
                k,
                max_iterations,
                tolerance,
                seed: Some(seed),
            },
            Self::Random {
                k,
                n_oversamples,
                n_power_iterations,
                normalizer,
                ..
            } => Self::Random {
                k,
                n_oversamples,
                n_power_iterations,
                normalizer,
                seed: Some(seed),
            },
            exact => exact,
        }
    }

    /// Same method with at most `max_iterations` Lanczos steps. No effect on
    /// the other backends.
    pub fn with_max_iterations(self, max_iterations: usize) -> Self {
        match self {
            Self::Lanczos {
                k, tolerance, seed, ..
            } => Self::Lanczos {
                k,
                max_iterations: Some(max_iterations),
                tolerance,
                seed,
            },
            other => other,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::ExactAlternate => "exact-alternate",
            Self::Lanczos { .. } => "partial-iterative",
            Self::Random { .. } => "randomized-approximate",
        }
    }

    /// Number of components this method yields on a matrix of `shape`.
    ///
    /// Fails when the requested rank is outside `[1, min(shape) - 1]` for the
    /// truncated backends, or when the backend is not compiled in.
    pub fn validate(&self, shape: (usize, usize)) -> Result<usize, SsaError> {
        let min_dim = shape.0.min(shape.1);
        match self {
            Self::Exact => Ok(min_dim),
            Self::ExactAlternate => {
                if cfg!(feature = "faer") {
                    Ok(min_dim)
                } else {
                    Err(SsaError::Configuration(
                        "the exact-alternate backend requires the 'faer' feature".to_string(),
                    ))
                }
            }
            Self::Lanczos {
                k,
                max_iterations,
                tolerance,
                ..
            } => {
                let k = check_rank(*k, min_dim, self.name())?;
                if let Some(max_iterations) = max_iterations {
                    if *max_iterations < k {
                        return Err(SsaError::Configuration(format!(
                            "max_iterations ({}) must be at least k ({})",
                            max_iterations, k
                        )));
                    }
                }
                if !tolerance.is_finite() || *tolerance <= 0.0 {
                    return Err(SsaError::Configuration(format!(
                        "tolerance must be finite and positive, got {}",
                        tolerance
                    )));
                }
                Ok(k)
            }
            Self::Random { k, .. } => check_rank(*k, min_dim, self.name()),
        }
    }

    /// Validates, runs the backend and canonicalizes its output, keeping the
    /// leading `k` components.
    pub fn factorize(&self, matrix: ArrayView2<f64>) -> anyhow::Result<Factorization> {
        let k = self.validate(matrix.dim())?;
        let raw = match *self {
            Self::Exact => self::nalgebra::NalgebraSVD.compute(matrix)?,
            Self::ExactAlternate => self.compute_alternate(matrix)?,
            Self::Lanczos {
                max_iterations,
                tolerance,
                seed,
                ..
            } => self::lanczos::LanczosSVD::new(k)
                .max_iterations(max_iterations)
                .tolerance(tolerance)
                .seed(seed)
                .compute(matrix)?,
            Self::Random {
                n_oversamples,
                n_power_iterations,
                normalizer,
                seed,
                ..
            } => self::randomized::RandomizedSVD::new(k)
                .n_oversamples(n_oversamples)
                .n_power_iterations(n_power_iterations)
                .normalizer(normalizer)
                .seed(seed)
                .compute(matrix)?,
        };
        Ok(raw.canonicalize().truncate(k))
    }

    #[cfg(feature = "faer")]
    fn compute_alternate(&self, matrix: ArrayView2<f64>) -> anyhow::Result<Factorization> {
        self::faer::FaerSVD.compute(matrix)
    }

    #[cfg(not(feature = "faer"))]
    fn compute_alternate(&self, _matrix: ArrayView2<f64>) -> anyhow::Result<Factorization> {
        bail!(SsaError::Configuration(
            "the exact-alternate backend requires the 'faer' feature".to_string()
        ))
    }
}

fn check_rank(k: Option<usize>, min_dim: usize, backend: &str) -> Result<usize, SsaError> {
    let max_rank = min_dim.saturating_sub(1);
    let k = k.unwrap_or(max_rank);
    if k < 1 || k > max_rank {
        return Err(SsaError::Configuration(format!(
            "{} backend needs k in [1, {}], got {}",
            backend, max_rank, k
        )));
    }
    Ok(k)
}

impl fmt::Display for SvdMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SvdMethod {
    type Err = SsaError;

    /// Parses a backend name into the method with default options.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "exact" | "lapack" => Ok(Self::Exact),
            "exact-alternate" | "exact_alternate" | "faer" => Ok(Self::ExactAlternate),
            "partial-iterative" | "partial_iterative" | "lanczos" => Ok(Self::lanczos()),
            "randomized-approximate" | "randomized_approximate" | "randomized" | "random" => {
                Ok(Self::random())
            }
            other => Err(SsaError::Configuration(format!(
                "unknown svd backend '{}'",
                other
            ))),
        }
    }
}

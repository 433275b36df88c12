//! # Singular Spectrum Analysis
//!
//! [`Ssa`] embeds a series, factorizes the embedding and reconstructs named
//! groups of components.
//!
//! ## Lifecycle
//! A freshly built engine holds no decomposition. Every query that depends on
//! the components ([`Ssa::component_count`], [`Ssa::define_groups`],
//! [`Ssa::get`], ...) fails with [`SsaError::BadCall`] until
//! [`Ssa::decompose`] has succeeded once. Each later call to `decompose`
//! replaces the stored factorization; user groups are kept.
//!
//! ## Example
//! ```no_run
//! use single_ssa::ssa::Ssa;
//! use single_ssa::svd::SvdMethod;
//!
//! # fn main() -> anyhow::Result<()> {
//! let values: Vec<f64> = (0..120).map(|t| (t as f64 * 0.3).sin() + t as f64 * 0.05).collect();
//! let mut ssa = Ssa::builder(values)
//!     .window(40)
//!     .svd_method(SvdMethod::Exact)
//!     .build()?;
//! ssa.decompose()?;
//! ssa.define_groups([("trend", vec![0usize]), ("season", vec![1, 2])], false, false)?;
//! let trend = ssa.get("trend")?;
//! let residual = ssa.get("residual")?;
//! # Ok(())
//! # }
//! ```

use log::{debug, warn};
use ndarray::{Array1, Array2};
use rayon::prelude::*;

use crate::embedding::{Embedding, EmbeddingKind};
use crate::error::{Result, SsaError};
use crate::series::Series;
use crate::svd::{Factorization, SvdMethod};

pub mod groups;
pub mod reconstruct;

pub use groups::{GroupRegistry, GroupSpec, ResolvedGroup, RESERVED_NAMES};
pub use reconstruct::Reconstructor;

/// Fluent configuration for [`Ssa`]. Nothing is validated until
/// [`SsaBuilder::build`].
pub struct SsaBuilder {
    values: Array1<f64>,
    index: Option<Vec<String>>,
    name: Option<String>,
    window: Option<usize>,
    embedding: EmbeddingKind,
    svd_method: SvdMethod,
}

impl SsaBuilder {
    pub fn new(values: impl Into<Array1<f64>>) -> Self {
        SsaBuilder {
            values: values.into(),
            index: None,
            name: None,
            window: None,
            embedding: EmbeddingKind::default(),
            svd_method: SvdMethod::default(),
        }
    }

    /// Window length L, defaults to N / 2.
    pub fn window(mut self, window: usize) -> Self {
        self.window = Some(window);
        self
    }

    pub fn embedding(mut self, embedding: EmbeddingKind) -> Self {
        self.embedding = embedding;
        self
    }

    pub fn svd_method(mut self, svd_method: SvdMethod) -> Self {
        self.svd_method = svd_method;
        self
    }

    /// Labels carried over to every reconstructed series.
    pub fn index<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.index = Some(labels.into_iter().map(Into::into).collect());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn build(self) -> Result<Ssa> {
        let mut series = Series::new(self.values)?;
        if let Some(labels) = self.index {
            series = series.with_index(labels)?;
        }
        if let Some(name) = self.name {
            series = series.with_name(name);
        }
        Ssa::new(series, self.window, self.embedding, self.svd_method)
    }
}

/// SSA engine over one series.
#[derive(Debug)]
pub struct Ssa {
    series: Series,
    embedding: Box<dyn Embedding>,
    svd_method: SvdMethod,
    factorization: Option<Factorization>,
    groups: GroupRegistry,
}

impl Ssa {
    pub fn builder(values: impl Into<Array1<f64>>) -> SsaBuilder {
        SsaBuilder::new(values)
    }

    /// Fails with a configuration error when the window is outside
    /// `[1, N - 1]` or the backend cannot produce a valid rank for the
    /// embedding shape.
    pub fn new(
        series: Series,
        window: Option<usize>,
        embedding: EmbeddingKind,
        svd_method: SvdMethod,
    ) -> Result<Self> {
        let n = series.len();
        let window = window.unwrap_or(n / 2);
        let embedding = embedding.build(window, n)?;
        svd_method.validate(embedding.decomposition_shape())?;

        debug!(
            "SSA on {} values: {} embedding, window {}, {} backend",
            n,
            embedding.kind(),
            window,
            svd_method
        );

        Ok(Ssa {
            series,
            embedding,
            svd_method,
            factorization: None,
            groups: GroupRegistry::new(),
        })
    }

    /// Factorizes the embedding with the configured backend.
    pub fn decompose(&mut self) -> anyhow::Result<&Factorization> {
        self.decompose_with(self.svd_method)
    }

    /// Factorizes the embedding with `method` for this call only.
    ///
    /// The stored factorization is left untouched when the call fails.
    pub fn decompose_with(&mut self, method: SvdMethod) -> anyhow::Result<&Factorization> {
        let matrix = self.embedding.decomposition_matrix(self.series.view());
        debug!(
            "Decomposing {:?} {} matrix with the {} backend",
            matrix.dim(),
            self.embedding.kind(),
            method
        );
        let factorization = method.factorize(matrix.view())?;

        let rank = factorization.rank();
        if let Some((name, _)) = self
            .groups
            .user_groups()
            .iter()
            .find(|(_, indices)| indices.iter().any(|&i| i >= rank))
        {
            warn!(
                "Group '{}' refers to components beyond the new count {}",
                name, rank
            );
        }
        debug!("Decomposition yielded {} components", rank);

        Ok(self.factorization.insert(factorization))
    }

    fn decomposed(&self, operation: &'static str) -> Result<&Factorization> {
        self.factorization
            .as_ref()
            .ok_or(SsaError::BadCall(operation))
    }

    pub fn is_decomposed(&self) -> bool {
        self.factorization.is_some()
    }

    pub fn factorization(&self) -> Option<&Factorization> {
        self.factorization.as_ref()
    }

    /// Number of components R of the current decomposition.
    pub fn component_count(&self) -> Result<usize> {
        Ok(self.decomposed("component_count")?.rank())
    }

    pub fn singular_values(&self) -> Result<&Array1<f64>> {
        Ok(self.decomposed("singular_values")?.s())
    }

    /// Share of each component in the sum of squared singular values.
    pub fn contributions(&self) -> Result<Array1<f64>> {
        let s = self.decomposed("contributions")?.s();
        let total: f64 = s.iter().map(|v| v * v).sum();
        if total == 0.0 {
            return Ok(Array1::zeros(s.len()));
        }
        Ok(s.mapv(|v| v * v / total))
    }

    /// Defines user groups, see [`GroupRegistry::define`].
    pub fn define_groups<I, K, V>(&mut self, groups: I, append: bool, overwrite: bool) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<GroupSpec>,
    {
        let count = self.decomposed("define_groups")?.rank();
        self.groups.define(groups, count, append, overwrite)
    }

    /// Raw user mapping in definition order, without the reserved groups.
    pub fn user_groups(&self) -> &[(String, Vec<usize>)] {
        self.groups.user_groups()
    }

    pub fn group_names(&self) -> Result<Vec<String>> {
        self.decomposed("group_names")?;
        Ok(self.groups.names())
    }

    /// Every resolvable group, reserved ones included.
    pub fn groups(&self) -> Result<Vec<(String, ResolvedGroup)>> {
        let count = self.decomposed("groups")?.rank();
        Ok(self.groups.resolve_all(count))
    }

    pub fn lookup(&self, name: &str) -> Result<ResolvedGroup> {
        let count = self.decomposed("lookup")?.rank();
        self.groups.lookup(name, count)
    }

    /// Series rebuilt from the components in `indices`.
    pub fn reconstruct_group(&self, indices: &[usize]) -> Result<Series> {
        let factorization = self.decomposed("reconstruct_group")?;
        let values = self.reconstructor(factorization).reconstruct(indices)?;
        Ok(self.series.like(values))
    }

    /// Series of the group `name`. `"original"` returns the input as is.
    pub fn get(&self, name: &str) -> Result<Series> {
        let factorization = self.decomposed("get")?;
        match self.groups.lookup(name, factorization.rank())? {
            ResolvedGroup::Original => Ok(self.series.clone()),
            ResolvedGroup::Indices(indices) => {
                let values = self.reconstructor(factorization).reconstruct(&indices)?;
                Ok(self.series.like(values))
            }
        }
    }

    /// Every group of [`Ssa::groups`] reconstructed, in the same order.
    pub fn reconstruct_all(&self) -> Result<Vec<(String, Series)>> {
        let factorization = self.decomposed("reconstruct_all")?;
        let resolved = self.groups.resolve_all(factorization.rank());
        let reconstructor = self.reconstructor(factorization);

        resolved
            .into_par_iter()
            .map(|(name, group)| -> Result<(String, Series)> {
                let series = match group {
                    ResolvedGroup::Original => self.series.clone(),
                    ResolvedGroup::Indices(indices) => {
                        self.series.like(reconstructor.reconstruct(&indices)?)
                    }
                };
                Ok((name, series))
            })
            .collect()
    }

    /// Rank-1 matrix of component `index` in the reconstruction geometry.
    pub fn elementary_matrix(&self, index: usize) -> Result<Array2<f64>> {
        let factorization = self.decomposed("elementary_matrix")?;
        self.reconstructor(factorization).elementary_matrix(index)
    }

    fn reconstructor<'a>(&'a self, factorization: &'a Factorization) -> Reconstructor<'a> {
        Reconstructor::new(self.embedding.as_ref(), self.series.view(), factorization)
    }

    pub fn series(&self) -> &Series {
        &self.series
    }

    pub fn window(&self) -> usize {
        self.embedding.window()
    }

    /// K for the trajectory embedding, L for lag-covariance.
    pub fn derived_size(&self) -> usize {
        self.embedding.derived_size()
    }

    pub fn embedding_kind(&self) -> EmbeddingKind {
        self.embedding.kind()
    }

    pub fn svd_method(&self) -> SvdMethod {
        self.svd_method
    }
}

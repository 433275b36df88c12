//! # Series
//!
//! Validated one-dimensional input for SSA, with optional index labels and a
//! name. Reconstructed groups are handed back as `Series` carrying the same
//! labels and name as the input, so plain input gives plain output and
//! labeled input gives labeled output.

use std::sync::Arc;

use ndarray::{Array1, ArrayView1, ArrayViewD, Ix1};

use crate::error::{Result, SsaError};

/// Smallest series length SSA can embed.
pub const MIN_LENGTH: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    values: Array1<f64>,
    index: Option<Arc<[String]>>,
    name: Option<String>,
}

impl Series {
    /// Creates a series from raw values.
    ///
    /// Fails with [`SsaError::Validation`] when fewer than two values are given
    /// or any value is NaN or infinite.
    pub fn new(values: Array1<f64>) -> Result<Self> {
        validate_values(values.view())?;
        Ok(Self {
            values,
            index: None,
            name: None,
        })
    }

    pub fn from_slice(values: &[f64]) -> Result<Self> {
        Self::new(Array1::from(values.to_vec()))
    }

    pub fn from_view(values: ArrayView1<f64>) -> Result<Self> {
        Self::new(values.to_owned())
    }

    /// Creates a series from an array of arbitrary dimensionality.
    ///
    /// Only arrays with exactly one axis are accepted.
    pub fn from_dyn(values: ArrayViewD<f64>) -> Result<Self> {
        if values.ndim() != 1 {
            return Err(SsaError::Validation(format!(
                "series must be one-dimensional, got {} dimensions with shape {:?}",
                values.ndim(),
                values.shape()
            )));
        }
        let values = values
            .into_dimensionality::<Ix1>()
            .map_err(|e| SsaError::Validation(e.to_string()))?;
        Self::from_view(values)
    }

    /// Attaches index labels, one per value.
    pub fn with_index<I, S>(mut self, labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Arc<[String]> = labels.into_iter().map(Into::into).collect();
        if labels.len() != self.values.len() {
            return Err(SsaError::Validation(format!(
                "index has {} labels but the series has {} values",
                labels.len(),
                self.values.len()
            )));
        }
        self.index = Some(labels);
        Ok(self)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builds a series of the same length sharing this series' labels and name.
    pub(crate) fn like(&self, values: Array1<f64>) -> Self {
        debug_assert_eq!(values.len(), self.values.len());
        Self {
            values,
            index: self.index.clone(),
            name: self.name.clone(),
        }
    }

    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    pub fn view(&self) -> ArrayView1<'_, f64> {
        self.values.view()
    }

    pub fn index(&self) -> Option<&[String]> {
        self.index.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_labeled(&self) -> bool {
        self.index.is_some()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> Array1<f64> {
        self.values
    }
}

fn validate_values(values: ArrayView1<f64>) -> Result<()> {
    if values.len() < MIN_LENGTH {
        return Err(SsaError::Validation(format!(
            "series needs at least {} values, got {}",
            MIN_LENGTH,
            values.len()
        )));
    }
    if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
        return Err(SsaError::Validation(format!(
            "series must not contain infs or NaNs (value {} at position {})",
            values[pos], pos
        )));
    }
    Ok(())
}

impl TryFrom<Vec<f64>> for Series {
    type Error = SsaError;

    fn try_from(values: Vec<f64>) -> Result<Self> {
        Self::new(Array1::from(values))
    }
}

impl TryFrom<Array1<f64>> for Series {
    type Error = SsaError;

    fn try_from(values: Array1<f64>) -> Result<Self> {
        Self::new(values)
    }
}

impl TryFrom<&[f64]> for Series {
    type Error = SsaError;

    fn try_from(values: &[f64]) -> Result<Self> {
        Self::from_slice(values)
    }
}

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::criterion::{HoeffdingBound, SplitCriterion};
use crate::error::{Error, Result};
use crate::model::LeafModel;

/// Growth parameters of a [`HoeffdingTree`](super::HoeffdingTree).
///
/// # Defaults
///
/// | Field | Default |
/// |-------|---------|
/// | `chunk_size` | 50 |
/// | `delta` | 0.01 |
/// | `tie_threshold` | 0.05 |
/// | `quality_range` | 1.0 |
/// | `criterion` | [`SplitCriterion::StdDevReduction`] |
/// | `leaf_model` | [`LeafModel::Constant`] |
/// | `min_branch_fraction` | 0.05 |
/// | `max_bins` | 64 |
/// | `max_coefficient_of_determination` | `None` |
/// | `max_depth` | `None` |
/// | `n_features` | `None` (fixed by the first sample) |
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TreeConfig {
    /// Examples a leaf accumulates between split evaluations.
    pub chunk_size: usize,
    /// Hoeffding confidence parameter, in `(0, 1)`.
    pub delta: f64,
    /// Tie-breaking threshold `τ`.
    pub tie_threshold: f64,
    /// Range `R` of the split quality measure.
    pub quality_range: f64,
    /// Split quality measure.
    pub criterion: SplitCriterion,
    /// Regression model fitted at each leaf.
    pub leaf_model: LeafModel,
    /// Minimum share of a leaf's observations each side of a split must hold.
    pub min_branch_fraction: f64,
    /// Bins each split observer keeps per feature. Beyond it, neighbouring
    /// values are merged and candidate thresholds only fall between bins.
    pub max_bins: usize,
    /// Mauve-family stop condition: leaves whose multivariate fit explains at
    /// least this fraction of target variance are not split.
    pub max_coefficient_of_determination: Option<f64>,
    /// Leaves at this depth are never split.
    pub max_depth: Option<usize>,
    /// Feature vector length, or `None` to take it from the first sample.
    pub n_features: Option<usize>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            chunk_size: 50,
            delta: 0.01,
            tie_threshold: 0.05,
            quality_range: 1.0,
            criterion: SplitCriterion::default(),
            leaf_model: LeafModel::default(),
            min_branch_fraction: 0.05,
            max_bins: 64,
            max_coefficient_of_determination: None,
            max_depth: None,
            n_features: None,
        }
    }
}

impl TreeConfig {
    /// Check every parameter.
    ///
    /// # Errors
    ///
    /// Returns the first invalid parameter found, in field order.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidChunkSize(self.chunk_size));
        }
        if !(self.delta > 0.0 && self.delta < 1.0) {
            return Err(Error::InvalidDelta(self.delta));
        }
        if !(self.tie_threshold.is_finite() && self.tie_threshold >= 0.0) {
            return Err(Error::InvalidTieThreshold(self.tie_threshold));
        }
        if !(self.quality_range.is_finite() && self.quality_range > 0.0) {
            return Err(Error::InvalidQualityRange(self.quality_range));
        }
        if !(0.0..0.5).contains(&self.min_branch_fraction) {
            return Err(Error::InvalidBranchFraction(self.min_branch_fraction));
        }
        if self.max_bins < 2 {
            return Err(Error::InvalidMaxBins(self.max_bins));
        }
        if let Some(r2) = self.max_coefficient_of_determination
            && !(r2 > 0.0 && r2 <= 1.0)
        {
            return Err(Error::InvalidCoefficientOfDetermination(r2));
        }
        if let Some(n) = self.n_features {
            self.validate_features(n)?;
        }
        Ok(())
    }

    pub(crate) fn validate_features(&self, n_features: usize) -> Result<()> {
        if n_features == 0 {
            return Err(Error::ZeroFeatures);
        }
        if let LeafModel::SimpleLinear {
            feature: Some(feature),
        } = self.leaf_model
            && feature >= n_features
        {
            return Err(Error::LeafModelFeatureOutOfRange {
                feature,
                n_features,
            });
        }
        Ok(())
    }

    /// The decision rule these parameters describe.
    #[must_use]
    pub fn bound(&self) -> HoeffdingBound {
        HoeffdingBound::new(self.delta, self.tie_threshold, self.quality_range)
    }
}

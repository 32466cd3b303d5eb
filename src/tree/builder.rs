use crate::criterion::SplitCriterion;
use crate::error::Result;
use crate::model::LeafModel;

use super::{HoeffdingTree, TreeConfig};

/// A builder for [`HoeffdingTree`] with a fluent API.
///
/// Created via [`HoeffdingTree::builder()`]. Parameters are only checked by
/// [`build`](Self::build). See [`TreeConfig`] for the defaults.
///
/// # Examples
///
/// ```
/// use hoeffding::prelude::*;
///
/// let tree = HoeffdingTree::builder()
///     .chunk_size(100)
///     .delta(0.05)
///     .criterion(SplitCriterion::Mauve)
///     .leaf_model(LeafModel::SimpleLinear { feature: None })
///     .build()
///     .unwrap();
///
/// assert_eq!(tree.config().chunk_size, 100);
/// assert_eq!(tree.n_leaves(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct HoeffdingTreeBuilder {
    config: TreeConfig,
}

impl HoeffdingTreeBuilder {
    pub(super) fn new() -> Self {
        Self::default()
    }

    /// Number of examples a leaf accumulates between split evaluations.
    #[must_use]
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.config.chunk_size = chunk_size;
        self
    }

    /// Hoeffding confidence parameter δ.
    #[must_use]
    pub fn delta(mut self, delta: f64) -> Self {
        self.config.delta = delta;
        self
    }

    /// Tie-breaking threshold τ.
    #[must_use]
    pub fn tie_threshold(mut self, tie_threshold: f64) -> Self {
        self.config.tie_threshold = tie_threshold;
        self
    }

    /// Range `R` of the split quality measure.
    #[must_use]
    pub fn quality_range(mut self, quality_range: f64) -> Self {
        self.config.quality_range = quality_range;
        self
    }

    /// Split quality measure.
    #[must_use]
    pub fn criterion(mut self, criterion: SplitCriterion) -> Self {
        self.config.criterion = criterion;
        self
    }

    /// Regression model fitted at each leaf.
    #[must_use]
    pub fn leaf_model(mut self, leaf_model: LeafModel) -> Self {
        self.config.leaf_model = leaf_model;
        self
    }

    /// Minimum share of a leaf's observations on each side of a split.
    #[must_use]
    pub fn min_branch_fraction(mut self, fraction: f64) -> Self {
        self.config.min_branch_fraction = fraction;
        self
    }

    /// Bins kept per feature by each leaf's split observers.
    #[must_use]
    pub fn max_bins(mut self, max_bins: usize) -> Self {
        self.config.max_bins = max_bins;
        self
    }

    /// Stop splitting leaves whose linear fit already explains this much
    /// variance. Only used by the Mauve criteria.
    #[must_use]
    pub fn max_coefficient_of_determination(mut self, r2: f64) -> Self {
        self.config.max_coefficient_of_determination = Some(r2);
        self
    }

    /// Never split leaves at this depth.
    #[must_use]
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = Some(depth);
        self
    }

    /// Fix the feature vector length up front.
    #[must_use]
    pub fn n_features(mut self, n_features: usize) -> Self {
        self.config.n_features = Some(n_features);
        self
    }

    /// Validate the parameters and build the tree.
    ///
    /// # Errors
    ///
    /// Returns the configuration error reported by [`TreeConfig::validate`].
    pub fn build(self) -> Result<HoeffdingTree> {
        HoeffdingTree::new(self.config)
    }
}

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{Correlation, MeanVariance, RegressionStatistics, observed};

/// Everything a leaf knows about the examples routed to it.
///
/// Missing feature values (non-finite, or beyond the end of a short vector)
/// are skipped by that feature's [`Correlation`], and an example with any
/// missing value is left out of the [`RegressionStatistics`]. The target
/// statistics always see every example.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LeafStatistics {
    target: MeanVariance,
    features: Vec<Correlation>,
    regression: RegressionStatistics,
}

impl LeafStatistics {
    /// Create empty statistics for `n_features` features.
    #[must_use]
    pub fn new(n_features: usize) -> Self {
        Self {
            target: MeanVariance::new(),
            features: vec![Correlation::new(); n_features],
            regression: RegressionStatistics::new(n_features),
        }
    }

    /// Record one example.
    pub fn push(&mut self, features: &[f64], target: f64) {
        self.target.push(target);
        let mut complete = true;
        for (j, corr) in self.features.iter_mut().enumerate() {
            match features.get(j).copied().and_then(observed) {
                Some(value) => corr.push(value, target),
                None => complete = false,
            }
        }
        if complete {
            self.regression.push(features, target);
        }
    }

    /// Number of examples recorded.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.target.count()
    }

    /// Number of features tracked.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.features.len()
    }

    /// Target statistics over every example.
    #[must_use]
    pub fn target(&self) -> &MeanVariance {
        &self.target
    }

    /// Joint statistics of `feature` and the target, over the examples where
    /// the feature was observed.
    #[must_use]
    pub fn feature(&self, feature: usize) -> Option<&Correlation> {
        self.features.get(feature)
    }

    /// Per-feature joint statistics, indexed by feature.
    #[must_use]
    pub fn features(&self) -> &[Correlation] {
        &self.features
    }

    /// Multivariate statistics over the fully observed examples.
    #[must_use]
    pub fn regression(&self) -> &RegressionStatistics {
        &self.regression
    }

    /// Mean of `feature` over the examples where it was observed.
    #[must_use]
    pub fn feature_mean(&self, feature: usize) -> Option<f64> {
        self.features
            .get(feature)
            .filter(|corr| corr.count() > 0)
            .map(|corr| corr.x().mean())
    }
}

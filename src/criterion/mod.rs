//! Split quality measures and the Hoeffding acceptance rule.
//!
//! A [`SplitCriterion`] scores a candidate `(feature, threshold)` partition
//! of a leaf from the [`PartitionStats`] of its two sides; higher is better
//! and `0.0` means "no improvement". Each leaf keeps one threshold observer
//! per feature. It holds one bin per distinct observed value until
//! [`max_bins`](crate::TreeConfig::max_bins) is reached, then merges
//! neighbouring bins, so memory per leaf stays bounded on continuous input.
//! Candidates lie between bins, so the scored statistics are exactly those
//! of the examples the split would route left and right.
//!
//! Whether the best candidate is good enough is decided by a
//! [`HoeffdingBound`]: with `ε = R · sqrt(ln(1/δ) / (2n))`, the split is
//! accepted when the gap to the second-best candidate exceeds `ε`, or when
//! `ε` has shrunk below the tie threshold `τ`.

mod observer;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub(crate) use observer::FeatureObserver;

use crate::stats::{Correlation, RegressionStatistics};
use crate::tree::NodeId;

/// Split quality measure.
///
/// Every measure is a reduction in dispersion between the parent (both
/// sides merged) and the count-weighted average of the two sides:
///
/// | Variant | Dispersion |
/// |---------|------------|
/// | `StdDevReduction` | standard deviation of the target |
/// | `Mauve` | residual std of the target regressed on the split feature |
/// | `ExtendedMauve` | smallest residual std over single-feature regressions on every feature |
/// | `TotalMauve` | residual std of the multivariate least-squares fit |
///
/// The Mauve family rewards partitions that are individually well explained
/// by a linear model, so a leaf that is already linear is not split just
/// because its target varies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SplitCriterion {
    /// Reduction of the target standard deviation.
    #[default]
    StdDevReduction,
    /// Reduction of the split-feature regression residual.
    Mauve,
    /// Reduction of the best single-feature regression residual.
    ExtendedMauve,
    /// Reduction of the multivariate regression residual.
    TotalMauve,
    /// Never split.
    Never,
}

impl SplitCriterion {
    /// Whether this is one of the linear-model-aware Mauve measures.
    #[must_use]
    pub fn is_mauve(self) -> bool {
        matches!(self, Self::Mauve | Self::ExtendedMauve | Self::TotalMauve)
    }

    /// Quality of splitting a partition into `left` and `right`.
    ///
    /// Returns `0.0` when either side is empty or the measure is not
    /// finite.
    #[must_use]
    pub fn quality(self, left: &PartitionStats, right: &PartitionStats) -> f64 {
        if left.count() == 0 || right.count() == 0 || self == Self::Never {
            return 0.0;
        }
        let mut parent = left.clone();
        parent.merge(right);
        self.quality_given_parent(self.dispersion(&parent).0, left, right)
    }

    /// [`quality`](Self::quality) with the dispersion of the merged parent
    /// already known. All candidates of one feature share the same parent.
    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn quality_given_parent(
        self,
        parent: f64,
        left: &PartitionStats,
        right: &PartitionStats,
    ) -> f64 {
        if left.count() == 0 || right.count() == 0 || self == Self::Never {
            return 0.0;
        }
        let (l, nl) = self.dispersion(left);
        let (r, nr) = self.dispersion(right);
        let n = nl + nr;
        if n == 0 {
            return 0.0;
        }
        let n = n as f64;
        let quality = parent - l * nl as f64 / n - r * nr as f64 / n;
        if quality.is_finite() { quality } else { 0.0 }
    }

    /// Dispersion of one partition and the number of examples it is measured on.
    pub(crate) fn dispersion(self, stats: &PartitionStats) -> (f64, u64) {
        let pair = &stats.pair;
        match (self, &stats.moments) {
            (Self::StdDevReduction | Self::Never, _) => (pair.y().std_dev(), pair.count()),
            (Self::ExtendedMauve, Moments::PerFeature(pairs)) => {
                let Some(first) = pairs.first() else {
                    return (pair.residual_std_dev(), pair.count());
                };
                let best = pairs
                    .iter()
                    .map(Correlation::residual_std_dev)
                    .fold(first.y().std_dev(), f64::min);
                (best, first.count())
            }
            (Self::TotalMauve, Moments::Multivariate(reg)) => (reg.residual_std_dev(), reg.count()),
            (Self::Mauve | Self::ExtendedMauve | Self::TotalMauve, _) => {
                (pair.residual_std_dev(), pair.count())
            }
        }
    }
}

/// What a [`PartitionStats`] keeps beyond the split-feature pair.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
enum Moments {
    #[default]
    Pair,
    /// One target pair per feature, for the best single-feature regression.
    PerFeature(Vec<Correlation>),
    /// Full multivariate least-squares moments.
    Multivariate(RegressionStatistics),
}

/// Statistics of the examples on one side of a candidate split.
///
/// `pair` holds the joint moments of the split feature and the target.
/// What else is kept depends on the criterion: `ExtendedMauve` adds one
/// pair per feature (O(d)), `TotalMauve` the multivariate accumulator
/// (O(d²)). Both only take fully observed examples.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PartitionStats {
    pair: Correlation,
    moments: Moments,
}

impl PartitionStats {
    /// Create empty statistics holding what `criterion` scores on, for
    /// feature vectors of length `n_features`.
    #[must_use]
    pub fn new(criterion: SplitCriterion, n_features: usize) -> Self {
        let moments = match criterion {
            SplitCriterion::ExtendedMauve => Moments::PerFeature(vec![Correlation::new(); n_features]),
            SplitCriterion::TotalMauve => Moments::Multivariate(RegressionStatistics::new(n_features)),
            _ => Moments::Pair,
        };
        Self {
            pair: Correlation::new(),
            moments,
        }
    }

    /// Record one example whose split feature equals `value`. `row` is the
    /// full feature vector when every feature was observed.
    pub fn push(&mut self, value: f64, target: f64, row: Option<&[f64]>) {
        self.pair.push(value, target);
        let Some(row) = row else { return };
        match &mut self.moments {
            Moments::Pair => {}
            Moments::PerFeature(pairs) => {
                for (pair, &x) in pairs.iter_mut().zip(row) {
                    pair.push(x, target);
                }
            }
            Moments::Multivariate(reg) => reg.push(row, target),
        }
    }

    /// Fold `other` into `self`.
    pub fn merge(&mut self, other: &Self) {
        self.pair.merge(&other.pair);
        match (&mut self.moments, &other.moments) {
            (Moments::PerFeature(a), Moments::PerFeature(b)) => {
                for (a, b) in a.iter_mut().zip(b) {
                    a.merge(b);
                }
            }
            (Moments::Multivariate(a), Moments::Multivariate(b)) => a.merge(b),
            (Moments::Pair, theirs) => self.moments = theirs.clone(),
            _ => {}
        }
    }

    /// Number of examples recorded.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.pair.count()
    }

    /// Joint moments of the split feature and the target.
    #[must_use]
    pub fn pair(&self) -> &Correlation {
        &self.pair
    }

    /// Per-feature target pairs, empty unless kept for `ExtendedMauve`.
    #[must_use]
    pub fn feature_pairs(&self) -> &[Correlation] {
        match &self.moments {
            Moments::PerFeature(pairs) => pairs,
            _ => &[],
        }
    }

    /// Multivariate accumulator, if kept for `TotalMauve`.
    #[must_use]
    pub fn regression(&self) -> Option<&RegressionStatistics> {
        match &self.moments {
            Moments::Multivariate(reg) => Some(reg),
            _ => None,
        }
    }
}

/// The Hoeffding acceptance rule.
///
/// # Examples
///
/// ```
/// use hoeffding::criterion::HoeffdingBound;
///
/// let bound = HoeffdingBound::new(0.05, 0.0, 1.0);
/// // A fixed gap of 0.2 is not significant after 10 examples...
/// assert!(!bound.accepts(0.5, 0.3, 10));
/// // ...but is after 1000.
/// assert!(bound.accepts(0.5, 0.3, 1000));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HoeffdingBound {
    delta: f64,
    tie_threshold: f64,
    range: f64,
}

impl HoeffdingBound {
    /// Create a rule with confidence `1 - delta`, tie threshold
    /// `tie_threshold` and quality range `range`.
    #[must_use]
    pub fn new(delta: f64, tie_threshold: f64, range: f64) -> Self {
        Self {
            delta,
            tie_threshold,
            range,
        }
    }

    /// Confidence parameter δ.
    #[must_use]
    pub fn delta(&self) -> f64 {
        self.delta
    }

    /// Tie threshold τ.
    #[must_use]
    pub fn tie_threshold(&self) -> f64 {
        self.tie_threshold
    }

    /// Range `R` of the quality measure.
    #[must_use]
    pub fn range(&self) -> f64 {
        self.range
    }

    /// `ε` after `n` examples; infinite for `n == 0`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn epsilon(&self, n: u64) -> f64 {
        if n == 0 {
            return f64::INFINITY;
        }
        self.range * ((1.0 / self.delta).ln() / (2.0 * n as f64)).sqrt()
    }

    /// Whether a best quality `best`, against a runner-up `second`, is
    /// accepted after `n` examples. A non-positive `best` never is.
    #[must_use]
    pub fn accepts(&self, best: f64, second: f64, n: u64) -> bool {
        if best <= 0.0 || !best.is_finite() {
            return false;
        }
        let epsilon = self.epsilon(n);
        best - second > epsilon || epsilon < self.tie_threshold
    }
}

/// The best threshold found for one feature.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CandidateSplit {
    /// Feature index.
    pub feature: usize,
    /// Examples with `x[feature] < threshold` go left.
    pub threshold: f64,
    /// Quality under the configured criterion.
    pub quality: f64,
    /// Observed examples that would go left.
    pub left_count: u64,
    /// Observed examples that would go right.
    pub right_count: u64,
}

/// Outcome of one split evaluation at a chunk boundary.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SplitEvaluation {
    /// The evaluated leaf. After an accepted split this id names the new
    /// internal node.
    pub leaf: NodeId,
    /// Examples the leaf had seen since its creation (the `n` of the bound).
    pub examples_seen: u64,
    /// Best candidate over all features, if any feature had two distinct values.
    pub best: Option<CandidateSplit>,
    /// Quality of the best candidate on any other feature, `0.0` if none.
    pub second_best_quality: f64,
    /// Hoeffding `ε` at this evaluation.
    pub epsilon: f64,
    /// Whether the split was committed.
    pub accepted: bool,
}

impl SplitEvaluation {
    /// `best.quality - second_best_quality`, or `0.0` without a candidate.
    #[must_use]
    pub fn quality_gap(&self) -> f64 {
        self.best
            .map_or(0.0, |best| best.quality - self.second_best_quality)
    }
}

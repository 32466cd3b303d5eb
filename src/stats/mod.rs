//! Online sufficient statistics.
//!
//! Every accumulator here is updated in O(1) per observation (O(d²) for
//! [`RegressionStatistics`]), keeps no raw samples, and can be merged with
//! another accumulator of the same kind. Merging is what lets split
//! evaluation score "what if" partitions from per-value summaries without
//! touching the authoritative leaf state.
//!
//! | Type | Tracks |
//! |------|--------|
//! | [`MeanVariance`] | count, mean and variance of a scalar (Welford) |
//! | [`Correlation`] | joint moments of a feature/target pair (Pearson, simple regression) |
//! | [`RegressionStatistics`] | means and centered co-moments for multivariate least squares |
//! | [`LeafStatistics`] | everything a leaf keeps about the examples routed to it |

mod correlation;
mod leaf;
mod mean_variance;
mod regression;

pub use correlation::Correlation;
pub use leaf::LeafStatistics;
pub use mean_variance::MeanVariance;
pub use regression::RegressionStatistics;

/// A feature value counts as observed when it is finite.
#[inline]
pub(crate) fn observed(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

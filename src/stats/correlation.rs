#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::MeanVariance;

/// Running joint moments of a `(x, y)` stream.
///
/// Keeps a [`MeanVariance`] for each coordinate plus the co-moment
/// `Σ (x - x̄)(y - ȳ)`, updated with the bivariate Welford recurrence.
/// From these it answers the Pearson correlation and the closed-form
/// simple linear regression `y = intercept + slope * x`.
///
/// Degenerate inputs never divide by zero: a constant `x` or `y` yields a
/// correlation of `0.0`, and a constant `x` yields a slope of `0.0` (the
/// regression collapses to the mean of `y`).
///
/// # Examples
///
/// ```
/// use hoeffding::stats::Correlation;
///
/// let mut corr = Correlation::new();
/// for x in [1.0, 2.0, 3.0, 4.0] {
///     corr.push(x, 2.0 * x + 1.0);
/// }
/// assert!((corr.correlation() - 1.0).abs() < 1e-12);
/// assert!((corr.slope() - 2.0).abs() < 1e-12);
/// assert!((corr.intercept() - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Correlation {
    x: MeanVariance,
    y: MeanVariance,
    comoment: f64,
}

impl Correlation {
    /// Create an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one `(x, y)` observation.
    pub fn push(&mut self, x: f64, y: f64) {
        let dx = x - self.x.mean();
        self.x.push(x);
        self.y.push(y);
        self.comoment += dx * (y - self.y.mean());
    }

    /// Fold the observations summarised by `other` into `self`.
    #[allow(clippy::cast_precision_loss)]
    pub fn merge(&mut self, other: &Self) {
        if other.count() == 0 {
            return;
        }
        if self.count() == 0 {
            *self = *other;
            return;
        }
        let n_a = self.count() as f64;
        let n_b = other.count() as f64;
        let dx = other.x.mean() - self.x.mean();
        let dy = other.y.mean() - self.y.mean();
        self.comoment += other.comoment + dx * dy * n_a * n_b / (n_a + n_b);
        self.x.merge(&other.x);
        self.y.merge(&other.y);
    }

    /// Number of observations.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.x.count()
    }

    /// Statistics of the `x` coordinate.
    #[must_use]
    pub fn x(&self) -> &MeanVariance {
        &self.x
    }

    /// Statistics of the `y` coordinate.
    #[must_use]
    pub fn y(&self) -> &MeanVariance {
        &self.y
    }

    /// Population covariance of `x` and `y`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn covariance(&self) -> f64 {
        if self.count() == 0 {
            0.0
        } else {
            self.comoment / self.count() as f64
        }
    }

    /// Pearson correlation coefficient in `[-1, 1]`.
    ///
    /// Returns `0.0` when either coordinate has zero variance.
    #[must_use]
    pub fn correlation(&self) -> f64 {
        let sxx = self.x.sum_of_squared_deviations();
        let syy = self.y.sum_of_squared_deviations();
        if sxx <= 0.0 || syy <= 0.0 {
            return 0.0;
        }
        (self.comoment / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
    }

    /// Least-squares slope of `y` on `x`, `0.0` when `x` is constant.
    #[must_use]
    pub fn slope(&self) -> f64 {
        let sxx = self.x.sum_of_squared_deviations();
        if sxx <= 0.0 {
            return 0.0;
        }
        self.comoment / sxx
    }

    /// Least-squares intercept of `y` on `x`.
    #[must_use]
    pub fn intercept(&self) -> f64 {
        self.y.mean() - self.slope() * self.x.mean()
    }

    /// Residual sum of squares of the simple linear regression.
    #[must_use]
    pub fn residual_sum_of_squares(&self) -> f64 {
        (self.y.sum_of_squared_deviations() - self.slope() * self.comoment).max(0.0)
    }

    /// Population standard deviation of the regression residuals.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn residual_std_dev(&self) -> f64 {
        if self.count() == 0 {
            0.0
        } else {
            (self.residual_sum_of_squares() / self.count() as f64).sqrt()
        }
    }

    /// Fraction of the variance of `y` explained by the simple regression.
    ///
    /// Returns `0.0` when `y` is constant.
    #[must_use]
    pub fn coefficient_of_determination(&self) -> f64 {
        let syy = self.y.sum_of_squared_deviations();
        if syy <= 0.0 {
            return 0.0;
        }
        (1.0 - self.residual_sum_of_squares() / syy).clamp(0.0, 1.0)
    }
}

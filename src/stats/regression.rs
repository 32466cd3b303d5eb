use nalgebra::{DMatrix, DVector};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Smallest ratio between the squared extreme pivots of the Cholesky factor
/// that is still solved directly. Below it the SVD path takes over.
const MIN_PIVOT_RATIO: f64 = 1e-12;

/// Second-moment statistics for multivariate linear least squares.
///
/// The accumulator keeps the means of the features and the target together
/// with their co-moments about those means, updated one example at a time
/// and merged with Chan's pairwise formulas. A large common offset in a
/// feature or the target therefore never cancels against itself. The normal
/// equations are solved on the centered system and the intercept is
/// recovered from the means. The estimate returned by
/// [`llsq_estimate`](Self::llsq_estimate) has the intercept at index `0`
/// followed by one coefficient per feature.
///
/// A push costs O(d²) and a solve O(d³).
///
/// # Examples
///
/// ```
/// use hoeffding::stats::RegressionStatistics;
///
/// let mut stats = RegressionStatistics::new(2);
/// for (x1, x2) in [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (2.0, 3.0)] {
///     stats.push(&[x1, x2], 2.0 * x1 - x2 + 4.0);
/// }
/// let beta = stats.llsq_estimate();
/// assert!((beta[0] - 4.0).abs() < 1e-9);
/// assert!((beta[1] - 2.0).abs() < 1e-9);
/// assert!((beta[2] + 1.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RegressionStatistics {
    n_features: usize,
    count: u64,
    means: Vec<f64>,
    target_mean: f64,
    /// Row-major `d × d` matrix of `Σ (xᵢ - x̄ᵢ)(xⱼ - x̄ⱼ)`.
    comoments: Vec<f64>,
    /// `Σ (xⱼ - x̄ⱼ)(y - ȳ)` per feature.
    cross: Vec<f64>,
    target_ssd: f64,
}

impl RegressionStatistics {
    /// Create empty statistics for feature vectors of length `n_features`.
    #[must_use]
    pub fn new(n_features: usize) -> Self {
        Self {
            n_features,
            count: 0,
            means: vec![0.0; n_features],
            target_mean: 0.0,
            comoments: vec![0.0; n_features * n_features],
            cross: vec![0.0; n_features],
            target_ssd: 0.0,
        }
    }

    fn comoment(&self, row: usize, col: usize) -> f64 {
        self.comoments[row * self.n_features + col]
    }

    /// Add one example. Only the first `n_features` entries of `features`
    /// are read; missing trailing entries count as zero.
    #[allow(clippy::cast_precision_loss)]
    pub fn push(&mut self, features: &[f64], target: f64) {
        let d = self.n_features;
        self.count += 1;
        let n = self.count as f64;
        // (n - 1) / n, so that the first example adds no spread
        let weight = (n - 1.0) / n;

        let deltas: Vec<f64> = (0..d)
            .map(|j| features.get(j).copied().unwrap_or(0.0) - self.means[j])
            .collect();
        let dy = target - self.target_mean;

        for (row, &dr) in deltas.iter().enumerate() {
            self.cross[row] += weight * dr * dy;
            for (col, &dc) in deltas.iter().enumerate().skip(row) {
                let v = weight * dr * dc;
                self.comoments[row * d + col] += v;
                if col != row {
                    self.comoments[col * d + row] += v;
                }
            }
        }
        self.target_ssd += weight * dy * dy;

        for (mean, delta) in self.means.iter_mut().zip(&deltas) {
            *mean += delta / n;
        }
        self.target_mean += dy / n;
    }

    /// Fold `other` into `self`. Both must track the same number of features.
    #[allow(clippy::cast_precision_loss)]
    pub fn merge(&mut self, other: &Self) {
        debug_assert_eq!(self.n_features, other.n_features);
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            self.clone_from(other);
            return;
        }
        let d = self.n_features;
        let na = self.count as f64;
        let nb = other.count as f64;
        let n = na + nb;
        let weight = na * nb / n;

        let deltas: Vec<f64> = other
            .means
            .iter()
            .zip(&self.means)
            .map(|(b, a)| b - a)
            .collect();
        let dy = other.target_mean - self.target_mean;

        for (row, &dr) in deltas.iter().enumerate() {
            self.cross[row] += other.cross[row] + weight * dr * dy;
            for (col, &dc) in deltas.iter().enumerate() {
                self.comoments[row * d + col] += other.comoments[row * d + col] + weight * dr * dc;
            }
        }
        self.target_ssd += other.target_ssd + weight * dy * dy;

        for (mean, delta) in self.means.iter_mut().zip(&deltas) {
            *mean += delta * nb / n;
        }
        self.target_mean += dy * nb / n;
        self.count += other.count;
    }

    /// Number of examples pushed.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Number of features (excluding the constant column).
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Mean of the target, `0.0` when empty.
    #[must_use]
    pub fn target_mean(&self) -> f64 {
        self.target_mean
    }

    /// Mean of `feature`, `0.0` when empty or out of range.
    #[must_use]
    pub fn feature_mean(&self, feature: usize) -> f64 {
        self.means.get(feature).copied().unwrap_or(0.0)
    }

    /// Centered sum of squares of the target.
    #[must_use]
    pub fn target_sum_of_squared_deviations(&self) -> f64 {
        self.target_ssd.max(0.0)
    }

    /// A feature is constant when its spread is below the rounding
    /// resolution of its own magnitude: `Sxx <= ε² · Σx²`.
    #[allow(clippy::cast_precision_loss)]
    fn is_constant(&self, feature: usize) -> bool {
        let sxx = self.comoment(feature, feature);
        let mean = self.means[feature];
        let sum_of_squares = sxx + self.count as f64 * mean * mean;
        sxx <= f64::EPSILON * f64::EPSILON * sum_of_squares
    }

    fn active_features(&self) -> Vec<usize> {
        (0..self.n_features).filter(|&f| !self.is_constant(f)).collect()
    }

    /// Slopes of the centered system `Sxx β = Sxy` over `active` features.
    ///
    /// The system is scaled to unit diagonal first, so features of very
    /// different spread are conditioned alike.
    fn solve_slopes(&self, active: &[usize]) -> Option<DVector<f64>> {
        let k = active.len();
        let scale: Vec<f64> = active
            .iter()
            .map(|&f| self.comoment(f, f).sqrt().recip())
            .collect();
        let a = DMatrix::from_fn(k, k, |r, c| {
            self.comoment(active[r], active[c]) * scale[r] * scale[c]
        });
        let b = DVector::from_fn(k, |r, _| self.cross[active[r]] * scale[r]);

        let scaled = solve_cholesky(&a, &b).or_else(|| {
            trace_debug!(dimension = k, "llsq falling back to pseudo-inverse");
            solve_svd(a, &b)
        })?;
        Some(DVector::from_fn(k, |r, _| scaled[r] * scale[r]))
    }

    /// Solve the least-squares problem for an intercept and one
    /// coefficient per feature.
    ///
    /// Constant features are dropped from the system and get a coefficient
    /// of `0.0`. A well-conditioned system is solved through a Cholesky
    /// factorisation; otherwise an SVD pseudo-inverse yields the
    /// minimum-norm solution. If both fail the estimate degrades to the
    /// target mean as intercept.
    #[must_use]
    pub fn llsq_estimate(&self) -> Vec<f64> {
        let mut coefficients = vec![0.0; self.n_features + 1];
        if self.count == 0 {
            return coefficients;
        }
        coefficients[0] = self.target_mean;

        let active = self.active_features();
        if active.is_empty() {
            return coefficients;
        }
        if let Some(slopes) = self.solve_slopes(&active) {
            for (&feature, &slope) in active.iter().zip(slopes.iter()) {
                coefficients[feature + 1] = slope;
                coefficients[0] -= slope * self.means[feature];
            }
        }
        coefficients
    }

    /// `Syy - 2βᵀSxy + βᵀSxxβ` for the slopes `beta(j)`.
    fn centered_residual(&self, beta: impl Fn(usize) -> f64) -> f64 {
        let d = self.n_features;
        let mut linear = 0.0;
        let mut quadratic = 0.0;
        for (row, sxy) in self.cross.iter().enumerate() {
            let br = beta(row);
            linear += br * sxy;
            quadratic += (0..d)
                .map(|col| br * self.comoment(row, col) * beta(col))
                .sum::<f64>();
        }
        self.target_ssd - 2.0 * linear + quadratic
    }

    /// Residual sum of squares of the linear model `coefficients` (intercept
    /// first) on the accumulated examples.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn residual_sum_of_squares(&self, coefficients: &[f64]) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let beta = |j: usize| coefficients.get(j + 1).copied().unwrap_or(0.0);
        // residual of the model at the mean point
        let offset = self.target_mean
            - coefficients.first().copied().unwrap_or(0.0)
            - (0..self.n_features)
                .map(|j| beta(j) * self.means[j])
                .sum::<f64>();
        (self.centered_residual(beta) + self.count as f64 * offset * offset).max(0.0)
    }

    /// Residual sum of squares of the least-squares fit itself.
    fn fitted_residual_sum_of_squares(&self) -> f64 {
        let coefficients = self.llsq_estimate();
        self.centered_residual(|j| coefficients[j + 1]).max(0.0)
    }

    /// Population standard deviation of the least-squares residuals.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn residual_std_dev(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        (self.fitted_residual_sum_of_squares() / self.count as f64).sqrt()
    }

    /// Fraction of target variance explained by the least-squares fit.
    ///
    /// Returns `0.0` when the target is constant or nothing was pushed.
    #[must_use]
    pub fn coefficient_of_determination(&self) -> f64 {
        let syy = self.target_sum_of_squared_deviations();
        if syy <= 0.0 {
            return 0.0;
        }
        (1.0 - self.fitted_residual_sum_of_squares() / syy).clamp(0.0, 1.0)
    }
}

fn solve_cholesky(a: &DMatrix<f64>, b: &DVector<f64>) -> Option<DVector<f64>> {
    let chol = a.clone().cholesky()?;
    let pivots = chol.l_dirty().diagonal();
    let (min, max) = pivots
        .iter()
        .fold((f64::INFINITY, 0.0_f64), |(lo, hi), p| (lo.min(p.abs()), hi.max(p.abs())));
    if max <= 0.0 || (min * min) / (max * max) < MIN_PIVOT_RATIO {
        return None;
    }
    let x = chol.solve(b);
    x.iter().all(|v| v.is_finite()).then_some(x)
}

fn solve_svd(a: DMatrix<f64>, b: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = a.svd(true, true);
    let largest = svd.singular_values.max();
    if largest <= 0.0 || !largest.is_finite() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let eps = largest * MIN_PIVOT_RATIO * svd.singular_values.len() as f64;
    let x = svd.solve(b, eps).ok()?;
    x.iter().all(|v| v.is_finite()).then_some(x)
}

//! Leaf regression models.
//!
//! A [`LeafModel`] names the kind of predictor a leaf uses. Fitting it on a
//! leaf's [`LeafStatistics`] freezes the current coefficients into a
//! [`FittedModel`], which is what actually predicts. Fitting never fails:
//! whenever the statistics cannot support the requested model (too few
//! examples, constant features, a singular Gram matrix) it falls back to the
//! leaf mean.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::stats::{Correlation, LeafStatistics, observed};

/// Kind of regression model fitted at each leaf.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LeafModel {
    /// Predict the mean target of the leaf.
    #[default]
    Constant,
    /// Closed-form regression on a single feature.
    ///
    /// With `feature: None` the feature with the highest absolute Pearson
    /// correlation to the target is chosen at each fit.
    SimpleLinear {
        /// Feature to regress on, or `None` to pick the best one.
        feature: Option<usize>,
    },
    /// Linear least squares over all features.
    MultivariateLinear,
}

impl LeafModel {
    /// Freeze the current statistics into a predictor.
    ///
    /// Returns `None` only when the leaf has not seen any example.
    #[must_use]
    pub fn fit(&self, stats: &LeafStatistics) -> Option<FittedModel> {
        if stats.count() == 0 {
            return None;
        }
        let mean = stats.target().mean();
        let constant = FittedModel::Constant { value: mean };
        let fitted = match *self {
            Self::Constant => constant,
            Self::SimpleLinear { feature } => {
                fit_simple(stats, feature, mean).unwrap_or(constant)
            }
            Self::MultivariateLinear => fit_multivariate(stats, mean).unwrap_or(constant),
        };
        Some(fitted)
    }
}

fn has_spread(corr: &Correlation) -> bool {
    corr.count() >= 2 && corr.x().sum_of_squared_deviations() > 0.0
}

fn fit_simple(stats: &LeafStatistics, feature: Option<usize>, mean: f64) -> Option<FittedModel> {
    if stats.count() < 2 {
        return None;
    }
    let (feature, corr) = match feature {
        Some(f) => (f, stats.feature(f).filter(|c| has_spread(c))?),
        None => stats
            .features()
            .iter()
            .enumerate()
            .filter(|(_, c)| has_spread(c))
            .max_by(|(_, a), (_, b)| a.correlation().abs().total_cmp(&b.correlation().abs()))?,
    };
    let slope = corr.slope();
    let intercept = corr.intercept();
    (slope.is_finite() && intercept.is_finite()).then_some(FittedModel::Linear {
        feature,
        slope,
        intercept,
        fallback: mean,
    })
}

fn fit_multivariate(stats: &LeafStatistics, mean: f64) -> Option<FittedModel> {
    let regression = stats.regression();
    if regression.count() == 0 {
        return None;
    }
    let coefficients = regression.llsq_estimate();
    if !coefficients.iter().all(|c| c.is_finite()) {
        return None;
    }
    let imputation = (0..stats.n_features())
        .map(|f| stats.feature_mean(f).unwrap_or(0.0))
        .collect();
    Some(FittedModel::Multivariate {
        coefficients,
        imputation,
        fallback: mean,
    })
}

/// A leaf predictor with frozen coefficients.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FittedModel {
    /// Always predicts `value`.
    Constant {
        /// The predicted value.
        value: f64,
    },
    /// `intercept + slope * x[feature]`.
    Linear {
        /// Regressor feature index.
        feature: usize,
        /// Coefficient of the regressor.
        slope: f64,
        /// Intercept.
        intercept: f64,
        /// Prediction when the regressor is missing.
        fallback: f64,
    },
    /// `coefficients[0] + Σ coefficients[j + 1] * x[j]`.
    Multivariate {
        /// Intercept followed by one coefficient per feature.
        coefficients: Vec<f64>,
        /// Value substituted for a missing feature.
        imputation: Vec<f64>,
        /// Prediction when the coefficients cannot be applied.
        fallback: f64,
    },
}

impl FittedModel {
    /// Predict the target of `features`.
    #[must_use]
    pub fn predict(&self, features: &[f64]) -> f64 {
        match self {
            Self::Constant { value } => *value,
            Self::Linear {
                feature,
                slope,
                intercept,
                fallback,
            } => features
                .get(*feature)
                .copied()
                .and_then(observed)
                .map_or(*fallback, |x| intercept + slope * x),
            Self::Multivariate {
                coefficients,
                imputation,
                fallback,
            } => {
                let Some((intercept, weights)) = coefficients.split_first() else {
                    return *fallback;
                };
                let value = weights
                    .iter()
                    .enumerate()
                    .filter(|(_, w)| **w != 0.0)
                    .fold(*intercept, |acc, (j, w)| {
                        let x = features
                            .get(j)
                            .copied()
                            .and_then(observed)
                            .or_else(|| imputation.get(j).copied())
                            .unwrap_or(0.0);
                        acc + w * x
                    });
                if value.is_finite() { value } else { *fallback }
            }
        }
    }
}

impl fmt::Display for FittedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant { value } => write!(f, "{value:.6}"),
            Self::Linear {
                feature,
                slope,
                intercept,
                ..
            } => write!(f, "{intercept:.6} + {slope:.6} * x[{feature}]"),
            Self::Multivariate { coefficients, .. } => {
                let Some((intercept, weights)) = coefficients.split_first() else {
                    return f.write_str("0");
                };
                write!(f, "{intercept:.6}")?;
                for (j, w) in weights.iter().enumerate().filter(|(_, w)| **w != 0.0) {
                    write!(f, " + {w:.6} * x[{j}]")?;
                }
                Ok(())
            }
        }
    }
}

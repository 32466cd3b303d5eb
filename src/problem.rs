//! Training tables and supervised regression problems.

use crate::error::{Error, Result};
use crate::model::FittedModel;
use crate::snapshot::TreeModel;
use crate::tree::HoeffdingTree;

/// Anything that maps a feature vector to a predicted target.
pub trait Regressor {
    /// Predict the target of `features`.
    fn predict(&self, features: &[f64]) -> f64;
}

impl Regressor for HoeffdingTree {
    fn predict(&self, features: &[f64]) -> f64 {
        HoeffdingTree::predict(self, features)
    }
}

impl Regressor for TreeModel {
    fn predict(&self, features: &[f64]) -> f64 {
        TreeModel::predict(self, features)
    }
}

impl Regressor for FittedModel {
    fn predict(&self, features: &[f64]) -> f64 {
        FittedModel::predict(self, features)
    }
}

impl<F: Fn(&[f64]) -> f64> Regressor for F {
    fn predict(&self, features: &[f64]) -> f64 {
        self(features)
    }
}

/// A table of fixed-length feature vectors with one scalar target each.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dataset {
    rows: Vec<Vec<f64>>,
    targets: Vec<f64>,
}

impl Dataset {
    /// Build a table from rows and targets.
    ///
    /// Feature values may be non-finite (missing) but every row must have
    /// the same, non-zero length and every target must be finite.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LengthMismatch`], [`Error::EmptyDataset`],
    /// [`Error::ZeroFeatures`], [`Error::DimensionMismatch`] or
    /// [`Error::NonFiniteTarget`].
    pub fn new(rows: Vec<Vec<f64>>, targets: Vec<f64>) -> Result<Self> {
        if rows.len() != targets.len() {
            return Err(Error::LengthMismatch {
                rows: rows.len(),
                targets: targets.len(),
            });
        }
        let Some(first) = rows.first() else {
            return Err(Error::EmptyDataset);
        };
        let expected = first.len();
        if expected == 0 {
            return Err(Error::ZeroFeatures);
        }
        if let Some(row) = rows.iter().find(|r| r.len() != expected) {
            return Err(Error::DimensionMismatch {
                expected,
                got: row.len(),
            });
        }
        if let Some(&target) = targets.iter().find(|t| !t.is_finite()) {
            return Err(Error::NonFiniteTarget(target));
        }
        Ok(Self { rows, targets })
    }

    /// Number of examples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Always `false`: a dataset holds at least one example.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Length of every feature vector.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    /// Example `index` as `(features, target)`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<(&[f64], f64)> {
        Some((self.rows.get(index)?.as_slice(), *self.targets.get(index)?))
    }

    /// Iterate over `(features, target)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&[f64], f64)> + '_ {
        self.rows
            .iter()
            .map(Vec::as_slice)
            .zip(self.targets.iter().copied())
    }

    /// Feature rows.
    #[must_use]
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Targets.
    #[must_use]
    pub fn targets(&self) -> &[f64] {
        &self.targets
    }
}

/// Root mean squared error of `regressor` over `data`.
///
/// Non-finite predictions count as an infinite error.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn root_mean_squared_error<R: Regressor + ?Sized>(regressor: &R, data: &Dataset) -> f64 {
    let sum: f64 = data
        .iter()
        .map(|(x, y)| {
            let p = regressor.predict(x);
            if p.is_finite() { (p - y).powi(2) } else { f64::INFINITY }
        })
        .sum();
    (sum / data.len() as f64).sqrt()
}

/// A regression problem with separate training and validation examples.
///
/// # Examples
///
/// ```
/// use hoeffding::problem::SupervisedProblem;
///
/// let problem = SupervisedProblem::from_function(
///     &[(-1.0, 1.0), (0.0, 2.0)],
///     200,
///     50,
///     42,
///     |x| x[0] * x[1],
/// )
/// .unwrap();
/// assert_eq!(problem.train().len(), 200);
/// assert_eq!(problem.validation().map(|v| v.len()), Some(50));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SupervisedProblem {
    train: Dataset,
    validation: Option<Dataset>,
}

impl SupervisedProblem {
    /// Wrap existing tables.
    #[must_use]
    pub fn new(train: Dataset, validation: Option<Dataset>) -> Self {
        Self { train, validation }
    }

    /// Sample `n_train` training and `n_validation` validation points
    /// uniformly from the box `bounds` and label them with `f`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ZeroFeatures`] for empty bounds,
    /// [`Error::InvalidBounds`] for an inverted or non-finite interval,
    /// [`Error::EmptyDataset`] when `n_train` is zero and
    /// [`Error::NonFiniteTarget`] if `f` returns a non-finite value.
    pub fn from_function<F>(
        bounds: &[(f64, f64)],
        n_train: usize,
        n_validation: usize,
        seed: u64,
        f: F,
    ) -> Result<Self>
    where
        F: Fn(&[f64]) -> f64,
    {
        if bounds.is_empty() {
            return Err(Error::ZeroFeatures);
        }
        if let Some(&(low, high)) = bounds
            .iter()
            .find(|(low, high)| !(low.is_finite() && high.is_finite() && low <= high))
        {
            return Err(Error::InvalidBounds { low, high });
        }
        if n_train == 0 {
            return Err(Error::EmptyDataset);
        }

        let mut rng = fastrand::Rng::with_seed(seed);
        let mut sample = |n: usize| -> Result<Dataset> {
            let rows: Vec<Vec<f64>> = (0..n)
                .map(|_| {
                    bounds
                        .iter()
                        .map(|&(low, high)| low + rng.f64() * (high - low))
                        .collect()
                })
                .collect();
            let targets = rows.iter().map(|x| f(x.as_slice())).collect();
            Dataset::new(rows, targets)
        };
        let train = sample(n_train)?;
        let validation = if n_validation == 0 {
            None
        } else {
            Some(sample(n_validation)?)
        };
        Ok(Self { train, validation })
    }

    /// Training examples, in presentation order.
    #[must_use]
    pub fn train(&self) -> &Dataset {
        &self.train
    }

    /// Validation examples, if any.
    #[must_use]
    pub fn validation(&self) -> Option<&Dataset> {
        self.validation.as_ref()
    }

    /// Validation RMSE of `regressor`, or `None` without validation data.
    #[must_use]
    pub fn validation_rmse<R: Regressor + ?Sized>(&self, regressor: &R) -> Option<f64> {
        self.validation
            .as_ref()
            .map(|data| root_mean_squared_error(regressor, data))
    }
}

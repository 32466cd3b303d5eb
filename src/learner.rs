//! Driver-facing solver interface.
//!
//! Experiment drivers talk to learners through [`Solver`]: `start` with a
//! problem, `iterate` once per training example, `stop` to read the result
//! out. [`IncrementalTreeLearner`] adapts a [`HoeffdingTree`] to it.

use crate::criterion::SplitEvaluation;
use crate::error::{Error, Result};
use crate::problem::{Dataset, SupervisedProblem, root_mean_squared_error};
use crate::snapshot::TreeModel;
use crate::tree::{HoeffdingTree, TreeConfig};

/// Start / iterate / stop protocol used by experiment drivers.
pub trait Solver {
    /// What [`stop`](Solver::stop) hands back.
    type Output;

    /// Prepare to learn `problem`, discarding any previous run.
    ///
    /// # Errors
    ///
    /// Implementation specific.
    fn start(&mut self, problem: &SupervisedProblem) -> Result<()>;

    /// Perform iteration `iteration`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SolverNotStarted`] outside a started run.
    fn iterate(&mut self, iteration: usize) -> Result<()>;

    /// Finish the run and produce its output.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SolverNotStarted`] outside a started run.
    fn stop(&mut self) -> Result<Self::Output>;

    /// Run one iteration per training example, in order.
    ///
    /// # Errors
    ///
    /// Propagates the first error of `start`, `iterate` or `stop`.
    fn solve(&mut self, problem: &SupervisedProblem) -> Result<Self::Output> {
        self.start(problem)?;
        for iteration in 0..problem.train().len() {
            self.iterate(iteration)?;
        }
        self.stop()
    }
}

/// Incremental learner backed by a Hoeffding tree.
///
/// Each iteration feeds the next training example to the tree; every split
/// evaluation it triggers is kept in [`evaluations`](Self::evaluations).
/// Stopping freezes the tree into a [`TreeModel`] and, when the problem has
/// validation data, records its validation RMSE.
///
/// # Examples
///
/// ```
/// use hoeffding::prelude::*;
///
/// let problem = SupervisedProblem::from_function(
///     &[(-1.0, 1.0)],
///     500,
///     100,
///     7,
///     |x| if x[0] < 0.0 { 3.0 } else { -3.0 },
/// )
/// .unwrap();
///
/// let config = TreeConfig {
///     delta: 0.05,
///     ..TreeConfig::default()
/// };
/// let mut learner = IncrementalTreeLearner::new(config).unwrap();
/// let model = learner.solve(&problem).unwrap();
///
/// assert!(model.n_leaves() >= 2);
/// assert!(learner.validation_rmse().unwrap() < 2.0);
/// ```
#[derive(Debug, Clone)]
pub struct IncrementalTreeLearner {
    config: TreeConfig,
    tree: Option<HoeffdingTree>,
    train: Option<Dataset>,
    validation: Option<Dataset>,
    evaluations: Vec<SplitEvaluation>,
    validation_rmse: Option<f64>,
}

impl IncrementalTreeLearner {
    /// Create a learner that grows trees with `config`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` is invalid.
    pub fn new(config: TreeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            tree: None,
            train: None,
            validation: None,
            evaluations: Vec::new(),
            validation_rmse: None,
        })
    }

    /// Tree parameters.
    #[must_use]
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// The tree of the current or last run.
    #[must_use]
    pub fn tree(&self) -> Option<&HoeffdingTree> {
        self.tree.as_ref()
    }

    /// Split evaluations of the current or last run, in order.
    #[must_use]
    pub fn evaluations(&self) -> &[SplitEvaluation] {
        &self.evaluations
    }

    /// Validation RMSE recorded by the last [`stop`](Solver::stop).
    #[must_use]
    pub fn validation_rmse(&self) -> Option<f64> {
        self.validation_rmse
    }

    /// Whether a run is in progress.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.train.is_some()
    }
}

impl Solver for IncrementalTreeLearner {
    type Output = TreeModel;

    fn start(&mut self, problem: &SupervisedProblem) -> Result<()> {
        let tree = HoeffdingTree::new(self.config.clone())?;
        trace_info!(
            examples = problem.train().len(),
            features = problem.train().n_features(),
            "solver started"
        );
        self.tree = Some(tree);
        self.train = Some(problem.train().clone());
        self.validation = problem.validation().cloned();
        self.evaluations.clear();
        self.validation_rmse = None;
        Ok(())
    }

    fn iterate(&mut self, iteration: usize) -> Result<()> {
        let (Some(train), Some(tree)) = (self.train.as_ref(), self.tree.as_mut()) else {
            return Err(Error::SolverNotStarted);
        };
        let (features, target) = train.get(iteration).ok_or(Error::IterationOutOfRange {
            iteration,
            n_examples: train.len(),
        })?;
        let outcome = tree.add_sample(features, target)?;
        if let Some(evaluation) = outcome.evaluation {
            self.evaluations.push(evaluation);
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<TreeModel> {
        if self.train.take().is_none() {
            return Err(Error::SolverNotStarted);
        }
        let tree = self.tree.as_ref().ok_or(Error::SolverNotStarted)?;
        let model = tree.to_model();
        self.validation_rmse = self
            .validation
            .as_ref()
            .map(|data| root_mean_squared_error(&model, data));
        trace_info!(
            leaves = model.n_leaves(),
            depth = model.depth(),
            evaluations = self.evaluations.len(),
            validation_rmse = ?self.validation_rmse,
            "solver stopped"
        );
        Ok(model)
    }
}

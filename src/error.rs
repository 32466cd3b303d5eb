#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the chunk size between split evaluations is zero.
    #[error("invalid chunk size: {0} must be positive")]
    InvalidChunkSize(usize),

    /// Returned when the Hoeffding confidence parameter is not in (0.0, 1.0).
    #[error("invalid delta: {0} must be in (0.0, 1.0)")]
    InvalidDelta(f64),

    /// Returned when the tie-breaking threshold is negative or not finite.
    #[error("invalid tie threshold: {0} must be a finite, non-negative value")]
    InvalidTieThreshold(f64),

    /// Returned when the range of the split quality statistic is not positive.
    #[error("invalid quality range: {0} must be positive")]
    InvalidQualityRange(f64),

    /// Returned when the minimum branch fraction is not in [0.0, 0.5).
    #[error("invalid branch fraction: {0} must be in [0.0, 0.5)")]
    InvalidBranchFraction(f64),

    /// Returned when the observer bin cap is below 2.
    #[error("invalid max bins: {0} must be at least 2")]
    InvalidMaxBins(usize),

    /// Returned when the coefficient-of-determination stop condition is not in (0.0, 1.0].
    #[error("invalid coefficient of determination: {0} must be in (0.0, 1.0]")]
    InvalidCoefficientOfDetermination(f64),

    /// Returned when a tree or dataset is configured with zero features.
    #[error("feature vectors must have at least one feature")]
    ZeroFeatures,

    /// Returned when a simple linear leaf model is pinned to a feature the tree does not have.
    #[error("leaf model feature {feature} is out of range for {n_features} features")]
    LeafModelFeatureOutOfRange {
        /// The configured feature index.
        feature: usize,
        /// The number of features of the tree.
        n_features: usize,
    },

    /// Returned when a feature vector does not have the dimensionality fixed for the tree.
    #[error("dimension mismatch: expected {expected} features but got {got}")]
    DimensionMismatch {
        /// The number of features fixed for the tree.
        expected: usize,
        /// The number of features of the rejected vector.
        got: usize,
    },

    /// Returned when a training target is NaN or infinite.
    #[error("training target must be finite, got {0}")]
    NonFiniteTarget(f64),

    /// Returned when a table has a different number of rows and targets.
    #[error("length mismatch: {rows} feature rows but {targets} targets")]
    LengthMismatch {
        /// The number of feature rows.
        rows: usize,
        /// The number of targets.
        targets: usize,
    },

    /// Returned when a table or problem has no rows.
    #[error("dataset must contain at least one example")]
    EmptyDataset,

    /// Returned when a domain interval has its lower bound above its upper bound.
    #[error("invalid bounds: low ({low}) must be less than or equal to high ({high})")]
    InvalidBounds {
        /// The lower bound value.
        low: f64,
        /// The upper bound value.
        high: f64,
    },

    /// Returned when a solver is iterated or stopped before it was started.
    #[error("solver has not been started")]
    SolverNotStarted,

    /// Returned when a solver iteration refers to a training example that does not exist.
    #[error("iteration {iteration} is out of range for {n_examples} training examples")]
    IterationOutOfRange {
        /// The requested iteration.
        iteration: usize,
        /// The number of training examples of the problem.
        n_examples: usize,
    },

    /// Returned when an internal invariant is violated.
    #[error("internal error: {0}")]
    Internal(&'static str),
}

pub type Result<T> = core::result::Result<T, Error>;

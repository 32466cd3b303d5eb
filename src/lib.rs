#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(unreachable_pub)]
#![deny(clippy::correctness)]
#![deny(clippy::suspicious)]
#![deny(clippy::style)]
#![deny(clippy::complexity)]
#![deny(clippy::perf)]
#![deny(clippy::pedantic)]
#![deny(clippy::std_instead_of_core)]

//! Incremental regression trees grown from a stream of examples.
//!
//! A [`HoeffdingTree`] starts as a single leaf. Every training example is
//! routed to a leaf, which keeps mergeable online statistics instead of the
//! raw data. Every `chunk_size` examples a leaf scores the best threshold of
//! each feature and, when the Hoeffding bound says the winner is reliably
//! better than the runner-up, replaces itself with a split and two new
//! leaves. Predictions walk the splits and apply the leaf's regression
//! model.
//!
//! # Getting Started
//!
//! ```
//! use hoeffding::prelude::*;
//!
//! let mut tree = HoeffdingTree::builder()
//!     .chunk_size(50)
//!     .delta(0.05)
//!     .build()
//!     .unwrap();
//!
//! let mut rng = fastrand::Rng::with_seed(42);
//! for _ in 0..500 {
//!     let x = [rng.f64() * 2.0 - 1.0, rng.f64(), rng.f64()];
//!     let y = if x[0] < 0.0 { 3.0 } else { -3.0 };
//!     tree.add_sample(&x, y).unwrap();
//! }
//!
//! assert_eq!(tree.split_condition(NodeId::ROOT).map(|(f, _)| f), Some(0));
//! println!("{tree}");
//! ```
//!
//! # Core Concepts
//!
//! | Type | Role |
//! |------|------|
//! | [`HoeffdingTree`] | The growing tree: `add_sample`, `predict`, `n_leaves`, `depth`. |
//! | [`TreeConfig`] | Chunk size, δ, τ, split criterion and leaf model. |
//! | [`SplitCriterion`](criterion::SplitCriterion) | How candidate splits are scored (std-dev reduction, Mauve family). |
//! | [`LeafModel`](model::LeafModel) | What each leaf predicts with (mean, simple or multivariate regression). |
//! | [`TreeModel`] | Frozen, serialisable readout of a tree. |
//! | [`IncrementalTreeLearner`](learner::IncrementalTreeLearner) | Start / iterate / stop driver adapter. |
//!
//! # Feature Flags
//!
//! | Flag | What it enables | Default |
//! |------|----------------|---------|
//! | `serde` | `Serialize`/`Deserialize` on public types, [`TreeModel::save`]/[`TreeModel::load`] | off |
//! | `tracing` | Structured log events via [`tracing`](https://docs.rs/tracing) on split decisions and solver runs | off |

/// Emit a `tracing::info!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_info {
    ($($arg:tt)*) => { tracing::info!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_info {
    ($($arg:tt)*) => {};
}

/// Emit a `tracing::debug!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($($arg:tt)*) => { tracing::debug!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($($arg:tt)*) => {};
}

pub mod criterion;
mod error;
pub mod learner;
pub mod model;
pub mod problem;
mod snapshot;
pub mod stats;
mod tree;

pub use error::{Error, Result};
pub use snapshot::{ModelNode, TREE_MODEL_VERSION, TreeModel};
pub use tree::{HoeffdingTree, HoeffdingTreeBuilder, NodeId, SampleOutcome, TreeConfig};

/// Convenient wildcard import for the most common types.
///
/// ```
/// use hoeffding::prelude::*;
/// ```
pub mod prelude {
    pub use crate::criterion::{CandidateSplit, HoeffdingBound, SplitCriterion, SplitEvaluation};
    pub use crate::error::{Error, Result};
    pub use crate::learner::{IncrementalTreeLearner, Solver};
    pub use crate::model::{FittedModel, LeafModel};
    pub use crate::problem::{Dataset, Regressor, SupervisedProblem, root_mean_squared_error};
    pub use crate::snapshot::TreeModel;
    pub use crate::stats::{Correlation, LeafStatistics, MeanVariance, RegressionStatistics};
    pub use crate::tree::{HoeffdingTree, HoeffdingTreeBuilder, NodeId, SampleOutcome, TreeConfig};
}

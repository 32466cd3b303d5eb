//! The incremental regression tree.
//!
//! Nodes live in an arena (`Vec`) and refer to their children by
//! [`NodeId`]. Splitting a leaf overwrites its slot with an internal node and
//! appends two fresh leaves, so ids stay valid for the lifetime of the tree:
//! an id that named a leaf keeps naming the same region of feature space,
//! which becomes an internal node once split.
//!
//! # Growth
//!
//! Every example is routed from the root to a leaf and recorded there. When
//! a leaf has received [`chunk_size`](TreeConfig::chunk_size) examples since
//! its last evaluation, the best threshold of every feature is scored and
//! the Hoeffding rule decides whether the best one is committed:
//!
//! - **accepted**: the leaf becomes an internal node with two empty leaves,
//!   which start out predicting with the parent's model. Past examples are
//!   not replayed.
//! - **rejected**: the chunk counter is reset and the leaf keeps its
//!   statistics, so the next evaluation sees more evidence.
//!
//! # Missing values
//!
//! A non-finite feature (or one past the end of a short vector at
//! prediction time) is missing. Routing sends it to the branch that held
//! more examples when the split was made; leaf models impute it.

mod builder;
mod config;
mod node;

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use builder::HoeffdingTreeBuilder;
pub use config::TreeConfig;
pub(crate) use node::Node;
use node::{Leaf, SplitNode};

use crate::criterion::{CandidateSplit, HoeffdingBound, SplitEvaluation};
use crate::error::{Error, Result};
use crate::model::FittedModel;
use crate::stats::LeafStatistics;

/// Index of a node in a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeId(usize);

impl NodeId {
    /// The root of every tree.
    pub const ROOT: Self = Self(0);

    /// Position in the node arena.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What happened to one training example.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleOutcome {
    /// Leaf the example was recorded in.
    pub leaf: NodeId,
    /// Split evaluation triggered by the example, if it completed a chunk.
    pub evaluation: Option<SplitEvaluation>,
}

impl SampleOutcome {
    /// Whether the example caused its leaf to split.
    #[must_use]
    pub fn split(&self) -> bool {
        self.evaluation.as_ref().is_some_and(|e| e.accepted)
    }
}

/// An incrementally grown Hoeffding regression tree.
///
/// # Examples
///
/// ```
/// use hoeffding::HoeffdingTree;
///
/// let mut tree = HoeffdingTree::builder().chunk_size(20).build().unwrap();
/// let mut rng = fastrand::Rng::with_seed(1);
/// for _ in 0..400 {
///     let x = rng.f64() * 2.0 - 1.0;
///     let y = if x < 0.0 { 1.0 } else { -1.0 };
///     tree.add_sample(&[x], y).unwrap();
/// }
/// assert!(tree.n_leaves() >= 2);
/// assert!((tree.predict(&[-0.5]) - 1.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct HoeffdingTree {
    config: TreeConfig,
    bound: HoeffdingBound,
    n_features: Option<usize>,
    nodes: Vec<Node>,
    examples_seen: u64,
}

impl HoeffdingTree {
    /// Create a builder with default parameters.
    #[must_use]
    pub fn builder() -> HoeffdingTreeBuilder {
        HoeffdingTreeBuilder::new()
    }

    /// Create a single-leaf tree.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` is invalid.
    pub fn new(config: TreeConfig) -> Result<Self> {
        config.validate()?;
        let n_features = config.n_features;
        let root = Leaf::new(&config, n_features.unwrap_or(0), 0, None);
        Ok(Self {
            bound: config.bound(),
            config,
            n_features,
            nodes: vec![Node::Leaf(Box::new(root))],
            examples_seen: 0,
        })
    }

    /// Growth parameters.
    #[must_use]
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Feature vector length, once known.
    #[must_use]
    pub fn n_features(&self) -> Option<usize> {
        self.n_features
    }

    /// Total number of training examples accepted.
    #[must_use]
    pub fn examples_seen(&self) -> u64 {
        self.examples_seen
    }

    /// Record one training example and grow the tree if its leaf is due.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NonFiniteTarget`] for a NaN or infinite target,
    /// [`Error::DimensionMismatch`] when `features` does not have the
    /// tree's length, and [`Error::ZeroFeatures`] for an empty first
    /// vector. A rejected example leaves the tree untouched.
    pub fn add_sample(&mut self, features: &[f64], target: f64) -> Result<SampleOutcome> {
        if !target.is_finite() {
            return Err(Error::NonFiniteTarget(target));
        }
        self.ensure_dimension(features.len())?;

        let id = self.leaf_for(features);
        let chunk_size = self.config.chunk_size;
        let max_depth = self.config.max_depth;
        let leaf = self.leaf_mut(id)?;
        leaf.push(features, target);
        let evaluable = max_depth.is_none_or(|max| leaf.depth < max);
        if evaluable {
            leaf.since_evaluation += 1;
        }
        let due = evaluable && leaf.since_evaluation >= chunk_size;
        if due {
            leaf.since_evaluation = 0;
        }
        self.examples_seen += 1;

        let evaluation = if due { Some(self.evaluate(id)?) } else { None };
        if let Some(eval) = &evaluation
            && eval.accepted
        {
            self.split(eval)?;
        }
        Ok(SampleOutcome {
            leaf: id,
            evaluation,
        })
    }

    fn ensure_dimension(&mut self, len: usize) -> Result<()> {
        match self.n_features {
            Some(expected) if expected != len => Err(Error::DimensionMismatch {
                expected,
                got: len,
            }),
            Some(_) => Ok(()),
            None => {
                self.config.validate_features(len)?;
                let root = Leaf::new(&self.config, len, 0, None);
                self.nodes = vec![Node::Leaf(Box::new(root))];
                self.n_features = Some(len);
                Ok(())
            }
        }
    }

    fn leaf_mut(&mut self, id: NodeId) -> Result<&mut Leaf> {
        match self.nodes.get_mut(id.0) {
            Some(Node::Leaf(leaf)) => Ok(leaf),
            _ => Err(Error::Internal("routing did not end at a leaf")),
        }
    }

    fn leaf(&self, id: NodeId) -> Option<&Leaf> {
        match self.nodes.get(id.0) {
            Some(Node::Leaf(leaf)) => Some(leaf),
            _ => None,
        }
    }

    /// Score every feature's best threshold at `id` and apply the decision rule.
    fn evaluate(&self, id: NodeId) -> Result<SplitEvaluation> {
        let leaf = self
            .leaf(id)
            .ok_or(Error::Internal("evaluated node is not a leaf"))?;
        let n = leaf.examples_seen();
        let epsilon = self.bound.epsilon(n);
        let criterion = self.config.criterion;

        let mut candidates: Vec<CandidateSplit> = leaf
            .observers
            .iter()
            .filter_map(|obs| obs.best_split(self.config.min_branch_fraction))
            .collect();
        // stable: ties keep the lower feature index first
        candidates.sort_by(|a, b| b.quality.total_cmp(&a.quality));
        let best = candidates.first().copied();
        let second_best_quality = candidates.get(1).map_or(0.0, |c| c.quality);

        let explained = criterion.is_mauve()
            && self
                .config
                .max_coefficient_of_determination
                .is_some_and(|max| leaf.stats.regression().coefficient_of_determination() >= max);

        let accepted = !explained
            && best.is_some_and(|b| self.bound.accepts(b.quality, second_best_quality, n));

        if !accepted {
            trace_debug!(
                leaf = id.0,
                examples_seen = n,
                best_quality = best.map_or(0.0, |b| b.quality),
                second_best_quality,
                epsilon,
                explained,
                "split rejected"
            );
        }

        Ok(SplitEvaluation {
            leaf: id,
            examples_seen: n,
            best,
            second_best_quality,
            epsilon,
            accepted,
        })
    }

    /// Replace the evaluated leaf by an internal node with two empty children.
    fn split(&mut self, evaluation: &SplitEvaluation) -> Result<()> {
        let id = evaluation.leaf;
        let best = evaluation
            .best
            .ok_or(Error::Internal("accepted evaluation without a candidate"))?;
        let n_features = self
            .n_features
            .ok_or(Error::Internal("split before the dimension is known"))?;
        let parent = self
            .leaf(id)
            .ok_or(Error::Internal("split node is not a leaf"))?;
        let inherited = parent.model(&self.config.leaf_model);
        let depth = parent.depth + 1;

        let left = NodeId(self.nodes.len());
        let right = NodeId(left.0 + 1);
        self.nodes.push(Node::Leaf(Box::new(Leaf::new(
            &self.config,
            n_features,
            depth,
            inherited.clone(),
        ))));
        self.nodes.push(Node::Leaf(Box::new(Leaf::new(
            &self.config,
            n_features,
            depth,
            inherited,
        ))));
        self.nodes[id.0] = Node::Split(SplitNode {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
            missing_goes_left: best.left_count >= best.right_count,
        });

        trace_info!(
            node = id.0,
            feature = best.feature,
            threshold = best.threshold,
            quality = best.quality,
            epsilon = evaluation.epsilon,
            examples_seen = evaluation.examples_seen,
            depth,
            leaves = self.n_leaves(),
            "split accepted"
        );
        Ok(())
    }

    /// Leaf reached by `features`.
    #[must_use]
    pub fn leaf_for(&self, features: &[f64]) -> NodeId {
        let mut id = NodeId::ROOT;
        while let Some(Node::Split(split)) = self.nodes.get(id.0) {
            id = split.route(features);
        }
        id
    }

    /// Nodes visited by `features`, from the root to its leaf.
    #[must_use]
    pub fn path(&self, features: &[f64]) -> Vec<NodeId> {
        let mut id = NodeId::ROOT;
        let mut path = vec![id];
        while let Some(Node::Split(split)) = self.nodes.get(id.0) {
            id = split.route(features);
            path.push(id);
        }
        path
    }

    /// Predict the target of `features`.
    ///
    /// Returns `NaN` if the tree has not seen any example yet.
    #[must_use]
    pub fn predict(&self, features: &[f64]) -> f64 {
        self.leaf(self.leaf_for(features))
            .and_then(|leaf| leaf.model(&self.config.leaf_model))
            .map_or(f64::NAN, |model| model.predict(features))
    }

    /// Number of leaves.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf(_)))
            .count()
    }

    /// Number of internal nodes, i.e. accepted splits.
    #[must_use]
    pub fn n_splits(&self) -> usize {
        self.nodes.len() - self.n_leaves()
    }

    /// Number of nodes.
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges on the longest root-to-leaf path.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.nodes
            .iter()
            .filter_map(|n| match n {
                Node::Leaf(leaf) => Some(leaf.depth),
                Node::Split(_) => None,
            })
            .max()
            .unwrap_or(0)
    }

    /// Ids of all current leaves, in arena order.
    pub fn leaves(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| matches!(n, Node::Leaf(_)))
            .map(|(i, _)| NodeId(i))
    }

    /// Whether `id` is a current leaf.
    #[must_use]
    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.leaf(id).is_some()
    }

    /// Statistics of leaf `id`.
    #[must_use]
    pub fn leaf_statistics(&self, id: NodeId) -> Option<&LeafStatistics> {
        self.leaf(id).map(|leaf| &leaf.stats)
    }

    /// Predictor currently used by leaf `id`.
    #[must_use]
    pub fn leaf_model(&self, id: NodeId) -> Option<FittedModel> {
        self.leaf(id)
            .and_then(|leaf| leaf.model(&self.config.leaf_model))
    }

    /// Depth of leaf `id`.
    #[must_use]
    pub fn leaf_depth(&self, id: NodeId) -> Option<usize> {
        self.leaf(id).map(|leaf| leaf.depth)
    }

    /// Number of distinct values of `feature` seen at leaf `id`, i.e. one
    /// more than its number of candidate thresholds. Once it reaches
    /// [`TreeConfig::max_bins`] it counts merged value ranges instead and
    /// stays at the cap.
    #[must_use]
    pub fn distinct_values(&self, id: NodeId, feature: usize) -> Option<usize> {
        self.leaf(id)
            .and_then(|leaf| leaf.observers.get(feature))
            .map(crate::criterion::FeatureObserver::n_bins)
    }

    /// Split condition of internal node `id` as `(feature, threshold)`.
    #[must_use]
    pub fn split_condition(&self, id: NodeId) -> Option<(usize, f64)> {
        match self.nodes.get(id.0) {
            Some(Node::Split(split)) => Some((split.feature, split.threshold)),
            _ => None,
        }
    }

    /// Children of internal node `id` as `(left, right)`.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Option<(NodeId, NodeId)> {
        match self.nodes.get(id.0) {
            Some(Node::Split(split)) => Some((split.left, split.right)),
            _ => None,
        }
    }

    /// Every split condition as `(feature, threshold)`, in pre-order.
    #[must_use]
    pub fn thresholds(&self) -> Vec<(usize, f64)> {
        let mut out = Vec::with_capacity(self.n_splits());
        let mut stack = vec![NodeId::ROOT];
        while let Some(id) = stack.pop() {
            if let Some(Node::Split(split)) = self.nodes.get(id.0) {
                out.push((split.feature, split.threshold));
                stack.push(split.right);
                stack.push(split.left);
            }
        }
        out
    }

    /// Freeze the current structure and leaf models.
    #[must_use]
    pub fn to_model(&self) -> crate::TreeModel {
        crate::TreeModel::from_tree(self)
    }

    pub(crate) fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    fn write_node(&self, f: &mut fmt::Formatter<'_>, id: NodeId, indent: usize) -> fmt::Result {
        match self.nodes.get(id.0) {
            Some(Node::Split(split)) => {
                writeln!(
                    f,
                    "{:indent$}x[{}] < {:.6}",
                    "",
                    split.feature,
                    split.threshold
                )?;
                self.write_node(f, split.left, indent + 4)?;
                writeln!(f, "{:indent$}x[{}] >= {:.6}", "", split.feature, split.threshold)?;
                self.write_node(f, split.right, indent + 4)
            }
            Some(Node::Leaf(leaf)) => {
                write!(f, "{:indent$}leaf {id} n={}: ", "", leaf.examples_seen())?;
                match leaf.model(&self.config.leaf_model) {
                    Some(model) => writeln!(f, "{model}"),
                    None => writeln!(f, "empty"),
                }
            }
            None => Ok(()),
        }
    }
}

/// Indented dump: one line per branch condition, one per leaf.
impl fmt::Display for HoeffdingTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_node(f, NodeId::ROOT, 0)
    }
}

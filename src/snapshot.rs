use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::model::FittedModel;
use crate::stats::observed;
use crate::tree::{HoeffdingTree, Node};

/// Schema version of [`TreeModel`].
pub const TREE_MODEL_VERSION: u32 = 1;

/// One node of a frozen tree. Children are indices into
/// [`TreeModel::nodes`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ModelNode {
    /// Internal node: `x[feature] < threshold` goes to `left`.
    Split {
        /// Tested feature.
        feature: usize,
        /// Split threshold.
        threshold: f64,
        /// Child for values below the threshold.
        left: usize,
        /// Child for values at or above the threshold.
        right: usize,
        /// Child taken by a missing value.
        missing_goes_left: bool,
    },
    /// Leaf with its frozen predictor.
    Leaf {
        /// Predictor, `None` for a tree that never saw an example.
        model: Option<FittedModel>,
        /// Examples the leaf had recorded.
        examples_seen: u64,
    },
}

/// An immutable readout of a [`HoeffdingTree`].
///
/// Built with [`HoeffdingTree::to_model`]. It keeps the split structure and
/// the leaf models fitted at that moment, but none of the statistics, so it
/// is cheap to clone, predict with and persist.
///
/// # Schema versioning
///
/// Saved files carry a `version` field; the current version is `1`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TreeModel {
    /// Schema version for forward compatibility.
    pub version: u32,
    /// Feature vector length the tree was trained on.
    pub n_features: Option<usize>,
    /// Arena of nodes; the root is at index 0.
    pub nodes: Vec<ModelNode>,
}

impl TreeModel {
    pub(crate) fn from_tree(tree: &HoeffdingTree) -> Self {
        let leaf_model = tree.config().leaf_model;
        let nodes = tree
            .nodes()
            .iter()
            .map(|node| match node {
                Node::Split(split) => ModelNode::Split {
                    feature: split.feature,
                    threshold: split.threshold,
                    left: split.left.index(),
                    right: split.right.index(),
                    missing_goes_left: split.missing_goes_left,
                },
                Node::Leaf(leaf) => ModelNode::Leaf {
                    model: leaf.model(&leaf_model),
                    examples_seen: leaf.examples_seen(),
                },
            })
            .collect();
        Self {
            version: TREE_MODEL_VERSION,
            n_features: tree.n_features(),
            nodes,
        }
    }

    fn leaf_index(&self, features: &[f64]) -> usize {
        let mut index = 0;
        while let Some(ModelNode::Split {
            feature,
            threshold,
            left,
            right,
            missing_goes_left,
        }) = self.nodes.get(index)
        {
            let goes_left = features
                .get(*feature)
                .copied()
                .and_then(observed)
                .map_or(*missing_goes_left, |v| v < *threshold);
            index = if goes_left { *left } else { *right };
        }
        index
    }

    /// Predict the target of `features`; `NaN` for an untrained tree.
    #[must_use]
    pub fn predict(&self, features: &[f64]) -> f64 {
        match self.nodes.get(self.leaf_index(features)) {
            Some(ModelNode::Leaf {
                model: Some(model), ..
            }) => model.predict(features),
            _ => f64::NAN,
        }
    }

    /// Number of leaves.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, ModelNode::Leaf { .. }))
            .count()
    }

    /// Number of edges on the longest root-to-leaf path.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((index, depth)) = stack.pop() {
            match self.nodes.get(index) {
                Some(ModelNode::Split { left, right, .. }) => {
                    stack.push((*left, depth + 1));
                    stack.push((*right, depth + 1));
                }
                Some(ModelNode::Leaf { .. }) => deepest = deepest.max(depth),
                None => {}
            }
        }
        deepest
    }

    /// Save the model to a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created or written.
    #[cfg(feature = "serde")]
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> std::io::Result<()> {
        let path = path.as_ref();
        // Write next to the target, then rename over it.
        let parent = path.parent().unwrap_or(std::path::Path::new("."));
        let tmp_path = parent.join(format!(
            ".{}.tmp",
            path.file_name().unwrap_or_default().to_string_lossy()
        ));
        let file = std::fs::File::create(&tmp_path)?;
        serde_json::to_writer_pretty(file, self).map_err(std::io::Error::other)?;
        std::fs::rename(&tmp_path, path)
    }

    /// Load a model from a JSON file written by [`save`](Self::save).
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read, cannot be parsed or
    /// has an unknown schema version.
    #[cfg(feature = "serde")]
    pub fn load(path: impl AsRef<std::path::Path>) -> std::io::Result<Self> {
        let file = std::fs::File::open(path)?;
        let model: Self = serde_json::from_reader(std::io::BufReader::new(file))
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        if model.version != TREE_MODEL_VERSION {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("unsupported tree model version {}", model.version),
            ));
        }
        Ok(model)
    }

    fn write_node(&self, f: &mut fmt::Formatter<'_>, index: usize, indent: usize) -> fmt::Result {
        match self.nodes.get(index) {
            Some(ModelNode::Split {
                feature,
                threshold,
                left,
                right,
                ..
            }) => {
                writeln!(f, "{:indent$}x[{feature}] < {threshold:.6}", "")?;
                self.write_node(f, *left, indent + 4)?;
                writeln!(f, "{:indent$}x[{feature}] >= {threshold:.6}", "")?;
                self.write_node(f, *right, indent + 4)
            }
            Some(ModelNode::Leaf {
                model,
                examples_seen,
            }) => match model {
                Some(model) => writeln!(f, "{:indent$}leaf #{index} n={examples_seen}: {model}", ""),
                None => writeln!(f, "{:indent$}leaf #{index} n={examples_seen}: empty", ""),
            },
            None => Ok(()),
        }
    }
}

impl fmt::Display for TreeModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_node(f, 0, 0)
    }
}

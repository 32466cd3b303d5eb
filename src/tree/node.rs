use crate::criterion::FeatureObserver;
use crate::model::{FittedModel, LeafModel};
use crate::stats::{LeafStatistics, observed};

use super::{NodeId, TreeConfig};

#[derive(Debug, Clone)]
pub(crate) enum Node {
    Leaf(Box<Leaf>),
    Split(SplitNode),
}

/// An immutable split condition with its two children.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SplitNode {
    pub(crate) feature: usize,
    pub(crate) threshold: f64,
    pub(crate) left: NodeId,
    pub(crate) right: NodeId,
    /// Branch taken by a missing value: the one that held more observed
    /// examples when the split was made.
    pub(crate) missing_goes_left: bool,
}

impl SplitNode {
    pub(crate) fn route(&self, features: &[f64]) -> NodeId {
        let goes_left = match features.get(self.feature).copied().and_then(observed) {
            Some(value) => value < self.threshold,
            None => self.missing_goes_left,
        };
        if goes_left { self.left } else { self.right }
    }
}

/// An unsplit region of feature space.
#[derive(Debug, Clone)]
pub(crate) struct Leaf {
    pub(crate) stats: LeafStatistics,
    pub(crate) observers: Vec<FeatureObserver>,
    pub(crate) since_evaluation: usize,
    pub(crate) depth: usize,
    /// Parent's model, used until the leaf has seen an example.
    pub(crate) inherited: Option<FittedModel>,
}

impl Leaf {
    pub(crate) fn new(
        config: &TreeConfig,
        n_features: usize,
        depth: usize,
        inherited: Option<FittedModel>,
    ) -> Self {
        Self {
            stats: LeafStatistics::new(n_features),
            observers: (0..n_features)
                .map(|f| {
                    FeatureObserver::new(f, config.criterion, n_features, config.max_bins)
                })
                .collect(),
            since_evaluation: 0,
            depth,
            inherited,
        }
    }

    pub(crate) fn examples_seen(&self) -> u64 {
        self.stats.count()
    }

    pub(crate) fn push(&mut self, features: &[f64], target: f64) {
        self.stats.push(features, target);
        let complete = features.iter().all(|v| v.is_finite());
        let row = complete.then_some(features);
        for (observer, value) in self.observers.iter_mut().zip(features) {
            if let Some(value) = observed(*value) {
                observer.push(value, target, row);
            }
        }
    }

    /// Current predictor: the fitted leaf model, or the inherited one while
    /// the leaf is still empty.
    pub(crate) fn model(&self, kind: &LeafModel) -> Option<FittedModel> {
        kind.fit(&self.stats).or_else(|| self.inherited.clone())
    }
}

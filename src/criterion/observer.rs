use std::collections::BTreeMap;

use super::{CandidateSplit, PartitionStats, SplitCriterion};

/// Totally ordered `f64` key with `-0.0` folded into `0.0`.
#[derive(Debug, Clone, Copy)]
struct Value(f64);

impl Value {
    fn new(v: f64) -> Self {
        Self(if v == 0.0 { 0.0 } else { v })
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0).is_eq()
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Examples whose values fall in `[key, max]`.
#[derive(Debug, Clone)]
struct Bin {
    max: f64,
    stats: PartitionStats,
}

/// Per-leaf, per-feature summary of the observed values.
///
/// Each distinct value starts in its own bin. Once there are more than
/// `max_bins` bins, the adjacent pair holding the fewest examples is merged
/// into one bin covering both value ranges, so the summary stays
/// equal-frequency-like and its size bounded. Candidate thresholds lie
/// between consecutive bins, and the two sides of a candidate are built by
/// merging the bins below and above it, so no raw example is ever needed.
#[derive(Debug, Clone)]
pub(crate) struct FeatureObserver {
    feature: usize,
    criterion: SplitCriterion,
    n_features: usize,
    max_bins: usize,
    bins: BTreeMap<Value, Bin>,
}

impl FeatureObserver {
    pub(crate) fn new(
        feature: usize,
        criterion: SplitCriterion,
        n_features: usize,
        max_bins: usize,
    ) -> Self {
        Self {
            feature,
            criterion,
            n_features,
            max_bins,
            bins: BTreeMap::new(),
        }
    }

    fn empty_stats(&self) -> PartitionStats {
        PartitionStats::new(self.criterion, self.n_features)
    }

    /// Record an example whose value for this feature is `value` (finite).
    pub(crate) fn push(&mut self, value: f64, target: f64, row: Option<&[f64]>) {
        let key = Value::new(value);
        let value = key.0;
        let holder = self
            .bins
            .range_mut(..=key)
            .next_back()
            .filter(|(_, bin)| value <= bin.max);
        if let Some((_, bin)) = holder {
            bin.stats.push(value, target, row);
            return;
        }
        let mut stats = self.empty_stats();
        stats.push(value, target, row);
        self.bins.insert(key, Bin { max: value, stats });
        self.compact();
    }

    /// Merge the lightest adjacent pair until at most `max_bins` remain.
    fn compact(&mut self) {
        while self.bins.len() > self.max_bins {
            let lightest = self
                .bins
                .iter()
                .zip(self.bins.iter().skip(1))
                .min_by_key(|((_, a), (_, b))| a.stats.count() + b.stats.count())
                .map(|((lo, _), (hi, _))| (*lo, *hi));
            let Some((lo, hi)) = lightest else { return };
            let Some(upper) = self.bins.remove(&hi) else { return };
            if let Some(lower) = self.bins.get_mut(&lo) {
                lower.max = upper.max;
                lower.stats.merge(&upper.stats);
            }
        }
    }

    /// Number of bins: the distinct values seen, until the cap merges them.
    pub(crate) fn n_bins(&self) -> usize {
        self.bins.len()
    }

    /// Best threshold for this feature.
    ///
    /// A candidate is eligible only if each side holds at least
    /// `min_branch_fraction` of the observed examples (and at least one).
    /// Ties keep the lowest threshold. Returns `None` with fewer than two
    /// bins or no eligible candidate.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub(crate) fn best_split(&self, min_branch_fraction: f64) -> Option<CandidateSplit> {
        if self.bins.len() < 2 {
            return None;
        }
        let criterion = self.criterion;

        // (lowest value, highest value, stats) per bin, in order
        let bins: Vec<(f64, f64, &PartitionStats)> = self
            .bins
            .iter()
            .map(|(k, bin)| (k.0, bin.max, &bin.stats))
            .collect();

        // suffixes[i] summarises bins[i..]
        let mut suffixes: Vec<PartitionStats> = Vec::with_capacity(bins.len());
        let mut acc = self.empty_stats();
        for (_, _, stats) in bins.iter().rev() {
            acc.merge(stats);
            suffixes.push(acc.clone());
        }
        suffixes.reverse();

        let total = suffixes[0].count();
        let min_side = ((min_branch_fraction * total as f64).ceil() as u64).max(1);
        let (parent, _) = criterion.dispersion(&suffixes[0]);

        let mut left = self.empty_stats();
        let mut best: Option<CandidateSplit> = None;
        for (i, window) in bins.windows(2).enumerate() {
            let (_, lo, stats) = window[0];
            let (hi, _, _) = window[1];
            left.merge(stats);
            let right = &suffixes[i + 1];
            if left.count() < min_side || right.count() < min_side {
                continue;
            }
            let quality = criterion.quality_given_parent(parent, &left, right);
            if best.is_none_or(|b| quality > b.quality) {
                let mid = f64::midpoint(lo, hi);
                best = Some(CandidateSplit {
                    feature: self.feature,
                    threshold: if mid > lo { mid } else { hi },
                    quality,
                    left_count: left.count(),
                    right_count: right.count(),
                });
            }
        }
        best
    }
}

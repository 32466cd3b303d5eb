use std::collections::HashMap;

use hoeffding::prelude::*;

use crate::generators;

fn grow(rows: &[Vec<f64>], targets: impl Fn(&[f64]) -> f64) -> (HoeffdingTree, Vec<NodeId>) {
    let mut tree = HoeffdingTree::builder()
        .chunk_size(25)
        .delta(0.1)
        .build()
        .unwrap();
    let leaves = rows
        .iter()
        .map(|x| tree.add_sample(x, targets(x)).unwrap().leaf)
        .collect();
    (tree, leaves)
}

#[test]
fn replayed_examples_pass_through_their_recorded_leaf() {
    let mut rng = fastrand::Rng::with_seed(17);
    let rows = generators::uniform_rows(&mut rng, 1500, 2);
    let (tree, leaves) = grow(&rows, generators::kinked);
    assert!(tree.n_splits() >= 2, "tree did not grow:\n{tree}");

    for (x, leaf) in rows.iter().zip(&leaves) {
        let path = tree.path(x);
        assert!(
            path.contains(leaf),
            "{x:?} was recorded in {leaf} but now routes through {path:?}"
        );
        assert_eq!(path.last().copied(), Some(tree.leaf_for(x)));
    }
}

#[test]
fn leaf_counts_match_routed_examples() {
    let mut rng = fastrand::Rng::with_seed(23);
    let rows = generators::uniform_rows(&mut rng, 1200, 3);
    let (tree, leaves) = grow(&rows, generators::step);

    let mut routed: HashMap<NodeId, u64> = HashMap::new();
    for leaf in &leaves {
        *routed.entry(*leaf).or_default() += 1;
    }
    for leaf in tree.leaves() {
        let stats = tree.leaf_statistics(leaf).unwrap();
        assert_eq!(stats.count(), routed.get(&leaf).copied().unwrap_or(0));
    }
}

#[test]
fn prediction_is_side_effect_free() {
    let mut rng = fastrand::Rng::with_seed(29);
    let rows = generators::uniform_rows(&mut rng, 600, 2);
    let (tree, _) = grow(&rows, generators::step);
    let before = tree.to_string();
    for x in &rows {
        let _ = tree.predict(x);
    }
    assert_eq!(tree.to_string(), before);
    assert_eq!(tree.examples_seen(), 600);
}

#[test]
fn malformed_vectors_do_not_break_routing() {
    let mut rng = fastrand::Rng::with_seed(31);
    let rows = generators::uniform_rows(&mut rng, 600, 2);
    let (tree, _) = grow(&rows, generators::step);

    for x in [
        vec![],
        vec![f64::NAN],
        vec![f64::NAN, f64::NAN],
        vec![f64::INFINITY, 0.0],
        vec![0.5, 0.5, 0.5, 0.5],
    ] {
        let leaf = tree.leaf_for(&x);
        assert!(tree.is_leaf(leaf));
        assert!(tree.predict(&x).is_finite(), "no prediction for {x:?}");
    }
}

#[test]
fn threshold_boundary_goes_right() {
    let mut tree = HoeffdingTree::builder()
        .chunk_size(20)
        .min_branch_fraction(0.0)
        .build()
        .unwrap();
    for i in 0..20 {
        let x = f64::from(i);
        tree.add_sample(&[x], if x < 10.0 { 0.0 } else { 5.0 })
            .unwrap();
    }
    let (feature, threshold) = tree.split_condition(NodeId::ROOT).unwrap();
    assert_eq!(feature, 0);
    assert!((threshold - 9.5).abs() < 1e-12);
    let (left, right) = tree.children(NodeId::ROOT).unwrap();
    assert_eq!(tree.leaf_for(&[threshold]), right);
    assert_eq!(tree.leaf_for(&[threshold - 1e-9]), left);
}

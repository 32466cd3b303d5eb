use hoeffding::prelude::*;

use crate::generators;

#[test]
fn every_split_adds_one_leaf_and_two_nodes() {
    let mut rng = fastrand::Rng::with_seed(5);
    let mut tree = HoeffdingTree::builder()
        .chunk_size(20)
        .delta(0.1)
        .build()
        .unwrap();

    let mut splits = 0;
    for x in generators::uniform_rows(&mut rng, 3000, 2) {
        let leaves_before = tree.n_leaves();
        let outcome = tree.add_sample(&x, generators::kinked(&x)).unwrap();
        if outcome.split() {
            splits += 1;
            assert_eq!(tree.n_leaves(), leaves_before + 1);
            assert!(!tree.is_leaf(outcome.leaf));
        } else {
            assert_eq!(tree.n_leaves(), leaves_before);
        }
        assert_eq!(tree.n_leaves(), 1 + splits);
        assert_eq!(tree.n_nodes(), 1 + 2 * splits);
        assert_eq!(tree.n_splits(), splits);
    }
    assert!(splits > 1);
    assert_eq!(tree.thresholds().len(), splits);
}

#[test]
fn evaluations_happen_on_chunk_boundaries() {
    let mut tree = HoeffdingTree::builder()
        .chunk_size(7)
        .criterion(SplitCriterion::Never)
        .build()
        .unwrap();
    for i in 1..=70u32 {
        let x = f64::from(i);
        let outcome = tree.add_sample(&[x], x).unwrap();
        assert_eq!(outcome.evaluation.is_some(), i % 7 == 0, "example {i}");
        if let Some(evaluation) = outcome.evaluation {
            assert_eq!(evaluation.examples_seen, u64::from(i));
            assert!(!evaluation.accepted);
        }
    }
}

#[test]
fn identical_candidates_never_split_without_tie_rule() {
    // Feature 1 duplicates feature 0, so the two best candidates always tie.
    let mut rng = fastrand::Rng::with_seed(41);
    let mut tree = HoeffdingTree::builder()
        .chunk_size(50)
        .tie_threshold(0.0)
        .build()
        .unwrap();
    for _ in 0..5000 {
        let v = rng.f64() * 2.0 - 1.0;
        let outcome = tree.add_sample(&[v, v], generators::step(&[v])).unwrap();
        if let Some(evaluation) = outcome.evaluation {
            assert!(!evaluation.accepted);
            let best = evaluation.best.unwrap();
            assert!(best.quality > 0.0);
            assert!(evaluation.quality_gap().abs() < f64::EPSILON);
        }
    }
    assert_eq!(tree.n_leaves(), 1);
}

#[test]
fn tie_rule_eventually_splits_plateau() {
    let mut rng = fastrand::Rng::with_seed(43);
    let mut tree = HoeffdingTree::builder()
        .chunk_size(50)
        .delta(0.05)
        .tie_threshold(0.05)
        .build()
        .unwrap();
    let mut split_at = None;
    for i in 1..=2000u64 {
        let v = rng.f64() * 2.0 - 1.0;
        let outcome = tree.add_sample(&[v, v], generators::step(&[v])).unwrap();
        if outcome.split() {
            split_at = Some(i);
            let evaluation = outcome.evaluation.unwrap();
            assert!(evaluation.epsilon < 0.05);
            break;
        }
    }
    // ε < 0.05 needs n > ln(20) / (2 · 0.05²) ≈ 599.
    assert_eq!(split_at, Some(600));
}

#[test]
fn fixed_gap_is_rejected_then_accepted() {
    // Targets depend on x0 strongly and on x1 weakly; the quality gap is
    // roughly constant while ε shrinks with every chunk.
    let mut rng = fastrand::Rng::with_seed(47);
    let mut tree = HoeffdingTree::builder()
        .chunk_size(10)
        .delta(0.01)
        .tie_threshold(0.0)
        .quality_range(10.0)
        .build()
        .unwrap();
    let mut evaluations = Vec::new();
    for _ in 0..5000 {
        let x = [rng.f64() * 2.0 - 1.0, rng.f64() * 2.0 - 1.0];
        let y = if x[0] < 0.0 { 1.0 } else { -1.0 } + if x[1] < 0.0 { 0.3 } else { -0.3 };
        let outcome = tree.add_sample(&x, y).unwrap();
        if let Some(evaluation) = outcome.evaluation {
            let accepted = evaluation.accepted;
            evaluations.push(evaluation);
            if accepted {
                break;
            }
        }
    }
    let last = evaluations.last().unwrap();
    assert!(last.accepted, "never split after {} evaluations", evaluations.len());
    assert_eq!(last.best.unwrap().feature, 0);
    assert!(evaluations.len() > 1, "split on the first chunk");
    assert!(evaluations[..evaluations.len() - 1].iter().all(|e| !e.accepted));
    assert!(
        evaluations
            .windows(2)
            .all(|w| w[1].epsilon < w[0].epsilon)
    );
}

#[test]
fn rejected_evaluation_keeps_statistics() {
    let mut tree = HoeffdingTree::builder()
        .chunk_size(10)
        .criterion(SplitCriterion::Never)
        .build()
        .unwrap();
    for i in 0..35 {
        tree.add_sample(&[f64::from(i)], 1.0).unwrap();
    }
    let stats = tree.leaf_statistics(NodeId::ROOT).unwrap();
    assert_eq!(stats.count(), 35);
    assert_eq!(tree.distinct_values(NodeId::ROOT, 0), Some(35));
}

#[test]
fn depth_cap_bounds_the_tree() {
    let mut rng = fastrand::Rng::with_seed(53);
    let mut tree = HoeffdingTree::builder()
        .chunk_size(20)
        .delta(0.1)
        .max_depth(2)
        .build()
        .unwrap();
    for x in generators::uniform_rows(&mut rng, 4000, 2) {
        tree.add_sample(&x, generators::kinked(&x)).unwrap();
    }
    assert!(tree.depth() <= 2);
    assert!(tree.n_leaves() <= 4);
    assert!(tree.leaves().all(|leaf| tree.leaf_depth(leaf).unwrap() <= 2));
}

#[test]
fn mauve_stop_condition_keeps_linear_leaf_whole() {
    let mut rng = fastrand::Rng::with_seed(59);
    let mut tree = HoeffdingTree::builder()
        .chunk_size(25)
        .criterion(SplitCriterion::TotalMauve)
        .leaf_model(LeafModel::MultivariateLinear)
        .max_coefficient_of_determination(0.99)
        .tie_threshold(0.2)
        .build()
        .unwrap();
    for x in generators::uniform_rows(&mut rng, 2000, 2) {
        tree.add_sample(&x, generators::plane(&x)).unwrap();
    }
    assert_eq!(tree.n_leaves(), 1);
    assert!((tree.predict(&[0.2, -0.4]) - generators::plane(&[0.2, -0.4])).abs() < 1e-6);
}

#[test]
fn std_dev_reduction_splits_linear_target_mauve_does_not() {
    let mut rng = fastrand::Rng::with_seed(61);
    let rows = generators::uniform_rows(&mut rng, 1000, 1);
    let grow = |criterion| {
        let mut tree = HoeffdingTree::builder()
            .chunk_size(50)
            .delta(0.05)
            .tie_threshold(0.0)
            .criterion(criterion)
            .build()
            .unwrap();
        for x in &rows {
            tree.add_sample(x, 4.0 * x[0]).unwrap();
        }
        tree
    };
    assert!(grow(SplitCriterion::StdDevReduction).n_leaves() > 1);
    assert_eq!(grow(SplitCriterion::Mauve).n_leaves(), 1);
}

#[test]
fn observers_stay_bounded_on_continuous_input() {
    let mut rng = fastrand::Rng::with_seed(67);
    let mut tree = HoeffdingTree::builder()
        .criterion(SplitCriterion::TotalMauve)
        .max_coefficient_of_determination(0.99)
        .max_bins(16)
        .build()
        .unwrap();
    let linear = |x: &[f64]| x.iter().zip(1_u32..).map(|(v, k)| f64::from(k) * v).sum::<f64>();
    let mut evaluations = 0;
    for x in generators::uniform_rows(&mut rng, 5000, 8) {
        if tree.add_sample(&x, linear(&x)).unwrap().evaluation.is_some() {
            evaluations += 1;
        }
    }
    assert_eq!(tree.n_leaves(), 1);
    assert_eq!(evaluations, 100);
    assert_eq!(tree.leaf_statistics(NodeId::ROOT).unwrap().count(), 5000);
    for feature in 0..8 {
        assert_eq!(tree.distinct_values(NodeId::ROOT, feature), Some(16));
    }
}

#[test]
fn default_bin_cap_still_finds_the_step() {
    let mut rng = fastrand::Rng::with_seed(71);
    let mut tree = HoeffdingTree::builder()
        .chunk_size(500)
        .delta(0.05)
        .build()
        .unwrap();
    for x in generators::uniform_rows(&mut rng, 1000, 1) {
        tree.add_sample(&x, generators::step(&x)).unwrap();
    }
    let (feature, threshold) = tree.split_condition(NodeId::ROOT).expect("no split");
    assert_eq!(feature, 0);
    // 500 examples in 64 bins: the cut lands on a bin edge next to 0
    assert!(threshold.abs() < 0.1, "threshold {threshold}");
    assert!(tree.leaves().all(|leaf| tree.distinct_values(leaf, 0).unwrap() <= 64));
}

#[test]
fn bin_cap_below_two_is_rejected() {
    assert!(matches!(
        HoeffdingTree::builder().max_bins(1).build(),
        Err(Error::InvalidMaxBins(1))
    ));
}

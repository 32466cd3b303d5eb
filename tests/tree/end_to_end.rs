use hoeffding::prelude::*;

use crate::generators;

/// `x0` in `[-1, 1]` decides the target; two uniform `[0, 1]` features are noise.
fn step_rows(rng: &mut fastrand::Rng, n: usize) -> Vec<Vec<f64>> {
    (0..n)
        .map(|_| vec![rng.f64() * 2.0 - 1.0, rng.f64(), rng.f64()])
        .collect()
}

fn step_dataset(rng: &mut fastrand::Rng, n: usize) -> Dataset {
    let rows = step_rows(rng, n);
    let targets = rows.iter().map(|x| generators::step(x)).collect();
    Dataset::new(rows, targets).unwrap()
}

#[test]
fn step_target_is_learned_from_500_examples() {
    let mut rng = fastrand::Rng::with_seed(2024);
    let validation = step_dataset(&mut rng, 1000);
    let mut tree = HoeffdingTree::builder()
        .chunk_size(50)
        .delta(0.05)
        .tie_threshold(0.05)
        .criterion(SplitCriterion::StdDevReduction)
        .leaf_model(LeafModel::Constant)
        .build()
        .unwrap();

    let mut before_split = None;
    let mut first_split = None;
    for (i, x) in step_rows(&mut rng, 500).into_iter().enumerate() {
        if first_split.is_none() {
            before_split = Some(tree.to_model());
        }
        let outcome = tree.add_sample(&x, generators::step(&x)).unwrap();
        if outcome.split() && first_split.is_none() {
            first_split = Some(i + 1);
        }
    }

    let first_split = first_split.expect("root never split");
    assert!(first_split <= 150, "first split after {first_split} examples");

    let (feature, threshold) = tree.split_condition(NodeId::ROOT).unwrap();
    assert_eq!(feature, 0, "split on a noise feature:\n{tree}");
    assert!(threshold.abs() < 0.2, "threshold {threshold} far from the step");

    // Before the split the tree predicts one mean for both halves.
    let before = root_mean_squared_error(&before_split.unwrap(), &validation);
    assert!(before > 2.9, "rmse before split {before}");
    let after = root_mean_squared_error(&tree, &validation);
    assert!(after < 2.0, "rmse after split {after}");
    assert!(after < before);

    assert!((tree.predict(&[-0.5, 0.5, 0.5]) - 3.0).abs() < 1.0);
    assert!((tree.predict(&[0.5, 0.5, 0.5]) + 3.0).abs() < 1.0);
    assert_eq!(tree.examples_seen(), 500);
}

#[test]
fn frozen_model_matches_tree_after_training() {
    let mut rng = fastrand::Rng::with_seed(7);
    let mut tree = HoeffdingTree::builder()
        .chunk_size(40)
        .delta(0.05)
        .leaf_model(LeafModel::MultivariateLinear)
        .criterion(SplitCriterion::ExtendedMauve)
        .build()
        .unwrap();
    let rows = generators::uniform_rows(&mut rng, 1500, 2);
    for x in &rows {
        tree.add_sample(x, generators::kinked(x)).unwrap();
    }
    let model = tree.to_model();
    assert_eq!(model.n_leaves(), tree.n_leaves());
    assert_eq!(model.depth(), tree.depth());
    assert_eq!(model.to_string(), tree.to_string());
    for x in generators::uniform_rows(&mut rng, 200, 2) {
        assert_eq!(model.predict(&x).to_bits(), tree.predict(&x).to_bits());
    }
}

#[test]
fn learner_drives_tree_over_problem() {
    let problem = SupervisedProblem::from_function(
        &[(-1.0, 1.0), (0.0, 1.0), (0.0, 1.0)],
        500,
        500,
        11,
        generators::step,
    )
    .unwrap();
    let config = TreeConfig {
        chunk_size: 50,
        delta: 0.05,
        ..TreeConfig::default()
    };
    let mut learner = IncrementalTreeLearner::new(config).unwrap();
    let model = learner.solve(&problem).unwrap();
    let rmse = learner.validation_rmse().unwrap();
    assert_eq!(problem.validation_rmse(&model), Some(rmse));
    assert!(rmse < 2.0, "validation rmse {rmse}");
    assert!(model.n_leaves() >= 2);
    assert!(learner.evaluations().iter().any(|e| e.accepted));
}

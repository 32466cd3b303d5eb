use hoeffding::prelude::*;

use crate::generators;

fn v_shape(x: &[f64]) -> f64 {
    2.0 * x[0].abs()
}

fn grow_v(leaf_model: LeafModel, seed: u64) -> (HoeffdingTree, Dataset) {
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut tree = HoeffdingTree::builder()
        .chunk_size(50)
        .delta(0.05)
        .criterion(SplitCriterion::Mauve)
        .leaf_model(leaf_model)
        .build()
        .unwrap();
    for x in generators::uniform_rows(&mut rng, 1000, 1) {
        tree.add_sample(&x, v_shape(&x)).unwrap();
    }
    let rows = generators::uniform_rows(&mut rng, 500, 1);
    let targets = rows.iter().map(|x| v_shape(x)).collect();
    (tree, Dataset::new(rows, targets).unwrap())
}

#[test]
fn simple_linear_leaves_fit_each_arm_of_a_v() {
    let (tree, validation) = grow_v(LeafModel::SimpleLinear { feature: None }, 3);
    let (feature, threshold) = tree.split_condition(NodeId::ROOT).expect("no split");
    assert_eq!(feature, 0);
    assert!(threshold.abs() < 0.2, "threshold {threshold}");

    let linear = root_mean_squared_error(&tree, &validation);
    let (constant_tree, _) = grow_v(LeafModel::Constant, 3);
    let constant = root_mean_squared_error(&constant_tree, &validation);
    assert!(linear < 0.1, "linear leaves rmse {linear}\n{tree}");
    assert!(linear * 5.0 < constant, "{linear} vs {constant}");

    for leaf in tree
        .leaves()
        .filter(|&leaf| tree.leaf_statistics(leaf).unwrap().count() >= 2)
    {
        assert!(matches!(
            tree.leaf_model(leaf),
            Some(FittedModel::Linear { feature: 0, .. })
        ));
    }
}

#[test]
fn pinned_feature_is_used_for_simple_regression() {
    let mut rng = fastrand::Rng::with_seed(13);
    let mut tree = HoeffdingTree::builder()
        .criterion(SplitCriterion::Never)
        .leaf_model(LeafModel::SimpleLinear { feature: Some(1) })
        .build()
        .unwrap();
    for x in generators::uniform_rows(&mut rng, 200, 2) {
        tree.add_sample(&x, 3.0 * x[1] - 1.0).unwrap();
    }
    let Some(FittedModel::Linear {
        feature,
        slope,
        intercept,
        ..
    }) = tree.leaf_model(NodeId::ROOT)
    else {
        panic!("expected a linear leaf:\n{tree}");
    };
    assert_eq!(feature, 1);
    assert!((slope - 3.0).abs() < 1e-9);
    assert!((intercept + 1.0).abs() < 1e-9);
}

#[test]
fn multivariate_leaf_recovers_plane() {
    let mut rng = fastrand::Rng::with_seed(19);
    let mut tree = HoeffdingTree::builder()
        .criterion(SplitCriterion::Never)
        .leaf_model(LeafModel::MultivariateLinear)
        .build()
        .unwrap();
    for x in generators::uniform_rows(&mut rng, 200, 2) {
        tree.add_sample(&x, generators::plane(&x)).unwrap();
    }
    let Some(FittedModel::Multivariate { coefficients, .. }) = tree.leaf_model(NodeId::ROOT) else {
        panic!("expected a multivariate leaf:\n{tree}");
    };
    for (got, want) in coefficients.iter().zip([0.5, 1.5, -2.0]) {
        assert!((got - want).abs() < 1e-8, "{coefficients:?}");
    }
    for x in generators::uniform_rows(&mut rng, 50, 2) {
        assert!((tree.predict(&x) - generators::plane(&x)).abs() < 1e-8);
    }
}

#[test]
fn multivariate_leaf_imputes_missing_feature_with_its_mean() {
    let mut rng = fastrand::Rng::with_seed(37);
    let mut tree = HoeffdingTree::builder()
        .criterion(SplitCriterion::Never)
        .leaf_model(LeafModel::MultivariateLinear)
        .build()
        .unwrap();
    let rows = generators::uniform_rows(&mut rng, 300, 2);
    for x in &rows {
        tree.add_sample(x, generators::plane(x)).unwrap();
    }
    let mean_x1 = rows.iter().map(|x| x[1]).sum::<f64>() / rows.len() as f64;
    let expected = generators::plane(&[0.25, mean_x1]);
    assert!((tree.predict(&[0.25, f64::NAN]) - expected).abs() < 1e-8);
    assert!((tree.predict(&[0.25]) - expected).abs() < 1e-8);
}

#[test]
fn new_children_predict_with_parent_model() {
    let mut rng = fastrand::Rng::with_seed(3);
    let mut tree = HoeffdingTree::builder()
        .chunk_size(50)
        .delta(0.05)
        .criterion(SplitCriterion::Mauve)
        .leaf_model(LeafModel::SimpleLinear { feature: None })
        .build()
        .unwrap();
    let mut split = false;
    for x in generators::uniform_rows(&mut rng, 1000, 1) {
        if tree.add_sample(&x, v_shape(&x)).unwrap().split() {
            split = true;
            break;
        }
    }
    assert!(split, "root never split:\n{tree}");

    let (left, right) = tree.children(NodeId::ROOT).unwrap();
    assert_eq!(tree.leaf_statistics(left).unwrap().count(), 0);
    assert_eq!(tree.leaf_statistics(right).unwrap().count(), 0);
    let inherited = tree.leaf_model(left).unwrap();
    assert!(matches!(inherited, FittedModel::Linear { feature: 0, .. }));
    assert_eq!(tree.leaf_model(right), Some(inherited.clone()));
    assert_eq!(tree.predict(&[-0.4]), inherited.predict(&[-0.4]));
    assert_eq!(tree.predict(&[0.4]), inherited.predict(&[0.4]));
}

#[test]
fn display_shows_leaf_models() {
    let (tree, _) = grow_v(LeafModel::SimpleLinear { feature: None }, 3);
    let dump = tree.to_string();
    assert!(dump.contains("* x[0]"), "{dump}");
    assert_eq!(
        dump.lines().filter(|l| l.trim_start().starts_with("leaf #")).count(),
        tree.n_leaves()
    );
}

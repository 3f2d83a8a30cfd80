//! Tests for decision tree and random forest classifiers.

use super::*;

fn two_blobs() -> (Matrix<f32>, Vec<usize>) {
    let x = Matrix::from_vec(
        8,
        2,
        vec![
            0.0, 0.1, 0.2, 0.0, 0.1, 0.3, 0.3, 0.2, // class 0
            2.0, 2.1, 2.2, 1.9, 1.8, 2.0, 2.1, 2.2, // class 1
        ],
    )
    .expect("8x2 matrix");
    (x, vec![0, 0, 0, 0, 1, 1, 1, 1])
}

#[test]
fn test_tree_depth() {
    let leaf = |class_label| {
        let mut class_counts = vec![0; 2];
        class_counts[class_label] = 1;
        Box::new(TreeNode::Leaf(Leaf {
            class_label,
            n_samples: 1,
            class_counts,
        }))
    };
    let node = TreeNode::Node(Node {
        feature_idx: 0,
        threshold: 0.5,
        left: leaf(0),
        right: leaf(1),
    });
    assert_eq!(node.depth(), 1);
}

#[test]
fn test_decision_tree_fits_separable_data() {
    let (x, y) = two_blobs();
    let mut tree = DecisionTreeClassifier::new();
    tree.fit(&x, &y).expect("fit succeeds");
    assert_eq!(tree.predict(&x).expect("fitted"), y);
    assert_eq!(tree.tree().map(TreeNode::depth), Some(1));
}

#[test]
fn test_decision_tree_max_depth_zero_is_majority_leaf() {
    let x = Matrix::from_vec(3, 1, vec![0.0, 1.0, 2.0]).expect("3x1 matrix");
    let y = vec![1, 0, 1];
    let mut tree = DecisionTreeClassifier::new().with_max_depth(0);
    tree.fit(&x, &y).expect("fit succeeds");
    assert_eq!(tree.predict(&x).expect("fitted"), vec![1, 1, 1]);
}

#[test]
fn test_decision_tree_predict_before_fit() {
    let (x, _) = two_blobs();
    let err = DecisionTreeClassifier::new()
        .predict(&x)
        .expect_err("not fitted");
    assert!(matches!(err, Node2VecError::NotFitted { .. }));
}

#[test]
fn test_decision_tree_feature_mismatch() {
    let (x, y) = two_blobs();
    let mut tree = DecisionTreeClassifier::new();
    tree.fit(&x, &y).expect("fit succeeds");
    let wide = Matrix::from_vec(1, 3, vec![0.0, 0.0, 0.0]).expect("1x3 matrix");
    assert!(tree.predict(&wide).is_err());
}

#[test]
fn test_fit_rejects_empty_and_mismatched() {
    let empty = Matrix::from_vec(0, 2, vec![]).expect("0x2 matrix");
    assert!(DecisionTreeClassifier::new().fit(&empty, &[]).is_err());

    let (x, _) = two_blobs();
    assert!(RandomForestClassifier::new(3).fit(&x, &[0, 1]).is_err());
}

#[test]
fn test_random_forest_fits_separable_data() {
    let (x, y) = two_blobs();
    let mut forest = RandomForestClassifier::new(25).with_random_state(7);
    forest.fit(&x, &y).expect("fit succeeds");
    assert_eq!(forest.trees().len(), 25);
    assert_eq!(forest.predict(&x).expect("fitted"), y);
}

#[test]
fn test_random_forest_reproducible_with_seed() {
    let (x, y) = two_blobs();
    let queries = Matrix::from_vec(3, 2, vec![1.0, 1.0, 0.5, 1.5, 1.5, 0.5]).expect("3x2 matrix");
    let run = || {
        let mut forest = RandomForestClassifier::new(15).with_random_state(3);
        forest.fit(&x, &y).expect("fit succeeds");
        forest.predict(&queries).expect("fitted")
    };
    assert_eq!(run(), run());
}

#[test]
fn test_random_forest_predict_before_fit() {
    let (x, _) = two_blobs();
    let err = RandomForestClassifier::default()
        .predict(&x)
        .expect_err("not fitted");
    assert!(matches!(err, Node2VecError::NotFitted { .. }));
}

#[test]
fn test_random_forest_zero_estimators_rejected() {
    let (x, y) = two_blobs();
    assert!(RandomForestClassifier::new(0).fit(&x, &y).is_err());
}

fn stump(class_counts: Vec<usize>) -> DecisionTreeClassifier {
    let class_label = argmax(&class_counts.iter().map(|&c| c as f32).collect::<Vec<_>>());
    DecisionTreeClassifier {
        n_classes: class_counts.len(),
        tree: Some(TreeNode::Leaf(Leaf {
            class_label,
            n_samples: class_counts.iter().sum(),
            class_counts,
        })),
        max_depth: None,
        max_features: None,
        random_state: 0,
        n_features: Some(1),
    }
}

fn forest_of(trees: Vec<DecisionTreeClassifier>) -> RandomForestClassifier {
    RandomForestClassifier {
        n_estimators: trees.len(),
        trees,
        max_depth: None,
        max_features: None,
        random_state: Some(0),
    }
}

#[test]
fn test_probability_tie_goes_to_lowest_class() {
    let forest = forest_of(vec![stump(vec![0, 1]), stump(vec![1, 0])]);
    let x = Matrix::from_vec(1, 1, vec![0.0]).expect("1x1 matrix");
    assert_eq!(forest.predict(&x).expect("fitted"), vec![0]);
}

#[test]
fn test_forest_averages_leaf_probabilities() {
    // Two impure leaves lean to class 1, one pure leaf is class 0.
    // A hard vote would pick 1; the mean probability of class 0 is 0.6.
    let forest = forest_of(vec![stump(vec![2, 3]), stump(vec![2, 3]), stump(vec![5, 0])]);
    let x = Matrix::from_vec(1, 1, vec![0.0]).expect("1x1 matrix");

    let proba = forest.predict_proba(&x).expect("fitted");
    assert_eq!(proba.shape(), (1, 2));
    assert!((proba.get(0, 0) - 0.6).abs() < 1e-6);
    assert!((proba.get(0, 1) - 0.4).abs() < 1e-6);
    assert_eq!(forest.predict(&x).expect("fitted"), vec![0]);
}

#[test]
fn test_tree_predict_proba_rows_sum_to_one() {
    let (x, y) = two_blobs();
    let mut tree = DecisionTreeClassifier::new().with_max_depth(0);
    tree.fit(&x, &y).expect("fit succeeds");
    let proba = tree.predict_proba(&x).expect("fitted");
    assert_eq!(proba.shape(), (8, 2));
    for row in proba.rows() {
        assert!((row[0] - 0.5).abs() < 1e-6);
        assert!((row.iter().sum::<f32>() - 1.0).abs() < 1e-6);
    }
}

#[test]
fn test_default_max_features() {
    assert_eq!(default_max_features(64), 8);
    assert_eq!(default_max_features(32), 5);
    assert_eq!(default_max_features(10), 3);
    assert_eq!(default_max_features(1), 1);
    assert_eq!(default_max_features(0), 1);
}

#[test]
fn test_bootstrap_sample_in_range() {
    let sample = bootstrap_sample(10, 5);
    assert_eq!(sample.len(), 10);
    assert!(sample.iter().all(|&i| i < 10));
    assert_eq!(sample, bootstrap_sample(10, 5));
}

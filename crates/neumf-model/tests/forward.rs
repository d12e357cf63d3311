use neumf_model::{ForwardMode, ModelError, NeuMF, NeuMFConfig};

fn reference_config() -> NeuMFConfig {
    NeuMFConfig::new(10, 20, 4, vec![8, 8, 4, 2])
}

#[test]
fn scores_reference_batch() {
    let model = NeuMF::new(reference_config()).unwrap();
    let scores = model.predict(&[0, 1, 2], &[5, 6, 7]).unwrap();
    assert_eq!(scores.len(), 3);
    for score in scores {
        assert!(score > 0.0 && score < 1.0, "score {score} outside (0, 1)");
    }
}

#[test]
fn rejects_user_index_equal_to_count() {
    let model = NeuMF::new(reference_config()).unwrap();
    let err = model.predict(&[10], &[0]).unwrap_err();
    assert!(matches!(
        err,
        ModelError::OutOfRange {
            index: 10,
            count: 10,
            ..
        }
    ));
}

#[test]
fn rejects_unequal_batch_lengths() {
    let model = NeuMF::new(reference_config()).unwrap();
    let err = model.predict(&[0, 1, 2], &[5, 6]).unwrap_err();
    assert!(matches!(err, ModelError::ShapeMismatch { .. }));
}

#[test]
fn rejects_odd_first_layer_width() {
    let err = NeuMF::new(NeuMFConfig::new(10, 20, 4, vec![7, 4])).unwrap_err();
    assert!(matches!(err, ModelError::InvalidConfiguration { .. }));
}

#[test]
fn forward_is_deterministic() {
    let model = NeuMF::new(reference_config()).unwrap();
    let users = [0, 4, 9, 4];
    let items = [19, 0, 7, 7];
    let first = model.forward(&users, &items, true, ForwardMode::Inference).unwrap();
    let second = model.forward(&users, &items, true, ForwardMode::Inference).unwrap();
    assert_eq!(first, second);
}

#[test]
fn permuting_pairs_permutes_scores() {
    let model = NeuMF::new(reference_config().with_seed(5)).unwrap();
    let scores = model.predict(&[0, 1, 2], &[5, 6, 7]).unwrap();
    let permuted = model.predict(&[2, 0, 1], &[7, 5, 6]).unwrap();
    assert_eq!(permuted, vec![scores[2], scores[0], scores[1]]);
}

#[test]
fn same_seed_builds_same_model() {
    let a = NeuMF::new(reference_config().with_seed(11)).unwrap();
    let b = NeuMF::new(reference_config().with_seed(11)).unwrap();
    let c = NeuMF::new(reference_config().with_seed(12)).unwrap();

    assert_eq!(a.to_state(0).unwrap().tensors, b.to_state(0).unwrap().tensors);
    assert_ne!(a.to_state(0).unwrap().tensors, c.to_state(0).unwrap().tensors);
    assert_eq!(
        a.predict(&[1, 2], &[3, 4]).unwrap(),
        b.predict(&[1, 2], &[3, 4]).unwrap()
    );
}

#[test]
fn initializer_bounds_hold() {
    let model = NeuMF::new(reference_config().with_seed(3)).unwrap();
    let state = model.to_state(0).unwrap();

    let within = |name: &str, bound: f32| {
        let tensor = state.tensor(name).unwrap();
        assert!(
            tensor.data.iter().all(|v| v.abs() <= bound),
            "{name} exceeds bound {bound}"
        );
    };

    let lecun = (3.0f32 / 4.0).sqrt();
    for name in [
        "mf_user_embedding",
        "mf_item_embedding",
        "mlp_user_embedding",
        "mlp_item_embedding",
    ] {
        within(name, lecun);
    }
    within("mlp.0.weight", (6.0f32 / 16.0).sqrt());
    within("mlp.1.weight", (6.0f32 / 12.0).sqrt());
    within("mlp.2.weight", (6.0f32 / 6.0).sqrt());
    within("fusion.weight", (6.0f32 / 7.0).sqrt());

    for name in ["mlp.0.bias", "mlp.1.bias", "mlp.2.bias", "fusion.bias"] {
        assert!(state.tensor(name).unwrap().data.iter().all(|&v| v == 0.0));
    }
}

#[test]
fn training_mode_is_seeded_dropout() {
    let config = NeuMFConfig::new(30, 30, 8, vec![32, 64, 32])
        .with_dropout(0.5)
        .with_seed(9);
    let model = NeuMF::new(config).unwrap();
    let users: Vec<i64> = (0..30).collect();
    let items: Vec<i64> = (0..30).rev().collect();

    let inference = model.forward(&users, &items, false, ForwardMode::Inference).unwrap();
    let train_a = model
        .forward(&users, &items, false, ForwardMode::Training { seed: 1 })
        .unwrap();
    let train_b = model
        .forward(&users, &items, false, ForwardMode::Training { seed: 1 })
        .unwrap();

    assert_eq!(train_a, train_b);
    assert_ne!(train_a, inference);
}

#[test]
fn training_mode_without_dropout_matches_inference() {
    let model = NeuMF::new(reference_config().with_seed(2)).unwrap();
    let inference = model.forward(&[1, 2], &[3, 4], true, ForwardMode::Inference).unwrap();
    let training = model
        .forward(&[1, 2], &[3, 4], true, ForwardMode::Training { seed: 99 })
        .unwrap();
    assert_eq!(inference, training);
}

#[test]
fn parallel_prediction_matches_serial() {
    let model = NeuMF::new(reference_config().with_seed(4)).unwrap();
    let users: Vec<i64> = (0..100).map(|i| i % 10).collect();
    let items: Vec<i64> = (0..100).map(|i| (i * 7) % 20).collect();

    let serial = model.predict(&users, &items).unwrap();
    for chunk_size in [1, 7, 32, 100, 1000] {
        assert_eq!(model.predict_parallel(&users, &items, chunk_size).unwrap(), serial);
    }
}

#[test]
fn parallel_prediction_validates_whole_batch() {
    let model = NeuMF::new(reference_config()).unwrap();
    let err = model.predict_parallel(&[0, 1, 2, 3], &[0, 1, 2, 20], 2).unwrap_err();
    assert!(matches!(err, ModelError::OutOfRange { index: 20, .. }));
}

#[test]
fn model_is_shared_across_threads() {
    let model = std::sync::Arc::new(NeuMF::new(reference_config().with_seed(8)).unwrap());
    let expected = model.predict(&[1, 2, 3], &[4, 5, 6]).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let model = std::sync::Arc::clone(&model);
            std::thread::spawn(move || model.predict(&[1, 2, 3], &[4, 5, 6]).unwrap())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

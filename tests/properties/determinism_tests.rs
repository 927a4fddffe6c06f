use proptest::prelude::*;

use isqa::search::learned::{LogisticModel, TrainingExample, TrainingParams};
use isqa::search::{Embedder, HashEmbedder};

fn example() -> impl Strategy<Value = TrainingExample> {
    (0.0f64..=1.0, 0.0f64..=1.0, any::<bool>()).prop_map(|(v, w, positive)| TrainingExample {
        features: [v, w],
        positive,
    })
}

proptest! {
    #[test]
    fn test_hash_embedding_deterministic(text in ".*") {
        let embedder = HashEmbedder::new(64);
        let first = embedder.embed(&text);
        let second = embedder.embed(&text);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_hash_embedding_length(text in ".*", dim in 1usize..256usize) {
        let embedder = HashEmbedder::new(dim);
        let embedding = Embedder::embed(&embedder, &text);
        prop_assert_eq!(embedding.len(), dim);
    }

    #[test]
    fn test_hash_embedding_unit_or_zero(text in "[a-z ]{0,40}") {
        let embedding = HashEmbedder::new(32).embed(&text);
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        prop_assert!(norm.abs() < 1e-6 || (norm - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_training_is_deterministic(examples in prop::collection::vec(example(), 0..40), seed in any::<u64>()) {
        let params = TrainingParams { seed, epochs: 20, ..TrainingParams::default() };
        prop_assert_eq!(
            LogisticModel::fit(&examples, &params),
            LogisticModel::fit(&examples, &params)
        );
    }

    #[test]
    fn test_probabilities_in_unit_interval(
        examples in prop::collection::vec(example(), 0..40),
        v in 0.0f64..=1.0,
        w in 0.0f64..=1.0,
    ) {
        let params = TrainingParams { epochs: 20, ..TrainingParams::default() };
        let p = LogisticModel::fit(&examples, &params).predict_proba([v, w]);
        prop_assert!((0.0..=1.0).contains(&p));
    }
}

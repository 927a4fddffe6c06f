use std::collections::HashSet;

use proptest::prelude::*;

use isqa::corpus::ChunkId;
use isqa::search::candidates::{CandidateKey, CandidateTable};
use isqa::search::{RetrievalResult, hybrid, normalize};

fn hits(prefix: &'static str) -> impl Strategy<Value = Vec<RetrievalResult>> {
    prop::collection::vec(("[a-c]{1,3}", 0.0f64..=1.0), 0..12).prop_map(move |raw| {
        raw.into_iter()
            .enumerate()
            .map(|(i, (text, score))| RetrievalResult {
                chunk: ChunkId::new(format!("{prefix}{i}")),
                text,
                score,
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn test_normalize_bounds(scores in prop::collection::vec(-1e6f64..1e6, 0..50)) {
        let normalized = normalize(&scores);
        prop_assert_eq!(normalized.len(), scores.len());
        for value in &normalized {
            prop_assert!((0.0..=1.0).contains(value));
        }
    }

    #[test]
    fn test_normalize_constant_is_zero(value in -1e6f64..1e6, len in 0usize..20) {
        let normalized = normalize(&vec![value; len]);
        prop_assert!(normalized.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_normalize_monotonic(scores in prop::collection::vec(-1e3f64..1e3, 2..30)) {
        let normalized = normalize(&scores);
        for i in 0..scores.len() {
            for j in 0..scores.len() {
                if scores[i] < scores[j] {
                    prop_assert!(normalized[i] <= normalized[j]);
                }
            }
        }
    }

    #[test]
    fn test_hybrid_bounded(
        vector in hits("v"),
        keyword in hits("k"),
        alpha in 0.0f64..=1.0,
        k in 1usize..20,
    ) {
        let table = CandidateTable::merge(&vector, &keyword, 2);
        let results = hybrid::fuse(&table, alpha, k);
        prop_assert!(results.len() <= k);
        prop_assert!(results.len() <= table.len());
        for r in &results {
            prop_assert!((0.0..=1.0 + 1e-12).contains(&r.score));
        }
        for pair in results.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_candidate_keys_unique(vector in hits("v"), keyword in hits("k"), prefix in 1usize..4) {
        let table = CandidateTable::merge(&vector, &keyword, prefix);
        let keys: HashSet<CandidateKey> = table
            .candidates()
            .iter()
            .map(|c| CandidateKey::from_text(&c.text, prefix))
            .collect();
        prop_assert_eq!(keys.len(), table.len());

        let expected: HashSet<CandidateKey> = vector
            .iter()
            .chain(keyword.iter())
            .map(|h| CandidateKey::from_text(&h.text, prefix))
            .collect();
        prop_assert_eq!(expected, keys);
    }

    #[test]
    fn test_missing_channel_is_zero(vector in hits("v"), keyword in hits("k")) {
        let table = CandidateTable::merge(&vector, &keyword, 100);
        let vector_keys: HashSet<CandidateKey> =
            vector.iter().map(|h| CandidateKey::from_text(&h.text, 100)).collect();
        let keyword_keys: HashSet<CandidateKey> =
            keyword.iter().map(|h| CandidateKey::from_text(&h.text, 100)).collect();
        for candidate in table.candidates() {
            let key = CandidateKey::from_text(&candidate.text, 100);
            if !vector_keys.contains(&key) {
                prop_assert_eq!(candidate.vector_score, 0.0);
            }
            if !keyword_keys.contains(&key) {
                prop_assert_eq!(candidate.keyword_score, 0.0);
            }
        }
    }
}

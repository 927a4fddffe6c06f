use std::thread;

use isqa::QaError;
use isqa::engine::QueryRequest;
use isqa::indexer::IndexPaths;
use isqa::search::Mode;
use isqa::test_utils::fixtures::{IndexFixture, SAFETY_CHUNKS};

use crate::support::FixedEmbedder;

#[test]
fn baseline_is_idempotent() {
    let fixture = IndexFixture::safety();
    let engine = fixture.engine();
    let request = QueryRequest::new("When should emergency stop be applied?").with_mode(Mode::Baseline);

    let first = engine.answer(&request).unwrap();
    let second = engine.answer(&request).unwrap();
    assert_eq!(first, second);
}

#[test]
fn hybrid_scores_are_bounded_and_sorted() {
    let fixture = IndexFixture::safety();
    let engine = fixture.engine();

    let results = engine.search(Mode::Hybrid, "emergency stop", 5).unwrap();
    assert!(!results.is_empty());
    assert!(results.len() <= 5);
    assert!(results.iter().all(|r| (0.0..=1.0).contains(&r.score)));
    assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
}

#[test]
fn learned_scores_are_probabilities() {
    let fixture = IndexFixture::safety();
    let engine = fixture.engine();

    let results = engine.search(Mode::Learned, "laser scanner operation", 3).unwrap();
    assert!(results.len() <= 3);
    assert!(results.iter().all(|r| r.score > 0.0 && r.score < 1.0));
    assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
}

#[test]
fn k_bounds_every_mode() {
    let fixture = IndexFixture::safety();
    let engine = fixture.engine();
    for mode in Mode::ALL {
        assert!(engine.search(mode, "safety", 1).unwrap().len() <= 1);
        assert!(engine.search(mode, "safety", 50).unwrap().len() <= SAFETY_CHUNKS.len());
    }
}

#[test]
fn reranker_is_trained_on_bootstrap_candidates() {
    let fixture = IndexFixture::safety();
    let engine = fixture.engine();
    let model = engine.model();
    assert!(model.examples > 0);
    assert!(model.positives <= model.examples);
}

#[test]
fn hybrid_ties_keep_vector_order() {
    let embedder = FixedEmbedder::new(4)
        .place("left twin guard", &[1.0, 0.0, 0.0])
        .place("right twin guard", &[1.0, 0.0, 0.0])
        .place("far away chunk", &[0.0, 1.0, 0.0])
        .place("twin lookup", &[1.0, 0.0, 0.0])
        .shared();
    let fixture = IndexFixture::build_with(
        &[
            ("left_chunk1.pdf", "left twin guard"),
            ("right_chunk1.pdf", "right twin guard"),
            ("far_chunk1.pdf", "far away chunk"),
        ],
        embedder,
    );
    let engine = fixture.engine();

    let results = engine.search(Mode::Hybrid, "twin lookup", 5).unwrap();
    let ids: Vec<&str> = results.iter().map(|r| r.pdf.as_str()).collect();
    assert_eq!(ids, vec!["left_chunk1.pdf", "right_chunk1.pdf", "far_chunk1.pdf"]);
    assert!((results[0].score - results[1].score).abs() < f64::EPSILON);
}

#[test]
fn shared_prefix_collapses_in_fused_modes_only() {
    let prefix = "Machine guarding requirements apply to every rotating part of the equipment and must be verified.";
    let prefix = format!("{prefix:<100}");
    let first = format!("{prefix} Fixed guards need tools to remove.");
    let second = format!("{prefix} Interlocked guards stop the motor.");
    let fixture = IndexFixture::build(&[
        ("guards_chunk1.pdf", first.as_str()),
        ("guards_chunk2.pdf", second.as_str()),
        ("other_chunk1.pdf", "Hearing protection is required above 85 dB."),
    ]);
    let engine = fixture.engine();

    let baseline = engine.search(Mode::Baseline, "machine guarding requirements", 5).unwrap();
    assert_eq!(baseline.len(), 3);

    let hybrid = engine.search(Mode::Hybrid, "machine guarding requirements", 5).unwrap();
    let guards = hybrid
        .iter()
        .filter(|r| r.pdf.as_str().starts_with("guards_"))
        .count();
    assert_eq!(guards, 1);
}

#[test]
fn keyword_store_loss_is_internal_error() {
    let fixture = IndexFixture::safety();
    let engine = fixture.engine();
    std::fs::remove_file(IndexPaths::new(&fixture.index_dir).chunks_db).unwrap();

    let err = engine
        .answer(&QueryRequest::new("emergency stop").with_mode(Mode::Hybrid))
        .unwrap_err();
    assert!(matches!(err, QaError::Internal(_)));
    assert_eq!(err.code(), "internal_error");

    // The dense path does not touch the store.
    let response = engine
        .answer(&QueryRequest::new("emergency stop").with_mode(Mode::Baseline))
        .unwrap();
    assert_eq!(response.reranker_used, Mode::Baseline);
}

#[test]
fn concurrent_requests_match_sequential() {
    let fixture = IndexFixture::safety();
    let engine = fixture.engine();
    let questions = [
        "What are PPE safety requirements?",
        "How to safely operate a laser scanner?",
        "When should emergency stop be applied?",
        "How to calculate performance level (PL) for a safety function?",
    ];
    let expected: Vec<_> = questions
        .iter()
        .map(|q| engine.answer(&QueryRequest::new(*q)).unwrap())
        .collect();

    let actual: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = questions
            .iter()
            .map(|q| {
                let engine = &engine;
                scope.spawn(move || engine.answer(&QueryRequest::new(*q)).unwrap())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(actual, expected);
}

#[test]
fn punctuation_heavy_question_is_served() {
    let fixture = IndexFixture::safety();
    let engine = fixture.engine();
    for mode in Mode::ALL {
        let response = engine
            .answer(&QueryRequest::new(r#"What are "type-C" standards in ISO 13849-1?*"#).with_mode(mode))
            .unwrap();
        assert_eq!(response.reranker_used, mode);
    }
}

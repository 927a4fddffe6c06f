use isqa::config::{Config, DEFAULT_ABSTAIN_MESSAGE};
use isqa::engine::QueryRequest;
use isqa::search::Mode;
use isqa::test_utils::fixtures::IndexFixture;

use crate::support::FixedEmbedder;

const ZEBRA: &str = "zebra markings show the pedestrian walkway";

fn lexical_only_fixture() -> IndexFixture {
    let embedder = FixedEmbedder::new(4)
        .place("guard rails must be fixed to the frame", &[1.0, 0.0, 0.0])
        .place("gloves protect hands from cuts", &[0.0, 1.0, 0.0])
        .place(ZEBRA, &[0.0, 0.0, 1.0])
        .shared();
    IndexFixture::build_with(
        &[
            ("frame_chunk1.pdf", "guard rails must be fixed to the frame"),
            ("ppe_chunk1.pdf", "gloves protect hands from cuts"),
            ("floor_chunk1.pdf", ZEBRA),
        ],
        embedder,
    )
}

#[test]
fn empty_corpus_abstains_in_every_mode() {
    let fixture = IndexFixture::empty();
    let engine = fixture.engine();

    for mode in Mode::ALL {
        let response = engine
            .answer(&QueryRequest::new("What are PPE safety requirements?").with_mode(mode))
            .unwrap();
        assert!(response.answer.is_none(), "{mode} answered on an empty corpus");
        assert!(response.contexts.is_empty());
        assert_eq!(response.message.as_deref(), Some(DEFAULT_ABSTAIN_MESSAGE));
        assert_eq!(response.reranker_used, mode);
    }
}

#[test]
fn lexical_only_match_abstains_in_baseline() {
    let fixture = lexical_only_fixture();
    let engine = fixture.engine();

    let response = engine
        .answer(&QueryRequest::new("zebra markings").with_mode(Mode::Baseline))
        .unwrap();
    assert!(response.answer.is_none());
    assert!(response.contexts.is_empty());
}

#[test]
fn lexical_only_match_surfaces_in_hybrid() {
    let fixture = lexical_only_fixture();
    let engine = fixture.engine();

    let response = engine
        .answer(&QueryRequest::new("zebra markings").with_mode(Mode::Hybrid))
        .unwrap();
    let answer = response.answer.expect("hybrid should answer from the keyword channel");
    assert!(answer.contains("(Source: floor_chunk1.pdf)"));

    let top = &response.contexts[0];
    assert_eq!(top.pdf.as_str(), "floor_chunk1.pdf");
    assert!((top.score - 0.4).abs() < 1e-6, "score was {}", top.score);
}

#[test]
fn lexical_only_match_is_a_learned_candidate() {
    let fixture = lexical_only_fixture();
    let engine = fixture.engine();

    let response = engine
        .answer(&QueryRequest::new("zebra markings").with_mode(Mode::Learned))
        .unwrap();
    assert!(response.answer.is_some());
    assert!(
        response
            .contexts
            .iter()
            .any(|c| c.pdf.as_str() == "floor_chunk1.pdf")
    );
}

#[test]
fn gate_answers_exactly_at_threshold() {
    let fixture = IndexFixture::safety();
    let mut config = Config::default();
    // No bootstrap data: every learned probability is exactly 0.5.
    config.reranker.bootstrap_questions = Vec::new();

    config.answer.threshold = 0.5;
    let engine = fixture.engine_with(&config);
    let request = QueryRequest::new("protective gloves").with_mode(Mode::Learned);
    let response = engine.answer(&request).unwrap();
    assert!(response.answer.is_some());
    assert!((response.contexts[0].score - 0.5).abs() < f64::EPSILON);

    config.answer.threshold = 0.500_001;
    let engine = fixture.engine_with(&config);
    let response = engine.answer(&request).unwrap();
    assert!(response.answer.is_none());
    assert!(response.contexts.is_empty());
}

#[test]
fn custom_abstain_message_is_used() {
    let fixture = IndexFixture::empty();
    let mut config = Config::default();
    config.answer.abstain_message = "Not enough evidence.".to_string();
    let engine = fixture.engine_with(&config);

    let response = engine.answer(&QueryRequest::new("anything")).unwrap();
    assert_eq!(response.message.as_deref(), Some("Not enough evidence."));
}

//! Answer stage: decide whether the ranked contexts are good enough, then
//! build an extractive answer from them.

pub mod gate;
pub mod synthesis;

pub use gate::{ConfidenceGate, GateDecision};
pub use synthesis::AnswerSynthesizer;

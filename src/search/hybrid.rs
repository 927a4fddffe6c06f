//! Weighted linear fusion for hybrid search
//!
//! score = alpha * norm(vector) + (1 - alpha) * norm(keyword), with both
//! channels min-max normalized across the merged candidate table.

use crate::search::candidates::CandidateTable;
use crate::search::normalize::normalize;
use crate::search::FinalResult;

/// Default weight of the vector channel.
pub const DEFAULT_ALPHA: f64 = 0.6;

/// Rank every candidate by fused score and keep the top `k`.
///
/// The sort is stable, so equal scores keep table order (vector-sourced
/// candidates ahead of keyword-only ones).
#[must_use]
pub fn fuse(table: &CandidateTable, alpha: f64, k: usize) -> Vec<FinalResult> {
    let vector = normalize(&table.vector_scores());
    let keyword = normalize(&table.keyword_scores());

    let mut results: Vec<FinalResult> = table
        .candidates()
        .iter()
        .zip(vector.iter().zip(keyword.iter()))
        .map(|(candidate, (v, w))| FinalResult {
            pdf: candidate.chunk.clone(),
            text: candidate.text.clone(),
            score: alpha.mul_add(*v, (1.0 - alpha) * w),
        })
        .collect();

    results.sort_by(|a, b| b.score.total_cmp(&a.score));
    results.truncate(k);
    results
}

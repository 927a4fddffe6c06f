//! Batch runner and mode comparison.
//!
//! Every question is asked in every mode. A request that keeps failing is
//! retried a bounded number of times and then recorded as a placeholder
//! response carrying the error, so one bad question never stops the batch.

use std::collections::BTreeMap;
use std::path::Path;
use std::thread;
use std::time::Duration;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::BatchConfig;
use crate::engine::{QaEngine, QueryRequest, QueryResponse};
use crate::error::{QaError, Result};
use crate::search::fusion::Mode;

/// Anything that can serve a query request.
pub trait Responder: Sync {
    fn respond(&self, request: &QueryRequest) -> Result<QueryResponse>;
}

impl Responder for QaEngine {
    fn respond(&self, request: &QueryRequest) -> Result<QueryResponse> {
        self.answer(request)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchQuestion {
    pub q: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRecord {
    pub question: String,
    pub results: BTreeMap<Mode, QueryResponse>,
}

pub fn read_questions(path: &Path) -> Result<Vec<BatchQuestion>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|err| QaError::BatchFailed(format!("read {}: {err}", path.display())))?;
    serde_json::from_str(&raw)
        .map_err(|err| QaError::BatchFailed(format!("parse {}: {err}", path.display())))
}

pub fn write_results(path: &Path, records: &[BatchRecord]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(records)?)?;
    Ok(())
}

pub struct BatchRunner<'a, R: Responder> {
    responder: &'a R,
    config: BatchConfig,
    k: usize,
}

impl<'a, R: Responder> BatchRunner<'a, R> {
    pub const fn new(responder: &'a R, config: BatchConfig, k: usize) -> Self {
        Self {
            responder,
            config,
            k,
        }
    }

    /// Run all questions in parallel. Output order matches input order.
    pub fn run(&self, questions: &[BatchQuestion]) -> Vec<BatchRecord> {
        questions
            .par_iter()
            .map(|question| self.run_question(&question.q))
            .collect()
    }

    pub fn run_question(&self, question: &str) -> BatchRecord {
        let results = Mode::ALL
            .into_iter()
            .map(|mode| {
                let request = QueryRequest {
                    q: question.to_string(),
                    k: self.k,
                    mode,
                };
                (mode, self.respond_with_retries(&request))
            })
            .collect();
        BatchRecord {
            question: question.to_string(),
            results,
        }
    }

    fn respond_with_retries(&self, request: &QueryRequest) -> QueryResponse {
        let attempts = self.config.max_retries.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.responder.respond(request) {
                Ok(response) => {
                    debug!(mode = %request.mode, attempt, "batch request done");
                    return response;
                }
                // Client errors fail the same way every time.
                Err(err) if err.is_client_error() || attempt >= attempts => {
                    warn!(
                        question = %request.q,
                        mode = %request.mode,
                        attempt,
                        error = %err,
                        "batch request skipped"
                    );
                    return QueryResponse::failed(request.mode, err.to_string());
                }
                Err(err) => {
                    warn!(
                        question = %request.q,
                        mode = %request.mode,
                        attempt,
                        max = attempts,
                        error = %err,
                        "batch request failed, retrying"
                    );
                    thread::sleep(Duration::from_millis(self.config.retry_delay_ms));
                }
            }
        }
    }
}

/// Top score of each mode for one question; `None` when a mode found nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub question: String,
    pub baseline_top_score: Option<f64>,
    pub hybrid_top_score: Option<f64>,
    pub learned_top_score: Option<f64>,
}

/// Rank every question in every mode, without gating, and keep the top
/// scores side by side.
pub fn compare(engine: &QaEngine, questions: &[String], k: usize) -> Result<Vec<ComparisonRow>> {
    questions
        .iter()
        .map(|question| {
            let top = |mode| -> Result<Option<f64>> {
                Ok(engine.search(mode, question, k)?.first().map(|r| r.score))
            };
            Ok(ComparisonRow {
                question: question.clone(),
                baseline_top_score: top(Mode::Baseline)?,
                hybrid_top_score: top(Mode::Hybrid)?,
                learned_top_score: top(Mode::Learned)?,
            })
        })
        .collect()
}

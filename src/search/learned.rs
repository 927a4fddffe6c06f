//! Learned reranker: a two-feature logistic regression over
//! `(vector_score, keyword_score)`.
//!
//! Trained once at startup on candidates produced by the bootstrap question
//! set, then frozen. Labels are a proxy: a candidate counts as relevant when
//! its vector score exceeds the configured label threshold.
//!
//! Training is seeded SGD with class-balanced sample weights and L2
//! regularization. The same bootstrap set, seed and corpus always yield the
//! same weights.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::RerankerConfig;
use crate::error::Result;
use crate::search::FinalResult;
use crate::search::candidates::CandidateTable;
use crate::search::fusion::Retrievers;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingExample {
    pub features: [f64; 2],
    pub positive: bool,
}

/// Label every candidate of a bootstrap query.
#[must_use]
pub fn label_candidates(table: &CandidateTable, label_threshold: f64) -> Vec<TrainingExample> {
    table
        .candidates()
        .iter()
        .map(|c| TrainingExample {
            features: c.features(),
            positive: c.vector_score > label_threshold,
        })
        .collect()
}

/// Run every bootstrap question through both retrievers and label the
/// merged candidates.
pub fn bootstrap_examples(
    retrievers: &Retrievers,
    config: &RerankerConfig,
) -> Result<Vec<TrainingExample>> {
    let mut examples = Vec::new();
    for question in &config.bootstrap_questions {
        let table = retrievers.candidates(question, config.bootstrap_k)?;
        examples.extend(label_candidates(&table, config.label_threshold));
    }
    Ok(examples)
}

/// Train the reranker from the configured bootstrap set.
pub fn train(retrievers: &Retrievers, config: &RerankerConfig) -> Result<LogisticModel> {
    let examples = bootstrap_examples(retrievers, config)?;
    Ok(LogisticModel::fit(&examples, &TrainingParams::from(config)))
}

#[derive(Debug, Clone, Copy)]
pub struct TrainingParams {
    pub seed: u64,
    pub epochs: u32,
    pub learning_rate: f64,
    /// Inverse L2 strength; larger means weaker regularization.
    pub regularization: f64,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self::from(&RerankerConfig::default())
    }
}

impl From<&RerankerConfig> for TrainingParams {
    fn from(config: &RerankerConfig) -> Self {
        Self {
            seed: config.seed,
            epochs: config.epochs,
            learning_rate: config.learning_rate,
            regularization: config.regularization,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub weights: [f64; 2],
    pub bias: f64,
    pub examples: usize,
    pub positives: usize,
}

impl LogisticModel {
    /// Model used when training data has fewer than two classes: every
    /// candidate gets probability 0.5.
    #[must_use]
    pub const fn uninformative(examples: usize, positives: usize) -> Self {
        Self {
            weights: [0.0, 0.0],
            bias: 0.0,
            examples,
            positives,
        }
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fit(examples: &[TrainingExample], params: &TrainingParams) -> Self {
        let n = examples.len();
        let positives = examples.iter().filter(|e| e.positive).count();
        let negatives = n - positives;

        if positives == 0 || negatives == 0 {
            warn!(
                examples = n,
                positives, "reranker training set has a single class; using uninformative model"
            );
            return Self::uninformative(n, positives);
        }

        // Balanced weighting: n / (classes * class_count).
        let positive_weight = n as f64 / (2.0 * positives as f64);
        let negative_weight = n as f64 / (2.0 * negatives as f64);
        let decay = 1.0 / (params.regularization * n as f64);

        let mut weights = [0.0f64; 2];
        let mut bias = 0.0f64;
        let mut order: Vec<usize> = (0..n).collect();
        let mut rng = StdRng::seed_from_u64(params.seed);

        for epoch in 0..params.epochs {
            order.shuffle(&mut rng);
            let step = params.learning_rate / (1.0 + 0.01 * f64::from(epoch));
            for &i in &order {
                let example = &examples[i];
                let (target, sample_weight) = if example.positive {
                    (1.0, positive_weight)
                } else {
                    (0.0, negative_weight)
                };
                let error = sample_weight * (sigmoid(linear(&weights, bias, example.features)) - target);
                for (w, x) in weights.iter_mut().zip(example.features) {
                    *w -= step * decay.mul_add(*w, error * x);
                }
                bias -= step * error;
            }
        }

        debug!(?weights, bias, examples = n, positives, "reranker trained");
        Self {
            weights,
            bias,
            examples: n,
            positives,
        }
    }

    /// Probability that a candidate with these features is relevant.
    #[must_use]
    pub fn predict_proba(&self, features: [f64; 2]) -> f64 {
        sigmoid(linear(&self.weights, self.bias, features))
    }

    /// Score every candidate, sort by probability descending (stable) and
    /// keep the top `k`.
    #[must_use]
    pub fn rerank(&self, table: &CandidateTable, k: usize) -> Vec<FinalResult> {
        let mut results: Vec<FinalResult> = table
            .candidates()
            .iter()
            .map(|c| FinalResult {
                pdf: c.chunk.clone(),
                text: c.text.clone(),
                score: self.predict_proba(c.features()),
            })
            .collect();
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(k);
        results
    }
}

fn linear(weights: &[f64; 2], bias: f64, features: [f64; 2]) -> f64 {
    weights[0].mul_add(features[0], weights[1].mul_add(features[1], bias))
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

//! Extractive answer synthesis.

use crate::search::FinalResult;

#[derive(Debug, Clone, Copy)]
pub struct AnswerSynthesizer {
    pub max_chunks: usize,
    pub snippet_chars: usize,
}

impl Default for AnswerSynthesizer {
    fn default() -> Self {
        Self {
            max_chunks: 2,
            snippet_chars: 200,
        }
    }
}

impl AnswerSynthesizer {
    /// Join a cited snippet of each of the top `max_chunks` results with a
    /// single space.
    #[must_use]
    pub fn synthesize(&self, results: &[FinalResult]) -> String {
        results
            .iter()
            .take(self.max_chunks)
            .map(|r| format!("{} (Source: {})", self.snippet(&r.text), r.pdf))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn snippet(&self, text: &str) -> String {
        let flat = text.replace(['\r', '\n'], " ");
        let flat = flat.trim();
        if flat.chars().count() > self.snippet_chars {
            let cut: String = flat.chars().take(self.snippet_chars).collect();
            format!("{cut}...")
        } else {
            flat.to_string()
        }
    }
}

//! Hash embeddings
//!
//! Implements FNV-1a based hash embeddings for dense similarity.
//! No ML model dependencies - fully deterministic. Any real sentence-embedding
//! model plugs in through the [`Embedder`] trait.

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Maps text into a fixed-dimension embedding space.
pub trait Embedder: Send + Sync {
    /// Embed text into a vector of length [`Embedder::dims`].
    fn embed(&self, text: &str) -> Vec<f32>;

    fn dims(&self) -> usize;

    /// Short backend name used in logs and index summaries.
    fn name(&self) -> &'static str;
}

/// Hash embedder using FNV-1a
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    /// Embedding dimension (default: 384)
    dim: usize,
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self { dim: 384 }
    }
}

impl HashEmbedder {
    /// Create embedder with specified dimension
    #[must_use]
    pub const fn new(dim: usize) -> Self {
        Self { dim }
    }

    /// Embed text into vector
    #[must_use]
    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dim];
        if self.dim == 0 {
            return vector;
        }

        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();

        for token in &tokens {
            self.accumulate(&mut vector, token.as_bytes(), 1.0);
        }
        // Bigrams carry a little word-order signal at half weight.
        for pair in tokens.windows(2) {
            let joined = format!("{} {}", pair[0], pair[1]);
            self.accumulate(&mut vector, joined.as_bytes(), 0.5);
        }

        l2_normalize(&mut vector);
        vector
    }

    #[allow(clippy::cast_possible_truncation)]
    fn accumulate(&self, vector: &mut [f32], bytes: &[u8], weight: f32) {
        let hash = fnv1a(bytes);
        let bucket = (hash % self.dim as u64) as usize;
        let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }
}

impl Embedder for HashEmbedder {
    fn embed(&self, text: &str) -> Vec<f32> {
        Self::embed(self, text)
    }

    fn dims(&self) -> usize {
        self.dim
    }

    fn name(&self) -> &'static str {
        "hash"
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

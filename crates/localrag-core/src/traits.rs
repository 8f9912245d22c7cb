use crate::error::Result;
use crate::types::Embedding;

/// Maps text into a fixed-dimension vector space.
///
/// Implementations must be deterministic for a given input and must return
/// vectors of length [`Embedder::dim`] for every input, including `""`.
pub trait Embedder: Send + Sync {
    /// Embedding dimensionality (D).
    fn dim(&self) -> usize;
    /// Longest input, in characters, the backend accepts.
    fn max_len(&self) -> usize;
    fn embed(&self, text: &str) -> Result<Embedding>;

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

/// Maps a finished prompt to an answer.
///
/// Generators never truncate: a prompt longer than [`Generator::context_limit`]
/// is rejected with a generation error.
pub trait Generator: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String>;

    /// Maximum prompt length in characters, if the backend has one.
    fn context_limit(&self) -> Option<usize> {
        None
    }
}

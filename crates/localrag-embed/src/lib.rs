//! Embedder backends.
//!
//! The retrieval core only sees [`Embedder`]; this crate supplies the
//! adapters used by the pipeline and the tests:
//! - [`HashingEmbedder`]: feature-hashing of word tokens, no model files
//! - [`FnEmbedder`]: wraps any closure, e.g. a client for a remote model

use std::hash::{Hash, Hasher};

use tracing::debug;
use twox_hash::XxHash64;

use localrag_core::error::{Error, Result};
use localrag_core::traits::Embedder;
use localrag_core::types::Embedding;

pub const DEFAULT_DIM: usize = 384;
pub const DEFAULT_MAX_LEN: usize = 8192;

/// Deterministic bag-of-words embedder.
///
/// Each lowercased alphanumeric token is hashed with xxHash64 into one of
/// `dim` buckets; the result is L2-normalized. The empty string maps to the
/// zero vector.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dim: usize,
    max_len: usize,
    seed: u64,
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(Error::config("embedding dimension must be at least 1"));
        }
        Ok(Self { dim, max_len: DEFAULT_MAX_LEN, seed: 0 })
    }

    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }

    /// Different seeds give unrelated vector spaces of the same dimension.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn bucket(&self, token: &str) -> (usize, f32) {
        let mut hasher = XxHash64::with_seed(self.seed);
        token.hash(&mut hasher);
        let h = hasher.finish();
        let idx = (h % self.dim as u64) as usize;
        // Top bit picks the sign so unrelated tokens tend to cancel.
        let sign = if h >> 63 == 0 { 1.0 } else { -1.0 };
        (idx, sign)
    }
}

impl Embedder for HashingEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn max_len(&self) -> usize {
        self.max_len
    }

    fn embed(&self, text: &str) -> Result<Embedding> {
        let len = text.chars().count();
        if len > self.max_len {
            return Err(Error::embedding(format!("input of {len} chars exceeds max length {}", self.max_len)));
        }
        let mut v = vec![0f32; self.dim];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
        {
            let (idx, sign) = self.bucket(&token);
            v[idx] += sign;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }
        Ok(v)
    }
}

type EmbedFn = dyn Fn(&str) -> Result<Embedding> + Send + Sync;

/// Adapts a closure into an [`Embedder`].
///
/// The closure's output length is not checked here; the vector index rejects
/// vectors whose length differs from its dimension.
pub struct FnEmbedder {
    dim: usize,
    max_len: usize,
    f: Box<EmbedFn>,
}

impl FnEmbedder {
    pub fn new<F>(dim: usize, f: F) -> Self
    where
        F: Fn(&str) -> Result<Embedding> + Send + Sync + 'static,
    {
        Self { dim, max_len: usize::MAX, f: Box::new(f) }
    }

    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }
}

impl std::fmt::Debug for FnEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnEmbedder").field("dim", &self.dim).field("max_len", &self.max_len).finish()
    }
}

impl Embedder for FnEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn max_len(&self) -> usize {
        self.max_len
    }

    fn embed(&self, text: &str) -> Result<Embedding> {
        let len = text.chars().count();
        if len > self.max_len {
            return Err(Error::embedding(format!("input of {len} chars exceeds max length {}", self.max_len)));
        }
        (self.f)(text)
    }
}

/// The embedder used when no backend is configured.
///
/// `APP_EMBED_DIM` overrides the dimension.
pub fn get_default_embedder() -> Result<Box<dyn Embedder>> {
    let dim = match std::env::var("APP_EMBED_DIM") {
        Ok(v) => v
            .parse::<usize>()
            .map_err(|e| Error::config(format!("APP_EMBED_DIM={v}: {e}")))?,
        Err(_) => DEFAULT_DIM,
    };
    debug!(dim, "using hashing embedder");
    Ok(Box::new(HashingEmbedder::new(dim)?))
}

//! Ingestion and top-k retrieval over one [`VectorIndex`].

use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use localrag_core::config::RagSettings;
use localrag_core::error::{Error, Result};
use localrag_core::splitter::PassageSplitter;
use localrag_core::traits::Embedder;
use localrag_core::types::{DistanceMetric, Document, Embedding, Passage, RetrievalResult};
use localrag_vector::VectorIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrieverState {
    /// Nothing ingested yet, or cleared since.
    Empty,
    /// At least one ingest (or snapshot load) has succeeded.
    Ready,
}

struct Inner {
    index: VectorIndex,
    state: RetrieverState,
}

/// Splits, embeds and indexes documents, then answers top-k queries with the
/// same embedder.
///
/// Each `ingest` call appends all of its passages as one batch under the write
/// lock, so concurrent searches see either none or all of them.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    splitter: PassageSplitter,
    inner: RwLock<Inner>,
    parallel_embedding: bool,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, splitter: PassageSplitter, metric: DistanceMetric) -> Self {
        Self {
            embedder,
            splitter,
            inner: RwLock::new(Inner { index: VectorIndex::new(metric), state: RetrieverState::Empty }),
            parallel_embedding: false,
        }
    }

    pub fn from_settings(embedder: Arc<dyn Embedder>, settings: &RagSettings) -> Result<Self> {
        settings.validate()?;
        let splitter = PassageSplitter::new(settings.chunking.clone())?;
        Ok(Self::new(embedder, splitter, settings.retrieval.metric)
            .with_parallel_embedding(settings.retrieval.parallel_embedding))
    }

    /// Embed passages on the rayon pool during ingest. Insertion order is
    /// unaffected.
    pub fn with_parallel_embedding(mut self, enabled: bool) -> Self {
        self.parallel_embedding = enabled;
        self
    }

    pub fn state(&self) -> RetrieverState {
        self.inner.read().state
    }

    pub fn len(&self) -> usize {
        self.inner.read().index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dim(&self) -> Option<usize> {
        self.inner.read().index.dim()
    }

    pub fn metric(&self) -> DistanceMetric {
        self.inner.read().index.metric()
    }

    pub fn splitter(&self) -> &PassageSplitter {
        &self.splitter
    }

    /// Split, embed and index `documents`, returning the number of passages
    /// added. Documents are not deduplicated: ingesting the same set twice
    /// stores every passage twice.
    ///
    /// On any failure nothing is inserted and the state is unchanged.
    pub fn ingest(&self, documents: &[Document]) -> Result<usize> {
        let passages = self.splitter.split_all(documents);
        let embeddings = self.embed_passages(&passages)?;
        if embeddings.len() != passages.len() {
            return Err(Error::embedding(format!(
                "backend returned {} vectors for {} passages",
                embeddings.len(),
                passages.len()
            )));
        }

        let added = passages.len();
        let mut inner = self.inner.write();
        inner.index.insert_batch(passages.into_iter().zip(embeddings).collect())?;
        inner.state = RetrieverState::Ready;
        info!(documents = documents.len(), passages = added, size = inner.index.len(), "ingested documents");
        Ok(added)
    }

    fn embed_passages(&self, passages: &[Passage]) -> Result<Vec<Embedding>> {
        if self.parallel_embedding {
            passages.par_iter().map(|p| self.embedder.embed(&p.text)).collect()
        } else {
            let texts: Vec<String> = passages.iter().map(|p| p.text.clone()).collect();
            self.embedder.embed_batch(&texts)
        }
    }

    /// Passages nearest to `query`, nearest first, without distances.
    pub fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Passage>> {
        Ok(self.search(query, k)?.into_iter().map(|s| s.passage).collect())
    }

    /// Like [`Retriever::retrieve`] but keeps distances and positions.
    pub fn search(&self, query: &str, k: usize) -> Result<RetrievalResult> {
        if k == 0 {
            return Err(Error::InvalidArgument("k must be at least 1".into()));
        }
        if self.state() == RetrieverState::Empty {
            warn!("retrieve called before any ingest; returning no passages");
            return Ok(Vec::new());
        }
        let query_vec = self.embedder.embed(query)?;
        let result = self.search_vector(&query_vec, k)?;
        debug!(k, hits = result.len(), "retrieved passages");
        Ok(result)
    }

    /// Search with a precomputed query vector.
    pub fn search_vector(&self, query: &[f32], k: usize) -> Result<RetrievalResult> {
        self.inner.read().index.search(query, k)
    }

    /// Drop all entries and return to [`RetrieverState::Empty`].
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.index.clear();
        inner.state = RetrieverState::Empty;
    }

    pub fn save_index(&self, path: &Path) -> Result<()> {
        self.inner.read().index.save(path)
    }

    /// Replace the index with a snapshot. A non-empty snapshot makes the
    /// retriever Ready; its dimension must match the embedder's and its
    /// metric must match the retriever's.
    pub fn load_index(&self, path: &Path) -> Result<()> {
        let index = VectorIndex::load(path)?;
        let metric = self.metric();
        if index.metric() != metric {
            return Err(Error::config(format!(
                "snapshot {} uses metric {:?}, retriever uses {:?}",
                path.display(),
                index.metric(),
                metric
            )));
        }
        if let Some(dim) = index.dim() {
            if dim != self.embedder.dim() {
                return Err(Error::DimensionMismatch { expected: self.embedder.dim(), got: dim });
            }
        }
        let mut inner = self.inner.write();
        inner.state = if index.is_empty() { RetrieverState::Empty } else { RetrieverState::Ready };
        inner.index = index;
        Ok(())
    }
}

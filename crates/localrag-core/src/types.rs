//! Domain types shared by the splitter, the vector index and the retriever.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type DocId = String;
pub type Meta = BTreeMap<String, String>;

/// A fixed-length embedding vector. Every embedding produced by one
/// embedder has the same length.
pub type Embedding = Vec<f32>;

/// A unit of source text handed to ingestion.
///
/// The retriever only reads documents; the caller keeps ownership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub text: String,
    #[serde(default)]
    pub meta: Meta,
}

impl Document {
    pub fn new(id: impl Into<DocId>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into(), meta: Meta::new() }
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }
}

/// A contiguous span of one document, the atomic retrievable unit.
///
/// - `doc_id`/`doc_meta`: provenance copied from the source document
/// - `index`/`total`: position of this passage within its document
/// - `start`/`end`: character offsets (not bytes) into the document text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub text: String,
    pub doc_id: DocId,
    #[serde(default)]
    pub doc_meta: Meta,
    pub index: usize,
    pub total: usize,
    pub start: usize,
    pub end: usize,
}

impl Passage {
    /// Stable identifier of the form `<doc_id>:<index>`.
    pub fn id(&self) -> String {
        format!("{}:{}", self.doc_id, self.index)
    }

    /// Length of the passage in characters.
    pub fn char_len(&self) -> usize {
        self.end - self.start
    }
}

/// Distance used by a vector index, fixed for the index lifetime.
///
/// - `l2`: Euclidean distance
/// - `inner_product`: negated dot product
/// - `cosine`: one minus cosine similarity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    #[default]
    L2,
    InnerProduct,
    Cosine,
}

/// One hit from a nearest-neighbor search. Smaller distance is nearer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPassage {
    pub passage: Passage,
    pub distance: f32,
    /// Insertion position of the matching index entry.
    pub position: usize,
}

/// Ordered nearest-first, at most `k` long.
pub type RetrievalResult = Vec<ScoredPassage>;

//! Exact nearest-neighbor index over passage embeddings.
//!
//! Search is brute force: every stored embedding is compared with the query,
//! and the `k` nearest are kept in a bounded heap. Results are ordered by
//! ascending distance; equal distances resolve to the earlier-inserted entry.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use localrag_core::error::{Error, Result};
use localrag_core::types::{DistanceMetric, Embedding, Passage, RetrievalResult, ScoredPassage};

pub mod distance;
pub mod snapshot;

pub use distance::distance;

/// A stored passage with its embedding and insertion position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub position: usize,
    pub passage: Passage,
    pub embedding: Embedding,
}

/// Append-only collection of [`IndexEntry`] values.
///
/// The first non-empty batch fixes the dimension D; `clear` resets it.
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    metric: DistanceMetric,
    dim: Option<usize>,
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    pub fn new(metric: DistanceMetric) -> Self {
        Self { metric, dim: None, entries: Vec::new() }
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// The established dimension, `None` until the first insert.
    pub fn dim(&self) -> Option<usize> {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Append a batch, assigning consecutive positions in batch order.
    ///
    /// The whole batch is validated before anything is stored, so a
    /// `DimensionMismatch` leaves the index exactly as it was.
    pub fn insert_batch(&mut self, batch: Vec<(Passage, Embedding)>) -> Result<()> {
        let Some((_, first)) = batch.first() else {
            return Ok(());
        };
        let expected = self.dim.unwrap_or(first.len());
        if expected == 0 {
            return Err(Error::InvalidArgument("embeddings must have at least one dimension".into()));
        }
        if let Some((_, bad)) = batch.iter().find(|(_, e)| e.len() != expected) {
            return Err(Error::DimensionMismatch { expected, got: bad.len() });
        }

        let base = self.entries.len();
        self.entries.reserve(batch.len());
        self.entries.extend(batch.into_iter().enumerate().map(|(i, (passage, embedding))| IndexEntry {
            position: base + i,
            passage,
            embedding,
        }));
        self.dim = Some(expected);
        debug!(added = self.entries.len() - base, size = self.entries.len(), dim = expected, "inserted batch");
        Ok(())
    }

    /// The `k` entries nearest to `query`, nearest first.
    ///
    /// An empty index yields an empty result; fewer than `k` entries yields
    /// all of them.
    pub fn search(&self, query: &[f32], k: usize) -> Result<RetrievalResult> {
        if k == 0 {
            return Err(Error::InvalidArgument("k must be at least 1".into()));
        }
        let Some(dim) = self.dim else {
            return Ok(Vec::new());
        };
        if query.len() != dim {
            return Err(Error::DimensionMismatch { expected: dim, got: query.len() });
        }

        let mut heap: BinaryHeap<Candidate> = BinaryHeap::with_capacity(k.min(self.entries.len()) + 1);
        for entry in &self.entries {
            heap.push(Candidate { distance: distance(self.metric, query, &entry.embedding), position: entry.position });
            if heap.len() > k {
                heap.pop();
            }
        }

        Ok(heap
            .into_sorted_vec()
            .into_iter()
            .map(|c| ScoredPassage {
                passage: self.entries[c.position].passage.clone(),
                distance: c.distance,
                position: c.position,
            })
            .collect())
    }

    /// Drop every entry and forget the dimension. The metric is kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.dim = None;
    }
}

/// Heap element ordered by (distance, position); the heap's max is the
/// current worst candidate.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    distance: f32,
    position: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance.total_cmp(&other.distance).then(self.position.cmp(&other.position))
    }
}

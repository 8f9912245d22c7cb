//! Retrieval-augmented question answering.
//!
//! ```text
//! documents → PassageSplitter → Embedder → VectorIndex
//! question  → Embedder → VectorIndex::search(k) → PromptBuilder → Generator → answer
//! ```

pub mod generator;
pub mod pipeline;
pub mod prompt;
pub mod retriever;

pub use generator::FnGenerator;
pub use pipeline::{Answer, Comparison, Pipeline};
pub use prompt::{PromptBuilder, CONTEXT_PLACEHOLDER, QUESTION_PLACEHOLDER};
pub use retriever::{Retriever, RetrieverState};

#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod config;
pub mod error;
pub mod loader;
pub mod logging;
pub mod splitter;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use splitter::{ChunkingConfig, ChunkingPolicy, PassageSplitter, SizeUnit};
pub use traits::{Embedder, Generator};
pub use types::{DistanceMetric, DocId, Document, Embedding, Meta, Passage, RetrievalResult, ScoredPassage};

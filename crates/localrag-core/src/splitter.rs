//! Passage splitting.
//!
//! Three policies are supported:
//! - `whole_document`: one passage per non-empty document, size unbounded
//! - `fixed_size`: non-overlapping chunks of at most `max_size` units
//! - `sentence`: whole sentences packed into chunks of at most `max_size` units;
//!   a sentence longer than `max_size` is cut by unit
//!
//! Every policy is lossless: concatenating the passages of a document in
//! order reproduces the document text exactly.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{Document, Passage};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkingPolicy {
    #[default]
    WholeDocument,
    FixedSize,
    Sentence,
}

/// How passage size is measured.
///
/// A token is a maximal run of non-whitespace characters together with the
/// whitespace that follows it; leading whitespace belongs to the first token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeUnit {
    #[default]
    Chars,
    Tokens,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub policy: ChunkingPolicy,
    pub max_size: usize,
    pub unit: SizeUnit,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { policy: ChunkingPolicy::WholeDocument, max_size: 1000, unit: SizeUnit::Chars }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(Error::config("chunking.max_size must be at least 1"));
        }
        Ok(())
    }
}

/// A span of the source text: byte range, character count and size in units.
#[derive(Debug, Clone, Copy)]
struct Piece {
    start: usize,
    end: usize,
    chars: usize,
    size: usize,
}

#[derive(Debug, Clone, Default)]
pub struct PassageSplitter {
    config: ChunkingConfig,
}

impl PassageSplitter {
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn whole_document() -> Self {
        Self::default()
    }

    pub fn fixed_size(max_size: usize, unit: SizeUnit) -> Result<Self> {
        Self::new(ChunkingConfig { policy: ChunkingPolicy::FixedSize, max_size, unit })
    }

    pub fn sentence(max_size: usize, unit: SizeUnit) -> Result<Self> {
        Self::new(ChunkingConfig { policy: ChunkingPolicy::Sentence, max_size, unit })
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Split one document into passages, in text order.
    pub fn split(&self, doc: &Document) -> Vec<Passage> {
        if doc.text.is_empty() {
            debug!(doc_id = %doc.id, "skipping empty document");
            return vec![];
        }
        let text = doc.text.as_str();
        let spans = match self.config.policy {
            ChunkingPolicy::WholeDocument => {
                vec![Piece { start: 0, end: text.len(), chars: text.chars().count(), size: 0 }]
            }
            ChunkingPolicy::FixedSize => pack(&unit_pieces(text, self.config.unit), self.config.max_size),
            ChunkingPolicy::Sentence => {
                let mut pieces = Vec::new();
                for sentence in sentence_pieces(text, self.config.unit) {
                    if sentence.size > self.config.max_size {
                        let slice = &text[sentence.start..sentence.end];
                        pieces.extend(unit_pieces(slice, self.config.unit).into_iter().map(|p| Piece {
                            start: p.start + sentence.start,
                            end: p.end + sentence.start,
                            ..p
                        }));
                    } else {
                        pieces.push(sentence);
                    }
                }
                pack(&pieces, self.config.max_size)
            }
        };

        let total = spans.len();
        let mut char_offset = 0;
        spans
            .into_iter()
            .enumerate()
            .map(|(index, span)| {
                let start = char_offset;
                char_offset += span.chars;
                Passage {
                    text: text[span.start..span.end].to_string(),
                    doc_id: doc.id.clone(),
                    doc_meta: doc.meta.clone(),
                    index,
                    total,
                    start,
                    end: char_offset,
                }
            })
            .collect()
    }

    /// Split a document set, preserving document order then passage order.
    pub fn split_all(&self, docs: &[Document]) -> Vec<Passage> {
        docs.iter().flat_map(|d| self.split(d)).collect()
    }
}

/// Size of `text` in `unit`.
pub fn measure(text: &str, unit: SizeUnit) -> usize {
    match unit {
        SizeUnit::Chars => text.chars().count(),
        SizeUnit::Tokens => unit_pieces(text, SizeUnit::Tokens).len(),
    }
}

fn unit_pieces(text: &str, unit: SizeUnit) -> Vec<Piece> {
    match unit {
        SizeUnit::Chars => text
            .char_indices()
            .map(|(i, c)| Piece { start: i, end: i + c.len_utf8(), chars: 1, size: 1 })
            .collect(),
        SizeUnit::Tokens => {
            let mut cuts = Vec::new();
            let mut seen_word = false;
            let mut prev_ws = false;
            for (i, c) in text.char_indices() {
                let ws = c.is_whitespace();
                if !ws {
                    if prev_ws && seen_word {
                        cuts.push(i);
                    }
                    seen_word = true;
                }
                prev_ws = ws;
            }
            spans_from_cuts(text, &cuts, |_| 1)
        }
    }
}

/// Sentences end at `.`, `?` or `!` followed by whitespace, or at a newline.
/// Trailing whitespace stays with the sentence it follows.
fn sentence_pieces(text: &str, unit: SizeUnit) -> Vec<Piece> {
    let mut cuts = Vec::new();
    let mut after_terminator = false;
    let mut pending = false;
    for (i, c) in text.char_indices() {
        if c.is_whitespace() {
            if after_terminator || c == '\n' {
                pending = true;
            }
        } else {
            if pending && i > 0 {
                cuts.push(i);
            }
            pending = false;
            after_terminator = matches!(c, '.' | '?' | '!');
        }
    }
    spans_from_cuts(text, &cuts, |s| measure(s, unit))
}

fn spans_from_cuts(text: &str, cuts: &[usize], size: impl Fn(&str) -> usize) -> Vec<Piece> {
    let mut out = Vec::with_capacity(cuts.len() + 1);
    let mut start = 0;
    for end in cuts.iter().copied().chain(std::iter::once(text.len())) {
        if end > start {
            let slice = &text[start..end];
            out.push(Piece { start, end, chars: slice.chars().count(), size: size(slice) });
        }
        start = end;
    }
    out
}

/// Greedily merge adjacent pieces while the merged size stays within `max_size`.
fn pack(pieces: &[Piece], max_size: usize) -> Vec<Piece> {
    let mut out: Vec<Piece> = Vec::new();
    let mut current: Option<Piece> = None;
    for piece in pieces {
        current = match current {
            Some(cur) if cur.size + piece.size <= max_size => Some(Piece {
                start: cur.start,
                end: piece.end,
                chars: cur.chars + piece.chars,
                size: cur.size + piece.size,
            }),
            Some(cur) => {
                out.push(cur);
                Some(*piece)
            }
            None => Some(*piece),
        };
    }
    out.extend(current);
    out
}

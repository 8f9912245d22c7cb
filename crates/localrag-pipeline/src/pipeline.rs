//! Retrieve, build a prompt, generate.

use std::sync::Arc;

use tracing::{debug, info};

use localrag_core::config::RagSettings;
use localrag_core::error::{Error, Result};
use localrag_core::traits::{Embedder, Generator};
use localrag_core::types::{Document, Passage};

use crate::prompt::PromptBuilder;
use crate::retriever::Retriever;

#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    /// Passages that made it into the prompt, possibly truncated.
    pub passages: Vec<Passage>,
    pub prompt: String,
}

/// The same question answered with and without retrieved context.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub augmented: Answer,
    pub base: Answer,
}

pub struct Pipeline {
    retriever: Retriever,
    prompt: PromptBuilder,
    generator: Box<dyn Generator>,
    top_k: usize,
    max_context_chars: Option<usize>,
}

impl Pipeline {
    pub fn new(retriever: Retriever, prompt: PromptBuilder, generator: Box<dyn Generator>) -> Self {
        Self { retriever, prompt, generator, top_k: 3, max_context_chars: None }
    }

    /// Build every component from settings. If `index.snapshot_path` names an
    /// existing file, the index is loaded from it.
    pub fn from_settings(
        embedder: Arc<dyn Embedder>,
        generator: Box<dyn Generator>,
        settings: &RagSettings,
    ) -> Result<Self> {
        let retriever = Retriever::from_settings(embedder, settings)?;
        let prompt = PromptBuilder::from_settings(&settings.prompt)?;
        if let Some(path) = settings.index.snapshot_path() {
            if path.exists() {
                retriever.load_index(&path)?;
                info!(path = %path.display(), entries = retriever.len(), "restored index");
            }
        }
        Ok(Self::new(retriever, prompt, generator)
            .with_top_k(settings.retrieval.top_k)?
            .with_max_context_chars(settings.generation.max_context_chars))
    }

    pub fn with_top_k(mut self, top_k: usize) -> Result<Self> {
        if top_k == 0 {
            return Err(Error::config("top_k must be at least 1"));
        }
        self.top_k = top_k;
        Ok(self)
    }

    pub fn with_max_context_chars(mut self, max_context_chars: Option<usize>) -> Self {
        self.max_context_chars = max_context_chars;
        self
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub fn prompt_builder(&self) -> &PromptBuilder {
        &self.prompt
    }

    pub fn ingest(&self, documents: &[Document]) -> Result<usize> {
        self.retriever.ingest(documents)
    }

    /// Answer with the top-k retrieved passages as context.
    pub fn answer(&self, question: &str) -> Result<Answer> {
        let retrieved = self.retriever.retrieve(question, self.top_k)?;
        let passages = self.fit_context(retrieved, question);
        self.generate(passages, question)
    }

    /// Answer with an empty context, i.e. the base model on its own.
    pub fn answer_without_context(&self, question: &str) -> Result<Answer> {
        self.generate(Vec::new(), question)
    }

    pub fn compare(&self, question: &str) -> Result<Comparison> {
        Ok(Comparison { augmented: self.answer(question)?, base: self.answer_without_context(question)? })
    }

    fn generate(&self, passages: Vec<Passage>, question: &str) -> Result<Answer> {
        let prompt = self.prompt.build(&passages, question);
        let text = self.generator.generate(&prompt)?;
        Ok(Answer { text, passages, prompt })
    }

    /// Context budget in characters, or `None` when unbounded.
    fn context_budget(&self, question: &str) -> Option<usize> {
        let room = self
            .generator
            .context_limit()
            .map(|limit| limit.saturating_sub(self.prompt.overhead() + question.chars().count()));
        match (self.max_context_chars, room) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Keep passages in order while they fit the budget; the first one that
    /// does not fit is cut to the remaining room and ends the context.
    fn fit_context(&self, passages: Vec<Passage>, question: &str) -> Vec<Passage> {
        let Some(budget) = self.context_budget(question) else {
            return passages;
        };
        let delimiter = self.prompt.delimiter().chars().count();
        let retrieved = passages.len();
        let mut used = 0;
        let mut kept = Vec::with_capacity(retrieved);
        let mut truncated = false;
        for passage in passages {
            let sep = if kept.is_empty() { 0 } else { delimiter };
            let len = passage.text.chars().count();
            if used + sep + len <= budget {
                used += sep + len;
                kept.push(passage);
                continue;
            }
            let room = budget.saturating_sub(used + sep);
            if room > 0 {
                let text: String = passage.text.chars().take(room).collect();
                let end = passage.start + room;
                kept.push(Passage { text, end, ..passage });
                truncated = true;
            }
            break;
        }
        if truncated || kept.len() < retrieved {
            debug!(budget, retrieved, kept = kept.len(), "capped retrieved context");
        }
        kept
    }
}

//! Prompt assembly from a template with `{context}` and `{question}`.

use localrag_core::config::{placeholder_offset, PromptSettings};
pub use localrag_core::config::{CONTEXT_PLACEHOLDER, QUESTION_PLACEHOLDER};
use localrag_core::error::Result;
use localrag_core::types::Passage;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Context,
    Question,
}

/// A parsed prompt template.
///
/// Substitution is literal and single-pass: placeholder text that appears
/// inside passages or the question is copied through untouched.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    template: String,
    segments: Vec<Segment>,
    delimiter: String,
}

impl PromptBuilder {
    /// Parse `template`, which must contain each placeholder exactly once.
    pub fn new(template: &str) -> Result<Self> {
        let context_at = placeholder_offset(template, CONTEXT_PLACEHOLDER)?;
        let question_at = placeholder_offset(template, QUESTION_PLACEHOLDER)?;

        let mut marks = [
            (context_at, CONTEXT_PLACEHOLDER.len(), Segment::Context),
            (question_at, QUESTION_PLACEHOLDER.len(), Segment::Question),
        ];
        marks.sort_by_key(|(at, _, _)| *at);

        let mut segments = Vec::with_capacity(5);
        let mut cursor = 0;
        for (at, len, segment) in marks {
            if at > cursor {
                segments.push(Segment::Literal(template[cursor..at].to_string()));
            }
            segments.push(segment);
            cursor = at + len;
        }
        if cursor < template.len() {
            segments.push(Segment::Literal(template[cursor..].to_string()));
        }

        Ok(Self { template: template.to_string(), segments, delimiter: "\n".to_string() })
    }

    pub fn from_settings(settings: &PromptSettings) -> Result<Self> {
        Ok(Self::new(&settings.template)?.with_delimiter(&settings.delimiter))
    }

    pub fn with_delimiter(mut self, delimiter: &str) -> Self {
        self.delimiter = delimiter.to_string();
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// Characters contributed by the template itself.
    pub fn overhead(&self) -> usize {
        self.segments
            .iter()
            .map(|s| match s {
                Segment::Literal(text) => text.chars().count(),
                _ => 0,
            })
            .sum()
    }

    /// Passage texts in the order given, joined by the delimiter.
    pub fn context(&self, passages: &[Passage]) -> String {
        passages.iter().map(|p| p.text.as_str()).collect::<Vec<_>>().join(&self.delimiter)
    }

    pub fn build(&self, passages: &[Passage], question: &str) -> String {
        self.build_with_context(&self.context(passages), question)
    }

    pub fn build_with_context(&self, context: &str, question: &str) -> String {
        let mut out = String::with_capacity(self.template.len() + context.len() + question.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Context => out.push_str(context),
                Segment::Question => out.push_str(question),
            }
        }
        out
    }
}

use localrag_core::error::{Error, Result};
use localrag_core::traits::Generator;

type GenerateFn = dyn Fn(&str) -> Result<String> + Send + Sync;

/// Adapts a closure (typically a client call to a hosted model) into a
/// [`Generator`], enforcing an optional context-length limit.
pub struct FnGenerator {
    f: Box<GenerateFn>,
    context_limit: Option<usize>,
}

impl FnGenerator {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str) -> Result<String> + Send + Sync + 'static,
    {
        Self { f: Box::new(f), context_limit: None }
    }

    pub fn with_context_limit(mut self, chars: usize) -> Self {
        self.context_limit = Some(chars);
        self
    }
}

impl std::fmt::Debug for FnGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnGenerator").field("context_limit", &self.context_limit).finish()
    }
}

impl Generator for FnGenerator {
    fn generate(&self, prompt: &str) -> Result<String> {
        if let Some(limit) = self.context_limit {
            let len = prompt.chars().count();
            if len > limit {
                return Err(Error::generation(format!("prompt of {len} chars exceeds context limit {limit}")));
            }
        }
        (self.f)(prompt)
    }

    fn context_limit(&self) -> Option<usize> {
        self.context_limit
    }
}

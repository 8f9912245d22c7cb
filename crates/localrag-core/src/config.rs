//! Configuration loader, typed settings and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars.
//! Nested keys in env vars are separated by `__`, e.g.
//! `APP_RETRIEVAL__TOP_K=5`.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::splitter::ChunkingConfig;
use crate::types::DistanceMetric;

pub const CONTEXT_PLACEHOLDER: &str = "{context}";
pub const QUESTION_PLACEHOLDER: &str = "{question}";

pub const DEFAULT_TEMPLATE: &str = "Answer the question using the context below.\n\nContext:\n{context}\n\nQuestion: {question}\n\nAnswer:";

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        Ok(Self { figment })
    }

    /// Wrap an already assembled figment.
    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::config(format!("failed to get '{key}': {e}")))
    }

    /// Typed settings layered over [`RagSettings::default`], validated.
    pub fn settings(&self) -> Result<RagSettings> {
        let settings: RagSettings = Figment::from(Serialized::defaults(RagSettings::default()))
            .merge(self.figment.clone())
            .extract()
            .map_err(|e| Error::config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RagSettings {
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalSettings,
    pub prompt: PromptSettings,
    pub generation: GenerationSettings,
    pub index: IndexSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub top_k: usize,
    pub metric: DistanceMetric,
    pub parallel_embedding: bool,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { top_k: 3, metric: DistanceMetric::L2, parallel_embedding: false }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSettings {
    pub template: String,
    pub delimiter: String,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self { template: DEFAULT_TEMPLATE.to_string(), delimiter: "\n".to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GenerationSettings {
    /// Upper bound on the characters of retrieved context put in a prompt.
    pub max_context_chars: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct IndexSettings {
    pub snapshot_path: Option<String>,
    /// Directory a relative `snapshot_path` is resolved against.
    pub base_dir: Option<String>,
}

impl IndexSettings {
    pub fn snapshot_path(&self) -> Option<PathBuf> {
        let path = self.snapshot_path.as_deref()?;
        Some(match self.base_dir.as_deref() {
            Some(base) => resolve_with_base(&expand_path(base), path),
            None => expand_path(path),
        })
    }
}

impl RagSettings {
    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;
        if self.retrieval.top_k == 0 {
            return Err(Error::config("retrieval.top_k must be at least 1"));
        }
        placeholder_offset(&self.prompt.template, CONTEXT_PLACEHOLDER)?;
        placeholder_offset(&self.prompt.template, QUESTION_PLACEHOLDER)?;
        Ok(())
    }
}

/// Byte offset of `placeholder` in `template`, which must contain it exactly once.
pub fn placeholder_offset(template: &str, placeholder: &str) -> Result<usize> {
    let mut hits = template.match_indices(placeholder).map(|(at, _)| at);
    match (hits.next(), hits.next()) {
        (Some(at), None) => Ok(at),
        (None, _) => Err(Error::config(format!("prompt template is missing {placeholder}"))),
        (Some(_), Some(_)) => Err(Error::config(format!("prompt template contains {placeholder} more than once"))),
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    // Expand env vars first
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    // Expand ~ at start
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}

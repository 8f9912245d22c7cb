//! Reads a directory of `.txt` files into [`Document`]s.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::types::Document;

#[derive(Debug, Default)]
pub struct DocumentLoader {
    limit: Option<usize>,
}

impl DocumentLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load at most `limit` files (after sorting by path).
    pub fn with_limit(limit: usize) -> Self {
        Self { limit: Some(limit) }
    }

    /// Every `.txt` file under `root`, sorted by path. The document id is the
    /// file stem; `path` and `category` (parent directory relative to `root`)
    /// are recorded as metadata.
    pub fn load_dir(&self, root: &Path) -> Result<Vec<Document>> {
        let mut files = list_txt_files(root);
        if files.is_empty() {
            info!(root = %root.display(), "no .txt files found");
            return Ok(vec![]);
        }
        if let Some(limit) = self.limit {
            files.truncate(limit);
        }

        let mut docs = Vec::with_capacity(files.len());
        for (i, path) in files.iter().enumerate() {
            debug!(file = %path.display(), "loading {}/{}", i + 1, files.len());
            let text = read_lossy(path)?;
            let id = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| path.to_string_lossy().to_string());
            docs.push(
                Document::new(id, text)
                    .with_meta("path", path.to_string_lossy())
                    .with_meta("category", category_for(path, root)),
            );
        }
        info!(root = %root.display(), documents = docs.len(), "loaded documents");
        Ok(docs)
    }
}

fn read_lossy(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(_) => Ok(String::from_utf8_lossy(&fs::read(path)?).to_string()),
    }
}

fn category_for(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    match relative.parent().and_then(|p| p.to_str()) {
        Some(parent) if !parent.is_empty() => parent.to_string(),
        _ => "misc".to_string(),
    }
}

fn list_txt_files(root: &Path) -> Vec<PathBuf> {
    let mut txt_files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(root = %root.display(), error = %err, "skipping unreadable entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("txt"))
        .collect();
    txt_files.sort();
    txt_files
}

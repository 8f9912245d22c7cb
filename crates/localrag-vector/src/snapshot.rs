//! JSON snapshots of a [`VectorIndex`].
//!
//! A snapshot stores the metric, the dimension and every entry in position
//! order, so a reloaded index answers searches identically.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use localrag_core::error::{Error, Result};
use localrag_core::types::DistanceMetric;

use crate::{IndexEntry, VectorIndex};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    metric: DistanceMetric,
    dim: Option<usize>,
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    pub fn to_json(&self) -> Result<Vec<u8>> {
        let snapshot = Snapshot {
            version: FORMAT_VERSION,
            metric: self.metric,
            dim: self.dim,
            entries: self.entries.clone(),
        };
        Ok(serde_json::to_vec(&snapshot)?)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_slice(bytes)?;
        if snapshot.version != FORMAT_VERSION {
            return Err(Error::Snapshot(format!("unsupported format version {}", snapshot.version)));
        }
        match snapshot.dim {
            None if !snapshot.entries.is_empty() => {
                return Err(Error::Snapshot("entries present but no dimension recorded".into()));
            }
            Some(0) => return Err(Error::Snapshot("dimension must be at least 1".into())),
            _ => {}
        }
        for (i, entry) in snapshot.entries.iter().enumerate() {
            if entry.position != i {
                return Err(Error::Snapshot(format!("entry {i} has position {}", entry.position)));
            }
            if let Some(dim) = snapshot.dim {
                if entry.embedding.len() != dim {
                    return Err(Error::DimensionMismatch { expected: dim, got: entry.embedding.len() });
                }
            }
        }
        // An empty snapshot carries no dimension; the next insert establishes it.
        let dim = if snapshot.entries.is_empty() { None } else { snapshot.dim };
        Ok(Self { metric: snapshot.metric, dim, entries: snapshot.entries })
    }

    /// Write the snapshot to `path`, replacing any existing file atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = self.to_json()?;
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| Error::Io(e.error))?;
        info!(path = %path.display(), entries = self.len(), "saved index snapshot");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let index = Self::from_json(&fs::read(path)?)?;
        info!(path = %path.display(), entries = index.len(), metric = ?index.metric, "loaded index snapshot");
        Ok(index)
    }
}

//! Model store (tag → file) and the caller-owned model cache.
//!
//! Layout: `{dir}/{tag}.json`
//!
//! The cache is keyed by [`ModelId`], so a model file rewritten under the same tag is
//! loaded fresh and replaces the stale entry. Cached models are immutable and shared
//! via `Arc`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;
use tracing::{debug, info};

use super::model::{Model, ModelSpec};
use super::ClassifierError;
use crate::domain::ModelId;

#[derive(Debug, Error)]
pub enum ModelStoreError {
    #[error("model tag must not be empty")]
    EmptyTag,

    #[error("model tag '{0}' contains a path separator")]
    InvalidTag(String),

    #[error("failed to read model {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("model file {path} is not valid UTF-8")]
    Encoding { path: PathBuf },

    #[error("invalid model {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: ClassifierError,
    },
}

/// Directory of JSON model files addressed by tag.
#[derive(Debug, Clone)]
pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `{dir}/{tag}.json`
    pub fn path_for(&self, tag: &str) -> Result<PathBuf, ModelStoreError> {
        if tag.is_empty() {
            return Err(ModelStoreError::EmptyTag);
        }
        if tag.contains(['/', '\\']) || tag == ".." {
            return Err(ModelStoreError::InvalidTag(tag.to_string()));
        }
        Ok(self.dir.join(format!("{tag}.json")))
    }

    /// Raw bytes of a model file.
    pub fn read(&self, tag: &str) -> Result<(PathBuf, Vec<u8>), ModelStoreError> {
        let path = self.path_for(tag)?;
        let bytes = fs::read(&path).map_err(|source| ModelStoreError::Io {
            path: path.clone(),
            source,
        })?;
        Ok((path, bytes))
    }

    /// Read, parse and validate the model stored under `tag`.
    pub fn load(&self, tag: &str) -> Result<Model, ModelStoreError> {
        let (path, bytes) = self.read(tag)?;
        let id = ModelId::from_content(tag, &bytes);
        parse_model(&path, id, &bytes)
    }
}

fn parse_model(path: &Path, id: ModelId, bytes: &[u8]) -> Result<Model, ModelStoreError> {
    let json = std::str::from_utf8(bytes).map_err(|_| ModelStoreError::Encoding {
        path: path.to_path_buf(),
    })?;
    let invalid = |source| ModelStoreError::Invalid {
        path: path.to_path_buf(),
        source,
    };
    let spec = ModelSpec::from_json(json).map_err(invalid)?;
    let model = Model::new(id, spec).map_err(invalid)?;
    debug!(
        model = %model.id(),
        kind = model.spec().kind(),
        path = %path.display(),
        "model loaded"
    );
    Ok(model)
}

/// Loaded models keyed by identity. Safe to share between threads.
#[derive(Debug, Default)]
pub struct ModelCache {
    entries: DashMap<ModelId, Arc<Model>>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached model for the file currently stored under `tag`, loading it
    /// on a miss. The file is always re-read to compute its identity.
    pub fn get_or_load(&self, store: &ModelStore, tag: &str) -> Result<Arc<Model>, ModelStoreError> {
        let (path, bytes) = store.read(tag)?;
        let id = ModelId::from_content(tag, &bytes);

        if let Some(model) = self.entries.get(&id) {
            debug!(model = %id, "model cache hit");
            return Ok(Arc::clone(model.value()));
        }

        let model = Arc::new(parse_model(&path, id.clone(), &bytes)?);
        let stale = self.invalidate(tag);
        if stale > 0 {
            info!(tag, stale, model = %id, "model file changed, replaced cached entry");
        }
        self.entries.insert(id, Arc::clone(&model));
        Ok(model)
    }

    /// Look up a model by exact identity.
    pub fn get(&self, id: &ModelId) -> Option<Arc<Model>> {
        self.entries.get(id).map(|m| Arc::clone(m.value()))
    }

    /// Drop every entry loaded under `tag`. Returns how many were removed.
    pub fn invalidate(&self, tag: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|id, _| id.tag != tag);
        before.saturating_sub(self.entries.len())
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

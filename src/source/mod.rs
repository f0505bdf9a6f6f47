//! Document source adapters.
//!
//! A source produces the parsed [`DatabaseDocument`] the resolver works on.
//! All variants share one contract: `load` parses at most once per adapter
//! lifetime and hands out the same cached structure afterwards.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing::info;

use crate::document::DatabaseDocument;
use crate::errors::DatabaseError;

/// Toolchain-recipe source implementation.
pub mod recipe;
pub use recipe::{CommandPathExtractor, RecipeSource, RecipeSourceConfig, SecondsToSamples};

/// Adapter contract: produce the parsed database document.
pub trait DocumentSource {
    /// Return the cached document, loading it on first access.
    fn load(&self) -> Result<&DatabaseDocument, DatabaseError>;
}

/// Source over an already-built in-memory document.
pub struct InMemorySource {
    document: DatabaseDocument,
}

impl InMemorySource {
    /// Wrap a prebuilt document.
    pub fn new(document: DatabaseDocument) -> Self {
        Self { document }
    }
}

impl DocumentSource for InMemorySource {
    fn load(&self) -> Result<&DatabaseDocument, DatabaseError> {
        Ok(&self.document)
    }
}

/// Source that parses a JSON database document from disk.
///
/// The file is read and parsed once; later calls return the cached parse.
pub struct JsonSource {
    path: PathBuf,
    cached: OnceLock<DatabaseDocument>,
}

impl JsonSource {
    /// Create a source for the document at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cached: OnceLock::new(),
        }
    }

    /// Path of the underlying document.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentSource for JsonSource {
    fn load(&self) -> Result<&DatabaseDocument, DatabaseError> {
        if let Some(document) = self.cached.get() {
            return Ok(document);
        }
        info!("loading database document {}", self.path.display());
        let raw = std::fs::read_to_string(&self.path)?;
        let document = serde_json::from_str(&raw).map_err(|source| DatabaseError::Json {
            path: self.path.clone(),
            source,
        })?;
        Ok(self.cached.get_or_init(|| document))
    }
}

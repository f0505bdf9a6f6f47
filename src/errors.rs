use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::{AliasName, DatasetName, ExampleId, SpeakerId};

/// Error type for document loading, dataset resolution, and length queries.
///
/// Only `MalformedDataset` is recoverable, and only inside the recipe
/// directory scan: the offending dataset is logged and skipped while the scan
/// of its siblings continues. Every other variant propagates to the caller.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("unknown dataset '{name}', close matches: {close_matches:?}")]
    NameNotFound {
        name: String,
        available: Vec<DatasetName>,
        close_matches: Vec<DatasetName>,
    },
    #[error("alias '{alias}' merges datasets sharing example ids: {duplicates:?}")]
    AliasConflict {
        alias: AliasName,
        duplicates: Vec<ExampleId>,
    },
    #[error("dataset '{name}' resolved to zero examples")]
    EmptyDataset { name: DatasetName },
    #[error("no dataset names requested, valid names: {available:?}")]
    NoNamesRequested { available: Vec<DatasetName> },
    #[error("malformed dataset at {path}: {reason}")]
    MalformedDataset { path: PathBuf, reason: String },
    #[error("speaker '{speaker_id}' not present in gender table {path}")]
    MissingGender { speaker_id: SpeakerId, path: PathBuf },
    #[error("key '{key}' not present in table {path}")]
    MissingEntry { key: String, path: PathBuf },
    #[error("example '{example_id}' is missing required field '{field}'")]
    MissingField {
        example_id: ExampleId,
        field: &'static str,
    },
    #[error("example '{example_id}' is already annotated with a different '{field}'")]
    AnnotationConflict {
        example_id: ExampleId,
        field: &'static str,
    },
    #[error("no length information available: {reason}")]
    LengthUnavailable { reason: String },
    #[error("failed to read audio at {path}: {reason}")]
    Audio { path: PathBuf, reason: String },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("failed to parse database document {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

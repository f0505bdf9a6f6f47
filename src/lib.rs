#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Audio-reading collaborator for on-demand sample counts.
pub mod audio;
/// Length-percentile bucket helpers.
pub mod buckets;
mod cache;
/// Centralized record keys and recipe-layout constants.
pub mod constants;
/// Database façade over sources, resolution, and sequences.
pub mod database;
/// Database document model and dataset resolution.
pub mod document;
/// Canonical example records and audio path trees.
pub mod record;
/// Lazy example sequences and concatenation.
pub mod sequence;
/// Document source adapters (in-memory, JSON, toolchain recipe).
pub mod source;
/// Input transports used by sources (line-oriented tables today).
pub mod transport;
/// Shared type aliases.
pub mod types;

mod errors;

pub use audio::{AudioReader, WavReader, add_num_samples};
pub use cache::WeakSequenceCache;
pub use database::Database;
pub use document::DatabaseDocument;
pub use errors::DatabaseError;
pub use record::{AudioPathTree, ExampleRecord};
pub use sequence::{ExampleSequence, SequenceSegment};
pub use source::{
    CommandPathExtractor, DocumentSource, InMemorySource, JsonSource, RecipeSource,
    RecipeSourceConfig, SecondsToSamples,
};
pub use types::{AliasName, DatasetName, ExampleId, SpeakerId, Transcription};

//! Database façade tying a document source to resolution and sequences.
//!
//! Ownership model:
//! - the source owns the parsed document for the database's lifetime;
//! - materialized segments are owned by the sequences handed out, the
//!   database itself only holds them weakly;
//! - a name is re-materialized only after every sequence referencing it has
//!   been dropped.

use std::fs;
use std::io::Write as _;
use std::path::Path;

use indexmap::IndexMap;
use tracing::debug;

use crate::buckets;
use crate::cache::WeakSequenceCache;
use crate::constants::keys;
use crate::document::DatabaseDocument;
use crate::errors::DatabaseError;
use crate::sequence::{ExampleSequence, SequenceSegment};
use crate::source::{DocumentSource, InMemorySource, JsonSource};
use crate::types::{DatasetName, ExampleId};

/// Uniform access to one speech corpus database.
///
/// Composes a [`DocumentSource`] with the dataset resolver, the weak
/// materialization cache, and the sequence compositor.
pub struct Database {
    source: Box<dyn DocumentSource>,
    sequences: WeakSequenceCache,
}

impl Database {
    /// Create a database over any document source.
    pub fn new(source: impl DocumentSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            sequences: WeakSequenceCache::new(),
        }
    }

    /// Create a database over a prebuilt in-memory document.
    pub fn from_document(document: DatabaseDocument) -> Self {
        Self::new(InMemorySource::new(document))
    }

    /// Create a database over a JSON document on disk.
    pub fn from_json_path(path: impl Into<std::path::PathBuf>) -> Self {
        Self::new(JsonSource::new(path))
    }

    /// Borrow the parsed document, loading it on first access.
    pub fn document(&self) -> Result<&DatabaseDocument, DatabaseError> {
        self.source.load()
    }

    /// All valid names, datasets first, then aliases, in document order.
    pub fn dataset_names(&self) -> Result<Vec<DatasetName>, DatabaseError> {
        Ok(self
            .document()?
            .dataset_names()
            .into_iter()
            .map(str::to_string)
            .collect())
    }

    /// Fetch the lazy sequence for one dataset name or alias.
    ///
    /// While a previously returned sequence for `name` is still referenced,
    /// this returns a sequence sharing the same materialization.
    pub fn get_dataset(&self, name: &str) -> Result<ExampleSequence, DatabaseError> {
        self.get_datasets(&[name])
    }

    /// Fetch one logical sequence concatenating several names in order.
    pub fn get_datasets(&self, names: &[&str]) -> Result<ExampleSequence, DatabaseError> {
        if names.is_empty() {
            return Err(DatabaseError::NoNamesRequested {
                available: self.dataset_names()?,
            });
        }
        let document = self.document()?;
        let mut parts = Vec::with_capacity(names.len());
        for name in names {
            let segment = self
                .sequences
                .get_or_build(name, || Self::materialize(document, name))?;
            parts.push(ExampleSequence::from_segment(segment));
        }
        Ok(ExampleSequence::concatenate(parts))
    }

    fn materialize(
        document: &DatabaseDocument,
        name: &str,
    ) -> Result<SequenceSegment, DatabaseError> {
        let resolved = document.resolve(name)?;
        debug!("materializing dataset '{}' ({} examples)", name, resolved.len());
        let mut examples = IndexMap::with_capacity(resolved.len());
        for (example_id, record) in resolved {
            let mut record = record.clone();
            record.annotate(example_id, name)?;
            examples.insert(example_id.to_string(), record);
        }
        Ok(SequenceSegment::new(name.to_string(), examples))
    }

    /// Per-example lengths for the given names, in sequence order.
    ///
    /// Reads each record's sample count (scalar or observation-map layout)
    /// and fails with `LengthUnavailable` on the first example that carries
    /// none.
    pub fn get_lengths(
        &self,
        names: &[&str],
    ) -> Result<IndexMap<ExampleId, u64>, DatabaseError> {
        self.get_lengths_with(names, |num_samples| num_samples)
    }

    /// Per-example lengths with a caller-supplied transform applied.
    pub fn get_lengths_with(
        &self,
        names: &[&str],
        transform: impl Fn(u64) -> u64,
    ) -> Result<IndexMap<ExampleId, u64>, DatabaseError> {
        let sequence = self.get_datasets(names)?;
        let mut lengths = IndexMap::with_capacity(sequence.len());
        for (example_id, example) in sequence.entries() {
            let num_samples = example.observation_num_samples().ok_or_else(|| {
                DatabaseError::LengthUnavailable {
                    reason: format!(
                        "example '{example_id}' carries no {}, add sample counts first",
                        keys::NUM_SAMPLES
                    ),
                }
            })?;
            lengths.insert(example_id.clone(), transform(num_samples));
        }
        Ok(lengths)
    }

    /// Length-percentile bucket boundaries for the given names.
    ///
    /// A single bucket needs no boundaries, so missing length information
    /// degrades to an empty result in that case; with more buckets it
    /// propagates as `LengthUnavailable`.
    pub fn bucket_boundaries(
        &self,
        names: &[&str],
        num_buckets: usize,
    ) -> Result<Vec<u64>, DatabaseError> {
        match self.get_lengths(names) {
            Ok(lengths) => Ok(buckets::bucket_boundaries(&lengths, num_buckets)),
            Err(DatabaseError::LengthUnavailable { .. }) if num_buckets <= 1 => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }

    /// Write `example_id transcription` lines for the given names.
    pub fn write_transcriptions(
        &self,
        path: &Path,
        names: &[&str],
    ) -> Result<(), DatabaseError> {
        let sequence = self.get_datasets(names)?;
        let mut out = fs::File::create(path)?;
        for (example_id, example) in sequence.entries() {
            let transcription =
                example
                    .transcription()
                    .ok_or_else(|| DatabaseError::MissingField {
                        example_id: example_id.clone(),
                        field: keys::TRANSCRIPTION,
                    })?;
            writeln!(out, "{example_id} {transcription}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn database() -> Database {
        let document: DatabaseDocument = serde_json::from_value(json!({
            "datasets": {
                "train": {
                    "u1": { "speaker_id": "s1", "num_samples": 100, "transcription": "ONE" },
                    "u2": { "speaker_id": "s2", "num_samples": 300, "transcription": "TWO" }
                },
                "test": {
                    "u3": { "speaker_id": "s3", "num_samples": 200, "transcription": "THREE" }
                }
            },
            "alias": { "all": ["train", "test"] }
        }))
        .unwrap();
        Database::from_document(document)
    }

    #[test]
    fn sequences_are_annotated_in_document_order() {
        let database = database();
        let sequence = database.get_dataset("train").unwrap();
        let ids: Vec<&str> = sequence.iter().filter_map(|r| r.example_id()).collect();
        assert_eq!(ids, vec!["u1", "u2"]);
        assert!(sequence.iter().all(|r| r.dataset_name() == Some("train")));
    }

    #[test]
    fn alias_examples_are_owned_by_the_alias_name() {
        let database = database();
        let sequence = database.get_dataset("all").unwrap();
        assert_eq!(sequence.len(), 3);
        assert!(sequence.iter().all(|r| r.dataset_name() == Some("all")));
    }

    #[test]
    fn repeated_fetches_share_materialization_while_referenced() {
        let database = database();
        let first = database.get_dataset("train").unwrap();
        let second = database.get_dataset("train").unwrap();
        assert!(first.ptr_eq(&second));

        drop(first);
        drop(second);
        let rebuilt = database.get_dataset("train").unwrap();
        let fourth = database.get_dataset("train").unwrap();
        assert!(rebuilt.ptr_eq(&fourth));
    }

    #[test]
    fn raw_document_records_stay_unannotated() {
        let database = database();
        let _sequence = database.get_dataset("train").unwrap();
        let raw = &database.document().unwrap().datasets["train"]["u1"];
        assert_eq!(raw.example_id(), None);
        assert_eq!(raw.dataset_name(), None);
    }

    #[test]
    fn lengths_and_bucket_boundaries_cover_requested_names() {
        let database = database();
        let lengths = database.get_lengths(&["train", "test"]).unwrap();
        let collected: Vec<(&str, u64)> = lengths
            .iter()
            .map(|(id, len)| (id.as_str(), *len))
            .collect();
        assert_eq!(collected, vec![("u1", 100), ("u2", 300), ("u3", 200)]);

        let halved = database
            .get_lengths_with(&["train"], |samples| samples / 2)
            .unwrap();
        assert_eq!(halved["u1"], 50);

        let boundaries = database.bucket_boundaries(&["all"], 2).unwrap();
        assert_eq!(boundaries, vec![200]);
    }

    #[test]
    fn missing_lengths_degrade_only_for_a_single_bucket() {
        let document: DatabaseDocument = serde_json::from_value(json!({
            "datasets": { "train": { "u1": { "speaker_id": "s1" } } }
        }))
        .unwrap();
        let database = Database::from_document(document);
        assert!(database.bucket_boundaries(&["train"], 1).unwrap().is_empty());
        let err = database.bucket_boundaries(&["train"], 4).unwrap_err();
        assert!(matches!(err, DatabaseError::LengthUnavailable { .. }));
    }

    #[test]
    fn empty_name_list_is_rejected_with_valid_names() {
        let err = database().get_datasets(&[]).unwrap_err();
        match err {
            DatabaseError::NoNamesRequested { available } => {
                assert!(available.contains(&"train".to_string()));
                assert!(available.contains(&"all".to_string()));
            }
            other => panic!("expected NoNamesRequested, got {other:?}"),
        }
    }

    #[test]
    fn write_transcriptions_emits_one_line_per_example() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("text");
        database().write_transcriptions(&path, &["train"]).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "u1 ONE\nu2 TWO\n");
    }
}

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::keys;
use crate::errors::DatabaseError;

/// Canonical per-example metadata record.
///
/// A record is an ordered mapping from semantic keys (audio path tree,
/// speaker id, transcription, ...) to JSON values, in the order the producing
/// document declared them. Normalization inserts [`keys::EXAMPLE_ID`] and
/// [`keys::DATASET_NAME`]; everything else passes through untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExampleRecord {
    fields: Map<String, Value>,
}

impl ExampleRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a record from an already-built field map.
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Borrow the underlying field map.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Look up a field value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Insert a field value, returning any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(key.into(), value)
    }

    /// Returns `true` when the record carries `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Example identifier inserted during normalization.
    pub fn example_id(&self) -> Option<&str> {
        self.str_field(keys::EXAMPLE_ID)
    }

    /// Owning dataset name inserted during normalization.
    pub fn dataset_name(&self) -> Option<&str> {
        self.str_field(keys::DATASET_NAME)
    }

    /// Speaker identifier field.
    pub fn speaker_id(&self) -> Option<&str> {
        self.str_field(keys::SPEAKER_ID)
    }

    /// Speaker gender field.
    pub fn gender(&self) -> Option<&str> {
        self.str_field(keys::GENDER)
    }

    /// Transcription text field.
    pub fn transcription(&self) -> Option<&str> {
        self.str_field(keys::TRANSCRIPTION)
    }

    /// Sample count of the observation signal.
    ///
    /// Handles both layouts: a scalar `num_samples`, or a per-signal map
    /// whose `observation` entry carries the count.
    pub fn observation_num_samples(&self) -> Option<u64> {
        match self.fields.get(keys::NUM_SAMPLES)? {
            Value::Number(count) => count.as_u64(),
            Value::Object(per_signal) => per_signal.get(keys::OBSERVATION)?.as_u64(),
            _ => None,
        }
    }

    /// Structural view over the audio path entry for `signal`
    /// (for example [`keys::OBSERVATION`]).
    pub fn audio_path(&self, signal: &str) -> Option<AudioPathTree> {
        let tree = self.fields.get(keys::AUDIO_PATH)?.as_object()?;
        AudioPathTree::from_value(tree.get(signal)?)
    }

    /// Tag this record with its example identifier and owning dataset name.
    ///
    /// Both insertions are in-place and idempotent. A pre-existing value that
    /// differs from the one being set is a caller error.
    pub fn annotate(&mut self, example_id: &str, dataset_name: &str) -> Result<(), DatabaseError> {
        self.set_annotation(keys::EXAMPLE_ID, example_id, example_id)?;
        self.set_annotation(keys::DATASET_NAME, dataset_name, example_id)
    }

    fn set_annotation(
        &mut self,
        field: &'static str,
        value: &str,
        example_id: &str,
    ) -> Result<(), DatabaseError> {
        match self.fields.get(field) {
            None => {
                self.fields
                    .insert(field.to_string(), Value::String(value.to_string()));
                Ok(())
            }
            Some(Value::String(existing)) if existing == value => Ok(()),
            Some(_) => Err(DatabaseError::AnnotationConflict {
                example_id: example_id.to_string(),
                field,
            }),
        }
    }
}

/// Structural view over one audio path entry of a record.
///
/// Lists stack positionally in exactly the producer's order. Maps keep their
/// labels because channel numbering may be sparse (`c0`, `c99`); they are
/// never coerced into a list.
#[derive(Clone, Debug, PartialEq)]
pub enum AudioPathTree {
    /// A single audio path.
    Single(String),
    /// An ordered per-channel/per-speaker list, stacked positionally.
    Stacked(Vec<AudioPathTree>),
    /// A labeled channel map with possibly non-contiguous labels.
    Labeled(IndexMap<String, AudioPathTree>),
}

impl AudioPathTree {
    /// Interpret a JSON value as an audio path tree.
    ///
    /// Returns `None` for values that are not a string, list, or map of
    /// paths; validation beyond that structure is not performed here.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(path) => Some(Self::Single(path.clone())),
            Value::Array(entries) => entries
                .iter()
                .map(Self::from_value)
                .collect::<Option<Vec<_>>>()
                .map(Self::Stacked),
            Value::Object(entries) => entries
                .iter()
                .map(|(label, entry)| Some((label.clone(), Self::from_value(entry)?)))
                .collect::<Option<IndexMap<_, _>>>()
                .map(Self::Labeled),
            _ => None,
        }
    }

    /// First path in tree order, if any.
    pub fn first_path(&self) -> Option<&str> {
        match self {
            Self::Single(path) => Some(path),
            Self::Stacked(entries) => entries.iter().find_map(Self::first_path),
            Self::Labeled(entries) => entries.values().find_map(Self::first_path),
        }
    }

    /// All paths flattened in tree order.
    pub fn paths(&self) -> Vec<&str> {
        let mut collected = Vec::new();
        self.collect_paths(&mut collected);
        collected
    }

    fn collect_paths<'a>(&'a self, collected: &mut Vec<&'a str>) {
        match self {
            Self::Single(path) => collected.push(path),
            Self::Stacked(entries) => {
                for entry in entries {
                    entry.collect_paths(collected);
                }
            }
            Self::Labeled(entries) => {
                for entry in entries.values() {
                    entry.collect_paths(collected);
                }
            }
        }
    }
}

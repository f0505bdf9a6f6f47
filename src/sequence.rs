//! Lazy example sequences and concatenation.
//!
//! A sequence is a list of shared segments; a segment owns the resolved,
//! annotated examples of one dataset name. Iteration walks segments in order
//! without copying records, and calling `iter` again restarts every
//! constituent from its beginning.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::record::ExampleRecord;
use crate::types::{DatasetName, ExampleId};

/// Resolved, annotated examples of one dataset name.
///
/// Segments are immutable once built and shared by reference between every
/// sequence that includes them.
#[derive(Debug)]
pub struct SequenceSegment {
    name: DatasetName,
    examples: IndexMap<ExampleId, ExampleRecord>,
}

impl SequenceSegment {
    /// Build a segment from already-annotated examples.
    pub fn new(name: DatasetName, examples: IndexMap<ExampleId, ExampleRecord>) -> Self {
        Self { name, examples }
    }

    /// Dataset name (or alias) this segment was materialized through.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of examples in this segment.
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    /// Returns `true` when the segment has no examples.
    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Look up one example by id.
    pub fn get(&self, example_id: &str) -> Option<&ExampleRecord> {
        self.examples.get(example_id)
    }

    /// Iterate `(example_id, record)` pairs in materialization order.
    pub fn entries(&self) -> impl Iterator<Item = (&ExampleId, &ExampleRecord)> {
        self.examples.iter()
    }
}

/// Immutable, restartable, order-preserving sequence over example records.
///
/// Cloning a sequence is cheap: segments are shared, never copied. Element
/// access is deferred until iteration reaches it.
#[derive(Clone, Debug, Default)]
pub struct ExampleSequence {
    segments: Vec<Arc<SequenceSegment>>,
}

impl ExampleSequence {
    /// Wrap a single shared segment.
    pub fn from_segment(segment: Arc<SequenceSegment>) -> Self {
        Self {
            segments: vec![segment],
        }
    }

    /// Concatenate sequences into one logical sequence.
    ///
    /// Yields all elements of the first sequence, then the second, and so on.
    /// Nothing is materialized here; restarting the result restarts all
    /// constituents.
    pub fn concatenate(sequences: impl IntoIterator<Item = ExampleSequence>) -> Self {
        Self {
            segments: sequences
                .into_iter()
                .flat_map(|sequence| sequence.segments)
                .collect(),
        }
    }

    /// Total number of examples across all segments.
    pub fn len(&self) -> usize {
        self.segments.iter().map(|segment| segment.len()).sum()
    }

    /// Returns `true` when no segment carries examples.
    pub fn is_empty(&self) -> bool {
        self.segments.iter().all(|segment| segment.is_empty())
    }

    /// Iterate records in segment order. Calling this again restarts.
    pub fn iter(&self) -> impl Iterator<Item = &ExampleRecord> {
        self.segments
            .iter()
            .flat_map(|segment| segment.entries().map(|(_, record)| record))
    }

    /// Iterate `(example_id, record)` pairs in segment order.
    pub fn entries(&self) -> impl Iterator<Item = (&ExampleId, &ExampleRecord)> {
        self.segments.iter().flat_map(|segment| segment.entries())
    }

    /// Look up one example by id, searching segments in order.
    pub fn get(&self, example_id: &str) -> Option<&ExampleRecord> {
        self.segments
            .iter()
            .find_map(|segment| segment.get(example_id))
    }

    /// Names of the constituent segments, in order.
    pub fn segment_names(&self) -> Vec<&str> {
        self.segments.iter().map(|segment| segment.name()).collect()
    }

    /// Lookup table from segment name to its single-segment sequence.
    ///
    /// Lets downstream length/statistics queries retrieve a named subset
    /// without re-resolving. The first segment wins on duplicate names.
    pub fn index_by_name(&self) -> IndexMap<DatasetName, ExampleSequence> {
        let mut index: IndexMap<DatasetName, ExampleSequence> = IndexMap::new();
        for segment in &self.segments {
            index
                .entry(segment.name().to_string())
                .or_insert_with(|| ExampleSequence::from_segment(Arc::clone(segment)));
        }
        index
    }

    /// Returns `true` when both sequences share the same segment storage.
    ///
    /// This is identity equality (shared materialization), not value
    /// equality.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|(left, right)| Arc::ptr_eq(left, right))
    }
}

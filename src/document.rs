//! Database document model and dataset name resolution.
//!
//! Ownership model:
//! - the document owns every raw example record;
//! - `resolve` hands out borrowed views, never record copies;
//! - materialization into sequences (cloning + annotation) happens in
//!   [`crate::database::Database`], outside this module.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::constants::resolver::CLOSE_MATCH_LIMIT;
use crate::errors::DatabaseError;
use crate::record::ExampleRecord;
use crate::types::{AliasName, DatasetName, ExampleId};

/// Parsed top-level database document.
///
/// Both sections keep the producer's declared order; this core never
/// re-sorts on load. Producers should emit keys in natural sort order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DatabaseDocument {
    /// Dataset name to example id to raw record.
    #[serde(default)]
    pub datasets: IndexMap<DatasetName, IndexMap<ExampleId, ExampleRecord>>,
    /// Alias name to the ordered list of dataset names it merges.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub alias: IndexMap<AliasName, Vec<DatasetName>>,
}

impl DatabaseDocument {
    /// All valid names, datasets first, then aliases, in document order.
    pub fn dataset_names(&self) -> Vec<&str> {
        self.datasets
            .keys()
            .chain(self.alias.keys())
            .map(String::as_str)
            .collect()
    }

    /// Resolve `name` into its example mapping.
    ///
    /// A direct dataset name borrows the stored mapping. An alias merges its
    /// underlying datasets in declared order and fails on any example id
    /// shared between them. Unknown names fail with ranked close-match
    /// suggestions; resolving to zero examples is an error.
    pub fn resolve<'a>(
        &'a self,
        name: &str,
    ) -> Result<IndexMap<&'a str, &'a ExampleRecord>, DatabaseError> {
        let resolved = if let Some(members) = self.alias.get(name) {
            self.merge_alias(name, members)?
        } else if let Some(examples) = self.datasets.get(name) {
            examples
                .iter()
                .map(|(example_id, record)| (example_id.as_str(), record))
                .collect()
        } else {
            return Err(self.unknown_name(name));
        };
        if resolved.is_empty() {
            return Err(DatabaseError::EmptyDataset {
                name: name.to_string(),
            });
        }
        Ok(resolved)
    }

    fn merge_alias<'a>(
        &'a self,
        alias: &str,
        members: &[DatasetName],
    ) -> Result<IndexMap<&'a str, &'a ExampleRecord>, DatabaseError> {
        let mut merged: IndexMap<&str, &ExampleRecord> = IndexMap::new();
        for member in members {
            let examples = self
                .datasets
                .get(member)
                .ok_or_else(|| self.unknown_name(member))?;
            let duplicates: Vec<ExampleId> = examples
                .keys()
                .filter(|example_id| merged.contains_key(example_id.as_str()))
                .cloned()
                .collect();
            if !duplicates.is_empty() {
                return Err(DatabaseError::AliasConflict {
                    alias: alias.to_string(),
                    duplicates,
                });
            }
            for (example_id, record) in examples {
                merged.insert(example_id.as_str(), record);
            }
        }
        Ok(merged)
    }

    fn unknown_name(&self, name: &str) -> DatabaseError {
        let available: Vec<DatasetName> = self
            .dataset_names()
            .iter()
            .map(|valid| valid.to_string())
            .collect();
        DatabaseError::NameNotFound {
            name: name.to_string(),
            close_matches: close_matches(name, &available),
            available,
        }
    }
}

/// Rank `candidates` by similarity to `name` and keep the closest few.
///
/// No similarity cutoff is applied; a short candidate list is returned whole,
/// ranked, which keeps error messages useful even for wild typos.
pub fn close_matches(name: &str, candidates: &[DatasetName]) -> Vec<DatasetName> {
    let mut scored: Vec<(f64, &str)> = candidates
        .iter()
        .map(|candidate| (strsim::jaro_winkler(name, candidate), candidate.as_str()))
        .collect();
    scored.sort_by(|left, right| right.0.total_cmp(&left.0).then_with(|| left.1.cmp(&right.1)));
    scored
        .into_iter()
        .take(CLOSE_MATCH_LIMIT)
        .map(|(_, candidate)| candidate.to_string())
        .collect()
}

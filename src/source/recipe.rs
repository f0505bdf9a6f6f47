//! Source over a toolchain recipe directory layout.
//!
//! Expected layout under the recipe root:
//!
//! ```text
//! <root>/data/<dataset>/wav.scp
//!                       utt2spk
//!                       text
//!                       spk2gender   (optional)
//!                       utt2dur      (optional, needed for bucketing)
//! ```
//!
//! One record is built per `wav.scp` entry. A dataset whose `wav.scp` names
//! an example missing from `utt2spk` is unusable without speaker identity:
//! it is logged and skipped whole while the scan of its siblings continues.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use indexmap::IndexMap;
use serde_json::{Map, Value, json};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::constants::{keys, recipe};
use crate::document::DatabaseDocument;
use crate::errors::DatabaseError;
use crate::record::ExampleRecord;
use crate::source::DocumentSource;
use crate::transport::lines::{load_keyed_lines, load_keyed_token_lines};
use crate::types::ExampleId;

/// Resolves the effective audio path from a tokenized `wav.scp` entry.
///
/// Entries with more than one token are command pipelines producing audio
/// rather than bare paths; the policy decides which token is the path.
pub type CommandPathExtractor = Arc<dyn Fn(&[String]) -> Option<String> + Send + Sync>;

/// Converts a duration in seconds into a sample count.
pub type SecondsToSamples = Arc<dyn Fn(f64) -> u64 + Send + Sync>;

/// Default command-path policy.
///
/// A bare path passes through. A pipeline entry resolves to its second-to-last
/// token, where toolchain command lines usually keep the input file. This is a
/// heuristic; override it per toolchain via
/// [`RecipeSourceConfig::with_command_path_extractor`] when it does not hold.
pub fn second_to_last_token(tokens: &[String]) -> Option<String> {
    match tokens {
        [] => None,
        [path] => Some(path.clone()),
        [.., path, _] => Some(path.clone()),
    }
}

/// Configuration for a toolchain-recipe source.
#[derive(Clone)]
pub struct RecipeSourceConfig {
    /// Recipe root containing the `data/` directory.
    pub root: PathBuf,
    /// Policy mapping a tokenized `wav.scp` entry to the effective path.
    pub command_path_extractor: CommandPathExtractor,
    /// Optional seconds-to-samples transform applied to `utt2dur` entries.
    ///
    /// Without it (or without `utt2dur` files) the document carries no
    /// length information and length queries fail until sample counts are
    /// added another way.
    pub length_transform: Option<SecondsToSamples>,
}

impl RecipeSourceConfig {
    /// Create a config for the recipe rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            command_path_extractor: Arc::new(second_to_last_token),
            length_transform: None,
        }
    }

    /// Override the command-path policy.
    pub fn with_command_path_extractor(mut self, extractor: CommandPathExtractor) -> Self {
        self.command_path_extractor = extractor;
        self
    }

    /// Supply the seconds-to-samples transform used to fold `utt2dur`
    /// durations into per-example sample counts.
    pub fn with_length_transform(mut self, transform: SecondsToSamples) -> Self {
        self.length_transform = Some(transform);
        self
    }
}

/// Source that scans a recipe directory into a database document.
pub struct RecipeSource {
    config: RecipeSourceConfig,
    cached: OnceLock<DatabaseDocument>,
}

impl RecipeSource {
    /// Create a recipe source from configuration.
    pub fn new(config: RecipeSourceConfig) -> Self {
        Self {
            config,
            cached: OnceLock::new(),
        }
    }

    /// Recipe root this source scans.
    pub fn root(&self) -> &Path {
        &self.config.root
    }

    fn scan(&self) -> Result<DatabaseDocument, DatabaseError> {
        if !self.config.root.is_dir() {
            return Err(DatabaseError::MalformedDataset {
                path: self.config.root.clone(),
                reason: "recipe root is not a directory".to_string(),
            });
        }
        let data_root = self.config.root.join(recipe::DATA_DIR);
        let mut document = DatabaseDocument::default();
        for entry in WalkDir::new(&data_root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_dir())
        {
            let dataset_path = entry.path();
            if !dataset_path.join(recipe::WAV_SCP).is_file() {
                continue;
            }
            let dataset_name = entry.file_name().to_string_lossy().to_string();
            match self.dataset_examples(dataset_path) {
                Ok(examples) => {
                    document.datasets.insert(dataset_name, examples);
                }
                Err(DatabaseError::MalformedDataset { path, reason }) => {
                    warn!(
                        "skipping malformed dataset at {}: {}",
                        path.display(),
                        reason
                    );
                }
                Err(other) => return Err(other),
            }
        }
        Ok(document)
    }

    fn dataset_examples(
        &self,
        dataset_path: &Path,
    ) -> Result<IndexMap<ExampleId, ExampleRecord>, DatabaseError> {
        let scp = load_keyed_token_lines(&dataset_path.join(recipe::WAV_SCP))?;
        let utt2spk = load_keyed_lines(&dataset_path.join(recipe::UTT2SPK))?;
        let text_path = dataset_path.join(recipe::TEXT);
        let text = load_keyed_lines(&text_path)?;
        let gender_path = dataset_path.join(recipe::SPK2GENDER);
        let spk2gender = if gender_path.is_file() {
            Some(load_keyed_lines(&gender_path)?)
        } else {
            None
        };

        let mut examples = IndexMap::with_capacity(scp.len());
        for (example_id, tokens) in &scp {
            let audio_path = (self.config.command_path_extractor)(tokens).ok_or_else(|| {
                DatabaseError::MalformedDataset {
                    path: dataset_path.to_path_buf(),
                    reason: format!("wav.scp entry for '{example_id}' has no path"),
                }
            })?;
            let Some(speaker_id) = utt2spk.get(example_id) else {
                return Err(DatabaseError::MalformedDataset {
                    path: dataset_path.to_path_buf(),
                    reason: format!("example id '{example_id}' not found in utt2spk"),
                });
            };
            let transcription =
                text.get(example_id)
                    .ok_or_else(|| DatabaseError::MissingEntry {
                        key: example_id.clone(),
                        path: text_path.clone(),
                    })?;

            let mut fields = Map::new();
            fields.insert(
                keys::AUDIO_PATH.to_string(),
                json!({ keys::OBSERVATION: audio_path }),
            );
            fields.insert(
                keys::SPEAKER_ID.to_string(),
                Value::String(speaker_id.clone()),
            );
            if let Some(gender_table) = &spk2gender {
                // Incomplete gender tables fail loudly; a present table is a
                // promise of coverage.
                let gender =
                    gender_table
                        .get(speaker_id)
                        .ok_or_else(|| DatabaseError::MissingGender {
                            speaker_id: speaker_id.clone(),
                            path: gender_path.clone(),
                        })?;
                fields.insert(keys::GENDER.to_string(), Value::String(gender.clone()));
            }
            fields.insert(
                keys::TRANSCRIPTION.to_string(),
                Value::String(transcription.clone()),
            );
            examples.insert(example_id.clone(), ExampleRecord::from_fields(fields));
        }
        Ok(examples)
    }

    /// Fold `utt2dur`-derived sample counts into the scanned document.
    ///
    /// All-or-nothing: if the transform is missing, or any dataset lacks its
    /// `utt2dur` file, the document is left without length information and a
    /// warning is logged. Length queries then fail with `LengthUnavailable`
    /// until counts are added another way.
    fn fold_in_lengths(&self, document: &mut DatabaseDocument) -> Result<(), DatabaseError> {
        let Some(transform) = &self.config.length_transform else {
            warn!("no length transform configured, sample counts not added to recipe document");
            return Ok(());
        };
        let data_root = self.config.root.join(recipe::DATA_DIR);
        let mut durations: IndexMap<ExampleId, f64> = IndexMap::new();
        for dataset_name in document.datasets.keys() {
            let utt2dur_path = data_root.join(dataset_name).join(recipe::UTT2DUR);
            if !utt2dur_path.is_file() {
                warn!(
                    "utt2dur missing for dataset '{}', sample counts not added",
                    dataset_name
                );
                return Ok(());
            }
            for (example_id, value) in load_keyed_lines(&utt2dur_path)? {
                let seconds =
                    value
                        .parse::<f64>()
                        .map_err(|_| DatabaseError::MalformedDataset {
                            path: utt2dur_path.clone(),
                            reason: format!("unparseable duration '{value}' for '{example_id}'"),
                        })?;
                durations.insert(example_id, seconds);
            }
        }
        for (dataset_name, examples) in &mut document.datasets {
            let utt2dur_path = data_root.join(dataset_name).join(recipe::UTT2DUR);
            for (example_id, record) in examples {
                let seconds =
                    durations
                        .get(example_id)
                        .ok_or_else(|| DatabaseError::MissingEntry {
                            key: example_id.clone(),
                            path: utt2dur_path.clone(),
                        })?;
                record.insert(keys::NUM_SAMPLES, Value::from(transform(*seconds)));
            }
        }
        Ok(())
    }
}

impl DocumentSource for RecipeSource {
    fn load(&self) -> Result<&DatabaseDocument, DatabaseError> {
        if let Some(document) = self.cached.get() {
            return Ok(document);
        }
        info!("scanning toolchain recipe at {}", self.config.root.display());
        let mut document = self.scan()?;
        self.fold_in_lengths(&mut document)?;
        Ok(self.cached.get_or_init(|| document))
    }
}

/// Unique example identifier within a dataset (usually an utterance id).
/// Example: `dt_simu_c0123`
pub type ExampleId = String;
/// Name of a dataset inside a database document (one split purpose).
/// Examples: `train_si284`, `dev_93`, `test_eval92`
pub type DatasetName = String;
/// Virtual dataset name defined as the union of several dataset names.
/// Example: `train_dev`
pub type AliasName = String;
/// Speaker identifier attached to an example.
/// Example: `011`
pub type SpeakerId = String;
/// Word-level transcription text of an example.
/// Example: `THE SALE OF THE HOTELS`
pub type Transcription = String;

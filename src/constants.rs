/// Canonical record field keys shared by sources, normalization, and queries.
pub mod keys {
    /// Example identifier field inserted during normalization.
    pub const EXAMPLE_ID: &str = "example_id";
    /// Owning dataset name field inserted during normalization.
    pub const DATASET_NAME: &str = "dataset_name";
    /// Nested audio path tree (signal name to path, list, or channel map).
    pub const AUDIO_PATH: &str = "audio_path";
    /// Signal name of the recorded observation inside the audio path tree.
    pub const OBSERVATION: &str = "observation";
    /// Speaker identifier field.
    pub const SPEAKER_ID: &str = "speaker_id";
    /// Speaker gender field.
    pub const GENDER: &str = "gender";
    /// Transcription text field.
    pub const TRANSCRIPTION: &str = "transcription";
    /// Sample count field (scalar, or a map carrying an observation entry).
    pub const NUM_SAMPLES: &str = "num_samples";
}

/// File layout of a toolchain recipe directory.
pub mod recipe {
    /// Directory under the recipe root holding per-dataset subdirectories.
    pub const DATA_DIR: &str = "data";
    /// Audio path table: `<example id> <path or command pipeline>`.
    pub const WAV_SCP: &str = "wav.scp";
    /// Speaker table: `<example id> <speaker id>`.
    pub const UTT2SPK: &str = "utt2spk";
    /// Transcription table: `<example id> <transcription>`.
    pub const TEXT: &str = "text";
    /// Optional gender table: `<speaker id> <m/f>`.
    pub const SPK2GENDER: &str = "spk2gender";
    /// Optional duration table: `<example id> <seconds>`.
    pub const UTT2DUR: &str = "utt2dur";
}

/// Constants used by dataset name resolution.
pub mod resolver {
    /// Number of ranked close matches attached to unknown-name errors.
    pub const CLOSE_MATCH_LIMIT: usize = 5;
}

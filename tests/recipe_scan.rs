use std::fs;
use std::path::Path;
use std::sync::Arc;

use tempfile::{TempDir, tempdir};

use corpora::{Database, DatabaseError, DocumentSource, RecipeSource, RecipeSourceConfig};

fn write_dataset(root: &Path, name: &str, files: &[(&str, &str)]) {
    let dataset = root.join("data").join(name);
    fs::create_dir_all(&dataset).unwrap();
    for (file, content) in files {
        fs::write(dataset.join(file), content).unwrap();
    }
}

fn recipe_with_two_datasets() -> TempDir {
    let temp = tempdir().unwrap();
    write_dataset(
        temp.path(),
        "dev_clean",
        &[
            ("wav.scp", "u3 /audio/u3.wav\n"),
            ("utt2spk", "u3 spk_c\n"),
            ("text", "u3 GOOD MORNING\n"),
        ],
    );
    write_dataset(
        temp.path(),
        "train_clean",
        &[
            (
                "wav.scp",
                "u1 /audio/u1.wav\nu2 sph2pipe -f wav /audio/u2.sph |\n",
            ),
            ("utt2spk", "u1 spk_a\nu2 spk_b\n"),
            ("text", "u1 HELLO WORLD\nu2 THE SALE OF THE HOTELS\n"),
            ("spk2gender", "spk_a m\nspk_b f\n"),
        ],
    );
    temp
}

#[test]
fn scan_builds_records_from_line_tables() {
    let temp = recipe_with_two_datasets();
    let source = RecipeSource::new(RecipeSourceConfig::new(temp.path()));
    let document = source.load().unwrap();

    assert_eq!(document.dataset_names(), vec!["dev_clean", "train_clean"]);
    let train = &document.datasets["train_clean"];
    assert_eq!(train["u1"].speaker_id(), Some("spk_a"));
    assert_eq!(train["u1"].gender(), Some("m"));
    assert_eq!(train["u1"].transcription(), Some("HELLO WORLD"));
    assert_eq!(
        train["u1"].audio_path("observation").unwrap().paths(),
        vec!["/audio/u1.wav"]
    );
    // No spk2gender table for dev_clean, so no gender field.
    assert_eq!(document.datasets["dev_clean"]["u3"].gender(), None);
}

#[test]
fn command_pipeline_entries_use_the_second_to_last_token() {
    let temp = recipe_with_two_datasets();
    let source = RecipeSource::new(RecipeSourceConfig::new(temp.path()));
    let document = source.load().unwrap();
    assert_eq!(
        document.datasets["train_clean"]["u2"]
            .audio_path("observation")
            .unwrap()
            .paths(),
        vec!["/audio/u2.sph"]
    );
}

#[test]
fn command_path_policy_is_overridable() {
    let temp = recipe_with_two_datasets();
    let config = RecipeSourceConfig::new(temp.path())
        .with_command_path_extractor(Arc::new(|tokens| tokens.first().cloned()));
    let document = RecipeSource::new(config).load().unwrap().clone();
    assert_eq!(
        document.datasets["train_clean"]["u2"]
            .audio_path("observation")
            .unwrap()
            .paths(),
        vec!["sph2pipe"]
    );
}

#[test]
fn dataset_missing_speaker_entries_is_skipped_whole() {
    let temp = recipe_with_two_datasets();
    write_dataset(
        temp.path(),
        "broken",
        &[
            ("wav.scp", "u8 /audio/u8.wav\nu9 /audio/u9.wav\n"),
            ("utt2spk", "u8 spk_z\n"),
            ("text", "u8 EIGHT\nu9 NINE\n"),
        ],
    );

    let source = RecipeSource::new(RecipeSourceConfig::new(temp.path()));
    let document = source.load().unwrap();

    // Not partially included: the whole dataset is gone, siblings survive.
    assert_eq!(document.dataset_names(), vec!["dev_clean", "train_clean"]);
}

#[test]
fn incomplete_gender_table_fails_the_scan() {
    let temp = tempdir().unwrap();
    write_dataset(
        temp.path(),
        "train",
        &[
            ("wav.scp", "u1 /audio/u1.wav\n"),
            ("utt2spk", "u1 spk_a\n"),
            ("text", "u1 ONE\n"),
            ("spk2gender", "spk_other m\n"),
        ],
    );
    let err = RecipeSource::new(RecipeSourceConfig::new(temp.path()))
        .load()
        .unwrap_err();
    assert!(
        matches!(err, DatabaseError::MissingGender { speaker_id, .. } if speaker_id == "spk_a")
    );
}

#[test]
fn durations_become_sample_counts_through_the_transform() {
    let temp = recipe_with_two_datasets();
    write_dataset(temp.path(), "dev_clean", &[("utt2dur", "u3 1.5\n")]);
    write_dataset(
        temp.path(),
        "train_clean",
        &[("utt2dur", "u1 2.0\nu2 0.25\n")],
    );

    let config = RecipeSourceConfig::new(temp.path())
        .with_length_transform(Arc::new(|seconds| (seconds * 16_000.0) as u64));
    let database = Database::new(RecipeSource::new(config));

    let lengths = database
        .get_lengths(&["train_clean", "dev_clean"])
        .unwrap();
    let collected: Vec<(&str, u64)> = lengths
        .iter()
        .map(|(id, len)| (id.as_str(), *len))
        .collect();
    assert_eq!(
        collected,
        vec![("u1", 32_000), ("u2", 4_000), ("u3", 24_000)]
    );

    let boundaries = database
        .bucket_boundaries(&["train_clean", "dev_clean"], 2)
        .unwrap();
    assert_eq!(boundaries, vec![24_000]);
}

#[test]
fn missing_duration_files_degrade_to_no_length_information() {
    let temp = recipe_with_two_datasets();
    // Transform supplied, but no utt2dur files anywhere.
    let config = RecipeSourceConfig::new(temp.path())
        .with_length_transform(Arc::new(|seconds| (seconds * 8_000.0) as u64));
    let database = Database::new(RecipeSource::new(config));

    let sequence = database.get_dataset("train_clean").unwrap();
    assert_eq!(sequence.len(), 2);

    let err = database.get_lengths(&["train_clean"]).unwrap_err();
    assert!(matches!(err, DatabaseError::LengthUnavailable { .. }));
    assert!(
        database
            .bucket_boundaries(&["train_clean"], 1)
            .unwrap()
            .is_empty()
    );
}

#[test]
fn recipe_database_resolves_names_with_suggestions() {
    let temp = recipe_with_two_datasets();
    let database = Database::new(RecipeSource::new(RecipeSourceConfig::new(temp.path())));

    let names = database.dataset_names().unwrap();
    assert_eq!(names, vec!["dev_clean", "train_clean"]);

    let err = database.get_dataset("train_clea").unwrap_err();
    let DatabaseError::NameNotFound { close_matches, .. } = err else {
        panic!("expected NameNotFound");
    };
    assert_eq!(
        close_matches.first().map(String::as_str),
        Some("train_clean")
    );
}

#[test]
fn nonexistent_recipe_root_is_malformed() {
    let temp = tempdir().unwrap();
    let missing = temp.path().join("no_such_recipe");
    let err = RecipeSource::new(RecipeSourceConfig::new(&missing))
        .load()
        .unwrap_err();
    assert!(matches!(err, DatabaseError::MalformedDataset { path, .. } if path == missing));
}

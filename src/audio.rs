//! Audio-reading collaborator used to derive sample counts on demand.
//!
//! Dataset resolution never touches audio. Only an explicit request for
//! length information that the metadata cannot answer reaches this module,
//! and then only to count samples. File handles are opened and closed per
//! access.

use std::path::Path;

use serde_json::Value;

use crate::constants::keys;
use crate::errors::DatabaseError;
use crate::record::ExampleRecord;

/// Collaborator contract: decode a time-domain signal from a path.
pub trait AudioReader {
    /// Decode the signal at `path` into f32 samples of one channel.
    ///
    /// Multi-channel files yield their first channel; this collaborator
    /// exists to derive per-channel sample counts, not full signals.
    fn read(&self, path: &Path) -> Result<Vec<f32>, DatabaseError>;
}

/// WAV-file reader backing the default sample-count derivation.
#[derive(Clone, Copy, Debug, Default)]
pub struct WavReader;

impl AudioReader for WavReader {
    fn read(&self, path: &Path) -> Result<Vec<f32>, DatabaseError> {
        let audio_error = |reason: String| DatabaseError::Audio {
            path: path.to_path_buf(),
            reason,
        };
        let mut reader =
            hound::WavReader::open(path).map_err(|err| audio_error(err.to_string()))?;
        let spec = reader.spec();
        let channels = spec.channels.max(1) as usize;
        let samples: Result<Vec<f32>, hound::Error> = match spec.sample_format {
            hound::SampleFormat::Float => reader.samples::<f32>().step_by(channels).collect(),
            hound::SampleFormat::Int => {
                let scale = 1.0 / (1_i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .step_by(channels)
                    .map(|sample| sample.map(|value| value as f32 * scale))
                    .collect()
            }
        };
        samples.map_err(|err| audio_error(err.to_string()))
    }
}

/// Ensure `record` carries a sample count, deriving it from the observation
/// signal when absent.
///
/// Fails with `LengthUnavailable` when the record has neither a sample count
/// nor an observation audio path to derive one from. Stacked path lists use
/// their first channel; channels of one example share a length.
pub fn add_num_samples(
    record: &mut ExampleRecord,
    reader: &dyn AudioReader,
) -> Result<(), DatabaseError> {
    if record.contains_key(keys::NUM_SAMPLES) {
        return Ok(());
    }
    let tree = record.audio_path(keys::OBSERVATION).ok_or_else(|| {
        DatabaseError::LengthUnavailable {
            reason: "record has neither num_samples nor an observation audio path".to_string(),
        }
    })?;
    let path = tree
        .first_path()
        .ok_or_else(|| DatabaseError::LengthUnavailable {
            reason: "observation audio path tree holds no paths".to_string(),
        })?;
    let samples = reader.read(Path::new(path))?;
    record.insert(keys::NUM_SAMPLES, Value::from(samples.len() as u64));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn write_wav(path: &Path, frames: usize) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for frame in 0..frames {
            writer.write_sample((frame % 7) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn derives_sample_count_from_observation_wav() {
        let temp = tempdir().unwrap();
        let wav_path = temp.path().join("u1.wav");
        write_wav(&wav_path, 480);

        let mut record: ExampleRecord = serde_json::from_value(json!({
            "audio_path": { "observation": wav_path.to_str().unwrap() }
        }))
        .unwrap();
        add_num_samples(&mut record, &WavReader).unwrap();
        assert_eq!(record.observation_num_samples(), Some(480));
    }

    #[test]
    fn existing_sample_count_is_left_alone() {
        let mut record: ExampleRecord = serde_json::from_value(json!({
            "num_samples": 123,
            "audio_path": { "observation": "/nonexistent.wav" }
        }))
        .unwrap();
        add_num_samples(&mut record, &WavReader).unwrap();
        assert_eq!(record.observation_num_samples(), Some(123));
    }

    #[test]
    fn missing_audio_path_is_a_length_error() {
        let mut record: ExampleRecord =
            serde_json::from_value(json!({ "speaker_id": "s1" })).unwrap();
        let err = add_num_samples(&mut record, &WavReader).unwrap_err();
        assert!(matches!(err, DatabaseError::LengthUnavailable { .. }));
    }

    #[test]
    fn unreadable_audio_surfaces_as_audio_error() {
        let mut record: ExampleRecord = serde_json::from_value(json!({
            "audio_path": { "observation": "/nonexistent/u1.wav" }
        }))
        .unwrap();
        let err = add_num_samples(&mut record, &WavReader).unwrap_err();
        assert!(matches!(err, DatabaseError::Audio { .. }));
    }
}

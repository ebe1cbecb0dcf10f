use std::path::Path;

use hound::{SampleFormat, WavReader};

use crate::audio::domain::audio_reader::{AudioMetadata, AudioReader};
use crate::audio::domain::audio_segment::AudioSegment;

/// Reads mono linear PCM WAV files via hound.
pub struct WavAudioReader;

impl AudioReader for WavAudioReader {
    fn read_audio(&self, path: &Path) -> Result<AudioSegment, Box<dyn std::error::Error>> {
        let mut reader = WavReader::open(path)?;
        let spec = reader.spec();

        if spec.channels != 1 {
            return Err(format!(
                "{}: expected mono audio, found {} channels",
                path.display(),
                spec.channels
            )
            .into());
        }
        if spec.sample_format != SampleFormat::Int || spec.bits_per_sample > 32 {
            return Err(format!(
                "{}: expected integer PCM, found {:?} at {} bits",
                path.display(),
                spec.sample_format,
                spec.bits_per_sample
            )
            .into());
        }

        let scale = (1u64 << (spec.bits_per_sample - 1)) as f32;
        let samples = reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / scale))
            .collect::<Result<Vec<f32>, _>>()?;

        Ok(AudioSegment::mono(samples, spec.sample_rate))
    }

    fn audio_metadata(&self, path: &Path) -> Result<AudioMetadata, Box<dyn std::error::Error>> {
        let reader = WavReader::open(path)?;
        let spec = reader.spec();
        Ok(AudioMetadata {
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            bits_per_sample: spec.bits_per_sample,
            frame_count: reader.duration(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};
    use tempfile::TempDir;

    fn write_fixture(path: &Path, channels: u16, samples: &[i16]) {
        let spec = WavSpec {
            channels,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for s in samples {
            writer.write_sample(*s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_read_normalizes_16_bit_samples() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("in.wav");
        write_fixture(&path, 1, &[0, 16384, -32768]);

        let seg = WavAudioReader.read_audio(&path).unwrap();
        assert_eq!(seg.sample_rate(), 16000);
        assert_eq!(seg.channels(), 1);
        assert_eq!(seg.samples(), &[0.0, 0.5, -1.0]);
    }

    #[test]
    fn test_read_rejects_stereo() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("stereo.wav");
        write_fixture(&path, 2, &[0, 0, 1, 1]);

        let err = WavAudioReader.read_audio(&path).unwrap_err().to_string();
        assert!(err.contains("expected mono"), "got: {err}");
    }

    #[test]
    fn test_metadata_reports_header_fields() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("in.wav");
        write_fixture(&path, 1, &[1, 2, 3, 4, 5]);

        let meta = WavAudioReader.audio_metadata(&path).unwrap();
        assert_eq!(
            meta,
            AudioMetadata {
                sample_rate: 16000,
                channels: 1,
                bits_per_sample: 16,
                frame_count: 5,
            }
        );
    }

    #[test]
    fn test_read_missing_file_errors() {
        assert!(WavAudioReader
            .read_audio(Path::new("/nonexistent/in.wav"))
            .is_err());
    }
}

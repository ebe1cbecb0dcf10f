use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::audio::domain::audio_segment::AudioSegment;
use crate::audio::domain::audio_writer::AudioWriter;
use crate::shared::constants::BITS_PER_SAMPLE;

/// Writes recordings as 16-bit signed little-endian PCM WAV via hound.
pub struct WavAudioWriter;

impl AudioWriter for WavAudioWriter {
    fn write_audio(
        &self,
        path: &Path,
        audio: &AudioSegment,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let spec = WavSpec {
            channels: audio.channels(),
            sample_rate: audio.sample_rate(),
            bits_per_sample: BITS_PER_SAMPLE,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec)?;
        for &s in audio.samples() {
            writer.write_sample(to_i16(s))?;
        }
        writer.finalize()?;

        log::debug!(
            "Wrote {} samples ({:.2}s) to {}",
            audio.len(),
            audio.duration(),
            path.display()
        );
        Ok(())
    }
}

fn to_i16(sample: f32) -> i16 {
    (sample * 32768.0).clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

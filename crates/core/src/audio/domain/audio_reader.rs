use crate::audio::domain::audio_segment::AudioSegment;
use std::path::Path;

/// Header fields that make two persisted recordings interchangeable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AudioMetadata {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub frame_count: u32,
}

/// Domain interface for loading a persisted recording.
pub trait AudioReader: Send {
    /// Decode the file to a mono PCM AudioSegment normalized to [-1.0, 1.0].
    fn read_audio(&self, path: &Path) -> Result<AudioSegment, Box<dyn std::error::Error>>;

    /// Return the container header without decoding samples.
    fn audio_metadata(&self, path: &Path) -> Result<AudioMetadata, Box<dyn std::error::Error>>;
}

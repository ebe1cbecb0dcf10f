use crate::audio::domain::audio_segment::AudioSegment;
use std::path::Path;

/// Domain interface for persisting a recording.
pub trait AudioWriter: Send {
    /// Encode the AudioSegment to `path`, replacing any existing file.
    fn write_audio(&self, path: &Path, audio: &AudioSegment)
        -> Result<(), Box<dyn std::error::Error>>;
}

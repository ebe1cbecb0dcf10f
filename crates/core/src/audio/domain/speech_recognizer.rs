use std::path::Path;

/// Domain interface for speech-to-text transcription.
///
/// Implementations may be slow; callers never retry them.
pub trait SpeechRecognizer: Send {
    fn transcribe(
        &self,
        audio_path: &Path,
        language: &str,
    ) -> Result<String, Box<dyn std::error::Error>>;
}

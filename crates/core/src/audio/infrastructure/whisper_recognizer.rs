use std::path::{Path, PathBuf};

use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::audio::domain::audio_reader::AudioReader;
use crate::audio::domain::speech_recognizer::SpeechRecognizer;
use crate::audio::infrastructure::wav_audio_reader::WavAudioReader;
use crate::shared::constants::SAMPLE_RATE;

/// Speech recognizer using whisper.cpp via whisper-rs.
///
/// The model is loaded once at construction and reused for every attempt.
pub struct WhisperRecognizer {
    model_path: PathBuf,
    ctx: WhisperContext,
}

impl WhisperRecognizer {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if !model_path.exists() {
            return Err(format!("Whisper model not found at: {}", model_path.display()).into());
        }
        log::info!("Loading Whisper model from {}", model_path.display());
        let ctx = WhisperContext::new_with_params(
            model_path.to_str().ok_or("Invalid model path")?,
            WhisperContextParameters::default(),
        )
        .map_err(|e| format!("Failed to load Whisper model: {e}"))?;
        log::info!("Whisper model loaded");

        Ok(Self {
            model_path: model_path.to_path_buf(),
            ctx,
        })
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }
}

impl SpeechRecognizer for WhisperRecognizer {
    fn transcribe(
        &self,
        audio_path: &Path,
        language: &str,
    ) -> Result<String, Box<dyn std::error::Error>> {
        let audio = WavAudioReader.read_audio(audio_path)?;
        if audio.sample_rate() != SAMPLE_RATE {
            return Err(format!(
                "Whisper expects {SAMPLE_RATE} Hz audio, {} is {} Hz",
                audio_path.display(),
                audio.sample_rate()
            )
            .into());
        }

        let mut state = self
            .ctx
            .create_state()
            .map_err(|e| format!("Failed to create Whisper state: {e}"))?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_language(Some(language));
        params.set_translate(false);
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        params.set_n_threads(num_cpus().min(4) as i32);

        state
            .full(params, audio.samples())
            .map_err(|e| format!("Whisper inference failed: {e}"))?;

        let mut text = String::new();
        for seg_idx in 0..state.full_n_segments() {
            let Some(segment) = state.get_segment(seg_idx) else {
                continue;
            };
            for tok_idx in 0..segment.n_tokens() {
                let Some(token) = segment.get_token(tok_idx) else {
                    continue;
                };
                let Ok(piece) = token.to_str() else {
                    continue;
                };
                // Special tokens look like [_BEG_] or <|endoftext|>
                let trimmed = piece.trim();
                if trimmed.starts_with('[') || trimmed.starts_with('<') {
                    continue;
                }
                text.push_str(piece);
            }
        }

        Ok(text.trim().to_string())
    }
}

fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

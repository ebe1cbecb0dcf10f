pub const SAMPLE_RATE: u32 = 16000;
pub const BITS_PER_SAMPLE: u16 = 16;

/// Fixed recording length for a practice attempt.
pub const RECORD_SECONDS: f64 = 10.0;

pub const DEFAULT_DAF_MS: f64 = 120.0;
pub const DEFAULT_FRAME_MS: f64 = 20.0;

/// Extra frames held by the delay line beyond the configured delay.
pub const DELAY_SLACK_FRAMES: usize = 5;

/// Upper bounds accepted from user settings.
pub const MAX_DAF_MS: f64 = 5000.0;
pub const MAX_DELAY_SLACK_FRAMES: usize = 250;

pub const DEFAULT_FSF_SEMITONES: f64 = -3.0;

pub const WHISPER_MODEL_NAME: &str = "ggml-small.bin";
/// ggml Whisper models are fetched from here by file name.
pub const WHISPER_MODEL_BASE_URL: &str = "https://huggingface.co/ggerganov/whisper.cpp/resolve/main";
pub const DEFAULT_LANGUAGE: &str = "en";

pub const SOUNDSTRETCH_COMMAND: &str = "soundstretch";

/// Directory name used under the platform config and cache roots.
pub const APP_DIR_NAME: &str = "Fluency";

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::constants::{
    APP_DIR_NAME, DEFAULT_DAF_MS, DEFAULT_FRAME_MS, DEFAULT_FSF_SEMITONES, DEFAULT_LANGUAGE,
    DELAY_SLACK_FRAMES, MAX_DAF_MS, MAX_DELAY_SLACK_FRAMES, RECORD_SECONDS, SAMPLE_RATE,
    SOUNDSTRETCH_COMMAND, WHISPER_MODEL_BASE_URL, WHISPER_MODEL_NAME,
};
use crate::shared::frame::FrameFormat;

#[derive(Error, Debug, PartialEq)]
pub enum SettingsError {
    #[error("sample rate must be positive")]
    ZeroSampleRate,
    #[error("frame duration of {0} ms yields an empty frame")]
    EmptyFrame(f64),
    #[error("{name} must be a finite, non-negative number, got {value}")]
    Negative { name: &'static str, value: f64 },
    #[error("{name} must be at most {max}, got {value}")]
    TooLarge {
        name: &'static str,
        value: f64,
        max: f64,
    },
}

/// User-tunable practice settings, persisted as JSON in the platform config dir.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub sample_rate: u32,
    pub record_seconds: f64,
    pub daf_delay_ms: f64,
    pub frame_ms: f64,
    pub delay_slack_frames: usize,
    pub fsf_semitones: f64,
    pub whisper_model: String,
    pub language: String,
    pub pitch_shift_command: String,
    pub output_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            record_seconds: RECORD_SECONDS,
            daf_delay_ms: DEFAULT_DAF_MS,
            frame_ms: DEFAULT_FRAME_MS,
            delay_slack_frames: DELAY_SLACK_FRAMES,
            fsf_semitones: DEFAULT_FSF_SEMITONES,
            whisper_model: WHISPER_MODEL_NAME.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            pitch_shift_command: SOUNDSTRETCH_COMMAND.to_string(),
            output_dir: PathBuf::from("."),
        }
    }
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("settings.json"))
    }

    /// Load from the default location, falling back to defaults when absent or malformed.
    pub fn load() -> Self {
        Self::config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                log::warn!("Ignoring malformed settings at {}: {e}", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let path = Self::config_path().ok_or("could not determine config directory")?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.sample_rate == 0 {
            return Err(SettingsError::ZeroSampleRate);
        }
        check_non_negative("record_seconds", self.record_seconds)?;
        check_non_negative("daf_delay_ms", self.daf_delay_ms)?;
        check_non_negative("frame_ms", self.frame_ms)?;
        if self.daf_delay_ms > MAX_DAF_MS {
            return Err(SettingsError::TooLarge {
                name: "daf_delay_ms",
                value: self.daf_delay_ms,
                max: MAX_DAF_MS,
            });
        }
        if self.delay_slack_frames > MAX_DELAY_SLACK_FRAMES {
            return Err(SettingsError::TooLarge {
                name: "delay_slack_frames",
                value: self.delay_slack_frames as f64,
                max: MAX_DELAY_SLACK_FRAMES as f64,
            });
        }
        if self.frame_format().frame_size == 0 {
            return Err(SettingsError::EmptyFrame(self.frame_ms));
        }
        Ok(())
    }

    pub fn frame_format(&self) -> FrameFormat {
        FrameFormat::from_millis(self.frame_ms, self.sample_rate)
    }

    pub fn attempt_path(&self, attempt: usize, suffix: &str) -> PathBuf {
        self.output_dir
            .join(format!("attempt_{attempt}_{suffix}.wav"))
    }

    pub fn whisper_model_url(&self) -> String {
        format!("{WHISPER_MODEL_BASE_URL}/{}", self.whisper_model)
    }
}

fn check_non_negative(name: &'static str, value: f64) -> Result<(), SettingsError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SettingsError::Negative { name, value })
    }
}

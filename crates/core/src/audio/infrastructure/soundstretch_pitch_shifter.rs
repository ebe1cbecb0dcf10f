use std::path::Path;
use std::process::Command;

use crate::audio::domain::pitch_shifter::{PitchShiftError, PitchShifter};
use crate::shared::constants::SOUNDSTRETCH_COMMAND;

/// Shifts pitch by running SoundTouch's `soundstretch` CLI out of process.
pub struct SoundstretchPitchShifter {
    command: String,
}

impl SoundstretchPitchShifter {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    fn args(input: &Path, output: &Path, semitones: f64) -> Vec<String> {
        vec![
            input.display().to_string(),
            output.display().to_string(),
            format!("-pitch={semitones}"),
        ]
    }
}

impl Default for SoundstretchPitchShifter {
    fn default() -> Self {
        Self::new(SOUNDSTRETCH_COMMAND)
    }
}

impl PitchShifter for SoundstretchPitchShifter {
    fn shift(&self, input: &Path, output: &Path, semitones: f64) -> Result<(), PitchShiftError> {
        if !input.is_file() {
            return Err(PitchShiftError::InputNotFound(input.to_path_buf()));
        }

        let result = Command::new(&self.command)
            .args(Self::args(input, output, semitones))
            .output()
            .map_err(|source| PitchShiftError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        if !result.status.success() {
            return Err(PitchShiftError::Failed {
                command: self.command.clone(),
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        log::info!(
            "Pitch-shifted {} -> {} ({semitones} semitones)",
            input.display(),
            output.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_input_fails_without_writing_output() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("missing.wav");
        let output = tmp.path().join("shifted.wav");

        // A command that would create the output if it were ever run.
        let shifter = SoundstretchPitchShifter::new("touch");
        let err = shifter.shift(&input, &output, -3.0).unwrap_err();

        assert!(matches!(err, PitchShiftError::InputNotFound(ref p) if p == &input));
        assert!(!output.exists());
    }

    #[test]
    fn test_unknown_command_reports_spawn_error() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in.wav");
        std::fs::write(&input, b"RIFF").unwrap();

        let shifter = SoundstretchPitchShifter::new("fluency-no-such-tool");
        let err = shifter
            .shift(&input, &tmp.path().join("out.wav"), 2.0)
            .unwrap_err();
        assert!(matches!(err, PitchShiftError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_reports_failure() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in.wav");
        std::fs::write(&input, b"RIFF").unwrap();

        let shifter = SoundstretchPitchShifter::new("false");
        let err = shifter
            .shift(&input, &tmp.path().join("out.wav"), 2.0)
            .unwrap_err();
        assert!(matches!(err, PitchShiftError::Failed { .. }));
    }

    #[test]
    fn test_args_format_signed_semitones() {
        let args =
            SoundstretchPitchShifter::args(Path::new("a.wav"), Path::new("b.wav"), -3.0);
        assert_eq!(args, vec!["a.wav", "b.wav", "-pitch=-3"]);
    }
}

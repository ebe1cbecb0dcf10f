use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failure of the out-of-process pitch shift. Only the current feedback
/// attempt is lost; recordings already on disk stay valid.
#[derive(Error, Debug)]
pub enum PitchShiftError {
    #[error("input file not found: {0}")]
    InputNotFound(PathBuf),
    #[error("failed to launch {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{command} exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },
}

/// Domain interface for static, file-to-file pitch shifting.
pub trait PitchShifter: Send {
    fn shift(&self, input: &Path, output: &Path, semitones: f64) -> Result<(), PitchShiftError>;
}

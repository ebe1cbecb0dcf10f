use thiserror::Error;

use crate::shared::frame::{Frame, FrameFormat};

/// Hardware failure while an attempt is running. Timing is already lost
/// when one of these surfaces, so the attempt stops instead of retrying.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeviceError {
    #[error("no {0} device available")]
    NoDevice(&'static str),
    #[error("{direction} device does not support {detail}")]
    UnsupportedConfig {
        direction: &'static str,
        detail: String,
    },
    #[error("audio stream error: {0}")]
    Stream(String),
    #[error("audio device disconnected")]
    Disconnected,
    #[error("audio device stopped responding after {0} ms")]
    Timeout(u64),
}

/// Source of captured frames. Blocks until one full frame is available.
pub trait CapturePort {
    fn read_frame(&mut self, frame: &mut Frame) -> Result<(), DeviceError>;
}

/// Sink for monitor frames. Blocks until the device accepts the frame.
pub trait PlaybackPort {
    fn write_frame(&mut self, frame: &Frame) -> Result<(), DeviceError>;

    /// Block until queued frames have been played. Default: nothing queued.
    fn drain(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }
}

/// Opens fresh capture and playback ports for one recording attempt.
pub trait AudioDevice: Send {
    fn open_capture(&self, format: FrameFormat) -> Result<Box<dyn CapturePort>, DeviceError>;
    fn open_playback(&self, format: FrameFormat) -> Result<Box<dyn PlaybackPort>, DeviceError>;
}

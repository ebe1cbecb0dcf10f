use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

use crate::audio::domain::audio_segment::AudioSegment;
use crate::feedback::domain::audio_port::{CapturePort, DeviceError, PlaybackPort};
use crate::feedback::domain::delay_line::{DelayLine, DelayLineError};
use crate::shared::frame::{Frame, FrameFormat};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchedulerError {
    #[error(transparent)]
    Device(#[from] DeviceError),
    #[error(transparent)]
    DelayLine(#[from] DelayLineError),
}

/// Drives a [`DelayLine`] against capture and playback ports, one frame in
/// and one frame out per tick.
///
/// Running consumes the scheduler together with its delay line, so each
/// attempt starts from an empty line.
pub struct FrameScheduler {
    delay_line: DelayLine,
    input: Frame,
    output: Frame,
}

impl FrameScheduler {
    pub fn new(delay_line: DelayLine) -> Self {
        let frame_size = delay_line.format().frame_size;
        Self {
            delay_line,
            input: Frame::silence(frame_size),
            output: Frame::silence(frame_size),
        }
    }

    pub fn format(&self) -> FrameFormat {
        self.delay_line.format()
    }

    /// Run exactly `total_frames` ticks and hand back the dry (undelayed) capture.
    pub fn run_batch(
        mut self,
        capture: &mut dyn CapturePort,
        playback: &mut dyn PlaybackPort,
        total_frames: usize,
    ) -> Result<AudioSegment, SchedulerError> {
        let format = self.format();
        let mut dry = Vec::with_capacity(total_frames * format.frame_size);
        log::debug!(
            "Batch feedback: {total_frames} frames, delay {} frames",
            self.delay_line.delay_frames()
        );

        for _ in 0..total_frames {
            self.tick(capture, playback)?;
            dry.extend_from_slice(self.input.samples());
        }
        playback.drain()?;

        Ok(AudioSegment::mono(dry, format.sample_rate))
    }

    /// Tick until `cancelled` is set, checking only between ticks.
    /// Returns the number of completed ticks.
    pub fn run_streaming(
        mut self,
        capture: &mut dyn CapturePort,
        playback: &mut dyn PlaybackPort,
        cancelled: &AtomicBool,
    ) -> Result<u64, SchedulerError> {
        let mut ticks = 0u64;
        while !cancelled.load(Ordering::Relaxed) {
            self.tick(capture, playback)?;
            ticks += 1;
        }
        log::debug!("Streaming feedback stopped after {ticks} frames");
        Ok(ticks)
    }

    fn tick(
        &mut self,
        capture: &mut dyn CapturePort,
        playback: &mut dyn PlaybackPort,
    ) -> Result<(), SchedulerError> {
        capture.read_frame(&mut self.input)?;
        self.delay_line
            .process(self.input.samples(), self.output.samples_mut())?;
        playback.write_frame(&self.output)?;
        Ok(())
    }
}

/// Record `total_frames` frames without monitor playback.
pub fn capture_dry(
    capture: &mut dyn CapturePort,
    format: FrameFormat,
    total_frames: usize,
) -> Result<AudioSegment, DeviceError> {
    let mut frame = Frame::silence(format.frame_size);
    let mut samples = Vec::with_capacity(total_frames * format.frame_size);
    for _ in 0..total_frames {
        capture.read_frame(&mut frame)?;
        samples.extend_from_slice(frame.samples());
    }
    Ok(AudioSegment::mono(samples, format.sample_rate))
}

/// Play a finished recording frame by frame, zero-padding the last frame.
pub fn play_segment(
    playback: &mut dyn PlaybackPort,
    format: FrameFormat,
    audio: &AudioSegment,
) -> Result<(), DeviceError> {
    let mut frame = Frame::silence(format.frame_size);
    for chunk in audio.samples().chunks(format.frame_size.max(1)) {
        frame.fill_silence();
        frame.samples_mut()[..chunk.len()].copy_from_slice(chunk);
        playback.write_frame(&frame)?;
    }
    playback.drain()
}

use std::time::Duration;

use thiserror::Error;

use crate::shared::frame::{Frame, FrameFormat};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DelayLineError {
    #[error("invalid delay line configuration: {0}")]
    InvalidConfiguration(String),
    #[error("frame has {actual} samples, delay line expects {expected}")]
    FrameSizeMismatch { expected: usize, actual: usize },
}

/// Convert a millisecond delay to whole frames.
///
/// Truncates: 130 ms over 20 ms frames is 6 frames, not 7.
pub fn delay_frames_for(delay_ms: f64, format: FrameFormat) -> Result<usize, DelayLineError> {
    validate_format(format)?;
    if !delay_ms.is_finite() || delay_ms < 0.0 {
        return Err(DelayLineError::InvalidConfiguration(format!(
            "delay must be a finite, non-negative number of milliseconds, got {delay_ms}"
        )));
    }
    let samples = delay_ms * format.sample_rate as f64 / 1000.0;
    Ok((samples / format.frame_size as f64) as usize)
}

fn validate_format(format: FrameFormat) -> Result<(), DelayLineError> {
    if format.frame_size == 0 {
        return Err(DelayLineError::InvalidConfiguration(
            "frame size must be at least one sample".to_string(),
        ));
    }
    if format.sample_rate == 0 {
        return Err(DelayLineError::InvalidConfiguration(
            "sample rate must be positive".to_string(),
        ));
    }
    Ok(())
}

/// Fixed-capacity ring of recent frames that re-emits its input a fixed
/// number of frames later.
///
/// All storage is allocated up front in one flat arena; a tick only copies
/// samples and advances the cursor. There is no reset: a new attempt gets a
/// new delay line, so stale audio can never leak into it.
#[derive(Debug)]
pub struct DelayLine {
    slots: Vec<f32>,
    format: FrameFormat,
    delay_frames: usize,
    capacity_frames: usize,
    /// Slot the next write lands in; always `written % capacity_frames`.
    cursor: usize,
    written: u64,
}

impl DelayLine {
    pub fn new(
        delay_frames: usize,
        capacity_frames: usize,
        format: FrameFormat,
    ) -> Result<Self, DelayLineError> {
        validate_format(format)?;
        if capacity_frames < delay_frames {
            return Err(DelayLineError::InvalidConfiguration(format!(
                "capacity of {capacity_frames} frames cannot hold a delay of {delay_frames} frames"
            )));
        }

        let slot_count = capacity_frames
            .checked_mul(format.frame_size)
            .ok_or_else(|| {
                DelayLineError::InvalidConfiguration(format!(
                    "capacity of {capacity_frames} frames of {} samples overflows",
                    format.frame_size
                ))
            })?;

        Ok(Self {
            slots: vec![0.0; slot_count],
            format,
            delay_frames,
            capacity_frames,
            cursor: 0,
            written: 0,
        })
    }

    /// Build a delay line for a millisecond delay with `slack_frames` of headroom.
    pub fn from_millis(
        delay_ms: f64,
        slack_frames: usize,
        format: FrameFormat,
    ) -> Result<Self, DelayLineError> {
        let delay_frames = delay_frames_for(delay_ms, format)?;
        let capacity_frames = delay_frames.checked_add(slack_frames).ok_or_else(|| {
            DelayLineError::InvalidConfiguration(format!(
                "delay of {delay_frames} frames plus {slack_frames} slack frames overflows"
            ))
        })?;
        Self::new(delay_frames, capacity_frames, format)
    }

    pub fn delay_frames(&self) -> usize {
        self.delay_frames
    }

    pub fn capacity_frames(&self) -> usize {
        self.capacity_frames
    }

    pub fn frames_written(&self) -> u64 {
        self.written
    }

    pub fn format(&self) -> FrameFormat {
        self.format
    }

    /// Effective delay after truncation to whole frames.
    pub fn latency(&self) -> Duration {
        self.format.frame_duration() * self.delay_frames as u32
    }

    /// One tick: store `input` and fill `output` with the frame written
    /// `delay_frames` ticks earlier, or silence until that many frames exist.
    ///
    /// Never allocates; safe to call from an audio callback.
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) -> Result<(), DelayLineError> {
        let frame_size = self.format.frame_size;
        for len in [input.len(), output.len()] {
            if len != frame_size {
                return Err(DelayLineError::FrameSizeMismatch {
                    expected: frame_size,
                    actual: len,
                });
            }
        }

        if self.delay_frames == 0 {
            output.copy_from_slice(input);
        } else if self.written >= self.delay_frames as u64 {
            // Read before writing: when capacity == delay the delayed frame
            // lives in the slot this tick overwrites.
            let slot = (self.cursor + self.capacity_frames - self.delay_frames)
                % self.capacity_frames;
            output.copy_from_slice(self.slot(slot));
        } else {
            output.fill(0.0);
        }

        if self.capacity_frames > 0 {
            let start = self.cursor * frame_size;
            self.slots[start..start + frame_size].copy_from_slice(input);
            self.cursor = (self.cursor + 1) % self.capacity_frames;
        }
        self.written += 1;

        Ok(())
    }

    /// Owned-frame form of [`DelayLine::process`].
    pub fn push_and_pull(&mut self, input: &Frame) -> Result<Frame, DelayLineError> {
        let mut output = Frame::silence(self.format.frame_size);
        self.process(input.samples(), output.samples_mut())?;
        Ok(output)
    }

    fn slot(&self, index: usize) -> &[f32] {
        let start = index * self.format.frame_size;
        &self.slots[start..start + self.format.frame_size]
    }
}

use std::time::Duration;

/// Sample layout shared by every frame of one recording attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameFormat {
    pub frame_size: usize,
    pub sample_rate: u32,
}

impl FrameFormat {
    pub fn new(frame_size: usize, sample_rate: u32) -> Self {
        Self {
            frame_size,
            sample_rate,
        }
    }

    /// Derive the frame size from a frame duration, truncating partial samples.
    pub fn from_millis(frame_ms: f64, sample_rate: u32) -> Self {
        let frame_size = (sample_rate as f64 * frame_ms / 1000.0) as usize;
        Self::new(frame_size, sample_rate)
    }

    pub fn frame_duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frame_size as f64 / self.sample_rate as f64)
    }

    pub fn frame_millis(&self) -> f64 {
        self.frame_duration().as_secs_f64() * 1000.0
    }

    /// Number of whole frames covering `seconds` of audio.
    pub fn frames_for_seconds(&self, seconds: f64) -> usize {
        if self.frame_size == 0 || seconds <= 0.0 {
            return 0;
        }
        let samples = (seconds * self.sample_rate as f64) as usize;
        samples / self.frame_size
    }
}

/// One block of mono samples normalized to [-1.0, 1.0], moved atomically per tick.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    samples: Vec<f32>,
}

impl Frame {
    pub fn new(samples: Vec<f32>) -> Self {
        Self { samples }
    }

    pub fn silence(frame_size: usize) -> Self {
        Self {
            samples: vec![0.0; frame_size],
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_silent(&self) -> bool {
        self.samples.iter().all(|s| *s == 0.0)
    }

    pub fn fill_silence(&mut self) {
        self.samples.fill(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_format_from_millis_matches_20ms_at_16k() {
        let format = FrameFormat::from_millis(20.0, 16000);
        assert_eq!(format.frame_size, 320);
        assert_eq!(format.sample_rate, 16000);
    }

    #[test]
    fn test_frame_duration() {
        let format = FrameFormat::new(320, 16000);
        assert_relative_eq!(format.frame_millis(), 20.0, epsilon = 1e-9);
    }

    #[test]
    fn test_frame_duration_zero_rate() {
        let format = FrameFormat::new(320, 0);
        assert_eq!(format.frame_duration(), Duration::ZERO);
    }

    #[test]
    fn test_frames_for_seconds_truncates() {
        let format = FrameFormat::new(320, 16000);
        assert_eq!(format.frames_for_seconds(10.0), 500);
        assert_eq!(format.frames_for_seconds(0.05), 2);
        assert_eq!(format.frames_for_seconds(-1.0), 0);
    }

    #[test]
    fn test_silence_is_zeroed() {
        let frame = Frame::silence(4);
        assert_eq!(frame.len(), 4);
        assert!(frame.is_silent());
    }

    #[test]
    fn test_fill_silence_clears_samples() {
        let mut frame = Frame::new(vec![0.5, -0.5]);
        assert!(!frame.is_silent());
        frame.fill_silence();
        assert!(frame.is_silent());
    }

    #[test]
    fn test_clone_is_independent() {
        let frame = Frame::new(vec![0.25; 3]);
        let mut cloned = frame.clone();
        cloned.samples_mut()[0] = 0.0;
        assert_eq!(frame.samples()[0], 0.25);
        assert_eq!(cloned.samples()[0], 0.0);
    }
}

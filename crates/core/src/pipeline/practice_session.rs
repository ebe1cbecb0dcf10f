use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::time::Instant;

use crate::alignment::domain::discrepancy::TextComparison;
use crate::audio::domain::audio_reader::AudioReader;
use crate::audio::domain::audio_writer::AudioWriter;
use crate::audio::domain::pitch_shifter::PitchShifter;
use crate::audio::domain::speech_recognizer::SpeechRecognizer;
use crate::feedback::domain::audio_port::AudioDevice;
use crate::feedback::domain::delay_line::DelayLine;
use crate::feedback::domain::frame_scheduler::{capture_dry, play_segment, FrameScheduler};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::frame::FrameFormat;
use crate::shared::settings::Settings;

/// Orchestrates one practice session: recording attempts, playback,
/// transcription, comparison and the two feedback modes.
///
/// Every recording opens fresh device ports and, for DAF, a fresh delay
/// line; nothing carries over between attempts except files on disk.
pub struct PracticeSession {
    settings: Settings,
    format: FrameFormat,
    device: Box<dyn AudioDevice>,
    recognizer: Option<Box<dyn SpeechRecognizer>>,
    pitch_shifter: Box<dyn PitchShifter>,
    reader: Box<dyn AudioReader>,
    writer: Box<dyn AudioWriter>,
    logger: Box<dyn PipelineLogger>,
}

impl PracticeSession {
    pub fn new(
        settings: Settings,
        device: Box<dyn AudioDevice>,
        recognizer: Option<Box<dyn SpeechRecognizer>>,
        pitch_shifter: Box<dyn PitchShifter>,
        reader: Box<dyn AudioReader>,
        writer: Box<dyn AudioWriter>,
        logger: Box<dyn PipelineLogger>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        settings.validate()?;
        Ok(Self {
            format: settings.frame_format(),
            settings,
            device,
            recognizer,
            pitch_shifter,
            reader,
            writer,
            logger,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn record_frames(&self) -> usize {
        self.format.frames_for_seconds(self.settings.record_seconds)
    }

    /// Record a plain attempt without monitor feedback.
    pub fn record_attempt(&mut self, attempt: usize) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let path = self.settings.attempt_path(attempt, "orig");
        self.logger.info(&format!(
            "Recording for {} seconds... Speak now!",
            self.settings.record_seconds
        ));

        let started = Instant::now();
        let mut capture = self.device.open_capture(self.format)?;
        let audio = capture_dry(capture.as_mut(), self.format, self.record_frames())?;
        drop(capture);
        self.logger.timing("record", elapsed_ms(started));
        self.logger.metric("peak", audio.peak() as f64);

        self.writer.write_audio(&path, &audio)?;
        self.logger.info(&format!("Saved {}", path.display()));
        Ok(path)
    }

    /// Record an attempt while the speaker hears themselves delayed.
    /// The saved file holds the dry signal, not the delayed monitor feed.
    pub fn record_with_daf(&mut self, attempt: usize) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let path = self.settings.attempt_path(attempt, "daf");
        let delay_line = DelayLine::from_millis(
            self.settings.daf_delay_ms,
            self.settings.delay_slack_frames,
            self.format,
        )?;
        self.logger.info(&format!(
            "DAF active ({:.0} ms delay). Speak now!",
            delay_line.latency().as_secs_f64() * 1000.0
        ));

        let started = Instant::now();
        let mut capture = self.device.open_capture(self.format)?;
        let mut playback = self.device.open_playback(self.format)?;
        let dry = FrameScheduler::new(delay_line).run_batch(
            capture.as_mut(),
            playback.as_mut(),
            self.record_frames(),
        )?;
        drop(playback);
        drop(capture);
        self.logger.timing("record_daf", elapsed_ms(started));

        self.writer.write_audio(&path, &dry)?;
        self.logger.info(&format!("Saved DAF recording: {}", path.display()));
        Ok(path)
    }

    /// Pitch-shift the plain attempt, play it back, then record a new attempt.
    ///
    /// A pitch-shift failure aborts only this feedback round; the original
    /// recording is left untouched.
    pub fn pitch_shift_feedback(
        &mut self,
        attempt: usize,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let original = self.settings.attempt_path(attempt, "orig");
        let shifted = self.settings.attempt_path(attempt, "shifted");

        let started = Instant::now();
        self.pitch_shifter
            .shift(&original, &shifted, self.settings.fsf_semitones)?;
        self.logger.timing("pitch_shift", elapsed_ms(started));

        self.play_recording(&shifted)?;

        let path = self.settings.attempt_path(attempt, "fsf");
        let mut capture = self.device.open_capture(self.format)?;
        self.logger.info("Now repeat the sentence. Speak now!");
        let audio = capture_dry(capture.as_mut(), self.format, self.record_frames())?;
        drop(capture);
        self.writer.write_audio(&path, &audio)?;
        self.logger.info(&format!("Saved FSF recording: {}", path.display()));
        Ok(path)
    }

    pub fn play_recording(&mut self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let audio = self.reader.read_audio(path)?;
        if audio.sample_rate() != self.format.sample_rate {
            return Err(format!(
                "{} is {} Hz, playback runs at {} Hz",
                path.display(),
                audio.sample_rate(),
                self.format.sample_rate
            )
            .into());
        }

        let mut playback = self.device.open_playback(self.format)?;
        play_segment(playback.as_mut(), self.format, &audio)?;
        Ok(())
    }

    pub fn transcribe(&mut self, path: &Path) -> Result<String, Box<dyn std::error::Error>> {
        let recognizer = self
            .recognizer
            .as_ref()
            .ok_or("no speech recognizer configured")?;
        self.logger.info("Transcribing...");
        let started = Instant::now();
        let text = recognizer.transcribe(path, &self.settings.language)?;
        self.logger.timing("transcribe", elapsed_ms(started));
        Ok(text)
    }

    pub fn compare(
        &mut self,
        reference: &str,
        spoken: &str,
    ) -> Result<TextComparison, Box<dyn std::error::Error>> {
        let started = Instant::now();
        let comparison = TextComparison::compare(reference, spoken)?;
        self.logger.timing("align", elapsed_ms(started));
        self.logger
            .metric("similarity", comparison.script.similarity());
        Ok(comparison)
    }

    /// Live DAF until `cancelled` is set. Nothing is recorded.
    pub fn monitor(&mut self, cancelled: &AtomicBool) -> Result<u64, Box<dyn std::error::Error>> {
        let delay_line = DelayLine::from_millis(
            self.settings.daf_delay_ms,
            self.settings.delay_slack_frames,
            self.format,
        )?;
        let mut capture = self.device.open_capture(self.format)?;
        let mut playback = self.device.open_playback(self.format)?;
        self.logger.info(&format!(
            "DAF active ({:.0} ms delay). Press Ctrl+C to stop.",
            delay_line.latency().as_secs_f64() * 1000.0
        ));

        let ticks =
            FrameScheduler::new(delay_line).run_streaming(capture.as_mut(), playback.as_mut(), cancelled)?;
        self.logger.info("Stopped DAF.");
        Ok(ticks)
    }

    pub fn finish(&self) {
        self.logger.summary();
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, Stream, StreamConfig, StreamError, SupportedStreamConfigRange};
use crossbeam_channel::{Receiver, RecvTimeoutError, SendTimeoutError, Sender, TrySendError};

use crate::feedback::domain::audio_port::{AudioDevice, CapturePort, DeviceError, PlaybackPort};
use crate::shared::frame::{Frame, FrameFormat};

/// How long a port waits on the device before declaring it dead.
const DEVICE_TIMEOUT: Duration = Duration::from_secs(2);

/// Captured audio the handoff queue can hold, in frames.
const CAPTURE_QUEUE_FRAMES: usize = 50;

/// Monitor audio queued ahead of the output callback, in frames.
const PLAYBACK_QUEUE_FRAMES: usize = 8;

/// Consecutive frames of starved output tolerated between two writes.
const UNDERRUN_LIMIT_FRAMES: usize = 25;

/// Default host input/output devices via cpal.
///
/// cpal drives its own callback threads; the ports bridge them to blocking
/// frame reads and writes through bounded sample queues. Callbacks only
/// move samples and raise flags.
#[derive(Default)]
pub struct CpalAudioDevice;

impl CpalAudioDevice {
    pub fn new() -> Self {
        Self
    }
}

impl AudioDevice for CpalAudioDevice {
    fn open_capture(&self, format: FrameFormat) -> Result<Box<dyn CapturePort>, DeviceError> {
        Ok(Box::new(CpalCapturePort::open(format)?))
    }

    fn open_playback(&self, format: FrameFormat) -> Result<Box<dyn PlaybackPort>, DeviceError> {
        Ok(Box::new(CpalPlaybackPort::open(format)?))
    }
}

fn pick_config(
    configs: impl Iterator<Item = SupportedStreamConfigRange>,
    sample_rate: u32,
    direction: &'static str,
) -> Result<StreamConfig, DeviceError> {
    configs
        .filter(|c| {
            c.min_sample_rate() <= SampleRate(sample_rate)
                && c.max_sample_rate() >= SampleRate(sample_rate)
        })
        .min_by_key(|c| c.channels())
        .map(|c| c.with_sample_rate(SampleRate(sample_rate)).config())
        .ok_or_else(|| DeviceError::UnsupportedConfig {
            direction,
            detail: format!("{sample_rate} Hz"),
        })
}

fn stream_error(err: StreamError) -> DeviceError {
    match err {
        StreamError::DeviceNotAvailable => DeviceError::Disconnected,
        other => DeviceError::Stream(other.to_string()),
    }
}

/// Shared between a port and its stream's error callback.
struct Fault {
    tx: Sender<DeviceError>,
    rx: Receiver<DeviceError>,
}

impl Fault {
    fn new() -> Self {
        let (tx, rx) = crossbeam_channel::bounded(4);
        Self { tx, rx }
    }

    fn check(&self) -> Result<(), DeviceError> {
        match self.rx.try_recv() {
            Ok(err) => Err(err),
            Err(_) => Ok(()),
        }
    }
}

/// Output starvation, counted by the output callback.
///
/// Silence before the first queued sample is expected and not counted.
#[derive(Default)]
struct Underrun {
    primed: AtomicBool,
    starved: AtomicUsize,
}

impl Underrun {
    fn record(&self, fed: bool) {
        if fed {
            self.primed.store(true, Ordering::Relaxed);
            self.starved.store(0, Ordering::Relaxed);
        } else if self.primed.load(Ordering::Relaxed) {
            self.starved.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn check(&self, limit: usize) -> Result<(), DeviceError> {
        let starved = self.starved.swap(0, Ordering::Relaxed);
        if starved > limit {
            Err(DeviceError::Stream(format!(
                "output underrun: {starved} samples played as silence"
            )))
        } else {
            Ok(())
        }
    }
}

pub struct CpalCapturePort {
    samples: Receiver<f32>,
    overrun: Arc<AtomicBool>,
    fault: Fault,
    _stream: Stream,
}

impl CpalCapturePort {
    pub fn open(format: FrameFormat) -> Result<Self, DeviceError> {
        let device = cpal::default_host()
            .default_input_device()
            .ok_or(DeviceError::NoDevice("input"))?;
        let configs = device
            .supported_input_configs()
            .map_err(|e| DeviceError::Stream(e.to_string()))?;
        let config = pick_config(configs, format.sample_rate, "input")?;

        log::debug!(
            "Opening capture on {} ({} Hz, {} channels)",
            device.name().unwrap_or_default(),
            format.sample_rate,
            config.channels
        );

        let (tx, samples) = crossbeam_channel::bounded(format.frame_size * CAPTURE_QUEUE_FRAMES);
        let overrun = Arc::new(AtomicBool::new(false));
        let fault = Fault::new();
        let stream = build_input(&device, &config, tx, overrun.clone(), fault.tx.clone())?;
        stream
            .play()
            .map_err(|e| DeviceError::Stream(e.to_string()))?;

        Ok(Self {
            samples,
            overrun,
            fault,
            _stream: stream,
        })
    }
}

fn build_input(
    device: &Device,
    config: &StreamConfig,
    tx: Sender<f32>,
    overrun: Arc<AtomicBool>,
    fault: Sender<DeviceError>,
) -> Result<Stream, DeviceError> {
    let channels = config.channels.max(1) as usize;
    device
        .build_input_stream(
            config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                // First channel only; the engine is mono.
                for sample in data.iter().step_by(channels) {
                    if let Err(TrySendError::Full(_)) = tx.try_send(*sample) {
                        overrun.store(true, Ordering::Relaxed);
                    }
                }
            },
            move |err| {
                let _ = fault.try_send(stream_error(err));
            },
            None,
        )
        .map_err(|e| DeviceError::Stream(e.to_string()))
}

impl CapturePort for CpalCapturePort {
    fn read_frame(&mut self, frame: &mut Frame) -> Result<(), DeviceError> {
        self.fault.check()?;
        if self.overrun.swap(false, Ordering::Relaxed) {
            return Err(DeviceError::Stream("input overrun".to_string()));
        }

        for slot in frame.samples_mut() {
            *slot = match self.samples.recv_timeout(DEVICE_TIMEOUT) {
                Ok(sample) => sample,
                Err(RecvTimeoutError::Timeout) => {
                    self.fault.check()?;
                    return Err(DeviceError::Timeout(DEVICE_TIMEOUT.as_millis() as u64));
                }
                Err(RecvTimeoutError::Disconnected) => return Err(DeviceError::Disconnected),
            };
        }
        Ok(())
    }
}

pub struct CpalPlaybackPort {
    samples: Sender<f32>,
    underrun: Arc<Underrun>,
    underrun_limit: usize,
    fault: Fault,
    _stream: Stream,
}

impl CpalPlaybackPort {
    pub fn open(format: FrameFormat) -> Result<Self, DeviceError> {
        let device = cpal::default_host()
            .default_output_device()
            .ok_or(DeviceError::NoDevice("output"))?;
        let configs = device
            .supported_output_configs()
            .map_err(|e| DeviceError::Stream(e.to_string()))?;
        let config = pick_config(configs, format.sample_rate, "output")?;

        log::debug!(
            "Opening playback on {} ({} Hz, {} channels)",
            device.name().unwrap_or_default(),
            format.sample_rate,
            config.channels
        );

        let (samples, rx) = crossbeam_channel::bounded(format.frame_size * PLAYBACK_QUEUE_FRAMES);
        let underrun = Arc::new(Underrun::default());
        let fault = Fault::new();
        let stream = build_output(&device, &config, rx, underrun.clone(), fault.tx.clone())?;
        stream
            .play()
            .map_err(|e| DeviceError::Stream(e.to_string()))?;

        Ok(Self {
            samples,
            underrun,
            underrun_limit: format.frame_size * UNDERRUN_LIMIT_FRAMES,
            fault,
            _stream: stream,
        })
    }
}

fn build_output(
    device: &Device,
    config: &StreamConfig,
    rx: Receiver<f32>,
    underrun: Arc<Underrun>,
    fault: Sender<DeviceError>,
) -> Result<Stream, DeviceError> {
    let channels = config.channels.max(1) as usize;
    device
        .build_output_stream(
            config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                for out in data.chunks_mut(channels) {
                    let sample = rx.try_recv().ok();
                    underrun.record(sample.is_some());
                    out.fill(sample.unwrap_or(0.0));
                }
            },
            move |err| {
                let _ = fault.try_send(stream_error(err));
            },
            None,
        )
        .map_err(|e| DeviceError::Stream(e.to_string()))
}

impl PlaybackPort for CpalPlaybackPort {
    fn write_frame(&mut self, frame: &Frame) -> Result<(), DeviceError> {
        self.fault.check()?;
        self.underrun.check(self.underrun_limit)?;
        for sample in frame.samples() {
            match self.samples.send_timeout(*sample, DEVICE_TIMEOUT) {
                Ok(()) => {}
                Err(SendTimeoutError::Timeout(_)) => {
                    self.fault.check()?;
                    return Err(DeviceError::Timeout(DEVICE_TIMEOUT.as_millis() as u64));
                }
                Err(SendTimeoutError::Disconnected(_)) => return Err(DeviceError::Disconnected),
            }
        }
        Ok(())
    }

    fn drain(&mut self) -> Result<(), DeviceError> {
        let started = Instant::now();
        while !self.samples.is_empty() {
            self.fault.check()?;
            if started.elapsed() > DEVICE_TIMEOUT {
                return Err(DeviceError::Timeout(DEVICE_TIMEOUT.as_millis() as u64));
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        Ok(())
    }
}

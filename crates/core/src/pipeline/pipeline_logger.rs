use std::collections::BTreeMap;
use std::time::Instant;

/// Cross-cutting logger for practice session events.
///
/// Keeps the session use case independent of where its output goes
/// (log crate, a terminal UI, nothing at all in tests). Never called from
/// inside an audio tick.
pub trait PipelineLogger: Send {
    /// Record how long a named stage (record, transcribe, align, ...) took.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. similarity, peak level).
    fn metric(&mut self, name: &str, value: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-session summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Logger that forwards messages to the `log` crate and keeps per-stage
/// timings and metrics for an end-of-session summary.
pub struct StdoutPipelineLogger {
    timings: BTreeMap<String, Vec<f64>>,
    metrics: BTreeMap<String, Vec<f64>>,
    start_time: Instant,
    messages: Vec<String>,
}

impl StdoutPipelineLogger {
    pub fn new() -> Self {
        Self {
            timings: BTreeMap::new(),
            metrics: BTreeMap::new(),
            start_time: Instant::now(),
            messages: Vec::new(),
        }
    }

    /// Returns the formatted summary string, or `None` if no data recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_s = self.start_time.elapsed().as_secs_f64();
        let mut lines = vec![format!("Session summary ({elapsed_s:.1}s total):")];

        for (stage, durations) in &self.timings {
            let total_ms: f64 = durations.iter().sum();
            lines.push(format!(
                "  {stage:12}: {} runs, avg {:7.1}ms  total {total_ms:8.0}ms",
                durations.len(),
                mean(durations)
            ));
        }

        for (name, values) in &self.metrics {
            let last = values.last().copied().unwrap_or(0.0);
            lines.push(format!("  {name}: avg {:.2}, last {last:.2}", mean(values)));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(|v| v.as_slice())
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn timing(&mut self, stage: &str, duration_ms: f64) {
        log::debug!("{stage} took {duration_ms:.1}ms");
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics
            .entry(name.to_string())
            .or_default()
            .push(value);
    }

    fn info(&mut self, message: &str) {
        self.messages.push(message.to_string());
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

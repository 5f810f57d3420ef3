use std::collections::HashMap;
use std::time::Instant;

/// Observer for presentation-loop events.
///
/// Keeps the loop free of output concerns; the CLI logs through `log`,
/// tests pass the null logger.
pub trait PlaybackLogger {
    /// Report that a picture was published.
    fn progress(&mut self, pictures_published: u64, loops: u64);

    /// Record how long a named stage took within one tick.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. pacer accumulator).
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// Emit an end-of-playback summary. Default: no-op.
    fn summary(&self) {}
}

pub struct NullPlaybackLogger;

impl PlaybackLogger for NullPlaybackLogger {
    fn progress(&mut self, _pictures_published: u64, _loops: u64) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Logger for the CLI: per-stage timings and metrics, summarized when
/// playback stops.
///
/// Progress lines are throttled to one per `throttle_pictures` pictures.
pub struct StdoutPlaybackLogger {
    throttle_pictures: u64,
    timings: HashMap<String, Vec<f64>>,
    metrics: HashMap<String, Vec<f64>>,
    start_time: Instant,
    pictures: u64,
    loops: u64,
    messages: Vec<String>,
}

impl StdoutPlaybackLogger {
    pub fn new(throttle_pictures: u64) -> Self {
        Self {
            throttle_pictures: throttle_pictures.max(1),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            pictures: 0,
            loops: 0,
            messages: Vec::new(),
        }
    }

    /// Returns the formatted summary, or `None` if nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_s = self.start_time.elapsed().as_secs_f64();
        let mut lines = vec![format!(
            "Playback summary ({} pictures, {} loops, {elapsed_s:.1}s):",
            self.pictures, self.loops
        )];

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let durations = &self.timings[stage];
            let total_ms: f64 = durations.iter().sum();
            let max_ms = durations.iter().copied().fold(0.0, f64::max);
            lines.push(format!(
                "  {stage:8}: avg {:6.2}ms  max {max_ms:6.2}ms  total {total_ms:7.0}ms  ({} ticks)",
                mean(durations),
                durations.len()
            ));
        }

        let mut names: Vec<_> = self.metrics.keys().collect();
        names.sort();
        for name in names {
            lines.push(format!("  {name}: avg {:.3}", mean(&self.metrics[name])));
        }

        if self.pictures > 0 && elapsed_s > 0.0 {
            lines.push(format!(
                "  Presented: {:.1} pictures/s",
                self.pictures as f64 / elapsed_s
            ));
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

impl Default for StdoutPlaybackLogger {
    fn default() -> Self {
        Self::new(100)
    }
}

impl PlaybackLogger for StdoutPlaybackLogger {
    fn progress(&mut self, pictures_published: u64, loops: u64) {
        if loops > self.loops {
            log::info!("Loop {loops} started");
        }
        self.pictures = pictures_published;
        self.loops = loops;
        if pictures_published % self.throttle_pictures == 0 {
            log::info!("Presented {pictures_published} pictures");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
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

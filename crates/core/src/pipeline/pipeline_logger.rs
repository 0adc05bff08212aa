use std::collections::HashMap;
use std::time::Instant;

/// Cross-cutting logger for pipeline orchestration events.
///
/// Decouples use cases from specific output mechanisms so each caller can
/// observe conversion progress without changing the orchestration code.
pub trait PipelineLogger: Send {
    /// Report item-level progress (utterances, images, landmark files).
    fn progress(&mut self, current: usize, total: usize);

    /// Record how long a named stage took for one item.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Add `amount` to a named counter (e.g. frames written, frames without a face).
    fn count(&mut self, name: &str, amount: usize);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events. Used by tests.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn count(&mut self, _name: &str, _amount: usize) {}
    fn info(&mut self, _message: &str) {}
}

/// CLI-oriented logger that tracks per-stage timing and counters, and
/// provides a summary report at the end of a run.
///
/// Progress output is throttled to every `throttle_items` items.
pub struct StdoutPipelineLogger {
    throttle_items: usize,
    unit: &'static str,
    timings: HashMap<String, Vec<f64>>,
    counters: HashMap<String, usize>,
    start_time: Instant,
    total_items: usize,
    messages: Vec<String>,
}

impl StdoutPipelineLogger {
    /// `unit` names what progress counts, e.g. `"utterances"`.
    pub fn new(throttle_items: usize, unit: &'static str) -> Self {
        Self {
            throttle_items: throttle_items.max(1),
            unit,
            timings: HashMap::new(),
            counters: HashMap::new(),
            start_time: Instant::now(),
            total_items: 0,
            messages: Vec::new(),
        }
    }

    /// Returns the formatted summary string, or `None` if no data recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.counters.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let items = self.total_items;
        let unit = self.unit;
        let mut lines = Vec::new();

        lines.push(format!(
            "Pipeline summary ({items} {unit}, {:.1}s total):",
            elapsed_ms / 1000.0
        ));

        let mut counter_names: Vec<_> = self.counters.keys().collect();
        counter_names.sort();
        for name in counter_names {
            lines.push(format!("  {name:16}: {}", self.counters[name]));
        }

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let durations = &self.timings[stage];
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = if durations.is_empty() {
                0.0
            } else {
                total_ms / durations.len() as f64
            };
            lines.push(format!(
                "  {stage:16}: avg {avg_ms:8.1}ms  total {total_ms:9.0}ms"
            ));
        }

        if items > 0 && elapsed_ms > 0.0 {
            let rate = items as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {rate:.2} {unit}/s"));
        }

        Some(lines.join("\n"))
    }

    /// Returns the timing data for a given stage.
    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    /// Returns the running total of a counter.
    pub fn counter(&self, name: &str) -> usize {
        self.counters.get(name).copied().unwrap_or(0)
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(10, "items")
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.total_items = total;
        if total > 0 && (current % self.throttle_items == 0 || current == total) {
            let pct = current as f64 / total as f64 * 100.0;
            log::info!("Processing: {current}/{total} {} ({pct:.1}%)", self.unit);
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn count(&mut self, name: &str, amount: usize) {
        *self.counters.entry(name.to_string()).or_default() += amount;
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

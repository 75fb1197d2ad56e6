//! Structured progress reporting for index builds.
//!
//! A build moves through the phases "scan", "load", "chunk", "embed" and
//! "persist". Each step emits a [`ProgressEvent`] to an optional callback and
//! to `tracing` at debug level.

use std::sync::Arc;
use std::time::Instant;

/// Progress event emitted during an index build.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub phase: &'static str,

    /// Work done so far (files, chunks, entries)
    pub current: u64,

    /// Total expected work, if known
    pub total: Option<u64>,

    /// Percentage complete (0.0 - 100.0)
    pub percentage: Option<f64>,

    pub message: String,

    /// Seconds since the reporter was created
    pub elapsed_secs: f64,
}

impl ProgressEvent {
    pub fn new(phase: &'static str, current: u64, total: Option<u64>, message: impl Into<String>) -> Self {
        let percentage = total.map(|t| if t > 0 { (current as f64 / t as f64) * 100.0 } else { 100.0 });

        Self {
            phase,
            current,
            total,
            percentage,
            message: message.into(),
            elapsed_secs: 0.0,
        }
    }

    /// Format as a simple user-facing line.
    pub fn format_simple(&self) -> String {
        let progress = match self.total {
            Some(total) => format!("{}/{}", self.current, total),
            None => self.current.to_string(),
        };
        let pct = self
            .percentage
            .map(|p| format!(" ({:.0}%)", p))
            .unwrap_or_default();

        format!("[{}] {}{} - {}", self.phase, progress, pct, self.message)
    }
}

/// Callback for progress events.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

#[derive(Clone)]
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
    start_time: Instant,
}

impl ProgressReporter {
    pub fn new(callback: ProgressCallback) -> Self {
        Self {
            callback: Some(callback),
            start_time: Instant::now(),
        }
    }

    /// Reporter that only logs.
    pub fn noop() -> Self {
        Self {
            callback: None,
            start_time: Instant::now(),
        }
    }

    pub fn emit(&self, mut event: ProgressEvent) {
        event.elapsed_secs = self.start_time.elapsed().as_secs_f64();

        tracing::debug!(
            phase = event.phase,
            current = event.current,
            total = ?event.total,
            elapsed_secs = event.elapsed_secs,
            "{}",
            event.message
        );

        if let Some(callback) = &self.callback {
            callback(event);
        }
    }

    pub fn scan(&self, files: usize, root: &str) {
        self.emit(ProgressEvent::new(
            "scan",
            files as u64,
            None,
            format!("found {} files under {}", files, root),
        ));
    }

    pub fn load(&self, documents: usize) {
        self.emit(ProgressEvent::new(
            "load",
            documents as u64,
            None,
            format!("{} documents matched the allowed extensions", documents),
        ));
    }

    pub fn chunk(&self, documents: usize, chunks: usize) {
        self.emit(ProgressEvent::new(
            "chunk",
            chunks as u64,
            None,
            format!("{} chunks from {} documents", chunks, documents),
        ));
    }

    pub fn embed(&self, done: usize, total: usize, model: &str) {
        self.emit(ProgressEvent::new(
            "embed",
            done as u64,
            Some(total as u64),
            format!("model={}", model),
        ));
    }

    pub fn persist(&self, entries: usize, path: &str) {
        self.emit(ProgressEvent::new(
            "persist",
            entries as u64,
            Some(entries as u64),
            format!("wrote {}", path),
        ));
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::noop()
    }
}

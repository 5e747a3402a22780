//! Coarse progress reporting for a population run.
//!
//! The engine reports `(phase index, phase count, label)` to whatever sink
//! the caller injects. Indices are 1-based.

use parking_lot::Mutex;

/// Receives phase transitions.
pub trait ProgressSink: Send + Sync {
    fn phase(&self, index: usize, total: usize, label: &str);
}

/// Discards progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn phase(&self, _index: usize, _total: usize, _label: &str) {}
}

/// Logs each phase at `info`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn phase(&self, index: usize, total: usize, label: &str) {
        tracing::info!("{label}… ({index}/{total})");
    }
}

/// One reported phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub index: usize,
    pub total: usize,
    pub label: String,
}

/// Keeps every reported phase, for inspection.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Phases reported so far, in order.
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().clone()
    }

    pub fn labels(&self) -> Vec<String> {
        self.events.lock().iter().map(|e| e.label.clone()).collect()
    }
}

impl ProgressSink for RecordingProgress {
    fn phase(&self, index: usize, total: usize, label: &str) {
        self.events.lock().push(ProgressEvent {
            index,
            total,
            label: label.to_string(),
        });
    }
}

impl<T: ProgressSink + ?Sized> ProgressSink for &T {
    fn phase(&self, index: usize, total: usize, label: &str) {
        (**self).phase(index, total, label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_keeps_order() {
        let sink = RecordingProgress::new();
        sink.phase(1, 2, "building courses");
        sink.phase(2, 2, "building students");
        assert_eq!(sink.labels(), vec!["building courses", "building students"]);
        assert_eq!(sink.events()[1].index, 2);
        assert_eq!(sink.events()[1].total, 2);
    }

    #[test]
    fn test_sink_usable_through_reference() {
        fn report(sink: &dyn ProgressSink) {
            sink.phase(1, 1, "only");
        }
        let sink = RecordingProgress::new();
        report(&sink);
        report(&&sink);
        NoProgress.phase(1, 1, "ignored");
        assert_eq!(sink.events().len(), 2);
    }
}

//! Outward progress and diagnostic channel.
//!
//! The core never talks to a presentation layer directly. Every progress
//! update and every line of diagnostic text is emitted, synchronously and in
//! evaluation order, as a [`RunEvent`] on an [`EventSink`]. A consumer that
//! does blocking work per event (redrawing a window, writing a file) should
//! use the [`std::sync::mpsc::Sender`] implementation and drain the receiver
//! on its own thread.

use std::sync::mpsc::Sender;
use std::sync::Mutex;

/// One message from a running optimisation.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    /// Fraction of the evaluation budget used so far, in `[0, 1]`.
    /// Non-decreasing across a run.
    Progress(f64),
    /// A block of human-readable diagnostic text.
    Diagnostic(String),
    /// The run stopped on a fatal error. No result follows.
    Failed(String),
}

/// Receives events from the core.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: RunEvent);

    fn progress(&self, fraction: f64) {
        self.emit(RunEvent::Progress(fraction));
    }

    fn diagnostic(&self, text: String) {
        self.emit(RunEvent::Diagnostic(text));
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: RunEvent) {}
}

/// Buffers events in memory. Used by tests and headless callers that want
/// the full diagnostic transcript after the run.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<RunEvent>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every event recorded so far, leaving the buffer empty.
    pub fn drain(&self) -> Vec<RunEvent> {
        match self.events.lock() {
            Ok(mut events) => std::mem::take(&mut *events),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    /// All progress values recorded so far, in order.
    pub fn progress_values(&self) -> Vec<f64> {
        self.snapshot()
            .into_iter()
            .filter_map(|e| match e {
                RunEvent::Progress(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    /// All diagnostic text recorded so far, concatenated.
    pub fn transcript(&self) -> String {
        self.snapshot()
            .into_iter()
            .filter_map(|e| match e {
                RunEvent::Diagnostic(text) | RunEvent::Failed(text) => Some(text),
                RunEvent::Progress(_) => None,
            })
            .collect()
    }

    fn snapshot(&self) -> Vec<RunEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl EventSink for CollectingSink {
    fn emit(&self, event: RunEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

/// Forward events to another thread. A disconnected receiver is ignored:
/// the run continues and its result is still returned to the caller.
impl EventSink for Sender<RunEvent> {
    fn emit(&self, event: RunEvent) {
        let _ = self.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_collecting_sink_preserves_order() {
        let sink = CollectingSink::new();
        sink.progress(0.1);
        sink.diagnostic("a\n".into());
        sink.progress(0.2);
        sink.diagnostic("b\n".into());

        assert_eq!(sink.progress_values(), vec![0.1, 0.2]);
        assert_eq!(sink.transcript(), "a\nb\n");
        assert_eq!(sink.drain().len(), 4);
        assert!(sink.drain().is_empty());
    }

    #[test]
    fn test_channel_sink() {
        let (tx, rx) = mpsc::channel();
        tx.diagnostic("hello".into());
        tx.progress(0.5);
        drop(tx);
        let received: Vec<RunEvent> = rx.iter().collect();
        assert_eq!(
            received,
            vec![RunEvent::Diagnostic("hello".into()), RunEvent::Progress(0.5)]
        );
    }

    #[test]
    fn test_channel_sink_survives_dropped_receiver() {
        let (tx, rx) = mpsc::channel::<RunEvent>();
        drop(rx);
        tx.progress(1.0);
    }
}

//! Diagnostics sinks for the discovery pipeline
//!
//! Components never log on their own. They report what they decide to a
//! [`Diagnostics`] implementation handed to them by the caller.

use crate::classifier::{Candidate, RejectReason};
use crate::{Prefix, PrefixError};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, trace, warn};

/// Receiver for per-address pipeline events
pub trait Diagnostics {
    /// A raw candidate was read from the address source
    fn observed(&self, _candidate: &Candidate) {}

    /// A candidate could not be parsed and was skipped
    fn unparseable(&self, _candidate: &Candidate, _error: &PrefixError) {}

    /// A parsed address was filtered out
    fn rejected(&self, _prefix: &Prefix, _reason: RejectReason) {}

    /// A new canonical prefix entered the eligible set
    fn accepted(&self, _prefix: &Prefix) {}

    /// A candidate reduced to a prefix already in the eligible set
    fn collapsed(&self, _prefix: &Prefix, _into: &Prefix) {}
}

impl<T: Diagnostics + ?Sized> Diagnostics for &T {
    fn observed(&self, candidate: &Candidate) {
        (**self).observed(candidate)
    }

    fn unparseable(&self, candidate: &Candidate, error: &PrefixError) {
        (**self).unparseable(candidate, error)
    }

    fn rejected(&self, prefix: &Prefix, reason: RejectReason) {
        (**self).rejected(prefix, reason)
    }

    fn accepted(&self, prefix: &Prefix) {
        (**self).accepted(prefix)
    }

    fn collapsed(&self, prefix: &Prefix, into: &Prefix) {
        (**self).collapsed(prefix, into)
    }
}

/// Fan events out to two sinks
impl<A: Diagnostics, B: Diagnostics> Diagnostics for (A, B) {
    fn observed(&self, candidate: &Candidate) {
        self.0.observed(candidate);
        self.1.observed(candidate);
    }

    fn unparseable(&self, candidate: &Candidate, error: &PrefixError) {
        self.0.unparseable(candidate, error);
        self.1.unparseable(candidate, error);
    }

    fn rejected(&self, prefix: &Prefix, reason: RejectReason) {
        self.0.rejected(prefix, reason);
        self.1.rejected(prefix, reason);
    }

    fn accepted(&self, prefix: &Prefix) {
        self.0.accepted(prefix);
        self.1.accepted(prefix);
    }

    fn collapsed(&self, prefix: &Prefix, into: &Prefix) {
        self.0.collapsed(prefix, into);
        self.1.collapsed(prefix, into);
    }
}

/// Drops every event
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopDiagnostics;

impl Diagnostics for NoopDiagnostics {}

/// Emits pipeline events as `tracing` events
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn observed(&self, candidate: &Candidate) {
        trace!(topic = "Discovery", candidate = %candidate, "observed address");
    }

    fn unparseable(&self, candidate: &Candidate, error: &PrefixError) {
        warn!(topic = "Discovery", candidate = %candidate, error = %error, "invalid IP");
    }

    fn rejected(&self, prefix: &Prefix, reason: RejectReason) {
        debug!(topic = "Discovery", route = %prefix, reason = %reason, "not acceptable elastic IP");
    }

    fn accepted(&self, prefix: &Prefix) {
        debug!(topic = "Discovery", route = %prefix, "handling prefix");
    }

    fn collapsed(&self, prefix: &Prefix, into: &Prefix) {
        debug!(topic = "Discovery", route = %prefix, into = %into, "collapsed into existing prefix");
    }
}

/// A single recorded pipeline event
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticEvent {
    Observed(String),
    Unparseable(String),
    Rejected(Prefix, RejectReason),
    Accepted(Prefix),
    Collapsed(Prefix, Prefix),
}

/// Keeps every event in memory, in arrival order
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Rejections only, with their reasons
    pub fn rejections(&self) -> Vec<(Prefix, RejectReason)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                DiagnosticEvent::Rejected(prefix, reason) => Some((prefix, reason)),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: DiagnosticEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn observed(&self, candidate: &Candidate) {
        self.push(DiagnosticEvent::Observed(candidate.to_string()));
    }

    fn unparseable(&self, candidate: &Candidate, _error: &PrefixError) {
        self.push(DiagnosticEvent::Unparseable(candidate.to_string()));
    }

    fn rejected(&self, prefix: &Prefix, reason: RejectReason) {
        self.push(DiagnosticEvent::Rejected(*prefix, reason));
    }

    fn accepted(&self, prefix: &Prefix) {
        self.push(DiagnosticEvent::Accepted(*prefix));
    }

    fn collapsed(&self, prefix: &Prefix, into: &Prefix) {
        self.push(DiagnosticEvent::Collapsed(*prefix, *into));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_keeps_order() {
        let recorder = RecordingDiagnostics::new();
        let prefix = Prefix::parse("203.0.113.5/32").unwrap();
        recorder.observed(&Candidate::from("203.0.113.5/32"));
        recorder.accepted(&prefix);

        assert_eq!(
            recorder.events(),
            vec![
                DiagnosticEvent::Observed("203.0.113.5/32".to_string()),
                DiagnosticEvent::Accepted(prefix),
            ]
        );
    }

    #[test]
    fn test_recording_survives_poisoned_lock() {
        let recorder = std::sync::Arc::new(RecordingDiagnostics::new());
        recorder.observed(&Candidate::from("203.0.113.5/32"));

        let holder = recorder.clone();
        let _ = std::thread::spawn(move || {
            let _guard = holder.events.lock().unwrap();
            panic!("poison the event log");
        })
        .join();
        assert!(recorder.events.is_poisoned());

        recorder.observed(&Candidate::from("198.51.100.1/32"));
        assert_eq!(
            recorder.events(),
            vec![
                DiagnosticEvent::Observed("203.0.113.5/32".to_string()),
                DiagnosticEvent::Observed("198.51.100.1/32".to_string()),
            ]
        );
    }

    #[test]
    fn test_fanout_reaches_both_sinks() {
        let first = RecordingDiagnostics::new();
        let second = RecordingDiagnostics::new();
        let tee = (&first, &second);
        let prefix = Prefix::parse("127.0.0.1/8").unwrap();

        tee.rejected(&prefix, RejectReason::Loopback);

        assert_eq!(first.rejections(), vec![(prefix, RejectReason::Loopback)]);
        assert_eq!(second.rejections(), vec![(prefix, RejectReason::Loopback)]);
    }
}

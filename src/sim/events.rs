//! Scheduling event stream.
//!
//! The controller pushes one [`SchedEvent`] per scheduling or execution
//! step into an injected [`EventSink`]. The core never writes files; sinks
//! decide where events go.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

use crate::models::TaskId;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// A frame was sealed.
    FrameSealed,
    /// A single task exceeded frame capacity and was sent alone.
    OversizedFrame,
    /// All frames crossed the link.
    Transmitted,
    /// A task entered the ready queue after transmission.
    Admitted,
    /// A preempted task went back to the ready queue.
    Requeued,
    /// A task was handed to a core.
    Assigned,
    /// A task used its whole quantum and went back to the queue.
    Preempted,
    /// A task ran out of operations and was retired.
    Completed,
    /// A task entered a simulated I/O wait.
    Blocked,
    /// A blocked task became ready again.
    Unblocked,
    /// Processors were re-ranked by load and a dispatch round placed work.
    Rebalanced,
    /// Queue drained and every core idle.
    RunFinished,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventKind::FrameSealed => "frame-sealed",
            EventKind::OversizedFrame => "oversized-frame",
            EventKind::Transmitted => "transmitted",
            EventKind::Admitted => "admitted",
            EventKind::Requeued => "requeued",
            EventKind::Assigned => "assigned",
            EventKind::Preempted => "preempted",
            EventKind::Completed => "completed",
            EventKind::Blocked => "blocked",
            EventKind::Unblocked => "unblocked",
            EventKind::Rebalanced => "rebalanced",
            EventKind::RunFinished => "run-finished",
        };
        f.write_str(s)
    }
}

/// One structured scheduling record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedEvent {
    /// Virtual tick at which the event happened.
    pub at: u64,
    /// Processor involved, if any.
    pub processor: Option<usize>,
    /// Core index within the processor, if any.
    pub core: Option<usize>,
    /// Task involved, if any.
    pub task: Option<TaskId>,
    /// Event classification.
    pub kind: EventKind,
    /// Task operations left after the event (0 when no task is involved).
    pub remaining_ops: u64,
}

impl SchedEvent {
    /// Creates an event with no processor, core or task attached.
    pub fn new(at: u64, kind: EventKind) -> Self {
        Self {
            at,
            processor: None,
            core: None,
            task: None,
            kind,
            remaining_ops: 0,
        }
    }

    /// Attaches a task and its remaining operations.
    pub fn with_task(mut self, task: TaskId, remaining_ops: u64) -> Self {
        self.task = Some(task);
        self.remaining_ops = remaining_ops;
        self
    }

    /// Attaches a processor/core location.
    pub fn on_core(mut self, processor: usize, core: usize) -> Self {
        self.processor = Some(processor);
        self.core = Some(core);
        self
    }
}

impl fmt::Display for SchedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[t={}]", self.at)?;
        if let (Some(p), Some(c)) = (self.processor, self.core) {
            write!(f, " P{p}/C{c}")?;
        }
        write!(f, " {}", self.kind)?;
        if let Some(task) = self.task {
            write!(f, " task={} remaining={}", task, self.remaining_ops)?;
        }
        Ok(())
    }
}

/// Receiver of scheduling events.
pub trait EventSink: Send {
    /// Consumes one event.
    fn record(&mut self, event: &SchedEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn record(&mut self, _event: &SchedEvent) {}
}

/// Forwards events to the `log` facade at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn record(&mut self, event: &SchedEvent) {
        match event.kind {
            EventKind::OversizedFrame => log::warn!("{event}"),
            _ => log::debug!("{event}"),
        }
    }
}

/// Bounded in-memory event log.
///
/// Keeps the most recent `cap` events; older ones are evicted first.
#[derive(Debug, Clone)]
pub struct EventLog {
    cap: usize,
    buf: VecDeque<SchedEvent>,
}

impl EventLog {
    /// Creates a log retaining at least one event.
    pub fn new(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            cap,
            buf: VecDeque::with_capacity(cap.min(4096)),
        }
    }

    /// Creates a log that never evicts.
    pub fn unbounded() -> Self {
        Self {
            cap: usize::MAX,
            buf: VecDeque::new(),
        }
    }

    /// Retained events in chronological order.
    pub fn events(&self) -> impl Iterator<Item = &SchedEvent> {
        self.buf.iter()
    }

    /// Retained events of one kind.
    pub fn of_kind(&self, kind: EventKind) -> impl Iterator<Item = &SchedEvent> {
        self.buf.iter().filter(move |e| e.kind == kind)
    }

    /// Number of retained events.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been retained.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl EventSink for EventLog {
    fn record(&mut self, event: &SchedEvent) {
        if self.buf.len() == self.cap {
            self.buf.pop_front();
        }
        self.buf.push_back(event.clone());
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn record(&mut self, event: &SchedEvent) {
        (**self).record(event);
    }
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn record(&mut self, event: &SchedEvent) {
        (**self).record(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_line() {
        let ev = SchedEvent::new(42, EventKind::Assigned)
            .on_core(1, 2)
            .with_task(7, 30);
        assert_eq!(ev.to_string(), "[t=42] P1/C2 assigned task=7 remaining=30");

        let ev = SchedEvent::new(0, EventKind::Transmitted);
        assert_eq!(ev.to_string(), "[t=0] transmitted");
    }

    #[test]
    fn test_event_log_evicts_oldest() {
        let mut log = EventLog::new(2);
        for t in 0..3 {
            log.record(&SchedEvent::new(t, EventKind::Admitted));
        }
        let ticks: Vec<_> = log.events().map(|e| e.at).collect();
        assert_eq!(ticks, vec![1, 2]);
    }

    #[test]
    fn test_of_kind() {
        let mut log = EventLog::unbounded();
        log.record(&SchedEvent::new(0, EventKind::Admitted));
        log.record(&SchedEvent::new(1, EventKind::Completed));
        log.record(&SchedEvent::new(2, EventKind::Admitted));
        assert_eq!(log.of_kind(EventKind::Admitted).count(), 2);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_forwarding_through_mut_ref() {
        fn push<S: EventSink>(mut sink: S) {
            sink.record(&SchedEvent::new(5, EventKind::RunFinished));
        }

        let mut log = EventLog::unbounded();
        push(&mut log);
        push(Box::new(NullSink));
        assert_eq!(log.len(), 1);
    }
}

//! Simulation plumbing: the virtual clock and the event stream.

mod clock;
mod events;

pub use clock::{bits_to_ticks, secs_to_ticks, ticks_to_secs, VirtualClock};
pub use events::{EventKind, EventLog, EventSink, LogSink, NullSink, SchedEvent};

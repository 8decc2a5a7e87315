//! Delta attribution: successive readings of a resource become weights owned by an entity.
//!
//! - CPU performance counters, attributed to the process whose timeslice just ended
//! - Timer interrupt resolution, attributed to the level each process held

pub mod counters;
pub mod timers;

pub use counters::{attribute_counters, record_attribution, Attribution, CounterAttributor, CounterProfile};
pub use timers::{attribute_timers, TimerAttributor, TimerEvent, TimerHistory, TimerProfile};

//! Single-threaded event queue on a virtual clock.
//!
//! Frame ticks, glitch timers, resizes and control-panel edits are all events
//! posted here and dispatched one at a time in due-time order (posting order
//! breaks ties). The clock only moves when an event is popped, so a run is
//! fully deterministic and never waits on wall time unless the engine chooses
//! to pace itself.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Duration;

use crate::control::ControlCommand;
use crate::surface::texture::Texture;
use crate::surface::types::SurfaceSize;

/// Point on the virtual clock, in microseconds since start
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct VirtualTime(u64);

impl VirtualTime {
    pub const ZERO: VirtualTime = VirtualTime(0);

    pub fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    pub fn as_micros(&self) -> u64 {
        self.0
    }

    pub fn as_millis_f64(&self) -> f64 {
        self.0 as f64 / 1000.0
    }

    /// Offset from the start of the run
    pub fn since_start(&self) -> Duration {
        Duration::from_micros(self.0)
    }
}

impl std::ops::Add<Duration> for VirtualTime {
    type Output = VirtualTime;

    fn add(self, rhs: Duration) -> VirtualTime {
        VirtualTime(self.0.saturating_add(rhs.as_micros() as u64))
    }
}

/// Duration of a (possibly fractional) number of milliseconds, rounded to a microsecond
pub fn millis(ms: f64) -> Duration {
    Duration::from_micros((ms.max(0.0) * 1000.0).round() as u64)
}

/// Everything the engine reacts to
#[derive(Debug, Clone)]
pub enum Event {
    /// Display refresh: run the frame driver once
    Frame,
    /// Glitch scheduler wake-up while idle
    GlitchWake { token: u64 },
    /// End of an active glitch
    GlitchExpire { token: u64 },
    /// Surface size changed
    Resize(SurfaceSize),
    /// Edit or action from the control panel
    Control(ControlCommand),
    /// Source image decoded
    AssetLoaded(Texture),
    /// Source image could not be loaded
    AssetFailed(String),
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::Frame => "frame",
            Event::GlitchWake { .. } => "glitch-wake",
            Event::GlitchExpire { .. } => "glitch-expire",
            Event::Resize(_) => "resize",
            Event::Control(_) => "control",
            Event::AssetLoaded(_) => "asset-loaded",
            Event::AssetFailed(_) => "asset-failed",
        }
    }
}

#[derive(Debug)]
struct Scheduled {
    due: VirtualTime,
    seq: u64,
    event: Event,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        self.due.cmp(&other.due).then(self.seq.cmp(&other.seq))
    }
}

/// Due-time ordered queue with a virtual clock
#[derive(Debug, Default)]
pub struct EventQueue {
    now: VirtualTime,
    seq: u64,
    heap: BinaryHeap<Reverse<Scheduled>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time: the due time of the last popped event
    pub fn now(&self) -> VirtualTime {
        self.now
    }

    /// Post an event due immediately, after everything already due now
    pub fn post(&mut self, event: Event) {
        self.post_after(Duration::ZERO, event);
    }

    /// Post an event due `delay` after the current virtual time
    pub fn post_after(&mut self, delay: Duration, event: Event) {
        let due = self.now + delay;
        self.heap.push(Reverse(Scheduled { due, seq: self.seq, event }));
        self.seq += 1;
    }

    /// Post an event at an absolute time; times already past are due now
    pub fn post_at(&mut self, at: VirtualTime, event: Event) {
        let due = at.max(self.now);
        self.heap.push(Reverse(Scheduled { due, seq: self.seq, event }));
        self.seq += 1;
    }

    /// Remove the next event and advance the clock to its due time
    pub fn pop(&mut self) -> Option<(VirtualTime, Event)> {
        let Reverse(next) = self.heap.pop()?;
        self.now = next.due;
        Some((next.due, next.event))
    }

    /// Due time of the next event, without removing it
    pub fn peek_due(&self) -> Option<VirtualTime> {
        self.heap.peek().map(|Reverse(s)| s.due)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_pop_in_due_order() {
        let mut queue = EventQueue::new();
        queue.post_after(millis(30.0), Event::GlitchExpire { token: 1 });
        queue.post_after(millis(10.0), Event::Frame);
        queue.post_after(millis(20.0), Event::GlitchWake { token: 2 });

        let names: Vec<&str> = std::iter::from_fn(|| queue.pop()).map(|(_, e)| e.name()).collect();
        assert_eq!(names, vec!["frame", "glitch-wake", "glitch-expire"]);
        assert_eq!(queue.now().as_micros(), 30_000);
    }

    #[test]
    fn test_ties_keep_posting_order() {
        let mut queue = EventQueue::new();
        queue.post(Event::Frame);
        queue.post(Event::AssetFailed("x".to_string()));
        queue.post(Event::GlitchWake { token: 0 });

        assert_eq!(queue.pop().unwrap().1.name(), "frame");
        assert_eq!(queue.pop().unwrap().1.name(), "asset-failed");
        assert_eq!(queue.pop().unwrap().1.name(), "glitch-wake");
        assert!(queue.is_empty());
    }

    #[test]
    fn test_delays_are_relative_to_now() {
        let mut queue = EventQueue::new();
        queue.post_after(millis(16.0), Event::Frame);
        queue.pop();
        queue.post_after(millis(350.0), Event::GlitchExpire { token: 0 });
        assert_eq!(queue.peek_due(), Some(VirtualTime::from_micros(366_000)));
    }

    #[test]
    fn test_post_at_never_goes_back_in_time() {
        let mut queue = EventQueue::new();
        queue.post_after(millis(50.0), Event::Frame);
        queue.pop();
        queue.post_at(VirtualTime::from_micros(10_000), Event::GlitchWake { token: 0 });
        queue.post_at(VirtualTime::from_micros(80_000), Event::Frame);
        assert_eq!(queue.pop().unwrap().0.as_micros(), 50_000);
        assert_eq!(queue.pop().unwrap().0.as_micros(), 80_000);
    }

    #[test]
    fn test_millis_rounds_to_micros() {
        assert_eq!(millis(16.6667), Duration::from_micros(16_667));
        assert_eq!(millis(-5.0), Duration::ZERO);
    }
}

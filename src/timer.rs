//! One-shot timers and the frame clock.
//!
//! The viewer never needs async coordination: delayed work is a handful of
//! one-shot callbacks armed after the model loads. They live in a
//! [`TimerQueue`] and are drained from the event loop, in scheduled order,
//! at the top of each frame. Dispatch happens no earlier than the requested
//! delay; exact spacing depends on the frame cadence.

use instant::{Duration, Instant};

struct TimerEntry<T> {
    due: Instant,
    seq: u64,
    action: T,
}

/// A queue of one-shot delayed actions. Not cancellable; the queue lives as
/// long as the process.
pub struct TimerQueue<T> {
    entries: Vec<TimerEntry<T>>,
    seq: u64,
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            seq: 0,
        }
    }

    /// Schedule `action` to fire `delay` from now.
    pub fn schedule(&mut self, delay: Duration, action: T) {
        self.schedule_at(Instant::now() + delay, action);
    }

    pub fn schedule_at(&mut self, due: Instant, action: T) {
        let seq = self.seq;
        self.seq += 1;
        self.entries.push(TimerEntry { due, seq, action });
    }

    /// Remove and return every action due at `now`, ordered by scheduled
    /// time (insertion order breaks ties).
    pub fn poll(&mut self, now: Instant) -> Vec<T> {
        let mut due = Vec::new();
        let mut i = 0;
        while i < self.entries.len() {
            if self.entries[i].due <= now {
                due.push(self.entries.remove(i));
            } else {
                i += 1;
            }
        }
        due.sort_by_key(|entry| (entry.due, entry.seq));
        due.into_iter().map(|entry| entry.action).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Inter-frame delta tracking. The very first tick only establishes the
/// baseline: no delta exists yet, so the caller skips advancing anything.
pub struct FrameClock {
    last: Option<Instant>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self { last: None }
    }

    pub fn tick(&mut self, now: Instant) -> Option<Duration> {
        let dt = self.last.map(|last| now - last);
        self.last = Some(now);
        dt
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

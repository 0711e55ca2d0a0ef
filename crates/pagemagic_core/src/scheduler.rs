//! Single-threaded tick scheduler on a virtual clock.
//!
//! Every scheduled tick carries the [`Generation`] that was current when it
//! was queued. Starting a new generation invalidates everything queued
//! before it: stale ticks are dropped when they come due instead of being
//! delivered, so a superseded animation can never write into the state of
//! the one that replaced it.
//!
//! The clock only moves when the owner calls [`TickScheduler::pop_due`] /
//! [`TickScheduler::settle`], which keeps replays deterministic and lets a
//! host drive it from real timers, a frame loop, or a test.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Duration;

use serde::Serialize;

/// Monotonically increasing token identifying one run of scheduled work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Generation(u64);

impl Generation {
    /// Raw counter value.
    pub fn value(self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

/// Identifies a scheduled tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickHandle {
    /// Generation the tick was queued under
    pub generation: Generation,
    /// Virtual time at which the tick fires
    pub due: Duration,
    /// Scheduling order, unique within one scheduler
    pub id: u64,
}

struct Entry<T> {
    due: Duration,
    seq: u64,
    generation: Generation,
    payload: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    // Reversed so the BinaryHeap pops the earliest (then oldest) entry first
    fn cmp(&self, other: &Self) -> Ordering {
        (other.due, other.seq).cmp(&(self.due, self.seq))
    }
}

/// Timer queue with generation-based invalidation.
pub struct TickScheduler<T> {
    now: Duration,
    generation: Generation,
    queue: BinaryHeap<Entry<T>>,
    next_seq: u64,
    discarded: u64,
}

impl<T> Default for TickScheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for TickScheduler<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickScheduler")
            .field("now", &self.now)
            .field("generation", &self.generation)
            .field("pending", &self.queue.len())
            .field("discarded", &self.discarded)
            .finish()
    }
}

impl<T> TickScheduler<T> {
    /// A scheduler at time zero, generation zero.
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            generation: Generation::default(),
            queue: BinaryHeap::new(),
            next_seq: 0,
            discarded: 0,
        }
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Current generation.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Start a new generation. Ticks queued under older generations become stale.
    pub fn begin_generation(&mut self) -> Generation {
        self.generation = self.generation.next();
        self.generation
    }

    /// Drop every queued tick. Returns how many were dropped.
    pub fn cancel_pending(&mut self) -> usize {
        let dropped = self.queue.len();
        self.queue.clear();
        dropped
    }

    /// Queue `payload` to fire `delay` after now, under the current generation.
    pub fn schedule(&mut self, delay: Duration, payload: T) -> TickHandle {
        self.schedule_for(self.generation, delay, payload)
    }

    /// Queue `payload` under an explicit generation token.
    pub fn schedule_for(&mut self, generation: Generation, delay: Duration, payload: T) -> TickHandle {
        let seq = self.next_seq;
        self.next_seq += 1;
        let due = self.now + delay;
        self.queue.push(Entry {
            due,
            seq,
            generation,
            payload,
        });
        TickHandle {
            generation,
            due,
            id: seq,
        }
    }

    /// Number of queued ticks, stale ones included.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Time of the earliest queued tick.
    pub fn next_due(&self) -> Option<Duration> {
        self.queue.peek().map(|e| e.due)
    }

    /// Number of stale ticks dropped so far.
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    /// Pop the next live tick due at or before `until`, moving the clock to its due time.
    ///
    /// Stale ticks encountered on the way are dropped.
    pub fn pop_due(&mut self, until: Duration) -> Option<(TickHandle, T)> {
        while let Some(top) = self.queue.peek() {
            if top.due > until {
                break;
            }
            let entry = self.queue.pop()?;
            self.now = self.now.max(entry.due);

            if entry.generation != self.generation {
                self.discarded += 1;
                log::trace!(
                    "Dropping stale tick #{} from generation {} (current {})",
                    entry.seq,
                    entry.generation.value(),
                    self.generation.value()
                );
                continue;
            }

            let handle = TickHandle {
                generation: entry.generation,
                due: entry.due,
                id: entry.seq,
            };
            return Some((handle, entry.payload));
        }
        None
    }

    /// Move the clock forward to `until` once nothing more is due.
    pub fn settle(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn drain(scheduler: &mut TickScheduler<&'static str>, until: Duration) -> Vec<&'static str> {
        let mut fired = Vec::new();
        while let Some((_, payload)) = scheduler.pop_due(until) {
            fired.push(payload);
        }
        scheduler.settle(until);
        fired
    }

    #[test]
    fn test_fires_in_due_then_fifo_order() {
        let mut scheduler = TickScheduler::new();
        scheduler.schedule(ms(30), "c");
        scheduler.schedule(ms(10), "a");
        scheduler.schedule(ms(10), "b");

        assert_eq!(drain(&mut scheduler, ms(20)), vec!["a", "b"]);
        assert_eq!(scheduler.now(), ms(20));
        assert_eq!(scheduler.pending(), 1);
        assert_eq!(drain(&mut scheduler, ms(30)), vec!["c"]);
    }

    #[test]
    fn test_popped_handle_matches_scheduled_handle() {
        let mut scheduler = TickScheduler::new();
        let first = scheduler.schedule(ms(20), "first");
        let second = scheduler.schedule(ms(10), "second");
        assert!(second.id > first.id);

        let (handle, payload) = scheduler.pop_due(ms(20)).unwrap();
        assert_eq!((handle, payload), (second, "second"));
        let (handle, _) = scheduler.pop_due(ms(20)).unwrap();
        assert_eq!(handle, first);
    }

    #[test]
    fn test_delay_is_relative_to_current_time() {
        let mut scheduler = TickScheduler::new();
        scheduler.settle(ms(100));
        let handle = scheduler.schedule(ms(5), "x");
        assert_eq!(handle.due, ms(105));
        assert!(drain(&mut scheduler, ms(104)).is_empty());
        assert_eq!(drain(&mut scheduler, ms(105)), vec!["x"]);
    }

    #[test]
    fn test_stale_generation_is_discarded() {
        let mut scheduler = TickScheduler::new();
        let old = scheduler.generation();
        scheduler.schedule(ms(10), "old");

        let new = scheduler.begin_generation();
        assert!(new > old);
        scheduler.schedule(ms(10), "new");
        // A late callback still holding the previous token
        scheduler.schedule_for(old, ms(5), "late");

        assert_eq!(drain(&mut scheduler, ms(50)), vec!["new"]);
        assert_eq!(scheduler.discarded(), 2);
    }

    #[test]
    fn test_cancel_pending_clears_queue() {
        let mut scheduler = TickScheduler::new();
        scheduler.schedule(ms(1), "a");
        scheduler.schedule(ms(2), "b");
        assert_eq!(scheduler.cancel_pending(), 2);
        assert_eq!(scheduler.next_due(), None);
        assert!(drain(&mut scheduler, ms(10)).is_empty());
    }
}

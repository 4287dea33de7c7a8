//! Deferred Effect Scheduler
//!
//! A priority queue of `(fire_at, seq, generation, target, effect)` entries.
//! The tick driver drains everything that is due at the start of a tick, so a
//! deferred effect never runs in the middle of an entity update.
//!
//! Entries are ordered by fire time, then by insertion sequence, which makes
//! the drain order deterministic when two effects share a fire time.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Duration;

/// A scheduled effect, stamped with the generation of the entity it targets.
#[derive(Clone, Debug)]
pub struct Scheduled<T, E> {
    /// Simulation time at which the effect becomes due
    pub fire_at: Duration,
    /// Insertion order (tie-breaker)
    pub seq: u64,
    /// Generation of `target` captured when the effect was scheduled
    pub generation: u32,
    /// Entity the effect belongs to
    pub target: T,
    /// Effect payload
    pub effect: E,
}

impl<T, E> PartialEq for Scheduled<T, E> {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at == other.fire_at && self.seq == other.seq
    }
}

impl<T, E> Eq for Scheduled<T, E> {}

impl<T, E> PartialOrd for Scheduled<T, E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T, E> Ord for Scheduled<T, E> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.fire_at
            .cmp(&other.fire_at)
            .then(self.seq.cmp(&other.seq))
    }
}

/// Min-heap of scheduled effects keyed on simulation time.
#[derive(Clone, Debug)]
pub struct Scheduler<T, E> {
    queue: BinaryHeap<Reverse<Scheduled<T, E>>>,
    next_seq: u64,
}

impl<T, E> Default for Scheduler<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> Scheduler<T, E> {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self {
            queue: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    /// Schedule `effect` to fire `delay` after `now`.
    pub fn schedule(
        &mut self,
        now: Duration,
        delay: Duration,
        target: T,
        generation: u32,
        effect: E,
    ) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse(Scheduled {
            fire_at: now.saturating_add(delay),
            seq,
            generation,
            target,
            effect,
        }));
    }

    /// Pop the next entry whose fire time is `<= now`.
    pub fn pop_due(&mut self, now: Duration) -> Option<Scheduled<T, E>> {
        match self.queue.peek() {
            Some(Reverse(next)) if next.fire_at <= now => {
                self.queue.pop().map(|Reverse(entry)| entry)
            }
            _ => None,
        }
    }

    /// Remove and return every entry due at `now`, in fire order.
    pub fn drain_due(&mut self, now: Duration) -> Vec<Scheduled<T, E>> {
        let mut due = Vec::new();
        while let Some(entry) = self.pop_due(now) {
            due.push(entry);
        }
        due
    }

    /// Fire time of the earliest entry.
    pub fn next_fire_time(&self) -> Option<Duration> {
        self.queue.peek().map(|Reverse(entry)| entry.fire_at)
    }

    /// Number of queued entries.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// True if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Iterate queued entries in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &Scheduled<T, E>> {
        self.queue.iter().map(|Reverse(entry)| entry)
    }
}

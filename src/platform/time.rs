//! Virtual-clock timer queue
//!
//! Stands in for `setTimeout`/`setInterval` on a single logical thread. The
//! host moves time forward and drains whatever fell due.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use serde::{Deserialize, Serialize};

/// Handle to an armed timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerId(u64);

/// A timer that came due
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired<T> {
    pub id: TimerId,
    /// Scheduled due time (ms)
    pub due_ms: u64,
    pub payload: T,
}

#[derive(Debug, Clone)]
struct Armed<T> {
    payload: T,
    /// Repeat period for intervals
    period_ms: Option<u64>,
    /// Due time of the live heap entry
    due_ms: u64,
}

/// Timer queue ordered by due time, then by arming order
#[derive(Debug, Clone)]
pub struct TimerQueue<T> {
    /// (due, sequence, id); stale entries are skipped on pop
    heap: BinaryHeap<Reverse<(u64, u64, TimerId)>>,
    armed: HashMap<TimerId, Armed<T>>,
    now_ms: u64,
    next_id: u64,
    next_seq: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            armed: HashMap::new(),
            now_ms: 0,
            next_id: 1,
            next_seq: 0,
        }
    }

    /// Current virtual time (ms)
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    fn push(&mut self, id: TimerId, due_ms: u64) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse((due_ms, seq, id)));
    }

    fn arm(&mut self, delay_ms: u64, period_ms: Option<u64>, payload: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let due_ms = self.now_ms + delay_ms;
        self.armed.insert(
            id,
            Armed {
                payload,
                period_ms,
                due_ms,
            },
        );
        self.push(id, due_ms);
        id
    }

    /// Fire once after `delay_ms`
    pub fn set_timeout(&mut self, delay_ms: u64, payload: T) -> TimerId {
        self.arm(delay_ms, None, payload)
    }

    /// Fire every `period_ms` until cancelled. A zero period fires once.
    pub fn set_interval(&mut self, period_ms: u64, payload: T) -> TimerId {
        let period = (period_ms > 0).then_some(period_ms);
        self.arm(period_ms, period, payload)
    }

    /// Disarm a timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.armed.remove(&id).is_some()
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.armed.contains_key(&id)
    }

    pub fn pending_count(&self) -> usize {
        self.armed.len()
    }

    /// Cancel everything
    pub fn clear(&mut self) {
        self.armed.clear();
        self.heap.clear();
    }
}

impl<T: Clone> TimerQueue<T> {
    /// Pop the earliest timer due at or before `now_ms`, advancing the clock
    /// to its due time. Intervals re-arm at `due + period`. Once nothing is
    /// left to fire the clock settles at `now_ms`.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<Fired<T>> {
        while let Some(Reverse((due_ms, _, id))) = self.heap.peek().copied() {
            if due_ms > now_ms {
                break;
            }
            self.heap.pop();

            let Some(armed) = self.armed.get(&id) else {
                continue; // cancelled
            };
            if armed.due_ms != due_ms {
                continue; // superseded entry
            }

            let payload = armed.payload.clone();
            let period_ms = armed.period_ms;
            self.now_ms = self.now_ms.max(due_ms);
            match period_ms {
                Some(period) => {
                    let next_due = due_ms + period;
                    if let Some(armed) = self.armed.get_mut(&id) {
                        armed.due_ms = next_due;
                    }
                    self.push(id, next_due);
                }
                None => {
                    self.armed.remove(&id);
                }
            }
            return Some(Fired {
                id,
                due_ms,
                payload,
            });
        }

        self.now_ms = self.now_ms.max(now_ms);
        None
    }
}

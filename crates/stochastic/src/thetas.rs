//! Theta event queue
//!
//! Deterministic events (herd tests) registered for exact dates and fired
//! in time order as the driver's clock passes them.

use std::collections::BTreeMap;

/// Time-ordered queue of scheduled events.
#[derive(Debug, Clone)]
pub struct ThetaQueue<T> {
    queue: BTreeMap<i32, Vec<T>>,
}

impl<T> Default for ThetaQueue<T> {
    fn default() -> Self {
        Self {
            queue: BTreeMap::new(),
        }
    }
}

impl<T> ThetaQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `event` to fire at `time`.
    pub fn register(&mut self, time: i32, event: T) {
        self.queue.entry(time).or_default().push(event);
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Remove and return all events scheduled strictly before `t_end`,
    /// grouped by time in ascending order.
    pub fn drain_through(&mut self, t_end: i32) -> Vec<(i32, Vec<T>)> {
        let later = self.queue.split_off(&t_end);
        let due = std::mem::replace(&mut self.queue, later);
        due.into_iter().collect()
    }
}

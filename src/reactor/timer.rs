use crate::utils::Handle;

use std::cmp::Ordering;
use std::time::Instant;

/// An idle deadline for one half-connection.
///
/// Entries live in a `BinaryHeap`; stale entries (destroyed handles) are
/// discarded when they surface.
pub(crate) struct TimerEntry {
    /// When the half-connection should be checked for idleness.
    pub(crate) deadline: Instant,

    /// The half-connection the deadline belongs to.
    pub(crate) handle: Handle,
}

impl Eq for TimerEntry {}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline.eq(&other.deadline)
    }
}

impl Ord for TimerEntry {
    /// Reversed so that `BinaryHeap<TimerEntry>` pops the earliest deadline.
    fn cmp(&self, other: &Self) -> Ordering {
        other.deadline.cmp(&self.deadline)
    }
}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::Slab;

    use std::collections::BinaryHeap;
    use std::time::Duration;

    #[test]
    fn heap_pops_earliest_deadline_first() {
        let mut slab = Slab::with_capacity(3);
        let now = Instant::now();
        let mut heap = BinaryHeap::new();

        for secs in [30, 10, 20] {
            heap.push(TimerEntry {
                deadline: now + Duration::from_secs(secs),
                handle: slab.insert(secs),
            });
        }

        let order: Vec<_> = std::iter::from_fn(|| heap.pop())
            .map(|t| *slab.get(t.handle).unwrap())
            .collect();

        assert_eq!(order, vec![10, 20, 30]);
    }
}

//! Single-threaded cooperative task queue on a virtual clock.
//!
//! The page has one execution queue. Timers, display frames, image load
//! completions and scroll events all become tasks here, each run to
//! completion before the next is taken. Ordering is by due time, then by
//! the order tasks were scheduled, so two events due at the same instant
//! are dispatched in the order they were queued.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

/// Virtual time in milliseconds since page start.
pub type Millis = u64;

/// Handle for cancelling a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

#[derive(Debug)]
struct Entry<T> {
    due: Millis,
    id: TaskId,
    payload: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.id == other.id
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.due, self.id).cmp(&(other.due, other.id))
    }
}

#[derive(Debug)]
pub struct TaskQueue<T> {
    heap: BinaryHeap<Reverse<Entry<T>>>,
    cancelled: HashSet<TaskId>,
    next_id: u64,
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
            cancelled: HashSet::new(),
            next_id: 0,
        }
    }
}

impl<T> TaskQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: Millis, payload: T) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.heap.push(Reverse(Entry { due, id, payload }));
        id
    }

    /// Cancel a pending task. Cancelling a task that already ran is a no-op.
    pub fn cancel(&mut self, id: TaskId) {
        if self.heap.iter().any(|Reverse(e)| e.id == id) {
            self.cancelled.insert(id);
        }
    }

    /// Due time of the earliest live task.
    pub fn peek_due(&mut self) -> Option<Millis> {
        self.skip_cancelled();
        self.heap.peek().map(|Reverse(e)| e.due)
    }

    /// Take the earliest live task if it is due at or before `now`.
    pub fn pop_due(&mut self, now: Millis) -> Option<(Millis, T)> {
        self.skip_cancelled();
        if self.heap.peek().is_some_and(|Reverse(e)| e.due <= now) {
            self.heap.pop().map(|Reverse(e)| (e.due, e.payload))
        } else {
            None
        }
    }

    /// Take the earliest live task regardless of its due time.
    pub fn pop_next(&mut self) -> Option<(Millis, T)> {
        self.skip_cancelled();
        self.heap.pop().map(|Reverse(e)| (e.due, e.payload))
    }

    pub fn is_empty(&mut self) -> bool {
        self.peek_due().is_none()
    }

    pub fn len(&self) -> usize {
        self.heap.len() - self.cancelled.len()
    }

    fn skip_cancelled(&mut self) {
        while let Some(Reverse(e)) = self.heap.peek() {
            if self.cancelled.remove(&e.id) {
                self.heap.pop();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_due_order() {
        let mut q = TaskQueue::new();
        q.schedule(30, "c");
        q.schedule(10, "a");
        q.schedule(20, "b");
        assert_eq!(q.pop_next(), Some((10, "a")));
        assert_eq!(q.pop_next(), Some((20, "b")));
        assert_eq!(q.pop_next(), Some((30, "c")));
        assert_eq!(q.pop_next(), None);
    }

    #[test]
    fn ties_keep_schedule_order() {
        let mut q = TaskQueue::new();
        q.schedule(5, 1);
        q.schedule(5, 2);
        q.schedule(5, 3);
        let order: Vec<_> = std::iter::from_fn(|| q.pop_next()).map(|(_, v)| v).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn pop_due_respects_now() {
        let mut q = TaskQueue::new();
        q.schedule(100, ());
        assert_eq!(q.pop_due(99), None);
        assert_eq!(q.pop_due(100), Some((100, ())));
    }

    #[test]
    fn cancelled_tasks_never_run() {
        let mut q = TaskQueue::new();
        let a = q.schedule(1, "a");
        q.schedule(2, "b");
        q.cancel(a);
        assert_eq!(q.len(), 1);
        assert_eq!(q.peek_due(), Some(2));
        assert_eq!(q.pop_next(), Some((2, "b")));
        assert!(q.is_empty());
    }

    #[test]
    fn cancel_after_run_is_noop() {
        let mut q = TaskQueue::new();
        let a = q.schedule(1, "a");
        assert!(q.pop_next().is_some());
        q.cancel(a);
        q.schedule(2, "b");
        assert_eq!(q.len(), 1);
        assert_eq!(q.pop_next(), Some((2, "b")));
    }
}

//! Staged reveal of gallery items.
//!
//! Items that enter the viewport are not shown immediately. They join a FIFO
//! queue and are revealed one at a time, one per [`RevealScheduler::interval`],
//! so a screenful of items cascades in instead of popping up together.
//!
//! ## State
//!
//! All mutable state for one gallery generation lives in a [`RevealSession`]:
//!
//! - **revealed**: indices that have been shown. Only ever grows.
//! - **locked**: indices already enqueued (or revealed without queueing).
//!   Guards against duplicate enqueue from repeated notifications.
//! - **queue**: indices waiting for a reveal tick, in arrival order.
//! - **draining** / **next_tick**: whether a drain loop is running, and
//!   when its next step is due.
//!
//! A new generation replaces the whole session; nothing is cleared field by
//! field.
//!
//! ## Timing
//!
//! The first enqueue into an idle scheduler reveals immediately and arms a
//! tick one interval later. Each tick pops the next index, or goes idle when
//! the queue is empty. Items that arrive while a tick is armed wait for it,
//! so the interval clock is never restarted mid-drain.

use crate::tasks::Millis;
use std::collections::{BTreeSet, HashSet, VecDeque};

/// Default spacing between consecutive reveals.
pub const REVEAL_INTERVAL_MS: Millis = 140;

/// One item becoming visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealEvent {
    pub index: usize,
    pub at: Millis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerPhase {
    Idle,
    Draining,
}

/// Owned reveal state for a single gallery generation.
#[derive(Debug, Default)]
pub struct RevealSession {
    revealed: BTreeSet<usize>,
    locked: HashSet<usize>,
    queue: VecDeque<usize>,
    draining: bool,
    next_tick: Option<Millis>,
}

impl RevealSession {
    pub fn is_revealed(&self, index: usize) -> bool {
        self.revealed.contains(&index)
    }

    pub fn is_locked(&self, index: usize) -> bool {
        self.locked.contains(&index)
    }

    pub fn revealed(&self) -> impl Iterator<Item = usize> + '_ {
        self.revealed.iter().copied()
    }

    pub fn queued(&self) -> impl Iterator<Item = usize> + '_ {
        self.queue.iter().copied()
    }
}

#[derive(Debug)]
pub struct RevealScheduler {
    interval: Millis,
    session: RevealSession,
    disposed: bool,
}

impl RevealScheduler {
    pub fn new(interval: Millis) -> Self {
        Self {
            interval,
            session: RevealSession::default(),
            disposed: false,
        }
    }

    pub fn interval(&self) -> Millis {
        self.interval
    }

    pub fn session(&self) -> &RevealSession {
        &self.session
    }

    pub fn phase(&self) -> SchedulerPhase {
        if self.session.draining {
            SchedulerPhase::Draining
        } else {
            SchedulerPhase::Idle
        }
    }

    /// When the armed drain step is due, if any.
    pub fn next_deadline(&self) -> Option<Millis> {
        self.session.next_tick
    }

    /// Queue `index` for reveal. Returns the reveal that happens right away
    /// when the scheduler was idle.
    ///
    /// Already-locked indices and calls after [`dispose`](Self::dispose) are
    /// no-ops.
    pub fn enqueue(&mut self, index: usize, now: Millis) -> Vec<RevealEvent> {
        if self.disposed || !self.session.locked.insert(index) {
            return Vec::new();
        }
        self.session.queue.push_back(index);
        if self.session.draining {
            return Vec::new();
        }
        self.session.draining = true;
        self.step(now).into_iter().collect()
    }

    /// Run every drain step due at or before `now`. Events carry the time the
    /// step was scheduled for, which may be earlier than `now` on a slow host.
    pub fn advance(&mut self, now: Millis) -> Vec<RevealEvent> {
        let mut events = Vec::new();
        while let Some(due) = self.session.next_tick {
            if due > now {
                break;
            }
            events.extend(self.step(due));
        }
        events
    }

    /// Reveal `indices` immediately, bypassing the queue. Used when viewport
    /// observation is unavailable.
    pub fn reveal_all(
        &mut self,
        indices: impl IntoIterator<Item = usize>,
        now: Millis,
    ) -> Vec<RevealEvent> {
        if self.disposed {
            return Vec::new();
        }
        let mut events = Vec::new();
        for index in indices {
            if self.session.locked.insert(index) {
                self.session.revealed.insert(index);
                events.push(RevealEvent { index, at: now });
            }
        }
        events
    }

    /// Discard the current session and start a fresh one.
    pub fn reset(&mut self) {
        self.session = RevealSession::default();
    }

    /// Cancel the armed tick and refuse further work.
    pub fn dispose(&mut self) {
        self.disposed = true;
        self.session.next_tick = None;
        self.session.draining = false;
        self.session.queue.clear();
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn step(&mut self, now: Millis) -> Option<RevealEvent> {
        match self.session.queue.pop_front() {
            Some(index) => {
                self.session.revealed.insert(index);
                self.session.next_tick = Some(now + self.interval);
                Some(RevealEvent { index, at: now })
            }
            None => {
                self.session.draining = false;
                self.session.next_tick = None;
                None
            }
        }
    }
}

impl Default for RevealScheduler {
    fn default() -> Self {
        Self::new(REVEAL_INTERVAL_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(s: &mut RevealScheduler) -> Vec<RevealEvent> {
        let mut out = Vec::new();
        while let Some(due) = s.next_deadline() {
            out.extend(s.advance(due));
        }
        out
    }

    #[test]
    fn first_enqueue_reveals_immediately() {
        let mut s = RevealScheduler::default();
        let events = s.enqueue(4, 1000);
        assert_eq!(events, vec![RevealEvent { index: 4, at: 1000 }]);
        assert_eq!(s.phase(), SchedulerPhase::Draining);
        assert_eq!(s.next_deadline(), Some(1140));
        assert!(s.session().is_revealed(4));
    }

    #[test]
    fn batch_reveals_at_fixed_spacing_in_fifo_order() {
        let mut s = RevealScheduler::default();
        let mut events = Vec::new();
        for i in 0..10 {
            events.extend(s.enqueue(i, 0));
        }
        events.extend(drain(&mut s));
        let times: Vec<_> = events.iter().map(|e| e.at).collect();
        let order: Vec<_> = events.iter().map(|e| e.index).collect();
        assert_eq!(times, (0..10).map(|i| i * 140).collect::<Vec<_>>());
        assert_eq!(order, (0..10).collect::<Vec<_>>());
        assert_eq!(s.phase(), SchedulerPhase::Idle);
    }

    #[test]
    fn duplicate_enqueue_is_ignored() {
        let mut s = RevealScheduler::default();
        s.enqueue(1, 0);
        s.enqueue(2, 0);
        s.enqueue(2, 10);
        s.enqueue(1, 20);
        let events = drain(&mut s);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].index, 2);
    }

    #[test]
    fn mid_drain_arrival_keeps_interval_clock() {
        let mut s = RevealScheduler::default();
        s.enqueue(0, 0);
        // Queue is empty but the tick at 140 is still armed.
        assert!(s.enqueue(1, 50).is_empty());
        assert_eq!(s.session().queued().collect::<Vec<_>>(), vec![1]);
        assert_eq!(s.advance(140), vec![RevealEvent { index: 1, at: 140 }]);
        assert_eq!(s.session().queued().count(), 0);
    }

    #[test]
    fn goes_idle_after_empty_tick() {
        let mut s = RevealScheduler::default();
        s.enqueue(0, 0);
        assert!(s.advance(140).is_empty());
        assert_eq!(s.phase(), SchedulerPhase::Idle);
        assert_eq!(s.next_deadline(), None);
        // Next arrival after going idle reveals at once.
        assert_eq!(s.enqueue(1, 500), vec![RevealEvent { index: 1, at: 500 }]);
    }

    #[test]
    fn late_advance_reports_scheduled_times() {
        let mut s = RevealScheduler::default();
        for i in 0..3 {
            s.enqueue(i, 0);
        }
        let events = s.advance(10_000);
        assert_eq!(
            events,
            vec![RevealEvent { index: 1, at: 140 }, RevealEvent { index: 2, at: 280 }]
        );
    }

    #[test]
    fn reveal_all_bypasses_queue_and_locks() {
        let mut s = RevealScheduler::default();
        let events = s.reveal_all(0..3, 7);
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| e.at == 7));
        assert!(s.enqueue(1, 8).is_empty());
        assert_eq!(s.next_deadline(), None);
    }

    #[test]
    fn reset_starts_a_fresh_session() {
        let mut s = RevealScheduler::default();
        s.enqueue(0, 0);
        s.enqueue(1, 0);
        s.reset();
        assert!(!s.session().is_revealed(0));
        assert!(!s.session().is_locked(1));
        assert_eq!(s.phase(), SchedulerPhase::Idle);
        assert_eq!(s.enqueue(1, 5).len(), 1);
    }

    #[test]
    fn dispose_cancels_pending_tick() {
        let mut s = RevealScheduler::default();
        s.enqueue(0, 0);
        s.enqueue(1, 0);
        s.dispose();
        assert_eq!(s.next_deadline(), None);
        assert!(s.advance(1_000).is_empty());
        assert!(s.enqueue(2, 1_000).is_empty());
        assert!(!s.session().is_revealed(1));
    }
}

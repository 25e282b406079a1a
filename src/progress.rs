//! First-screen image load progress.
//!
//! Once a generation's items are laid out, the aggregator takes a one-shot
//! measurement: which rendered images overlap the viewport right now. Only
//! those count. Images further down the page never hold up the loading
//! indicator.
//!
//! Each measured image finishes exactly once, by loading or by failing; both
//! count the same, so a broken asset cannot stall progress. The aggregator
//! reports `floor(loaded / total * 100)` after every completion and a single
//! [`ProgressSignal::FirstViewLoaded`] when the last one lands.

use crate::types::ImageKey;
use crate::viewport::Rect;
use std::collections::BTreeSet;

/// Outbound notification from the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressSignal {
    /// Percentage of first-screen images finished, 0-100.
    Progress(u8),
    /// Every first-screen image finished. Emitted once per generation.
    FirstViewLoaded,
}

/// How a tracked image finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    Failed,
}

/// A rendered image as seen at measurement time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageProbe {
    pub key: ImageKey,
    /// Bounding box relative to the viewport (top = 0 is the top edge).
    pub rect: Rect,
    /// True when the image already has decoded, non-zero natural dimensions.
    pub complete: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadCount {
    pub loaded: usize,
    pub total: usize,
}

impl LoadCount {
    /// Completion percentage, floored and capped at 100. An empty set is done.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.loaded * 100 / self.total).min(100)) as u8
    }

    pub fn is_complete(&self) -> bool {
        self.loaded >= self.total
    }
}

#[derive(Debug)]
pub struct LoadProgressAggregator {
    count: LoadCount,
    /// Images with live load/error listeners.
    pending: BTreeSet<ImageKey>,
    completed: bool,
}

impl LoadProgressAggregator {
    /// Measure the first screen and start tracking.
    ///
    /// Returns the aggregator together with the signals produced by the
    /// measurement itself: an initial percentage, plus completion when
    /// nothing needs to be waited for.
    pub fn measure(
        probes: impl IntoIterator<Item = ImageProbe>,
        viewport_height: f64,
    ) -> (Self, Vec<ProgressSignal>) {
        let visible: Vec<ImageProbe> = probes
            .into_iter()
            .filter(|p| p.rect.bottom() > 0.0 && p.rect.top < viewport_height)
            .collect();

        let mut aggregator = Self {
            count: LoadCount {
                loaded: 0,
                total: visible.len(),
            },
            pending: BTreeSet::new(),
            completed: false,
        };
        for probe in &visible {
            if probe.complete {
                aggregator.count.loaded += 1;
            } else {
                aggregator.pending.insert(probe.key);
            }
        }
        log::debug!(
            "first screen: {} images, {} already loaded",
            aggregator.count.total,
            aggregator.count.loaded
        );

        let mut signals = vec![ProgressSignal::Progress(aggregator.count.percent())];
        aggregator.complete_if_done(&mut signals);
        (aggregator, signals)
    }

    /// Record that `key` finished. Images not being tracked (off-screen,
    /// already finished, or after disposal) are ignored.
    pub fn finish(&mut self, key: ImageKey, outcome: LoadOutcome) -> Vec<ProgressSignal> {
        if !self.pending.remove(&key) {
            return Vec::new();
        }
        if outcome == LoadOutcome::Failed {
            log::debug!("image {}:{} failed; counting as loaded", key.item, key.slot);
        }
        self.count.loaded += 1;
        let mut signals = vec![ProgressSignal::Progress(self.count.percent())];
        self.complete_if_done(&mut signals);
        signals
    }

    /// Detach every remaining listener.
    pub fn dispose(&mut self) {
        self.pending.clear();
    }

    pub fn count(&self) -> LoadCount {
        self.count
    }

    pub fn is_tracking(&self, key: ImageKey) -> bool {
        self.pending.contains(&key)
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    fn complete_if_done(&mut self, signals: &mut Vec<ProgressSignal>) {
        if !self.completed && self.count.is_complete() {
            self.completed = true;
            self.pending.clear();
            signals.push(ProgressSignal::FirstViewLoaded);
        }
    }
}

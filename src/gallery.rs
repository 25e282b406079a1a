//! Gallery view: per-generation wiring of the perceived-load pipeline.
//!
//! A generation starts when fetched records are committed. Committing builds
//! a fresh [`GenerationState`] (layout boxes, reveal scheduler, viewport
//! observer) and drops the previous one after disposing it, so nothing from
//! an older fetch can reach the new state.
//!
//! Inbound events are plain method calls on a single thread:
//!
//! - [`GalleryView::scroll`]: the viewport moved; newly entered items queue
//!   for reveal.
//! - [`GalleryView::advance`]: the reveal timer fired.
//! - [`GalleryView::measure_first_view`]: layout has settled; take the
//!   first-screen image census.
//! - [`GalleryView::image_finished`]: an image loaded or failed.
//!
//! Outbound [`GallerySignal`]s carry reveals and the two signals the page
//! composition layer forwards to the loading indicator.

use crate::config::{ConfigError, PageConfig};
use crate::layout::{GridLayout, ItemBox};
use crate::progress::{ImageProbe, LoadOutcome, LoadProgressAggregator, ProgressSignal};
use crate::reveal::{RevealEvent, RevealScheduler};
use crate::tasks::Millis;
use crate::types::{GalleryItem, ImageKey};
use crate::viewport::{ObserverOptions, ViewportObserver};

/// Identifies one fetch-and-render cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Generation(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GallerySignal {
    Revealed(RevealEvent),
    /// First-screen progress, never lower than an earlier report.
    FirstViewProgress(u8),
    FirstViewLoaded,
}

/// Everything owned by one generation.
#[derive(Debug)]
struct GenerationState {
    id: Generation,
    items: Vec<GalleryItem>,
    boxes: Vec<ItemBox>,
    scheduler: RevealScheduler,
    observer: Option<ViewportObserver>,
    aggregator: Option<LoadProgressAggregator>,
}

impl GenerationState {
    fn dispose(&mut self) {
        self.scheduler.dispose();
        if let Some(observer) = &mut self.observer {
            observer.disconnect();
        }
        if let Some(aggregator) = &mut self.aggregator {
            aggregator.dispose();
        }
    }
}

#[derive(Debug)]
pub struct GalleryView {
    layout: GridLayout,
    /// `None` when viewport observation is unavailable.
    observer_options: Option<ObserverOptions>,
    reveal_interval: Millis,
    current: Option<GenerationState>,
    next_generation: u64,
    last_progress: Option<u8>,
    disposed: bool,
}

impl GalleryView {
    pub fn new(
        layout: GridLayout,
        observer_options: Option<ObserverOptions>,
        reveal_interval: Millis,
    ) -> Self {
        Self {
            layout,
            observer_options,
            reveal_interval,
            current: None,
            next_generation: 0,
            last_progress: None,
            disposed: false,
        }
    }

    pub fn from_config(config: &PageConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            GridLayout::from_config(&config.layout),
            config.observer.options()?,
            config.reveal.interval_ms,
        ))
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    pub fn generation(&self) -> Option<Generation> {
        self.current.as_ref().map(|g| g.id)
    }

    pub fn items(&self) -> &[GalleryItem] {
        self.current.as_ref().map(|g| g.items.as_slice()).unwrap_or_default()
    }

    pub fn boxes(&self) -> &[ItemBox] {
        self.current.as_ref().map(|g| g.boxes.as_slice()).unwrap_or_default()
    }

    pub fn is_visible(&self, index: usize) -> bool {
        self.current
            .as_ref()
            .is_some_and(|g| g.scheduler.session().is_revealed(index))
    }

    /// Start a new generation with `items`, the viewport at `scroll_y`.
    ///
    /// Returns the generation id and the reveals that happen immediately:
    /// the first item that is already on screen, or every item when
    /// observation is unavailable.
    pub fn commit(
        &mut self,
        items: Vec<GalleryItem>,
        scroll_y: f64,
        now: Millis,
    ) -> (Generation, Vec<GallerySignal>) {
        if let Some(mut old) = self.current.take() {
            log::debug!("discarding gallery generation {}", old.id.0);
            old.dispose();
        }
        let id = Generation(self.next_generation);
        self.next_generation += 1;

        let boxes = self.layout.layout(&items);
        let mut state = GenerationState {
            id,
            items,
            boxes,
            scheduler: RevealScheduler::new(self.reveal_interval),
            observer: None,
            aggregator: None,
        };
        if self.disposed {
            state.dispose();
            self.current = Some(state);
            return (id, Vec::new());
        }

        let events = match self.observer_options {
            Some(options) => {
                let targets = state.boxes.iter().map(|b| (b.index, b.rect));
                let mut observer = ViewportObserver::observe_all(options, targets);
                let entered = observer.check(&self.layout.viewport_at(scroll_y));
                state.observer = Some(observer);
                entered
                    .into_iter()
                    .flat_map(|index| state.scheduler.enqueue(index, now))
                    .collect()
            }
            None => {
                log::debug!("viewport observation unavailable; revealing all items");
                state.scheduler.reveal_all(0..state.items.len(), now)
            }
        };
        log::debug!("gallery generation {} committed with {} items", id.0, state.items.len());
        self.current = Some(state);
        (id, events.into_iter().map(GallerySignal::Revealed).collect())
    }

    /// Viewport moved to `scroll_y`.
    pub fn scroll(&mut self, scroll_y: f64, now: Millis) -> Vec<GallerySignal> {
        let viewport = self.layout.viewport_at(scroll_y);
        let Some(state) = self.current.as_mut() else {
            return Vec::new();
        };
        let Some(observer) = state.observer.as_mut() else {
            return Vec::new();
        };
        observer
            .check(&viewport)
            .into_iter()
            .flat_map(|index| state.scheduler.enqueue(index, now))
            .map(GallerySignal::Revealed)
            .collect()
    }

    /// When the reveal timer is next due.
    pub fn next_deadline(&self) -> Option<Millis> {
        self.current.as_ref().and_then(|g| g.scheduler.next_deadline())
    }

    /// Run reveal steps due at or before `now`.
    pub fn advance(&mut self, now: Millis) -> Vec<GallerySignal> {
        match self.current.as_mut() {
            Some(state) => state
                .scheduler
                .advance(now)
                .into_iter()
                .map(GallerySignal::Revealed)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Take the first-screen census for `generation` with the page scrolled
    /// to `scroll_y`. `is_complete` tells whether an image is already
    /// decoded. Runs at most once per generation.
    pub fn measure_first_view(
        &mut self,
        generation: Generation,
        scroll_y: f64,
        is_complete: impl Fn(ImageKey) -> bool,
    ) -> Vec<GallerySignal> {
        if self.disposed {
            return Vec::new();
        }
        let viewport_height = self.layout.viewport_height;
        let Some(state) = self.current.as_mut().filter(|g| g.id == generation) else {
            log::debug!("ignoring first-view measurement for stale generation {}", generation.0);
            return Vec::new();
        };
        if state.aggregator.is_some() {
            return Vec::new();
        }
        let probes: Vec<ImageProbe> = state
            .boxes
            .iter()
            .flat_map(|b| b.images.iter())
            .map(|(key, rect)| ImageProbe {
                key: *key,
                rect: rect.offset_y(-scroll_y),
                complete: is_complete(*key),
            })
            .collect();
        let (aggregator, signals) = LoadProgressAggregator::measure(probes, viewport_height);
        state.aggregator = Some(aggregator);
        self.forward(signals)
    }

    /// An image of `generation` finished loading (or failed).
    pub fn image_finished(
        &mut self,
        generation: Generation,
        key: ImageKey,
        outcome: LoadOutcome,
    ) -> Vec<GallerySignal> {
        let Some(state) = self.current.as_mut().filter(|g| g.id == generation) else {
            log::debug!("ignoring late image callback from generation {}", generation.0);
            return Vec::new();
        };
        let Some(aggregator) = state.aggregator.as_mut() else {
            return Vec::new();
        };
        let signals = aggregator.finish(key, outcome);
        self.forward(signals)
    }

    /// Tear down: cancel the reveal timer, disconnect the observer and detach
    /// image listeners.
    pub fn dispose(&mut self) {
        self.disposed = true;
        if let Some(state) = &mut self.current {
            state.dispose();
        }
    }

    fn forward(&mut self, signals: Vec<ProgressSignal>) -> Vec<GallerySignal> {
        let mut out = Vec::new();
        for signal in signals {
            match signal {
                ProgressSignal::Progress(p) => {
                    if self.last_progress.is_none_or(|last| p > last) {
                        self.last_progress = Some(p);
                        out.push(GallerySignal::FirstViewProgress(p));
                    }
                }
                ProgressSignal::FirstViewLoaded => out.push(GallerySignal::FirstViewLoaded),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{gallery_items, small_grid};

    fn revealed(signals: &[GallerySignal]) -> Vec<(usize, Millis)> {
        signals
            .iter()
            .filter_map(|s| match s {
                GallerySignal::Revealed(e) => Some((e.index, e.at)),
                _ => None,
            })
            .collect()
    }

    fn view(observe: bool) -> GalleryView {
        let options = observe.then(ObserverOptions::default);
        GalleryView::new(small_grid(), options, 140)
    }

    fn drain(v: &mut GalleryView) -> Vec<GallerySignal> {
        let mut out = Vec::new();
        while let Some(due) = v.next_deadline() {
            out.extend(v.advance(due));
        }
        out
    }

    #[test]
    fn on_screen_items_cascade_in() {
        let mut v = view(true);
        let (_, first) = v.commit(gallery_items(9), 0.0, 0);
        let mut all = first;
        all.extend(drain(&mut v));
        let reveals = revealed(&all);
        // The first row is on screen at scroll 0.
        assert_eq!(reveals, vec![(0, 0), (1, 140), (2, 280)]);
        assert!(v.is_visible(2));
        assert!(!v.is_visible(3));
    }

    #[test]
    fn scrolling_reveals_more_in_order() {
        let mut v = view(true);
        v.commit(gallery_items(9), 0.0, 0);
        drain(&mut v);
        let signals = v.scroll(1_000.0, 1_000);
        let mut all = signals;
        all.extend(drain(&mut v));
        let reveals = revealed(&all);
        assert!(!reveals.is_empty());
        let indices: Vec<_> = reveals.iter().map(|r| r.0).collect();
        let mut sorted = indices.clone();
        sorted.sort();
        assert_eq!(indices, sorted);
        assert!(reveals.windows(2).all(|w| w[1].1 >= w[0].1 + 140));
    }

    #[test]
    fn without_observer_everything_is_visible_at_once() {
        let mut v = view(false);
        let (_, signals) = v.commit(gallery_items(10), 0.0, 5);
        let reveals = revealed(&signals);
        assert_eq!(reveals.len(), 10);
        assert!(reveals.iter().all(|r| r.1 == 5));
        assert_eq!(v.next_deadline(), None);
    }

    #[test]
    fn empty_gallery_is_quiet() {
        let mut v = view(true);
        let (g, signals) = v.commit(Vec::new(), 0.0, 0);
        assert!(signals.is_empty());
        assert_eq!(v.next_deadline(), None);
        let progress = v.measure_first_view(g, 0.0, |_| false);
        assert_eq!(
            progress,
            vec![GallerySignal::FirstViewProgress(100), GallerySignal::FirstViewLoaded]
        );
    }

    #[test]
    fn new_generation_discards_old_state() {
        let mut v = view(true);
        let (g0, _) = v.commit(gallery_items(6), 0.0, 0);
        v.measure_first_view(g0, 0.0, |_| false);
        let (g1, _) = v.commit(gallery_items(6), 0.0, 100);
        assert_ne!(g0, g1);
        // Callbacks from the old generation are ignored.
        assert!(v.image_finished(g0, ImageKey::new(0, 0), LoadOutcome::Loaded).is_empty());
        assert!(v.measure_first_view(g0, 0.0, |_| false).is_empty());
        // The new generation restarted its reveal cascade.
        assert!(v.is_visible(0));
        assert!(!v.is_visible(1));
    }

    #[test]
    fn progress_never_reported_lower_across_generations() {
        let mut v = view(true);
        let (g0, _) = v.commit(gallery_items(3), 0.0, 0);
        let first = v.measure_first_view(g0, 0.0, |_| true);
        assert!(first.contains(&GallerySignal::FirstViewProgress(100)));

        let (g1, _) = v.commit(gallery_items(3), 0.0, 10);
        let second = v.measure_first_view(g1, 0.0, |_| false);
        assert!(
            second
                .iter()
                .all(|s| !matches!(s, GallerySignal::FirstViewProgress(_)))
        );
    }

    #[test]
    fn measurement_runs_once_per_generation() {
        let mut v = view(true);
        let (g, _) = v.commit(gallery_items(3), 0.0, 0);
        assert!(!v.measure_first_view(g, 0.0, |_| false).is_empty());
        assert!(v.measure_first_view(g, 0.0, |_| false).is_empty());
    }

    #[test]
    fn first_view_completes_when_visible_images_finish() {
        let mut v = view(true);
        let (g, _) = v.commit(gallery_items(6), 0.0, 0);
        v.measure_first_view(g, 0.0, |_| false);
        let mut signals = Vec::new();
        for item in 0..3 {
            signals.extend(v.image_finished(g, ImageKey::new(item, 0), LoadOutcome::Loaded));
        }
        assert_eq!(signals.last(), Some(&GallerySignal::FirstViewLoaded));
        let loaded = signals
            .iter()
            .filter(|s| **s == GallerySignal::FirstViewLoaded)
            .count();
        assert_eq!(loaded, 1);
    }

    #[test]
    fn dispose_stops_everything() {
        let mut v = view(true);
        let (g, _) = v.commit(gallery_items(6), 0.0, 0);
        v.measure_first_view(g, 0.0, |_| false);
        v.dispose();
        assert_eq!(v.next_deadline(), None);
        assert!(v.scroll(5_000.0, 10).is_empty());
        assert!(v.image_finished(g, ImageKey::new(0, 0), LoadOutcome::Loaded).is_empty());
    }
}

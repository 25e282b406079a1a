//! Deterministic end-to-end page simulation.
//!
//! Runs the whole perceived-load pipeline on a [`TaskQueue`] with virtual
//! time: content arrives, the gallery commits a generation, the first screen
//! is measured, images finish according to an [`ImagePlan`], the viewport
//! scrolls, reveal ticks fire, the indicator animates frame by frame and its
//! hold/fade timers expire. Everything observable is recorded in a
//! [`Timeline`].
//!
//! Only the simulation arms timers. The components expose their next
//! deadline and the simulation keeps exactly one queued task per deadline,
//! cancelling and re-arming when a deadline moves.

use crate::config::{ConfigError, PageConfig};
use crate::gallery::{GallerySignal, GalleryView, Generation};
use crate::indicator::IndicatorPhase;
use crate::page::PageComposition;
use crate::progress::LoadOutcome;
use crate::tasks::{Millis, TaskId, TaskQueue};
use crate::types::{GalleryItem, ImageKey};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimulateError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// What happens to one image after it is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFate {
    /// Already decoded when the first screen is measured.
    Cached,
    /// Loads this long after render.
    Loads(Millis),
    /// Errors this long after render.
    Fails(Millis),
    /// Never settles.
    Never,
}

/// Image fates for a scenario: a latency rule plus per-image overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePlan {
    base_ms: Millis,
    stagger_ms: Millis,
    overrides: BTreeMap<ImageKey, ImageFate>,
}

impl ImagePlan {
    /// Every image loads `latency` after render.
    pub fn uniform(latency: Millis) -> Self {
        Self::staggered(latency, 0)
    }

    /// Image `n` in render order loads at `base + n * step`.
    pub fn staggered(base_ms: Millis, stagger_ms: Millis) -> Self {
        Self {
            base_ms,
            stagger_ms,
            overrides: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: ImageKey, fate: ImageFate) -> Self {
        self.overrides.insert(key, fate);
        self
    }

    pub fn fate(&self, key: ImageKey) -> ImageFate {
        if let Some(fate) = self.overrides.get(&key) {
            return *fate;
        }
        let order = (key.item * crate::types::IMAGES_PER_ITEM + key.slot) as Millis;
        ImageFate::Loads(self.base_ms + order * self.stagger_ms)
    }
}

impl Default for ImagePlan {
    fn default() -> Self {
        Self::staggered(120, 40)
    }
}

#[derive(Debug, Clone)]
pub struct Scenario {
    pub items: Vec<GalleryItem>,
    pub config: PageConfig,
    pub images: ImagePlan,
    /// When the content fetch completes.
    pub fetch_at: Millis,
    /// `(at, scroll_y)` viewport moves.
    pub scrolls: Vec<(Millis, f64)>,
    /// Later fetches that start a new generation.
    pub refetches: Vec<(Millis, Vec<GalleryItem>)>,
}

impl Scenario {
    pub fn new(items: Vec<GalleryItem>, config: PageConfig) -> Self {
        Self {
            items,
            config,
            images: ImagePlan::default(),
            fetch_at: 0,
            scrolls: Vec::new(),
            refetches: Vec::new(),
        }
    }

    pub fn with_images(mut self, images: ImagePlan) -> Self {
        self.images = images;
        self
    }

    pub fn with_scroll(mut self, at: Millis, scroll_y: f64) -> Self {
        self.scrolls.push((at, scroll_y));
        self
    }

    /// Scroll down the whole page in `step_px` increments every `every_ms`,
    /// starting at `start`.
    pub fn with_scroll_sweep(mut self, start: Millis, step_px: f64, every_ms: Millis) -> Self {
        let layout = crate::layout::GridLayout::from_config(&self.config.layout);
        let boxes = layout.layout(&self.items);
        let bottom = (layout.document_height(&boxes) - layout.viewport_height).max(0.0);
        let step_px = step_px.max(1.0);
        let mut y = 0.0;
        let mut at = start;
        while y < bottom {
            y = (y + step_px).min(bottom);
            self.scrolls.push((at, y));
            at += every_ms;
        }
        self
    }

    pub fn with_refetch(mut self, at: Millis, items: Vec<GalleryItem>) -> Self {
        self.refetches.push((at, items));
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TimelineEvent {
    Committed { generation: Generation, items: usize },
    Scrolled { scroll_y: f64 },
    Revealed { index: usize },
    Progress { percent: u8 },
    FirstViewLoaded,
    Displayed { percent: u8 },
    Phase { phase: IndicatorPhase },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEntry {
    pub at: Millis,
    pub event: TimelineEvent,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    pub entries: Vec<TimelineEntry>,
}

impl Timeline {
    fn push(&mut self, at: Millis, event: TimelineEvent) {
        self.entries.push(TimelineEntry { at, event });
    }

    /// `(at, index)` for every reveal, in emission order.
    pub fn reveals(&self) -> Vec<(Millis, usize)> {
        self.entries
            .iter()
            .filter_map(|e| match e.event {
                TimelineEvent::Revealed { index } => Some((e.at, index)),
                _ => None,
            })
            .collect()
    }

    /// Raw progress values reported to the page, in order.
    pub fn progress(&self) -> Vec<u8> {
        self.entries
            .iter()
            .filter_map(|e| match e.event {
                TimelineEvent::Progress { percent } => Some(percent),
                _ => None,
            })
            .collect()
    }

    /// `(at, percent)` for every change of the displayed value.
    pub fn displayed(&self) -> Vec<(Millis, u8)> {
        self.entries
            .iter()
            .filter_map(|e| match e.event {
                TimelineEvent::Displayed { percent } => Some((e.at, percent)),
                _ => None,
            })
            .collect()
    }

    pub fn phases(&self) -> Vec<(Millis, IndicatorPhase)> {
        self.entries
            .iter()
            .filter_map(|e| match e.event {
                TimelineEvent::Phase { phase } => Some((e.at, phase)),
                _ => None,
            })
            .collect()
    }

    pub fn first_view_loaded_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.event == TimelineEvent::FirstViewLoaded)
            .count()
    }
}

#[derive(Debug)]
enum Task {
    Commit(Vec<GalleryItem>),
    Measure(Generation),
    ImageDone(Generation, ImageKey, LoadOutcome),
    Scroll(f64),
    RevealTick,
    Frame,
    IndicatorTimer,
}

#[derive(Debug)]
pub struct Simulation {
    now: Millis,
    scroll_y: f64,
    frame_ms: Millis,
    queue: TaskQueue<Task>,
    gallery: GalleryView,
    page: PageComposition,
    images: ImagePlan,
    /// Images of the current generation that already settled.
    settled: HashSet<ImageKey>,
    reveal_timer: Option<(Millis, TaskId)>,
    indicator_timer: Option<(Millis, TaskId)>,
    frame_armed: bool,
    last_displayed: u8,
    last_phase: IndicatorPhase,
    timeline: Timeline,
}

impl Simulation {
    pub fn new(scenario: Scenario) -> Result<Self, SimulateError> {
        let gallery = GalleryView::from_config(&scenario.config)?;
        let page = PageComposition::new(scenario.config.indicator.timings());
        let mut queue = TaskQueue::new();
        queue.schedule(scenario.fetch_at, Task::Commit(scenario.items));
        for (at, items) in scenario.refetches {
            queue.schedule(at, Task::Commit(items));
        }
        for (at, y) in scenario.scrolls {
            queue.schedule(at, Task::Scroll(y));
        }
        let last_phase = page.indicator_view().phase;
        Ok(Self {
            now: 0,
            scroll_y: 0.0,
            frame_ms: scenario.config.indicator.frame_ms.max(1),
            queue,
            gallery,
            page,
            images: scenario.images,
            settled: HashSet::new(),
            reveal_timer: None,
            indicator_timer: None,
            frame_armed: false,
            last_displayed: 0,
            last_phase,
            timeline: Timeline::default(),
        })
    }

    pub fn now(&self) -> Millis {
        self.now
    }

    pub fn gallery(&self) -> &GalleryView {
        &self.gallery
    }

    pub fn page(&self) -> &PageComposition {
        &self.page
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn into_timeline(self) -> Timeline {
        self.timeline
    }

    /// Dispatch every task due at or before `until`, then move the clock
    /// to `until`.
    pub fn run_until(&mut self, until: Millis) {
        while let Some((due, task)) = self.queue.pop_due(until) {
            self.now = due;
            self.dispatch(task);
        }
        self.now = self.now.max(until);
    }

    fn dispatch(&mut self, task: Task) {
        let now = self.now;
        match task {
            Task::Commit(items) => {
                let count = items.len();
                let (generation, signals) = self.gallery.commit(items, self.scroll_y, now);
                self.settled.clear();
                self.timeline.push(now, TimelineEvent::Committed { generation, items: count });
                // Layout settles before any image can report.
                self.queue.schedule(now, Task::Measure(generation));
                let keys: Vec<ImageKey> = self
                    .gallery
                    .boxes()
                    .iter()
                    .flat_map(|b| b.images.iter().map(|(key, _)| *key))
                    .collect();
                for key in keys {
                    match self.images.fate(key) {
                        ImageFate::Cached => {
                            self.settled.insert(key);
                        }
                        ImageFate::Loads(after) => {
                            let task = Task::ImageDone(generation, key, LoadOutcome::Loaded);
                            self.queue.schedule(now + after, task);
                        }
                        ImageFate::Fails(after) => {
                            let task = Task::ImageDone(generation, key, LoadOutcome::Failed);
                            self.queue.schedule(now + after, task);
                        }
                        ImageFate::Never => {}
                    }
                }
                self.route(signals);
            }
            Task::Measure(generation) => {
                let settled = &self.settled;
                let signals = self
                    .gallery
                    .measure_first_view(generation, self.scroll_y, |key| settled.contains(&key));
                self.route(signals);
            }
            Task::ImageDone(generation, key, outcome) => {
                if self.gallery.generation() == Some(generation) {
                    self.settled.insert(key);
                }
                let signals = self.gallery.image_finished(generation, key, outcome);
                self.route(signals);
            }
            Task::Scroll(y) => {
                self.scroll_y = y;
                self.timeline.push(now, TimelineEvent::Scrolled { scroll_y: y });
                let signals = self.gallery.scroll(y, now);
                self.route(signals);
            }
            Task::RevealTick => {
                self.reveal_timer = None;
                let signals = self.gallery.advance(now);
                self.route(signals);
            }
            Task::Frame => {
                self.frame_armed = false;
                self.page.indicator_mut().frame(now);
                self.observe_indicator();
            }
            Task::IndicatorTimer => {
                self.indicator_timer = None;
                self.page.indicator_mut().advance(now);
                self.observe_indicator();
            }
        }
        self.rearm();
    }

    fn route(&mut self, signals: Vec<GallerySignal>) {
        for signal in signals {
            let event = match signal {
                GallerySignal::Revealed(e) => TimelineEvent::Revealed { index: e.index },
                GallerySignal::FirstViewProgress(percent) => TimelineEvent::Progress { percent },
                GallerySignal::FirstViewLoaded => TimelineEvent::FirstViewLoaded,
            };
            let at = match signal {
                GallerySignal::Revealed(e) => e.at,
                _ => self.now,
            };
            self.timeline.push(at, event);
            self.page.apply(&signal, self.now);
        }
        self.observe_indicator();
    }

    fn observe_indicator(&mut self) {
        let view = self.page.indicator_view();
        if view.percent != self.last_displayed {
            self.last_displayed = view.percent;
            self.timeline
                .push(self.now, TimelineEvent::Displayed { percent: view.percent });
        }
        if view.phase != self.last_phase {
            self.last_phase = view.phase;
            self.timeline.push(self.now, TimelineEvent::Phase { phase: view.phase });
        }
    }

    fn rearm(&mut self) {
        let wanted = self.gallery.next_deadline();
        if wanted != self.reveal_timer.map(|(due, _)| due) {
            if let Some((_, id)) = self.reveal_timer.take() {
                self.queue.cancel(id);
            }
            if let Some(due) = wanted {
                self.reveal_timer = Some((due, self.queue.schedule(due, Task::RevealTick)));
            }
        }

        let wanted = self.page.indicator().next_deadline();
        if wanted != self.indicator_timer.map(|(due, _)| due) {
            if let Some((_, id)) = self.indicator_timer.take() {
                self.queue.cancel(id);
            }
            if let Some(due) = wanted {
                self.indicator_timer = Some((due, self.queue.schedule(due, Task::IndicatorTimer)));
            }
        }

        if self.page.indicator().needs_frame() && !self.frame_armed {
            self.frame_armed = true;
            self.queue.schedule(self.now + self.frame_ms, Task::Frame);
        }
    }
}

/// Run `scenario` up to `until` and return what happened.
pub fn simulate(scenario: Scenario, until: Millis) -> Result<Timeline, SimulateError> {
    let mut sim = Simulation::new(scenario)?;
    sim.run_until(until);
    Ok(sim.into_timeline())
}

//! Page composition: forwards gallery signals into the loading indicator.
//!
//! The composition layer keeps its own copy of the raw progress and only
//! ever raises it, so a generation reset in the gallery (which restarts the
//! first-screen census from zero) never shows up as a regression. The
//! "first view loaded" signal pins progress to 100.

use crate::gallery::GallerySignal;
use crate::indicator::{IndicatorTimings, IndicatorView, LoadingIndicatorAnimator};
use crate::tasks::Millis;

/// Props handed to the loading overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayProps {
    pub is_loaded_first_image: bool,
    pub progress: u8,
}

#[derive(Debug)]
pub struct PageComposition {
    progress: u8,
    is_loaded_first_image: bool,
    indicator: LoadingIndicatorAnimator,
}

impl PageComposition {
    pub fn new(timings: IndicatorTimings) -> Self {
        Self {
            progress: 0,
            is_loaded_first_image: false,
            indicator: LoadingIndicatorAnimator::new(timings),
        }
    }

    pub fn handle_progress(&mut self, percent: u8, now: Millis) {
        let percent = percent.min(100);
        if percent > self.progress {
            self.progress = percent;
            self.indicator.update(self.progress, now);
        }
    }

    /// Pins progress to 100. A repeat from a later generation leaves a
    /// running animation alone.
    pub fn handle_loaded(&mut self, now: Millis) {
        self.is_loaded_first_image = true;
        if self.progress < 100 {
            self.progress = 100;
            self.indicator.update(100, now);
        }
        self.indicator.mark_first_view_loaded(now);
    }

    /// Route one gallery signal. Reveals are not the page's concern.
    pub fn apply(&mut self, signal: &GallerySignal, now: Millis) {
        match signal {
            GallerySignal::FirstViewProgress(p) => self.handle_progress(*p, now),
            GallerySignal::FirstViewLoaded => self.handle_loaded(now),
            GallerySignal::Revealed(_) => {}
        }
    }

    pub fn overlay_props(&self) -> OverlayProps {
        OverlayProps {
            is_loaded_first_image: self.is_loaded_first_image,
            progress: self.progress,
        }
    }

    /// The side column slides in once the first screen has loaded.
    pub fn is_side_column_displayed(&self) -> bool {
        self.is_loaded_first_image
    }

    pub fn indicator(&self) -> &LoadingIndicatorAnimator {
        &self.indicator
    }

    pub fn indicator_mut(&mut self) -> &mut LoadingIndicatorAnimator {
        &mut self.indicator
    }

    pub fn indicator_view(&self) -> IndicatorView {
        self.indicator.view()
    }

    pub fn dispose(&mut self) {
        self.indicator.dispose();
    }
}

impl Default for PageComposition {
    fn default() -> Self {
        Self::new(IndicatorTimings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicator::IndicatorPhase;

    #[test]
    fn progress_only_rises() {
        let mut page = PageComposition::default();
        page.handle_progress(40, 0);
        page.handle_progress(20, 10);
        assert_eq!(page.overlay_props().progress, 40);
        page.handle_progress(140, 20);
        assert_eq!(page.overlay_props().progress, 100);
    }

    #[test]
    fn loaded_pins_progress_and_shows_side_column() {
        let mut page = PageComposition::default();
        assert!(!page.is_side_column_displayed());
        page.apply(&GallerySignal::FirstViewLoaded, 0);
        assert_eq!(
            page.overlay_props(),
            OverlayProps {
                is_loaded_first_image: true,
                progress: 100
            }
        );
        assert!(page.is_side_column_displayed());
        assert!(page.indicator().needs_frame());
        assert!(page.indicator().is_first_view_loaded());
    }

    #[test]
    fn repeated_loaded_does_not_restart_animation() {
        let mut page = PageComposition::default();
        page.apply(&GallerySignal::FirstViewLoaded, 0);
        page.indicator_mut().frame(96);
        let mid = page.indicator_view().percent;
        assert!(mid > 0 && mid < 100);

        page.apply(&GallerySignal::FirstViewLoaded, 96);
        let mut now = 96;
        while page.indicator().needs_frame() {
            now += 16;
            page.indicator_mut().frame(now);
        }
        // The tween started at 0 still ends at 700.
        assert_eq!(now, 704);
        assert_eq!(page.indicator_view().percent, 100);
    }

    #[test]
    fn indicator_reaches_holding_after_frames() {
        let mut page = PageComposition::default();
        page.apply(&GallerySignal::FirstViewProgress(100), 0);
        page.apply(&GallerySignal::FirstViewLoaded, 0);
        let mut now = 0;
        while page.indicator().needs_frame() {
            now += 16;
            page.indicator_mut().frame(now);
        }
        assert_eq!(page.indicator_view().percent, 100);
        assert_eq!(page.indicator_view().phase, IndicatorPhase::Holding);
    }
}

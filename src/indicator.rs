//! Loading indicator: smoothed percentage plus display lifecycle.
//!
//! Raw progress arrives in jumps. The animator turns it into a displayed
//! value that eases toward each new target with an ease-out cubic curve,
//! sampled once per display frame, and never goes backwards.
//!
//! ```text
//!            displayed == 100
//!            && first view loaded     hold elapsed        fade elapsed
//!   Active ───────────────────────▶ Holding ──────────▶ FadingOut ──────────▶ Removed
//! ```
//!
//! Each transition is a guard over `(displayed, first_view_loaded, now)`;
//! the animator owns no timers of its own. Whoever drives it calls
//! [`frame`](LoadingIndicatorAnimator::frame) while
//! [`needs_frame`](LoadingIndicatorAnimator::needs_frame) is true and
//! [`advance`](LoadingIndicatorAnimator::advance) at
//! [`next_deadline`](LoadingIndicatorAnimator::next_deadline).

use crate::tasks::Millis;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorPhase {
    Active,
    Holding,
    FadingOut,
    Removed,
}

impl IndicatorPhase {
    pub fn label(self) -> &'static str {
        match self {
            IndicatorPhase::Active => "active",
            IndicatorPhase::Holding => "holding",
            IndicatorPhase::FadingOut => "fading-out",
            IndicatorPhase::Removed => "removed",
        }
    }
}

/// Durations driving the indicator, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorTimings {
    /// Dwell at 100% before fading starts.
    pub hold_ms: Millis,
    /// Fade-out length before the indicator is removed.
    pub fade_ms: Millis,
    /// Upper bound on a single smoothing animation.
    pub max_tween_ms: Millis,
    /// Animation length per percentage point of distance.
    pub tween_ms_per_point: Millis,
}

impl Default for IndicatorTimings {
    fn default() -> Self {
        Self {
            hold_ms: 800,
            fade_ms: 500,
            max_tween_ms: 700,
            tween_ms_per_point: 80,
        }
    }
}

impl IndicatorTimings {
    pub fn tween_duration(&self, delta: u8) -> Millis {
        (self.tween_ms_per_point * Millis::from(delta)).min(self.max_tween_ms)
    }
}

/// `1 - (1 - t)^3`, with `t` clamped to `[0, 1]`.
pub fn ease_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Tween {
    from: u8,
    to: u8,
    start: Millis,
    duration: Millis,
}

impl Tween {
    /// Rounded to the nearest point, so the target shows slightly before
    /// the duration has elapsed.
    fn sample(&self, now: Millis) -> (u8, bool) {
        let elapsed = now.saturating_sub(self.start);
        let t = if self.duration == 0 {
            1.0
        } else {
            (elapsed as f64 / self.duration as f64).min(1.0)
        };
        let delta = f64::from(self.to - self.from);
        let value = (f64::from(self.from) + delta * ease_out_cubic(t)).round();
        (value.clamp(0.0, 100.0) as u8, t >= 1.0)
    }
}

/// Read-only snapshot for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorView {
    pub percent: u8,
    pub phase: IndicatorPhase,
}

impl IndicatorView {
    pub fn is_rendered(&self) -> bool {
        self.phase != IndicatorPhase::Removed
    }

    pub fn is_fading(&self) -> bool {
        self.phase == IndicatorPhase::FadingOut
    }
}

#[derive(Debug)]
pub struct LoadingIndicatorAnimator {
    timings: IndicatorTimings,
    displayed: u8,
    tween: Option<Tween>,
    first_view_loaded: bool,
    phase: IndicatorPhase,
    phase_deadline: Option<Millis>,
    disposed: bool,
}

impl LoadingIndicatorAnimator {
    pub fn new(timings: IndicatorTimings) -> Self {
        Self {
            timings,
            displayed: 0,
            tween: None,
            first_view_loaded: false,
            phase: IndicatorPhase::Active,
            phase_deadline: None,
            disposed: false,
        }
    }

    pub fn view(&self) -> IndicatorView {
        IndicatorView {
            percent: self.displayed,
            phase: self.phase,
        }
    }

    pub fn displayed(&self) -> u8 {
        self.displayed
    }

    pub fn phase(&self) -> IndicatorPhase {
        self.phase
    }

    /// Feed a raw percentage. Targets at or below the displayed value are
    /// ignored; anything higher restarts the animation from where the
    /// display currently is.
    pub fn update(&mut self, raw_percent: u8, now: Millis) {
        if self.disposed || self.phase == IndicatorPhase::Removed {
            return;
        }
        let target = raw_percent.min(100);
        if target <= self.displayed {
            return;
        }
        let delta = target - self.displayed;
        self.tween = Some(Tween {
            from: self.displayed,
            to: target,
            start: now,
            duration: self.timings.tween_duration(delta),
        });
    }

    pub fn mark_first_view_loaded(&mut self, now: Millis) {
        if self.disposed {
            return;
        }
        self.first_view_loaded = true;
        self.evaluate(now);
    }

    pub fn is_first_view_loaded(&self) -> bool {
        self.first_view_loaded
    }

    /// Whether a smoothing animation wants the next display frame.
    pub fn needs_frame(&self) -> bool {
        self.tween.is_some()
    }

    /// Sample the running animation at display-frame time `now`.
    pub fn frame(&mut self, now: Millis) {
        if self.disposed {
            return;
        }
        if let Some(tween) = self.tween {
            let (value, done) = tween.sample(now);
            self.displayed = self.displayed.max(value);
            if done {
                self.tween = None;
            }
        }
        self.evaluate(now);
    }

    /// When the hold or fade timer expires, if one is armed.
    pub fn next_deadline(&self) -> Option<Millis> {
        self.phase_deadline
    }

    /// Fire every lifecycle timer due at or before `now`.
    pub fn advance(&mut self, now: Millis) {
        while let Some(due) = self.phase_deadline {
            if due > now {
                break;
            }
            match self.phase {
                IndicatorPhase::Holding => {
                    self.phase = IndicatorPhase::FadingOut;
                    self.phase_deadline = Some(due + self.timings.fade_ms);
                }
                IndicatorPhase::FadingOut => {
                    self.phase = IndicatorPhase::Removed;
                    self.phase_deadline = None;
                    self.tween = None;
                }
                IndicatorPhase::Active | IndicatorPhase::Removed => {
                    self.phase_deadline = None;
                }
            }
        }
    }

    /// Cancel the animation and any armed timer.
    pub fn dispose(&mut self) {
        self.disposed = true;
        self.tween = None;
        self.phase_deadline = None;
    }

    fn evaluate(&mut self, now: Millis) {
        if self.phase == IndicatorPhase::Active && self.first_view_loaded && self.displayed >= 100 {
            self.phase = IndicatorPhase::Holding;
            self.phase_deadline = Some(now + self.timings.hold_ms);
        }
    }
}

impl Default for LoadingIndicatorAnimator {
    fn default() -> Self {
        Self::new(IndicatorTimings::default())
    }
}

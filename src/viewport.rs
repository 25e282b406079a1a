//! Viewport-intersection detection.
//!
//! Geometry lives in document space: every tracked element has a fixed
//! [`Rect`], and the viewport is a window-sized rect whose `top` is the
//! current scroll offset. The observer is told whenever the viewport moves
//! and reports the elements that entered it, each at most once.
//!
//! ## Root margin
//!
//! The viewport is inset by a CSS-style margin before testing, written in
//! the usual one-to-four value shorthand (`"0px 0px -10% 0px"`). Positive
//! values grow the root, negative values shrink it. Percentages resolve
//! against the viewport height for top/bottom and its width for left/right.
//!
//! ## Threshold
//!
//! An element has entered once the visible fraction of its own area inside
//! the margin-adjusted root reaches `threshold`. A zero threshold fires on
//! any overlap, including edge contact.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Axis-aligned rectangle in document coordinates (CSS pixels).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Overlapping region, or `None` when the rects are disjoint.
    ///
    /// Touching edges count as an (empty) intersection, as they do for
    /// browser intersection observers.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right < left || bottom < top {
            return None;
        }
        Some(Rect::new(left, top, right - left, bottom - top))
    }

    /// Same rect shifted vertically.
    pub fn offset_y(&self, dy: f64) -> Rect {
        Rect::new(self.left, self.top + dy, self.width, self.height)
    }
}

/// One margin component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Length {
    Px(f64),
    Percent(f64),
}

impl Length {
    fn resolve(self, basis: f64) -> f64 {
        match self {
            Length::Px(v) => v,
            Length::Percent(p) => basis * p / 100.0,
        }
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Length::Px(v) => write!(f, "{v}px"),
            Length::Percent(p) => write!(f, "{p}%"),
        }
    }
}

/// Error returned when a root margin string cannot be parsed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid root margin {input:?}: {reason}")]
pub struct RootMarginError {
    pub input: String,
    pub reason: &'static str,
}

/// Inset applied to the viewport before the intersection test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootMargin {
    pub top: Length,
    pub right: Length,
    pub bottom: Length,
    pub left: Length,
}

impl RootMargin {
    pub const ZERO: RootMargin = RootMargin {
        top: Length::Px(0.0),
        right: Length::Px(0.0),
        bottom: Length::Px(0.0),
        left: Length::Px(0.0),
    };

    /// Grow (or shrink, for negative values) `root` by this margin.
    pub fn apply(&self, root: &Rect) -> Rect {
        let top = self.top.resolve(root.height);
        let bottom = self.bottom.resolve(root.height);
        let left = self.left.resolve(root.width);
        let right = self.right.resolve(root.width);
        Rect::new(
            root.left - left,
            root.top - top,
            root.width + left + right,
            root.height + top + bottom,
        )
    }
}

impl Default for RootMargin {
    /// Triggers slightly before an element reaches the bottom edge.
    fn default() -> Self {
        RootMargin {
            bottom: Length::Percent(-10.0),
            ..RootMargin::ZERO
        }
    }
}

impl FromStr for RootMargin {
    type Err = RootMarginError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let err = |reason| RootMarginError {
            input: input.to_string(),
            reason,
        };
        let parts = input
            .split_whitespace()
            .map(|tok| parse_length(tok).ok_or_else(|| err("expected <number>px, <number>% or 0")))
            .collect::<Result<Vec<_>, _>>()?;
        let (top, right, bottom, left) = match parts.as_slice() {
            [a] => (*a, *a, *a, *a),
            [v, h] => (*v, *h, *v, *h),
            [t, h, b] => (*t, *h, *b, *h),
            [t, r, b, l] => (*t, *r, *b, *l),
            _ => return Err(err("expected one to four values")),
        };
        Ok(RootMargin {
            top,
            right,
            bottom,
            left,
        })
    }
}

impl fmt::Display for RootMargin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.top, self.right, self.bottom, self.left)
    }
}

fn parse_length(tok: &str) -> Option<Length> {
    if let Some(num) = tok.strip_suffix('%') {
        return num.parse::<f64>().ok().filter(|v| v.is_finite()).map(Length::Percent);
    }
    if let Some(num) = tok.strip_suffix("px") {
        return num.parse::<f64>().ok().filter(|v| v.is_finite()).map(Length::Px);
    }
    // Unitless values are only valid when zero.
    match tok.parse::<f64>() {
        Ok(v) if v == 0.0 => Some(Length::Px(0.0)),
        _ => None,
    }
}

/// Fraction of `target` visible inside `root`, in `[0, 1]`.
///
/// Zero-area targets report 1.0 when they touch the root and 0.0 otherwise.
pub fn intersection_ratio(target: &Rect, root: &Rect) -> f64 {
    let Some(overlap) = target.intersection(root) else {
        return 0.0;
    };
    let area = target.area();
    if area == 0.0 {
        return 1.0;
    }
    (overlap.area() / area).clamp(0.0, 1.0)
}

/// Observer configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObserverOptions {
    pub root_margin: RootMargin,
    pub threshold: f64,
}

impl Default for ObserverOptions {
    fn default() -> Self {
        Self {
            root_margin: RootMargin::default(),
            threshold: 0.1,
        }
    }
}

impl ObserverOptions {
    /// Whether `target` counts as inside the margin-adjusted `viewport`.
    pub fn is_intersecting(&self, target: &Rect, viewport: &Rect) -> bool {
        let root = self.root_margin.apply(viewport);
        if target.intersection(&root).is_none() {
            return false;
        }
        let ratio = intersection_ratio(target, &root);
        if self.threshold <= 0.0 {
            true
        } else {
            ratio >= self.threshold
        }
    }
}

/// Emits an "entered" notification the first time each tracked element
/// intersects the viewport, and never again for that element.
#[derive(Debug)]
pub struct ViewportObserver {
    options: ObserverOptions,
    targets: BTreeMap<usize, Rect>,
    entered: BTreeSet<usize>,
    connected: bool,
}

impl ViewportObserver {
    /// Start observing every element in `targets`.
    pub fn observe_all(
        options: ObserverOptions,
        targets: impl IntoIterator<Item = (usize, Rect)>,
    ) -> Self {
        Self {
            options,
            targets: targets.into_iter().collect(),
            entered: BTreeSet::new(),
            connected: true,
        }
    }

    /// Track one more element. Ignored once disconnected.
    pub fn observe(&mut self, index: usize, rect: Rect) {
        if self.connected {
            self.targets.insert(index, rect);
        }
    }

    /// Report elements that entered `viewport` for the first time, in
    /// document order. Each index is reported at most once per observer.
    pub fn check(&mut self, viewport: &Rect) -> Vec<usize> {
        if !self.connected {
            return Vec::new();
        }
        let newly: Vec<usize> = self
            .targets
            .iter()
            .filter(|(index, _)| !self.entered.contains(index))
            .filter(|(_, rect)| self.options.is_intersecting(rect, viewport))
            .map(|(index, _)| *index)
            .collect();
        for index in &newly {
            self.entered.insert(*index);
            // Entered elements need no further observation.
            self.targets.remove(index);
        }
        newly
    }

    /// Stop all observation. Calling it again is a no-op.
    pub fn disconnect(&mut self) {
        if self.connected {
            self.connected = false;
            self.targets.clear();
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Elements still waiting to enter the viewport.
    pub fn pending(&self) -> usize {
        self.targets.len()
    }
}

//! # haco-portfolio
//!
//! Builds a photographer's portfolio page: a side column with anchor
//! navigation, an About section, and a Works gallery fetched from a headless
//! CMS, fronted by a loading overlay.
//!
//! # Architecture: the Perceived-Load Pipeline
//!
//! Most of the page is plain markup. The interesting part is how it comes
//! into view:
//!
//! ```text
//! ContentSource ─▶ GalleryView ─▶ ViewportObserver ─▶ RevealScheduler ─▶ item visibility
//!                       │
//!                       └─▶ LoadProgressAggregator ─▶ PageComposition ─▶ LoadingIndicatorAnimator
//! ```
//!
//! 1. Items entering the viewport queue up and are revealed one per fixed
//!    interval, so the first screen cascades in.
//! 2. Only images on the first screen count toward load progress.
//! 3. The indicator eases toward each progress jump, never goes backwards,
//!    holds briefly at 100% and fades out.
//!
//! Every component is a state machine over an explicit `now`. Nothing reads
//! a clock or owns a timer; each exposes its next deadline and a driver
//! ([`simulate`]) dispatches timers, display frames and external events from
//! one cooperative [`tasks::TaskQueue`]. That keeps ordering deterministic
//! and lets tests feed synthetic event sequences without a browser.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`types`] | Gallery records and shared keys |
//! | [`config`] | `config.toml` loading, merging and validation |
//! | [`content`] | Content sources (CMS, local JSON) and fire-once fetch |
//! | [`viewport`] | Geometry, root margins and the viewport observer |
//! | [`reveal`] | FIFO reveal scheduler and per-generation reveal state |
//! | [`progress`] | First-screen image load aggregation |
//! | [`indicator`] | Smoothed percentage and overlay lifecycle |
//! | [`layout`] | Deterministic gallery geometry |
//! | [`gallery`] | Per-generation wiring of observer, scheduler and aggregator |
//! | [`page`] | Page composition: monotonic progress into the indicator |
//! | [`tasks`] | Single-threaded task queue on virtual time |
//! | [`simulate`] | End-to-end driver producing a timeline |
//! | [`render`] | Maud HTML rendering of a page snapshot |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Generations Are Replaced, Not Cleared
//!
//! A refetch builds a new reveal session, observer and aggregator and drops
//! the old ones after disposing them. Late callbacks carry their generation
//! and are ignored when it is no longer current.
//!
//! ## Positional Identity
//!
//! The CMS records carry no stable key, so items are identified by their
//! position in the fetched list. A refetch that reorders records starts a
//! new generation anyway, which keeps positional state from leaking across
//! orderings.

pub mod config;
pub mod content;
pub mod gallery;
pub mod indicator;
pub mod layout;
pub mod output;
pub mod page;
pub mod progress;
pub mod render;
pub mod reveal;
pub mod simulate;
pub mod tasks;
pub mod types;
pub mod viewport;

#[cfg(test)]
pub(crate) mod test_helpers;

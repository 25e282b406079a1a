//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Fetch
//!
//! ```text
//! Works
//! 001 Library (2 images)
//!     Category: Architecture
//!     Subtitle: Public
//! 002 House (1 image)
//!
//! Fetched 2 works
//! ```
//!
//! ## Simulate
//!
//! ```text
//!      0 ms  commit      generation 0, 9 works
//!      0 ms  reveal      001
//!      0 ms  progress    0%
//!    140 ms  reveal      002
//!    ...
//!   1392 ms  indicator   fading-out
//!
//! Revealed 9 of 9 works, first view loaded at 420 ms, indicator removed at 1892 ms
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::indicator::IndicatorPhase;
use crate::simulate::{Timeline, TimelineEvent};
use crate::types::GalleryItem;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

// ============================================================================
// Fetch output
// ============================================================================

/// Format the fetched gallery as a numbered inventory.
pub fn format_fetch_output(items: &[GalleryItem]) -> Vec<String> {
    let mut lines = vec!["Works".to_string()];
    for (i, item) in items.iter().enumerate() {
        lines.push(format!(
            "{} {} ({})",
            format_index(i + 1),
            item.title,
            plural(item.images.len(), "image", "images")
        ));
        if !item.categories.is_empty() {
            lines.push(format!("{}Category: {}", indent(1), item.categories.join(", ")));
        }
        if !item.subtitle.is_empty() {
            lines.push(format!("{}Subtitle: {}", indent(1), item.subtitle));
        }
    }
    lines.push(String::new());
    lines.push(format!("Fetched {}", plural(items.len(), "work", "works")));
    lines
}

pub fn print_fetch_output(items: &[GalleryItem]) {
    for line in format_fetch_output(items) {
        println!("{}", line);
    }
}

// ============================================================================
// Simulate output
// ============================================================================

fn event_line(event: &TimelineEvent) -> Option<(&'static str, String)> {
    Some(match event {
        TimelineEvent::Committed { generation, items } => (
            "commit",
            format!("generation {}, {}", generation.0, plural(*items, "work", "works")),
        ),
        TimelineEvent::Scrolled { scroll_y } => ("scroll", format!("{scroll_y:.0}px")),
        TimelineEvent::Revealed { index } => ("reveal", format_index(index + 1)),
        TimelineEvent::Progress { percent } => ("progress", format!("{percent}%")),
        TimelineEvent::FirstViewLoaded => ("loaded", "first view".to_string()),
        TimelineEvent::Displayed { .. } => return None,
        TimelineEvent::Phase { phase } => ("indicator", phase.label().to_string()),
    })
}

/// Format a simulation timeline followed by a one-line summary.
///
/// Displayed-percentage samples are per frame and are left out unless
/// `frames` is set.
pub fn format_timeline(timeline: &Timeline, total_items: usize, frames: bool) -> Vec<String> {
    let mut lines = Vec::new();
    for entry in &timeline.entries {
        let formatted = match &entry.event {
            TimelineEvent::Displayed { percent } if frames => {
                Some(("display", format!("{percent}%")))
            }
            other => event_line(other),
        };
        if let Some((kind, detail)) = formatted {
            lines.push(format!("{:>6} ms  {:<10}  {}", entry.at, kind, detail));
        }
    }
    lines.push(String::new());
    lines.push(format_summary(timeline, total_items));
    lines
}

fn format_summary(timeline: &Timeline, total_items: usize) -> String {
    let revealed = timeline.reveals().len();
    let mut summary = format!("Revealed {} of {}", revealed, plural(total_items, "work", "works"));
    let loaded_at = timeline
        .entries
        .iter()
        .find(|e| e.event == TimelineEvent::FirstViewLoaded)
        .map(|e| e.at);
    match loaded_at {
        Some(at) => summary.push_str(&format!(", first view loaded at {at} ms")),
        None => summary.push_str(", first view still loading"),
    }
    let removed_at = timeline
        .phases()
        .into_iter()
        .find(|(_, phase)| *phase == IndicatorPhase::Removed)
        .map(|(at, _)| at);
    if let Some(at) = removed_at {
        summary.push_str(&format!(", indicator removed at {at} ms"));
    }
    summary
}

pub fn print_timeline(timeline: &Timeline, total_items: usize, frames: bool) {
    for line in format_timeline(timeline, total_items, frames) {
        println!("{}", line);
    }
}

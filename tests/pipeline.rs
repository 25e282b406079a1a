//! End-to-end behavior of the perceived-load pipeline, driven through the
//! deterministic simulation.
//!
//! Geometry used throughout (unless a test overrides it):
//!
//! ```text
//! viewport 1000 x 800, side column 200, 3 columns of 240, gap 20
//! works grid starts at y = 380, one 300x400 image per item
//! row 0: 380..806 (first screen), row 1: 826..1252
//! ```

use haco_portfolio::config::PageConfig;
use haco_portfolio::indicator::IndicatorPhase;
use haco_portfolio::simulate::{ImageFate, ImagePlan, Scenario, Simulation, simulate};
use haco_portfolio::types::{GalleryImage, GalleryItem, ImageKey};

fn items(n: usize) -> Vec<GalleryItem> {
    (0..n)
        .map(|i| GalleryItem {
            title: format!("work-{i:02}"),
            subtitle: String::new(),
            categories: vec!["Architecture".to_string()],
            images: vec![GalleryImage {
                url: format!("https://images.example/{i}.jpg"),
                width: 300,
                height: 400,
            }],
            create_date: None,
        })
        .collect()
}

fn config() -> PageConfig {
    let mut config = PageConfig::default();
    config.layout.viewport_width = 1000;
    config.layout.viewport_height = 800;
    config.layout.gap = 20;
    config.layout.top_offset = 380;
    config.layout.side_column_width = 200;
    config
}

fn is_non_decreasing(values: &[u8]) -> bool {
    values.windows(2).all(|w| w[0] <= w[1])
}

#[test]
fn ten_items_on_screen_reveal_140ms_apart_in_order() {
    let mut config = config();
    config.layout.viewport_height = 20_000;
    let timeline = simulate(Scenario::new(items(10), config), 5_000).unwrap();
    let expected: Vec<_> = (0..10).map(|i| (i as u64 * 140, i)).collect();
    assert_eq!(timeline.reveals(), expected);
}

#[test]
fn scrolling_back_and_forth_reveals_each_item_once() {
    let scenario = Scenario::new(items(9), config())
        .with_scroll(1_000, 600.0)
        .with_scroll(1_200, 0.0)
        .with_scroll(1_400, 600.0)
        .with_scroll(1_600, 1_200.0);
    let timeline = simulate(scenario, 10_000).unwrap();
    let mut indices: Vec<_> = timeline.reveals().into_iter().map(|(_, i)| i).collect();
    assert_eq!(indices.len(), 9);
    indices.sort();
    indices.dedup();
    assert_eq!(indices.len(), 9);
}

#[test]
fn without_observer_everything_is_revealed_at_commit() {
    let mut config = config();
    config.observer.supported = false;
    let scenario = Scenario::new(items(12), config);
    let timeline = simulate(scenario, 5_000).unwrap();
    let reveals = timeline.reveals();
    assert_eq!(reveals.len(), 12);
    assert!(reveals.iter().all(|(at, _)| *at == 0));
}

#[test]
fn failed_image_counts_toward_progress() {
    let plan = ImagePlan::uniform(100).with(ImageKey::new(1, 0), ImageFate::Fails(50));
    let scenario = Scenario::new(items(6), config()).with_images(plan);
    let timeline = simulate(scenario, 10_000).unwrap();
    assert_eq!(timeline.progress(), vec![0, 33, 66, 100]);
    assert_eq!(timeline.first_view_loaded_count(), 1);
}

#[test]
fn completes_once_even_when_every_image_fails() {
    let plan = (0..6).fold(ImagePlan::uniform(100), |plan, i| {
        plan.with(ImageKey::new(i, 0), ImageFate::Fails(80))
    });
    let scenario = Scenario::new(items(6), config()).with_images(plan);
    let timeline = simulate(scenario, 10_000).unwrap();
    assert_eq!(timeline.progress().last(), Some(&100));
    assert_eq!(timeline.first_view_loaded_count(), 1);
    assert_eq!(timeline.phases().last().map(|(_, p)| *p), Some(IndicatorPhase::Removed));
}

#[test]
fn empty_first_screen_reports_complete_immediately() {
    let mut config = config();
    config.layout.top_offset = 5_000;
    let timeline = simulate(Scenario::new(items(6), config), 10_000).unwrap();
    assert_eq!(timeline.progress(), vec![100]);
    assert_eq!(timeline.first_view_loaded_count(), 1);
    let loaded_at = timeline
        .entries
        .iter()
        .find(|e| e.event == haco_portfolio::simulate::TimelineEvent::FirstViewLoaded)
        .map(|e| e.at);
    assert_eq!(loaded_at, Some(0));
}

#[test]
fn empty_gallery_still_clears_the_overlay() {
    let timeline = simulate(Scenario::new(Vec::new(), config()), 10_000).unwrap();
    assert!(timeline.reveals().is_empty());
    assert_eq!(timeline.progress(), vec![100]);
    assert_eq!(timeline.phases().last().map(|(_, p)| *p), Some(IndicatorPhase::Removed));
}

#[test]
fn zero_to_hundred_lifecycle_takes_about_two_seconds() {
    let plan = (0..3).fold(ImagePlan::default(), |plan, i| {
        plan.with(ImageKey::new(i, 0), ImageFate::Cached)
    });
    let scenario = Scenario::new(items(6), config()).with_images(plan);
    let timeline = simulate(scenario, 10_000).unwrap();

    assert_eq!(timeline.progress(), vec![100]);
    assert_eq!(
        timeline.phases(),
        vec![
            (592, IndicatorPhase::Holding),
            (1_392, IndicatorPhase::FadingOut),
            (1_892, IndicatorPhase::Removed),
        ]
    );
    let displayed: Vec<_> = timeline.displayed().into_iter().map(|(_, v)| v).collect();
    assert!(is_non_decreasing(&displayed));
    assert_eq!(displayed.last(), Some(&100));
}

#[test]
fn refetch_never_lowers_progress_or_display() {
    let scenario = Scenario::new(items(6), config())
        .with_images(ImagePlan::staggered(100, 200))
        .with_refetch(350, items(6));
    let timeline = simulate(scenario, 10_000).unwrap();

    assert_eq!(timeline.progress(), vec![0, 33, 66, 100]);
    assert_eq!(timeline.first_view_loaded_count(), 1);
    let displayed: Vec<_> = timeline.displayed().into_iter().map(|(_, v)| v).collect();
    assert!(is_non_decreasing(&displayed));
}

#[test]
fn refetch_restarts_reveal_cascade() {
    let scenario = Scenario::new(items(3), config()).with_refetch(1_000, items(3));
    let timeline = simulate(scenario, 5_000).unwrap();
    let times: Vec<_> = timeline.reveals().into_iter().map(|(at, _)| at).collect();
    assert_eq!(times, vec![0, 140, 280, 1_000, 1_140, 1_280]);
}

#[test]
fn side_column_appears_once_first_screen_loads() {
    let scenario = Scenario::new(items(3), config()).with_images(ImagePlan::uniform(300));
    let mut sim = Simulation::new(scenario).unwrap();
    sim.run_until(200);
    assert_eq!(sim.now(), 200);
    assert!(!sim.page().is_side_column_displayed());
    sim.run_until(300);
    assert_eq!(sim.now(), 300);
    assert!(sim.page().is_side_column_displayed());
    assert!(sim.page().overlay_props().is_loaded_first_image);
}

#[test]
fn invalid_root_margin_is_rejected() {
    let mut config = config();
    config.observer.root_margin = "ten pixels".to_string();
    assert!(Simulation::new(Scenario::new(items(1), config)).is_err());
}

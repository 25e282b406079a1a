//! Shared test utilities for the haco-portfolio test suite.
//!
//! Provides gallery fixtures and a compact grid whose geometry is easy to
//! reason about in assertions:
//!
//! ```text
//! viewport 1000 x 800, side column 200, 3 columns of 240, gap 20
//! works grid starts at y = 380
//! gallery_items(): one 300x400 portrait per item → item height 426
//! row 0: 380..806   (on the first screen, observed at scroll 0)
//! row 1: 826..1252  (below the fold)
//! ```

use crate::layout::GridLayout;
use crate::types::{GalleryImage, GalleryItem};

/// Grid used by unit tests; see the module docs for its geometry.
pub fn small_grid() -> GridLayout {
    GridLayout {
        viewport_width: 1000.0,
        viewport_height: 800.0,
        columns: 3,
        gap: 20.0,
        top_offset: 380.0,
        side_column_width: 200.0,
    }
}

/// An item titled `title` with one image per `(width, height)` pair.
pub fn item_with_images(title: &str, dims: &[(u32, u32)]) -> GalleryItem {
    GalleryItem {
        title: title.to_string(),
        subtitle: format!("{title} subtitle"),
        categories: vec!["Architecture".to_string()],
        images: dims
            .iter()
            .enumerate()
            .map(|(i, (width, height))| GalleryImage {
                url: format!("https://images.example/{title}-{i}.jpg"),
                width: *width,
                height: *height,
            })
            .collect(),
        create_date: None,
    }
}

/// `n` items, each with a single 300x400 portrait image.
pub fn gallery_items(n: usize) -> Vec<GalleryItem> {
    (0..n)
        .map(|i| item_with_images(&format!("work-{i:02}"), &[(300, 400)]))
        .collect()
}

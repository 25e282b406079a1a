//! Deterministic gallery layout.
//!
//! The page is a fixed side column on the left and a main column holding the
//! About block followed by the Works grid. Works items flow into rows of
//! `columns` items; each item stacks its (at most two) images at the column
//! width, followed by a fixed-height info block. A row is as tall as its
//! tallest item.
//!
//! Positions are in document space, so the same boxes serve the viewport
//! observer (which moves the viewport) and the first-screen measurement
//! (which translates them to viewport space at scroll offset zero).

use crate::config::LayoutConfig;
use crate::types::{GalleryItem, ImageKey};
use crate::viewport::Rect;

/// Height reserved under each item's images for category, title and subtitle.
pub const INFO_BLOCK_HEIGHT: f64 = 96.0;

/// Rendered box of one gallery item.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemBox {
    pub index: usize,
    pub rect: Rect,
    pub images: Vec<(ImageKey, Rect)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridLayout {
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub columns: usize,
    pub gap: f64,
    /// Document offset at which the Works grid starts.
    pub top_offset: f64,
    /// Width taken by the side column.
    pub side_column_width: f64,
}

impl GridLayout {
    pub fn from_config(config: &LayoutConfig) -> Self {
        Self {
            viewport_width: f64::from(config.viewport_width),
            viewport_height: f64::from(config.viewport_height),
            columns: config.columns.max(1),
            gap: f64::from(config.gap),
            top_offset: f64::from(config.top_offset),
            side_column_width: f64::from(config.side_column_width),
        }
    }

    pub fn column_width(&self) -> f64 {
        let columns = self.columns.max(1) as f64;
        let available = self.viewport_width - self.side_column_width - self.gap * (columns + 1.0);
        (available / columns).max(1.0)
    }

    /// The viewport rect when the page is scrolled to `scroll_y`.
    pub fn viewport_at(&self, scroll_y: f64) -> Rect {
        Rect::new(0.0, scroll_y, self.viewport_width, self.viewport_height)
    }

    pub fn layout(&self, items: &[GalleryItem]) -> Vec<ItemBox> {
        let width = self.column_width();
        let mut boxes = Vec::with_capacity(items.len());
        let mut row_top = self.top_offset;

        for (row, chunk) in items.chunks(self.columns.max(1)).enumerate() {
            let mut row_height: f64 = 0.0;
            for (col, item) in chunk.iter().enumerate() {
                let index = row * self.columns.max(1) + col;
                let left = self.side_column_width + self.gap + col as f64 * (width + self.gap);
                let mut y = row_top;
                let mut images = Vec::new();
                for (slot, image) in item.shown_images().iter().enumerate() {
                    let h = width * image.height_ratio();
                    images.push((ImageKey::new(index, slot), Rect::new(left, y, width, h)));
                    y += h + self.gap / 2.0;
                }
                let height = (y - row_top) + INFO_BLOCK_HEIGHT;
                row_height = row_height.max(height);
                boxes.push(ItemBox {
                    index,
                    rect: Rect::new(left, row_top, width, height),
                    images,
                });
            }
            row_top += row_height + self.gap;
        }
        boxes
    }

    /// Total document height for the given boxes.
    pub fn document_height(&self, boxes: &[ItemBox]) -> f64 {
        boxes
            .iter()
            .map(|b| b.rect.bottom())
            .fold(self.top_offset, f64::max)
            + self.gap
    }
}

impl Default for GridLayout {
    fn default() -> Self {
        Self::from_config(&LayoutConfig::default())
    }
}

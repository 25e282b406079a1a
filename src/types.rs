//! Shared types used across the page pipeline.
//!
//! Gallery records are fetched once per generation and never mutated. They
//! are serialized to `gallery.json` between the `fetch` and `render` commands,
//! so the same types are used for decoding CMS responses and local files.

use serde::{Deserialize, Deserializer, Serialize};

/// One work in the gallery, as delivered by the content source.
///
/// Items have no reliable identity of their own: everything downstream
/// (reveal state, load tracking) keys them by their position in the fetched
/// sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryItem {
    pub title: String,
    /// Secondary line under the title (the CMS `workCategory` field).
    #[serde(default, alias = "workCategory")]
    pub subtitle: String,
    /// Category labels. The CMS sends a single string; lists are accepted too.
    #[serde(
        default,
        alias = "category",
        deserialize_with = "deserialize_categories"
    )]
    pub categories: Vec<String>,
    #[serde(default)]
    pub images: Vec<GalleryImage>,
    /// Creation timestamp, used only to order local sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_date: Option<String>,
}

impl GalleryItem {
    /// Images actually rendered for this item: at most the first two.
    pub fn shown_images(&self) -> &[GalleryImage] {
        let n = self.images.len().min(IMAGES_PER_ITEM);
        &self.images[..n]
    }
}

/// Number of images rendered per gallery item.
pub const IMAGES_PER_ITEM: usize = 2;

/// A single image of a gallery item with its intrinsic dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryImage {
    pub url: String,
    #[serde(deserialize_with = "deserialize_dimension")]
    pub width: u32,
    #[serde(deserialize_with = "deserialize_dimension")]
    pub height: u32,
}

impl GalleryImage {
    /// Height per unit of width. Degenerate dimensions fall back to square.
    pub fn height_ratio(&self) -> f64 {
        if self.width == 0 || self.height == 0 {
            1.0
        } else {
            f64::from(self.height) / f64::from(self.width)
        }
    }
}

/// Addresses one rendered image: item position plus slot within the item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ImageKey {
    pub item: usize,
    pub slot: usize,
}

impl ImageKey {
    pub fn new(item: usize, slot: usize) -> Self {
        Self { item, slot }
    }
}

/// Sidebar anchor: clicking it scrolls to the element with the same id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnchorItem {
    pub title: String,
    pub id: String,
}

fn deserialize_categories<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(s)) if s.trim().is_empty() => Vec::new(),
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(v)) => v,
    })
}

fn deserialize_dimension<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrString {
        Num(u32),
        Float(f64),
        Str(String),
    }

    match NumOrString::deserialize(deserializer)? {
        NumOrString::Num(n) => Ok(n),
        NumOrString::Float(f) if f < 0.0 => Err(serde::de::Error::custom(format!(
            "negative image dimension: {f}"
        ))),
        NumOrString::Float(f) if f.round() > f64::from(u32::MAX) => Err(
            serde::de::Error::custom(format!("image dimension out of range: {f}")),
        ),
        NumOrString::Float(f) => Ok(f.round() as u32),
        NumOrString::Str(s) => s
            .trim()
            .parse::<u32>()
            .map_err(|_| serde::de::Error::custom(format!("invalid image dimension: {s:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_cms_field_names() {
        let json = r#"{
            "title": "Library",
            "workCategory": "Public",
            "category": "Architecture",
            "createDate": "2024-05-01T00:00:00.000Z",
            "images": [{"url": "https://img/a.jpg", "width": "1200", "height": "1600"}]
        }"#;
        let item: GalleryItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.subtitle, "Public");
        assert_eq!(item.categories, vec!["Architecture"]);
        assert_eq!(item.images[0].width, 1200);
        assert_eq!(item.images[0].height, 1600);
        assert_eq!(item.create_date.as_deref(), Some("2024-05-01T00:00:00.000Z"));
    }

    #[test]
    fn decodes_category_list_and_numeric_dimensions() {
        let json = r#"{
            "title": "House",
            "categories": ["Residential", "Interior"],
            "images": [{"url": "u", "width": 800, "height": 600.0}]
        }"#;
        let item: GalleryItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.categories, vec!["Residential", "Interior"]);
        assert_eq!(item.subtitle, "");
        assert_eq!(item.images[0].height, 600);
    }

    #[test]
    fn empty_category_string_is_no_category() {
        let json = r#"{"title": "x", "category": "  "}"#;
        let item: GalleryItem = serde_json::from_str(json).unwrap();
        assert!(item.categories.is_empty());
    }

    #[test]
    fn rejects_out_of_range_dimension() {
        let json = r#"{"url": "u", "width": 5000000000, "height": 10}"#;
        let err = serde_json::from_str::<GalleryImage>(json).unwrap_err();
        assert!(err.to_string().contains("out of range"));
        let json = r#"{"url": "u", "width": 4294967295, "height": 10}"#;
        let image: GalleryImage = serde_json::from_str(json).unwrap();
        assert_eq!(image.width, u32::MAX);
    }

    #[test]
    fn rejects_non_numeric_dimension() {
        let json = r#"{"url": "u", "width": "wide", "height": "10"}"#;
        assert!(serde_json::from_str::<GalleryImage>(json).is_err());
    }

    #[test]
    fn shown_images_caps_at_two() {
        let img = |w| GalleryImage { url: format!("{w}"), width: w, height: 10 };
        let item = GalleryItem {
            title: "t".into(),
            subtitle: String::new(),
            categories: vec![],
            images: vec![img(1), img(2), img(3)],
            create_date: None,
        };
        assert_eq!(item.shown_images().len(), 2);
        assert_eq!(item.shown_images()[1].width, 2);
    }

    #[test]
    fn height_ratio_falls_back_to_square() {
        let img = GalleryImage { url: "u".into(), width: 0, height: 300 };
        assert_eq!(img.height_ratio(), 1.0);
        let img = GalleryImage { url: "u".into(), width: 400, height: 300 };
        assert_eq!(img.height_ratio(), 0.75);
    }
}

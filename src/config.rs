//! Page configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! the base layer; a user `config.toml` in the config directory overrides any
//! subset of keys.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [content]
//! service_domain = ""            # CMS subdomain ("<domain>.microcms.io")
//! endpoint = "works"             # CMS list endpoint
//! limit = 50                     # Max gallery items (1-100)
//! orders = "-createDate"         # Newest first
//! api_key_env = "HACO_API_KEY"   # Environment variable holding the API key
//! # local_path = "works.json"    # Read a local JSON file instead of the CMS
//!
//! [reveal]
//! interval_ms = 140              # Spacing between staged reveals
//!
//! [observer]
//! root_margin = "0px 0px -10% 0px"
//! threshold = 0.1
//! supported = true               # false = reveal everything at once
//!
//! [indicator]
//! hold_ms = 800                  # Dwell at 100% before fading
//! fade_ms = 500                  # Fade-out duration
//! max_tween_ms = 700             # Longest smoothing animation
//! tween_ms_per_point = 80        # Animation length per percentage point
//! frame_ms = 16                  # Display refresh interval
//!
//! [layout]
//! viewport_width = 1280
//! viewport_height = 800
//! columns = 3
//! gap = 24
//! top_offset = 900               # Where the Works grid starts
//! side_column_width = 240
//!
//! [site]
//! title = "haco"
//! tagline = "Architecture photographer"
//! photographer = "Asuka Nagai"
//! instagram_url = "https://www.instagram.com/n.asuka85/"
//! # about_path = "about.md"
//!
//! [colors]
//! background = "#ffffff"
//! text = "#111111"
//! text_muted = "#888888"
//! accent = "#111111"             # Loading underline
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::indicator::IndicatorTimings;
use crate::tasks::Millis;
use crate::types::AnchorItem;
use crate::viewport::{ObserverOptions, RootMargin};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Page configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PageConfig {
    /// Where gallery records come from.
    pub content: ContentConfig,
    /// Staged reveal pacing.
    pub reveal: RevealConfig,
    /// Viewport-intersection settings.
    pub observer: ObserverConfig,
    /// Loading indicator timings.
    pub indicator: IndicatorConfig,
    /// Page geometry used for first-screen measurement and simulation.
    pub layout: LayoutConfig,
    /// Side column and About content.
    pub site: SiteConfig,
    /// Page colors.
    pub colors: ColorConfig,
}

impl PageConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.content.limit == 0 || self.content.limit > 100 {
            return Err(ConfigError::Validation(
                "content.limit must be 1-100".into(),
            ));
        }
        if self.reveal.interval_ms == 0 {
            return Err(ConfigError::Validation(
                "reveal.interval_ms must be non-zero".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.observer.threshold) {
            return Err(ConfigError::Validation(
                "observer.threshold must be 0.0-1.0".into(),
            ));
        }
        self.observer
            .root_margin
            .parse::<RootMargin>()
            .map_err(|e| ConfigError::Validation(format!("observer.root_margin: {e}")))?;
        if self.indicator.frame_ms == 0 {
            return Err(ConfigError::Validation(
                "indicator.frame_ms must be non-zero".into(),
            ));
        }
        if self.layout.columns == 0 {
            return Err(ConfigError::Validation(
                "layout.columns must be non-zero".into(),
            ));
        }
        if self.layout.viewport_width == 0 || self.layout.viewport_height == 0 {
            return Err(ConfigError::Validation(
                "layout viewport dimensions must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Content source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContentConfig {
    /// CMS service subdomain. Empty means no remote source is configured.
    pub service_domain: String,
    /// CMS list endpoint name.
    pub endpoint: String,
    /// Maximum number of gallery items.
    pub limit: usize,
    /// CMS ordering expression.
    pub orders: String,
    /// Name of the environment variable holding the CMS API key.
    pub api_key_env: String,
    /// Local JSON file used instead of the CMS, relative to the config dir.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_path: Option<String>,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            service_domain: String::new(),
            endpoint: "works".to_string(),
            limit: 50,
            orders: "-createDate".to_string(),
            api_key_env: "HACO_API_KEY".to_string(),
            local_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RevealConfig {
    /// Minimum spacing between consecutive reveals.
    pub interval_ms: Millis,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            interval_ms: crate::reveal::REVEAL_INTERVAL_MS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ObserverConfig {
    /// CSS-style inset applied to the viewport before the intersection test.
    pub root_margin: String,
    /// Minimum visible fraction of an item that counts as entered.
    pub threshold: f64,
    /// When false, viewport observation is treated as unavailable.
    pub supported: bool,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            root_margin: "0px 0px -10% 0px".to_string(),
            threshold: 0.1,
            supported: true,
        }
    }
}

impl ObserverConfig {
    /// Parsed observer options. `None` when observation is disabled.
    pub fn options(&self) -> Result<Option<ObserverOptions>, ConfigError> {
        if !self.supported {
            return Ok(None);
        }
        let root_margin = self
            .root_margin
            .parse::<RootMargin>()
            .map_err(|e| ConfigError::Validation(format!("observer.root_margin: {e}")))?;
        Ok(Some(ObserverOptions {
            root_margin,
            threshold: self.threshold,
        }))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndicatorConfig {
    pub hold_ms: Millis,
    pub fade_ms: Millis,
    pub max_tween_ms: Millis,
    pub tween_ms_per_point: Millis,
    /// Display refresh interval used to sample the smoothing animation.
    pub frame_ms: Millis,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        let t = IndicatorTimings::default();
        Self {
            hold_ms: t.hold_ms,
            fade_ms: t.fade_ms,
            max_tween_ms: t.max_tween_ms,
            tween_ms_per_point: t.tween_ms_per_point,
            frame_ms: 16,
        }
    }
}

impl IndicatorConfig {
    pub fn timings(&self) -> IndicatorTimings {
        IndicatorTimings {
            hold_ms: self.hold_ms,
            fade_ms: self.fade_ms,
            max_tween_ms: self.max_tween_ms,
            tween_ms_per_point: self.tween_ms_per_point,
        }
    }
}

/// Page geometry, in CSS pixels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub columns: usize,
    pub gap: u32,
    /// Document offset where the Works grid starts (below About).
    pub top_offset: u32,
    pub side_column_width: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            viewport_width: 1280,
            viewport_height: 800,
            columns: 3,
            gap: 24,
            top_offset: 900,
            side_column_width: 240,
        }
    }
}

/// Side column and About section content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Logo text, also the document title.
    pub title: String,
    pub tagline: String,
    pub photographer: String,
    pub instagram_url: String,
    /// Markdown file rendered into the About section, relative to the config dir.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about_path: Option<String>,
    /// Sidebar anchors. The `top` anchor is the logo link and is not listed.
    pub anchors: Vec<AnchorItem>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        let anchor = |title: &str, id: &str| AnchorItem {
            title: title.to_string(),
            id: id.to_string(),
        };
        Self {
            title: "haco".to_string(),
            tagline: "Architecture photographer".to_string(),
            photographer: "Asuka Nagai".to_string(),
            instagram_url: "https://www.instagram.com/n.asuka85/".to_string(),
            about_path: None,
            anchors: vec![
                anchor("Top", "top"),
                anchor("About", "about"),
                anchor("Works", "works"),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorConfig {
    pub background: String,
    pub text: String,
    /// Secondary text (categories, subtitles, sidebar tagline).
    pub text_muted: String,
    /// Loading underline and anchor hover.
    pub accent: String,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            background: "#ffffff".to_string(),
            text: "#111111".to_string(),
            text_muted: "#888888".to_string(),
            accent: "#111111".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(PageConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<PageConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PageConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory, on top of stock
/// defaults.
pub fn load_config(dir: &Path) -> Result<PageConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(dir)?;
    let config = resolve_config(base, overlay)?;
    log::debug!("loaded config from {}", dir.display());
    Ok(config)
}

/// Returns a fully-commented stock `config.toml`. Used by `gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# haco-portfolio configuration
# ============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Content source
# ---------------------------------------------------------------------------
[content]
# CMS subdomain: records are fetched from https://<service_domain>.microcms.io
service_domain = ""
endpoint = "works"
# Maximum number of gallery items (1-100).
limit = 50
# Newest first.
orders = "-createDate"
# Environment variable holding the CMS API key.
api_key_env = "HACO_API_KEY"
# Read gallery records from a local JSON file instead of the CMS.
# local_path = "works.json"

# ---------------------------------------------------------------------------
# Staged reveal
# ---------------------------------------------------------------------------
[reveal]
# Items entering the viewport are revealed one at a time, this far apart.
interval_ms = 140

# ---------------------------------------------------------------------------
# Viewport observation
# ---------------------------------------------------------------------------
[observer]
# Inset applied to the viewport (CSS margin shorthand, px or %).
root_margin = "0px 0px -10% 0px"
# Fraction of an item that must be visible before it is queued.
threshold = 0.1
# Set to false to reveal every item at once.
supported = true

# ---------------------------------------------------------------------------
# Loading indicator
# ---------------------------------------------------------------------------
[indicator]
hold_ms = 800
fade_ms = 500
max_tween_ms = 700
tween_ms_per_point = 80
frame_ms = 16

# ---------------------------------------------------------------------------
# Page geometry
# ---------------------------------------------------------------------------
[layout]
viewport_width = 1280
viewport_height = 800
columns = 3
gap = 24
top_offset = 900
side_column_width = 240

# ---------------------------------------------------------------------------
# Site
# ---------------------------------------------------------------------------
[site]
title = "haco"
tagline = "Architecture photographer"
photographer = "Asuka Nagai"
instagram_url = "https://www.instagram.com/n.asuka85/"
# Markdown file rendered into the About section.
# about_path = "about.md"

[[site.anchors]]
title = "Top"
id = "top"

[[site.anchors]]
title = "About"
id = "about"

[[site.anchors]]
title = "Works"
id = "works"

# ---------------------------------------------------------------------------
# Colors
# ---------------------------------------------------------------------------
[colors]
background = "#ffffff"
text = "#111111"
text_muted = "#888888"
accent = "#111111"
"##
}

/// Generate CSS custom properties from color config.
pub fn generate_color_css(colors: &ColorConfig) -> String {
    format!(
        r#":root {{
    --color-bg: {bg};
    --color-text: {text};
    --color-text-muted: {muted};
    --color-accent: {accent};
}}"#,
        bg = colors.background,
        text = colors.text,
        muted = colors.text_muted,
        accent = colors.accent,
    )
}

//! HTML rendering of the portfolio page.
//!
//! Renders a single `index.html` snapshot of the page: the loading overlay,
//! the side column with anchor navigation, the About section and the Works
//! gallery. Which items carry the visible class and what the overlay shows
//! come from a [`PageModel`], normally taken from a [`Simulation`] at some
//! moment in time.
//!
//! ## CSS and JavaScript
//!
//! Static assets are embedded at compile time:
//! - `static/style.css`: base styles (colors injected from config)
//! - `static/anchors.js`: smooth scrolling for sidebar anchors
//!
//! ## HTML Generation
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating.
//! All interpolated content is escaped.

use crate::config::{self, PageConfig, SiteConfig};
use crate::indicator::{IndicatorPhase, IndicatorView};
use crate::simulate::Simulation;
use crate::types::GalleryItem;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use pulldown_cmark::{Parser, html as md_html};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

const CSS_STATIC: &str = include_str!("../static/style.css");
const JS: &str = include_str!("../static/anchors.js");

/// Scroll duration for sidebar anchors.
pub const ANCHOR_SCROLL_MS: u32 = 600;

/// Everything needed to render one page snapshot.
#[derive(Debug, Clone)]
pub struct PageModel<'a> {
    pub config: &'a PageConfig,
    /// About section body, already converted to HTML.
    pub about_html: Option<String>,
    pub items: &'a [GalleryItem],
    /// Per-item visibility, indexed like `items`.
    pub visible: Vec<bool>,
    pub indicator: IndicatorView,
    pub side_column_displayed: bool,
}

impl<'a> PageModel<'a> {
    /// Snapshot of a running simulation.
    pub fn from_simulation(
        sim: &'a Simulation,
        config: &'a PageConfig,
        about_html: Option<String>,
    ) -> Self {
        let items = sim.gallery().items();
        Self {
            config,
            about_html,
            items,
            visible: (0..items.len()).map(|i| sim.gallery().is_visible(i)).collect(),
            indicator: sim.page().indicator_view(),
            side_column_displayed: sim.page().is_side_column_displayed(),
        }
    }

    /// The page as first served: nothing revealed, indicator at 0%.
    pub fn initial(
        config: &'a PageConfig,
        items: &'a [GalleryItem],
        about_html: Option<String>,
    ) -> Self {
        Self {
            config,
            about_html,
            items,
            visible: vec![false; items.len()],
            indicator: IndicatorView {
                percent: 0,
                phase: IndicatorPhase::Active,
            },
            side_column_displayed: false,
        }
    }
}

/// Convert markdown to HTML.
pub fn render_markdown(markdown: &str) -> String {
    let parser = Parser::new(markdown);
    let mut out = String::new();
    md_html::push_html(&mut out, parser);
    out
}

/// Read and convert the About markdown named in the site config, if any.
pub fn load_about(site: &SiteConfig, config_dir: &Path) -> Result<Option<String>, RenderError> {
    match &site.about_path {
        Some(path) => {
            let markdown = fs::read_to_string(config_dir.join(path))?;
            Ok(Some(render_markdown(&markdown)))
        }
        None => Ok(None),
    }
}

/// Write `index.html` for `model` into `output_dir`.
pub fn write_page(model: &PageModel<'_>, output_dir: &Path) -> Result<PathBuf, RenderError> {
    fs::create_dir_all(output_dir)?;
    let path = output_dir.join("index.html");
    fs::write(&path, render_page(model).into_string())?;
    log::info!("wrote {}", path.display());
    Ok(path)
}

pub fn render_page(model: &PageModel<'_>) -> Markup {
    let site = &model.config.site;
    let css = format!("{}\n\n{}", config::generate_color_css(&model.config.colors), CSS_STATIC);
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (site.title) }
                style { (PreEscaped(css)) }
            }
            body id="top" {
                (render_loading(&model.indicator, &site.title))
                div.Templates {
                    (render_side_column(site, model.side_column_displayed))
                    main.Templates__mainColumn {
                        (render_about(model.about_html.as_deref()))
                        (render_works(model.items, &model.visible))
                    }
                }
                script { (PreEscaped(JS)) }
            }
        }
    }
}

/// Loading overlay. Renders nothing once the indicator is removed.
pub fn render_loading(view: &IndicatorView, logo: &str) -> Markup {
    if !view.is_rendered() {
        return html! {};
    }
    let class = if view.is_fading() {
        "Loading Loading--end"
    } else {
        "Loading"
    };
    let scale = f64::from(view.percent) / 100.0;
    html! {
        div class=(class) role="status" aria-live="polite"
            aria-label={ "Loading " (view.percent) "%" } {
            div.Loading__logo { (logo) }
            div.Loading__textWrapper {
                p.Loading__text { "Now Loading" }
                div.Loading__underline style={ "transform: scaleX(" (scale) ")" } {}
            }
            p.Loading__percent { (view.percent) "%" }
        }
    }
}

/// Side column: logo, anchors (except `top`, which the logo covers) and
/// the Instagram link.
pub fn render_side_column(site: &SiteConfig, displayed: bool) -> Markup {
    let class = if displayed {
        "SideColumn SideColumn--displayed"
    } else {
        "SideColumn"
    };
    html! {
        div id="SideColumn" class=(class) {
            a.SideColumn__logoLink href="#top" data-scroll-duration=(ANCHOR_SCROLL_MS) {
                h1 { (site.title) }
                p.SideColumn__logoLinkText {
                    (site.tagline)
                    br;
                    (site.photographer)
                }
            }
            div.SideColumn__anchorsWrapper {
                ul.SideColumn__anchors {
                    @for anchor in site.anchors.iter().filter(|a| a.id != "top") {
                        li {
                            a href={ "#" (anchor.id) } data-scroll-duration=(ANCHOR_SCROLL_MS) {
                                (anchor.title)
                            }
                        }
                    }
                }
                div.SideColumn__separator {}
                a.SideColumn__link href=(site.instagram_url) target="_blank" rel="noopener" { "IG" }
            }
        }
    }
}

pub fn render_about(about_html: Option<&str>) -> Markup {
    html! {
        section id="about" class="About" {
            @if let Some(body) = about_html {
                div.About__text { (PreEscaped(body)) }
            }
        }
    }
}

pub fn render_works(items: &[GalleryItem], visible: &[bool]) -> Markup {
    html! {
        section id="works" class="Works" {
            h2.Works__title {
                span.Works__titleBody { "Works" }
            }
            ul.Works__items {
                @for (index, item) in items.iter().enumerate() {
                    @if index % 3 == 0 {
                        li.Works__rowAnchor id={ "works-row-" (index / 3) } aria-hidden="true" {}
                    }
                    (render_work_item(index, item, visible.get(index).copied().unwrap_or(false)))
                }
            }
        }
    }
}

fn render_work_item(index: usize, item: &GalleryItem, is_visible: bool) -> Markup {
    let class = if is_visible {
        "Works__item isVisible"
    } else {
        "Works__item"
    };
    html! {
        li class=(class) data-work-index=(index) {
            button.Works__itemImageWrapper type="button" {
                @for image in item.shown_images() {
                    img.Works__itemImage
                        src=(image.url)
                        alt={ (item.title) " thumbnail" }
                        style={ "aspect-ratio: " (image.width) " / " (image.height) };
                }
            }
            div.Works__itemInfo {
                p.Works__itemInfoTexts {
                    @for category in &item.categories {
                        span.Works__itemInfoCategory { (category) }
                    }
                }
                h3.Works__itemInfoTitle { (item.title) }
                span.Works__itemInfoId { (item.subtitle) }
            }
        }
    }
}

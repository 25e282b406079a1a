use clap::{Parser, Subcommand};
use haco_portfolio::render::{self, PageModel};
use haco_portfolio::simulate::{Scenario, Simulation};
use haco_portfolio::tasks::Millis;
use haco_portfolio::types::GalleryItem;
use haco_portfolio::{config, content, output};
use std::path::{Path, PathBuf};

/// Time allowed for a full scroll sweep to reveal everything and for the
/// indicator to finish its fade before a settled snapshot is taken.
const SETTLE_MS: Millis = 120_000;

fn version_string() -> &'static str {
    if env!("HACO_RELEASE") == "true" {
        return env!("CARGO_PKG_VERSION");
    }
    match env!("HACO_GIT_HASH") {
        "" => "dev@unknown",
        hash => Box::leak(format!("dev@{hash}").into_boxed_str()),
    }
}

#[derive(Parser)]
#[command(name = "haco-portfolio")]
#[command(about = "Portfolio page builder with a staged gallery reveal")]
#[command(long_about = "\
Portfolio page builder with a staged gallery reveal

Works are fetched from a headless CMS (or a local JSON file), laid out in a
grid and revealed one by one as they scroll into view. A loading overlay
tracks the images on the first screen and fades out once they are in.

Typical layout:

  site/
  ├── config.toml      # Content source, timings, layout, site text
  └── about.md         # About section (optional, see site.about_path)

Commands read config.toml from --config-dir. 'fetch' stores the gallery in
--temp-dir, 'render' turns it into --output/index.html.

Run 'haco-portfolio gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Directory holding config.toml and the about page
    #[arg(long, default_value = ".", global = true)]
    config_dir: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Directory for intermediate files (fetched gallery)
    #[arg(long, default_value = ".haco-temp", global = true)]
    temp_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch gallery records into the temp directory
    Fetch,
    /// Render index.html from the fetched gallery
    Render {
        /// Snapshot the page this many milliseconds after load instead of
        /// the settled state
        #[arg(long)]
        at: Option<Millis>,
    },
    /// Run the full pipeline: fetch → render
    Build,
    /// Print the reveal and loading timeline for the fetched gallery
    Simulate {
        /// Stop the simulation at this time
        #[arg(long, default_value_t = 10_000)]
        until: Millis,
        /// Behave as if the viewport observer were unavailable
        #[arg(long)]
        no_observer: bool,
        /// Also print every displayed-percentage frame
        #[arg(long)]
        frames: bool,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Fetch => {
            let config = config::load_config(&cli.config_dir)?;
            let items = fetch(&config, &cli.config_dir)?;
            write_gallery(&items, &cli.temp_dir)?;
            output::print_fetch_output(&items);
        }
        Command::Render { at } => {
            let config = config::load_config(&cli.config_dir)?;
            let items = read_gallery(&cli.temp_dir)?;
            let path = render_snapshot(&config, &cli.config_dir, items, at, &cli.output)?;
            println!("Wrote {}", path.display());
        }
        Command::Build => {
            let config = config::load_config(&cli.config_dir)?;

            println!("==> Stage 1: Fetching gallery");
            let items = fetch(&config, &cli.config_dir)?;
            write_gallery(&items, &cli.temp_dir)?;
            output::print_fetch_output(&items);

            println!("==> Stage 2: Rendering → {}", cli.output.display());
            let path = render_snapshot(&config, &cli.config_dir, items, None, &cli.output)?;
            println!("==> Build complete: {}", path.display());
        }
        Command::Simulate {
            until,
            no_observer,
            frames,
        } => {
            let mut config = config::load_config(&cli.config_dir)?;
            if no_observer {
                config.observer.supported = false;
            }
            let items = read_gallery(&cli.temp_dir)?;
            let total = items.len();
            let timeline = haco_portfolio::simulate::simulate(Scenario::new(items, config), until)?;
            output::print_timeline(&timeline, total, frames);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Fetch once. A source that cannot be built is an error; a source that
/// fails at fetch time yields an empty gallery.
fn fetch(
    config: &config::PageConfig,
    config_dir: &Path,
) -> Result<Vec<GalleryItem>, content::ContentError> {
    let source = content::source_from_config(&config.content, config_dir)?;
    Ok(content::fetch_or_empty(source.as_ref()))
}

fn gallery_path(temp_dir: &Path) -> PathBuf {
    temp_dir.join("gallery.json")
}

fn write_gallery(items: &[GalleryItem], temp_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(temp_dir)?;
    let json = serde_json::to_string_pretty(items)?;
    std::fs::write(gallery_path(temp_dir), json)?;
    Ok(())
}

fn read_gallery(temp_dir: &Path) -> Result<Vec<GalleryItem>, Box<dyn std::error::Error>> {
    let path = gallery_path(temp_dir);
    let json = std::fs::read_to_string(&path)
        .map_err(|e| format!("cannot read {} (run 'fetch' first): {e}", path.display()))?;
    Ok(serde_json::from_str(&json)?)
}

/// Simulate a visit and write the page as it looks at `at`, or once the
/// whole gallery has been scrolled through and the overlay is gone.
fn render_snapshot(
    config: &config::PageConfig,
    config_dir: &Path,
    items: Vec<GalleryItem>,
    at: Option<Millis>,
    output_dir: &Path,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let about = render::load_about(&config.site, config_dir)?;
    let step = f64::from(config.layout.viewport_height) / 2.0;
    let scenario = Scenario::new(items, config.clone()).with_scroll_sweep(1_000, step, 400);
    let mut sim = Simulation::new(scenario)?;
    sim.run_until(at.unwrap_or(SETTLE_MS));
    let model = PageModel::from_simulation(&sim, config, about);
    Ok(render::write_page(&model, output_dir)?)
}

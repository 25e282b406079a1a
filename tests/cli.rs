//! Command-line round trips against a local JSON content source.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const WORKS_JSON: &str = r#"{
  "contents": [
    {
      "title": "Library",
      "workCategory": "Public",
      "category": "Architecture",
      "createDate": "2023-04-01T00:00:00.000Z",
      "images": [{ "url": "https://images.example/library.jpg", "width": 300, "height": "400" }]
    },
    {
      "title": "House",
      "workCategory": "Residence",
      "category": "Interior",
      "createDate": "2024-01-15T00:00:00.000Z",
      "images": [{ "url": "https://images.example/house.jpg", "width": 1200, "height": 800 }]
    }
  ]
}"#;

fn site() -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("config.toml"), "[content]\nlocal_path = \"works.json\"\n").unwrap();
    fs::write(tmp.path().join("works.json"), WORKS_JSON).unwrap();
    tmp
}

fn run(dir: &Path, args: &[&str]) -> Output {
    let output = Command::new(env!("CARGO_BIN_EXE_haco-portfolio"))
        .current_dir(dir)
        .args(args)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "{:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    output
}

#[test]
fn gen_config_prints_parseable_toml() {
    let tmp = TempDir::new().unwrap();
    let output = run(tmp.path(), &["gen-config"]);
    let text = String::from_utf8(output.stdout).unwrap();
    let value: toml::Value = toml::from_str(&text).unwrap();
    assert!(value.get("reveal").is_some());
    assert!(value.get("indicator").is_some());
}

#[test]
fn fetch_writes_gallery_newest_first() {
    let tmp = site();
    let output = run(tmp.path(), &["fetch"]);
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("001 House (1 image)"));
    assert!(stdout.contains("Fetched 2 works"));

    let json = fs::read_to_string(tmp.path().join(".haco-temp/gallery.json")).unwrap();
    let items: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(items[0]["title"], "House");
    assert_eq!(items[1]["images"][0]["height"], 400);
}

#[test]
fn build_renders_settled_page() {
    let tmp = site();
    run(tmp.path(), &["build"]);
    let html = fs::read_to_string(tmp.path().join("dist/index.html")).unwrap();
    assert!(html.contains("Library"));
    assert!(html.contains("House"));
    assert_eq!(html.matches("Works__item isVisible").count(), 2);
    assert!(html.contains("SideColumn--displayed"));
    assert!(!html.contains("Now Loading"));
}

#[test]
fn render_at_time_zero_shows_the_overlay() {
    let tmp = site();
    run(tmp.path(), &["fetch"]);
    run(tmp.path(), &["render", "--at", "0"]);
    let html = fs::read_to_string(tmp.path().join("dist/index.html")).unwrap();
    assert!(html.contains("Now Loading"));
}

#[test]
fn simulate_without_observer_reveals_everything() {
    let tmp = site();
    run(tmp.path(), &["fetch"]);
    let output = run(tmp.path(), &["simulate", "--no-observer"]);
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("Revealed 2 of 2 works"));
}

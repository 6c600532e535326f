//! End-to-end tests of the `mycozine` binary against a temp store.
//!
//! Run with: `cargo test --test cli`

use image::{ImageFormat, Rgb, RgbImage};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Setup helpers
// ---------------------------------------------------------------------------

fn mycozine(store: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mycozine"))
        .arg("--store")
        .arg(store)
        .args(args)
        .output()
        .expect("failed to run mycozine")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn assert_ok(output: &Output) {
    assert!(
        output.status.success(),
        "command failed\nstdout: {}\nstderr: {}",
        stdout(output),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn page_color(page: u8) -> [u8; 3] {
    [page * 30, 200 - page * 20, 60]
}

fn write_image(path: &Path, width: u32, height: u32, rgb: [u8; 3], format: ImageFormat) {
    RgbImage::from_pixel(width, height, Rgb(rgb))
        .save_with_format(path, format)
        .unwrap();
}

fn outline_response() -> String {
    let types = [
        "cover",
        "intro",
        "content",
        "content",
        "content",
        "content",
        "resources",
        "call-to-action",
    ];
    let pages: Vec<serde_json::Value> = types
        .iter()
        .enumerate()
        .map(|(i, page_type)| {
            serde_json::json!({
                "pageNumber": i + 1,
                "type": page_type,
                "title": format!("Chapter {}", i + 1),
                "keyPoints": ["spores", "hyphae"],
                "imagePrompt": format!("woodcut of mushrooms, panel {}", i + 1),
            })
        })
        .collect();
    let body = serde_json::to_string_pretty(&serde_json::json!({ "pages": pages })).unwrap();
    format!("Here is your outline:\n```json\n{body}\n```\n")
}

/// Store with fast layout settings and one imported zine. Returns its id.
fn store_with_zine() -> (TempDir, PathBuf, String) {
    let tmp = TempDir::new().unwrap();
    let store = tmp.path().join("zines");
    std::fs::create_dir_all(&store).unwrap();
    std::fs::write(
        store.join("config.toml"),
        "[layout]\nfilter = \"nearest\"\ncompression = \"fast\"\n",
    )
    .unwrap();

    let response = tmp.path().join("outline.txt");
    std::fs::write(&response, outline_response()).unwrap();
    let output = mycozine(
        &store,
        &[
            "import-outline",
            response.to_str().unwrap(),
            "--topic",
            "forest fungi",
            "--style",
            "punk-zine",
            "--tone",
            "rebellious",
        ],
    );
    assert_ok(&output);
    let text = stdout(&output);
    let id = text
        .lines()
        .next()
        .and_then(|l| l.strip_prefix("Zine "))
        .expect("first line names the zine")
        .to_string();
    (tmp, store, id)
}

fn add_pages(tmp: &TempDir, store: &Path, id: &str, pages: std::ops::RangeInclusive<u8>) {
    for n in pages {
        let path = tmp.path().join(format!("page{n}.png"));
        write_image(&path, 33, 51, page_color(n), ImageFormat::Png);
        let output = mycozine(store, &["add-page", id, &n.to_string(), path.to_str().unwrap()]);
        assert_ok(&output);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn gen_config_prints_documented_defaults() {
    let tmp = TempDir::new().unwrap();
    let output = mycozine(&tmp.path().join("absent"), &["gen-config"]);
    assert_ok(&output);
    let text = stdout(&output);
    assert!(text.contains("[layout]"));
    assert!(text.contains("poll_max_attempts = 60"));
}

#[test]
fn import_outline_creates_zine() {
    let (_tmp, store, id) = store_with_zine();
    assert!(store.join(&id).join("zine.json").is_file());

    let output = mycozine(&store, &["list"]);
    assert_ok(&output);
    let text = stdout(&output);
    assert!(text.contains(&format!("{id} forest fungi (0/8 pages)")));
    assert!(text.contains("punk-zine, rebellious"));
}

#[test]
fn import_outline_rejects_short_outline() {
    let tmp = TempDir::new().unwrap();
    let response = tmp.path().join("outline.txt");
    std::fs::write(
        &response,
        r#"{"pages": [{"pageNumber": 1, "type": "cover", "title": "Only"}]}"#,
    )
    .unwrap();
    let store = tmp.path().join("zines");
    let output = mycozine(
        &store,
        &["import-outline", response.to_str().unwrap(), "--topic", "x"],
    );
    assert!(!output.status.success());
    assert!(!store.exists() || std::fs::read_dir(&store).unwrap().next().is_none());
}

#[test]
fn prompt_includes_outline_and_feedback() {
    let (_tmp, store, id) = store_with_zine();
    let output = mycozine(&store, &["prompt", &id, "3", "--feedback", "more ink"]);
    assert_ok(&output);
    let text = stdout(&output);
    assert!(text.starts_with("Chapter 3, spores, hyphae"));
    assert!(text.trim_end().chars().count() <= 500);
}

#[test]
fn page_numbers_outside_range_are_rejected() {
    let (_tmp, store, id) = store_with_zine();
    let output = mycozine(&store, &["prompt", &id, "9"]);
    assert!(!output.status.success());
}

#[test]
fn check_fails_until_every_page_is_ready() {
    let (tmp, store, id) = store_with_zine();
    add_pages(&tmp, &store, &id, 1..=5);

    let output = mycozine(&store, &["check", &id]);
    assert!(!output.status.success());
    let text = stdout(&output);
    assert!(text.contains("5 of 8 pages ready"));
    assert!(text.contains("33x51 cover-fit"));
    assert!(text.contains("missing"));
}

#[test]
fn layout_requires_all_pages() {
    let (tmp, store, id) = store_with_zine();
    add_pages(&tmp, &store, &id, 1..=7);

    let output = mycozine(&store, &["layout", &id]);
    assert!(!output.status.success());
    assert!(!store.join(&id).join("print.png").exists());
}

#[test]
fn placeholders_then_layout_produces_sheet() {
    let (tmp, store, id) = store_with_zine();
    add_pages(&tmp, &store, &id, 1..=6);

    let output = mycozine(&store, &["placeholders", &id]);
    assert_ok(&output);
    assert!(stdout(&output).contains("Placeholders stored for pages 7, 8"));

    let output = mycozine(&store, &["check", &id]);
    assert_ok(&output);
    assert!(stdout(&output).contains("8 of 8 pages ready"));

    let output = mycozine(&store, &["layout", &id]);
    assert_ok(&output);
    let text = stdout(&output);
    assert!(text.contains("Sheet 3300x2550 @ 300 DPI"));
    assert!(text.contains("Top row (180°): 1 8 7 6"));

    let sheet = image::open(store.join(&id).join("print.png"))
        .unwrap()
        .into_rgb8();
    assert_eq!(sheet.dimensions(), (3300, 2550));
    // Bottom row: 2 3 4 5
    for (column, page) in [(0u32, 2u8), (1, 3), (2, 4), (3, 5)] {
        let pixel = sheet.get_pixel(column * 825 + 400, 1275 + 600);
        assert_eq!(pixel.0, page_color(page), "page {page}");
    }
    // Top-left panel is page 1
    assert_eq!(sheet.get_pixel(400, 600).0, page_color(1));
}

#[test]
fn add_page_converts_jpeg_and_mask_fits_page() {
    let (tmp, store, id) = store_with_zine();
    let jpeg = tmp.path().join("page.jpg");
    write_image(&jpeg, 120, 180, [90, 90, 90], ImageFormat::Jpeg);
    assert_ok(&mycozine(&store, &["add-page", &id, "2", jpeg.to_str().unwrap()]));

    let stored = store.join(&id).join("p2.png");
    assert_eq!(
        image::ImageFormat::from_path(&stored).unwrap(),
        ImageFormat::Png
    );
    assert!(std::fs::read(&stored).unwrap().starts_with(b"\x89PNG"));

    let mask = tmp.path().join("mask.png");
    write_image(&mask, 10, 10, [255, 255, 255], ImageFormat::Png);
    let out = tmp.path().join("fitted.png");
    let output = mycozine(
        &store,
        &[
            "mask",
            &id,
            "2",
            mask.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
        ],
    );
    assert_ok(&output);
    let fitted = image::open(&out).unwrap();
    assert_eq!((fitted.width(), fitted.height()), (120, 180));
}

#[test]
fn unknown_zine_fails() {
    let tmp = TempDir::new().unwrap();
    let output = mycozine(tmp.path(), &["check", "nope"]);
    assert!(!output.status.success());
}

#[test]
fn bad_config_is_reported() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("config.toml"), "[layout]\ndpi = 600\n").unwrap();
    let output = mycozine(tmp.path(), &["list"]);
    assert!(!output.status.success());

    // gen-config still works
    assert_ok(&mycozine(tmp.path(), &["gen-config"]));
}

//! End-to-end runs over a scratch dist directory.

use std::{collections::BTreeMap, fs, io::Read, path::Path};

use flate2::read::GzDecoder;
use tempfile::TempDir;

use super::*;
use crate::config::test_config_for;

const ICONS: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<!-- sprite sheet -->
<svg xmlns="http://www.w3.org/2000/svg">
  <defs>
    <symbol id="x" viewBox="0 0 16 16">
      <path d="M0 0h16v16H0z"/>
    </symbol>
  </defs>
</svg>
"##;

fn app_js() -> Vec<u8> {
    b"console.log('distpress');\n"
        .iter()
        .cycle()
        .take(1000)
        .copied()
        .collect()
}

fn write(root: &Path, rel: &str, bytes: &[u8]) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, bytes).unwrap();
}

/// Every file under `root` by relative path.
fn snapshot(root: &Path) -> BTreeMap<String, Vec<u8>> {
    jwalk::WalkDir::new(root)
        .skip_hidden(false)
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let path = e.path();
            (relative_slash(&path, root), fs::read(&path).unwrap())
        })
        .collect()
}

fn gunzip(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    GzDecoder::new(bytes).read_to_end(&mut out).unwrap();
    out
}

fn unbrotli(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    brotli::Decompressor::new(bytes, 4096)
        .read_to_end(&mut out)
        .unwrap();
    out
}

fn element_count(svg: &[u8]) -> usize {
    svg.windows(2)
        .filter(|w| w[0] == b'<' && w[1].is_ascii_alphabetic())
        .count()
}

fn dist() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "app.js", &app_js());
    write(dir.path(), "icons.svg", ICONS.as_bytes());
    dir
}

#[test]
fn test_all_tasks_on_sample_dist() {
    let dir = dist();
    let root = dir.path();
    let config = test_config_for(root);

    run_all(&config, &Task::ALL).unwrap();

    let gz = fs::read(root.join("app.js.gz")).unwrap();
    let br = fs::read(root.join("app.js.br")).unwrap();
    assert_eq!(gunzip(&gz), app_js());
    assert_eq!(unbrotli(&br), app_js());
    assert_eq!(fs::read(root.join("app.js")).unwrap(), app_js());

    let icons = fs::read(root.join("icons.svg")).unwrap();
    let text = String::from_utf8(icons.clone()).unwrap();
    assert!(text.contains(r#"id="x""#));
    assert!(text.contains("<defs>"));
    assert!(icons.len() < ICONS.len());
    assert!(element_count(&icons) <= element_count(ICONS.as_bytes()));

    // svg is not in the default compression set
    assert!(!root.join("icons.svg.gz").exists());
}

#[test]
fn test_second_run_is_identical() {
    let dir = dist();
    let root = dir.path();
    write(root, "pages/index.html", b"<!doctype html><title>x</title>\n");
    write(
        root,
        "img/logo.png",
        &crate::image::test_fixture(::image::ImageFormat::Png, 24, 24),
    );
    let config = test_config_for(root);

    run_all(&config, &Task::ALL).unwrap();
    let first = snapshot(root);
    run_all(&config, &Task::ALL).unwrap();
    let second = snapshot(root);

    assert_eq!(first, second);
    assert!(first.contains_key("pages/index.html.gz"));
    assert!(first.contains_key("pages/index.html.br"));
}

#[test]
fn test_encoded_siblings_never_selected() {
    let dir = dist();
    let root = dir.path();
    write(root, "old.js.gz", b"stale");
    write(root, "old.js.br", b"stale");

    let mut config = test_config_for(root);
    config.compress.include = vec!["**/*".to_string()];

    let gzip = plan(Task::Gzip, &config).unwrap();
    let rels: Vec<_> = gzip
        .files
        .iter()
        .map(|f| relative_slash(f, root))
        .collect();
    assert_eq!(rels, vec!["app.js", "icons.svg"]);

    run_all(&config, &[Task::Gzip, Task::Brotli]).unwrap();
    run_all(&config, &[Task::Gzip, Task::Brotli]).unwrap();
    let files = snapshot(root);
    assert!(!files.keys().any(|k| k.ends_with(".gz.gz") || k.ends_with(".br.gz")));
    assert!(!files.keys().any(|k| k.ends_with(".gz.br") || k.ends_with(".br.br")));
}

#[test]
fn test_execute_report() {
    let dir = dist();
    let root = dir.path();
    write(root, "tiny.js", b"1");
    let mut config = test_config_for(root);
    config.compress.threshold = "100B".to_string();

    let plan = plan(Task::Gzip, &config).unwrap();
    let report = execute(&plan, &config, None).unwrap();

    assert_eq!(report.task(), Task::Gzip);
    assert_eq!(report.selected(), 2);
    assert_eq!(report.written(), 1);
    assert_eq!(report.skipped(), 1);
    assert!(report.bytes_after() < report.bytes_before());
    assert!(!root.join("tiny.js.gz").exists());
}

#[test]
fn test_dry_run_writes_nothing() {
    let dir = dist();
    let root = dir.path();
    let before = snapshot(root);

    let mut config = test_config_for(root);
    config.dry_run = true;
    run_all(&config, &Task::ALL).unwrap();

    assert_eq!(snapshot(root), before);
}

#[test]
fn test_failure_names_file_and_other_tasks_finish() {
    let dir = dist();
    let root = dir.path();
    write(root, "broken.svg", b"<svg><g></svg>");
    let config = test_config_for(root);

    let err = run_all(&config, &Task::ALL).unwrap_err();
    assert!(format!("{err:#}").contains("broken.svg"));

    // compression ran to completion
    assert!(root.join("app.js.gz").exists());
    assert!(root.join("app.js.br").exists());
    assert_eq!(fs::read(root.join("broken.svg")).unwrap(), b"<svg><g></svg>");
}

#[test]
fn test_single_task() {
    let dir = dist();
    let root = dir.path();
    let config = test_config_for(root);

    run(Task::Brotli, &config).unwrap();

    assert!(root.join("app.js.br").exists());
    assert!(!root.join("app.js.gz").exists());
    assert_eq!(fs::read(root.join("icons.svg")).unwrap(), ICONS.as_bytes());
}

#[test]
fn test_missing_dist_is_error() {
    let dir = TempDir::new().unwrap();
    let config = test_config_for(&dir.path().join("dist"));
    assert!(run_all(&config, &Task::ALL).is_err());
}

#[test]
fn test_overlapping_globs_siblings_match_final_files() {
    let dir = dist();
    let root = dir.path();
    let mut config = test_config_for(root);
    config.compress.include = vec!["*".to_string()];

    run_all(&config, &Task::ALL).unwrap();
    let first = snapshot(root);

    // the svg was rewritten before its siblings were derived
    let icons = &first["icons.svg"];
    assert!(icons.len() < ICONS.len());
    assert_eq!(&gunzip(&first["icons.svg.gz"]), icons);
    assert_eq!(&unbrotli(&first["icons.svg.br"]), icons);
    assert_eq!(gunzip(&first["app.js.gz"]), app_js());

    run_all(&config, &Task::ALL).unwrap();
    assert_eq!(snapshot(root), first);
}

fn jpeg_with_comment() -> Vec<u8> {
    let plain = crate::image::test_fixture(::image::ImageFormat::Jpeg, 16, 16);
    let mut jpeg = plain[..2].to_vec();
    jpeg.extend_from_slice(&[0xFF, 0xFE, 0x00, 0x07]);
    jpeg.extend_from_slice(b"hello");
    jpeg.extend_from_slice(&plain[2..]);
    jpeg
}

fn gif_with_comment() -> Vec<u8> {
    let mut gif = crate::image::test_fixture(::image::ImageFormat::Gif, 8, 8);
    assert_eq!(gif.pop(), Some(0x3B));
    gif.extend_from_slice(&[0x21, 0xFE, 5]);
    gif.extend_from_slice(b"hello");
    gif.extend_from_slice(&[0x00, 0x3B]);
    gif
}

#[test]
fn test_every_image_format_with_svg_cleanup() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let sprite = r##"<svg xmlns="http://www.w3.org/2000/svg">
  <defs>
    <linearGradient id="used"><stop offset="0"/></linearGradient>
    <linearGradient id="unused"><stop offset="1"/></linearGradient>
  </defs>
  <defs>
  </defs>
  <rect id="box" fill="url(#used)" width="4" height="4"/>
</svg>
"##;
    let inputs: [(&str, Vec<u8>); 4] = [
        ("img/photo.jpg", jpeg_with_comment()),
        ("img/anim.gif", gif_with_comment()),
        ("img/logo.png", crate::image::test_fixture(::image::ImageFormat::Png, 24, 24)),
        ("sprite.svg", sprite.as_bytes().to_vec()),
    ];
    for (rel, bytes) in &inputs {
        write(root, rel, bytes);
    }

    let mut config = test_config_for(root);
    config.compress.include = vec!["*".to_string()];
    config.imagemin.svg.cleanup_ids = true;
    config.imagemin.svg.remove_useless_defs = true;

    run_all(&config, &Task::ALL).unwrap();
    let first = snapshot(root);

    for (rel, original) in &inputs {
        let optimized = &first[*rel];
        assert!(optimized.len() <= original.len(), "{rel} grew");
        if !rel.ends_with(".svg") {
            let before = ::image::load_from_memory(original).unwrap().to_rgb8();
            let after = ::image::load_from_memory(optimized).unwrap().to_rgb8();
            assert_eq!(before, after, "{rel} changed pixels");
        }
    }
    assert!(first["img/photo.jpg"].len() < inputs[0].1.len());
    assert!(first["img/anim.gif"].len() < inputs[1].1.len());

    let svg = String::from_utf8(first["sprite.svg"].clone()).unwrap();
    assert!(svg.contains(r#"id="used""#));
    assert!(!svg.contains("unused"));
    assert!(!svg.contains(r#"id="box""#));
    assert_eq!(svg.matches("<defs>").count(), 1);
    assert_eq!(&gunzip(&first["sprite.svg.gz"]), first["sprite.svg"].as_slice());

    run_all(&config, &Task::ALL).unwrap();
    assert_eq!(snapshot(root), first);
}

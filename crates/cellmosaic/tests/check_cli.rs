use std::fs;
use std::process::Command;

use image::{Rgba, RgbaImage};
use tempfile::TempDir;

#[test]
fn check_reports_resolved_locations() {
    let output = Command::new(env!("CARGO_BIN_EXE_cellmosaic"))
        .arg("check")
        .output()
        .expect("failed to run cellmosaic check");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("position location 0"), "{stdout}");
    assert!(stdout.contains("texCoord location 1"), "{stdout}");
    assert!(stdout.contains("imageSampler location 1"), "{stdout}");
    assert!(stdout.contains("cell factor: 40"), "{stdout}");
}

#[test]
fn check_decodes_the_given_image() {
    let root = TempDir::new().unwrap();
    let path = root.path().join("tile.png");
    RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 255]))
        .save(&path)
        .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_cellmosaic"))
        .args(["check", "--image"])
        .arg(&path)
        .output()
        .expect("failed to run cellmosaic check --image");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("3x2"), "{stdout}");
}

#[test]
fn check_fails_on_undecodable_image() {
    let root = TempDir::new().unwrap();
    let path = root.path().join("notes.png");
    fs::write(&path, "plain text").unwrap();

    let status = Command::new(env!("CARGO_BIN_EXE_cellmosaic"))
        .args(["check", "--image"])
        .arg(&path)
        .status()
        .expect("failed to run cellmosaic check --image");

    assert!(!status.success());
}

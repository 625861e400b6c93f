//! End-to-end tests of the voxport binary: exit codes and summary line

use std::fs;
use std::process::{Command, Output};
use tempfile::TempDir;

fn voxport(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_voxport"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_successful_run() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let xyz = input.path().join("points.xyz");
    fs::write(&xyz, "0 0 0 255 0 0\n3 4 5 0 255 0\n").unwrap();
    let out_dir = output.path().join("vox");

    let result = voxport(&[
        "-i",
        xyz.to_str().unwrap(),
        "-o",
        out_dir.to_str().unwrap(),
        "-gs",
        "25",
        "-cl=16",
    ]);

    assert_eq!(result.status.code(), Some(0));
    assert!(stdout(&result).trim_end().ends_with("Done."));
    assert!(out_dir.join("points.vox").is_file());
}

#[test]
fn test_failed_file_exits_with_one() {
    let output = TempDir::new().unwrap();
    let result = voxport(&["-i", "missing.csv;", "-o", output.path().to_str().unwrap()]);

    assert_eq!(result.status.code(), Some(1));
    assert!(stdout(&result).trim_end().ends_with("Failed."));
}

#[test]
fn test_invalid_configuration_exits_with_two() {
    let output = TempDir::new().unwrap();
    let out = output.path().to_str().unwrap();

    for args in [
        vec!["-i", "a.csv", "-o", out, "-gs", "9.999"],
        vec!["-i", "a.csv", "-o", out, "-cl", "257"],
        vec!["-i", "a.csv", "-o", out, "-cs", "10"],
        vec!["-i", "a.csv", "-o", out, "-hm", "0"],
        vec!["-o", out],
        vec!["-i", "a.csv"],
    ] {
        let result = voxport(&args);
        assert_eq!(result.status.code(), Some(2), "{:?}", args);
    }
}

#[test]
fn test_missing_palette_exits_with_two() {
    let output = TempDir::new().unwrap();
    let result = voxport(&[
        "-i",
        "a.csv",
        "-o",
        output.path().to_str().unwrap(),
        "-p",
        "/nonexistent/palette.png",
    ]);
    assert_eq!(result.status.code(), Some(2));
}

#[test]
fn test_unparsable_number_is_a_usage_error() {
    let result = voxport(&["-i", "a.csv", "-o", "out", "--grid-size", "huge"]);
    assert_eq!(result.status.code(), Some(2));
}

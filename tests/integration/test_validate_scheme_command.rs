//! Integration tests for the validate-scheme command.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

use crate::helpers::{SCHEME_REF, TWO_AMPLICONS, write_scheme};

fn run_validate_scheme(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_amptrim"))
        .arg("validate-scheme")
        .args(args)
        .output()
        .expect("Failed to run validate-scheme command")
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("utf-8 path")
}

/// A reference where base `i` is `ACGT[i % 4]`.
fn write_reference(dir: &Path, name: &str, len: usize) -> std::path::PathBuf {
    let path = dir.join("reference.fa");
    let seq: String = "ACGT".chars().cycle().take(len).collect();
    fs::write(&path, format!(">{name}\n{seq}\n")).expect("Failed to write reference");
    path
}

#[test]
fn test_validate_scheme_succeeds() {
    let dir = TempDir::new().unwrap();
    let scheme = write_scheme(dir.path(), TWO_AMPLICONS);

    let output = run_validate_scheme(&["-s", path_str(&scheme)]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains(SCHEME_REF));
    assert!(stderr.contains("Amplicons: 2"));
}

#[test]
fn test_validate_scheme_writes_inserts() {
    let dir = TempDir::new().unwrap();
    let scheme = write_scheme(dir.path(), TWO_AMPLICONS);
    let inserts = dir.path().join("inserts.bed");

    let output =
        run_validate_scheme(&["-s", path_str(&scheme), "--output-inserts", path_str(&inserts)]);
    assert!(output.status.success());

    let text = fs::read_to_string(&inserts).unwrap();
    assert_eq!(text, "MN908947.3\t20\t380\t1\t1\t+\nMN908947.3\t370\t700\t2\t2\t+\n");
}

#[test]
fn test_validate_scheme_writes_primer_seqs() {
    let dir = TempDir::new().unwrap();
    let scheme = write_scheme(dir.path(), TWO_AMPLICONS);
    let reference = write_reference(dir.path(), SCHEME_REF, 800);
    let primers = dir.path().join("primers.fa");

    let output = run_validate_scheme(&[
        "-s",
        path_str(&scheme),
        "--output-primer-seqs",
        path_str(&primers),
        "-r",
        path_str(&reference),
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let text = fs::read_to_string(&primers).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        vec![
            ">nCoV-2019_1_LEFT",
            "ACGTACGTACGTACGTACGT",
            ">nCoV-2019_1_RIGHT",
            "ACGTACGTACGTACGTACGT",
            ">nCoV-2019_2_LEFT",
            "GTACGTACGTACGTACGTAC",
            ">nCoV-2019_2_RIGHT",
            "ACGTACGTACGTACGTACGT",
        ]
    );
}

#[test]
fn test_validate_scheme_primer_seqs_require_reference() {
    let dir = TempDir::new().unwrap();
    let scheme = write_scheme(dir.path(), TWO_AMPLICONS);
    let primers = dir.path().join("primers.fa");

    let output = run_validate_scheme(&[
        "-s",
        path_str(&scheme),
        "--output-primer-seqs",
        path_str(&primers),
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--reference is required"));
    assert!(!primers.exists());
}

#[test]
fn test_validate_scheme_reference_missing_contig() {
    let dir = TempDir::new().unwrap();
    let scheme = write_scheme(dir.path(), TWO_AMPLICONS);
    let reference = write_reference(dir.path(), "chrOther", 800);
    let primers = dir.path().join("primers.fa");

    let output = run_validate_scheme(&[
        "-s",
        path_str(&scheme),
        "--output-primer-seqs",
        path_str(&primers),
        "-r",
        path_str(&reference),
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("'MN908947.3' not found"));
}

#[test]
fn test_validate_scheme_detects_gap() {
    let dir = TempDir::new().unwrap();
    let scheme = write_scheme(
        dir.path(),
        "ref\t0\t20\tg_1_LEFT\t1\n\
         ref\t100\t120\tg_1_RIGHT\t1\n\
         ref\t200\t220\tg_2_LEFT\t2\n\
         ref\t300\t320\tg_2_RIGHT\t2\n",
    );

    let output = run_validate_scheme(&["-s", path_str(&scheme)]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("gap found in primer scheme"));
}

#[test]
fn test_validate_scheme_malformed_row_policy() {
    let dir = TempDir::new().unwrap();
    let contents = format!("{TWO_AMPLICONS}MN908947.3\t10\t5\tnCoV-2019_3_LEFT\t1\n");
    let scheme = write_scheme(dir.path(), &contents);

    let output = run_validate_scheme(&["-s", path_str(&scheme)]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Rows skipped: 1"));

    let output = run_validate_scheme(&["-s", path_str(&scheme), "--strict"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid primer start/end"));
}

#[test]
fn test_validate_scheme_missing_file() {
    let output = run_validate_scheme(&["-s", "/nonexistent/scheme.bed"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("File does not exist"));
}

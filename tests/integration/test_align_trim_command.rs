//! Integration tests for the align-trim command.

use amptrim_lib::metrics::TrimMetrics;
use fgoxide::io::DelimFile;
use noodles::bam;
use noodles::sam::alignment::record::data::field::Tag;
use noodles::sam::alignment::record::{Flags, MappingQuality};
use noodles::sam::alignment::record_buf::RecordBuf;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

use crate::helpers::{
    SCHEME_REF, TWO_AMPLICONS, assert_read_group, cigar_string, create_minimal_header,
    mapped_record, read_bam, record_names, start0, write_bam, write_scheme,
};

struct Fixture {
    dir: TempDir,
    scheme: PathBuf,
    input: PathBuf,
    output: PathBuf,
}

impl Fixture {
    fn new(records: &[RecordBuf]) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let scheme = write_scheme(dir.path(), TWO_AMPLICONS);
        let input = dir.path().join("input.bam");
        let output = dir.path().join("output.bam");
        write_bam(&input, &create_minimal_header(SCHEME_REF, 30_000), records);
        Self { dir, scheme, input, output }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn run(&self, extra: &[&str]) -> Output {
        let mut args = vec![
            "align-trim".to_string(),
            "-s".to_string(),
            path_str(&self.scheme),
            "-i".to_string(),
            path_str(&self.input),
            "-o".to_string(),
            path_str(&self.output),
        ];
        args.extend(extra.iter().map(ToString::to_string));
        Command::new(env!("CARGO_BIN_EXE_amptrim"))
            .args(&args)
            .output()
            .expect("Failed to run align-trim command")
    }
}

fn path_str(path: &Path) -> String {
    path.to_str().expect("utf-8 path").to_string()
}

fn with_flags(mut record: RecordBuf, flags: Flags) -> RecordBuf {
    *record.flags_mut() = flags;
    record
}

fn with_mapq(mut record: RecordBuf, mapq: u8) -> RecordBuf {
    *record.mapping_quality_mut() = MappingQuality::new(mapq);
    record
}

#[test]
fn test_align_trim_masks_primers() {
    let fixture = Fixture::new(&[
        mapped_record("amp1", 15, 385),
        with_flags(mapped_record("unmapped", 15, 385), Flags::UNMAPPED),
        with_mapq(mapped_record("lowq", 15, 385), 5),
        mapped_record("amp2", 360, 350),
        with_flags(mapped_record("supp", 360, 350), Flags::SUPPLEMENTARY),
    ]);

    let output = fixture.run(&[]);
    assert!(output.status.success(), "align-trim failed: {}", String::from_utf8_lossy(&output.stderr));

    let (header, records) = read_bam(&fixture.output);
    assert_eq!(record_names(&records), vec!["amp1", "amp2"]);

    assert_eq!(start0(&records[0]), 20);
    assert_eq!(cigar_string(&records[0]), "5S360M20S");
    assert_read_group(&records[0], "1");

    assert_eq!(start0(&records[1]), 370);
    assert_eq!(cigar_string(&records[1]), "10S330M10S");
    assert_read_group(&records[1], "2");

    assert!(header.programs().as_ref().contains_key(b"amptrim".as_slice()));
    let read_groups: Vec<String> = header.read_groups().keys().map(ToString::to_string).collect();
    assert_eq!(read_groups, vec!["1", "2"]);
}

#[test]
fn test_align_trim_start_keeps_primers() {
    let fixture = Fixture::new(&[mapped_record("inside", 5, 390), mapped_record("over", 360, 370)]);

    let output = fixture.run(&["--start"]);
    assert!(output.status.success());

    let (_, records) = read_bam(&fixture.output);
    assert_eq!(start0(&records[0]), 5);
    assert_eq!(cigar_string(&records[0]), "390M");
    assert_eq!(start0(&records[1]), 360);
    assert_eq!(cigar_string(&records[1]), "360M10S");
}

#[test]
fn test_align_trim_normalise() {
    let mut records: Vec<RecordBuf> =
        (0..5).map(|i| mapped_record(&format!("fwd{i}"), 15, 385)).collect();
    records.push(with_flags(mapped_record("rev0", 15, 385), Flags::REVERSE_COMPLEMENTED));
    let fixture = Fixture::new(&records);

    let output = fixture.run(&["--normalise", "2"]);
    assert!(output.status.success());

    let (_, records) = read_bam(&fixture.output);
    assert_eq!(record_names(&records), vec!["fwd0", "fwd1", "rev0"]);
}

#[test]
fn test_align_trim_normalise_zero_keeps_everything() {
    let records: Vec<RecordBuf> =
        (0..150).map(|i| mapped_record(&format!("r{i}"), 15, 385)).collect();
    let fixture = Fixture::new(&records);

    assert!(fixture.run(&["--normalise", "0"]).status.success());
    assert_eq!(read_bam(&fixture.output).1.len(), 150);

    assert!(fixture.run(&[]).status.success());
    assert_eq!(read_bam(&fixture.output).1.len(), 100);
}

#[test]
fn test_align_trim_no_read_groups() {
    let fixture = Fixture::new(&[mapped_record("amp1", 15, 385)]);

    let output = fixture.run(&["--no-read-groups"]);
    assert!(output.status.success());

    let (header, records) = read_bam(&fixture.output);
    assert!(header.read_groups().is_empty());
    assert!(records[0].data().get(&Tag::READ_GROUP).is_none());
}

#[test]
fn test_align_trim_incorrect_pairs() {
    // Nearest primers are nCoV-2019_2_LEFT and nCoV-2019_1_RIGHT
    let fixture = Fixture::new(&[mapped_record("mixed", 360, 45), mapped_record("amp1", 15, 385)]);

    assert!(fixture.run(&[]).status.success());
    let (_, records) = read_bam(&fixture.output);
    assert_eq!(record_names(&records), vec!["mixed", "amp1"]);
    assert_read_group(&records[0], "unmatched");

    assert!(fixture.run(&["--remove-incorrect-pairs"]).status.success());
    let (_, records) = read_bam(&fixture.output);
    assert_eq!(record_names(&records), vec!["amp1"]);
}

#[test]
fn test_align_trim_report_and_metrics() {
    let fixture = Fixture::new(&[
        mapped_record("amp1", 15, 385),
        with_flags(mapped_record("unmapped", 15, 385), Flags::UNMAPPED),
        mapped_record("amp2", 360, 350),
    ]);
    let report = fixture.path("report.tsv");
    let metrics = fixture.path("metrics.tsv");

    let output = fixture.run(&["--report", &path_str(&report), "--metrics", &path_str(&metrics)]);
    assert!(output.status.success());

    let text = fs::read_to_string(&report).expect("Failed to read report");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("QueryName\tReferenceStart\tReferenceEnd\tPrimerPair"));
    assert_eq!(
        lines[1],
        "amp1\t15\t400\tnCoV-2019_1_LEFT_nCoV-2019_1_RIGHT\tnCoV-2019_1_LEFT\t15\t\
         nCoV-2019_1_RIGHT\t0\tFalse\tFalse\t0\t400\tTrue"
    );
    assert!(lines[2].starts_with("amp2\t360\t710\tnCoV-2019_2_LEFT_nCoV-2019_2_RIGHT"));

    let rows: Vec<TrimMetrics> = DelimFile::default().read_tsv(&metrics).expect("metrics");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].records_processed, 3);
    assert_eq!(rows[0].unmapped, 1);
    assert_eq!(rows[0].records_trimmed, 2);
    assert_eq!(rows[0].records_written, 2);
}

#[test]
fn test_align_trim_report_is_truncated() {
    let fixture = Fixture::new(&[mapped_record("amp1", 15, 385)]);
    let report = fixture.path("report.tsv");
    fs::write(&report, "stale contents\n").expect("write");

    assert!(fixture.run(&["--report", &path_str(&report)]).status.success());
    let text = fs::read_to_string(&report).expect("Failed to read report");
    assert!(!text.contains("stale"));
    assert_eq!(text.lines().count(), 2);
}

#[test]
fn test_align_trim_error_policy() {
    // Lies entirely inside the first forward primer
    let fixture = Fixture::new(&[mapped_record("inside", 2, 10), mapped_record("amp1", 15, 385)]);

    let output = fixture.run(&[]);
    assert!(output.status.success());
    assert_eq!(record_names(&read_bam(&fixture.output).1), vec!["amp1"]);

    let output = fixture.run(&["--strict"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("inside"));

    let output = fixture.run(&["--max-trim-errors", "0"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("could not be softmasked"));
}

#[test]
fn test_align_trim_missing_scheme() {
    let fixture = Fixture::new(&[]);
    let output = Command::new(env!("CARGO_BIN_EXE_amptrim"))
        .args(["align-trim", "-s", &path_str(&fixture.path("missing.bed")), "-i"])
        .arg(&fixture.input)
        .output()
        .expect("Failed to run align-trim command");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Primer scheme"));
}

#[test]
fn test_align_trim_streams_stdin_to_stdout() {
    let fixture = Fixture::new(&[mapped_record("amp1", 15, 385)]);
    let input = fs::read(&fixture.input).expect("Failed to read input BAM");

    let mut child = Command::new(env!("CARGO_BIN_EXE_amptrim"))
        .args(["align-trim", "-s", &path_str(&fixture.scheme), "--threads", "2"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn align-trim");
    child.stdin.take().expect("stdin").write_all(&input).expect("Failed to write stdin");
    let output = child.wait_with_output().expect("Failed to wait for align-trim");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let mut reader = bam::io::Reader::new(&output.stdout[..]);
    let header = reader.read_header().expect("Failed to read header");
    let records: Vec<RecordBuf> =
        reader.record_bufs(&header).map(|r| r.expect("Failed to read record")).collect();
    assert_eq!(records.len(), 1);
    assert_eq!(cigar_string(&records[0]), "5S360M20S");
}

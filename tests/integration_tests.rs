//! Integration tests for amptrim.
//!
//! Run with: `cargo test --test integration_tests`
//!
//! These tests validate end-to-end workflows spanning multiple modules.

use amptrim_lib::bam_io::{create_raw_bam_reader, create_raw_bam_writer};
use amptrim_lib::errors::ErrorPolicy;
use amptrim_lib::header::{add_pg_record, add_read_groups};
use amptrim_lib::metrics::{TrimMetrics, write_metrics};
use amptrim_lib::report::TsvReporter;
use amptrim_lib::scheme::PrimerScheme;
use amptrim_lib::softmask::{PrimerBoundary, SoftmaskConfig, Softmasker};
use amptrim_raw_bam::RawRecord;
use bstr::BString;
use fgoxide::io::DelimFile;
use noodles::bam;
use noodles::core::Position;
use noodles::sam::Header;
use noodles::sam::alignment::io::Write as AlignmentWrite;
use noodles::sam::alignment::record::cigar::op::{Kind, Op};
use noodles::sam::alignment::record::data::field::Tag;
use noodles::sam::alignment::record::{Flags, MappingQuality};
use noodles::sam::alignment::record_buf::data::field::Value;
use noodles::sam::alignment::record_buf::{Cigar, QualityScores, RecordBuf, Sequence};
use noodles::sam::header::record::value::{Map, map::ReferenceSequence};
use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;
use tempfile::TempDir;

/// Three tiled amplicons over `ref:0-1060` with an alt on the second forward primer.
const SCHEME: &str = "ref\t0\t22\tt_1_LEFT\t1\n\
                      ref\t380\t402\tt_1_RIGHT\t1\n\
                      ref\t340\t362\tt_2_LEFT\t2\n\
                      ref\t338\t362\tt_2_LEFT_alt1\t2\n\
                      ref\t700\t722\tt_2_RIGHT\t2\n\
                      ref\t680\t702\tt_3_LEFT\t1\n\
                      ref\t1038\t1060\tt_3_RIGHT\t1\n";

fn header() -> Header {
    let reference = Map::<ReferenceSequence>::new(NonZeroUsize::new(2_000).unwrap());
    Header::builder().add_reference_sequence(BString::from("ref"), reference).build()
}

fn record(name: &str, start: usize, ops: Vec<Op>, flags: Flags) -> RecordBuf {
    let query_len: usize =
        ops.iter().filter(|op| op.kind().consumes_read()).map(|op| op.len()).sum();
    RecordBuf::builder()
        .set_name(BString::from(name))
        .set_flags(flags)
        .set_reference_sequence_id(0)
        .set_alignment_start(Position::try_from(start + 1).unwrap())
        .set_mapping_quality(MappingQuality::new(60).unwrap())
        .set_cigar(Cigar::from(ops))
        .set_sequence(Sequence::from(vec![b'C'; query_len]))
        .set_quality_scores(QualityScores::from(vec![35; query_len]))
        .build()
}

fn write_bam(path: &Path, header: &Header, records: &[RecordBuf]) {
    let mut writer = bam::io::Writer::new(fs::File::create(path).unwrap());
    writer.write_header(header).unwrap();
    for rec in records {
        writer.write_alignment_record(header, rec).unwrap();
    }
    writer.finish(header).unwrap();
}

fn read_bam(path: &Path) -> (Header, Vec<RecordBuf>) {
    let mut reader = bam::io::reader::Builder.build_from_path(path).unwrap();
    let header = reader.read_header().unwrap();
    let records = reader.record_bufs(&header).map(Result::unwrap).collect();
    (header, records)
}

fn cigar_string(rec: &RecordBuf) -> String {
    rec.cigar()
        .as_ref()
        .iter()
        .map(|op| {
            let c = match op.kind() {
                Kind::Match => 'M',
                Kind::Insertion => 'I',
                Kind::Deletion => 'D',
                Kind::Skip => 'N',
                Kind::SoftClip => 'S',
                Kind::HardClip => 'H',
                Kind::Pad => 'P',
                Kind::SequenceMatch => '=',
                Kind::SequenceMismatch => 'X',
            };
            format!("{}{c}", op.len())
        })
        .collect()
}

fn start0(rec: &RecordBuf) -> usize {
    rec.alignment_start().map(|p| usize::from(p) - 1).unwrap()
}

/// Runs a scheme and config over `records` through real BAM files.
fn softmask_bam(
    dir: &Path,
    scheme: &PrimerScheme,
    config: SoftmaskConfig,
    records: &[RecordBuf],
) -> (Header, Vec<RecordBuf>, TrimMetrics) {
    let input = dir.join("in.bam");
    let output = dir.join("out.bam");
    write_bam(&input, &header(), records);

    let (mut reader, header) = create_raw_bam_reader(&input, 1).unwrap();
    let (mut header, program_id) = add_pg_record(header, "0.0.0", "amptrim align-trim").unwrap();
    if config.add_read_groups {
        header = add_read_groups(header, scheme.pools(), &program_id).unwrap();
    }
    let mut writer = create_raw_bam_writer(&output, &header, 1).unwrap();
    let mut masker = Softmasker::new(scheme, config);
    masker.run(&mut reader, &mut writer).unwrap();
    writer.finish().unwrap();

    let (_, metrics) = masker.into_parts();
    let (header, records) = read_bam(&output);
    (header, records, metrics)
}

// Scheme Integration Tests

#[test]
fn test_scheme_load_with_alts() {
    let scheme = PrimerScheme::from_reader(SCHEME.as_bytes(), ErrorPolicy::Strict).unwrap();
    assert_eq!(scheme.reference_name(), "ref");
    assert_eq!(scheme.pools(), ["1".to_string(), "2".to_string()]);

    let summary = scheme.load_summary();
    assert_eq!(summary.rows_read, 7);
    assert_eq!(summary.alts_merged, 1);

    let amplicons: Vec<_> = scheme.expected_amplicons().collect();
    assert_eq!(amplicons.len(), 3);
    // The alt widens the forward primer start
    assert_eq!(amplicons[1].forward().start(), 338);
    assert_eq!(amplicons[1].max_span().start, 338);
    assert_eq!(amplicons[1].min_span().start, 362);
}

#[test]
fn test_scheme_overlap_queries() {
    let scheme = PrimerScheme::from_reader(SCHEME.as_bytes(), ErrorPolicy::Strict).unwrap();
    assert!(!scheme.check_amplicon_overlap(200).unwrap());
    assert!(scheme.check_amplicon_overlap(370).unwrap());
    assert!(scheme.check_primer_site_in_pool(10, "1").unwrap());
    assert!(!scheme.check_primer_site_in_pool(10, "2").unwrap());
    assert!(scheme.check_amplicon_overlap(5_000).is_err());
}

// Softmask Integration Tests

#[test]
fn test_softmask_bam_round_trip() {
    let dir = TempDir::new().unwrap();
    let scheme = PrimerScheme::from_reader(SCHEME.as_bytes(), ErrorPolicy::Strict).unwrap();
    let records = vec![
        // amplicon 1 with primer overhang on both ends
        record("a1", 10, vec![Op::new(Kind::Match, 400)], Flags::empty()),
        // amplicon 2, leading soft clip kept in front of the new clip
        record(
            "a2",
            350,
            vec![Op::new(Kind::SoftClip, 4), Op::new(Kind::Match, 360)],
            Flags::REVERSE_COMPLEMENTED,
        ),
        record("u", 10, vec![Op::new(Kind::Match, 400)], Flags::UNMAPPED),
        // amplicon 3 with a deletion well inside the insert
        record(
            "a3",
            690,
            vec![Op::new(Kind::Match, 100), Op::new(Kind::Deletion, 3), Op::new(Kind::Match, 260)],
            Flags::empty(),
        ),
    ];

    let (header, out, metrics) = softmask_bam(dir.path(), &scheme, SoftmaskConfig::default(), &records);

    let names: Vec<String> =
        out.iter().map(|r| r.name().map(ToString::to_string).unwrap_or_default()).collect();
    assert_eq!(names, vec!["a1", "a2", "a3"]);

    assert_eq!(start0(&out[0]), 22);
    assert_eq!(cigar_string(&out[0]), "12S358M30S");

    assert_eq!(start0(&out[1]), 362);
    assert_eq!(cigar_string(&out[1]), "16S338M10S");

    assert_eq!(start0(&out[2]), 702);
    assert_eq!(cigar_string(&out[2]), "12S88M3D245M15S");

    assert_eq!(out[0].data().get(&Tag::READ_GROUP), Some(&Value::from("1")));
    assert_eq!(out[1].data().get(&Tag::READ_GROUP), Some(&Value::from("2")));
    assert_eq!(out[2].data().get(&Tag::READ_GROUP), Some(&Value::from("1")));

    // Query length is unchanged by masking
    assert_eq!(out[0].sequence().len(), 400);
    assert_eq!(out[1].sequence().len(), 364);

    assert_eq!(header.read_groups().len(), 2);
    assert_eq!(metrics.records_processed, 4);
    assert_eq!(metrics.unmapped, 1);
    assert_eq!(metrics.records_trimmed, 3);
    assert_eq!(metrics.records_written, 3);
}

#[test]
fn test_softmask_keep_primers_without_read_groups() {
    let dir = TempDir::new().unwrap();
    let scheme = PrimerScheme::from_reader(SCHEME.as_bytes(), ErrorPolicy::Strict).unwrap();
    let config = SoftmaskConfig {
        boundary: PrimerBoundary::KeepPrimers,
        add_read_groups: false,
        ..Default::default()
    };
    let records = vec![record("a1", 10, vec![Op::new(Kind::Match, 400)], Flags::empty())];

    let (header, out, _) = softmask_bam(dir.path(), &scheme, config, &records);
    assert!(header.read_groups().is_empty());
    assert_eq!(start0(&out[0]), 10);
    assert_eq!(cigar_string(&out[0]), "392M8S");
    assert!(out[0].data().get(&Tag::READ_GROUP).is_none());
}

#[test]
fn test_softmask_report_and_metrics_files() {
    let dir = TempDir::new().unwrap();
    let scheme = PrimerScheme::from_reader(SCHEME.as_bytes(), ErrorPolicy::Strict).unwrap();
    let report_path = dir.path().join("report.tsv");

    let reporter = TsvReporter::from_path(&report_path).unwrap();
    let mut masker = Softmasker::with_reporter(&scheme, SoftmaskConfig::default(), reporter);
    let input = dir.path().join("in.bam");
    write_bam(
        &input,
        &header(),
        &[record("a1", 10, vec![Op::new(Kind::Match, 400)], Flags::SECONDARY)],
    );
    let (mut reader, _) = create_raw_bam_reader(&input, 1).unwrap();
    let mut written: Vec<RawRecord> = Vec::new();
    masker.run(&mut reader, &mut written).unwrap();
    assert_eq!(written.len(), 1);

    let text = fs::read_to_string(&report_path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines[1],
        "a1\t10\t410\tt_1_LEFT_t_1_RIGHT\tt_1_LEFT\t10\tt_1_RIGHT\t8\tTrue\tFalse\t0\t402\tTrue"
    );

    let (_, metrics) = masker.into_parts();
    let metrics_path = dir.path().join("metrics.tsv");
    write_metrics(&metrics_path, std::slice::from_ref(&metrics)).unwrap();
    let rows: Vec<TrimMetrics> = DelimFile::default().read_tsv(&metrics_path).unwrap();
    assert_eq!(rows, vec![metrics]);
}


//! Utilities for generating test BAM data programmatically.

#![allow(dead_code)]

use bstr::BString;
use noodles::bam;
use noodles::core::Position;
use noodles::sam::Header;
use noodles::sam::alignment::io::Write as AlignmentWrite;
use noodles::sam::alignment::record::cigar::op::{Kind, Op};
use noodles::sam::alignment::record::{Flags, MappingQuality};
use noodles::sam::alignment::record_buf::{Cigar, QualityScores, RecordBuf, Sequence};
use noodles::sam::header::record::value::{Map, map::ReferenceSequence};
use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;

/// A header with a single reference sequence.
pub fn create_minimal_header(ref_name: &str, ref_len: usize) -> Header {
    let reference_sequence = Map::<ReferenceSequence>::new(
        NonZeroUsize::new(ref_len).expect("reference length must be non-zero"),
    );
    Header::builder().add_reference_sequence(BString::from(ref_name), reference_sequence).build()
}

/// A forward, primary alignment to reference 0 with MAPQ 60.
///
/// `start` is 0-based; the CIGAR is a single `len`M.
pub fn mapped_record(name: &str, start: usize, len: usize) -> RecordBuf {
    record_with_cigar(name, start, vec![Op::new(Kind::Match, len)])
}

/// As [`mapped_record`] with an explicit CIGAR.
pub fn record_with_cigar(name: &str, start: usize, ops: Vec<Op>) -> RecordBuf {
    let query_len: usize =
        ops.iter().filter(|op| op.kind().consumes_read()).map(|op| op.len()).sum();
    RecordBuf::builder()
        .set_name(BString::from(name))
        .set_flags(Flags::empty())
        .set_reference_sequence_id(0)
        .set_alignment_start(Position::try_from(start + 1).expect("valid position"))
        .set_mapping_quality(MappingQuality::new(60).expect("valid MAPQ"))
        .set_cigar(Cigar::from(ops))
        .set_sequence(Sequence::from(vec![b'A'; query_len]))
        .set_quality_scores(QualityScores::from(vec![30; query_len]))
        .build()
}

/// Write `records` to a BAM file at `path`.
pub fn write_bam(path: &Path, header: &Header, records: &[RecordBuf]) {
    let mut writer =
        bam::io::Writer::new(fs::File::create(path).expect("Failed to create BAM file"));
    writer.write_header(header).expect("Failed to write header");
    for record in records {
        writer.write_alignment_record(header, record).expect("Failed to write record");
    }
    writer.finish(header).expect("Failed to finish BAM");
}

/// Read the header and all records of a BAM file.
pub fn read_bam(path: &Path) -> (Header, Vec<RecordBuf>) {
    let mut reader = bam::io::reader::Builder.build_from_path(path).expect("Failed to open BAM");
    let header = reader.read_header().expect("Failed to read header");
    let records =
        reader.record_bufs(&header).map(|r| r.expect("Failed to read record")).collect();
    (header, records)
}

//! Custom assertion helpers for integration tests.

#![allow(dead_code)]

use noodles::sam::alignment::record::cigar::op::Kind;
use noodles::sam::alignment::record::data::field::Tag;
use noodles::sam::alignment::record_buf::RecordBuf;
use noodles::sam::alignment::record_buf::data::field::Value;

/// The record's CIGAR in SAM text form.
pub fn cigar_string(record: &RecordBuf) -> String {
    record
        .cigar()
        .as_ref()
        .iter()
        .map(|op| {
            let code = match op.kind() {
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
            format!("{}{code}", op.len())
        })
        .collect()
}

/// The record's 0-based alignment start.
pub fn start0(record: &RecordBuf) -> usize {
    usize::from(record.alignment_start().expect("record should be mapped")) - 1
}

/// Asserts that a record has the given RG tag value.
///
/// # Panics
///
/// Panics if the RG tag is missing or has an unexpected value.
pub fn assert_read_group(record: &RecordBuf, expected: &str) {
    let value = record.data().get(&Tag::READ_GROUP).expect("Record should have RG tag");
    match value {
        Value::String(s) => {
            let s_bytes: &[u8] = s.as_ref();
            assert_eq!(
                s_bytes,
                expected.as_bytes(),
                "RG tag mismatch for record {:?}",
                record.name()
            );
        }
        _ => panic!("RG tag should be a string"),
    }
}

/// Names of the records, in order.
pub fn record_names(records: &[RecordBuf]) -> Vec<String> {
    records.iter().map(|r| r.name().map(ToString::to_string).unwrap_or_default()).collect()
}

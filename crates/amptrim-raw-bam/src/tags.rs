use crate::fields::{aux_data_offset_from_record, aux_data_slice, tag_value_size};

/// Find a string (Z-type) tag in auxiliary data, returning value bytes without null terminator.
#[must_use]
pub fn find_string_tag<'a>(aux_data: &'a [u8], tag: &[u8; 2]) -> Option<&'a [u8]> {
    let (start, end) = find_tag_bounds(aux_data, tag)?;
    if aux_data[start + 2] != b'Z' {
        return None;
    }
    // Entry is tag(2) + type(1) + value + NUL.
    Some(&aux_data[start + 3..end - 1])
}

/// Find a string tag in a complete BAM record.
#[must_use]
pub fn find_string_tag_in_record<'a>(bam: &'a [u8], tag: &[u8; 2]) -> Option<&'a [u8]> {
    find_string_tag(aux_data_slice(bam), tag)
}

/// Find the byte range `[start, end)` of an entire tag entry (tag+type+value) in aux data.
///
/// Offsets are relative to the start of `aux_data`. Scanning stops at the first
/// entry whose size cannot be determined.
#[must_use]
pub fn find_tag_bounds(aux_data: &[u8], tag: &[u8; 2]) -> Option<(usize, usize)> {
    let mut p = 0;
    while p + 3 <= aux_data.len() {
        let t = &aux_data[p..p + 2];
        let val_type = aux_data[p + 2];

        let size = tag_value_size(val_type, &aux_data[p + 3..])?;
        let entry_end = p + 3 + size;
        if entry_end > aux_data.len() {
            return None;
        }
        if t == tag {
            return Some((p, entry_end));
        }
        p = entry_end;
    }
    None
}

/// Append a string (Z-type) tag to a BAM record.
///
/// The tag is appended at the end of the record: `[tag_byte_1, tag_byte_2, 'Z', value..., NUL]`.
pub fn append_string_tag(record: &mut Vec<u8>, tag: &[u8; 2], value: &[u8]) {
    record.reserve(value.len() + 4);
    record.push(tag[0]);
    record.push(tag[1]);
    record.push(b'Z');
    record.extend_from_slice(value);
    record.push(0);
}

/// Set a string (Z-type) tag on a BAM record.
///
/// An existing entry for `tag` is replaced whatever its type; otherwise the tag
/// is appended.
pub fn update_string_tag(record: &mut Vec<u8>, tag: &[u8; 2], new_value: &[u8]) {
    let aux_start = aux_data_offset_from_record(record).unwrap_or(record.len());
    if aux_start < record.len() {
        if let Some((start, end)) = find_tag_bounds(&record[aux_start..], tag) {
            let abs_start = aux_start + start;
            let abs_end = aux_start + end;
            let same_shape = record[abs_start + 2] == b'Z' && end - start - 4 == new_value.len();
            if same_shape {
                let value_start = abs_start + 3;
                record[value_start..value_start + new_value.len()].copy_from_slice(new_value);
            } else {
                let mut replacement = Vec::with_capacity(new_value.len() + 4);
                replacement.extend_from_slice(&[tag[0], tag[1], b'Z']);
                replacement.extend_from_slice(new_value);
                replacement.push(0);
                record.splice(abs_start..abs_end, replacement);
            }
            return;
        }
    }
    append_string_tag(record, tag, new_value);
}

//! Builders for raw BAM byte records used in tests.

/// Construct a raw BAM record (without the `block_size` prefix).
///
/// Mapping quality is 60, the mate is unset and the sequence and qualities are
/// zero-filled.
///
/// # Panics
///
/// Panics if `name` length exceeds 254 bytes, `cigar_ops` length exceeds
/// `u16::MAX`, or `seq_len` exceeds `u32::MAX`.
#[must_use]
pub fn make_bam_bytes(
    tid: i32,
    pos: i32,
    flag: u16,
    name: &[u8],
    cigar_ops: &[u32],
    seq_len: usize,
    aux_data: &[u8],
) -> Vec<u8> {
    let l_read_name = u8::try_from(name.len() + 1).unwrap();
    let n_cigar_op = u16::try_from(cigar_ops.len()).unwrap();
    let seq_bytes = seq_len.div_ceil(2);
    let total =
        32 + l_read_name as usize + cigar_ops.len() * 4 + seq_bytes + seq_len + aux_data.len();
    let mut buf = vec![0u8; total];

    buf[0..4].copy_from_slice(&tid.to_le_bytes());
    buf[4..8].copy_from_slice(&pos.to_le_bytes());
    buf[8] = l_read_name;
    buf[9] = 60;
    buf[12..14].copy_from_slice(&n_cigar_op.to_le_bytes());
    buf[14..16].copy_from_slice(&flag.to_le_bytes());
    buf[16..20].copy_from_slice(&u32::try_from(seq_len).unwrap().to_le_bytes());
    buf[20..24].copy_from_slice(&(-1i32).to_le_bytes());
    buf[24..28].copy_from_slice(&(-1i32).to_le_bytes());

    let name_start = 32;
    buf[name_start..name_start + name.len()].copy_from_slice(name);

    let cigar_start = name_start + l_read_name as usize;
    for (i, &op) in cigar_ops.iter().enumerate() {
        let offset = cigar_start + i * 4;
        buf[offset..offset + 4].copy_from_slice(&op.to_le_bytes());
    }

    let aux_start = cigar_start + cigar_ops.len() * 4 + seq_bytes + seq_len;
    buf[aux_start..].copy_from_slice(aux_data);

    buf
}

/// Set the mapping quality of a raw record.
pub fn set_mapq(bam: &mut [u8], mapq: u8) {
    bam[9] = mapq;
}

/// Encode a single CIGAR op.  `op_type`: M=0, I=1, D=2, N=3, S=4, H=5, P=6, `=7`, X=8.
///
/// # Panics
///
/// Panics if `len` exceeds `u32::MAX`.
#[must_use]
pub fn encode_op(op_type: u32, len: usize) -> u32 {
    (u32::try_from(len).unwrap() << 4) | op_type
}

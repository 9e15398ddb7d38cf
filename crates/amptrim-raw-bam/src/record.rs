//! Raw BAM records and a reader that yields them without decoding.
//!
//! A [`RawRecord`] owns the bytes that follow the 4-byte `block_size` prefix.
//! Records are checked for a consistent layout when read so the fixed-offset
//! accessors in [`crate::fields`] never index out of bounds.

use crate::fields::{MIN_BAM_HEADER_LEN, aux_data_offset_from_record};
use std::io::{self, Read};

/// A raw BAM record stored as bytes.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RawRecord(Vec<u8>);

impl RawRecord {
    /// Creates a new empty raw record.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Returns the length of the record in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the record is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Mutable access to the backing buffer for operations that resize it.
    #[inline]
    pub fn as_mut_vec(&mut self) -> &mut Vec<u8> {
        &mut self.0
    }

    /// Returns the inner bytes, consuming the record.
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl AsRef<[u8]> for RawRecord {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::ops::Deref for RawRecord {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<u8>> for RawRecord {
    #[inline]
    fn from(buf: Vec<u8>) -> Self {
        Self(buf)
    }
}

/// Check that the variable-length sections declared in the fixed header fit in `bam`.
///
/// # Errors
///
/// Returns `InvalidData` if the record is shorter than its fixed header or
/// shorter than the read name, CIGAR, sequence and qualities it declares.
pub fn check_layout(bam: &[u8]) -> io::Result<()> {
    let aux_offset = aux_data_offset_from_record(bam).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("BAM record of {} bytes is shorter than the fixed header", bam.len()),
        )
    })?;
    if aux_offset > bam.len() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("BAM record truncated: expected at least {aux_offset} bytes, found {}", bam.len()),
        ));
    }
    Ok(())
}

/// Reads a single raw BAM record from the given reader.
///
/// Reads the 4-byte little-endian `block_size` followed by `block_size` bytes
/// of record data. Returns the number of record bytes read, or 0 at EOF.
///
/// # Errors
///
/// Returns an error if the reader fails, EOF is reached in the middle of a
/// record, or the record layout is inconsistent.
pub fn read_raw_record<R>(reader: &mut R, record: &mut RawRecord) -> io::Result<usize>
where
    R: Read,
{
    let block_size = match read_block_size(reader)? {
        0 => return Ok(0),
        n => n,
    };
    if block_size < MIN_BAM_HEADER_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("invalid BAM block size: {block_size}"),
        ));
    }

    record.0.resize(block_size, 0);
    reader.read_exact(&mut record.0)?;
    check_layout(&record.0)?;

    Ok(block_size)
}

/// Reads the 4-byte block size prefix, returning 0 at a clean EOF.
fn read_block_size<R>(reader: &mut R) -> io::Result<usize>
where
    R: Read,
{
    let mut buf = [0u8; 4];

    loop {
        match reader.read(&mut buf[..1]) {
            Ok(0) => return Ok(0),
            Ok(_) => break,
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    reader.read_exact(&mut buf[1..])?;

    let n = u32::from_le_bytes(buf);
    usize::try_from(n).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// A reader for raw BAM records.
///
/// Wraps a decompressed BAM stream positioned just after the header.
pub struct RawBamReader<R> {
    inner: R,
}

impl<R: Read> RawBamReader<R> {
    /// Creates a new raw BAM reader wrapping the given reader.
    #[inline]
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Consumes the reader and returns the inner reader.
    #[inline]
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Reads the next record into `record`, returning 0 at EOF.
    ///
    /// # Errors
    ///
    /// See [`read_raw_record`].
    #[inline]
    pub fn read_record(&mut self, record: &mut RawRecord) -> io::Result<usize> {
        read_raw_record(&mut self.inner, record)
    }
}

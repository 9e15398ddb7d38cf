//! BAM file I/O utilities.
//!
//! Records are read and written as raw bytes: the header is parsed with
//! noodles, after which the BGZF stream is handed to a
//! [`RawBamReader`] or [`RawBamWriter`] that moves whole records without
//! decoding them.
//!
//! # Threading Model
//!
//! BAM files use BGZF compression, which can be parallelized for both reading and writing:
//!
//! - **Single-threaded**: Use `threads=1` (lower overhead, good for small files)
//! - **Multi-threaded**: Use `threads>1` (higher throughput for large files)
//!
//! A path of `-` reads from stdin or writes to stdout.

use amptrim_raw_bam::{RawBamReader, RawRecord};
use anyhow::{Context, Result};
use noodles::bgzf::io::{MultithreadedReader, MultithreadedWriter, Reader as BgzfReader, Writer as BgzfWriter};
use noodles::sam::Header;
use std::fs::File;
use std::io::{self, BufRead, Read, Write};
use std::num::NonZero;
use std::path::Path;

/// Boxed byte source: a file or stdin.
pub type InputStream = Box<dyn Read + Send>;
/// Boxed byte sink: a file or stdout.
pub type OutputStream = Box<dyn Write + Send>;

/// Enum wrapping single-threaded and multi-threaded BGZF readers.
pub enum BgzfReaderEnum {
    /// Single-threaded BGZF reader (lower overhead for small files)
    SingleThreaded(BgzfReader<InputStream>),
    /// Multi-threaded BGZF reader (noodles built-in threading)
    MultiThreaded(MultithreadedReader<InputStream>),
}

impl Read for BgzfReaderEnum {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            BgzfReaderEnum::SingleThreaded(r) => r.read(buf),
            BgzfReaderEnum::MultiThreaded(r) => r.read(buf),
        }
    }
}

impl BufRead for BgzfReaderEnum {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        match self {
            BgzfReaderEnum::SingleThreaded(r) => r.fill_buf(),
            BgzfReaderEnum::MultiThreaded(r) => r.fill_buf(),
        }
    }

    fn consume(&mut self, amt: usize) {
        match self {
            BgzfReaderEnum::SingleThreaded(r) => r.consume(amt),
            BgzfReaderEnum::MultiThreaded(r) => r.consume(amt),
        }
    }
}

/// Enum wrapping single-threaded and multi-threaded BGZF writers
pub enum BgzfWriterEnum {
    /// Single-threaded BGZF writer
    SingleThreaded(BgzfWriter<OutputStream>),
    /// Multi-threaded BGZF writer
    MultiThreaded(MultithreadedWriter<OutputStream>),
}

impl Write for BgzfWriterEnum {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            BgzfWriterEnum::SingleThreaded(w) => w.write(buf),
            BgzfWriterEnum::MultiThreaded(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            BgzfWriterEnum::SingleThreaded(w) => w.flush(),
            BgzfWriterEnum::MultiThreaded(w) => w.flush(),
        }
    }
}

impl BgzfWriterEnum {
    /// Flush all blocks, write the BGZF EOF marker and flush the underlying stream.
    ///
    /// # Errors
    /// Returns an error if flushing or finalizing the writer fails.
    pub fn finish(self) -> io::Result<()> {
        let mut inner = match self {
            BgzfWriterEnum::SingleThreaded(w) => w.finish()?,
            BgzfWriterEnum::MultiThreaded(mut w) => w.finish()?,
        };
        inner.flush()
    }
}

/// Destination for raw BAM records (without the `block_size` prefix).
pub trait RawRecordWriter {
    /// Write one record.
    ///
    /// # Errors
    /// Returns an error if the underlying write fails.
    fn write_raw_record(&mut self, record_bytes: &[u8]) -> io::Result<()>;
}

/// Collects records in memory.
impl RawRecordWriter for Vec<RawRecord> {
    fn write_raw_record(&mut self, record_bytes: &[u8]) -> io::Result<()> {
        self.push(RawRecord::from(record_bytes.to_vec()));
        Ok(())
    }
}

/// Raw BAM writer for writing raw record bytes directly.
///
/// Writes records as:
/// - 4-byte `block_size` (little-endian)
/// - raw BAM record bytes
pub struct RawBamWriter {
    inner: BgzfWriterEnum,
}

impl RawBamWriter {
    /// Create a new raw BAM writer from a BGZF writer.
    #[must_use]
    pub fn new(inner: BgzfWriterEnum) -> Self {
        Self { inner }
    }

    /// Write the BAM magic, header text and reference dictionary.
    ///
    /// # Errors
    /// Returns an error if writing to the underlying writer fails, or the
    /// header is too large to encode.
    pub fn write_header(&mut self, header: &Header) -> io::Result<()> {
        self.inner.write_all(b"BAM\x01")?;

        // Header text (SAM header serialized using noodles)
        let mut sam_writer = noodles::sam::io::Writer::new(Vec::new());
        sam_writer.write_header(header)?;
        let header_bytes = sam_writer.into_inner();
        self.inner.write_all(&encode_i32(header_bytes.len())?.to_le_bytes())?;
        self.inner.write_all(&header_bytes)?;

        let references = header.reference_sequences();
        self.inner.write_all(&encode_i32(references.len())?.to_le_bytes())?;
        for (name, map) in references {
            // l_name includes the NUL terminator
            self.inner.write_all(&encode_i32(name.len() + 1)?.to_le_bytes())?;
            self.inner.write_all(name)?;
            self.inner.write_all(&[0u8])?;
            self.inner.write_all(&encode_i32(map.length().get())?.to_le_bytes())?;
        }

        Ok(())
    }

    /// Finish writing and close the writer.
    ///
    /// # Errors
    /// Returns an error if finalizing the writer fails.
    pub fn finish(self) -> io::Result<()> {
        self.inner.finish()
    }
}

impl RawRecordWriter for RawBamWriter {
    #[inline]
    fn write_raw_record(&mut self, record_bytes: &[u8]) -> io::Result<()> {
        let block_size = u32::try_from(record_bytes.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "BAM record too large"))?;
        self.inner.write_all(&block_size.to_le_bytes())?;
        self.inner.write_all(record_bytes)
    }
}

fn encode_i32(value: usize) -> io::Result<i32> {
    i32::try_from(value)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "BAM header field too large"))
}

/// Check if a path refers to stdin/stdout.
///
/// # Example
/// ```
/// use amptrim_lib::bam_io::is_stdio_path;
///
/// assert!(is_stdio_path("-"));
/// assert!(!is_stdio_path("input.bam"));
/// ```
pub fn is_stdio_path<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref().as_os_str() == "-"
}

/// Open a file, or stdin for `-`.
///
/// # Errors
/// Returns an error if the file cannot be opened.
pub fn open_input<P: AsRef<Path>>(path: P) -> Result<InputStream> {
    let path_ref = path.as_ref();
    if is_stdio_path(path_ref) {
        return Ok(Box::new(io::stdin()));
    }
    let file = File::open(path_ref)
        .with_context(|| format!("Failed to open input BAM: {}", path_ref.display()))?;
    Ok(Box::new(file))
}

/// Create a file, or use stdout for `-`.
///
/// # Errors
/// Returns an error if the file cannot be created.
pub fn open_output<P: AsRef<Path>>(path: P) -> Result<OutputStream> {
    let path_ref = path.as_ref();
    if is_stdio_path(path_ref) {
        return Ok(Box::new(io::stdout()));
    }
    let file = File::create(path_ref)
        .with_context(|| format!("Failed to create output BAM: {}", path_ref.display()))?;
    Ok(Box::new(file))
}

/// Type alias for a raw BAM reader that supports both single and multi-threaded BGZF.
pub type RawBamReaderAuto = RawBamReader<BgzfReaderEnum>;

/// Create a raw BAM reader positioned at the first record, and the parsed header.
///
/// # Arguments
/// * `path` - Path to the input BAM file, or `-` for stdin
/// * `threads` - Number of threads for BGZF decompression (1 = single-threaded)
///
/// # Errors
/// Returns an error if the input cannot be opened or the header cannot be read
pub fn create_raw_bam_reader<P: AsRef<Path>>(
    path: P,
    threads: usize,
) -> Result<(RawBamReaderAuto, Header)> {
    let path_ref = path.as_ref();
    let input = open_input(path_ref)?;

    let bgzf_reader = match NonZero::new(threads).filter(|n| n.get() > 1) {
        Some(worker_count) => {
            BgzfReaderEnum::MultiThreaded(MultithreadedReader::with_worker_count(worker_count, input))
        }
        None => BgzfReaderEnum::SingleThreaded(BgzfReader::new(input)),
    };

    // Use noodles to read the header, then extract the BGZF reader
    let mut noodles_reader = noodles::bam::io::Reader::from(bgzf_reader);
    let header = noodles_reader
        .read_header()
        .with_context(|| format!("Failed to read header from: {}", path_ref.display()))?;

    Ok((RawBamReader::new(noodles_reader.into_inner()), header))
}

/// Create a raw BAM writer and write the header.
///
/// # Arguments
/// * `path` - Path for the output BAM file, or `-` for stdout
/// * `header` - SAM header to write
/// * `threads` - Number of threads for BGZF compression (1 = single-threaded)
///
/// # Errors
/// Returns an error if the output cannot be created or the header cannot be written.
pub fn create_raw_bam_writer<P: AsRef<Path>>(
    path: P,
    header: &Header,
    threads: usize,
) -> Result<RawBamWriter> {
    let path_ref = path.as_ref();
    let output = open_output(path_ref)?;

    let bgzf_writer = match NonZero::new(threads).filter(|n| n.get() > 1) {
        Some(worker_count) => {
            BgzfWriterEnum::MultiThreaded(MultithreadedWriter::with_worker_count(worker_count, output))
        }
        None => BgzfWriterEnum::SingleThreaded(BgzfWriter::new(output)),
    };

    let mut writer = RawBamWriter::new(bgzf_writer);
    writer
        .write_header(header)
        .with_context(|| format!("Failed to write header to: {}", path_ref.display()))?;
    Ok(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use amptrim_raw_bam::testutil::{encode_op, make_bam_bytes};
    use noodles::sam::header::record::value::{Map, map::ReferenceSequence};
    use rstest::rstest;
    use std::num::NonZeroUsize;
    use tempfile::NamedTempFile;

    fn create_test_header() -> Header {
        let ref_seq = Map::<ReferenceSequence>::new(
            NonZeroUsize::new(1000).expect("1000 is non-zero constant"),
        );
        Header::builder().add_reference_sequence(b"chr1", ref_seq).build()
    }

    #[rstest]
    #[case::single_threaded(1)]
    #[case::multi_threaded(3)]
    fn test_raw_round_trip(#[case] threads: usize) -> Result<()> {
        let temp_file = NamedTempFile::new()?;
        let header = create_test_header();
        let records: Vec<Vec<u8>> = (0..5)
            .map(|i| make_bam_bytes(0, 10 * i, 0, format!("q{i}").as_bytes(), &[encode_op(0, 30)], 30, &[]))
            .collect();

        let mut writer = create_raw_bam_writer(temp_file.path(), &header, threads)?;
        for record in &records {
            writer.write_raw_record(record)?;
        }
        writer.finish()?;

        let (mut reader, read_header) = create_raw_bam_reader(temp_file.path(), threads)?;
        assert_eq!(read_header.reference_sequences().len(), 1);
        let mut record = RawRecord::new();
        let mut seen = Vec::new();
        while reader.read_record(&mut record)? > 0 {
            seen.push(record.to_vec());
        }
        assert_eq!(seen, records);
        Ok(())
    }

    #[test]
    fn test_output_readable_by_noodles() -> Result<()> {
        let temp_file = NamedTempFile::new()?;
        let header = create_test_header();
        let mut writer = create_raw_bam_writer(temp_file.path(), &header, 1)?;
        writer.write_raw_record(&make_bam_bytes(0, 100, 0, b"read1", &[encode_op(0, 50)], 50, &[]))?;
        writer.finish()?;

        let mut reader = noodles::bam::io::Reader::new(File::open(temp_file.path())?);
        let read_header = reader.read_header()?;
        assert_eq!(read_header.reference_sequences().len(), 1);
        let records: Vec<_> = reader.records().collect::<io::Result<_>>()?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name().map(|n| n.to_vec()), Some(b"read1".to_vec()));
        Ok(())
    }

    #[test]
    fn test_create_raw_bam_reader_nonexistent_file() {
        let err = create_raw_bam_reader("/nonexistent/file.bam", 1).err().unwrap();
        assert!(err.to_string().contains("Failed to open input BAM"));
    }

    #[test]
    fn test_create_raw_bam_writer_invalid_path() {
        let header = create_test_header();
        let err = create_raw_bam_writer("/invalid/path/output.bam", &header, 1).err().unwrap();
        assert!(err.to_string().contains("Failed to create output BAM"));
    }

    #[test]
    fn test_is_stdio_path() {
        assert!(is_stdio_path("-"));
        assert!(!is_stdio_path("/dev/null"));
    }
}

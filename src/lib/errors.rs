//! Error types for primer scheme loading, scheme queries and alignment trimming.

use amptrim_raw_bam::RewriteError;
use thiserror::Error;

/// Result type alias for amptrim operations
pub type Result<T> = std::result::Result<T, AmptrimError>;

/// How a recoverable error affects the run.
///
/// Applies to malformed scheme rows and to per-record trim failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// The first error aborts the run.
    Strict,
    /// Errors are logged and counted; the offending row or record is skipped.
    #[default]
    Lenient,
}

/// Error type for amptrim operations
#[derive(Error, Debug)]
pub enum AmptrimError {
    #[error(transparent)]
    Scheme(#[from] SchemeError),

    #[error(transparent)]
    Trim(#[from] TrimError),

    /// Invalid parameter value provided
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// The parameter name
        parameter: String,
        /// Explanation of why it's invalid
        reason: String,
    },

    /// File format error
    #[error("Invalid {file_type} file '{path}': {reason}")]
    InvalidFileFormat {
        /// Type of file (e.g., "BAM", "FASTA")
        file_type: String,
        /// Path to the file
        path: String,
        /// Explanation of the problem
        reason: String,
    },

    /// Reference sequence not found in the FASTA
    #[error("Reference sequence '{ref_name}' not found")]
    ReferenceNotFound {
        /// Name of the missing contig
        ref_name: String,
    },

    /// Lenient trimming gave up after too many failed records
    #[error("{failed} alignments could not be softmasked (limit {limit})")]
    TooManyTrimErrors { failed: u64, limit: u64 },
}

/// A single scheme row that could not be turned into a primer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    #[error("row is not valid UTF-8")]
    InvalidEncoding,

    #[error("expected at least 5 tab-separated columns, found {found}")]
    TooFewColumns { found: usize },

    #[error("invalid primer coordinate '{value}'")]
    InvalidCoordinate { value: String },

    #[error("primer constructor received missing ID")]
    MissingId,

    #[error("invalid primer start/end for primerID: {primer_id}")]
    InvalidSpan { primer_id: String },

    #[error("invalid primer ID doesn't contain LEFT/RIGHT: {primer_id}")]
    MissingDirection { primer_id: String },

    #[error("invalid primer ID contains both LEFT and RIGHT: {primer_id}")]
    AmbiguousDirection { primer_id: String },

    #[error("could not merge alt with different orientation to canonical: {primer_id}")]
    AltDirectionMismatch { primer_id: String },

    #[error("could not merge alt from different pool to canonical: {primer_id}")]
    AltPoolMismatch { primer_id: String },
}

/// Scheme load and query errors.
#[derive(Error, Debug)]
pub enum SchemeError {
    #[error("primer scheme input file required")]
    MissingInput,

    #[error("primer scheme file does not exist: {path}")]
    FileNotFound { path: String },

    #[error("failed to read primer scheme: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid row {line} in scheme - {source}")]
    InvalidRow {
        line: usize,
        #[source]
        source: RowError,
    },

    #[error("multiple reference sequences can't be used in primer scheme ({expected} and {found})")]
    MultipleReferences { expected: String, found: String },

    #[error("no primers found in the provided scheme")]
    Empty,

    #[error("primer count does not equal the number of rows consumed - {loaded} vs {consumed}")]
    RowCountMismatch { loaded: usize, consumed: usize },

    #[error(
        "number of forward primers does not match number of reverse primers (after alt merging) - {forward} vs. {reverse}"
    )]
    PrimerCountMismatch { forward: usize, reverse: usize },

    #[error("can't find matching reverse primer for {primer_id}")]
    UnpairedPrimer { primer_id: String },

    #[error("gap found in primer scheme - {start}-{end}")]
    CoverageGap { start: i64, end: i64 },

    #[error("query position {pos} outside of primer scheme bounds ({start}-{end})")]
    OutOfBounds { pos: i64, start: i64, end: i64 },

    #[error("pool name not found in scheme - {0}")]
    UnknownPoolName(String),

    #[error("poolID not found in scheme pools - {0}")]
    UnknownPoolId(usize),

    #[error("primer dropped from scheme - {forward} & {reverse}")]
    PrimerNotFound { forward: usize, reverse: usize },

    #[error("cannot create amplicon from primers with the same directionality - {first} & {second}")]
    SameDirection { first: String, second: String },

    #[error("cannot create amplicon from outward facing primers - {forward} & {reverse}")]
    OutwardFacing { forward: String, reverse: String },
}

/// Failures while soft-masking a single alignment.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrimError {
    #[error("alignment lies entirely inside the mask up to {boundary}")]
    ReadInsideMask { boundary: i64 },

    #[error("indel found at the mask boundary {boundary}, cannot softmask")]
    IndelAtBoundary { boundary: i64 },

    #[error("softmask produced a zero-length {edge} operation")]
    EmptyEdgeOperation { edge: &'static str },

    #[error("softmask changed the query length from {before} to {after}")]
    QueryLengthChanged { before: usize, after: usize },

    #[error("invalid CIGAR operation code {0}")]
    InvalidCigarOp(u32),

    #[error("CIGAR operation length {0} cannot be stored in a BAM record")]
    CigarOpTooLong(usize),

    #[error(transparent)]
    Rewrite(#[from] RewriteError),
}

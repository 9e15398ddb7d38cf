//! Command-line parameter checks shared by the commands.

use crate::bam_io::is_stdio_path;
use crate::errors::{AmptrimError, Result};
use std::fmt::Display;
use std::path::Path;

/// Validate that a file exists
///
/// # Errors
/// Returns an error if the file does not exist
///
/// # Example
/// ```
/// use amptrim_lib::validation::validate_file_exists;
///
/// let result = validate_file_exists("/nonexistent/scheme.bed", "Primer scheme");
/// assert!(result.is_err());
/// ```
pub fn validate_file_exists<P: AsRef<Path>>(path: P, description: &str) -> Result<()> {
    let path_ref = path.as_ref();
    if !path_ref.exists() {
        return Err(AmptrimError::InvalidFileFormat {
            file_type: description.to_string(),
            path: path_ref.display().to_string(),
            reason: "File does not exist".to_string(),
        });
    }
    Ok(())
}

/// Like [`validate_file_exists`], but `-` (stdin) is always accepted.
///
/// # Errors
/// Returns an error if the path is not `-` and does not exist
pub fn validate_input_exists<P: AsRef<Path>>(path: P, description: &str) -> Result<()> {
    if is_stdio_path(path.as_ref()) {
        return Ok(());
    }
    validate_file_exists(path, description)
}

/// Validate that a value is positive (> 0)
///
/// # Errors
/// Returns an error if the value is not positive
pub fn validate_positive<T: Ord + Display + Default>(value: T, name: &str) -> Result<()> {
    if value <= T::default() {
        return Err(AmptrimError::InvalidParameter {
            parameter: name.to_string(),
            reason: format!("Must be positive (> 0), got: {value}"),
        });
    }
    Ok(())
}

/// Validate that `required` is set whenever `trigger` is.
///
/// # Errors
/// Returns an error naming both options if `trigger` is set without `required`
///
/// # Example
/// ```
/// use amptrim_lib::validation::validate_required_with;
///
/// assert!(validate_required_with(Some("seqs.fa"), "output-primer-seqs", None::<&str>, "reference").is_err());
/// assert!(validate_required_with(None::<&str>, "output-primer-seqs", None::<&str>, "reference").is_ok());
/// ```
pub fn validate_required_with<A, B>(
    trigger: Option<A>,
    trigger_name: &str,
    required: Option<B>,
    required_name: &str,
) -> Result<()> {
    if trigger.is_some() && required.is_none() {
        return Err(AmptrimError::InvalidParameter {
            parameter: required_name.to_string(),
            reason: format!("--{required_name} is required when --{trigger_name} is given"),
        });
    }
    Ok(())
}

//! Input validation utilities.
//!
//! This module contains functions for validating configuration values before they are used
//! to discover documents or parse tables.

use crate::{PrepError, PrepResult};

/// Validates a notebook file extension used for document discovery.
///
/// The extension is matched against file names as-is, so it must be a bare suffix:
/// - Rejects empty or whitespace-only strings
/// - Rejects a leading dot (`.ipynb`); pass `ipynb`
/// - Restricts characters to ASCII alphanumerics
///
/// # Errors
///
/// Returns a `PrepError::InvalidInput` if the extension is invalid.
pub fn validate_notebook_extension(extension: &str) -> PrepResult<()> {
    const MAX_EXTENSION_LEN: usize = 16;

    if extension.trim().is_empty() {
        return Err(PrepError::InvalidInput(
            "notebook extension cannot be empty".into(),
        ));
    }

    if extension.starts_with('.') {
        return Err(PrepError::InvalidInput(format!(
            "notebook extension must not start with '.': {}",
            extension
        )));
    }

    if extension.len() > MAX_EXTENSION_LEN {
        return Err(PrepError::InvalidInput(format!(
            "notebook extension exceeds maximum length of {} characters",
            MAX_EXTENSION_LEN
        )));
    }

    if !extension.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(PrepError::InvalidInput(
            "notebook extension contains invalid characters (only ASCII alphanumerics allowed)"
                .into(),
        ));
    }

    Ok(())
}

/// Validates a field delimiter for the diagnoses and labels tables.
///
/// # Errors
///
/// Returns a `PrepError::InvalidInput` if the delimiter is not a single printable ASCII
/// character, or is a quote or alphanumeric character.
pub fn validate_delimiter(delimiter: char) -> PrepResult<u8> {
    if !delimiter.is_ascii() || delimiter.is_ascii_alphanumeric() {
        return Err(PrepError::InvalidInput(format!(
            "delimiter must be an ASCII punctuation or whitespace character: {:?}",
            delimiter
        )));
    }

    if matches!(delimiter, '"' | '\n' | '\r') {
        return Err(PrepError::InvalidInput(format!(
            "delimiter cannot be a quote or line terminator: {:?}",
            delimiter
        )));
    }

    Ok(delimiter as u8)
}

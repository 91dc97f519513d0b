//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into the normaliser and classifier. Neither component infers where the data lives
//! from the process working directory; relative paths are resolved against `data_dir`.

use crate::rules::RuleSet;
use crate::validation::{validate_delimiter, validate_notebook_extension};
use crate::{PrepError, PrepResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    notebook_extension: String,
    rule_set: RuleSet,
    dry_run: bool,
    delimiter: u8,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `PrepError::InvalidInput` if `data_dir` is empty, the extension is not a bare
    /// alphanumeric suffix, or the delimiter is unusable.
    pub fn new(
        data_dir: PathBuf,
        notebook_extension: String,
        rule_set: RuleSet,
        dry_run: bool,
        delimiter: char,
    ) -> PrepResult<Self> {
        if data_dir.as_os_str().is_empty() {
            return Err(PrepError::InvalidInput("data_dir cannot be empty".into()));
        }
        validate_notebook_extension(&notebook_extension)?;
        let delimiter = validate_delimiter(delimiter)?;

        Ok(Self {
            data_dir,
            notebook_extension,
            rule_set,
            dry_run,
            delimiter,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn notebook_extension(&self) -> &str {
        &self.notebook_extension
    }

    pub fn rule_set(&self) -> RuleSet {
        self.rule_set
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Resolve `path` against the data directory. Absolute paths are returned unchanged.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir.join(path)
        }
    }
}

/// Parse the rule set from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`RuleSet::All`].
pub fn rule_set_from_env_value(value: Option<String>) -> PrepResult<RuleSet> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let parsed = value.map(|v| v.parse::<RuleSet>()).transpose()?;

    Ok(parsed.unwrap_or_default())
}

/// Parse a boolean flag from an optional string value.
///
/// Accepts `1/0`, `true/false`, `yes/no` (case-insensitive). Missing or blank means `false`.
pub fn flag_from_env_value(name: &str, value: Option<String>) -> PrepResult<bool> {
    let Some(value) = value else {
        return Ok(false);
    };

    match value.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "no" => Ok(false),
        "1" | "true" | "yes" => Ok(true),
        other => Err(PrepError::InvalidInput(format!(
            "{} must be a boolean, got '{}'",
            name, other
        ))),
    }
}

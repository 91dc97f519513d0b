//! Notebook path normalisation.
//!
//! [`NotebookNormaliser`] runs a compiled [`PathRules`] table over the code cells of a
//! notebook and writes the notebook back only when a cell changed. The batch driver,
//! [`NotebookNormaliser::normalise_tree`], walks a directory and keeps going when a single
//! notebook fails; failures are collected in the [`BatchReport`].

use crate::config::CoreConfig;
use crate::notebook::{CellKind, Notebook};
use crate::rules::PathRules;
use crate::{PrepError, PrepResult};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Outcome of normalising one notebook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentStatus {
    /// At least one code cell was rewritten. In dry-run mode nothing was written.
    Changed { cells: usize },
    /// No rule changed any code cell; the file was not touched.
    Unchanged,
}

impl DocumentStatus {
    pub fn is_changed(&self) -> bool {
        matches!(self, DocumentStatus::Changed { .. })
    }
}

/// A notebook the batch driver could not process.
#[derive(Debug)]
pub struct DocumentFailure {
    pub path: PathBuf,
    pub error: PrepError,
}

/// Aggregate result of a directory run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Notebooks discovered under the root.
    pub found: usize,
    /// Notebooks that were (or, in dry-run mode, would be) rewritten.
    pub changed: Vec<PathBuf>,
    /// Notebooks that needed no change.
    pub unchanged: usize,
    pub failures: Vec<DocumentFailure>,
}

impl BatchReport {
    pub fn changed_count(&self) -> usize {
        self.changed.len()
    }

    /// Notebooks that were read successfully, changed or not.
    pub fn processed(&self) -> usize {
        self.changed.len() + self.unchanged
    }
}

/// Rewrites hard-coded paths in notebook code cells.
#[derive(Debug, Clone)]
pub struct NotebookNormaliser {
    rules: PathRules,
    dry_run: bool,
}

impl NotebookNormaliser {
    pub fn new(rules: PathRules) -> Self {
        Self {
            rules,
            dry_run: false,
        }
    }

    /// Builds a normaliser with the rule set and dry-run flag from `config`.
    pub fn from_config(config: &CoreConfig) -> PrepResult<Self> {
        let rules = PathRules::for_set(config.rule_set())?;
        Ok(Self::new(rules).with_dry_run(config.dry_run()))
    }

    /// When set, changes are reported but never written.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn rules(&self) -> &PathRules {
        &self.rules
    }

    /// Applies the rules to every code cell of `notebook` in memory.
    ///
    /// A cell whose text comes out different is re-split into newline-terminated lines;
    /// untouched cells keep their source exactly as stored.
    ///
    /// # Returns
    ///
    /// The number of cells rewritten.
    ///
    /// # Errors
    ///
    /// Returns `PrepError::MalformedNotebook` if a code cell's source has the wrong shape.
    pub fn normalise_notebook(&self, notebook: &mut Notebook) -> PrepResult<usize> {
        let mut changed = 0;
        for mut cell in notebook.cells_mut() {
            if cell.kind() != CellKind::Code {
                continue;
            }
            let original = cell.source_text()?;
            let rewritten = self.rules.apply(&original);
            if rewritten != original {
                cell.set_source(&rewritten);
                changed += 1;
            }
        }
        Ok(changed)
    }

    /// Normalises the notebook at `path`, saving it only if a cell changed.
    pub fn normalise_file(&self, path: &Path) -> PrepResult<DocumentStatus> {
        let mut notebook = Notebook::load(path)?;
        let cells = self.normalise_notebook(&mut notebook)?;

        if cells == 0 {
            tracing::debug!("no changes needed in {}", path.display());
            return Ok(DocumentStatus::Unchanged);
        }

        if self.dry_run {
            tracing::info!("would fix {} cell(s) in {}", cells, path.display());
        } else {
            notebook.save(path)?;
            tracing::info!("fixed {} cell(s) in {}", cells, path.display());
        }

        Ok(DocumentStatus::Changed { cells })
    }

    /// Normalises every notebook with `extension` found under `root`.
    ///
    /// Notebooks are processed one at a time in path order. A notebook that cannot be read,
    /// parsed or written is logged and recorded in the report; the rest of the batch still
    /// runs.
    ///
    /// # Errors
    ///
    /// Returns `PrepError::InvalidInput` only if `root` is not a directory.
    pub fn normalise_tree(&self, root: &Path, extension: &str) -> PrepResult<BatchReport> {
        let mut report = BatchReport::default();
        let notebooks = discover_notebooks(root, extension, &mut report.failures)?;
        report.found = notebooks.len();

        tracing::info!(
            "found {} notebook(s) under {}",
            notebooks.len(),
            root.display()
        );

        for path in notebooks {
            match self.normalise_file(&path) {
                Ok(DocumentStatus::Changed { .. }) => report.changed.push(path),
                Ok(DocumentStatus::Unchanged) => report.unchanged += 1,
                Err(error) => {
                    tracing::warn!("failed to normalise {}: {}", path.display(), error);
                    report.failures.push(DocumentFailure { path, error });
                }
            }
        }

        Ok(report)
    }
}

/// Lists files under `root` whose extension is exactly `extension`, sorted by path.
///
/// Entries the walk cannot read are pushed onto `failures` instead of ending the walk.
fn discover_notebooks(
    root: &Path,
    extension: &str,
    failures: &mut Vec<DocumentFailure>,
) -> PrepResult<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(PrepError::InvalidInput(format!(
            "notebook root is not a directory: {}",
            root.display()
        )));
    }

    let mut notebooks = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                let path = error
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.to_path_buf());
                tracing::warn!("skipping unreadable entry {}: {}", path.display(), error);
                failures.push(DocumentFailure {
                    path,
                    error: error.into(),
                });
                continue;
            }
        };

        if entry.file_type().is_file()
            && entry.path().extension().and_then(|e| e.to_str()) == Some(extension)
        {
            notebooks.push(entry.into_path());
        }
    }

    notebooks.sort();
    Ok(notebooks)
}

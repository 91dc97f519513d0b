//! Binary ischemic labels from diagnosis codes.
//!
//! Diagnosis rows are filtered to the cardiac code whitelist, grouped per subject, and each
//! subject is labelled `1` if any of its codes is in the ischemic subset. Subjects with no
//! whitelisted code are left out of the output entirely.
//!
//! The only fatal condition is an input with no whitelisted code at all, which almost
//! always means the file is not the diagnoses table it was supposed to be. A table in which
//! every subject is labelled `0` is a valid result.

use crate::config::CoreConfig;
use crate::constants::{ICD_CODE_COLUMN, ICD_WHITELIST, ISCHEMIC_CODES, SUBJECT_ID_COLUMN};
use crate::{PrepError, PrepResult};
use ecgprep_types::{IcdCode, SubjectId};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io;
use std::path::Path;

/// One row of the diagnoses table after normalisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosisRow {
    pub subject_id: SubjectId,
    /// `None` when the code cell was blank or `NAN`.
    pub code: Option<IcdCode>,
}

impl DiagnosisRow {
    pub fn new(subject_id: SubjectId, raw_code: &str) -> Self {
        Self {
            subject_id,
            code: IcdCode::normalise(raw_code),
        }
    }
}

#[derive(Debug, serde::Deserialize)]
struct RawDiagnosis {
    subject_id: String,
    icd_code: Option<String>,
}

/// One row of the labels table.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SubjectLabel {
    pub subject_id: SubjectId,
    pub label_ischemic: u8,
}

/// Label counts for a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LabelSummary {
    pub subjects: usize,
    pub ischemic: usize,
    pub non_ischemic: usize,
}

impl LabelSummary {
    pub fn from_labels(labels: &[SubjectLabel]) -> Self {
        let ischemic = labels.iter().filter(|l| l.label_ischemic == 1).count();
        Self {
            subjects: labels.len(),
            ischemic,
            non_ischemic: labels.len() - ischemic,
        }
    }
}

/// `1` if any code is in the ischemic subset, else `0`.
pub fn compute_ischemic_label<'a>(codes: impl IntoIterator<Item = &'a IcdCode>) -> u8 {
    u8::from(codes.into_iter().any(|code| code.is_in(&ISCHEMIC_CODES)))
}

/// Groups whitelisted codes per subject and labels each subject.
///
/// # Returns
///
/// One label per subject with at least one whitelisted code, sorted by subject identifier.
///
/// # Errors
///
/// Returns `PrepError::NoValidCodes` if no row carries a whitelisted code.
pub fn classify(rows: &[DiagnosisRow]) -> PrepResult<Vec<SubjectLabel>> {
    let mut subjects: BTreeMap<&SubjectId, BTreeSet<&IcdCode>> = BTreeMap::new();
    for row in rows {
        if let Some(code) = row.code.as_ref().filter(|code| code.is_in(&ICD_WHITELIST)) {
            subjects.entry(&row.subject_id).or_default().insert(code);
        }
    }

    if subjects.is_empty() {
        return Err(PrepError::NoValidCodes);
    }

    let labels = subjects
        .into_iter()
        .map(|(subject_id, codes)| {
            tracing::debug!(subject = %subject_id, codes = ?codes, "subject codes");
            SubjectLabel {
                subject_id: subject_id.clone(),
                label_ischemic: compute_ischemic_label(codes.iter().copied()),
            }
        })
        .collect();

    Ok(labels)
}

/// Reads a diagnoses table with `subject_id` and `icd_code` columns.
///
/// Extra columns are ignored. A row shorter than the header reads its missing fields as
/// blank. Rows with a blank subject identifier are skipped with a warning.
///
/// # Errors
///
/// - `PrepError::MissingColumn` if either required column is absent from the header.
/// - `PrepError::CsvRead` if the table cannot be parsed.
pub fn read_diagnoses_from<R: io::Read>(reader: R, delimiter: u8) -> PrepResult<Vec<DiagnosisRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = reader.headers().map_err(PrepError::CsvRead)?;
    for column in [SUBJECT_ID_COLUMN, ICD_CODE_COLUMN] {
        if !headers.iter().any(|header| header == column) {
            return Err(PrepError::MissingColumn(column));
        }
    }

    let mut rows = Vec::new();
    for (index, record) in reader.deserialize::<RawDiagnosis>().enumerate() {
        let raw = record.map_err(PrepError::CsvRead)?;
        let Ok(subject_id) = SubjectId::new(&raw.subject_id) else {
            // +2: one for the header, one for 1-based line numbers.
            tracing::warn!("skipping diagnoses row {} with blank subject_id", index + 2);
            continue;
        };
        rows.push(DiagnosisRow {
            subject_id,
            code: raw.icd_code.as_deref().and_then(IcdCode::normalise),
        });
    }

    Ok(rows)
}

/// Writes the labels table with a `subject_id,label_ischemic` header and no index column.
pub fn write_labels_to<W: io::Write>(
    writer: W,
    labels: &[SubjectLabel],
    delimiter: u8,
) -> PrepResult<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);
    for label in labels {
        writer.serialize(label).map_err(PrepError::CsvWrite)?;
    }
    writer
        .flush()
        .map_err(|e| PrepError::CsvWrite(csv::Error::from(e)))
}

/// Classifies subjects in a diagnoses table and writes their labels.
#[derive(Debug, Clone)]
pub struct IschemicLabeller {
    delimiter: u8,
}

impl Default for IschemicLabeller {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl IschemicLabeller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &CoreConfig) -> Self {
        Self {
            delimiter: config.delimiter(),
        }
    }

    /// Reads the diagnoses table at `path`. The file is closed before this returns.
    pub fn read_diagnoses(&self, path: &Path) -> PrepResult<Vec<DiagnosisRow>> {
        let file = File::open(path).map_err(|source| PrepError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        read_diagnoses_from(file, self.delimiter)
    }

    /// Writes `labels` to `path`, replacing any existing file.
    pub fn write_labels(&self, path: &Path, labels: &[SubjectLabel]) -> PrepResult<()> {
        let file = File::create(path).map_err(|source| PrepError::FileWrite {
            path: path.to_path_buf(),
            source,
        })?;
        write_labels_to(file, labels, self.delimiter)
    }

    /// Reads `input`, classifies every subject and writes the labels to `output`.
    ///
    /// Nothing is written if classification fails.
    ///
    /// # Errors
    ///
    /// Any read, parse or write error, and `PrepError::NoValidCodes` when the input holds no
    /// whitelisted code.
    pub fn run(&self, input: &Path, output: &Path) -> PrepResult<LabelSummary> {
        let rows = self.read_diagnoses(input)?;
        tracing::info!("read {} diagnosis row(s) from {}", rows.len(), input.display());

        let labels = classify(&rows)?;
        self.write_labels(output, &labels)?;

        let summary = LabelSummary::from_labels(&labels);
        tracing::info!(
            subjects = summary.subjects,
            ischemic = summary.ischemic,
            non_ischemic = summary.non_ischemic,
            "wrote labels to {}",
            output.display()
        );
        Ok(summary)
    }
}

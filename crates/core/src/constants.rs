//! Constants used throughout the ECG prep core crate.
//!
//! File names, defaults and the fixed clinical code sets live here so they are never
//! derived at runtime.

/// Default data directory when no explicit directory is configured.
pub const DEFAULT_DATA_DIR: &str = ".";

/// Default extension of notebook documents discovered by the batch driver.
pub const DEFAULT_NOTEBOOK_EXTENSION: &str = "ipynb";

/// Default diagnoses table, relative to the data directory.
pub const DEFAULT_DIAGNOSES_FILENAME: &str = "heart_diagnoses_1.csv";

/// Default labels table, relative to the data directory.
pub const DEFAULT_LABELS_FILENAME: &str = "subject_to_labels_ischemic.csv";

/// Column holding the subject identifier in the diagnoses and labels tables.
pub const SUBJECT_ID_COLUMN: &str = "subject_id";

/// Column holding the ICD code in the diagnoses table.
pub const ICD_CODE_COLUMN: &str = "icd_code";

/// Column holding the derived label in the labels table.
pub const LABEL_ISCHEMIC_COLUMN: &str = "label_ischemic";

/// Notebook cell type whose source is rewritten by the path normaliser.
pub const CODE_CELL_TYPE: &str = "code";

/// Indentation used when writing notebooks back, matching how Jupyter saves them.
pub const NOTEBOOK_INDENT: &[u8] = b" ";

/// Cardiac ICD codes considered by the ischemic classifier. Anything else is ignored.
pub const ICD_WHITELIST: [&str; 20] = [
    "I20", "I21", "I22", "I24", "I25", // ischemic heart disease
    "I30", "I31", "I33", // pericardium and endocardium
    "I34", "I35", "I36", // valve disorders
    "I40", "I42", // myocarditis and cardiomyopathy
    "I44", "I45", "I46", "I47", "I48", "I49", // conduction and rhythm
    "I50", // heart failure
];

/// Whitelisted codes whose presence labels a subject ischemic.
pub const ISCHEMIC_CODES: [&str; 5] = ["I20", "I21", "I22", "I24", "I25"];

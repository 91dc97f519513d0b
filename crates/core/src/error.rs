use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PrepError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("failed to read {path}: {source}", path = path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}", path = path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse notebook JSON: {0}")]
    NotebookParse(serde_json::Error),
    #[error("failed to serialise notebook JSON: {0}")]
    NotebookSerialise(serde_json::Error),
    #[error("malformed notebook: {0}")]
    MalformedNotebook(String),
    #[error("failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("invalid substitution rule {name}: {source}")]
    InvalidRule {
        name: &'static str,
        #[source]
        source: regex::Error,
    },
    #[error("unknown substitution rule: {0}")]
    UnknownRule(String),

    #[error("failed to read diagnoses table: {0}")]
    CsvRead(csv::Error),
    #[error("failed to write labels table: {0}")]
    CsvWrite(csv::Error),
    #[error("diagnoses table is missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("no whitelisted ICD codes found in input; check the format of the codes")]
    NoValidCodes,
}

pub type PrepResult<T> = std::result::Result<T, PrepError>;

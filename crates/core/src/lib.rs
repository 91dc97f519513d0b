//! # ECG Prep Core
//!
//! Core logic for the ECG coursework data-preparation tools.
//!
//! This crate contains two independent batch transformations:
//! - Notebook path normalisation: rewriting hard-coded paths in notebook code cells so they
//!   resolve relative to the submission folder
//! - Ischemic labelling: deriving one binary label per subject from ICD diagnosis codes
//!
//! **No process concerns**: argument parsing, environment variables and log subscribers
//! belong in the `ecgprep` CLI and the `ecgprep-run` binary. Everything here takes its
//! settings from a [`CoreConfig`] or explicit arguments.

pub mod config;
pub mod constants;
pub mod error;
pub mod labels;
pub mod normaliser;
pub mod notebook;
pub mod rules;
pub mod validation;

pub use config::CoreConfig;
pub use ecgprep_types::{IcdCode, SubjectId, TypesError};
pub use error::{PrepError, PrepResult};
pub use labels::{IschemicLabeller, LabelSummary, SubjectLabel};
pub use normaliser::{BatchReport, DocumentStatus, NotebookNormaliser};
pub use notebook::Notebook;
pub use rules::{PathRules, RuleSet};

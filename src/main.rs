use std::path::PathBuf;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ecgprep_core::config::{flag_from_env_value, rule_set_from_env_value};
use ecgprep_core::constants::{
    DEFAULT_DATA_DIR, DEFAULT_DIAGNOSES_FILENAME, DEFAULT_LABELS_FILENAME,
    DEFAULT_NOTEBOOK_EXTENSION,
};
use ecgprep_core::{CoreConfig, IschemicLabeller, NotebookNormaliser};

/// Main entry point for the full preparation run
///
/// Runs both preparation steps against one data directory:
/// - rewrites hard-coded paths in every notebook under the data directory
/// - derives ischemic labels from the diagnoses table
///
/// A notebook that fails is reported and skipped. A labelling failure (including a
/// diagnoses table with no whitelisted code) ends the run with an error.
///
/// # Environment Variables
/// - `ECGPREP_DATA_DIR`: submission folder holding notebooks and tables (default: ".")
/// - `ECGPREP_NOTEBOOK_EXT`: notebook extension without the dot (default: "ipynb")
/// - `ECGPREP_RULE_SET`: `standard`, `comprehensive` or `all` (default: "all")
/// - `ECGPREP_DRY_RUN`: report notebook changes without writing them (default: false)
/// - `ECGPREP_DIAGNOSES_CSV`: diagnoses table (default: "heart_diagnoses_1.csv")
/// - `ECGPREP_LABELS_CSV`: labels table to write (default: "subject_to_labels_ischemic.csv")
///
/// Relative table paths are resolved against `ECGPREP_DATA_DIR`.
fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ecgprep_core=info".parse()?)
                .add_directive("ecgprep_run=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let data_dir = std::env::var("ECGPREP_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.into());
    let extension = std::env::var("ECGPREP_NOTEBOOK_EXT")
        .unwrap_or_else(|_| DEFAULT_NOTEBOOK_EXTENSION.into());
    let rule_set = rule_set_from_env_value(std::env::var("ECGPREP_RULE_SET").ok())?;
    let dry_run = flag_from_env_value("ECGPREP_DRY_RUN", std::env::var("ECGPREP_DRY_RUN").ok())?;
    let diagnoses = std::env::var("ECGPREP_DIAGNOSES_CSV")
        .unwrap_or_else(|_| DEFAULT_DIAGNOSES_FILENAME.into());
    let labels = std::env::var("ECGPREP_LABELS_CSV")
        .unwrap_or_else(|_| DEFAULT_LABELS_FILENAME.into());

    let config = CoreConfig::new(PathBuf::from(data_dir), extension, rule_set, dry_run, ',')?;

    tracing::info!(
        "++ Normalising notebooks under {} (rules: {})",
        config.data_dir().display(),
        config.rule_set()
    );
    let normaliser = NotebookNormaliser::from_config(&config)?;
    let report = normaliser.normalise_tree(config.data_dir(), config.notebook_extension())?;
    println!("Processed {} notebooks", report.processed());
    println!("Made changes to {} notebooks", report.changed_count());
    for failure in &report.failures {
        tracing::error!("notebook {} failed: {}", failure.path.display(), failure.error);
    }

    let input = config.resolve(diagnoses);
    let output = config.resolve(labels);
    tracing::info!("++ Labelling subjects from {}", input.display());
    let summary = IschemicLabeller::from_config(&config).run(&input, &output)?;
    println!(
        "Labelled {} subjects ({} ischemic, {} non-ischemic)",
        summary.subjects, summary.ischemic, summary.non_ischemic
    );

    Ok(())
}

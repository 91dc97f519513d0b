use clap::{Parser, Subcommand};
use ecgprep_core::constants::{
    DEFAULT_DATA_DIR, DEFAULT_DIAGNOSES_FILENAME, DEFAULT_LABELS_FILENAME,
    DEFAULT_NOTEBOOK_EXTENSION,
};
use ecgprep_core::{CoreConfig, IschemicLabeller, NotebookNormaliser, PathRules, RuleSet};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ecgprep")]
#[command(about = "Data preparation tools for the ECG coursework")]
struct Cli {
    /// Directory that relative paths are resolved against
    #[arg(long, global = true, default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite hard-coded paths in every notebook under a directory
    FixPaths {
        /// Directory to search (defaults to the data directory)
        root: Option<PathBuf>,
        /// Notebook file extension, without the dot
        #[arg(long, default_value = DEFAULT_NOTEBOOK_EXTENSION)]
        extension: String,
        /// Rule set: standard, comprehensive or all
        #[arg(long, default_value_t = RuleSet::All)]
        rules: RuleSet,
        /// Report changes without writing them
        #[arg(long)]
        dry_run: bool,
    },
    /// Rewrite hard-coded paths in a single notebook
    FixNotebook {
        /// Notebook to rewrite
        path: PathBuf,
        /// Rule set: standard, comprehensive or all
        #[arg(long, default_value_t = RuleSet::All)]
        rules: RuleSet,
        /// Report changes without writing them
        #[arg(long)]
        dry_run: bool,
    },
    /// List the substitution rules in application order
    ListRules {
        /// Rule set: standard, comprehensive or all
        #[arg(long, default_value_t = RuleSet::All)]
        rules: RuleSet,
    },
    /// Derive binary ischemic labels from a diagnoses table
    LabelIschemic {
        /// Diagnoses table with subject_id and icd_code columns
        #[arg(default_value = DEFAULT_DIAGNOSES_FILENAME)]
        input: PathBuf,
        /// Labels table to write
        #[arg(default_value = DEFAULT_LABELS_FILENAME)]
        output: PathBuf,
        /// Field delimiter of both tables
        #[arg(long, default_value_t = ',')]
        delimiter: char,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("ecgprep_core=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Runs one subcommand. Any error is returned so the process can exit non-zero.
fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Some(Commands::FixPaths {
            root,
            extension,
            rules,
            dry_run,
        }) => {
            let config = CoreConfig::new(cli.data_dir, extension, rules, dry_run, ',')?;
            let root = root
                .map(|r| config.resolve(r))
                .unwrap_or_else(|| config.data_dir().to_path_buf());
            let normaliser = NotebookNormaliser::from_config(&config)?;

            let report = normaliser
                .normalise_tree(&root, config.notebook_extension())
                .map_err(|e| format!("Error fixing paths: {}", e))?;
            println!("Found {} notebooks to process", report.found);
            for path in &report.changed {
                let verb = if dry_run { "Would fix" } else { "Fixed" };
                println!("  ✓ {} paths in {}", verb, path.display());
            }
            for failure in &report.failures {
                eprintln!("  ✗ {}: {}", failure.path.display(), failure.error);
            }
            println!("Processed {} notebooks", report.processed());
            println!("Made changes to {} notebooks", report.changed_count());
            if !report.failures.is_empty() {
                println!("Failed on {} notebooks", report.failures.len());
            }
        }
        Some(Commands::FixNotebook {
            path,
            rules,
            dry_run,
        }) => {
            let config = CoreConfig::new(
                cli.data_dir,
                DEFAULT_NOTEBOOK_EXTENSION.into(),
                rules,
                dry_run,
                ',',
            )?;
            let path = config.resolve(path);
            let normaliser = NotebookNormaliser::from_config(&config)?;
            let status = normaliser
                .normalise_file(&path)
                .map_err(|e| format!("Error fixing {}: {}", path.display(), e))?;
            if status.is_changed() {
                println!("Fixed paths in {}", path.display());
            } else {
                println!("No changes needed in {}", path.display());
            }
        }
        Some(Commands::ListRules { rules }) => {
            let compiled = PathRules::for_set(rules)?;
            for (index, rule) in compiled.iter().enumerate() {
                println!("{:>2}. {} ({:?})", index + 1, rule.name(), rule.category());
            }
        }
        Some(Commands::LabelIschemic {
            input,
            output,
            delimiter,
        }) => {
            let config = CoreConfig::new(
                cli.data_dir,
                DEFAULT_NOTEBOOK_EXTENSION.into(),
                RuleSet::default(),
                false,
                delimiter,
            )?;
            let input = config.resolve(input);
            let output = config.resolve(output);
            let summary = IschemicLabeller::from_config(&config)
                .run(&input, &output)
                .map_err(|e| format!("Error labelling subjects: {}", e))?;
            println!(
                "Wrote {} subject labels to {}",
                summary.subjects,
                output.display()
            );
            println!("  ischemic (1):     {}", summary.ischemic);
            println!("  non-ischemic (0): {}", summary.non_ischemic);
        }
        None => {
            println!("Use 'ecgprep --help' for commands");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn run_args(args: &[&str]) -> Result<(), Box<dyn std::error::Error>> {
        run(Cli::try_parse_from(args)?)
    }

    #[test]
    fn test_fix_paths_missing_root_is_an_error() {
        let temp = TempDir::new().unwrap();
        let data_dir = temp.path().to_str().unwrap();
        let result = run_args(&["ecgprep", "--data-dir", data_dir, "fix-paths", "no-such-dir"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_fix_notebook_malformed_is_an_error() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("broken.ipynb"), "{ not json").unwrap();
        let data_dir = temp.path().to_str().unwrap();
        let result = run_args(&["ecgprep", "--data-dir", data_dir, "fix-notebook", "broken.ipynb"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_fix_notebook_rewrites_paths() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("analysis.ipynb");
        fs::write(
            &path,
            r#"{"cells": [{"cell_type": "code", "source": "pd.read_csv('../Data/x.csv')"}]}"#,
        )
        .unwrap();
        let data_dir = temp.path().to_str().unwrap();
        run_args(&["ecgprep", "--data-dir", data_dir, "fix-notebook", "analysis.ipynb"]).unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("'./x.csv'"));
    }

    #[test]
    fn test_label_ischemic_without_whitelisted_codes_is_an_error() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("in.csv"), "subject_id,icd_code\nS1,E11\n").unwrap();
        let data_dir = temp.path().to_str().unwrap();
        let result = run_args(&["ecgprep", "--data-dir", data_dir, "label-ischemic", "in.csv", "out.csv"]);
        assert!(result.is_err());
        assert!(!temp.path().join("out.csv").exists());
    }
}

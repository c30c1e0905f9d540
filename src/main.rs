//! Batch orchestration of the `feature-verifier` binary.
//!
//! Compiles the catalog once, publishes it read-only, then verifies each
//! selected feature file against it. Exit status distinguishes remediation
//! classes: `0` all passed, `1` some document failed verification, `2` some
//! document was malformed or missing, `3` the catalog itself did not
//! compile.

use std::{fs, path::PathBuf, process::ExitCode};

use clap::Parser as _;
use console::style;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use feature_verifier::{
    cli::Opts, CompiledCatalog, VerificationOutcome, DEFAULT_CATALOG,
};

fn main() -> ExitCode {
    let opts = Opts::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(
            |_| {
                EnvFilter::new(if opts.debug { "debug" } else { "info" })
            },
        ))
        .with_writer(std::io::stderr)
        .init();
    if opts.no_color {
        console::set_colors_enabled(false);
    }

    let catalog_text = match &opts.catalog {
        Some(path) => match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                eprintln!(
                    "{} cannot read catalog {}: {e}",
                    style("error:").red().bold(),
                    path.display(),
                );
                return ExitCode::from(3);
            }
        },
        None => DEFAULT_CATALOG.to_owned(),
    };
    let catalog = match CompiledCatalog::compile(&catalog_text) {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("{} {e}", style("catalog error:").red().bold());
            return ExitCode::from(3);
        }
    };
    info!(templates = catalog.len(), "compiled step catalog");

    let files = match collect_feature_files(&opts.features) {
        Ok(files) => files,
        Err(msg) => {
            eprintln!("{} {msg}", style("error:").red().bold());
            return ExitCode::from(2);
        }
    };

    let mut any_failed = false;
    let mut any_malformed = false;
    for path in files {
        debug!(file = %path.display(), "verifying");
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                eprintln!(
                    "{} {}: {e}",
                    style("error:").red().bold(),
                    path.display(),
                );
                any_malformed = true;
                if opts.force {
                    continue;
                }
                break;
            }
        };

        match feature_verifier::verify(&text, &catalog) {
            VerificationOutcome::Passed { stats } => {
                println!(
                    "{} {} ({} steps)",
                    style("PASS").green().bold(),
                    path.display(),
                    stats.total(),
                );
            }
            VerificationOutcome::Failed { stats, diagnostics } => {
                any_failed = true;
                println!(
                    "{} {} ({} undefined, {} ambiguous of {} steps)",
                    style("FAIL").red().bold(),
                    path.display(),
                    stats.undefined,
                    stats.ambiguous,
                    stats.total(),
                );
                for diagnostic in &diagnostics {
                    println!("  {diagnostic}");
                }
                if !opts.force {
                    break;
                }
            }
            VerificationOutcome::Malformed { error } => {
                any_malformed = true;
                println!(
                    "{} {}: {error}",
                    style("MALFORMED").red().bold(),
                    path.display(),
                );
                if !opts.force {
                    break;
                }
            }
        }
    }

    if any_malformed {
        ExitCode::from(2)
    } else if any_failed {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

/// Expands the CLI paths into the ordered list of feature files to verify.
///
/// Every path must exist before anything is verified; directories are
/// walked for `*.feature` files, case-insensitively.
fn collect_feature_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>, String> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            let walker =
                globwalk::GlobWalkerBuilder::new(path, "*.feature")
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| {
                        format!("cannot walk {}: {e}", path.display())
                    })?;
            let mut found: Vec<_> = walker
                .filter_map(Result::ok)
                .map(|entry| entry.into_path())
                .collect();
            found.sort();
            files.extend(found);
        } else {
            return Err(format!(
                "feature file \"{}\" not exists!",
                path.display(),
            ));
        }
    }
    Ok(files)
}

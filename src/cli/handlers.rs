use serde_json::json;
use tracing::{info, warn};

use super::commands::Cli;
use crate::config::{DupConfig, Overrides};
use crate::duplicate::{DuplicatePlan, DuplicateReport, Duplicator};
use crate::error::{NotedupError, Result};
use crate::host::{Container, MemoryHost, NotesHost, OsascriptHost};
use crate::logging;
use crate::path::FolderPath;
use crate::resolve::{container_location, resolve_folder};

/// Result of one run, before printing. `location` is where the new folder
/// sits (or would sit) below its account.
pub enum Outcome {
    Planned {
        plan: DuplicatePlan,
        location: String,
    },
    Duplicated {
        report: DuplicateReport,
        location: String,
    },
}

pub fn handle_duplicate(cli: Cli) -> Result<()> {
    let raw = cli.path.clone().ok_or(NotedupError::MissingArgument)?;

    let config = DupConfig::load_or_default(cli.config.as_deref())?.apply(Overrides {
        strategy: cli.strategy,
        copy: cli.copy,
        recursive: cli.recursive_override(),
        suffix: cli.suffix,
    })?;
    logging::init(&config.log_level, cli.verbose);

    let path = FolderPath::parse(&raw)?;
    if !cli.json {
        println!("Looking for folder: {}", raw);
    }

    let outcome = match &cli.snapshot {
        Some(file) => {
            let host = MemoryHost::load(file)?;
            let outcome = run_duplicate(&host, &path, &config, cli.dry_run)?;
            if !cli.dry_run {
                host.save(file)?;
                info!(snapshot = %file.display(), "saved snapshot");
            }
            outcome
        }
        None => run_duplicate(&OsascriptHost::new(), &path, &config, cli.dry_run)?,
    };

    if cli.json {
        print_json(&outcome)?;
    } else {
        print_text(&outcome);
    }
    Ok(())
}

/// Resolve `path` and duplicate the folder it names, or only plan it.
pub fn run_duplicate(
    host: &dyn NotesHost,
    path: &FolderPath,
    config: &DupConfig,
    dry_run: bool,
) -> Result<Outcome> {
    let source = resolve_folder(host, path, config.strategy)?
        .ok_or_else(|| NotedupError::FolderNotFound(path.to_string()))?;

    let duplicator = Duplicator::new(host)
        .copy_strategy(config.copy)
        .recursive(config.recursive)
        .suffix(config.suffix.clone());

    let plan = duplicator.plan(&source)?;
    if dry_run {
        let location = match container_location(host, &plan.parent) {
            Ok(parent) => format!("{}/{}", parent, plan.new_name),
            Err(e) => typed_location(path, &plan.new_name, e),
        };
        return Ok(Outcome::Planned { plan, location });
    }

    let report = duplicator.execute(&plan)?;
    let location = container_location(host, &Container::Folder(report.folder.clone()))
        .unwrap_or_else(|e| typed_location(path, &report.new_name, e));
    Ok(Outcome::Duplicated { report, location })
}

/// Fall back to the path as typed when the real folder chain cannot be read.
fn typed_location(path: &FolderPath, new_name: &str, error: NotedupError) -> String {
    warn!(error = %error, "cannot read destination location");
    path.sibling(new_name)
}

fn print_text(outcome: &Outcome) {
    match outcome {
        Outcome::Planned { plan, location } => {
            println!("Found folder: {}", plan.source_name);
            println!();
            println!(
                "Dry run: would create folder \"{}\" with {} note(s)",
                plan.new_name, plan.notes
            );
            if plan.subfolders > 0 {
                println!(
                    "  plus {} subfolder(s) holding {} note(s)",
                    plan.subfolders, plan.nested_notes
                );
            }
            println!("Location: {}", location);
        }
        Outcome::Duplicated { report, location } => {
            println!("Found folder: {}", report.source_name);
            println!("Creating new folder: {}", report.new_name);
            println!("Found {} note(s) to copy", report.notes_total);
            for failure in &report.failures {
                println!(
                    "  Warning: Failed to copy note {} in {} ({}): {}",
                    failure.index, failure.folder, failure.name, failure.reason
                );
            }
            for skipped in &report.skipped_folders {
                println!("  Warning: Skipped folder {}", skipped);
            }
            println!();
            println!(
                "Success! Created folder \"{}\" with {} of {} note(s) copied",
                report.new_name, report.notes_copied, report.notes_total
            );
            if report.folders_created > 0 {
                println!("Recreated {} subfolder(s)", report.folders_created);
            }
            println!("Location: {}", location);
        }
    }
}

fn print_json(outcome: &Outcome) -> Result<()> {
    let value = match outcome {
        Outcome::Planned { plan, location } => json!({
            "dry_run": true,
            "location": location,
            "plan": plan,
        }),
        Outcome::Duplicated { report, location } => json!({
            "dry_run": false,
            "location": location,
            "report": report,
        }),
    };
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

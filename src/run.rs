//! Run orchestration: load, index, match, confirm, move, summarize.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use chrono::Local;
use colored::Colorize;

use crate::case_ids::load_case_ids;
use crate::config::Config;
use crate::index::{build_index, compile_excludes};
use crate::matching::match_case_ids;
use crate::mover::FolderMover;
use crate::report::{ReportWriter, ResumeState};
use crate::types::{RunOutcome, RunStats};
use crate::{print_bold, print_warning};

/// Execute one full run.
///
/// Startup failures (bad inputs, unreadable roots, invalid resume report)
/// return an error before any record is written; per-pair failures after
/// that become ERROR records and never abort the run.
pub fn run(config: &Config) -> Result<RunOutcome> {
    if config.debug {
        println!("{config:#?}");
    }

    let mut case_ids = load_case_ids(&config.case_ids_file, config.sheet.as_deref())?;
    if let Some(limit) = config.caseid_limit
        && case_ids.len() > limit
    {
        print_warning!("Processing only the first {limit} of {} CaseIDs", case_ids.len());
        case_ids.truncate(limit);
    }

    let excludes = compile_excludes(&config.exclude)?;
    let index = build_index(&config.source_root, &excludes, config.max_folders)?;

    let matches = match_case_ids(&case_ids, &index, config.case_sensitive);
    let matched_pairs: usize = matches.iter().map(|m| m.folders.len()).sum();
    let without_match = matches.iter().filter(|m| m.folders.is_empty()).count();

    let report_path = config.report.clone().unwrap_or_else(default_report_path);
    let resume = match &config.resume_from {
        Some(path) => {
            ensure_distinct_report(path, &report_path)?;
            ResumeState::load(path)?
        }
        None => ResumeState::default(),
    };

    print_bold!(
        "{} CaseIDs, {} indexed folders, {matched_pairs} matched pair(s), {without_match} CaseID(s) without a match",
        case_ids.len(),
        index.len()
    );
    if !resume.is_empty() {
        println!("Resuming: {} pair(s) already resolved in a prior run", resume.len());
    }
    if config.dry_run {
        println!("{}", "Dry run: nothing will be moved".cyan());
    } else if !config.yes && !confirm_move(matched_pairs)? {
        println!("Aborted, nothing moved");
        return Ok(RunOutcome {
            stats: RunStats::default(),
            limit_reached: false,
            unreadable_subtrees: index.unreadable_subtrees,
        });
    }

    let mut report = ReportWriter::create(&report_path)?;
    write_parameters(&mut report, config, case_ids.len(), index.len())?;

    let mut mover = FolderMover::new(
        config.dest_root.clone(),
        config.dry_run,
        config.collision,
        config.max_moves,
        config.verbose,
        &resume,
    );
    let limit_reached = mover.process(&matches, &mut report)?;
    if limit_reached
        && let Some(limit) = config.max_moves
    {
        print_warning!("Stopped after reaching the move limit ({limit})");
    }

    let stats = mover.stats().clone();
    print_summary(&stats, config.dry_run);
    if index.unreadable_subtrees > 0 {
        print_warning!(
            "Skipped {} unreadable subtree(s); their folders were not indexed",
            index.unreadable_subtrees
        );
    }
    println!("Report written to {}", report_path.display());

    Ok(RunOutcome {
        stats,
        limit_reached,
        unreadable_subtrees: index.unreadable_subtrees,
    })
}

fn default_report_path() -> PathBuf {
    PathBuf::from(format!("move_report_{}.csv", Local::now().format("%Y%m%d_%H%M%S")))
}

/// Fatal if the new report would overwrite the resume report. Creating the
/// report truncates the target, so writing over the resume input would
/// destroy the prior audit trail right after reading it.
fn ensure_distinct_report(resume_from: &Path, report: &Path) -> Result<()> {
    let resume_resolved = dunce::canonicalize(resume_from).unwrap_or_else(|_| resume_from.to_path_buf());
    if resume_resolved == resolve_report_target(report) {
        bail!(
            "Report path and resume report are the same file: '{}'. Use a different --report path",
            report.display()
        );
    }
    Ok(())
}

/// Resolve where the report will actually be created. The file itself may
/// not exist yet, so only the parent directory is canonicalized.
fn resolve_report_target(report: &Path) -> PathBuf {
    let file_name = report.file_name().unwrap_or_default();
    let parent = match report.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    dunce::canonicalize(parent).map_or_else(|_| report.to_path_buf(), |parent| parent.join(file_name))
}

fn confirm_move(pairs: usize) -> Result<bool> {
    print!("{}", format!("Move {pairs} folder(s)? (y/n): ").magenta());
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

/// Write the run parameters as preamble rows so a report is
/// self-describing when read later.
fn write_parameters(report: &mut ReportWriter, config: &Config, case_id_count: usize, folder_count: usize) -> Result<()> {
    report.write_parameter("version", env!("CARGO_PKG_VERSION"))?;
    report.write_parameter("case_ids_file", &config.case_ids_file.display().to_string())?;
    report.write_parameter("source_root", &config.source_root.display().to_string())?;
    report.write_parameter("dest_root", &config.dest_root.display().to_string())?;
    report.write_parameter("dry_run", &config.dry_run.to_string())?;
    report.write_parameter("collision", &format!("{:?}", config.collision).to_lowercase())?;
    report.write_parameter("case_sensitive", &config.case_sensitive.to_string())?;
    if !config.exclude.is_empty() {
        report.write_parameter("exclude", &config.exclude.join(";"))?;
    }
    if let Some(limit) = config.max_moves {
        report.write_parameter("max_moves", &limit.to_string())?;
    }
    if let Some(limit) = config.max_folders {
        report.write_parameter("max_folders", &limit.to_string())?;
    }
    if let Some(limit) = config.caseid_limit {
        report.write_parameter("caseid_limit", &limit.to_string())?;
    }
    if let Some(path) = &config.resume_from {
        report.write_parameter("resume_from", &path.display().to_string())?;
    }
    report.write_parameter("case_id_count", &case_id_count.to_string())?;
    report.write_parameter("indexed_folders", &folder_count.to_string())?;
    report.end_parameters()
}

fn print_summary(stats: &RunStats, dry_run: bool) {
    print_bold!("Summary:");
    if dry_run {
        println!("{}", format!("  Would move:    {}", stats.found_dryrun).cyan());
        println!("{}", format!("  Would rename:  {}", stats.found_dryrun_renamed).cyan());
    } else {
        println!("{}", format!("  Moved:         {}", stats.moved).green());
        println!("{}", format!("  Renamed:       {}", stats.moved_renamed).green());
    }
    if stats.not_found > 0 {
        println!("{}", format!("  Not found:     {}", stats.not_found).yellow());
    }
    if stats.skipped_missing > 0 {
        println!("{}", format!("  Source gone:   {}", stats.skipped_missing).yellow());
    }
    if stats.skipped_exists > 0 {
        println!("{}", format!("  Dest exists:   {}", stats.skipped_exists).yellow());
    }
    if stats.resume_skipped > 0 {
        println!("  Resume skips:  {}", stats.resume_skipped);
    }
    if stats.errors > 0 {
        println!("{}", format!("  Errors:        {}", stats.errors).red());
    }
}

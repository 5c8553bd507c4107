//! Collision resolution and the per-pair move state machine.

use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;

use crate::report::{ReportWriter, ResumeState};
use crate::types::{CaseMatch, CollisionPolicy, FolderEntry, MoveStatus, OutcomeRecord, RunStats};
use crate::{path_to_filename_string, path_to_string};

/// Resolve a unique destination path for `folder_name` under `dest_root`.
///
/// Probes `name`, `name_1`, `name_2`, ... against both the filesystem and
/// the names already claimed in this session. The claimed set is what keeps
/// suffix assignment deterministic for same-batch collisions and dry runs,
/// where earlier picks never hit the disk.
#[must_use]
pub fn resolve_destination(dest_root: &Path, folder_name: &str, claimed: &HashSet<String>) -> PathBuf {
    let candidate = dest_root.join(folder_name);
    if !candidate.exists() && !claimed.contains(folder_name) {
        return candidate;
    }
    let mut counter: u64 = 1;
    loop {
        let suffixed = format!("{folder_name}_{counter}");
        let candidate = dest_root.join(&suffixed);
        if !candidate.exists() && !claimed.contains(&suffixed) {
            return candidate;
        }
        counter += 1;
    }
}

/// Drives the decision sequence for each (CaseID, folder) pair and enforces
/// the max-moves safety limit.
///
/// Processing is fully sequential: a pair reaches a terminal state and its
/// record is flushed before the next pair starts, so an interrupted run
/// leaves a valid report and no in-flight work.
pub struct FolderMover<'a> {
    dest_root: PathBuf,
    dry_run: bool,
    collision: CollisionPolicy,
    max_moves: Option<usize>,
    verbose: bool,
    resume: &'a ResumeState,
    claimed: HashSet<String>,
    stats: RunStats,
    moves_done: usize,
}

impl<'a> FolderMover<'a> {
    #[must_use]
    pub fn new(
        dest_root: PathBuf,
        dry_run: bool,
        collision: CollisionPolicy,
        max_moves: Option<usize>,
        verbose: bool,
        resume: &'a ResumeState,
    ) -> Self {
        Self {
            dest_root,
            dry_run,
            collision,
            max_moves,
            verbose,
            resume,
            claimed: HashSet::new(),
            stats: RunStats::default(),
            moves_done: 0,
        }
    }

    #[must_use]
    pub const fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Process all matches in order (CaseID-major, match-order-minor),
    /// appending one record per pair to the report.
    ///
    /// Returns `true` when the max-moves limit stopped the run early.
    pub fn process(&mut self, matches: &[CaseMatch], report: &mut ReportWriter) -> Result<bool> {
        for case_match in matches {
            if case_match.folders.is_empty() {
                if self.resume.should_skip(&case_match.case_id, "") {
                    self.stats.resume_skipped += 1;
                    continue;
                }
                let record = OutcomeRecord::new(
                    &case_match.case_id,
                    MoveStatus::NotFound,
                    String::new(),
                    String::new(),
                    "No folder name contains this CaseID".to_string(),
                    false,
                );
                self.finish_pair(&record, report)?;
                continue;
            }

            let multi = case_match.is_multi();
            for folder in &case_match.folders {
                let source = path_to_string(&folder.path);
                if self.resume.should_skip(&case_match.case_id, &source) {
                    self.stats.resume_skipped += 1;
                    if self.verbose {
                        println!("{} {} ({source})", "resume-skip".dimmed(), case_match.case_id);
                    }
                    continue;
                }

                let record = self.process_pair(&case_match.case_id, folder, multi);
                let moved = matches!(record.status, MoveStatus::Moved | MoveStatus::MovedRenamed);
                self.finish_pair(&record, report)?;

                if moved && !self.dry_run {
                    self.moves_done += 1;
                    if let Some(limit) = self.max_moves
                        && self.moves_done >= limit
                    {
                        return Ok(true);
                    }
                }
            }
        }
        Ok(false)
    }

    fn finish_pair(&mut self, record: &OutcomeRecord, report: &mut ReportWriter) -> Result<()> {
        self.stats.record(record.status);
        if self.verbose {
            let status = match record.status {
                MoveStatus::Moved | MoveStatus::MovedRenamed => record.status.as_str().green(),
                MoveStatus::FoundDryrun | MoveStatus::FoundDryrunRenamed => record.status.as_str().cyan(),
                MoveStatus::Error => record.status.as_str().red(),
                _ => record.status.as_str().yellow(),
            };
            println!("{status} {}: {}", record.case_id, record.message);
        }
        report.write_record(record)
    }

    /// The per-pair state machine: existence check, destination pre-check,
    /// dry-run short-circuit, then the live move. Nothing here aborts the
    /// run; every failure becomes an ERROR record.
    fn process_pair(&mut self, case_id: &str, folder: &FolderEntry, multi: bool) -> OutcomeRecord {
        let source = path_to_string(&folder.path);

        if !folder.path.exists() {
            return OutcomeRecord::new(
                case_id,
                MoveStatus::SkippedMissing,
                source,
                String::new(),
                "Source folder no longer exists (may have been moved already)".to_string(),
                multi,
            );
        }
        if !folder.path.is_dir() {
            return OutcomeRecord::new(
                case_id,
                MoveStatus::Error,
                source,
                String::new(),
                "Source path is not a directory".to_string(),
                multi,
            );
        }

        if self.collision == CollisionPolicy::Skip {
            let occupied = self.dest_root.join(&folder.name);
            if occupied.exists() || self.claimed.contains(&folder.name) {
                return OutcomeRecord::new(
                    case_id,
                    MoveStatus::SkippedExists,
                    source,
                    path_to_string(&occupied),
                    "Destination already exists".to_string(),
                    multi,
                );
            }
        }

        let dest = resolve_destination(&self.dest_root, &folder.name, &self.claimed);
        let dest_name = path_to_filename_string(&dest);
        let renamed = dest_name != folder.name;
        self.claimed.insert(dest_name.clone());

        if self.dry_run {
            let status = if renamed {
                MoveStatus::FoundDryrunRenamed
            } else {
                MoveStatus::FoundDryrun
            };
            let message = if renamed {
                format!("Would move to {} (renamed from {} to {dest_name})", dest.display(), folder.name)
            } else {
                format!("Would move to {}", dest.display())
            };
            return OutcomeRecord::new(case_id, status, source, path_to_string(&dest), message, multi);
        }

        match self.perform_move(&folder.path, &dest) {
            Ok(()) => {
                let status = if renamed { MoveStatus::MovedRenamed } else { MoveStatus::Moved };
                let message = if renamed {
                    format!("Moved successfully (renamed from {} to {dest_name})", folder.name)
                } else {
                    "Moved successfully".to_string()
                };
                OutcomeRecord::new(case_id, status, source, path_to_string(&dest), message, multi)
            }
            Err(e) => OutcomeRecord::new(case_id, MoveStatus::Error, source, path_to_string(&dest), format!("{e:#}"), multi),
        }
    }

    fn perform_move(&self, source: &Path, dest: &Path) -> Result<()> {
        fs::create_dir_all(&self.dest_root)
            .with_context(|| format!("Failed to create destination root: '{}'", self.dest_root.display()))?;
        safe_move(source, dest)
    }
}

/// Move a folder with a single rename where possible, falling back to
/// copy-then-verify-then-delete for cross-device moves.
pub fn safe_move(source: &Path, dest: &Path) -> Result<()> {
    match fs::rename(source, dest) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::CrossesDevices => copy_and_delete(source, dest),
        Err(e) => Err(e).with_context(|| format!("Failed to move '{}' to '{}'", source.display(), dest.display())),
    }
}

fn copy_and_delete(source: &Path, dest: &Path) -> Result<()> {
    if let Err(e) = copy_dir_recursive(source, dest) {
        // Best-effort cleanup of the partial copy; the source is intact.
        let _ = fs::remove_dir_all(dest);
        return Err(e).with_context(|| format!("Failed to copy '{}' to '{}'", source.display(), dest.display()));
    }
    if !dest.exists() {
        anyhow::bail!("Copy appeared to succeed but destination not found: '{}'", dest.display());
    }
    fs::remove_dir_all(source)
        .with_context(|| format!("Moved via copy but failed to remove source: '{}'", source.display()))
}

fn copy_dir_recursive(source: &Path, dest: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dest)?;
    for entry in fs::read_dir(source)? {
        let entry = entry?;
        let target = dest.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), target)?;
        }
    }
    Ok(())
}

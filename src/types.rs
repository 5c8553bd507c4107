use std::fmt;
use std::path::PathBuf;

use chrono::Local;

/// Timestamp format used in report rows.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A folder discovered under the source root.
///
/// Identity is the path: two entries with the same base name in different
/// subtrees are distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FolderEntry {
    /// Base name, used for CaseID matching.
    pub name: String,
    /// Absolute path to the folder.
    pub path: PathBuf,
    /// Depth below the source root (informational only).
    pub depth: usize,
}

/// One CaseID together with every indexed folder whose name contains it.
#[derive(Debug, Clone)]
pub struct CaseMatch {
    pub case_id: String,
    /// Matched folders in index traversal order.
    pub folders: Vec<FolderEntry>,
}

impl CaseMatch {
    /// True when the CaseID matched more than one folder.
    #[must_use]
    pub fn is_multi(&self) -> bool {
        self.folders.len() > 1
    }
}

/// Outcome status written to the report.
///
/// The vocabulary is a persisted-state contract shared with the resume
/// reader; adding or renaming variants breaks resumability of old reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveStatus {
    Moved,
    MovedRenamed,
    FoundDryrun,
    FoundDryrunRenamed,
    NotFound,
    SkippedMissing,
    SkippedExists,
    Error,
}

impl MoveStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Moved => "MOVED",
            Self::MovedRenamed => "MOVED_RENAMED",
            Self::FoundDryrun => "FOUND_DRYRUN",
            Self::FoundDryrunRenamed => "FOUND_DRYRUN_RENAMED",
            Self::NotFound => "NOT_FOUND",
            Self::SkippedMissing => "SKIPPED_MISSING",
            Self::SkippedExists => "SKIPPED_EXISTS",
            Self::Error => "ERROR",
        }
    }

    /// Parse a status string from a report row.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "MOVED" => Some(Self::Moved),
            "MOVED_RENAMED" => Some(Self::MovedRenamed),
            "FOUND_DRYRUN" => Some(Self::FoundDryrun),
            "FOUND_DRYRUN_RENAMED" => Some(Self::FoundDryrunRenamed),
            "NOT_FOUND" => Some(Self::NotFound),
            "SKIPPED_MISSING" => Some(Self::SkippedMissing),
            "SKIPPED_EXISTS" => Some(Self::SkippedExists),
            "ERROR" => Some(Self::Error),
            _ => None,
        }
    }

    /// Whether a prior-run record with this status suppresses reprocessing.
    ///
    /// Dry-run statuses must always be reprocessed on a live run, and ERROR
    /// records are deliberately retried rather than skipped.
    #[must_use]
    pub const fn is_resume_skippable(self) -> bool {
        matches!(
            self,
            Self::Moved | Self::MovedRenamed | Self::NotFound | Self::SkippedMissing | Self::SkippedExists
        )
    }
}

impl fmt::Display for MoveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How to handle an already-existing destination name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Append `_1`, `_2`, ... until the name is free.
    #[default]
    Rename,
    /// Leave the source in place and record `SKIPPED_EXISTS`.
    Skip,
}

/// One immutable, append-only report entry.
#[derive(Debug, Clone)]
pub struct OutcomeRecord {
    pub timestamp: String,
    pub case_id: String,
    pub status: MoveStatus,
    pub source_path: String,
    pub dest_path: String,
    pub message: String,
    /// The CaseID matched more than one folder; rendered into the message
    /// text only at the report-serialization boundary.
    pub multi_match: bool,
}

impl OutcomeRecord {
    #[must_use]
    pub fn new(
        case_id: &str,
        status: MoveStatus,
        source_path: String,
        dest_path: String,
        message: String,
        multi_match: bool,
    ) -> Self {
        Self {
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            case_id: case_id.to_string(),
            status,
            source_path,
            dest_path,
            message,
            multi_match,
        }
    }
}

/// Per-status counters for the run summary.
#[derive(Debug, Default, Clone)]
pub struct RunStats {
    pub moved: usize,
    pub moved_renamed: usize,
    pub found_dryrun: usize,
    pub found_dryrun_renamed: usize,
    pub not_found: usize,
    pub skipped_missing: usize,
    pub skipped_exists: usize,
    pub errors: usize,
    /// Pairs suppressed by the resume state (no record written).
    pub resume_skipped: usize,
}

impl RunStats {
    pub fn record(&mut self, status: MoveStatus) {
        match status {
            MoveStatus::Moved => self.moved += 1,
            MoveStatus::MovedRenamed => self.moved_renamed += 1,
            MoveStatus::FoundDryrun => self.found_dryrun += 1,
            MoveStatus::FoundDryrunRenamed => self.found_dryrun_renamed += 1,
            MoveStatus::NotFound => self.not_found += 1,
            MoveStatus::SkippedMissing => self.skipped_missing += 1,
            MoveStatus::SkippedExists => self.skipped_exists += 1,
            MoveStatus::Error => self.errors += 1,
        }
    }

    #[must_use]
    pub const fn total_moved(&self) -> usize {
        self.moved + self.moved_renamed
    }

    #[must_use]
    pub const fn total_records(&self) -> usize {
        self.moved
            + self.moved_renamed
            + self.found_dryrun
            + self.found_dryrun_renamed
            + self.not_found
            + self.skipped_missing
            + self.skipped_exists
            + self.errors
    }
}

/// Result of a completed (possibly limit-stopped) run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub stats: RunStats,
    /// The max-moves limit stopped the run early (a clean stop, not an error).
    pub limit_reached: bool,
    /// Subtrees that could not be read during indexing.
    pub unreadable_subtrees: usize,
}

impl RunOutcome {
    #[must_use]
    pub const fn error_count(&self) -> usize {
        self.stats.errors
    }
}

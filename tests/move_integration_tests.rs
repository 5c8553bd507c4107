//! End-to-end tests driving a full run against real temp directories.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

use case_mover::config::Config;
use case_mover::report::read_report;
use case_mover::run::run;
use case_mover::types::CollisionPolicy;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: tempdir().expect("tempdir"),
        }
    }

    fn write_ids(&self, content: &str) {
        fs::write(self.dir.path().join("ids.csv"), content).expect("write ids");
    }

    fn mkdir(&self, relative: &str) -> PathBuf {
        let path = self.dir.path().join("source").join(relative);
        fs::create_dir_all(&path).expect("create folder");
        path
    }

    fn source(&self, relative: &str) -> PathBuf {
        self.dir.path().join("source").join(relative)
    }

    fn dest(&self, name: &str) -> PathBuf {
        self.dir.path().join("dest").join(name)
    }

    fn report_path(&self) -> PathBuf {
        self.dir.path().join("report.csv")
    }

    fn config(&self) -> Config {
        Config {
            case_ids_file: self.dir.path().join("ids.csv"),
            source_root: self.dir.path().join("source"),
            dest_root: self.dir.path().join("dest"),
            dry_run: false,
            yes: true,
            report: Some(self.report_path()),
            sheet: None,
            max_moves: None,
            max_folders: None,
            caseid_limit: None,
            collision: CollisionPolicy::Rename,
            exclude: Vec::new(),
            resume_from: None,
            case_sensitive: true,
            verbose: false,
            debug: false,
        }
    }
}

fn statuses(report: &Path) -> Vec<String> {
    read_report(report)
        .expect("read report")
        .into_iter()
        .map(|row| row.status)
        .collect()
}

#[test]
fn one_case_id_matching_two_folders_moves_both() {
    let ws = Workspace::new();
    ws.write_ids("00789\n");
    ws.mkdir("Case_00789_Active");
    ws.mkdir("2024/Case_00789_Renewed");

    let outcome = run(&ws.config()).expect("run");

    assert_eq!(outcome.stats.total_moved(), 2);
    assert!(ws.dest("Case_00789_Active").exists());
    assert!(ws.dest("Case_00789_Renewed").exists());

    let rows = read_report(&ws.report_path()).expect("read report");
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|row| row.case_id == "00789"));
    assert!(rows.iter().all(|row| row.message.contains("multiple matches")));
}

#[test]
fn same_name_collision_gets_numeric_suffix() {
    let ws = Workspace::new();
    ws.write_ids("00123\n");
    ws.mkdir("clients/Case_00123");
    ws.mkdir("archive/Case_00123");

    let outcome = run(&ws.config()).expect("run");

    assert_eq!(outcome.stats.moved, 1);
    assert_eq!(outcome.stats.moved_renamed, 1);
    assert!(ws.dest("Case_00123").exists());
    assert!(ws.dest("Case_00123_1").exists());

    let report_statuses = statuses(&ws.report_path());
    assert!(report_statuses.contains(&"MOVED".to_string()));
    assert!(report_statuses.contains(&"MOVED_RENAMED".to_string()));
}

#[test]
fn second_run_is_idempotent() {
    let ws = Workspace::new();
    ws.write_ids("00123\n");
    ws.mkdir("Case_00123");

    let first = run(&ws.config()).expect("first run");
    assert_eq!(first.stats.moved, 1);

    let second = run(&ws.config()).expect("second run");
    assert_eq!(second.stats.moved, 0);
    assert_eq!(second.stats.not_found, 1);
    assert!(!ws.dest("Case_00123_1").exists());
}

#[test]
fn dry_run_report_then_live_run() {
    let ws = Workspace::new();
    ws.write_ids("00123\n");
    ws.mkdir("Case_00123");

    let mut dry = ws.config();
    dry.dry_run = true;
    dry.report = Some(ws.dir.path().join("dry_report.csv"));
    run(&dry).expect("dry run");

    assert!(ws.source("Case_00123").exists());
    assert_eq!(statuses(&ws.dir.path().join("dry_report.csv")), vec!["FOUND_DRYRUN"]);

    // Dry-run records never suppress the live run.
    let mut live = ws.config();
    live.resume_from = Some(ws.dir.path().join("dry_report.csv"));
    let outcome = run(&live).expect("live run");

    assert_eq!(outcome.stats.moved, 1);
    assert!(ws.dest("Case_00123").exists());
}

#[test]
fn resume_skips_moved_pairs() {
    let ws = Workspace::new();
    ws.write_ids("00123\n00456\n");
    ws.mkdir("Case_00123");

    let first = run(&ws.config()).expect("first run");
    assert_eq!(first.stats.moved, 1);
    assert_eq!(first.stats.not_found, 1);

    // The folder reappears under the same path; a resumed run must not
    // touch it or re-record the NOT_FOUND CaseID.
    ws.mkdir("Case_00123");
    let mut resumed = ws.config();
    resumed.resume_from = Some(ws.report_path());
    resumed.report = Some(ws.dir.path().join("second_report.csv"));
    let outcome = run(&resumed).expect("resumed run");

    assert_eq!(outcome.stats.moved, 0);
    assert_eq!(outcome.stats.not_found, 0);
    assert_eq!(outcome.stats.resume_skipped, 2);
    assert!(ws.source("Case_00123").exists());
    assert!(read_report(&ws.dir.path().join("second_report.csv")).expect("read").is_empty());
}

#[test]
fn max_moves_limit_stops_the_run_cleanly() {
    let ws = Workspace::new();
    ws.write_ids("A\nB\nC\n");
    ws.mkdir("Folder_A");
    ws.mkdir("Folder_B");
    ws.mkdir("Folder_C");

    let mut config = ws.config();
    config.max_moves = Some(2);
    let outcome = run(&config).expect("run");

    assert!(outcome.limit_reached);
    assert_eq!(outcome.stats.total_moved(), 2);
    assert!(ws.source("Folder_C").exists());
    assert_eq!(statuses(&ws.report_path()).len(), 2);
}

#[test]
fn collision_skip_policy_leaves_sources() {
    let ws = Workspace::new();
    ws.write_ids("00123\n");
    ws.mkdir("Case_00123");
    fs::create_dir_all(ws.dest("Case_00123")).expect("occupy destination");

    let mut config = ws.config();
    config.collision = CollisionPolicy::Skip;
    let outcome = run(&config).expect("run");

    assert_eq!(outcome.stats.skipped_exists, 1);
    assert!(ws.source("Case_00123").exists());
    assert_eq!(statuses(&ws.report_path()), vec!["SKIPPED_EXISTS"]);
}

#[test]
fn excluded_subtrees_are_never_matched() {
    let ws = Workspace::new();
    ws.write_ids("00123\n");
    ws.mkdir("Archive/Case_00123");
    ws.mkdir("Active/Case_00123");

    let mut config = ws.config();
    config.exclude = vec!["Archive".to_string()];
    let outcome = run(&config).expect("run");

    assert_eq!(outcome.stats.moved, 1);
    assert!(ws.source("Archive/Case_00123").exists());
    assert!(!ws.source("Active/Case_00123").exists());
}

#[test]
fn case_insensitive_matching_is_opt_in() {
    let ws = Workspace::new();
    ws.write_ids("abc\n");
    ws.mkdir("Case_ABC_Files");

    let sensitive = run(&ws.config()).expect("sensitive run");
    assert_eq!(sensitive.stats.not_found, 1);

    let mut insensitive = ws.config();
    insensitive.case_sensitive = false;
    insensitive.report = Some(ws.dir.path().join("second_report.csv"));
    let outcome = run(&insensitive).expect("insensitive run");

    assert_eq!(outcome.stats.moved, 1);
    assert!(ws.dest("Case_ABC_Files").exists());
}

#[test]
fn matching_files_are_ignored() {
    let ws = Workspace::new();
    ws.write_ids("001\n002\n");
    ws.mkdir("Folder_002");
    // A plain file whose name contains CaseID 001 is never indexed.
    fs::write(ws.source("notes_001.txt"), "text").expect("write file");

    let outcome = run(&ws.config()).expect("run");

    assert_eq!(outcome.stats.moved, 1);
    assert_eq!(outcome.stats.not_found, 1);
    assert_eq!(outcome.error_count(), 0);
    assert!(ws.dest("Folder_002").exists());
    assert!(ws.source("notes_001.txt").exists());
}

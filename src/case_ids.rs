//! CaseID loading from tabular identifier sources.
//!
//! Every value is kept as a string so leading zeros survive. Values are
//! trimmed, empties dropped, and duplicates removed keeping the first
//! occurrence, in original order.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use itertools::Itertools;

use crate::path_to_string;

/// Load CaseIDs from a CSV/TSV file (first column) or a plain text file
/// (one identifier per line).
///
/// `sheet` exists for interface compatibility with spreadsheet sources;
/// spreadsheet parsing itself is not supported, so passing a sheet name or
/// an `.xlsx` path is a startup error.
pub fn load_case_ids(path: &Path, sheet: Option<&str>) -> Result<Vec<String>> {
    if !path.exists() {
        bail!("CaseID file does not exist: '{}'", path.display());
    }
    if !path.is_file() {
        bail!("CaseID path is not a file: '{}'", path.display());
    }

    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if extension == "xlsx" || extension == "xls" {
        bail!(
            "Spreadsheet workbooks are not supported: '{}'. Export the CaseID column to CSV first.",
            path.display()
        );
    }
    if let Some(name) = sheet {
        bail!("Sheet '{name}' was requested but '{}' is not a spreadsheet", path.display());
    }

    let case_ids = match extension.as_str() {
        "csv" => read_delimited(path, b',')?,
        "tsv" => read_delimited(path, b'\t')?,
        _ => read_lines(path)?,
    };

    if case_ids.is_empty() {
        bail!("No CaseIDs found in '{}'", path.display());
    }
    Ok(case_ids)
}

/// Read the first field of every row. All rows are data; a header row, if
/// present, is matched like any other identifier and simply never matches a
/// folder name.
fn read_delimited(path: &Path, delimiter: u8) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_path(path)
        .with_context(|| format!("Failed to open CaseID file: '{}'", path.display()))?;

    let mut values = Vec::new();
    for row in reader.records() {
        let row = row.with_context(|| format!("Failed to parse CaseID file: '{}'", path.display()))?;
        if let Some(field) = row.get(0) {
            values.push(field.to_string());
        }
    }
    Ok(clean(values))
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read CaseID file: '{}'", path_to_string(path)))?;
    Ok(clean(content.lines().map(str::to_string).collect()))
}

fn clean(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unique()
        .collect()
}

#[cfg(test)]
mod case_id_tests {
    use super::*;

    use std::fs::File;
    use std::io::Write;

    use tempfile::tempdir;

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).expect("create file");
        file.write_all(content.as_bytes()).expect("write file");
        path
    }

    #[test]
    fn loads_csv_first_column() {
        let dir = tempdir().expect("tempdir");
        let path = write_file(&dir, "ids.csv", "00123,extra\n00456,more\n");
        let ids = load_case_ids(&path, None).expect("load");
        assert_eq!(ids, vec!["00123", "00456"]);
    }

    #[test]
    fn preserves_leading_zeros() {
        let dir = tempdir().expect("tempdir");
        let path = write_file(&dir, "ids.csv", "00789\n0001\n");
        let ids = load_case_ids(&path, None).expect("load");
        assert_eq!(ids, vec!["00789", "0001"]);
    }

    #[test]
    fn deduplicates_keeping_first_occurrence() {
        let dir = tempdir().expect("tempdir");
        let path = write_file(&dir, "ids.txt", "B\nA\nB\nC\nA\n");
        let ids = load_case_ids(&path, None).expect("load");
        assert_eq!(ids, vec!["B", "A", "C"]);
    }

    #[test]
    fn trims_whitespace_and_drops_empty_values() {
        let dir = tempdir().expect("tempdir");
        let path = write_file(&dir, "ids.txt", "  001  \n\n   \n002\n");
        let ids = load_case_ids(&path, None).expect("load");
        assert_eq!(ids, vec!["001", "002"]);
    }

    #[test]
    fn duplicate_detection_happens_after_trimming() {
        let dir = tempdir().expect("tempdir");
        let path = write_file(&dir, "ids.txt", "001\n 001 \n");
        let ids = load_case_ids(&path, None).expect("load");
        assert_eq!(ids, vec!["001"]);
    }

    #[test]
    fn empty_file_is_an_error() {
        let dir = tempdir().expect("tempdir");
        let path = write_file(&dir, "ids.csv", "");
        assert!(load_case_ids(&path, None).is_err());
    }

    #[test]
    fn whitespace_only_file_is_an_error() {
        let dir = tempdir().expect("tempdir");
        let path = write_file(&dir, "ids.txt", "\n  \n\n");
        assert!(load_case_ids(&path, None).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = load_case_ids(Path::new("/nonexistent/ids.csv"), None);
        assert!(result.is_err());
    }

    #[test]
    fn xlsx_input_is_rejected() {
        let dir = tempdir().expect("tempdir");
        let path = write_file(&dir, "ids.xlsx", "binary");
        let result = load_case_ids(&path, None);
        assert!(result.is_err());
        let message = format!("{}", result.err().expect("error"));
        assert!(message.contains("CSV"));
    }

    #[test]
    fn sheet_name_with_csv_is_rejected() {
        let dir = tempdir().expect("tempdir");
        let path = write_file(&dir, "ids.csv", "001\n");
        assert!(load_case_ids(&path, Some("Sheet1")).is_err());
    }

    #[test]
    fn tsv_uses_tab_delimiter() {
        let dir = tempdir().expect("tempdir");
        let path = write_file(&dir, "ids.tsv", "00123\tcomment\n00456\tother\n");
        let ids = load_case_ids(&path, None).expect("load");
        assert_eq!(ids, vec!["00123", "00456"]);
    }

    #[test]
    fn quoted_csv_values_are_unquoted() {
        let dir = tempdir().expect("tempdir");
        let path = write_file(&dir, "ids.csv", "\"00123\"\n\"A, B\"\n");
        let ids = load_case_ids(&path, None).expect("load");
        assert_eq!(ids, vec!["00123", "A, B"]);
    }
}

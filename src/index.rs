//! Recursive folder indexing under the source root.

use std::path::Path;

use anyhow::Result;
use glob::Pattern;
use walkdir::WalkDir;

use crate::os_str_to_string;
use crate::types::FolderEntry;

/// Snapshot of candidate folders, taken once per run.
///
/// A folder created after the walk started is invisible for the run.
#[derive(Debug, Default)]
pub struct FolderIndex {
    /// Accepted folders in deterministic traversal order.
    pub folders: Vec<FolderEntry>,
    /// Subtrees skipped because they could not be read.
    pub unreadable_subtrees: usize,
}

impl FolderIndex {
    #[must_use]
    pub fn len(&self) -> usize {
        self.folders.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }
}

/// Walk the tree under `root` and collect every directory.
///
/// Traversal is depth-first with entries sorted by file name, so the index
/// order is reproducible across runs against an unchanged tree. A folder
/// whose base name matches any exclude pattern is pruned together with its
/// subtree. `max_folders` caps accepted entries and yields a partial,
/// non-representative scan; it exists for bounded testing only.
pub fn build_index(root: &Path, excludes: &[Pattern], max_folders: Option<usize>) -> Result<FolderIndex> {
    let root = crate::resolve_existing_dir(root, "source root")?;

    let mut index = FolderIndex::default();
    let mut walker = WalkDir::new(&root).min_depth(1).sort_by_file_name().into_iter();

    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(_) => {
                index.unreadable_subtrees += 1;
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }

        let name = os_str_to_string(entry.file_name());
        if excludes.iter().any(|pattern| pattern.matches(&name)) {
            walker.skip_current_dir();
            continue;
        }

        index.folders.push(FolderEntry {
            name,
            path: entry.path().to_path_buf(),
            depth: entry.depth(),
        });

        if let Some(limit) = max_folders
            && index.folders.len() >= limit
        {
            break;
        }
    }

    Ok(index)
}

/// Compile exclude pattern strings, failing fast on an invalid pattern.
pub fn compile_excludes(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|raw| Pattern::new(raw).map_err(|e| anyhow::anyhow!("Invalid exclude pattern '{raw}': {e}")))
        .collect()
}

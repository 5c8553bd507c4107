//! CaseID to folder-name matching.

use crate::index::FolderIndex;
use crate::types::CaseMatch;

/// Match each CaseID against the folder index.
///
/// Returns one `CaseMatch` per CaseID in input order. A folder matches when
/// its base name contains the CaseID as a contiguous substring; CaseIDs are
/// never coerced to numbers, so `00789` does not match `Case_789`. Matched
/// folders keep the index traversal order.
#[must_use]
pub fn match_case_ids(case_ids: &[String], index: &FolderIndex, case_sensitive: bool) -> Vec<CaseMatch> {
    // Lowered names computed once; the per-ID loop is O(ids * folders).
    let lowered: Vec<String> = if case_sensitive {
        Vec::new()
    } else {
        index.folders.iter().map(|f| f.name.to_lowercase()).collect()
    };

    case_ids
        .iter()
        .map(|case_id| {
            let needle = if case_sensitive {
                case_id.clone()
            } else {
                case_id.to_lowercase()
            };
            let folders = index
                .folders
                .iter()
                .enumerate()
                .filter(|(i, folder)| {
                    if case_sensitive {
                        folder.name.contains(&needle)
                    } else {
                        lowered[*i].contains(&needle)
                    }
                })
                .map(|(_, folder)| folder.clone())
                .collect();
            CaseMatch {
                case_id: case_id.clone(),
                folders,
            }
        })
        .collect()
}

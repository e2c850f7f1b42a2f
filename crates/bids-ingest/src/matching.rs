//! Resolving folder and file names to mapping rows.
//!
//! Two entry points exist on purpose: subject folders and waveform files
//! are different kinds of names, and the orchestrator and the physio
//! scanner each call their own. Both test whether a row's raw identifier
//! is contained in the given name and keep the first row in table order.

use bids_model::{MappingRow, MatchOutcome, MatchStrategy};

/// Resolve a subject folder name (e.g. `0012_Study`) to a mapping row.
pub fn match_subject_folder<'a>(
    folder_name: &str,
    rows: &'a [MappingRow],
    strategy: MatchStrategy,
) -> MatchOutcome<'a> {
    resolve(folder_name, rows, strategy)
}

/// Resolve a waveform file name (e.g. `0012_rest.puls`) to a mapping row.
pub fn match_physio_file<'a>(
    file_name: &str,
    rows: &'a [MappingRow],
    strategy: MatchStrategy,
) -> MatchOutcome<'a> {
    resolve(file_name, rows, strategy)
}

fn resolve<'a>(name: &str, rows: &'a [MappingRow], strategy: MatchStrategy) -> MatchOutcome<'a> {
    let mut hits = rows
        .iter()
        .filter(|row| contains_raw_id(name, &row.raw_id, strategy));
    let Some(chosen) = hits.next() else {
        return MatchOutcome::Unmatched;
    };
    let also: Vec<&MappingRow> = hits.collect();
    if also.is_empty() {
        MatchOutcome::Unique(chosen)
    } else {
        MatchOutcome::Ambiguous { chosen, also }
    }
}

/// Whether `raw_id` occurs in `name` under `strategy`.
///
/// An empty raw identifier never matches.
pub fn contains_raw_id(name: &str, raw_id: &str, strategy: MatchStrategy) -> bool {
    if raw_id.is_empty() {
        return false;
    }
    match strategy {
        MatchStrategy::Substring => name.contains(raw_id),
        MatchStrategy::Token => name.match_indices(raw_id).any(|(start, _)| {
            let before = name[..start].chars().next_back();
            let after = name[start + raw_id.len()..].chars().next();
            !before.is_some_and(|c| c.is_ascii_alphanumeric())
                && !after.is_some_and(|c| c.is_ascii_alphanumeric())
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_requires_delimited_occurrence() {
        assert!(contains_raw_id("sub-110-visit1", "110", MatchStrategy::Token));
        assert!(!contains_raw_id("sub-110-visit1", "10", MatchStrategy::Token));
        assert!(contains_raw_id("0012_Study", "0012", MatchStrategy::Token));
        assert!(contains_raw_id("AB-12", "AB-12", MatchStrategy::Token));
        assert!(!contains_raw_id("0012_Study", "012", MatchStrategy::Token));
    }

    #[test]
    fn substring_matches_anywhere() {
        assert!(contains_raw_id("sub-110-visit1", "10", MatchStrategy::Substring));
        assert!(!contains_raw_id("sub-110-visit1", "", MatchStrategy::Substring));
        assert!(!contains_raw_id("sub-110-visit1", "", MatchStrategy::Token));
    }
}

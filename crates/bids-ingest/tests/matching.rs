//! Tests for folder and file name matching.

use bids_ingest::{match_physio_file, match_subject_folder};
use bids_model::{MappingRow, MatchOutcome, MatchStrategy};
use proptest::prelude::*;

fn rows(pairs: &[(&str, &str)]) -> Vec<MappingRow> {
    pairs
        .iter()
        .enumerate()
        .map(|(index, (raw, anon))| MappingRow::new(*raw, *anon).with_row_number(index + 2))
        .collect()
}

#[test]
fn ambiguous_table_picks_first_row_in_table_order() {
    let table = rows(&[("10", "A10"), ("110", "A110")]);

    let outcome = match_subject_folder("sub-110-visit1", &table, MatchStrategy::Substring);

    assert!(outcome.is_ambiguous());
    let chosen = outcome.chosen().expect("a row matched");
    assert_eq!(chosen.raw_id, "10");
    assert_eq!(outcome.alternatives(), vec!["110".to_string()]);
}

#[test]
fn ambiguous_table_resolves_with_token_strategy() {
    let table = rows(&[("10", "A10"), ("110", "A110")]);

    let outcome = match_subject_folder("sub-110-visit1", &table, MatchStrategy::Token);

    assert_eq!(outcome, MatchOutcome::Unique(&table[1]));
}

#[test]
fn unmatched_folder() {
    let table = rows(&[("0012", "A1"), ("0099", "A2")]);

    let outcome = match_subject_folder("9999_Study", &table, MatchStrategy::Substring);

    assert_eq!(outcome, MatchOutcome::Unmatched);
    assert!(outcome.chosen().is_none());
}

#[test]
fn empty_raw_id_never_matches() {
    let table = rows(&[("", "A0"), ("0012", "A1")]);

    let outcome = match_subject_folder("0012_Study", &table, MatchStrategy::Substring);

    assert_eq!(outcome, MatchOutcome::Unique(&table[1]));
}

#[test]
fn physio_file_matches_on_file_name() {
    let table = rows(&[("0012", "A1"), ("0099", "A2")]);

    let outcome = match_physio_file("0099_rest_run1.puls", &table, MatchStrategy::Substring);

    assert_eq!(outcome.chosen().map(|row| row.anonymized_id.as_str()), Some("A2"));
}

proptest! {
    #[test]
    fn matches_iff_some_raw_id_is_contained(
        raw_ids in prop::collection::vec("[0-9]{1,4}", 1..6),
        name in "[0-9a-z_]{0,12}",
    ) {
        let table: Vec<MappingRow> = raw_ids
            .iter()
            .map(|raw| MappingRow::new(raw.clone(), format!("A{raw}")))
            .collect();

        let outcome = match_subject_folder(&name, &table, MatchStrategy::Substring);
        let expected = table.iter().position(|row| name.contains(row.raw_id.as_str()));

        match expected {
            Some(index) => {
                let chosen = outcome.chosen().expect("expected a match");
                prop_assert!(std::ptr::eq(chosen, &table[index]));
            }
            None => prop_assert_eq!(outcome, MatchOutcome::Unmatched),
        }
    }

    #[test]
    fn token_match_implies_substring_match(
        raw in "[0-9]{1,4}",
        name in "[0-9a-z_-]{0,12}",
    ) {
        let table = vec![MappingRow::new(raw, "A")];
        let token = match_subject_folder(&name, &table, MatchStrategy::Token);
        let substring = match_subject_folder(&name, &table, MatchStrategy::Substring);
        if token.chosen().is_some() {
            prop_assert!(substring.chosen().is_some());
        }
    }
}

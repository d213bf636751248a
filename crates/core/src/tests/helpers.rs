// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{AcceptedImport, BallotContext, ImportOutcome};
use tally_domain::{
    BallotType, Domain, EntityRegistry, EntityResult, ImportErrorKind, Table,
};

pub const ZG_2017: &str = r#"{
    "principal": {"canton": "zg"},
    "entities": {
        "2017": {
            "1701": {"name": "Baar", "district": "Zug"},
            "1702": {"name": "Cham", "district": "Zug"},
            "1703": {"name": "Hünenberg", "district": "Zug"},
            "1704": {"name": "Menzingen", "district": "Zug"},
            "1705": {"name": "Neuheim", "district": "Zug"},
            "1706": {"name": "Oberägeri", "district": "Zug"},
            "1707": {"name": "Risch", "district": "Zug"},
            "1708": {"name": "Steinhausen", "district": "Zug"},
            "1709": {"name": "Unterägeri", "district": "Zug"},
            "1710": {"name": "Walchwil", "district": "Zug"},
            "1711": {"name": "Zug", "district": "Zug"}
        }
    }
}"#;

pub fn create_test_registry() -> EntityRegistry {
    EntityRegistry::from_json(ZG_2017).unwrap()
}

pub fn create_test_context() -> BallotContext {
    BallotContext::new(2017, Domain::Federation)
}

pub fn create_complex_context() -> BallotContext {
    let mut context: BallotContext = create_test_context();
    context.ballot_types = BallotType::ALL.to_vec();
    context
}

/// Builds a table from comma separated lines, the first being the header.
pub fn csv_table(lines: &[&str]) -> Table {
    Table::from_rows(
        lines
            .iter()
            .map(|line| line.split(',').map(ToString::to_string).collect())
            .collect(),
    )
}

pub fn accepted(outcome: ImportOutcome) -> AcceptedImport {
    match outcome {
        ImportOutcome::Accepted(accepted) => accepted,
        ImportOutcome::Rejected(errors) => panic!("expected acceptance, got {errors:?}"),
    }
}

/// Sorted `(row, message)` pairs of a rejected outcome.
pub fn rejection(outcome: &ImportOutcome) -> Vec<(Option<usize>, String)> {
    assert!(!outcome.is_accepted(), "expected rejection");
    let mut errors: Vec<(Option<usize>, String)> = outcome
        .errors()
        .iter()
        .map(|err| (err.row_number, err.message.clone()))
        .collect();
    errors.sort();
    errors.dedup();
    errors
}

pub fn kinds(outcome: &ImportOutcome) -> Vec<ImportErrorKind> {
    outcome.errors().iter().map(|err| err.kind).collect()
}

pub fn counted_ids(results: &[EntityResult]) -> Vec<u32> {
    results
        .iter()
        .filter(|result| result.counted)
        .map(|result| result.entity_id)
        .collect()
}

pub fn uncounted_ids(results: &[EntityResult]) -> Vec<u32> {
    results
        .iter()
        .filter(|result| !result.counted)
        .map(|result| result.entity_id)
        .collect()
}

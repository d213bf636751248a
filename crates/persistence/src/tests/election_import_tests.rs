// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::{
    candidate, create_majorz_election, create_test_election, create_test_persistence,
    election_entity, election_import, party, party_import, proporz_results,
};
use crate::{ElectionData, ExportTable, NewElection, Persistence, PersistenceError};
use tally::ElectionContext;
use tally_domain::{CandidateResult, Domain, ElectionResults, ElectionType, PartyResult, Status};

#[test]
fn test_add_election_keeps_its_configuration() {
    let mut persistence: Persistence = create_test_persistence();
    let mut election: NewElection = create_majorz_election();
    election.has_expats = true;
    election.domain = Domain::District;
    election.domain_segment = Some(String::from("Zug"));
    let election_id: i64 = persistence.add_election(&election).unwrap();

    let stored: ElectionData = persistence.get_election(election_id).unwrap().unwrap();
    assert_eq!(stored.election_type, ElectionType::Majorz);
    assert_eq!(stored.status, None);
    assert_eq!(stored.absolute_majority, None);

    let context: ElectionContext = stored.context();
    assert_eq!(context.year, 2022);
    assert_eq!(context.domain, Domain::District);
    assert_eq!(context.domain_segment.as_deref(), Some("Zug"));
    assert!(context.has_expats);
    assert_eq!(context.election_type, ElectionType::Majorz);
}

#[test]
fn test_apply_election_import_stores_every_table() {
    let mut persistence: Persistence = create_test_persistence();
    let election_id: i64 = persistence.add_election(&create_test_election()).unwrap();
    let mut results: ElectionResults = proporz_results(&[1701, 1702], "101", 40);
    results.entity_results.push(election_entity(1703, false));

    let written: usize = persistence
        .apply_election_import(
            election_id,
            &election_import(results.clone(), Some(Status::Interim)),
        )
        .unwrap();

    assert_eq!(written, 3);
    assert_eq!(persistence.count_election_results(election_id).unwrap(), 3);
    let stored: ElectionResults = persistence.load_election_results(election_id).unwrap();
    assert_eq!(stored, results);
    assert_eq!(stored.candidate_votes("101"), 80);

    let election: ElectionData = persistence.get_election(election_id).unwrap().unwrap();
    assert_eq!(election.status, Some(Status::Interim));
    assert!(election.last_result_change.is_some());
}

#[test]
fn test_election_reimport_replaces_the_previous_snapshot() {
    let mut persistence: Persistence = create_test_persistence();
    let election_id: i64 = persistence.add_election(&create_test_election()).unwrap();
    persistence
        .apply_election_import(
            election_id,
            &election_import(proporz_results(&[1701, 1702, 1703], "101", 40), None),
        )
        .unwrap();

    persistence
        .apply_election_import(
            election_id,
            &election_import(proporz_results(&[1711], "202", 7), Some(Status::Final)),
        )
        .unwrap();

    let stored: ElectionResults = persistence.load_election_results(election_id).unwrap();
    let entity_ids: Vec<u32> = stored
        .entity_results
        .iter()
        .map(|result| result.entity_id)
        .collect();
    assert_eq!(entity_ids, vec![1711]);
    assert_eq!(stored.candidates.len(), 1);
    assert_eq!(stored.candidates[0].candidate_id, "202");
    assert_eq!(
        stored.candidate_results,
        vec![CandidateResult {
            entity_id: 1711,
            candidate_id: String::from("202"),
            votes: 7,
        }]
    );
    assert_eq!(stored.list_results.len(), 1);
}

#[test]
fn test_election_import_leaves_party_results_alone() {
    let mut persistence: Persistence = create_test_persistence();
    let election_id: i64 = persistence.add_election(&create_test_election()).unwrap();
    persistence
        .apply_party_import(election_id, &party_import(vec![party(2022, "1", 600)], None))
        .unwrap();

    persistence
        .apply_election_import(
            election_id,
            &election_import(proporz_results(&[1701], "101", 40), None),
        )
        .unwrap();

    let parties: Vec<PartyResult> = persistence.load_party_results(election_id).unwrap();
    assert_eq!(parties.len(), 1);
}

#[test]
fn test_election_import_into_missing_election_fails() {
    let mut persistence: Persistence = create_test_persistence();

    let result: Result<usize, PersistenceError> = persistence
        .apply_election_import(42, &election_import(proporz_results(&[1701], "101", 40), None));

    assert_eq!(result, Err(PersistenceError::ElectionNotFound(42)));
    assert!(matches!(
        persistence.load_election_results(42),
        Err(PersistenceError::ElectionNotFound(42))
    ));
}

#[test]
fn test_candidate_export_of_proporz_election() {
    let mut persistence: Persistence = create_test_persistence();
    let election_id: i64 = persistence.add_election(&create_test_election()).unwrap();
    let mut results: ElectionResults = proporz_results(&[1701], "101", 40);
    results.entity_results.push(election_entity(1702, false));
    persistence
        .apply_election_import(election_id, &election_import(results, Some(Status::Final)))
        .unwrap();

    let table: ExportTable = persistence.candidate_export(election_id).unwrap();

    assert_eq!(table.header.len(), 20);
    assert_eq!(table.header[0], "election_status");
    assert_eq!(table.header[19], "list_votes");
    // Placeholder entities carry no candidate rows.
    assert_eq!(table.rows.len(), 1);
    assert_eq!(
        table.rows[0],
        vec![
            "final", "1701", "true", "1000", "0", "600", "10", "5", "0", "0", "Family 101",
            "Anna", "101", "false", "40", "FDP", "FDP", "01", "1", "80",
        ]
    );
}

#[test]
fn test_candidate_export_of_majorz_election_carries_absolute_majority() {
    let mut persistence: Persistence = create_test_persistence();
    let election_id: i64 = persistence.add_election(&create_majorz_election()).unwrap();
    let results: ElectionResults = ElectionResults {
        absolute_majority: Some(1234),
        entity_results: vec![election_entity(1701, true)],
        candidates: vec![candidate("7", None)],
        candidate_results: vec![CandidateResult {
            entity_id: 1701,
            candidate_id: String::from("7"),
            votes: 300,
        }],
        ..ElectionResults::default()
    };
    persistence
        .apply_election_import(election_id, &election_import(results, None))
        .unwrap();

    let election: ElectionData = persistence.get_election(election_id).unwrap().unwrap();
    assert_eq!(election.absolute_majority, Some(1234));

    let table: ExportTable = persistence.candidate_export(election_id).unwrap();
    assert_eq!(table.header.last().map(String::as_str), Some("election_absolute_majority"));
    assert_eq!(table.rows[0][0], "unknown");
    assert_eq!(table.rows[0].last().map(String::as_str), Some("1234"));
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::helpers::{
    ELECTION_HEADER, accepted, create_proporz_election, create_test_persistence,
    create_test_registry, csv_bytes,
};
use crate::{ApiError, ImportSource, import_election_results, parse_election_type};
use tally::ImportOutcome;
use tally_domain::{ElectionResults, ElectionType, EntityRegistry, ImportErrorKind, Status};
use tally_persistence::{ElectionData, Persistence};

const BAAR_ANNA: &str =
    "final,1701,true,1000,600,10,5,3,2,Muster,Anna,101,true,300,FDP,FDP,01,1,550";
const BAAR_BEAT: &str =
    "final,1701,true,1000,600,10,5,3,2,Beispiel,Beat,102,false,200,FDP,FDP,01,1,550";
const CHAM_ANNA: &str =
    "interim,1702,true,800,400,0,4,0,0,Muster,Anna,101,true,250,FDP,FDP,01,1,380";

fn election_source(lines: &[&str]) -> ImportSource {
    ImportSource::new("candidates.csv", "text/csv", csv_bytes(lines))
}

#[test]
fn test_accepted_election_import_is_stored_with_placeholders() {
    let mut persistence: Persistence = create_test_persistence();
    let registry: EntityRegistry = create_test_registry();
    let election_id: i64 = create_proporz_election(&mut persistence);

    let outcome: ImportOutcome = import_election_results(
        &mut persistence,
        &registry,
        election_id,
        &election_source(&[ELECTION_HEADER, BAAR_ANNA, BAAR_BEAT, CHAM_ANNA]),
    )
    .unwrap();

    assert!(accepted(&outcome).election_results.is_some());
    assert_eq!(persistence.count_election_results(election_id).unwrap(), 5);
    let stored: ElectionResults = persistence.load_election_results(election_id).unwrap();
    assert_eq!(stored.counted_entities(), 2);
    assert_eq!(stored.candidates.len(), 2);
    assert_eq!(stored.candidate_votes("101"), 550);
    assert_eq!(stored.list_results.len(), 2);

    let election: ElectionData = persistence.get_election(election_id).unwrap().unwrap();
    assert_eq!(election.status, Some(Status::Interim));
    assert!(election.last_result_change.is_some());
}

#[test]
fn test_rejected_election_import_keeps_stored_results() {
    let mut persistence: Persistence = create_test_persistence();
    let registry: EntityRegistry = create_test_registry();
    let election_id: i64 = create_proporz_election(&mut persistence);
    import_election_results(
        &mut persistence,
        &registry,
        election_id,
        &election_source(&[ELECTION_HEADER, BAAR_ANNA]),
    )
    .unwrap();

    let outcome: ImportOutcome = import_election_results(
        &mut persistence,
        &registry,
        election_id,
        &election_source(&[ELECTION_HEADER, CHAM_ANNA, CHAM_ANNA]),
    )
    .unwrap();

    assert!(!outcome.is_accepted());
    assert_eq!(outcome.errors()[0].kind, ImportErrorKind::DuplicateEntity);
    assert_eq!(outcome.errors()[0].row_number, Some(3));
    assert_eq!(outcome.errors()[0].filename.as_deref(), Some("candidates.csv"));
    let stored: ElectionResults = persistence.load_election_results(election_id).unwrap();
    assert_eq!(stored.counted_entities(), 1);
    assert_eq!(stored.entity_results[0].entity_id, 1701);
}

#[test]
fn test_election_import_into_missing_election() {
    let mut persistence: Persistence = create_test_persistence();

    let result: Result<ImportOutcome, ApiError> = import_election_results(
        &mut persistence,
        &create_test_registry(),
        99,
        &election_source(&[ELECTION_HEADER, BAAR_ANNA]),
    );

    assert!(matches!(result, Err(ApiError::ResourceNotFound { .. })));
}

#[test]
fn test_parse_election_type() {
    assert_eq!(parse_election_type("majorz").unwrap(), ElectionType::Majorz);
    assert!(matches!(
        parse_election_type("mixed"),
        Err(ApiError::InvalidInput { .. })
    ));
}

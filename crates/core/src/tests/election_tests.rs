// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::helpers::{accepted, create_test_registry, csv_table, kinds, rejection};
use crate::{AcceptedImport, ElectionContext, ImportOutcome, import_election_table};
use tally_domain::{
    Candidate, CandidateResult, Domain, ElectionEntityResult, ElectionList, ElectionResults,
    ElectionType, EntityRegistry, ImportErrorKind, ListResult, Status,
};

const HEADER: &str = "election_status,entity_id,entity_counted,entity_eligible_voters,\
entity_received_ballots,entity_blank_ballots,entity_invalid_ballots,entity_blank_votes,\
entity_invalid_votes,candidate_family_name,candidate_first_name,candidate_id,candidate_elected,\
candidate_votes,candidate_party,list_name,list_id,list_number_of_mandates,list_votes";

const MAJORZ_HEADER: &str = "election_status,entity_id,entity_counted,entity_eligible_voters,\
entity_received_ballots,entity_blank_ballots,entity_invalid_ballots,entity_blank_votes,\
entity_invalid_votes,candidate_family_name,candidate_first_name,candidate_id,candidate_elected,\
candidate_votes,election_absolute_majority";

/// One proporz row with fixed ballot figures.
fn row(entity: &str, counted: bool, candidate: &str, votes: &str, list: &str) -> String {
    format!(
        "final,{entity},{counted},1000,600,10,5,3,2,Family {candidate},Anna,{candidate},false,\
         {votes},FDP,List {list},{list},2,550"
    )
}

fn proporz_context() -> ElectionContext {
    ElectionContext::new(2017, Domain::Federation, ElectionType::Proporz)
}

fn import(lines: &[String], context: &ElectionContext) -> ImportOutcome {
    let registry: EntityRegistry = create_test_registry();
    let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
    import_election_table(&csv_table(&lines), &registry, context)
}

fn election(outcome: ImportOutcome) -> (AcceptedImport, ElectionResults) {
    let mut accepted: AcceptedImport = accepted(outcome);
    let results: ElectionResults = accepted.election_results.take().unwrap();
    (accepted, results)
}

#[test]
fn test_proporz_rows_build_lists_candidates_and_placeholders() {
    let outcome: ImportOutcome = import(
        &[
            HEADER.to_string(),
            row("1701", true, "101", "300", "01"),
            row("1701", true, "102", "200", "01"),
            row("1702", true, "101", "250", "01"),
            row("1702", true, "201", "90", "02"),
        ],
        &proporz_context(),
    );
    let (accepted, results) = election(outcome);

    assert_eq!(accepted.status, Some(Status::Final));
    assert!(accepted.entity_results.is_empty());
    assert_eq!(results.entity_results.len(), 11);
    assert_eq!(results.counted_entities(), 2);
    let baar: &ElectionEntityResult = &results.entity_results[0];
    assert_eq!(baar.entity_id, 1701);
    assert_eq!(baar.name, "Baar");
    assert_eq!(baar.received_ballots, 600);
    assert_eq!(baar.invalid_votes, 2);

    assert_eq!(
        results.lists,
        vec![
            ElectionList {
                list_id: String::from("01"),
                name: String::from("List 01"),
                number_of_mandates: 2,
            },
            ElectionList {
                list_id: String::from("02"),
                name: String::from("List 02"),
                number_of_mandates: 2,
            },
        ]
    );
    let candidate_ids: Vec<&str> = results
        .candidates
        .iter()
        .map(|candidate| candidate.candidate_id.as_str())
        .collect();
    assert_eq!(candidate_ids, vec!["101", "102", "201"]);
    assert_eq!(results.candidates[2].list_id.as_deref(), Some("02"));
    assert_eq!(results.candidates[0].party.as_deref(), Some("FDP"));

    assert_eq!(results.candidate_results.len(), 4);
    assert_eq!(results.candidate_votes("101"), 550);
    assert_eq!(
        results.list_results,
        vec![
            ListResult {
                entity_id: 1701,
                list_id: String::from("01"),
                votes: 550,
            },
            ListResult {
                entity_id: 1702,
                list_id: String::from("01"),
                votes: 550,
            },
            ListResult {
                entity_id: 1702,
                list_id: String::from("02"),
                votes: 550,
            },
        ]
    );
}

#[test]
fn test_uncounted_entity_keeps_its_rows_without_votes() {
    let outcome: ImportOutcome = import(
        &[HEADER.to_string(), row("1703", false, "101", "300", "01")],
        &proporz_context(),
    );
    let (_, results) = election(outcome);

    let entity: &ElectionEntityResult = results
        .entity_results
        .iter()
        .find(|result| result.entity_id == 1703)
        .unwrap();
    assert!(!entity.counted);
    assert_eq!(entity.eligible_voters, 0);
    assert_eq!(entity.received_ballots, 0);
    assert_eq!(
        results.candidate_results,
        vec![CandidateResult {
            entity_id: 1703,
            candidate_id: String::from("101"),
            votes: 0,
        }]
    );
    assert_eq!(results.list_results[0].votes, 0);
}

#[test]
fn test_candidate_twice_in_one_entity_is_rejected() {
    let outcome: ImportOutcome = import(
        &[
            HEADER.to_string(),
            row("1701", true, "101", "300", "01"),
            row("1701", true, "101", "310", "01"),
            row("1702", true, "101", "310", "01"),
        ],
        &proporz_context(),
    );

    assert_eq!(
        rejection(&outcome),
        vec![(Some(3), String::from("1701 was found twice for candidate 101"))]
    );
    assert_eq!(kinds(&outcome), vec![ImportErrorKind::DuplicateEntity]);
}

#[test]
fn test_every_problem_of_a_row_is_reported() {
    let outcome: ImportOutcome = import(
        &[
            HEADER.to_string(),
            String::from(
                "done,9999,true,1000,x,10,5,3,2,Muster,Anna,,false,300,FDP,FDP,a b,2,550",
            ),
        ],
        &proporz_context(),
    );

    assert_eq!(
        rejection(&outcome),
        vec![
            (Some(2), String::from("9999 is unknown")),
            (Some(2), String::from("Empty value: candidate_id")),
            (Some(2), String::from("Invalid integer: entity_received_ballots")),
            (Some(2), String::from("Invalid status")),
            (Some(2), String::from("Not an alphanumeric: list_id")),
        ]
    );
}

#[test]
fn test_election_sanity_violations_reject_the_file() {
    let outcome: ImportOutcome = import(
        &[
            HEADER.to_string(),
            String::from(
                "final,1701,true,1000,1200,10,5,3,2,Muster,Anna,101,false,300,FDP,FDP,01,2,550",
            ),
        ],
        &proporz_context(),
    );

    assert_eq!(
        rejection(&outcome),
        vec![(Some(2), String::from("More received ballots than eligible voters"))]
    );
    assert_eq!(kinds(&outcome), vec![ImportErrorKind::SanityViolation]);
}

#[test]
fn test_unknown_rows_are_skipped_once_the_entity_resolves() {
    let outcome: ImportOutcome = import(
        &[
            HEADER.to_string(),
            row("1701", true, "101", "unbekannt", "01"),
        ],
        &proporz_context(),
    );
    let (accepted, results) = election(outcome);

    assert_eq!(accepted.skipped, 1);
    assert_eq!(results.counted_entities(), 0);
    assert_eq!(results.entity_results.len(), 11);
    assert!(results.candidates.is_empty());

    let outcome: ImportOutcome = import(
        &[
            HEADER.to_string(),
            row("9999", true, "101", "unknown", "01"),
        ],
        &proporz_context(),
    );
    assert_eq!(
        rejection(&outcome),
        vec![(Some(2), String::from("9999 is unknown"))]
    );
}

#[test]
fn test_expats_rows_without_expats_are_dropped() {
    let lines: Vec<String> = vec![HEADER.to_string(), row("0", true, "101", "30", "01")];

    let outcome: ImportOutcome = import(&lines, &proporz_context());
    assert_eq!(kinds(&outcome), vec![ImportErrorKind::NoDataFound]);

    let mut context: ElectionContext = proporz_context();
    context.has_expats = true;
    let (_, results) = election(import(&lines, &context));
    assert_eq!(results.entity_results.len(), 12);
    assert_eq!(results.entity_results[0].entity_id, 0);
    assert!(results.entity_results[0].counted);
}

#[test]
fn test_proporz_requires_list_columns() {
    let outcome: ImportOutcome = import(
        &[
            MAJORZ_HEADER.to_string(),
            String::from("final,1701,true,1000,600,10,5,3,2,Muster,Anna,101,true,300,250"),
        ],
        &proporz_context(),
    );

    assert_eq!(kinds(&outcome), vec![ImportErrorKind::HeaderMismatch]);
    assert_eq!(
        outcome.errors()[0].message,
        "Missing columns: 'list_name, list_id, list_number_of_mandates, list_votes'"
    );
}

#[test]
fn test_majorz_candidates_stand_without_lists() {
    let context: ElectionContext =
        ElectionContext::new(2017, Domain::Federation, ElectionType::Majorz);
    let outcome: ImportOutcome = import(
        &[
            MAJORZ_HEADER.to_string(),
            String::from(",1701,true,1000,600,10,5,3,2,Muster,Anna,101,true,300,250"),
            String::from(",1702,true,800,400,0,4,0,0,Beispiel,Beat,102,false,120,"),
        ],
        &context,
    );
    let (accepted, results) = election(outcome);

    // An empty status cell reads as unknown.
    assert_eq!(accepted.status, Some(Status::Unknown));
    assert_eq!(results.absolute_majority, Some(250));
    assert!(results.lists.is_empty());
    assert!(results.list_results.is_empty());
    assert_eq!(
        results.candidates[0],
        Candidate {
            candidate_id: String::from("101"),
            family_name: String::from("Muster"),
            first_name: String::from("Anna"),
            elected: true,
            party: None,
            list_id: None,
        }
    );
}

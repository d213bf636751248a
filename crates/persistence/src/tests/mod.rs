// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod election_import_tests;

use std::collections::BTreeMap;
use tally::AcceptedImport;
use tally_domain::{
    BallotType, Candidate, CandidateResult, Domain, ElectionEntityResult, ElectionList,
    ElectionResults, ElectionType, EntityInfo, EntityResult, ListResult, PanachageResult,
    PartyResult, Status,
};

use crate::{NewElection, NewVote, Persistence};

pub fn create_test_persistence() -> Persistence {
    Persistence::new_in_memory().expect("in-memory database")
}

pub fn create_test_vote() -> NewVote {
    NewVote::new("Vote on roads", 2017, Domain::Federation)
}

pub fn create_complex_vote() -> NewVote {
    let mut vote: NewVote = NewVote::new("Initiative and counter proposal", 2017, Domain::Canton);
    vote.ballot_types = BallotType::ALL.to_vec();
    vote.has_expats = true;
    vote
}

pub fn create_test_election() -> NewElection {
    NewElection::new("Cantonal parliament", 2022)
}

pub fn create_majorz_election() -> NewElection {
    let mut election: NewElection = NewElection::new("Council of States", 2022);
    election.election_type = ElectionType::Majorz;
    election.domain = Domain::Canton;
    election
}

pub fn entity(entity_id: u32, yeas: u32, nays: u32) -> EntityResult {
    EntityResult {
        entity_id,
        name: format!("Entity {entity_id}"),
        district: String::from("Zug"),
        counted: true,
        eligible_voters: yeas + nays + 10,
        expats: 0,
        yeas,
        nays,
        empty: 1,
        invalid: 2,
    }
}

pub fn vote_import(
    ballots: Vec<(BallotType, Vec<EntityResult>)>,
    status: Option<Status>,
) -> AcceptedImport {
    AcceptedImport {
        entity_results: ballots.into_iter().collect::<BTreeMap<_, _>>(),
        status,
        ..AcceptedImport::default()
    }
}

pub fn party(year: i32, party_id: &str, votes: u32) -> PartyResult {
    PartyResult {
        year,
        total_votes: 1000,
        party_id: party_id.to_string(),
        name: format!("Party {party_id}"),
        color: Some(String::from("#112233")),
        mandates: 1,
        votes,
        voters_count: Some(String::from("12.50")),
        voters_count_percentage: None,
    }
}

pub fn panachage(source: &str, target: &str, votes: u32) -> PanachageResult {
    PanachageResult {
        source: source.to_string(),
        target: target.to_string(),
        votes,
    }
}

pub fn party_import(
    parties: Vec<PartyResult>,
    panachage: Option<Vec<PanachageResult>>,
) -> AcceptedImport {
    AcceptedImport {
        party_results: Some(parties),
        panachage_results: panachage,
        ..AcceptedImport::default()
    }
}

pub fn election_entity(entity_id: u32, counted: bool) -> ElectionEntityResult {
    let info: EntityInfo = EntityInfo {
        name: format!("Entity {entity_id}"),
        district: String::from("Zug"),
        ..EntityInfo::default()
    };
    let mut result: ElectionEntityResult = ElectionEntityResult::not_counted(entity_id, &info);
    if counted {
        result.counted = true;
        result.eligible_voters = 1000;
        result.received_ballots = 600;
        result.blank_ballots = 10;
        result.invalid_ballots = 5;
    }
    result
}

pub fn candidate(candidate_id: &str, list_id: Option<&str>) -> Candidate {
    Candidate {
        candidate_id: candidate_id.to_string(),
        family_name: format!("Family {candidate_id}"),
        first_name: String::from("Anna"),
        elected: false,
        party: Some(String::from("FDP")),
        list_id: list_id.map(ToString::to_string),
    }
}

/// A proportional snapshot: one list, one candidate per entity.
pub fn proporz_results(entity_ids: &[u32], candidate_id: &str, votes: u32) -> ElectionResults {
    ElectionResults {
        absolute_majority: None,
        entity_results: entity_ids
            .iter()
            .map(|entity_id| election_entity(*entity_id, true))
            .collect(),
        lists: vec![ElectionList {
            list_id: String::from("01"),
            name: String::from("FDP"),
            number_of_mandates: 1,
        }],
        candidates: vec![candidate(candidate_id, Some("01"))],
        list_results: entity_ids
            .iter()
            .map(|entity_id| ListResult {
                entity_id: *entity_id,
                list_id: String::from("01"),
                votes: votes * 2,
            })
            .collect(),
        candidate_results: entity_ids
            .iter()
            .map(|entity_id| CandidateResult {
                entity_id: *entity_id,
                candidate_id: candidate_id.to_string(),
                votes,
            })
            .collect(),
    }
}

pub fn election_import(results: ElectionResults, status: Option<Status>) -> AcceptedImport {
    AcceptedImport {
        election_results: Some(results),
        status,
        ..AcceptedImport::default()
    }
}

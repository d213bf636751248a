// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Stored results laid out so they can be imported again unchanged.

use diesel::SqliteConnection;
use std::collections::{BTreeMap, BTreeSet};
use tally_domain::{
    BLANK_LIST_ID, Candidate, ElectionEntityResult, ElectionList, ElectionResults, ElectionType,
    EntityResult, PanachageResult, PartyResult, Status,
};

use super::candidates::load_election_results;
use super::results::{load_ballot_results, load_panachage_results, load_party_results};
use super::targets::{get_election, get_vote};
use crate::data_models::{ElectionData, ExportTable, VoteData};
use crate::error::PersistenceError;

const VOTE_COLUMNS: [&str; 10] = [
    "status",
    "type",
    "entity_id",
    "counted",
    "yeas",
    "nays",
    "invalid",
    "empty",
    "eligible_voters",
    "expats",
];

const PARTY_COLUMNS: [&str; 9] = [
    "year",
    "total_votes",
    "id",
    "name",
    "color",
    "mandates",
    "votes",
    "voters_count",
    "voters_count_percentage",
];

const PANACHAGE_PREFIX: &str = "panachage_votes_from_";

const CANDIDATE_COLUMNS: [&str; 16] = [
    "election_status",
    "entity_id",
    "entity_counted",
    "entity_eligible_voters",
    "entity_expats",
    "entity_received_ballots",
    "entity_blank_ballots",
    "entity_invalid_ballots",
    "entity_blank_votes",
    "entity_invalid_votes",
    "candidate_family_name",
    "candidate_first_name",
    "candidate_id",
    "candidate_elected",
    "candidate_votes",
    "candidate_party",
];

const LIST_COLUMNS: [&str; 4] = [
    "list_name",
    "list_id",
    "list_number_of_mandates",
    "list_votes",
];

fn vote_row(status: Status, ballot: &str, result: &EntityResult) -> Vec<String> {
    vec![
        status.to_string(),
        ballot.to_string(),
        result.entity_id.to_string(),
        result.counted.to_string(),
        result.yeas.to_string(),
        result.nays.to_string(),
        result.invalid.to_string(),
        result.empty.to_string(),
        result.eligible_voters.to_string(),
        result.expats.to_string(),
    ]
}

/// Exports the stored results of a vote in the internal format.
///
/// One row per ballot and entity, placeholders included. A vote that never
/// received results exports its header only.
///
/// # Errors
///
/// Returns an error if the vote does not exist or a query fails.
pub fn vote_export(
    conn: &mut SqliteConnection,
    vote_id: i64,
) -> Result<ExportTable, PersistenceError> {
    let vote: VoteData =
        get_vote(conn, vote_id)?.ok_or(PersistenceError::VoteNotFound(vote_id))?;
    let status: Status = vote.status.unwrap_or(Status::Unknown);

    let mut table: ExportTable = ExportTable {
        header: VOTE_COLUMNS.iter().map(ToString::to_string).collect(),
        rows: Vec::new(),
    };
    for (ballot_type, results) in load_ballot_results(conn, vote_id)? {
        table.rows.extend(
            results
                .iter()
                .map(|result| vote_row(status, ballot_type.as_str(), result)),
        );
    }
    Ok(table)
}

/// Exports the stored party results of an election in the party format.
///
/// Panachage votes become one `panachage_votes_from_<list>` column per
/// source list, filled on the rows of the election year only. Votes from the
/// blank list use the list id `999`.
///
/// # Errors
///
/// Returns an error if the election does not exist or a query fails.
pub fn election_export(
    conn: &mut SqliteConnection,
    election_id: i64,
) -> Result<ExportTable, PersistenceError> {
    let election: ElectionData =
        get_election(conn, election_id)?.ok_or(PersistenceError::ElectionNotFound(election_id))?;
    let parties: Vec<PartyResult> = load_party_results(conn, election_id)?;
    let panachage: Vec<PanachageResult> = load_panachage_results(conn, election_id)?;

    let source_id = |source: &str| -> String {
        if source.is_empty() {
            BLANK_LIST_ID.to_string()
        } else {
            source.to_string()
        }
    };
    let sources: BTreeSet<String> = panachage
        .iter()
        .map(|result| source_id(&result.source))
        .collect();
    let votes: BTreeMap<(String, &str), u32> = panachage
        .iter()
        .map(|result| ((source_id(&result.source), result.target.as_str()), result.votes))
        .collect();

    let mut header: Vec<String> = PARTY_COLUMNS.iter().map(ToString::to_string).collect();
    header.extend(sources.iter().map(|source| format!("{PANACHAGE_PREFIX}{source}")));

    let rows: Vec<Vec<String>> = parties
        .iter()
        .map(|party| {
            let mut row: Vec<String> = vec![
                party.year.to_string(),
                party.total_votes.to_string(),
                party.party_id.clone(),
                party.name.clone(),
                party.color.clone().unwrap_or_default(),
                party.mandates.to_string(),
                party.votes.to_string(),
                party.voters_count.clone().unwrap_or_default(),
                party.voters_count_percentage.clone().unwrap_or_default(),
            ];
            for source in &sources {
                let cell: String = if party.year == election.year {
                    votes
                        .get(&(source.clone(), party.party_id.as_str()))
                        .map(ToString::to_string)
                        .unwrap_or_default()
                } else {
                    String::new()
                };
                row.push(cell);
            }
            row
        })
        .collect();

    Ok(ExportTable { header, rows })
}

fn entity_cells(status: Status, result: &ElectionEntityResult) -> Vec<String> {
    vec![
        status.to_string(),
        result.entity_id.to_string(),
        result.counted.to_string(),
        result.eligible_voters.to_string(),
        result.expats.to_string(),
        result.received_ballots.to_string(),
        result.blank_ballots.to_string(),
        result.invalid_ballots.to_string(),
        result.blank_votes.to_string(),
        result.invalid_votes.to_string(),
    ]
}

/// Exports the stored candidate results of an election in the internal
/// election format.
///
/// One row per candidate and entity. Entities that only hold a placeholder
/// have no candidate rows and are left out; an import of the export
/// synthesizes them again.
///
/// # Errors
///
/// Returns an error if the election does not exist or a query fails.
pub fn candidate_export(
    conn: &mut SqliteConnection,
    election_id: i64,
) -> Result<ExportTable, PersistenceError> {
    let election: ElectionData =
        get_election(conn, election_id)?.ok_or(PersistenceError::ElectionNotFound(election_id))?;
    let results: ElectionResults = load_election_results(conn, election_id)?;
    let status: Status = election.status.unwrap_or(Status::Unknown);
    let proporz: bool = election.election_type == ElectionType::Proporz;

    let mut header: Vec<String> = CANDIDATE_COLUMNS.iter().map(ToString::to_string).collect();
    if proporz {
        header.extend(LIST_COLUMNS.iter().map(ToString::to_string));
    } else {
        header.push(String::from("election_absolute_majority"));
    }

    let entities: BTreeMap<u32, &ElectionEntityResult> = results
        .entity_results
        .iter()
        .map(|result| (result.entity_id, result))
        .collect();
    let candidates: BTreeMap<&str, &Candidate> = results
        .candidates
        .iter()
        .map(|candidate| (candidate.candidate_id.as_str(), candidate))
        .collect();
    let lists: BTreeMap<&str, &ElectionList> = results
        .lists
        .iter()
        .map(|list| (list.list_id.as_str(), list))
        .collect();
    let list_votes: BTreeMap<(u32, &str), u32> = results
        .list_results
        .iter()
        .map(|result| ((result.entity_id, result.list_id.as_str()), result.votes))
        .collect();

    let mut rows: Vec<Vec<String>> = Vec::with_capacity(results.candidate_results.len());
    for result in &results.candidate_results {
        let (Some(entity), Some(candidate)) = (
            entities.get(&result.entity_id),
            candidates.get(result.candidate_id.as_str()),
        ) else {
            return Err(PersistenceError::InvalidRecord(format!(
                "Candidate result {}/{} has no entity or candidate",
                result.entity_id, result.candidate_id
            )));
        };

        let mut row: Vec<String> = entity_cells(status, entity);
        row.extend([
            candidate.family_name.clone(),
            candidate.first_name.clone(),
            candidate.candidate_id.clone(),
            candidate.elected.to_string(),
            result.votes.to_string(),
            candidate.party.clone().unwrap_or_default(),
        ]);
        if proporz {
            let list: Option<&ElectionList> = candidate
                .list_id
                .as_deref()
                .and_then(|list_id| lists.get(list_id).copied());
            row.extend([
                list.map(|list| list.name.clone()).unwrap_or_default(),
                list.map(|list| list.list_id.clone()).unwrap_or_default(),
                list.map(|list| list.number_of_mandates.to_string())
                    .unwrap_or_default(),
                list.and_then(|list| list_votes.get(&(result.entity_id, list.list_id.as_str())))
                    .map(ToString::to_string)
                    .unwrap_or_default(),
            ]);
        } else {
            row.push(
                results
                    .absolute_majority
                    .map(|majority| majority.to_string())
                    .unwrap_or_default(),
            );
        }
        rows.push(row);
    }

    Ok(ExportTable { header, rows })
}

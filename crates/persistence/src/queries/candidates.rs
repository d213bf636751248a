// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;
use tally_domain::{
    Candidate, CandidateResult, ElectionEntityResult, ElectionList, ElectionResults, ListResult,
};

use super::targets::get_election;
use super::to_u32;
use crate::data_models::ElectionData;
use crate::diesel_schema::{
    candidate_results, candidates, election_lists, election_results, list_results,
};
use crate::error::PersistenceError;

#[derive(Queryable, Selectable)]
#[diesel(table_name = election_results)]
struct ElectionResultRow {
    entity_id: i64,
    name: String,
    district: String,
    counted: i32,
    eligible_voters: i64,
    expats: i64,
    received_ballots: i64,
    blank_ballots: i64,
    invalid_ballots: i64,
    blank_votes: i64,
    invalid_votes: i64,
}

impl TryFrom<ElectionResultRow> for ElectionEntityResult {
    type Error = PersistenceError;

    fn try_from(row: ElectionResultRow) -> Result<Self, Self::Error> {
        Ok(Self {
            entity_id: to_u32(row.entity_id, "entity_id")?,
            name: row.name,
            district: row.district,
            counted: row.counted != 0,
            eligible_voters: to_u32(row.eligible_voters, "eligible_voters")?,
            expats: to_u32(row.expats, "expats")?,
            received_ballots: to_u32(row.received_ballots, "received_ballots")?,
            blank_ballots: to_u32(row.blank_ballots, "blank_ballots")?,
            invalid_ballots: to_u32(row.invalid_ballots, "invalid_ballots")?,
            blank_votes: to_u32(row.blank_votes, "blank_votes")?,
            invalid_votes: to_u32(row.invalid_votes, "invalid_votes")?,
        })
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = candidates)]
struct CandidateRow {
    candidate_id: String,
    family_name: String,
    first_name: String,
    elected: i32,
    party: Option<String>,
    list_id: Option<String>,
}

impl From<CandidateRow> for Candidate {
    fn from(row: CandidateRow) -> Self {
        Self {
            candidate_id: row.candidate_id,
            family_name: row.family_name,
            first_name: row.first_name,
            elected: row.elected != 0,
            party: row.party,
            list_id: row.list_id,
        }
    }
}

/// Loads everything an election import stored, ordered by entity, list and
/// candidate id.
///
/// # Errors
///
/// Returns an error if the election does not exist, the query fails or a
/// stored value is invalid.
pub fn load_election_results(
    conn: &mut SqliteConnection,
    election_id: i64,
) -> Result<ElectionResults, PersistenceError> {
    let election: ElectionData =
        get_election(conn, election_id)?.ok_or(PersistenceError::ElectionNotFound(election_id))?;

    let entity_rows: Vec<ElectionResultRow> = election_results::table
        .filter(election_results::election_id.eq(election_id))
        .order(election_results::entity_id.asc())
        .select(ElectionResultRow::as_select())
        .load(conn)?;
    let entity_results: Vec<ElectionEntityResult> = entity_rows
        .into_iter()
        .map(ElectionEntityResult::try_from)
        .collect::<Result<_, _>>()?;

    let lists: Vec<ElectionList> = election_lists::table
        .filter(election_lists::election_id.eq(election_id))
        .order(election_lists::list_id.asc())
        .select((
            election_lists::list_id,
            election_lists::name,
            election_lists::number_of_mandates,
        ))
        .load::<(String, String, i64)>(conn)?
        .into_iter()
        .map(|(list_id, name, mandates)| {
            Ok(ElectionList {
                list_id,
                name,
                number_of_mandates: to_u32(mandates, "number_of_mandates")?,
            })
        })
        .collect::<Result<_, PersistenceError>>()?;

    let candidate_rows: Vec<CandidateRow> = candidates::table
        .filter(candidates::election_id.eq(election_id))
        .order(candidates::candidate_id.asc())
        .select(CandidateRow::as_select())
        .load(conn)?;

    let list_results: Vec<ListResult> = list_results::table
        .filter(list_results::election_id.eq(election_id))
        .order((list_results::entity_id.asc(), list_results::list_id.asc()))
        .select((list_results::entity_id, list_results::list_id, list_results::votes))
        .load::<(i64, String, i64)>(conn)?
        .into_iter()
        .map(|(entity_id, list_id, votes)| {
            Ok(ListResult {
                entity_id: to_u32(entity_id, "entity_id")?,
                list_id,
                votes: to_u32(votes, "votes")?,
            })
        })
        .collect::<Result<_, PersistenceError>>()?;

    let candidate_results: Vec<CandidateResult> = candidate_results::table
        .filter(candidate_results::election_id.eq(election_id))
        .order((
            candidate_results::entity_id.asc(),
            candidate_results::candidate_id.asc(),
        ))
        .select((
            candidate_results::entity_id,
            candidate_results::candidate_id,
            candidate_results::votes,
        ))
        .load::<(i64, String, i64)>(conn)?
        .into_iter()
        .map(|(entity_id, candidate_id, votes)| {
            Ok(CandidateResult {
                entity_id: to_u32(entity_id, "entity_id")?,
                candidate_id,
                votes: to_u32(votes, "votes")?,
            })
        })
        .collect::<Result<_, PersistenceError>>()?;

    Ok(ElectionResults {
        absolute_majority: election.absolute_majority,
        entity_results,
        lists,
        candidates: candidate_rows.into_iter().map(Candidate::from).collect(),
        list_results,
        candidate_results,
    })
}

/// Counts the stored entity results of an election.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn count_election_results(
    conn: &mut SqliteConnection,
    election_id: i64,
) -> Result<i64, PersistenceError> {
    Ok(election_results::table
        .filter(election_results::election_id.eq(election_id))
        .count()
        .get_result(conn)?)
}

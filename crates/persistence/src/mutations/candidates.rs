// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;
use tally::AcceptedImport;
use tally_domain::{Candidate, ElectionEntityResult, ElectionResults};
use tracing::{debug, info};

use super::now_timestamp;
use crate::diesel_schema::{
    candidate_results, candidates, election_lists, election_results, elections, list_results,
};
use crate::error::PersistenceError;

#[derive(Insertable)]
#[diesel(table_name = election_results)]
struct NewElectionResultRow<'a> {
    election_id: i64,
    entity_id: i64,
    name: &'a str,
    district: &'a str,
    counted: i32,
    eligible_voters: i64,
    expats: i64,
    received_ballots: i64,
    blank_ballots: i64,
    invalid_ballots: i64,
    blank_votes: i64,
    invalid_votes: i64,
}

impl<'a> NewElectionResultRow<'a> {
    fn new(election_id: i64, result: &'a ElectionEntityResult) -> Self {
        Self {
            election_id,
            entity_id: i64::from(result.entity_id),
            name: &result.name,
            district: &result.district,
            counted: i32::from(result.counted),
            eligible_voters: i64::from(result.eligible_voters),
            expats: i64::from(result.expats),
            received_ballots: i64::from(result.received_ballots),
            blank_ballots: i64::from(result.blank_ballots),
            invalid_ballots: i64::from(result.invalid_ballots),
            blank_votes: i64::from(result.blank_votes),
            invalid_votes: i64::from(result.invalid_votes),
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = candidates)]
struct NewCandidateRow<'a> {
    election_id: i64,
    candidate_id: &'a str,
    family_name: &'a str,
    first_name: &'a str,
    elected: i32,
    party: Option<&'a str>,
    list_id: Option<&'a str>,
}

impl<'a> NewCandidateRow<'a> {
    fn new(election_id: i64, candidate: &'a Candidate) -> Self {
        Self {
            election_id,
            candidate_id: &candidate.candidate_id,
            family_name: &candidate.family_name,
            first_name: &candidate.first_name,
            elected: i32::from(candidate.elected),
            party: candidate.party.as_deref(),
            list_id: candidate.list_id.as_deref(),
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = election_lists)]
struct NewListRow<'a> {
    election_id: i64,
    list_id: &'a str,
    name: &'a str,
    number_of_mandates: i64,
}

#[derive(Insertable)]
#[diesel(table_name = candidate_results)]
struct NewCandidateResultRow<'a> {
    election_id: i64,
    entity_id: i64,
    candidate_id: &'a str,
    votes: i64,
}

#[derive(Insertable)]
#[diesel(table_name = list_results)]
struct NewListResultRow<'a> {
    election_id: i64,
    entity_id: i64,
    list_id: &'a str,
    votes: i64,
}

/// Deletes every candidate, list and entity result of an election.
fn clear_election(conn: &mut SqliteConnection, election_id: i64) -> Result<usize, PersistenceError> {
    let mut removed: usize = 0;
    removed += diesel::delete(
        candidate_results::table.filter(candidate_results::election_id.eq(election_id)),
    )
    .execute(conn)?;
    removed += diesel::delete(list_results::table.filter(list_results::election_id.eq(election_id)))
        .execute(conn)?;
    removed += diesel::delete(candidates::table.filter(candidates::election_id.eq(election_id)))
        .execute(conn)?;
    removed +=
        diesel::delete(election_lists::table.filter(election_lists::election_id.eq(election_id)))
            .execute(conn)?;
    removed += diesel::delete(
        election_results::table.filter(election_results::election_id.eq(election_id)),
    )
    .execute(conn)?;
    Ok(removed)
}

fn insert_election(
    conn: &mut SqliteConnection,
    election_id: i64,
    results: &ElectionResults,
) -> Result<usize, PersistenceError> {
    let entity_rows: Vec<NewElectionResultRow<'_>> = results
        .entity_results
        .iter()
        .map(|result| NewElectionResultRow::new(election_id, result))
        .collect();
    let written: usize = if entity_rows.is_empty() {
        0
    } else {
        diesel::insert_into(election_results::table)
            .values(&entity_rows)
            .execute(conn)?
    };

    let list_rows: Vec<NewListRow<'_>> = results
        .lists
        .iter()
        .map(|list| NewListRow {
            election_id,
            list_id: &list.list_id,
            name: &list.name,
            number_of_mandates: i64::from(list.number_of_mandates),
        })
        .collect();
    if !list_rows.is_empty() {
        diesel::insert_into(election_lists::table)
            .values(&list_rows)
            .execute(conn)?;
    }

    let candidate_rows: Vec<NewCandidateRow<'_>> = results
        .candidates
        .iter()
        .map(|candidate| NewCandidateRow::new(election_id, candidate))
        .collect();
    if !candidate_rows.is_empty() {
        diesel::insert_into(candidates::table)
            .values(&candidate_rows)
            .execute(conn)?;
    }

    let list_result_rows: Vec<NewListResultRow<'_>> = results
        .list_results
        .iter()
        .map(|result| NewListResultRow {
            election_id,
            entity_id: i64::from(result.entity_id),
            list_id: &result.list_id,
            votes: i64::from(result.votes),
        })
        .collect();
    if !list_result_rows.is_empty() {
        diesel::insert_into(list_results::table)
            .values(&list_result_rows)
            .execute(conn)?;
    }

    let candidate_result_rows: Vec<NewCandidateResultRow<'_>> = results
        .candidate_results
        .iter()
        .map(|result| NewCandidateResultRow {
            election_id,
            entity_id: i64::from(result.entity_id),
            candidate_id: &result.candidate_id,
            votes: i64::from(result.votes),
        })
        .collect();
    if !candidate_result_rows.is_empty() {
        diesel::insert_into(candidate_results::table)
            .values(&candidate_result_rows)
            .execute(conn)?;
    }

    debug!(
        election_id,
        entities = entity_rows.len(),
        lists = list_rows.len(),
        candidates = candidate_rows.len(),
        list_results = list_result_rows.len(),
        candidate_results = candidate_result_rows.len(),
        "Inserted election results"
    );
    Ok(written)
}

/// Replaces the candidate, list and entity results of an election.
///
/// An accepted election import is a complete snapshot: every stored row of
/// the election is removed before the new set is inserted, and the
/// election's status, absolute majority and last result change are updated
/// in the same transaction. Party and panachage results are left alone.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `election_id` - The election the import targets
/// * `accepted` - The output of the consistency guard
///
/// # Returns
///
/// The number of entity result rows written.
///
/// # Errors
///
/// Returns an error if the election does not exist or any statement fails.
/// Nothing is written in that case.
pub fn apply_election_import(
    conn: &mut SqliteConnection,
    election_id: i64,
    accepted: &AcceptedImport,
) -> Result<usize, PersistenceError> {
    conn.immediate_transaction::<_, PersistenceError, _>(|conn| {
        let exists: Option<i64> = elections::table
            .find(election_id)
            .select(elections::election_id)
            .first::<i64>(conn)
            .optional()?;
        if exists.is_none() {
            return Err(PersistenceError::ElectionNotFound(election_id));
        }

        let removed: usize = clear_election(conn, election_id)?;
        let empty: ElectionResults = ElectionResults::default();
        let results: &ElectionResults = accepted.election_results.as_ref().unwrap_or(&empty);
        let written: usize = insert_election(conn, election_id, results)?;

        let changed_at: String = now_timestamp()?;
        diesel::update(elections::table.find(election_id))
            .set((
                elections::status.eq(accepted.status.map(|status| status.as_str())),
                elections::absolute_majority.eq(results.absolute_majority.map(i64::from)),
                elections::last_result_change.eq(Some(changed_at.as_str())),
            ))
            .execute(conn)?;

        info!(
            election_id,
            removed,
            written,
            status = ?accepted.status,
            "Applied election import"
        );
        Ok(written)
    })
}

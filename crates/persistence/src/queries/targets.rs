// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;
use std::collections::BTreeMap;
use std::str::FromStr;
use tally_domain::{BallotType, Domain, ElectionType, Status};
use tracing::debug;

use super::to_u32;
use crate::data_models::{ElectionData, VoteData};
use crate::diesel_schema::{ballots, elections, votes};
use crate::error::PersistenceError;

/// Diesel Queryable struct for vote rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = votes)]
struct VoteRow {
    vote_id: i64,
    external_id: Option<String>,
    title: String,
    year: i32,
    domain: String,
    domain_segment: Option<String>,
    has_expats: i32,
    status: Option<String>,
    last_result_change: Option<String>,
    created_at: String,
}

impl VoteRow {
    fn into_data(self, ballot_types: Vec<BallotType>) -> Result<VoteData, PersistenceError> {
        let domain: Domain = Domain::from_str(&self.domain)
            .map_err(|e| PersistenceError::InvalidRecord(e.to_string()))?;
        let status: Option<Status> = self
            .status
            .as_deref()
            .map(Status::from_str)
            .transpose()
            .map_err(|e| PersistenceError::InvalidRecord(e.to_string()))?;

        Ok(VoteData {
            vote_id: self.vote_id,
            title: self.title,
            year: self.year,
            domain,
            domain_segment: self.domain_segment,
            has_expats: self.has_expats != 0,
            external_id: self.external_id,
            status,
            last_result_change: self.last_result_change,
            created_at: self.created_at,
            ballot_types,
        })
    }
}

/// Diesel Queryable struct for election rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = elections)]
struct ElectionRow {
    election_id: i64,
    title: String,
    year: i32,
    last_result_change: Option<String>,
    created_at: String,
    domain: String,
    domain_segment: Option<String>,
    has_expats: i32,
    election_type: String,
    status: Option<String>,
    absolute_majority: Option<i64>,
}

impl ElectionRow {
    fn into_data(self) -> Result<ElectionData, PersistenceError> {
        let invalid = |e: tally_domain::DomainError| PersistenceError::InvalidRecord(e.to_string());
        let status: Option<Status> = self
            .status
            .as_deref()
            .map(Status::from_str)
            .transpose()
            .map_err(invalid)?;

        Ok(ElectionData {
            election_id: self.election_id,
            title: self.title,
            year: self.year,
            domain: Domain::from_str(&self.domain).map_err(invalid)?,
            domain_segment: self.domain_segment,
            has_expats: self.has_expats != 0,
            election_type: ElectionType::from_str(&self.election_type).map_err(invalid)?,
            status,
            absolute_majority: self
                .absolute_majority
                .map(|value| to_u32(value, "absolute_majority"))
                .transpose()?,
            last_result_change: self.last_result_change,
            created_at: self.created_at,
        })
    }
}

fn parse_ballot_type(value: &str) -> Result<BallotType, PersistenceError> {
    BallotType::from_str(value).map_err(|e| PersistenceError::InvalidRecord(e.to_string()))
}

/// Retrieves a vote with its ballots.
///
/// # Errors
///
/// Returns an error if the database query fails or a stored value is invalid.
/// Returns `Ok(None)` if the vote is not found.
pub fn get_vote(
    conn: &mut SqliteConnection,
    vote_id: i64,
) -> Result<Option<VoteData>, PersistenceError> {
    debug!(vote_id, "Looking up vote");

    let row: Option<VoteRow> = votes::table
        .find(vote_id)
        .select(VoteRow::as_select())
        .first(conn)
        .optional()?;
    let Some(row) = row else {
        return Ok(None);
    };

    let ballot_types: Vec<BallotType> = ballots::table
        .filter(ballots::vote_id.eq(vote_id))
        .order(ballots::ballot_id.asc())
        .select(ballots::ballot_type)
        .load::<String>(conn)?
        .iter()
        .map(|value| parse_ballot_type(value))
        .collect::<Result<_, _>>()?;

    row.into_data(ballot_types).map(Some)
}

/// Lists all votes ordered by id.
///
/// # Errors
///
/// Returns an error if the database query fails or a stored value is invalid.
pub fn list_votes(conn: &mut SqliteConnection) -> Result<Vec<VoteData>, PersistenceError> {
    let rows: Vec<VoteRow> = votes::table
        .order(votes::vote_id.asc())
        .select(VoteRow::as_select())
        .load(conn)?;

    let mut ballot_types: BTreeMap<i64, Vec<BallotType>> = BTreeMap::new();
    let ballot_rows: Vec<(i64, String)> = ballots::table
        .order(ballots::ballot_id.asc())
        .select((ballots::vote_id, ballots::ballot_type))
        .load(conn)?;
    for (vote_id, ballot_type) in ballot_rows {
        ballot_types
            .entry(vote_id)
            .or_default()
            .push(parse_ballot_type(&ballot_type)?);
    }

    rows.into_iter()
        .map(|row| {
            let types: Vec<BallotType> = ballot_types.remove(&row.vote_id).unwrap_or_default();
            row.into_data(types)
        })
        .collect()
}

/// Retrieves an election.
///
/// # Errors
///
/// Returns an error if the database query fails or a stored value is invalid.
/// Returns `Ok(None)` if the election is not found.
pub fn get_election(
    conn: &mut SqliteConnection,
    election_id: i64,
) -> Result<Option<ElectionData>, PersistenceError> {
    debug!(election_id, "Looking up election");

    let row: Option<ElectionRow> = elections::table
        .find(election_id)
        .select(ElectionRow::as_select())
        .first(conn)
        .optional()?;
    row.map(ElectionRow::into_data).transpose()
}

/// Lists all elections ordered by id.
///
/// # Errors
///
/// Returns an error if the database query fails or a stored value is invalid.
pub fn list_elections(conn: &mut SqliteConnection) -> Result<Vec<ElectionData>, PersistenceError> {
    let rows: Vec<ElectionRow> = elections::table
        .order(elections::election_id.asc())
        .select(ElectionRow::as_select())
        .load(conn)?;
    rows.into_iter().map(ElectionRow::into_data).collect()
}

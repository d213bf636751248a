// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;
use std::collections::BTreeMap;
use std::str::FromStr;
use tally_domain::{BallotType, EntityResult, PanachageResult, PartyResult};

use super::to_u32;
use crate::diesel_schema::{ballot_results, ballots, panachage_results, party_results};
use crate::error::PersistenceError;

#[derive(Queryable, Selectable)]
#[diesel(table_name = ballot_results)]
struct BallotResultRow {
    entity_id: i64,
    name: String,
    district: String,
    counted: i32,
    eligible_voters: i64,
    expats: i64,
    yeas: i64,
    nays: i64,
    empty: i64,
    invalid: i64,
}

impl TryFrom<BallotResultRow> for EntityResult {
    type Error = PersistenceError;

    fn try_from(row: BallotResultRow) -> Result<Self, Self::Error> {
        Ok(Self {
            entity_id: to_u32(row.entity_id, "entity_id")?,
            name: row.name,
            district: row.district,
            counted: row.counted != 0,
            eligible_voters: to_u32(row.eligible_voters, "eligible_voters")?,
            expats: to_u32(row.expats, "expats")?,
            yeas: to_u32(row.yeas, "yeas")?,
            nays: to_u32(row.nays, "nays")?,
            empty: to_u32(row.empty, "empty")?,
            invalid: to_u32(row.invalid, "invalid")?,
        })
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = party_results)]
struct PartyResultRow {
    year: i32,
    total_votes: i64,
    party_id: String,
    name: String,
    color: Option<String>,
    mandates: i64,
    votes: i64,
    voters_count: Option<String>,
    voters_count_percentage: Option<String>,
}

impl TryFrom<PartyResultRow> for PartyResult {
    type Error = PersistenceError;

    fn try_from(row: PartyResultRow) -> Result<Self, Self::Error> {
        Ok(Self {
            year: row.year,
            total_votes: to_u32(row.total_votes, "total_votes")?,
            party_id: row.party_id,
            name: row.name,
            color: row.color,
            mandates: to_u32(row.mandates, "mandates")?,
            votes: to_u32(row.votes, "votes")?,
            voters_count: row.voters_count,
            voters_count_percentage: row.voters_count_percentage,
        })
    }
}

/// Loads the stored results of every ballot of a vote.
///
/// Ballots without stored results map to an empty list. Results are ordered
/// by entity id.
///
/// # Errors
///
/// Returns an error if the database query fails or a stored value is invalid.
pub fn load_ballot_results(
    conn: &mut SqliteConnection,
    vote_id: i64,
) -> Result<BTreeMap<BallotType, Vec<EntityResult>>, PersistenceError> {
    let ballot_rows: Vec<(i64, String)> = ballots::table
        .filter(ballots::vote_id.eq(vote_id))
        .order(ballots::ballot_id.asc())
        .select((ballots::ballot_id, ballots::ballot_type))
        .load(conn)?;

    let mut results: BTreeMap<BallotType, Vec<EntityResult>> = BTreeMap::new();
    for (ballot_id, ballot_type) in ballot_rows {
        let ballot_type: BallotType = BallotType::from_str(&ballot_type)
            .map_err(|e| PersistenceError::InvalidRecord(e.to_string()))?;
        let rows: Vec<BallotResultRow> = ballot_results::table
            .filter(ballot_results::ballot_id.eq(ballot_id))
            .order(ballot_results::entity_id.asc())
            .select(BallotResultRow::as_select())
            .load(conn)?;
        let entity_results: Vec<EntityResult> = rows
            .into_iter()
            .map(EntityResult::try_from)
            .collect::<Result<_, _>>()?;
        results.insert(ballot_type, entity_results);
    }
    Ok(results)
}

/// Counts the stored entity results over all ballots of a vote.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn count_ballot_results(
    conn: &mut SqliteConnection,
    vote_id: i64,
) -> Result<i64, PersistenceError> {
    Ok(ballot_results::table
        .inner_join(ballots::table)
        .filter(ballots::vote_id.eq(vote_id))
        .count()
        .get_result(conn)?)
}

/// Loads the stored party results of an election, ordered by year and party.
///
/// # Errors
///
/// Returns an error if the database query fails or a stored value is invalid.
pub fn load_party_results(
    conn: &mut SqliteConnection,
    election_id: i64,
) -> Result<Vec<PartyResult>, PersistenceError> {
    let rows: Vec<PartyResultRow> = party_results::table
        .filter(party_results::election_id.eq(election_id))
        .order((party_results::year.asc(), party_results::party_id.asc()))
        .select(PartyResultRow::as_select())
        .load(conn)?;
    rows.into_iter().map(PartyResult::try_from).collect()
}

/// Loads the stored panachage results of an election, ordered by source and
/// target.
///
/// # Errors
///
/// Returns an error if the database query fails or a stored value is invalid.
pub fn load_panachage_results(
    conn: &mut SqliteConnection,
    election_id: i64,
) -> Result<Vec<PanachageResult>, PersistenceError> {
    let rows: Vec<(String, String, i64)> = panachage_results::table
        .filter(panachage_results::election_id.eq(election_id))
        .order((panachage_results::source.asc(), panachage_results::target.asc()))
        .select((
            panachage_results::source,
            panachage_results::target,
            panachage_results::votes,
        ))
        .load(conn)?;
    rows.into_iter()
        .map(|(source, target, votes)| {
            Ok(PanachageResult {
                source,
                target,
                votes: to_u32(votes, "votes")?,
            })
        })
        .collect()
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Clear-and-replace writes for accepted imports.
//!
//! Each function runs in a single `BEGIN IMMEDIATE` transaction. Readers never
//! observe a ballot whose old rows are gone but whose new rows are missing,
//! and a failed insert leaves the previous results in place.

use diesel::SqliteConnection;
use diesel::prelude::*;
use tally::AcceptedImport;
use tally_domain::{BallotType, EntityResult, PanachageResult, PartyResult};
use tracing::{debug, info};

use super::now_timestamp;
use crate::diesel_schema::{
    ballot_results, ballots, elections, panachage_results, party_results, votes,
};
use crate::error::PersistenceError;

#[derive(Insertable)]
#[diesel(table_name = ballot_results)]
struct NewBallotResultRow<'a> {
    ballot_id: i64,
    entity_id: i64,
    name: &'a str,
    district: &'a str,
    counted: i32,
    eligible_voters: i64,
    expats: i64,
    yeas: i64,
    nays: i64,
    empty: i64,
    invalid: i64,
}

impl<'a> NewBallotResultRow<'a> {
    fn new(ballot_id: i64, result: &'a EntityResult) -> Self {
        Self {
            ballot_id,
            entity_id: i64::from(result.entity_id),
            name: &result.name,
            district: &result.district,
            counted: i32::from(result.counted),
            eligible_voters: i64::from(result.eligible_voters),
            expats: i64::from(result.expats),
            yeas: i64::from(result.yeas),
            nays: i64::from(result.nays),
            empty: i64::from(result.empty),
            invalid: i64::from(result.invalid),
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = party_results)]
struct NewPartyResultRow<'a> {
    election_id: i64,
    year: i32,
    total_votes: i64,
    party_id: &'a str,
    name: &'a str,
    color: Option<&'a str>,
    mandates: i64,
    votes: i64,
    voters_count: Option<&'a str>,
    voters_count_percentage: Option<&'a str>,
}

impl<'a> NewPartyResultRow<'a> {
    fn new(election_id: i64, result: &'a PartyResult) -> Self {
        Self {
            election_id,
            year: result.year,
            total_votes: i64::from(result.total_votes),
            party_id: &result.party_id,
            name: &result.name,
            color: result.color.as_deref(),
            mandates: i64::from(result.mandates),
            votes: i64::from(result.votes),
            voters_count: result.voters_count.as_deref(),
            voters_count_percentage: result.voters_count_percentage.as_deref(),
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = panachage_results)]
struct NewPanachageResultRow<'a> {
    election_id: i64,
    source: &'a str,
    target: &'a str,
    votes: i64,
}

/// Looks up the id of one ballot of a vote.
fn ballot_id(
    conn: &mut SqliteConnection,
    vote_id: i64,
    ballot_type: BallotType,
) -> Result<i64, PersistenceError> {
    ballots::table
        .filter(ballots::vote_id.eq(vote_id))
        .filter(ballots::ballot_type.eq(ballot_type.as_str()))
        .select(ballots::ballot_id)
        .first::<i64>(conn)
        .optional()?
        .ok_or_else(|| PersistenceError::BallotNotFound {
            vote_id,
            ballot_type: ballot_type.to_string(),
        })
}

/// Replaces the results of every ballot an accepted import touched.
///
/// For each ballot in the import, all stored entity results are deleted and
/// the new complete set is inserted. The vote's status (when the format
/// reports one) and its last result change are updated in the same
/// transaction.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `vote_id` - The vote the import targets
/// * `accepted` - The output of the consistency guard
///
/// # Returns
///
/// The number of entity result rows written.
///
/// # Errors
///
/// Returns an error if the vote or one of the touched ballots does not exist,
/// or if any statement fails. Nothing is written in that case.
pub fn apply_vote_import(
    conn: &mut SqliteConnection,
    vote_id: i64,
    accepted: &AcceptedImport,
) -> Result<usize, PersistenceError> {
    conn.immediate_transaction::<_, PersistenceError, _>(|conn| {
        let exists: Option<i64> = votes::table
            .find(vote_id)
            .select(votes::vote_id)
            .first::<i64>(conn)
            .optional()?;
        if exists.is_none() {
            return Err(PersistenceError::VoteNotFound(vote_id));
        }

        let mut written: usize = 0;
        for (ballot_type, results) in &accepted.entity_results {
            let ballot_id: i64 = ballot_id(conn, vote_id, *ballot_type)?;

            let removed: usize = diesel::delete(
                ballot_results::table.filter(ballot_results::ballot_id.eq(ballot_id)),
            )
            .execute(conn)?;

            let rows: Vec<NewBallotResultRow<'_>> = results
                .iter()
                .map(|result| NewBallotResultRow::new(ballot_id, result))
                .collect();
            if !rows.is_empty() {
                written += diesel::insert_into(ballot_results::table)
                    .values(&rows)
                    .execute(conn)?;
            }

            debug!(
                vote_id,
                ballot = %ballot_type,
                removed,
                inserted = rows.len(),
                "Replaced ballot results"
            );
        }

        let changed_at: String = now_timestamp()?;
        match accepted.status {
            Some(status) => {
                diesel::update(votes::table.find(vote_id))
                    .set((
                        votes::status.eq(Some(status.as_str())),
                        votes::last_result_change.eq(Some(changed_at.as_str())),
                    ))
                    .execute(conn)?;
            }
            None => {
                diesel::update(votes::table.find(vote_id))
                    .set(votes::last_result_change.eq(Some(changed_at.as_str())))
                    .execute(conn)?;
            }
        }

        info!(
            vote_id,
            ballots = accepted.entity_results.len(),
            written,
            status = ?accepted.status,
            "Applied vote import"
        );
        Ok(written)
    })
}

/// Replaces the party and panachage results of an election.
///
/// An accepted party import is a complete snapshot: both stored sets are
/// cleared, even when the file carried no panachage columns.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `election_id` - The election the import targets
/// * `accepted` - The output of the consistency guard
///
/// # Returns
///
/// The number of party result rows written.
///
/// # Errors
///
/// Returns an error if the election does not exist or any statement fails.
/// Nothing is written in that case.
pub fn apply_party_import(
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

        diesel::delete(party_results::table.filter(party_results::election_id.eq(election_id)))
            .execute(conn)?;
        diesel::delete(
            panachage_results::table.filter(panachage_results::election_id.eq(election_id)),
        )
        .execute(conn)?;

        let parties: &[PartyResult] = accepted.party_results.as_deref().unwrap_or_default();
        let party_rows: Vec<NewPartyResultRow<'_>> = parties
            .iter()
            .map(|result| NewPartyResultRow::new(election_id, result))
            .collect();
        let written: usize = if party_rows.is_empty() {
            0
        } else {
            diesel::insert_into(party_results::table)
                .values(&party_rows)
                .execute(conn)?
        };

        let panachage: &[PanachageResult] =
            accepted.panachage_results.as_deref().unwrap_or_default();
        let panachage_rows: Vec<NewPanachageResultRow<'_>> = panachage
            .iter()
            .map(|result| NewPanachageResultRow {
                election_id,
                source: &result.source,
                target: &result.target,
                votes: i64::from(result.votes),
            })
            .collect();
        if !panachage_rows.is_empty() {
            diesel::insert_into(panachage_results::table)
                .values(&panachage_rows)
                .execute(conn)?;
        }

        let changed_at: String = now_timestamp()?;
        diesel::update(elections::table.find(election_id))
            .set(elections::last_result_change.eq(Some(changed_at.as_str())))
            .execute(conn)?;

        info!(
            election_id,
            parties = written,
            panachage = panachage_rows.len(),
            "Applied party import"
        );
        Ok(written)
    })
}

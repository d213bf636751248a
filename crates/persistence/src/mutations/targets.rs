// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;
use tally_domain::BallotType;
use tracing::info;

use crate::backend::sqlite::last_insert_rowid;
use crate::data_models::{NewElection, NewVote};
use crate::diesel_schema::{ballots, elections, votes};
use crate::error::PersistenceError;

/// Registers a vote together with its ballots.
///
/// Duplicate ballot types are collapsed. A vote without ballot types gets a
/// single proposal ballot.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `vote` - The vote to register
///
/// # Errors
///
/// Returns an error if the vote or one of its ballots cannot be inserted.
pub fn add_vote(conn: &mut SqliteConnection, vote: &NewVote) -> Result<i64, PersistenceError> {
    let mut ballot_types: Vec<BallotType> = vote.ballot_types.clone();
    ballot_types.sort();
    ballot_types.dedup();
    if ballot_types.is_empty() {
        ballot_types.push(BallotType::Proposal);
    }

    conn.immediate_transaction::<_, PersistenceError, _>(|conn| {
        diesel::insert_into(votes::table)
            .values((
                votes::title.eq(&vote.title),
                votes::year.eq(vote.year),
                votes::domain.eq(vote.domain.as_str()),
                votes::domain_segment.eq(vote.domain_segment.as_deref()),
                votes::has_expats.eq(i32::from(vote.has_expats)),
                votes::external_id.eq(vote.external_id.as_deref()),
            ))
            .execute(conn)?;
        let vote_id: i64 = last_insert_rowid(conn)?;

        for ballot_type in &ballot_types {
            diesel::insert_into(ballots::table)
                .values((
                    ballots::vote_id.eq(vote_id),
                    ballots::ballot_type.eq(ballot_type.as_str()),
                ))
                .execute(conn)?;
        }

        info!(
            vote_id,
            title = %vote.title,
            ballots = ballot_types.len(),
            "Registered vote"
        );
        Ok(vote_id)
    })
}

/// Registers an election.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn add_election(
    conn: &mut SqliteConnection,
    election: &NewElection,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(elections::table)
        .values((
            elections::title.eq(&election.title),
            elections::year.eq(election.year),
            elections::domain.eq(election.domain.as_str()),
            elections::domain_segment.eq(election.domain_segment.as_deref()),
            elections::has_expats.eq(i32::from(election.has_expats)),
            elections::election_type.eq(election.election_type.as_str()),
        ))
        .execute(conn)?;
    let election_id: i64 = last_insert_rowid(conn)?;

    info!(
        election_id,
        title = %election.title,
        election_type = election.election_type.as_str(),
        "Registered election"
    );
    Ok(election_id)
}

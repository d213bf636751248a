// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Persistence layer for vote and election results.
//!
//! Results live in `SQLite`, accessed through Diesel with embedded
//! migrations. Accepted imports replace the stored results of every ballot
//! they touch inside a single immediate transaction, so a ballot is never
//! observed half-written and concurrent writers are serialized by the
//! database lock.
//!
//! ## Testing
//!
//! Every call to [`Persistence::new_in_memory`] opens its own shared-cache
//! in-memory database, so tests are isolated without touching the
//! filesystem.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

use diesel::SqliteConnection;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tally::AcceptedImport;
use tally_domain::{BallotType, ElectionResults, EntityResult, PanachageResult, PartyResult};

use crate::backend::sqlite::StorageMode;

/// Sequence for naming the in-memory database of each `new_in_memory()` call.
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

mod backend;
mod data_models;
mod diesel_schema;
mod error;
mod mutations;
mod queries;

#[cfg(test)]
mod tests;

pub use data_models::{ElectionData, ExportTable, NewElection, NewVote, VoteData};
pub use error::PersistenceError;

/// Persistence adapter for votes, elections and their results.
pub struct Persistence {
    pub(crate) conn: SqliteConnection,
}

impl Persistence {
    /// Creates a new persistence adapter with an in-memory `SQLite` database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        let db_id: u64 = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let shared_memory_url: String = format!("file:tally_results_{db_id}?mode=memory&cache=shared");

        let conn: SqliteConnection = backend::sqlite::open(&shared_memory_url, StorageMode::Memory)?;
        Ok(Self { conn })
    }

    /// Creates a new persistence adapter with a file-based `SQLite` database.
    ///
    /// # Arguments
    ///
    /// * `path` - The path to the `SQLite` database file
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new_with_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path_str: &str = path.as_ref().to_str().ok_or_else(|| {
            PersistenceError::Connection(format!("Invalid database path: {}", path.as_ref().display()))
        })?;

        let conn: SqliteConnection = backend::sqlite::open(path_str, StorageMode::File)?;
        Ok(Self { conn })
    }

    /// Registers a vote and its ballots.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn add_vote(&mut self, vote: &NewVote) -> Result<i64, PersistenceError> {
        mutations::targets::add_vote(&mut self.conn, vote)
    }

    /// Registers an election.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn add_election(&mut self, election: &NewElection) -> Result<i64, PersistenceError> {
        mutations::targets::add_election(&mut self.conn, election)
    }

    /// Replaces the stored results of every ballot the import touched.
    ///
    /// # Arguments
    ///
    /// * `vote_id` - The vote the import targets
    /// * `accepted` - The output of the consistency guard
    ///
    /// # Returns
    ///
    /// The number of entity result rows written.
    ///
    /// # Errors
    ///
    /// Returns an error if the vote or a touched ballot does not exist, or the
    /// transaction fails. Nothing is written in that case.
    pub fn apply_vote_import(
        &mut self,
        vote_id: i64,
        accepted: &AcceptedImport,
    ) -> Result<usize, PersistenceError> {
        mutations::results::apply_vote_import(&mut self.conn, vote_id, accepted)
    }

    /// Replaces the stored party and panachage results of an election.
    ///
    /// # Errors
    ///
    /// Returns an error if the election does not exist or the transaction
    /// fails. Nothing is written in that case.
    pub fn apply_party_import(
        &mut self,
        election_id: i64,
        accepted: &AcceptedImport,
    ) -> Result<usize, PersistenceError> {
        mutations::results::apply_party_import(&mut self.conn, election_id, accepted)
    }

    /// Replaces the stored candidate, list and entity results of an election.
    ///
    /// # Errors
    ///
    /// Returns an error if the election does not exist or the transaction
    /// fails. Nothing is written in that case.
    pub fn apply_election_import(
        &mut self,
        election_id: i64,
        accepted: &AcceptedImport,
    ) -> Result<usize, PersistenceError> {
        mutations::candidates::apply_election_import(&mut self.conn, election_id, accepted)
    }

    /// Retrieves a vote, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_vote(&mut self, vote_id: i64) -> Result<Option<VoteData>, PersistenceError> {
        queries::targets::get_vote(&mut self.conn, vote_id)
    }

    /// Lists all votes.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_votes(&mut self) -> Result<Vec<VoteData>, PersistenceError> {
        queries::targets::list_votes(&mut self.conn)
    }

    /// Retrieves an election, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_election(
        &mut self,
        election_id: i64,
    ) -> Result<Option<ElectionData>, PersistenceError> {
        queries::targets::get_election(&mut self.conn, election_id)
    }

    /// Lists all elections.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_elections(&mut self) -> Result<Vec<ElectionData>, PersistenceError> {
        queries::targets::list_elections(&mut self.conn)
    }

    /// Loads the stored results of every ballot of a vote.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn load_ballot_results(
        &mut self,
        vote_id: i64,
    ) -> Result<BTreeMap<BallotType, Vec<EntityResult>>, PersistenceError> {
        queries::results::load_ballot_results(&mut self.conn, vote_id)
    }

    /// Counts the stored entity results of a vote.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count_ballot_results(&mut self, vote_id: i64) -> Result<i64, PersistenceError> {
        queries::results::count_ballot_results(&mut self.conn, vote_id)
    }

    /// Loads the stored party results of an election.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn load_party_results(
        &mut self,
        election_id: i64,
    ) -> Result<Vec<PartyResult>, PersistenceError> {
        queries::results::load_party_results(&mut self.conn, election_id)
    }

    /// Loads the stored panachage results of an election.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn load_panachage_results(
        &mut self,
        election_id: i64,
    ) -> Result<Vec<PanachageResult>, PersistenceError> {
        queries::results::load_panachage_results(&mut self.conn, election_id)
    }

    /// Loads the stored candidate, list and entity results of an election.
    ///
    /// # Errors
    ///
    /// Returns an error if the election does not exist or the query fails.
    pub fn load_election_results(
        &mut self,
        election_id: i64,
    ) -> Result<ElectionResults, PersistenceError> {
        queries::candidates::load_election_results(&mut self.conn, election_id)
    }

    /// Counts the stored entity results of an election.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count_election_results(&mut self, election_id: i64) -> Result<i64, PersistenceError> {
        queries::candidates::count_election_results(&mut self.conn, election_id)
    }

    /// Exports a vote's results in the internal import format.
    ///
    /// # Errors
    ///
    /// Returns an error if the vote does not exist or a query fails.
    pub fn vote_export(&mut self, vote_id: i64) -> Result<ExportTable, PersistenceError> {
        queries::export::vote_export(&mut self.conn, vote_id)
    }

    /// Exports an election's party results in the party import format.
    ///
    /// # Errors
    ///
    /// Returns an error if the election does not exist or a query fails.
    pub fn election_export(&mut self, election_id: i64) -> Result<ExportTable, PersistenceError> {
        queries::export::election_export(&mut self.conn, election_id)
    }

    /// Exports an election's candidate results in the internal election
    /// format.
    ///
    /// # Errors
    ///
    /// Returns an error if the election does not exist or a query fails.
    pub fn candidate_export(&mut self, election_id: i64) -> Result<ExportTable, PersistenceError> {
        queries::export::candidate_export(&mut self.conn, election_id)
    }
}

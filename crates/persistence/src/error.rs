// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

/// Errors of the result store.
///
/// Lookup failures name the missing vote, election or ballot; everything
/// else carries the message of the underlying database error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// The database could not be opened.
    Connection(String),
    /// A connection pragma could not be applied.
    Pragma(String),
    /// The schema could not be brought up to date.
    Migration(String),
    /// The connection does not enforce foreign keys.
    ForeignKeysDisabled,
    /// A statement failed.
    Query(String),
    /// A statement expecting a row found none.
    RowMissing,
    VoteNotFound(i64),
    ElectionNotFound(i64),
    /// The vote has no ballot of the given type.
    BallotNotFound { vote_id: i64, ballot_type: String },
    /// A stored value does not map back to a domain value.
    InvalidRecord(String),
    /// A timestamp could not be formatted.
    Timestamp(String),
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connection(msg) => write!(f, "Cannot open database: {msg}"),
            Self::Pragma(msg) => write!(f, "Cannot configure database: {msg}"),
            Self::Migration(msg) => write!(f, "Cannot migrate database: {msg}"),
            Self::ForeignKeysDisabled => write!(f, "Foreign keys are not enforced"),
            Self::Query(msg) => write!(f, "Query failed: {msg}"),
            Self::RowMissing => write!(f, "Expected row is missing"),
            Self::VoteNotFound(id) => write!(f, "Vote {id} does not exist"),
            Self::ElectionNotFound(id) => write!(f, "Election {id} does not exist"),
            Self::BallotNotFound {
                vote_id,
                ballot_type,
            } => write!(f, "Vote {vote_id} has no {ballot_type} ballot"),
            Self::InvalidRecord(msg) => write!(f, "Invalid stored record: {msg}"),
            Self::Timestamp(msg) => write!(f, "Invalid timestamp: {msg}"),
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<diesel::result::Error> for PersistenceError {
    fn from(err: diesel::result::Error) -> Self {
        if matches!(err, diesel::result::Error::NotFound) {
            Self::RowMissing
        } else {
            Self::Query(err.to_string())
        }
    }
}

impl From<diesel::ConnectionError> for PersistenceError {
    fn from(err: diesel::ConnectionError) -> Self {
        Self::Connection(err.to_string())
    }
}

impl From<time::error::Format> for PersistenceError {
    fn from(err: time::error::Format) -> Self {
        Self::Timestamp(err.to_string())
    }
}

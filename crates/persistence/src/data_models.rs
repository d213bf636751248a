// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use serde::{Deserialize, Serialize};
use tally::{BallotContext, ElectionContext};
use tally_domain::{BallotType, Domain, ElectionType, Status};

/// A vote to register before results can be imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVote {
    pub title: String,
    pub year: i32,
    pub domain: Domain,
    pub domain_segment: Option<String>,
    pub has_expats: bool,
    /// Ballots the vote owns. Empty means a single proposal ballot.
    pub ballot_types: Vec<BallotType>,
    pub external_id: Option<String>,
}

impl NewVote {
    /// Creates a simple vote with a single proposal ballot.
    #[must_use]
    pub fn new(title: &str, year: i32, domain: Domain) -> Self {
        Self {
            title: title.to_string(),
            year,
            domain,
            domain_segment: None,
            has_expats: false,
            ballot_types: vec![BallotType::Proposal],
            external_id: None,
        }
    }
}

/// A stored vote with its ballots and result metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoteData {
    pub vote_id: i64,
    pub title: String,
    pub year: i32,
    pub domain: Domain,
    pub domain_segment: Option<String>,
    pub has_expats: bool,
    pub external_id: Option<String>,
    /// Status of the last accepted import, if any.
    pub status: Option<Status>,
    /// RFC 3339 timestamp of the last accepted import.
    pub last_result_change: Option<String>,
    pub created_at: String,
    pub ballot_types: Vec<BallotType>,
}

impl VoteData {
    /// Builds the import context targeting one ballot of this vote.
    ///
    /// # Arguments
    ///
    /// * `ballot_type` - Target ballot for single-ballot formats
    /// * `vote_number` - Business number selecting rows in Wabsti exports
    #[must_use]
    pub fn context(&self, ballot_type: BallotType, vote_number: u32) -> BallotContext {
        BallotContext {
            year: self.year,
            domain: self.domain,
            domain_segment: self.domain_segment.clone(),
            has_expats: self.has_expats,
            ballot_types: self.ballot_types.clone(),
            ballot_type,
            vote_number,
            external_id: self.external_id.clone(),
        }
    }
}

/// An election to register before results can be imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewElection {
    pub title: String,
    pub year: i32,
    pub domain: Domain,
    pub domain_segment: Option<String>,
    pub has_expats: bool,
    pub election_type: ElectionType,
}

impl NewElection {
    /// Creates a federal proportional election without expatriates.
    #[must_use]
    pub fn new(title: &str, year: i32) -> Self {
        Self {
            title: title.to_string(),
            year,
            domain: Domain::Federation,
            domain_segment: None,
            has_expats: false,
            election_type: ElectionType::Proporz,
        }
    }
}

/// A stored election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElectionData {
    pub election_id: i64,
    pub title: String,
    pub year: i32,
    pub domain: Domain,
    pub domain_segment: Option<String>,
    pub has_expats: bool,
    pub election_type: ElectionType,
    /// Status of the last accepted candidate import, if any.
    pub status: Option<Status>,
    pub absolute_majority: Option<u32>,
    /// RFC 3339 timestamp of the last accepted import.
    pub last_result_change: Option<String>,
    pub created_at: String,
}

impl ElectionData {
    /// Builds the import context for candidate results of this election.
    #[must_use]
    pub fn context(&self) -> ElectionContext {
        ElectionContext {
            year: self.year,
            domain: self.domain,
            domain_segment: self.domain_segment.clone(),
            has_expats: self.has_expats,
            election_type: self.election_type,
        }
    }
}

/// Stored results laid out as a table, header first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

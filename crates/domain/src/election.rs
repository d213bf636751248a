// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Candidate and list results of an election.

use crate::error::DomainError;
use crate::registry::EntityInfo;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Electoral system of an election.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElectionType {
    /// Majority vote; candidates stand on their own.
    Majorz,
    /// Proportional representation; every candidate belongs to a list.
    Proporz,
}

impl ElectionType {
    /// Converts this election type to its stored string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Majorz => "majorz",
            Self::Proporz => "proporz",
        }
    }
}

impl FromStr for ElectionType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "majorz" => Ok(Self::Majorz),
            "proporz" => Ok(Self::Proporz),
            _ => Err(DomainError::InvalidElectionType(s.to_string())),
        }
    }
}

impl std::fmt::Display for ElectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ballot figures of an election in one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionEntityResult {
    /// Registry id of the entity, `0` for expatriates.
    pub entity_id: u32,
    pub name: String,
    pub district: String,
    pub counted: bool,
    pub eligible_voters: u32,
    pub expats: u32,
    pub received_ballots: u32,
    pub blank_ballots: u32,
    pub invalid_ballots: u32,
    pub blank_votes: u32,
    pub invalid_votes: u32,
}

impl ElectionEntityResult {
    /// Creates a placeholder for an entity that has not reported yet.
    #[must_use]
    pub fn not_counted(entity_id: u32, info: &EntityInfo) -> Self {
        Self {
            entity_id,
            name: info.name.clone(),
            district: info.district.clone(),
            counted: false,
            eligible_voters: 0,
            expats: 0,
            received_ballots: 0,
            blank_ballots: 0,
            invalid_ballots: 0,
            blank_votes: 0,
            invalid_votes: 0,
        }
    }

    /// Blank plus invalid ballots.
    #[must_use]
    pub fn unaccounted_ballots(&self) -> u64 {
        u64::from(self.blank_ballots) + u64::from(self.invalid_ballots)
    }
}

/// A list of a proportional election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionList {
    pub list_id: String,
    pub name: String,
    pub number_of_mandates: u32,
}

/// A candidate standing in an election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub candidate_id: String,
    pub family_name: String,
    pub first_name: String,
    pub elected: bool,
    pub party: Option<String>,
    /// The list the candidate stands on; always `None` in majority elections.
    pub list_id: Option<String>,
}

/// Votes of one candidate in one entity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CandidateResult {
    pub entity_id: u32,
    pub candidate_id: String,
    pub votes: u32,
}

/// Votes of one list in one entity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListResult {
    pub entity_id: u32,
    pub list_id: String,
    pub votes: u32,
}

/// The complete result set of an election, as written by one import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionResults {
    /// Votes needed to be elected in a majority election.
    pub absolute_majority: Option<u32>,
    /// One row per entity in scope, placeholders included, sorted by id.
    pub entity_results: Vec<ElectionEntityResult>,
    pub lists: Vec<ElectionList>,
    pub candidates: Vec<Candidate>,
    pub list_results: Vec<ListResult>,
    pub candidate_results: Vec<CandidateResult>,
}

impl ElectionResults {
    /// Total votes of a candidate over all entities.
    #[must_use]
    pub fn candidate_votes(&self, candidate_id: &str) -> u64 {
        self.candidate_results
            .iter()
            .filter(|result| result.candidate_id == candidate_id)
            .map(|result| u64::from(result.votes))
            .sum()
    }

    /// Entities that finished counting.
    #[must_use]
    pub fn counted_entities(&self) -> usize {
        self.entity_results.iter().filter(|result| result.counted).count()
    }
}

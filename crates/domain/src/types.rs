// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::registry::EntityInfo;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The list id used by party exports for votes cast on the blank list.
pub const BLANK_LIST_ID: &str = "999";

/// Counting status of a ballot or of a single imported file.
///
/// Variants are declared from the most to the least conservative, so the
/// derived ordering lets an aggregate status be computed with `min`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Counting is still in progress.
    Interim,
    /// The source did not say.
    Unknown,
    /// Every entity has been counted and the result is official.
    Final,
}

impl Status {
    /// Converts this status to its stored string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Interim => "interim",
            Self::Unknown => "unknown",
            Self::Final => "final",
        }
    }

    /// Combines two observed statuses, keeping the more conservative one.
    #[must_use]
    pub fn most_conservative(self, other: Self) -> Self {
        self.min(other)
    }
}

impl FromStr for Status {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "interim" => Ok(Self::Interim),
            "unknown" => Ok(Self::Unknown),
            "final" => Ok(Self::Final),
            _ => Err(DomainError::InvalidStatus(s.to_string())),
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One of the up-to-three questions of a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BallotType {
    /// The main question.
    Proposal,
    /// The counter-proposal put against the main question.
    CounterProposal,
    /// The tie-breaker deciding between proposal and counter-proposal.
    TieBreaker,
}

impl BallotType {
    /// All ballot types in storage order.
    pub const ALL: [Self; 3] = [Self::Proposal, Self::CounterProposal, Self::TieBreaker];

    /// Converts this ballot type to its stored string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Proposal => "proposal",
            Self::CounterProposal => "counter-proposal",
            Self::TieBreaker => "tie-breaker",
        }
    }
}

impl FromStr for BallotType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "proposal" => Ok(Self::Proposal),
            "counter-proposal" => Ok(Self::CounterProposal),
            "tie-breaker" => Ok(Self::TieBreaker),
            _ => Err(DomainError::InvalidBallotType(s.to_string())),
        }
    }
}

impl std::fmt::Display for BallotType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Domain of influence of a vote or election.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    /// Nationwide.
    Federation,
    /// The whole canton.
    Canton,
    /// A region, selected by the domain segment.
    Region,
    /// A district, selected by the domain segment.
    District,
    /// A single municipality.
    Municipality,
    /// No geographic scope; no placeholders are synthesized.
    None,
}

impl Domain {
    /// Converts this domain to its stored string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Federation => "federation",
            Self::Canton => "canton",
            Self::Region => "region",
            Self::District => "district",
            Self::Municipality => "municipality",
            Self::None => "none",
        }
    }
}

impl FromStr for Domain {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "federation" => Ok(Self::Federation),
            "canton" => Ok(Self::Canton),
            "region" => Ok(Self::Region),
            "district" => Ok(Self::District),
            "municipality" => Ok(Self::Municipality),
            "none" => Ok(Self::None),
            _ => Err(DomainError::InvalidDomain(s.to_string())),
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The outcome of one ballot in one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityResult {
    /// Registry id of the entity, `0` for expatriates.
    pub entity_id: u32,
    /// Display name copied from the registry.
    pub name: String,
    /// District label copied from the registry.
    pub district: String,
    /// Whether the entity has finished counting.
    pub counted: bool,
    pub eligible_voters: u32,
    /// Eligible expatriate voters, where reported separately.
    pub expats: u32,
    pub yeas: u32,
    pub nays: u32,
    pub empty: u32,
    pub invalid: u32,
}

impl EntityResult {
    /// Creates a placeholder for an entity that has not reported yet.
    ///
    /// # Arguments
    ///
    /// * `entity_id` - The registry id of the entity
    /// * `info` - The registry entry supplying name and district
    #[must_use]
    pub fn not_counted(entity_id: u32, info: &EntityInfo) -> Self {
        Self {
            entity_id,
            name: info.name.clone(),
            district: info.district.clone(),
            counted: false,
            eligible_voters: 0,
            expats: 0,
            yeas: 0,
            nays: 0,
            empty: 0,
            invalid: 0,
        }
    }

    /// Total of yeas, nays, empty and invalid ballots.
    #[must_use]
    pub fn cast_votes(&self) -> u64 {
        u64::from(self.yeas) + u64::from(self.nays) + u64::from(self.empty) + u64::from(self.invalid)
    }
}

/// One party's aggregate for one year of an election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyResult {
    pub year: i32,
    /// Sum of all party votes in that year; identical across the year's rows.
    pub total_votes: u32,
    pub party_id: String,
    pub name: String,
    /// Display color as `#rrggbb`.
    pub color: Option<String>,
    pub mandates: u32,
    pub votes: u32,
    /// Decimal with two fractional digits.
    pub voters_count: Option<String>,
    /// Decimal with two fractional digits.
    pub voters_count_percentage: Option<String>,
}

/// A directed vote transfer between two lists of the election year.
///
/// An empty `source` is the blank list.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PanachageResult {
    pub source: String,
    pub target: String,
    pub votes: u32,
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use tally_domain::{BallotType, Domain, ElectionType, EntityRegistry, EntityScope};

/// What an import targets and how the target is configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BallotContext {
    /// Calendar year selecting the registry entities.
    pub year: i32,
    pub domain: Domain,
    pub domain_segment: Option<String>,
    /// Whether expatriates report as a separate unit.
    pub has_expats: bool,
    /// The ballots the vote owns, in storage order.
    pub ballot_types: Vec<BallotType>,
    /// Target ballot for formats carrying a single ballot per file.
    pub ballot_type: BallotType,
    /// Business number used by the Wabsti exports to select rows.
    pub vote_number: u32,
    /// Identification used by eCH-0252 deliveries.
    pub external_id: Option<String>,
}

impl BallotContext {
    /// Creates a context for a simple vote with a single proposal ballot.
    #[must_use]
    pub fn new(year: i32, domain: Domain) -> Self {
        Self {
            year,
            domain,
            domain_segment: None,
            has_expats: false,
            ballot_types: vec![BallotType::Proposal],
            ballot_type: BallotType::Proposal,
            vote_number: 0,
            external_id: None,
        }
    }

    /// Returns whether the vote owns the given ballot.
    #[must_use]
    pub fn owns(&self, ballot_type: BallotType) -> bool {
        self.ballot_types.contains(&ballot_type)
    }

    /// Computes the registry scope this context covers.
    #[must_use]
    pub fn scope<'a>(&self, registry: &'a EntityRegistry) -> EntityScope<'a> {
        registry.scope(
            self.year,
            self.domain,
            self.domain_segment.as_deref(),
            self.has_expats,
        )
    }
}

/// The election an import targets and how it is configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElectionContext {
    pub year: i32,
    pub domain: Domain,
    pub domain_segment: Option<String>,
    pub has_expats: bool,
    pub election_type: ElectionType,
}

impl ElectionContext {
    #[must_use]
    pub const fn new(year: i32, domain: Domain, election_type: ElectionType) -> Self {
        Self {
            year,
            domain,
            domain_segment: None,
            has_expats: false,
            election_type,
        }
    }

    /// Computes the registry scope this context covers.
    #[must_use]
    pub fn scope<'a>(&self, registry: &'a EntityRegistry) -> EntityScope<'a> {
        registry.scope(
            self.year,
            self.domain,
            self.domain_segment.as_deref(),
            self.has_expats,
        )
    }
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The all-or-nothing decision between parsing and storage.

use crate::parsed::{ParsedBallots, ParsedElection};
use crate::parsers::ParsedParties;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tally_domain::{
    BallotType, CandidateResult, ElectionEntityResult, ElectionResults, EntityResult, EntityScope,
    ImportError, PanachageResult, PartyResult, Status,
};
use tracing::{debug, info};

/// Everything the storage layer must write for an accepted import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AcceptedImport {
    /// Complete result sets per replaced ballot, placeholders included,
    /// sorted by entity id.
    pub entity_results: BTreeMap<BallotType, Vec<EntityResult>>,
    pub party_results: Option<Vec<PartyResult>>,
    pub panachage_results: Option<Vec<PanachageResult>>,
    /// Candidate and list results replacing those of the election.
    pub election_results: Option<ElectionResults>,
    /// Most conservative status observed, if the format reports one.
    pub status: Option<Status>,
    /// Rows left to placeholder synthesis.
    pub skipped: usize,
}

/// The single externally observable result of an import attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "data", rename_all = "lowercase")]
pub enum ImportOutcome {
    /// Nothing may be written; the errors are shown to the operator.
    Rejected(Vec<ImportError>),
    Accepted(AcceptedImport),
}

impl ImportOutcome {
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    /// Errors of a rejected import, empty for an accepted one.
    #[must_use]
    pub fn errors(&self) -> &[ImportError] {
        match self {
            Self::Rejected(errors) => errors,
            Self::Accepted(_) => &[],
        }
    }

    /// Attaches a source filename to every error of a rejected import.
    #[must_use]
    pub fn with_filename(self, filename: &str) -> Self {
        match self {
            Self::Rejected(errors) => Self::Rejected(
                errors
                    .into_iter()
                    .map(|err| err.with_filename(filename))
                    .collect(),
            ),
            accepted @ Self::Accepted(_) => accepted,
        }
    }
}

/// Decides whether parsed vote results may be applied.
///
/// The import is rejected if parsing reported any error, or if no row was
/// processed and none was deliberately skipped. Otherwise every touched
/// ballot receives a complete result set: entities in scope without a
/// candidate get a `counted = false` placeholder.
///
/// # Arguments
///
/// * `parsed` - The candidates and errors of one parse pass
/// * `scope` - The registry entities the ballot covers
///
/// # Returns
///
/// * `ImportOutcome::Accepted` with complete per-ballot result sets
/// * `ImportOutcome::Rejected` with every collected error
#[must_use]
pub fn evaluate(parsed: ParsedBallots, scope: &EntityScope<'_>) -> ImportOutcome {
    if !parsed.errors.is_empty() {
        debug!(errors = parsed.errors.len(), "Import rejected");
        return ImportOutcome::Rejected(parsed.errors);
    }
    if parsed.processed == 0 && parsed.skipped == 0 {
        debug!("Import rejected, no data found");
        return ImportOutcome::Rejected(vec![ImportError::no_data()]);
    }

    let placeholder_ids: Vec<u32> = scope.placeholder_ids();
    let mut entity_results: BTreeMap<BallotType, Vec<EntityResult>> = BTreeMap::new();
    for (ballot_type, mut results) in parsed.ballots {
        let present: BTreeSet<u32> = results.iter().map(|result| result.entity_id).collect();
        let before: usize = results.len();
        results.extend(
            placeholder_ids
                .iter()
                .filter(|entity_id| !present.contains(entity_id))
                .map(|entity_id| EntityResult::not_counted(*entity_id, &scope.info(*entity_id))),
        );
        results.sort_by_key(|result| result.entity_id);
        debug!(
            ballot_type = ballot_type.as_str(),
            candidates = before,
            placeholders = results.len() - before,
            "Completed ballot results"
        );
        entity_results.insert(ballot_type, results);
    }

    info!(
        ballots = entity_results.len(),
        processed = parsed.processed,
        skipped = parsed.skipped,
        status = parsed.status.map(|status| status.as_str()),
        "Import accepted"
    );
    ImportOutcome::Accepted(AcceptedImport {
        entity_results,
        party_results: None,
        panachage_results: None,
        election_results: None,
        status: parsed.status,
        skipped: parsed.skipped,
    })
}

/// Decides whether parsed party results may be applied.
#[must_use]
pub fn evaluate_parties(parsed: ParsedParties) -> ImportOutcome {
    if !parsed.errors.is_empty() {
        debug!(errors = parsed.errors.len(), "Party import rejected");
        return ImportOutcome::Rejected(parsed.errors);
    }
    if parsed.parties.is_empty() {
        return ImportOutcome::Rejected(vec![ImportError::no_data()]);
    }

    info!(
        parties = parsed.parties.len(),
        panachage = parsed.panachage.as_ref().map(Vec::len),
        "Party import accepted"
    );
    ImportOutcome::Accepted(AcceptedImport {
        party_results: Some(parsed.parties),
        panachage_results: parsed.panachage,
        ..AcceptedImport::default()
    })
}

/// Decides whether parsed election results may be applied.
///
/// The rules match [`evaluate`]: any error rejects the file, as does a file
/// without a single processed or skipped row. Entities in scope that did not
/// report get a `counted = false` placeholder without candidate votes.
#[must_use]
pub fn evaluate_election(parsed: ParsedElection, scope: &EntityScope<'_>) -> ImportOutcome {
    if !parsed.errors.is_empty() {
        debug!(errors = parsed.errors.len(), "Election import rejected");
        return ImportOutcome::Rejected(parsed.errors);
    }
    if parsed.processed == 0 && parsed.skipped == 0 {
        debug!("Election import rejected, no data found");
        return ImportOutcome::Rejected(vec![ImportError::no_data()]);
    }

    let mut entity_results: BTreeMap<u32, ElectionEntityResult> = parsed.entity_results;
    let reported: usize = entity_results.len();
    for entity_id in scope.placeholder_ids() {
        entity_results
            .entry(entity_id)
            .or_insert_with(|| ElectionEntityResult::not_counted(entity_id, &scope.info(entity_id)));
    }

    let mut candidate_results: Vec<CandidateResult> = parsed.candidate_results;
    candidate_results.sort();

    let results: ElectionResults = ElectionResults {
        absolute_majority: parsed.absolute_majority,
        entity_results: entity_results.into_values().collect(),
        lists: parsed.lists.into_values().collect(),
        candidates: parsed.candidates.into_values().collect(),
        list_results: parsed.list_results.into_values().collect(),
        candidate_results,
    };

    info!(
        entities = results.entity_results.len(),
        placeholders = results.entity_results.len() - reported,
        candidates = results.candidates.len(),
        lists = results.lists.len(),
        processed = parsed.processed,
        skipped = parsed.skipped,
        status = parsed.status.map(|status| status.as_str()),
        "Election import accepted"
    );
    ImportOutcome::Accepted(AcceptedImport {
        election_results: Some(results),
        status: parsed.status,
        skipped: parsed.skipped,
        ..AcceptedImport::default()
    })
}

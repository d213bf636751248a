// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::collections::{BTreeMap, HashSet};
use tally_domain::{
    BallotType, Candidate, CandidateResult, Column, DuplicateTracker, ElectionEntityResult,
    ElectionList, EntityResolution, EntityResult, EntityScope, ImportError, ImportErrorKind,
    LineRecord, ListResult, Status, check_election_sanity, check_sanity, resolve_entity,
    validate_entity_id, validate_integer,
};

/// Candidate results of one parse pass, buffered until the guard decides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedBallots {
    /// Results per touched ballot. A key with an empty list still marks the
    /// ballot for replacement.
    pub ballots: BTreeMap<BallotType, Vec<EntityResult>>,
    /// Most conservative status observed, if the format reports one.
    pub status: Option<Status>,
    /// Rows that produced a candidate result.
    pub processed: usize,
    /// Rows deliberately left to placeholder synthesis.
    pub skipped: usize,
    pub errors: Vec<ImportError>,
}

impl ParsedBallots {
    /// A parse pass that failed before reading any row.
    #[must_use]
    pub fn failed(error: ImportError) -> Self {
        Self {
            errors: vec![error],
            ..Self::default()
        }
    }

    /// Marks a ballot as covered by this file.
    pub fn touch(&mut self, ballot_type: BallotType) {
        self.ballots.entry(ballot_type).or_default();
    }

    /// Folds a status into the aggregate.
    pub fn observe(&mut self, status: Status) {
        self.status = Some(
            self.status
                .map_or(status, |current| current.most_conservative(status)),
        );
    }

    /// Settles a row whose significant cells hold an unknown marker.
    ///
    /// The row is left to placeholder synthesis only when its entity resolved
    /// cleanly; otherwise its errors are kept.
    pub(crate) fn skip_unknown(&mut self, row: RowCheck<'_>, entity: Option<u32>) {
        if entity.is_some() && row.errors.is_empty() {
            self.skipped += 1;
        } else {
            self.errors.extend(row.errors);
        }
    }

    /// Buffers the results of one row, or its errors if it has any.
    pub(crate) fn accept(&mut self, row: RowCheck<'_>, results: Vec<(BallotType, EntityResult)>) {
        if row.errors.is_empty() {
            for (ballot_type, result) in results {
                self.ballots.entry(ballot_type).or_default().push(result);
            }
            self.processed += 1;
        } else {
            self.errors.extend(row.errors);
        }
    }
}

/// Everything one row of an election file contributes.
pub(crate) struct ElectionRow {
    pub(crate) result: ElectionEntityResult,
    pub(crate) candidate: Candidate,
    pub(crate) candidate_votes: u32,
    /// The candidate's list and the list's votes in this entity.
    pub(crate) list: Option<(ElectionList, u32)>,
    pub(crate) status: Status,
}

/// Election results of one parse pass, buffered until the guard decides.
///
/// Entity figures, lists and candidates repeat on every row; the first
/// occurrence wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedElection {
    pub entity_results: BTreeMap<u32, ElectionEntityResult>,
    pub lists: BTreeMap<String, ElectionList>,
    pub candidates: BTreeMap<String, Candidate>,
    pub list_results: BTreeMap<(u32, String), ListResult>,
    pub candidate_results: Vec<CandidateResult>,
    pub absolute_majority: Option<u32>,
    pub status: Option<Status>,
    pub processed: usize,
    pub skipped: usize,
    pub errors: Vec<ImportError>,
}

impl ParsedElection {
    #[must_use]
    pub fn failed(error: ImportError) -> Self {
        Self {
            errors: vec![error],
            ..Self::default()
        }
    }

    /// Settles a row whose significant cells hold an unknown marker.
    pub(crate) fn skip_unknown(&mut self, row: RowCheck<'_>, entity: Option<u32>) {
        if entity.is_some() && row.errors.is_empty() {
            self.skipped += 1;
        } else {
            self.errors.extend(row.errors);
        }
    }

    /// Buffers the contribution of one row, or its errors if it has any.
    pub(crate) fn accept(&mut self, row: RowCheck<'_>, entry: ElectionRow) {
        if !row.errors.is_empty() {
            self.errors.extend(row.errors);
            return;
        }

        let entity_id: u32 = entry.result.entity_id;
        self.status = Some(
            self.status
                .map_or(entry.status, |current| current.most_conservative(entry.status)),
        );
        self.entity_results.entry(entity_id).or_insert(entry.result);
        if let Some((list, votes)) = entry.list {
            self.list_results
                .entry((entity_id, list.list_id.clone()))
                .or_insert_with(|| ListResult {
                    entity_id,
                    list_id: list.list_id.clone(),
                    votes,
                });
            self.lists.entry(list.list_id.clone()).or_insert(list);
        }
        self.candidate_results.push(CandidateResult {
            entity_id,
            candidate_id: entry.candidate.candidate_id.clone(),
            votes: entry.candidate_votes,
        });
        self.candidates
            .entry(entry.candidate.candidate_id.clone())
            .or_insert(entry.candidate);
        self.processed += 1;
    }
}

/// Entity resolution outcome for one row.
pub(crate) enum RowEntity {
    Entity(u32),
    SkipExpats,
    /// Already reported as a row error.
    Invalid,
}

impl RowEntity {
    /// The resolved id, or `None` for a row already in error.
    ///
    /// Expatriate rows to drop must be filtered out before.
    pub(crate) const fn id(&self) -> Option<u32> {
        match self {
            Self::Entity(entity_id) => Some(*entity_id),
            Self::SkipExpats | Self::Invalid => None,
        }
    }
}

/// Error collection for a single source row.
///
/// Every field is read even after an earlier one failed, so a row reports
/// all of its problems at once.
pub(crate) struct RowCheck<'r> {
    record: &'r LineRecord,
    errors: Vec<ImportError>,
}

impl<'r> RowCheck<'r> {
    pub(crate) const fn new(record: &'r LineRecord) -> Self {
        Self {
            record,
            errors: Vec::new(),
        }
    }

    pub(crate) const fn record(&self) -> &'r LineRecord {
        self.record
    }

    pub(crate) fn into_errors(self) -> Vec<ImportError> {
        self.errors
    }

    pub(crate) fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub(crate) fn push(&mut self, error: ImportError) {
        self.errors.push(error);
    }

    /// Records a field error with the given message.
    pub(crate) fn field_error(&mut self, message: impl Into<String>) {
        self.errors.push(ImportError::at_row(
            ImportErrorKind::FieldParseError,
            self.record.rownumber,
            message,
        ));
    }

    /// Reads an integer cell, recording the error and yielding `0` on failure.
    pub(crate) fn integer(&mut self, column: &Column) -> u32 {
        validate_integer(self.record, column).unwrap_or_else(|err| {
            self.errors.push(err);
            0
        })
    }

    /// Reads an integer cell without recording an error.
    pub(crate) fn try_integer(&self, column: &Column) -> Option<u32> {
        validate_integer(self.record, column).ok()
    }

    /// Resolves the entity of this row against the ballot's scope.
    pub(crate) fn entity(&mut self, column: &Column, scope: &EntityScope<'_>) -> RowEntity {
        let raw_id: u32 = match validate_entity_id(self.record, column) {
            Ok(id) => id,
            Err(err) => {
                self.errors.push(err);
                return RowEntity::Invalid;
            }
        };
        match resolve_entity(raw_id, scope, self.record.rownumber) {
            EntityResolution::Resolved(id) => RowEntity::Entity(id),
            EntityResolution::SkipExpats => RowEntity::SkipExpats,
            EntityResolution::Error(err) => {
                self.errors.push(err);
                RowEntity::Invalid
            }
        }
    }

    /// Records a duplicate error if the entity was already seen for the ballot.
    pub(crate) fn track(
        &mut self,
        tracker: &mut DuplicateTracker,
        ballot_type: BallotType,
        entity_id: u32,
    ) {
        if let Err(err) = tracker.check(ballot_type, entity_id, self.record.rownumber) {
            self.errors.push(err);
        }
    }

    /// Records a duplicate error if the candidate already has a result in
    /// this entity.
    pub(crate) fn track_candidate(
        &mut self,
        seen: &mut HashSet<(u32, String)>,
        entity_id: u32,
        candidate_id: &str,
    ) {
        if !seen.insert((entity_id, candidate_id.to_string())) {
            self.errors.push(ImportError::at_row(
                ImportErrorKind::DuplicateEntity,
                self.record.rownumber,
                format!("{entity_id} was found twice for candidate {candidate_id}"),
            ));
        }
    }

    /// Applies the election sanity rules to the entity figures of a row.
    pub(crate) fn election_sanity(&mut self, result: &ElectionEntityResult) {
        self.errors
            .extend(check_election_sanity(result, self.record.rownumber));
    }

    /// Applies the sanity rules to a fully parsed result.
    ///
    /// A violation already reported for this row (by another ballot of the
    /// same row) is not repeated.
    pub(crate) fn sanity(&mut self, result: &EntityResult) {
        for err in check_sanity(result, self.record.rownumber) {
            if !self.errors.contains(&err) {
                self.errors.push(err);
            }
        }
    }
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Field and row rules shared by every result format.

use crate::election::ElectionEntityResult;
use crate::import_error::{ImportError, ImportErrorKind};
use crate::records::{Column, LineRecord};
use crate::registry::{EXPAT_SENTINELS, EXPATS_ENTITY_ID, EntityScope};
use crate::types::{BallotType, EntityResult};
use std::collections::{HashMap, HashSet};

/// Cell values marking a row whose entity has not reported yet.
const UNKNOWN_TOKENS: [&str; 2] = ["unknown", "unbekannt"];

/// Normalizes a column title for lookup.
///
/// The title is trimmed and lowercased, German umlauts and common accents are
/// folded to their base letter, and every remaining character that is not an
/// ASCII letter or digit becomes `_`.
///
/// # Examples
///
/// ```
/// use tally_domain::normalize_column;
///
/// assert_eq!(normalize_column("Ungültige Stimmzettel"), "ungultige_stimmzettel");
/// assert_eq!(normalize_column("BfS-Nr."), "bfs_nr_");
/// ```
#[must_use]
pub fn normalize_column(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'ä' | 'à' | 'á' | 'â' => 'a',
            'ö' | 'ò' | 'ó' | 'ô' => 'o',
            'ü' | 'ù' | 'ú' | 'û' => 'u',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'ì' | 'í' | 'î' | 'ï' => 'i',
            'ç' => 'c',
            c if c.is_ascii_alphanumeric() => c,
            _ => '_',
        })
        .collect()
}

fn parse_count(value: &str) -> Option<u32> {
    if value.is_empty() {
        return Some(0);
    }
    value.parse::<u32>().ok()
}

/// Reads a non-negative integer cell; an empty cell reads as `0`.
///
/// # Errors
///
/// Returns a `FieldParseError` naming the column if the cell is not an integer.
pub fn validate_integer(record: &LineRecord, column: &Column) -> Result<u32, ImportError> {
    parse_count(record.get(column)).ok_or_else(|| {
        ImportError::at_row(
            ImportErrorKind::FieldParseError,
            record.rownumber,
            format!("Invalid integer: {}", column.name()),
        )
    })
}

/// Reads an entity id cell; an empty cell reads as the expatriates id.
///
/// # Errors
///
/// Returns an `InvalidId` error naming the column if the cell is not an integer.
pub fn validate_entity_id(record: &LineRecord, column: &Column) -> Result<u32, ImportError> {
    parse_count(record.get(column)).ok_or_else(|| {
        ImportError::at_row(
            ImportErrorKind::InvalidId,
            record.rownumber,
            format!("Invalid integer: {}", column.name()),
        )
    })
}

/// Result of resolving a raw entity id against the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityResolution {
    /// The row belongs to this entity.
    Resolved(u32),
    /// An expatriates row for a ballot without expatriate reporting.
    SkipExpats,
    /// The id cannot be used.
    Error(ImportError),
}

/// Resolves a raw entity id.
///
/// Unknown expatriate sentinels are remapped to `0`. An expatriates row is
/// skipped without error when the ballot does not report expatriates.
/// Registry entities outside the ballot's domain are rejected like unknown ids
/// but with a distinct message.
#[must_use]
pub fn resolve_entity(raw_id: u32, scope: &EntityScope<'_>, rownumber: usize) -> EntityResolution {
    let mut entity_id: u32 = raw_id;
    if !scope.is_known(entity_id) && EXPAT_SENTINELS.contains(&entity_id) {
        entity_id = EXPATS_ENTITY_ID;
    }

    if entity_id == EXPATS_ENTITY_ID {
        if scope.has_expats() {
            return EntityResolution::Resolved(EXPATS_ENTITY_ID);
        }
        return EntityResolution::SkipExpats;
    }

    if !scope.is_known(entity_id) {
        return EntityResolution::Error(ImportError::at_row(
            ImportErrorKind::UnknownEntity,
            rownumber,
            format!("{raw_id} is unknown"),
        ));
    }

    if !scope.contains(entity_id) {
        return EntityResolution::Error(ImportError::at_row(
            ImportErrorKind::UnknownEntity,
            rownumber,
            format!("{entity_id} is not part of this business"),
        ));
    }

    EntityResolution::Resolved(entity_id)
}

/// Remembers which entities were already seen per ballot in one parse call.
#[derive(Debug, Default)]
pub struct DuplicateTracker {
    seen: HashMap<BallotType, HashSet<u32>>,
}

impl DuplicateTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an entity for a ballot.
    ///
    /// # Errors
    ///
    /// Returns a `DuplicateEntity` error if the entity was already recorded
    /// for the same ballot.
    pub fn check(
        &mut self,
        ballot_type: BallotType,
        entity_id: u32,
        rownumber: usize,
    ) -> Result<(), ImportError> {
        if self.seen.entry(ballot_type).or_default().insert(entity_id) {
            Ok(())
        } else {
            Err(ImportError::at_row(
                ImportErrorKind::DuplicateEntity,
                rownumber,
                format!("{entity_id} was found twice"),
            ))
        }
    }
}

/// Returns whether any of the given cells is an "unknown" marker.
///
/// Hand-made exports write `unbekannt` or `unknown` into the vote columns of
/// entities that have not counted yet. Such rows are skipped before any field
/// is parsed.
#[must_use]
pub fn contains_unknown_token(record: &LineRecord, columns: &[&Column]) -> bool {
    columns.iter().any(|column| {
        let cell: &str = record.get(column);
        UNKNOWN_TOKENS
            .iter()
            .any(|token| cell.eq_ignore_ascii_case(token))
    })
}

/// Checks a counted result against its eligible voters.
///
/// Results that are not counted carry no tallies and always pass.
#[must_use]
pub fn check_sanity(result: &EntityResult, rownumber: usize) -> Vec<ImportError> {
    let mut errors: Vec<ImportError> = Vec::new();
    if !result.counted {
        return errors;
    }
    if result.eligible_voters == 0 {
        errors.push(ImportError::at_row(
            ImportErrorKind::SanityViolation,
            rownumber,
            "No eligible voters",
        ));
    }
    if result.cast_votes() > u64::from(result.eligible_voters) {
        errors.push(ImportError::at_row(
            ImportErrorKind::SanityViolation,
            rownumber,
            "More cast votes than eligible voters",
        ));
    }
    errors
}

/// Checks the ballot figures of a counted election result.
#[must_use]
pub fn check_election_sanity(result: &ElectionEntityResult, rownumber: usize) -> Vec<ImportError> {
    let mut errors: Vec<ImportError> = Vec::new();
    if !result.counted {
        return errors;
    }
    if result.eligible_voters == 0 {
        errors.push(ImportError::at_row(
            ImportErrorKind::SanityViolation,
            rownumber,
            "No eligible voters",
        ));
    }
    if result.received_ballots > result.eligible_voters {
        errors.push(ImportError::at_row(
            ImportErrorKind::SanityViolation,
            rownumber,
            "More received ballots than eligible voters",
        ));
    }
    if result.unaccounted_ballots() > u64::from(result.received_ballots) {
        errors.push(ImportError::at_row(
            ImportErrorKind::SanityViolation,
            rownumber,
            "More blank and invalid ballots than received ballots",
        ));
    }
    errors
}

/// Returns whether a party or list id only uses `[A-Za-z0-9_.]`.
#[must_use]
pub fn is_list_id(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

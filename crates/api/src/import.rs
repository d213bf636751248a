// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Import orchestration: decode, parse, guard, store.
//!
//! The evaluation half (`evaluate_*`) is pure and may run without holding
//! the storage handle. Only an accepted outcome reaches the storage layer.

use std::path::Path;
use std::str::FromStr;
use tally::{
    Format, ImportOutcome, SourceDocument, import_election_table, import_party_table,
    import_vote_document,
};
use tally_domain::{BallotType, ElectionType, EntityRegistry, ImportError, ImportErrorKind};
use tally_persistence::{ElectionData, Persistence, VoteData};
use tracing::{info, warn};

use crate::error::{ApiError, translate_core_error, translate_domain_error};
use crate::tabular::{decode_text, read_table};

/// An uploaded or polled result file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSource {
    /// Name attached to every reported error.
    pub filename: String,
    /// Declared MIME type selecting the tabular decoder.
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ImportSource {
    /// Creates a source from bytes already in memory.
    #[must_use]
    pub fn new(filename: &str, mime: &str, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.to_string(),
            mime: mime.to_string(),
            bytes,
        }
    }

    /// Reads a source from disk.
    ///
    /// Without an explicit MIME type, one is guessed from the file extension.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Io` if the file cannot be read. This is the only
    /// fatal failure on the data path.
    pub fn from_path(path: &Path, mime: Option<&str>) -> Result<Self, ApiError> {
        let bytes: Vec<u8> = std::fs::read(path).map_err(|e| ApiError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let filename: String = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned());
        let mime: String = mime.map_or_else(|| guess_mime(path).to_string(), ToString::to_string);
        Ok(Self {
            filename,
            mime,
            bytes,
        })
    }
}

/// Guesses a MIME type from a file extension.
#[must_use]
pub fn guess_mime(path: &Path) -> &'static str {
    let extension: String = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "csv" => "text/csv",
        "txt" => "text/plain",
        "xml" => "application/xml",
        "xls" => "application/vnd.ms-excel",
        _ => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    }
}

/// Per-upload settings that are not part of the stored vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    /// Target ballot for formats carrying a single ballot per file.
    pub ballot_type: BallotType,
    /// Business number selecting rows in Wabsti exports.
    pub vote_number: u32,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            ballot_type: BallotType::Proposal,
            vote_number: 0,
        }
    }
}

/// Parses a format name as accepted on the command line and over HTTP.
///
/// # Errors
///
/// Returns `ApiError::InvalidInput` for unknown names.
pub fn parse_format(name: &str) -> Result<Format, ApiError> {
    Format::from_str(name).map_err(translate_core_error)
}

/// Parses a ballot type name.
///
/// # Errors
///
/// Returns `ApiError::InvalidInput` for unknown names.
pub fn parse_ballot_type(name: &str) -> Result<BallotType, ApiError> {
    BallotType::from_str(name).map_err(translate_domain_error)
}

/// Parses an election type name.
///
/// # Errors
///
/// Returns `ApiError::InvalidInput` for unknown names.
pub fn parse_election_type(name: &str) -> Result<ElectionType, ApiError> {
    ElectionType::from_str(name).map_err(translate_domain_error)
}

/// Loads the entity registry from a JSON file.
///
/// # Errors
///
/// Returns `ApiError::Io` if the file cannot be read, or
/// `ApiError::InvalidInput` if it is not a valid registry.
pub fn load_registry(path: &Path) -> Result<EntityRegistry, ApiError> {
    let json: String = std::fs::read_to_string(path).map_err(|e| ApiError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let registry: EntityRegistry = EntityRegistry::from_json(&json).map_err(translate_domain_error)?;
    info!(path = %path.display(), "Loaded entity registry");
    Ok(registry)
}

fn decode_document(format: Format, source: &ImportSource) -> Result<SourceDocument, ImportError> {
    if format.is_tabular() {
        Ok(SourceDocument::Table(read_table(&source.bytes, &source.mime)?))
    } else {
        decode_text(&source.bytes)
            .map(SourceDocument::Xml)
            .map_err(|e| {
                ImportError::new(
                    ImportErrorKind::HeaderMismatch,
                    format!("Not a valid eCH xml file: {e}"),
                )
            })
    }
}

/// Decodes, parses and guards a vote result file without storing anything.
///
/// # Errors
///
/// Returns `ApiError::InvalidInput` if the requested ballot is not owned by
/// the vote.
pub fn evaluate_vote_source(
    vote: &VoteData,
    registry: &EntityRegistry,
    format: Format,
    source: &ImportSource,
    options: &ImportOptions,
) -> Result<ImportOutcome, ApiError> {
    if !vote.ballot_types.contains(&options.ballot_type) {
        return Err(ApiError::InvalidInput {
            field: String::from("ballot_type"),
            message: format!(
                "Vote {} has no {} ballot",
                vote.vote_id, options.ballot_type
            ),
        });
    }

    let outcome: ImportOutcome = match decode_document(format, source) {
        Ok(document) => import_vote_document(
            format,
            &document,
            registry,
            &vote.context(options.ballot_type, options.vote_number),
        ),
        Err(err) => ImportOutcome::Rejected(vec![err]),
    };
    Ok(outcome.with_filename(&source.filename))
}

/// Decodes, parses and guards a party result file without storing anything.
#[must_use]
pub fn evaluate_party_source(election: &ElectionData, source: &ImportSource) -> ImportOutcome {
    let outcome: ImportOutcome = match read_table(&source.bytes, &source.mime) {
        Ok(table) => import_party_table(&table, election.year),
        Err(err) => ImportOutcome::Rejected(vec![err.into()]),
    };
    outcome.with_filename(&source.filename)
}

/// Decodes, parses and guards an election result file in the internal
/// election format without storing anything.
#[must_use]
pub fn evaluate_election_source(
    election: &ElectionData,
    registry: &EntityRegistry,
    source: &ImportSource,
) -> ImportOutcome {
    let outcome: ImportOutcome = match read_table(&source.bytes, &source.mime) {
        Ok(table) => import_election_table(&table, registry, &election.context()),
        Err(err) => ImportOutcome::Rejected(vec![err.into()]),
    };
    outcome.with_filename(&source.filename)
}

/// Stores an accepted vote outcome and logs either result.
///
/// # Errors
///
/// Returns an error if the storage transaction fails.
pub fn store_vote_outcome(
    persistence: &mut Persistence,
    vote_id: i64,
    outcome: &ImportOutcome,
) -> Result<(), ApiError> {
    match outcome {
        ImportOutcome::Accepted(accepted) => {
            let written: usize = persistence.apply_vote_import(vote_id, accepted)?;
            info!(vote_id, written, skipped = accepted.skipped, "Vote import accepted");
        }
        ImportOutcome::Rejected(errors) => {
            warn!(vote_id, errors = errors.len(), "Vote import rejected");
        }
    }
    Ok(())
}

/// Stores an accepted party outcome and logs either result.
///
/// # Errors
///
/// Returns an error if the storage transaction fails.
pub fn store_party_outcome(
    persistence: &mut Persistence,
    election_id: i64,
    outcome: &ImportOutcome,
) -> Result<(), ApiError> {
    match outcome {
        ImportOutcome::Accepted(accepted) => {
            let written: usize = persistence.apply_party_import(election_id, accepted)?;
            info!(election_id, written, "Party import accepted");
        }
        ImportOutcome::Rejected(errors) => {
            warn!(election_id, errors = errors.len(), "Party import rejected");
        }
    }
    Ok(())
}

/// Stores an accepted election outcome and logs either result.
///
/// # Errors
///
/// Returns an error if the storage transaction fails.
pub fn store_election_outcome(
    persistence: &mut Persistence,
    election_id: i64,
    outcome: &ImportOutcome,
) -> Result<(), ApiError> {
    match outcome {
        ImportOutcome::Accepted(accepted) => {
            let written: usize = persistence.apply_election_import(election_id, accepted)?;
            info!(
                election_id,
                written,
                skipped = accepted.skipped,
                "Election import accepted"
            );
        }
        ImportOutcome::Rejected(errors) => {
            warn!(election_id, errors = errors.len(), "Election import rejected");
        }
    }
    Ok(())
}

fn require_election(
    persistence: &mut Persistence,
    election_id: i64,
) -> Result<ElectionData, ApiError> {
    persistence
        .get_election(election_id)?
        .ok_or_else(|| ApiError::ResourceNotFound {
            resource_type: String::from("Election"),
            message: format!("Election {election_id} does not exist"),
        })
}

/// Imports a vote result file into a stored vote.
///
/// Either every touched ballot is replaced with a complete result set, or
/// nothing is written and the outcome lists every error found.
///
/// # Arguments
///
/// * `persistence` - The storage handle
/// * `registry` - The entity registry of the principal
/// * `vote_id` - The target vote
/// * `format` - The format the file is written in
/// * `source` - The file to import
/// * `options` - Target ballot and business number
///
/// # Errors
///
/// Returns an error if the vote does not exist, does not own the target
/// ballot, or storage fails. Data problems are reported in the outcome.
pub fn import_vote(
    persistence: &mut Persistence,
    registry: &EntityRegistry,
    vote_id: i64,
    format: Format,
    source: &ImportSource,
    options: &ImportOptions,
) -> Result<ImportOutcome, ApiError> {
    let vote: VoteData = persistence
        .get_vote(vote_id)?
        .ok_or_else(|| ApiError::ResourceNotFound {
            resource_type: String::from("Vote"),
            message: format!("Vote {vote_id} does not exist"),
        })?;

    let outcome: ImportOutcome = evaluate_vote_source(&vote, registry, format, source, options)?;
    store_vote_outcome(persistence, vote_id, &outcome)?;
    Ok(outcome)
}

/// Imports a party result file into a stored election.
///
/// # Errors
///
/// Returns an error if the election does not exist or storage fails. Data
/// problems are reported in the outcome.
pub fn import_party_results(
    persistence: &mut Persistence,
    election_id: i64,
    source: &ImportSource,
) -> Result<ImportOutcome, ApiError> {
    let election: ElectionData = require_election(persistence, election_id)?;

    let outcome: ImportOutcome = evaluate_party_source(&election, source);
    store_party_outcome(persistence, election_id, &outcome)?;
    Ok(outcome)
}

/// Imports a candidate result file in the internal election format into a
/// stored election.
///
/// Either the election's entity, list and candidate results are replaced
/// with a complete snapshot, or nothing is written and the outcome lists
/// every error found.
///
/// # Errors
///
/// Returns an error if the election does not exist or storage fails. Data
/// problems are reported in the outcome.
pub fn import_election_results(
    persistence: &mut Persistence,
    registry: &EntityRegistry,
    election_id: i64,
    source: &ImportSource,
) -> Result<ImportOutcome, ApiError> {
    let election: ElectionData = require_election(persistence, election_id)?;

    let outcome: ImportOutcome = evaluate_election_source(&election, registry, source);
    store_election_outcome(persistence, election_id, &outcome)?;
    Ok(outcome)
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the API layer.

use tally::CoreError;
use tally_domain::DomainError;
use tally_persistence::PersistenceError;

use crate::archive::ArchiveError;

/// API-level errors.
///
/// Data problems in an uploaded file are never reported here; they come back
/// as a rejected `ImportOutcome`. These errors abort the attempt instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Reading a source or writing an archive failed.
    Io {
        /// The path being read or written.
        path: String,
        /// The underlying I/O error.
        message: String,
    },
    /// Invalid input was provided.
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A human-readable description of the error.
        message: String,
    },
    /// A requested resource was not found.
    ResourceNotFound {
        /// The type of resource that was not found.
        resource_type: String,
        /// A human-readable description of what was not found.
        message: String,
    },
    /// The storage layer failed.
    Storage {
        /// A description of the storage error.
        message: String,
    },
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, message } => write!(f, "I/O error on {path}: {message}"),
            Self::InvalidInput { field, message } => {
                write!(f, "Invalid input for field '{field}': {message}")
            }
            Self::ResourceNotFound {
                resource_type,
                message,
            } => {
                write!(f, "{resource_type} not found: {message}")
            }
            Self::Storage { message } => write!(f, "Storage error: {message}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<PersistenceError> for ApiError {
    fn from(err: PersistenceError) -> Self {
        translate_persistence_error(err)
    }
}

impl From<ArchiveError> for ApiError {
    fn from(err: ArchiveError) -> Self {
        match err {
            ArchiveError::NothingToArchive => Self::ResourceNotFound {
                resource_type: String::from("Archive subject"),
                message: err.to_string(),
            },
            ArchiveError::Io { ref path, .. }
            | ArchiveError::Csv { ref path, .. }
            | ArchiveError::Zip { ref path, .. } => Self::Io {
                path: path.clone(),
                message: err.to_string(),
            },
        }
    }
}

/// Translates a domain error into an API error.
#[must_use]
pub fn translate_domain_error(err: DomainError) -> ApiError {
    let field: &str = match &err {
        DomainError::InvalidStatus(_) => "status",
        DomainError::InvalidBallotType(_) => "ballot_type",
        DomainError::InvalidDomain(_) => "domain",
        DomainError::InvalidElectionType(_) => "election_type",
        DomainError::RegistryParse(_) => "registry",
    };
    ApiError::InvalidInput {
        field: field.to_string(),
        message: err.to_string(),
    }
}

/// Translates a core error into an API error.
#[must_use]
pub fn translate_core_error(err: CoreError) -> ApiError {
    match err {
        CoreError::UnknownFormat(_) => ApiError::InvalidInput {
            field: String::from("format"),
            message: err.to_string(),
        },
    }
}

/// Translates a persistence error into an API error.
///
/// Missing targets become lookup failures; everything else is a storage
/// failure.
#[must_use]
pub fn translate_persistence_error(err: PersistenceError) -> ApiError {
    match err {
        PersistenceError::VoteNotFound(id) => ApiError::ResourceNotFound {
            resource_type: String::from("Vote"),
            message: format!("Vote {id} does not exist"),
        },
        PersistenceError::ElectionNotFound(id) => ApiError::ResourceNotFound {
            resource_type: String::from("Election"),
            message: format!("Election {id} does not exist"),
        },
        PersistenceError::BallotNotFound { .. } => ApiError::InvalidInput {
            field: String::from("ballot_type"),
            message: err.to_string(),
        },
        other => ApiError::Storage {
            message: other.to_string(),
        },
    }
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

mod election;
mod error;
mod import_error;
mod records;
mod registry;
mod types;
mod validation;

#[cfg(test)]
mod tests;

pub use election::{
    Candidate, CandidateResult, ElectionEntityResult, ElectionList, ElectionResults,
    ElectionType, ListResult,
};
pub use error::DomainError;
pub use import_error::{ImportError, ImportErrorKind};
pub use records::{Column, Header, LineRecord, Table};
pub use registry::{
    EXPATS_ENTITY_ID, EXPATS_NAME, EXPAT_SENTINELS, EntityInfo, EntityRegistry, EntityScope,
    Principal,
};
pub use types::{
    BallotType, Domain, EntityResult, PanachageResult, PartyResult, Status, BLANK_LIST_ID,
};
pub use validation::{
    DuplicateTracker, EntityResolution, check_election_sanity, check_sanity,
    contains_unknown_token, is_list_id, normalize_column, resolve_entity, validate_entity_id,
    validate_integer,
};

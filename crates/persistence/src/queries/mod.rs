// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Read-only queries.
//!
//! - `targets`: Votes and elections
//! - `results`: Stored ballot, party and panachage results
//! - `candidates`: Stored entity, list and candidate results of elections
//! - `export`: Result tables in their re-importable layouts

pub mod candidates;
pub mod export;
pub mod results;
pub mod targets;

use crate::error::PersistenceError;

/// Maps a stored count back to its domain width.
fn to_u32(value: i64, column: &str) -> Result<u32, PersistenceError> {
    u32::try_from(value)
        .map_err(|_| PersistenceError::InvalidRecord(format!("{column} out of range: {value}")))
}

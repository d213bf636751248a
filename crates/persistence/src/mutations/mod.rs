// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! State-changing operations.
//!
//! - `targets`: Registering votes and elections
//! - `results`: Clear-and-replace application of accepted imports
//! - `candidates`: The same for candidate and list results of elections

pub mod candidates;
pub mod results;
pub mod targets;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::error::PersistenceError;

/// Current UTC time as an RFC 3339 string.
fn now_timestamp() -> Result<String, PersistenceError> {
    Ok(OffsetDateTime::now_utc().format(&Rfc3339)?)
}

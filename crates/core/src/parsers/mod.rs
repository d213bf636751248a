// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! One parser per supported result format.

mod default;
mod ech0252;
mod election;
mod internal;
mod party;
mod wabsti_cantonal;
mod wabsti_municipality;

pub use default::DefaultParser;
pub use ech0252::parse_ech0252;
pub use election::parse_internal_election;
pub use internal::InternalParser;
pub use party::{ParsedParties, parse_party_results};
pub use wabsti_cantonal::WabstiCantonalParser;
pub use wabsti_municipality::WabstiMunicipalityParser;

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

mod context;
mod error;
mod format;
mod guard;
mod parsed;
mod parsers;

#[cfg(test)]
mod tests;

pub use context::{BallotContext, ElectionContext};
pub use error::CoreError;
pub use format::{Format, RowParser, SourceDocument};
pub use guard::{AcceptedImport, ImportOutcome, evaluate, evaluate_election, evaluate_parties};
pub use parsed::{ParsedBallots, ParsedElection};
pub use parsers::{
    DefaultParser, InternalParser, ParsedParties, WabstiCantonalParser,
    WabstiMunicipalityParser, parse_ech0252, parse_internal_election, parse_party_results,
};

use tally_domain::{EntityRegistry, EntityScope};

/// Parses a decoded vote result document and runs the consistency guard.
///
/// This is the pure part of an import: nothing is written. The returned
/// outcome is either the complete set of results to store or every error
/// found in the document.
///
/// # Arguments
///
/// * `format` - The format the document is written in
/// * `document` - The decoded table or XML text
/// * `registry` - The entity registry of the principal
/// * `context` - The target vote and its configuration
#[must_use]
pub fn import_vote_document(
    format: Format,
    document: &SourceDocument,
    registry: &EntityRegistry,
    context: &BallotContext,
) -> ImportOutcome {
    let scope: EntityScope<'_> = context.scope(registry);
    let parsed: ParsedBallots = format.parse(document, &scope, context);
    evaluate(parsed, &scope)
}

/// Parses a party result table and runs the consistency guard.
#[must_use]
pub fn import_party_table(table: &tally_domain::Table, election_year: i32) -> ImportOutcome {
    evaluate_parties(parse_party_results(table, election_year))
}

/// Parses an election result table in the internal format and runs the
/// consistency guard.
///
/// # Arguments
///
/// * `table` - The decoded table
/// * `registry` - The entity registry of the principal
/// * `context` - The target election and its configuration
#[must_use]
pub fn import_election_table(
    table: &tally_domain::Table,
    registry: &EntityRegistry,
    context: &ElectionContext,
) -> ImportOutcome {
    let scope: EntityScope<'_> = context.scope(registry);
    evaluate_election(parse_internal_election(table, &scope, context), &scope)
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Boundary between transports and the results pipeline.
//!
//! Turns raw files into decoded tables, runs the parsers and the consistency
//! guard, hands accepted outcomes to storage and writes result archives.

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

mod archive;
mod error;
mod import;
mod tabular;

#[cfg(test)]
mod tests;

pub use archive::{
    ArchiveError, ArchiveExporter, ArchiveSubject, ArchiveSummary, MAX_SLUG_LENGTH, SubjectKind,
    collect_subjects, export_archive, slugify,
};
pub use error::{
    ApiError, translate_core_error, translate_domain_error, translate_persistence_error,
};
pub use import::{
    ImportOptions, ImportSource, evaluate_election_source, evaluate_party_source,
    evaluate_vote_source, guess_mime, import_election_results, import_party_results, import_vote,
    load_registry, parse_ballot_type, parse_election_type, parse_format, store_election_outcome,
    store_party_outcome, store_vote_outcome,
};
pub use tabular::{RESULT_SHEET, ReadError, decode_text, is_text_mime, read_table};

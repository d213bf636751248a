// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::context::BallotContext;
use crate::error::CoreError;
use crate::parsed::ParsedBallots;
use crate::parsers::{
    DefaultParser, InternalParser, WabstiCantonalParser, WabstiMunicipalityParser, parse_ech0252,
};
use std::str::FromStr;
use tally_domain::{EntityScope, ImportError, ImportErrorKind, Table};

/// A parser for one tabular result format.
pub trait RowParser {
    /// Reads every row of the table into candidate results and row errors.
    fn parse(
        &self,
        table: &Table,
        scope: &EntityScope<'_>,
        context: &BallotContext,
    ) -> ParsedBallots;
}

/// The supported vote result formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Hand-made spreadsheet with German column titles.
    Default,
    /// The format written by the archive export.
    Internal,
    /// Wabsti export with one row per municipality and business.
    WabstiMunicipality,
    /// Cantonal Wabsti export with one column group per ballot.
    WabstiCantonal,
    /// eCH-0252 XML delivery.
    Ech0252,
}

impl Format {
    pub const ALL: [Self; 5] = [
        Self::Default,
        Self::Internal,
        Self::WabstiMunicipality,
        Self::WabstiCantonal,
        Self::Ech0252,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Internal => "internal",
            Self::WabstiMunicipality => "wabsti_municipality",
            Self::WabstiCantonal => "wabsti_cantonal",
            Self::Ech0252 => "ech_0252",
        }
    }

    /// Returns whether the format is read through the tabular reader.
    #[must_use]
    pub const fn is_tabular(&self) -> bool {
        !matches!(self, Self::Ech0252)
    }

    /// Parses a decoded source document.
    ///
    /// A document of the wrong shape for the format (a table for the XML
    /// format or the reverse) is reported as a header mismatch.
    #[must_use]
    pub fn parse(
        &self,
        document: &SourceDocument,
        scope: &EntityScope<'_>,
        context: &BallotContext,
    ) -> ParsedBallots {
        let parsed: ParsedBallots = match (self, document) {
            (Self::Default, SourceDocument::Table(table)) => {
                DefaultParser.parse(table, scope, context)
            }
            (Self::Internal, SourceDocument::Table(table)) => {
                InternalParser.parse(table, scope, context)
            }
            (Self::WabstiMunicipality, SourceDocument::Table(table)) => {
                WabstiMunicipalityParser.parse(table, scope, context)
            }
            (Self::WabstiCantonal, SourceDocument::Table(table)) => {
                WabstiCantonalParser.parse(table, scope, context)
            }
            (Self::Ech0252, SourceDocument::Xml(xml)) => parse_ech0252(xml, scope, context),
            (Self::Ech0252, SourceDocument::Table(_)) => ParsedBallots::failed(ImportError::new(
                ImportErrorKind::HeaderMismatch,
                "Not a valid eCH xml file: expected an XML document",
            )),
            (_, SourceDocument::Xml(_)) => ParsedBallots::failed(ImportError::new(
                ImportErrorKind::HeaderMismatch,
                "Not a valid csv/xls/xlsx file.",
            )),
        };

        tracing::debug!(
            format = self.as_str(),
            processed = parsed.processed,
            skipped = parsed.skipped,
            errors = parsed.errors.len(),
            "Parsed result file"
        );
        parsed
    }
}

impl FromStr for Format {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|format| format.as_str() == s.trim())
            .ok_or_else(|| CoreError::UnknownFormat(s.to_string()))
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A source file after decoding, before parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceDocument {
    Table(Table),
    Xml(String),
}

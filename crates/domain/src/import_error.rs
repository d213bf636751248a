// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use serde::{Deserialize, Serialize};

/// The closed set of problems an import can report about its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImportErrorKind {
    /// The file could not be decoded or lacks required columns.
    HeaderMismatch,
    /// An entity id cell is not an integer.
    InvalidId,
    /// The entity is not in the registry or outside the ballot's scope.
    UnknownEntity,
    /// The same entity appears twice for one ballot.
    DuplicateEntity,
    /// A value cell could not be parsed.
    FieldParseError,
    /// The parsed values contradict each other.
    SanityViolation,
    /// Identifiers across rows do not refer to each other consistently.
    InconsistentReferences,
    /// The file contained no usable row.
    NoDataFound,
}

impl ImportErrorKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::HeaderMismatch => "header-mismatch",
            Self::InvalidId => "invalid-id",
            Self::UnknownEntity => "unknown-entity",
            Self::DuplicateEntity => "duplicate-entity",
            Self::FieldParseError => "field-parse-error",
            Self::SanityViolation => "sanity-violation",
            Self::InconsistentReferences => "inconsistent-references",
            Self::NoDataFound => "no-data-found",
        }
    }
}

impl std::fmt::Display for ImportErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user-facing problem found in an uploaded file.
///
/// Import errors are collected, never propagated with `?`: a single parse
/// pass gathers every error it can find and the caller rejects the whole
/// file if the list is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportError {
    pub kind: ImportErrorKind,
    /// Source line number; the header is line 1.
    pub row_number: Option<usize>,
    pub filename: Option<String>,
    pub message: String,
}

impl ImportError {
    /// Creates an error not tied to a row.
    #[must_use]
    pub fn new(kind: ImportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            row_number: None,
            filename: None,
            message: message.into(),
        }
    }

    /// Creates an error for a specific source line.
    #[must_use]
    pub fn at_row(kind: ImportErrorKind, row_number: usize, message: impl Into<String>) -> Self {
        Self {
            kind,
            row_number: Some(row_number),
            filename: None,
            message: message.into(),
        }
    }

    /// Attaches the name of the file the error was found in.
    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// The canonical "nothing usable in this file" error.
    #[must_use]
    pub fn no_data() -> Self {
        Self::new(ImportErrorKind::NoDataFound, "No data found")
    }
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(filename) = &self.filename {
            write!(f, "{filename}: ")?;
        }
        if let Some(row) = self.row_number {
            write!(f, "line {row}: ")?;
        }
        write!(f, "{} ({})", self.message, self.kind)
    }
}

impl std::error::Error for ImportError {}

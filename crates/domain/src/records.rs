// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Header-named rows as produced by the tabular reader.

use crate::import_error::{ImportError, ImportErrorKind};
use crate::validation::normalize_column;
use std::collections::HashMap;

/// A resolved column of a [`Header`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Column {
    index: usize,
    name: String,
}

impl Column {
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// The normalized column name, used in error messages.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Normalized column names of a table and their positions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    titles: Vec<String>,
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl Header {
    /// Builds a header from raw column titles.
    ///
    /// Titles are normalized with [`normalize_column`]. A title seen for the
    /// n-th time (n > 1) is renamed to `<title>_<n>` so every column stays
    /// addressable.
    #[must_use]
    pub fn new<S: AsRef<str>>(raw: &[S]) -> Self {
        let mut names: Vec<String> = Vec::with_capacity(raw.len());
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut occurrences: HashMap<String, usize> = HashMap::new();

        for (position, title) in raw.iter().enumerate() {
            let base: String = normalize_column(title.as_ref());
            let seen: &mut usize = occurrences.entry(base.clone()).or_insert(0);
            *seen += 1;
            let mut name: String = if *seen == 1 {
                base.clone()
            } else {
                format!("{base}_{seen}")
            };
            // A literal `name_2` column may already exist.
            while index.contains_key(&name) {
                *seen += 1;
                name = format!("{base}_{seen}");
            }
            index.insert(name.clone(), position);
            names.push(name);
        }

        Self {
            titles: raw.iter().map(|title| title.as_ref().trim().to_string()).collect(),
            names,
            index,
        }
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Looks up a column by its expected title (normalized before lookup).
    #[must_use]
    pub fn column(&self, expected: &str) -> Option<Column> {
        let name: String = normalize_column(expected);
        self.index
            .get(&name)
            .map(|&index| Column { index, name })
    }

    /// Resolves every expected column or reports all missing ones at once.
    ///
    /// # Errors
    ///
    /// Returns a `HeaderMismatch` error listing the missing titles, lowercased.
    pub fn require<const N: usize>(&self, expected: [&str; N]) -> Result<[Column; N], ImportError> {
        let found: [Option<Column>; N] = expected.map(|title| self.column(title));
        let missing: Vec<String> = expected
            .iter()
            .zip(found.iter())
            .filter(|(_, column)| column.is_none())
            .map(|(title, _)| title.to_lowercase())
            .collect();
        if !missing.is_empty() {
            return Err(ImportError::new(
                ImportErrorKind::HeaderMismatch,
                format!("Missing columns: '{}'", missing.join(", ")),
            ));
        }
        Ok(found.map(Option::unwrap_or_default))
    }

    /// Columns whose normalized name starts with `prefix`.
    ///
    /// The remainder is taken from the original title so identifiers embedded
    /// in column titles keep their punctuation.
    #[must_use]
    pub fn columns_with_prefix(&self, prefix: &str) -> Vec<(Column, String)> {
        let skip: usize = prefix.chars().count();
        self.names
            .iter()
            .zip(self.titles.iter())
            .enumerate()
            .filter(|(_, (name, _))| name.starts_with(prefix))
            .map(|(index, (name, title))| {
                (
                    Column {
                        index,
                        name: name.clone(),
                    },
                    title.chars().skip(skip).collect(),
                )
            })
            .collect()
    }
}

/// One data row of a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRecord {
    /// Source line number of the row; the header is usually line 1.
    pub rownumber: usize,
    pub cells: Vec<String>,
}

impl LineRecord {
    #[must_use]
    pub const fn new(rownumber: usize, cells: Vec<String>) -> Self {
        Self { rownumber, cells }
    }

    /// The trimmed cell of a column; short rows read as empty.
    #[must_use]
    pub fn get(&self, column: &Column) -> &str {
        self.cells
            .get(column.index)
            .map_or("", |cell| cell.trim())
    }

    /// Like [`Self::get`] for a column that may be absent from the header.
    #[must_use]
    pub fn get_optional(&self, column: Option<&Column>) -> &str {
        column.map_or("", |column| self.get(column))
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|cell| cell.trim().is_empty())
    }
}

/// A decoded file: one header and its data rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub header: Header,
    pub rows: Vec<LineRecord>,
}

impl Table {
    /// Builds a table from raw rows where the first row is the header.
    ///
    /// Rows are numbered as consecutive source lines starting at 1.
    #[must_use]
    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        Self::from_numbered_rows(
            rows.into_iter()
                .enumerate()
                .map(|(offset, cells)| (offset + 1, cells))
                .collect(),
        )
    }

    /// Builds a table from rows tagged with their source line numbers.
    ///
    /// The first row is the header. Readers that drop lines (blank CSV
    /// lines, workbook ranges not starting at row 1) pass the real line so
    /// errors point at the line the operator sees.
    #[must_use]
    pub fn from_numbered_rows(rows: Vec<(usize, Vec<String>)>) -> Self {
        let mut rows = rows.into_iter();
        let header: Header = rows
            .next()
            .map_or_else(Header::default, |(_, titles)| Header::new(&titles));
        let rows: Vec<LineRecord> = rows
            .map(|(line, cells)| LineRecord::new(line, cells))
            .collect();
        Self { header, rows }
    }
}

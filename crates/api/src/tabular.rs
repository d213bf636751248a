// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Decoding of uploaded CSV, XLS and XLSX files into header-named rows.
//!
//! Delimited text is decoded from its byte-order mark if present, then as
//! strict UTF-8, then as Windows-1252. The delimiter is sniffed from the
//! header line. Anything not declared as text is opened as a workbook,
//! preferring a sheet named `Resultate`.

use calamine::{DataType, Range, Reader, Xls, Xlsx};
use encoding_rs::{Encoding, WINDOWS_1252};
use std::borrow::Cow;
use std::io::Cursor;
use tally_domain::{ImportError, ImportErrorKind, Table};
use thiserror::Error;
use tracing::debug;

/// MIME types read as delimited text.
pub const TEXT_MIME_TYPES: [&str; 2] = ["text/plain", "text/csv"];

/// Sheet read from workbooks carrying more than one sheet.
pub const RESULT_SHEET: &str = "Resultate";

const XLSX_MAGIC: &[u8] = b"PK\x03\x04";
const XLS_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const DELIMITERS: [u8; 3] = [b',', b';', b'\t'];

/// A row's 1-based source line and its cells.
type NumberedRow = (usize, Vec<String>);

/// Reasons a file cannot be turned into a table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReadError {
    /// The file holds no rows.
    #[error("The csv/xls/xlsx file is empty.")]
    Empty,

    /// Delimited text that cannot be decoded or split into records.
    #[error("Not a valid csv/xls/xlsx file.")]
    InvalidText,

    /// A workbook that cannot be opened or has no readable sheet.
    #[error("Not a valid xls/xlsx file.")]
    InvalidWorkbook,
}

impl From<ReadError> for ImportError {
    fn from(err: ReadError) -> Self {
        Self::new(ImportErrorKind::HeaderMismatch, err.to_string())
    }
}

/// Returns whether a MIME type is read as delimited text.
#[must_use]
pub fn is_text_mime(mime: &str) -> bool {
    let essence: &str = mime.split(';').next().unwrap_or_default().trim();
    TEXT_MIME_TYPES
        .iter()
        .any(|text| essence.eq_ignore_ascii_case(text))
}

/// Decodes a byte buffer into a table.
///
/// The first row becomes the header; duplicate header names are
/// disambiguated positionally. Data rows keep their source line numbers.
///
/// # Arguments
///
/// * `bytes` - The raw file content
/// * `mime` - The declared MIME type
///
/// # Errors
///
/// Returns a `ReadError` if the file cannot be decoded or holds no rows.
pub fn read_table(bytes: &[u8], mime: &str) -> Result<Table, ReadError> {
    let rows: Vec<NumberedRow> = if is_text_mime(mime) {
        read_delimited(bytes)?
    } else {
        read_workbook(bytes)?
    };

    if rows
        .iter()
        .all(|(_, row)| row.iter().all(|cell| cell.trim().is_empty()))
    {
        return Err(ReadError::Empty);
    }

    let table: Table = Table::from_numbered_rows(rows);
    debug!(
        mime,
        columns = table.header.names().len(),
        rows = table.rows.len(),
        "Decoded tabular file"
    );
    Ok(table)
}

/// Decodes text, honoring a byte-order mark, then strict UTF-8, then
/// Windows-1252.
///
/// # Errors
///
/// Returns `ReadError::InvalidText` if a BOM-declared encoding does not
/// decode cleanly.
pub fn decode_text(bytes: &[u8]) -> Result<String, ReadError> {
    if let Some((encoding, bom_length)) = Encoding::for_bom(bytes) {
        let (text, had_errors): (Cow<'_, str>, bool) =
            encoding.decode_without_bom_handling(&bytes[bom_length..]);
        if had_errors {
            return Err(ReadError::InvalidText);
        }
        debug!(encoding = encoding.name(), "Decoded text from byte-order mark");
        return Ok(text.into_owned());
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return Ok(text.to_string());
    }

    let (text, _, had_errors) = WINDOWS_1252.decode(bytes);
    if had_errors {
        return Err(ReadError::InvalidText);
    }
    debug!("Decoded text as windows-1252");
    Ok(text.into_owned())
}

/// Picks the delimiter occurring most often in the header line.
fn sniff_delimiter(text: &str) -> u8 {
    let header: &str = text.lines().find(|line| !line.trim().is_empty()).unwrap_or_default();
    let mut best: (u8, usize) = (b',', 0);
    for delimiter in DELIMITERS {
        let count: usize = header.bytes().filter(|byte| *byte == delimiter).count();
        if count > best.1 {
            best = (delimiter, count);
        }
    }
    best.0
}

// The csv reader drops blank lines, so each record carries its own line.
fn read_delimited(bytes: &[u8]) -> Result<Vec<NumberedRow>, ReadError> {
    let text: String = decode_text(bytes)?;
    if text.trim().is_empty() {
        return Err(ReadError::Empty);
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(sniff_delimiter(&text))
        .from_reader(text.as_bytes());

    let mut rows: Vec<NumberedRow> = Vec::new();
    for record in reader.records() {
        let record: csv::StringRecord = record.map_err(|e| {
            debug!(error = %e, "Rejected delimited text");
            ReadError::InvalidText
        })?;
        let line: usize = record
            .position()
            .and_then(|position| usize::try_from(position.line()).ok())
            .unwrap_or(rows.len() + 1);
        rows.push((line, record.iter().map(ToString::to_string).collect()));
    }
    Ok(rows)
}

/// Chooses the result sheet if present, otherwise the first sheet.
fn preferred_sheet(names: &[String]) -> Option<String> {
    names
        .iter()
        .find(|name| name.trim().eq_ignore_ascii_case(RESULT_SHEET))
        .or_else(|| names.first())
        .cloned()
}

fn read_workbook(bytes: &[u8]) -> Result<Vec<NumberedRow>, ReadError> {
    let range: Range<DataType> = if bytes.starts_with(XLSX_MAGIC) {
        let mut workbook: Xlsx<Cursor<&[u8]>> =
            Xlsx::new(Cursor::new(bytes)).map_err(|_| ReadError::InvalidWorkbook)?;
        let sheet: String =
            preferred_sheet(&workbook.sheet_names()).ok_or(ReadError::InvalidWorkbook)?;
        workbook
            .worksheet_range(&sheet)
            .ok_or(ReadError::InvalidWorkbook)?
            .map_err(|_| ReadError::InvalidWorkbook)?
    } else if bytes.starts_with(XLS_MAGIC) {
        let mut workbook: Xls<Cursor<&[u8]>> =
            Xls::new(Cursor::new(bytes)).map_err(|_| ReadError::InvalidWorkbook)?;
        let sheet: String =
            preferred_sheet(&workbook.sheet_names()).ok_or(ReadError::InvalidWorkbook)?;
        workbook
            .worksheet_range(&sheet)
            .ok_or(ReadError::InvalidWorkbook)?
            .map_err(|_| ReadError::InvalidWorkbook)?
    } else if bytes.is_empty() {
        return Err(ReadError::Empty);
    } else {
        return Err(ReadError::InvalidWorkbook);
    };

    // The used range may start below row 1 when leading rows are empty.
    let first_line: usize = range
        .start()
        .and_then(|(row, _)| usize::try_from(row).ok())
        .map_or(1, |row| row + 1);
    Ok(range
        .rows()
        .enumerate()
        .map(|(offset, row)| {
            (
                first_line + offset,
                row.iter().map(ToString::to_string).collect(),
            )
        })
        .collect())
}

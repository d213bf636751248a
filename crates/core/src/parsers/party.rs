// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::parsed::RowCheck;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tally_domain::{
    BLANK_LIST_ID, Column, ImportError, ImportErrorKind, PanachageResult, PartyResult, Table,
    is_list_id,
};

const COLUMNS: [&str; 7] = [
    "year",
    "total_votes",
    "id",
    "name",
    "color",
    "mandates",
    "votes",
];

const PANACHAGE_PREFIX: &str = "panachage_votes_from_";

/// Party and panachage candidates of one parse pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedParties {
    pub parties: Vec<PartyResult>,
    /// `None` when the file has no panachage columns.
    pub panachage: Option<Vec<PanachageResult>>,
    pub errors: Vec<ImportError>,
}

fn is_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Reads an optional decimal cell, normalized to two fractional digits.
fn decimal(row: &mut RowCheck<'_>, column: Option<&Column>) -> Option<String> {
    let column: &Column = column?;
    let value: &str = row.record().get(column);
    if value.is_empty() {
        return None;
    }
    match value.parse::<f64>() {
        Ok(number) if number.is_finite() && number >= 0.0 => Some(format!("{number:.2}")),
        _ => {
            row.field_error(format!("Invalid decimal number: {}", column.name()));
            None
        }
    }
}

/// Parses party results and panachage transfers of an election.
///
/// Panachage cells are only read for rows of `election_year`. The total
/// votes of each year must agree across that year's rows, and every list id
/// referenced by a panachage column must be a party of the election year.
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn parse_party_results(table: &Table, election_year: i32) -> ParsedParties {
    let [year, total_votes, id, name, color, mandates, votes] =
        match table.header.require(COLUMNS) {
            Ok(columns) => columns,
            Err(err) => {
                return ParsedParties {
                    errors: vec![err],
                    ..ParsedParties::default()
                };
            }
        };
    let voters_count: Option<Column> = table.header.column("voters_count");
    let voters_count_percentage: Option<Column> =
        table.header.column("voters_count_percentage");
    let panachage_columns: Vec<(Column, String)> =
        table.header.columns_with_prefix(PANACHAGE_PREFIX);

    let mut parsed: ParsedParties = ParsedParties::default();
    let mut panachage: Vec<PanachageResult> = Vec::new();
    let mut seen: HashSet<(i32, String)> = HashSet::new();

    for record in &table.rows {
        let mut row: RowCheck<'_> = RowCheck::new(record);
        if record.is_blank() {
            row.field_error("Invalid values");
            parsed.errors.extend(row.into_errors());
            continue;
        }

        let party_year: i32 = i32::try_from(row.integer(&year)).unwrap_or_else(|_| {
            row.field_error(format!("Invalid integer: {}", year.name()));
            0
        });
        let party_total: u32 = row.integer(&total_votes);
        let party_id: String = record.get(&id).to_string();
        if !is_list_id(&party_id) {
            row.field_error(format!("Not an alphanumeric: {}", id.name()));
        }
        let party_color: Option<String> = match record.get(&color) {
            "" => None,
            value if is_color(value) => Some(value.to_string()),
            _ => {
                row.field_error(format!("Invalid color: {}", color.name()));
                None
            }
        };
        let party_mandates: u32 = row.integer(&mandates);
        let party_votes: u32 = row.integer(&votes);
        let party_voters_count: Option<String> = decimal(&mut row, voters_count.as_ref());
        let party_voters_percentage: Option<String> =
            decimal(&mut row, voters_count_percentage.as_ref());

        if row.error_count() == 0 && !seen.insert((party_year, party_id.clone())) {
            row.push(ImportError::at_row(
                ImportErrorKind::DuplicateEntity,
                record.rownumber,
                format!("{party_year}/{party_id} was found twice"),
            ));
        }

        let mut transfers: Vec<PanachageResult> = Vec::new();
        if party_year == election_year {
            for (column, list_id) in &panachage_columns {
                if record.get(column).is_empty() {
                    continue;
                }
                let transferred: u32 = row.integer(column);
                let source: &str = if list_id == BLANK_LIST_ID { "" } else { list_id };
                if source == party_id {
                    continue;
                }
                transfers.push(PanachageResult {
                    source: source.to_string(),
                    target: party_id.clone(),
                    votes: transferred,
                });
            }
        }

        let errors: Vec<ImportError> = row.into_errors();
        if errors.is_empty() {
            parsed.parties.push(PartyResult {
                year: party_year,
                total_votes: party_total,
                party_id,
                name: record.get(&name).to_string(),
                color: party_color,
                mandates: party_mandates,
                votes: party_votes,
                voters_count: party_voters_count,
                voters_count_percentage: party_voters_percentage,
            });
            panachage.extend(transfers);
        } else {
            parsed.errors.extend(errors);
        }
    }

    if !parsed.errors.is_empty() {
        return parsed;
    }

    let mut totals: BTreeMap<i32, BTreeSet<u32>> = BTreeMap::new();
    for party in &parsed.parties {
        totals.entry(party.year).or_default().insert(party.total_votes);
    }
    for (year, values) in &totals {
        if values.len() > 1 {
            parsed.errors.push(ImportError::new(
                ImportErrorKind::SanityViolation,
                format!("Total votes of {year} are not consistent"),
            ));
        }
    }

    let election_parties: BTreeSet<&str> = parsed
        .parties
        .iter()
        .filter(|party| party.year == election_year)
        .map(|party| party.party_id.as_str())
        .collect();
    if election_parties.is_empty() {
        parsed.errors.push(ImportError::new(
            ImportErrorKind::NoDataFound,
            format!("No party results for year {election_year}"),
        ));
    }

    let consistent: bool = panachage_columns
        .iter()
        .all(|(_, list_id)| list_id == BLANK_LIST_ID || election_parties.contains(list_id.as_str()));
    if !consistent {
        parsed.errors.push(ImportError::new(
            ImportErrorKind::InconsistentReferences,
            "Panachage results ids and id not consistent",
        ));
    }

    if !panachage_columns.is_empty() {
        panachage.sort();
        parsed.panachage = Some(panachage);
    }
    parsed
}

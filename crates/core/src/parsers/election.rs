// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::context::ElectionContext;
use crate::parsed::{ElectionRow, ParsedElection, RowCheck, RowEntity};
use std::collections::HashSet;
use tally_domain::{
    Candidate, Column, ElectionEntityResult, ElectionList, ElectionType, EntityScope, Status,
    Table, contains_unknown_token, is_list_id,
};

const COLUMNS: [&str; 14] = [
    "election_status",
    "entity_id",
    "entity_counted",
    "entity_eligible_voters",
    "entity_received_ballots",
    "entity_blank_ballots",
    "entity_invalid_ballots",
    "entity_blank_votes",
    "entity_invalid_votes",
    "candidate_family_name",
    "candidate_first_name",
    "candidate_id",
    "candidate_elected",
    "candidate_votes",
];

/// Required on top of [`COLUMNS`] in proportional elections.
const LIST_COLUMNS: [&str; 4] = [
    "list_name",
    "list_id",
    "list_number_of_mandates",
    "list_votes",
];

fn read_list(row: &mut RowCheck<'_>, columns: &[Column; 4]) -> (ElectionList, u32) {
    let [name, list_id, mandates, votes] = columns;
    let value: &str = row.record().get(list_id);
    if !is_list_id(value) {
        row.field_error(format!("Not an alphanumeric: {}", list_id.name()));
    }
    let list: ElectionList = ElectionList {
        list_id: value.to_string(),
        name: row.record().get(name).to_string(),
        number_of_mandates: row.integer(mandates),
    };
    (list, row.integer(votes))
}

/// Parses an election file in the internal format.
///
/// Every row holds one candidate's votes in one entity, together with the
/// entity's ballot figures and, in proportional elections, the candidate's
/// list and that list's votes. Entities that have not counted yet keep their
/// row but all of their figures and votes are stored as zero.
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn parse_internal_election(
    table: &Table,
    scope: &EntityScope<'_>,
    context: &ElectionContext,
) -> ParsedElection {
    let [
        status,
        id,
        counted,
        eligible_voters,
        received_ballots,
        blank_ballots,
        invalid_ballots,
        blank_votes,
        invalid_votes,
        family_name,
        first_name,
        candidate_id,
        elected,
        candidate_votes,
    ] = match table.header.require(COLUMNS) {
        Ok(columns) => columns,
        Err(err) => return ParsedElection::failed(err),
    };
    let list_columns: Option<[Column; 4]> = match context.election_type {
        ElectionType::Proporz => match table.header.require(LIST_COLUMNS) {
            Ok(columns) => Some(columns),
            Err(err) => return ParsedElection::failed(err),
        },
        ElectionType::Majorz => None,
    };
    let expats: Option<Column> = table.header.column("entity_expats");
    let party: Option<Column> = table.header.column("candidate_party");
    let absolute_majority: Option<Column> = match context.election_type {
        ElectionType::Majorz => table.header.column("election_absolute_majority"),
        ElectionType::Proporz => None,
    };

    let mut parsed: ParsedElection = ParsedElection::default();
    let mut seen: HashSet<(u32, String)> = HashSet::new();

    for record in table.rows.iter().filter(|record| !record.is_blank()) {
        let mut row: RowCheck<'_> = RowCheck::new(record);

        let entity: RowEntity = row.entity(&id, scope);
        if matches!(entity, RowEntity::SkipExpats) {
            continue;
        }

        if contains_unknown_token(record, &[&eligible_voters, &received_ballots, &candidate_votes]) {
            parsed.skip_unknown(row, entity.id());
            continue;
        }

        let raw_status: &str = record.get(&status);
        let row_status: Option<Status> = if raw_status.is_empty() {
            Some(Status::Unknown)
        } else {
            raw_status.parse::<Status>().ok()
        };
        if row_status.is_none() {
            row.field_error("Invalid status");
        }

        let candidate_key: &str = record.get(&candidate_id);
        if candidate_key.is_empty() {
            row.field_error(format!("Empty value: {}", candidate_id.name()));
        }

        let entity_id: u32 = match entity.id() {
            Some(entity_id) => {
                if !candidate_key.is_empty() {
                    row.track_candidate(&mut seen, entity_id, candidate_key);
                }
                entity_id
            }
            None => 0,
        };

        let before_fields: usize = row.error_count();
        let mut result: ElectionEntityResult =
            ElectionEntityResult::not_counted(entity_id, &scope.info(entity_id));
        result.counted = record.get(&counted).eq_ignore_ascii_case("true");
        result.eligible_voters = row.integer(&eligible_voters);
        result.received_ballots = row.integer(&received_ballots);
        result.blank_ballots = row.integer(&blank_ballots);
        result.invalid_ballots = row.integer(&invalid_ballots);
        result.blank_votes = row.integer(&blank_votes);
        result.invalid_votes = row.integer(&invalid_votes);
        if let Some(expats) = &expats {
            result.expats = row.integer(expats);
        }
        if row.error_count() == before_fields {
            row.election_sanity(&result);
        }

        let mut votes: u32 = row.integer(&candidate_votes);
        let mut list: Option<(ElectionList, u32)> = list_columns
            .as_ref()
            .map(|columns| read_list(&mut row, columns));

        if let Some(column) = absolute_majority
            .as_ref()
            .filter(|column| !record.get(column).is_empty())
        {
            let majority: u32 = row.integer(column);
            parsed.absolute_majority = parsed.absolute_majority.or(Some(majority));
        }

        if !result.counted {
            result = ElectionEntityResult::not_counted(entity_id, &scope.info(entity_id));
            votes = 0;
            if let Some((_, list_votes)) = list.as_mut() {
                *list_votes = 0;
            }
        }

        let candidate: Candidate = Candidate {
            candidate_id: candidate_key.to_string(),
            family_name: record.get(&family_name).to_string(),
            first_name: record.get(&first_name).to_string(),
            elected: record.get(&elected).eq_ignore_ascii_case("true"),
            party: Some(record.get_optional(party.as_ref()))
                .filter(|value| !value.is_empty())
                .map(ToString::to_string),
            list_id: list.as_ref().map(|(list, _)| list.list_id.clone()),
        };

        // A row without a valid status already carries an error and is not buffered.
        parsed.accept(
            row,
            ElectionRow {
                result,
                candidate,
                candidate_votes: votes,
                list,
                status: row_status.unwrap_or(Status::Unknown),
            },
        );
    }

    parsed
}

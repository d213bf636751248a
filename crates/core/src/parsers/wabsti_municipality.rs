// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::context::BallotContext;
use crate::format::RowParser;
use crate::parsed::{ParsedBallots, RowCheck, RowEntity};
use tally_domain::{
    BallotType, Column, DuplicateTracker, EntityResult, EntityScope, Status, Table,
    contains_unknown_token,
};

const COLUMNS: [&str; 15] = [
    "SortGeschaeft",
    "BfsNrGemeinde",
    "Freigegeben",
    "Stimmberechtigte",
    "StmUngueltig",
    "StmLeer",
    "StmHGJa",
    "StmHGNein",
    "StmHGOhneAw",
    "StmN1Ja",
    "StmN1Nein",
    "StmN1OhneAw",
    "StmN2Ja",
    "StmN2Nein",
    "StmN2OhneAw",
];

/// Yes, no and no-answer columns of one ballot.
struct BallotColumns {
    ballot_type: BallotType,
    yeas: Column,
    nays: Column,
    no_answer: Column,
}

/// Parses the `Freigegeben` flag.
fn parse_released(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "ja" => Some(true),
        "0" | "false" | "nein" => Some(false),
        _ => None,
    }
}

/// Parser for the municipality-level Wabsti export.
///
/// Each row holds every ballot of one business for one municipality. Rows of
/// other businesses are ignored. A municipality counts as counted once its
/// row is released; the import is interim while any row is not.
#[derive(Debug, Clone, Copy, Default)]
pub struct WabstiMunicipalityParser;

impl RowParser for WabstiMunicipalityParser {
    #[allow(clippy::too_many_lines)]
    fn parse(
        &self,
        table: &Table,
        scope: &EntityScope<'_>,
        context: &BallotContext,
    ) -> ParsedBallots {
        let [
            business,
            id,
            released,
            eligible_voters,
            invalid,
            blank,
            hg_yeas,
            hg_nays,
            hg_no_answer,
            n1_yeas,
            n1_nays,
            n1_no_answer,
            n2_yeas,
            n2_nays,
            n2_no_answer,
        ] = match table.header.require(COLUMNS) {
            Ok(columns) => columns,
            Err(err) => return ParsedBallots::failed(err),
        };

        let ballots: Vec<BallotColumns> = [
            (BallotType::Proposal, hg_yeas, hg_nays, hg_no_answer),
            (BallotType::CounterProposal, n1_yeas, n1_nays, n1_no_answer),
            (BallotType::TieBreaker, n2_yeas, n2_nays, n2_no_answer),
        ]
        .into_iter()
        .filter(|(ballot_type, ..)| context.owns(*ballot_type))
        .map(|(ballot_type, yeas, nays, no_answer)| BallotColumns {
            ballot_type,
            yeas,
            nays,
            no_answer,
        })
        .collect();

        let mut significant: Vec<&Column> = vec![&eligible_voters, &invalid, &blank];
        for columns in &ballots {
            significant.extend([&columns.yeas, &columns.nays, &columns.no_answer]);
        }

        let mut parsed: ParsedBallots = ParsedBallots::default();
        let mut tracker: DuplicateTracker = DuplicateTracker::new();
        for columns in &ballots {
            parsed.touch(columns.ballot_type);
        }

        for record in table.rows.iter().filter(|record| !record.is_blank()) {
            let mut row: RowCheck<'_> = RowCheck::new(record);

            let number: u32 = row.integer(&business);
            if row.error_count() == 0 && number != context.vote_number {
                continue;
            }

            let entity: RowEntity = row.entity(&id, scope);
            if matches!(entity, RowEntity::SkipExpats) {
                continue;
            }

            if contains_unknown_token(record, &significant) {
                parsed.skip_unknown(row, entity.id());
                continue;
            }

            let entity_id: u32 = match entity.id() {
                Some(entity_id) => {
                    row.track(&mut tracker, BallotType::Proposal, entity_id);
                    entity_id
                }
                None => 0,
            };

            let is_released: bool = parse_released(record.get(&released)).unwrap_or_else(|| {
                row.field_error("Invalid values");
                false
            });

            let before_fields: usize = row.error_count();
            let eligible: u32 = row.integer(&eligible_voters);
            let invalid_votes: u32 = row.integer(&invalid);
            let blank_votes: Option<u32> = row.try_integer(&blank);

            let mut results: Vec<(BallotType, EntityResult)> = Vec::with_capacity(ballots.len());
            let mut empty_unreadable: bool = false;
            for columns in &ballots {
                let mut result: EntityResult =
                    EntityResult::not_counted(entity_id, &scope.info(entity_id));
                result.yeas = row.integer(&columns.yeas);
                result.nays = row.integer(&columns.nays);
                result.empty = match (blank_votes, row.try_integer(&columns.no_answer)) {
                    (Some(blank_votes), Some(no_answer)) => blank_votes
                        .checked_add(no_answer)
                        .unwrap_or_else(|| {
                            empty_unreadable = true;
                            0
                        }),
                    _ => {
                        empty_unreadable = true;
                        0
                    }
                };
                result.invalid = invalid_votes;
                result.eligible_voters = eligible;
                result.counted = is_released;
                results.push((columns.ballot_type, result));
            }
            if empty_unreadable {
                row.field_error("Could not read the empty votes");
            }

            if row.error_count() == before_fields {
                for (_, result) in &results {
                    row.sanity(result);
                }
            }

            let results: Vec<(BallotType, EntityResult)> = results
                .into_iter()
                .map(|(ballot_type, result)| {
                    if result.counted {
                        (ballot_type, result)
                    } else {
                        (
                            ballot_type,
                            EntityResult::not_counted(entity_id, &scope.info(entity_id)),
                        )
                    }
                })
                .collect();

            if row.error_count() == 0 {
                parsed.observe(if is_released {
                    Status::Final
                } else {
                    Status::Interim
                });
            }
            parsed.accept(row, results);
        }

        parsed
    }
}

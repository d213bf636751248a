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
    "Vorlage-Nr.",
    "BfS-Nr.",
    "Stimmberechtigte",
    "leere SZ",
    "ungültige SZ",
    "Ja",
    "Nein",
    "InitOAntw",
    "GegenvJa",
    "GegenvNein",
    "GegenvOAntw",
    "StichfrJa",
    "StichfrNein",
    "StichfrOAntw",
    "StimmBet",
];

/// Parses the turnout percentage, accepting a decimal comma.
fn parse_turnout(value: &str) -> Option<f64> {
    value
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|turnout| turnout.is_finite())
}

/// Parser for the cantonal Wabsti export.
///
/// Each row carries the proposal, counter-proposal and tie-breaker columns of
/// one business for one municipality. A turnout of zero marks a municipality
/// that has not counted yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct WabstiCantonalParser;

impl RowParser for WabstiCantonalParser {
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
            eligible_voters,
            blank,
            invalid,
            yeas,
            nays,
            no_answer,
            counter_yeas,
            counter_nays,
            counter_no_answer,
            tie_yeas,
            tie_nays,
            tie_no_answer,
            turnout,
        ] = match table.header.require(COLUMNS) {
            Ok(columns) => columns,
            Err(err) => return ParsedBallots::failed(err),
        };

        let ballots: Vec<(BallotType, [Column; 3])> = [
            (BallotType::Proposal, [yeas, nays, no_answer]),
            (
                BallotType::CounterProposal,
                [counter_yeas, counter_nays, counter_no_answer],
            ),
            (BallotType::TieBreaker, [tie_yeas, tie_nays, tie_no_answer]),
        ]
        .into_iter()
        .filter(|(ballot_type, _)| context.owns(*ballot_type))
        .collect();

        let mut significant: Vec<&Column> = vec![&eligible_voters, &blank, &invalid, &turnout];
        for (_, columns) in &ballots {
            significant.extend(columns.iter());
        }

        let mut parsed: ParsedBallots = ParsedBallots::default();
        let mut tracker: DuplicateTracker = DuplicateTracker::new();
        for (ballot_type, _) in &ballots {
            parsed.touch(*ballot_type);
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

            let before_fields: usize = row.error_count();
            let eligible: u32 = row.integer(&eligible_voters);
            let invalid_votes: u32 = row.integer(&invalid);
            let blank_votes: Option<u32> = row.try_integer(&blank);
            let counted: bool = match parse_turnout(record.get(&turnout)) {
                Some(turnout) => turnout > 0.0,
                None => {
                    row.field_error("Invalid float number: stimmbet");
                    false
                }
            };

            let mut results: Vec<(BallotType, EntityResult)> = Vec::with_capacity(ballots.len());
            let mut empty_unreadable: bool = false;
            for (ballot_type, [ballot_yeas, ballot_nays, ballot_no_answer]) in &ballots {
                let mut result: EntityResult =
                    EntityResult::not_counted(entity_id, &scope.info(entity_id));
                let ballot_yeas: u32 = row.integer(ballot_yeas);
                let ballot_nays: u32 = row.integer(ballot_nays);
                let empty: Option<u32> = blank_votes
                    .zip(row.try_integer(ballot_no_answer))
                    .and_then(|(blank_votes, no_answer)| blank_votes.checked_add(no_answer));
                if empty.is_none() {
                    empty_unreadable = true;
                }
                if counted {
                    result.counted = true;
                    result.eligible_voters = eligible;
                    result.yeas = ballot_yeas;
                    result.nays = ballot_nays;
                    result.empty = empty.unwrap_or_default();
                    result.invalid = invalid_votes;
                }
                results.push((*ballot_type, result));
            }
            if empty_unreadable {
                row.field_error("Could not read the empty votes");
            }

            if row.error_count() == before_fields {
                for (_, result) in &results {
                    row.sanity(result);
                }
            }

            parsed.accept(row, results);
        }

        parsed.observe(Status::Unknown);
        parsed
    }
}

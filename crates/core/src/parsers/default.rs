// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::context::BallotContext;
use crate::format::RowParser;
use crate::parsed::{ParsedBallots, RowCheck, RowEntity};
use tally_domain::{
    DuplicateTracker, EntityResult, EntityScope, Status, Table, contains_unknown_token,
};

const COLUMNS: [&str; 6] = [
    "ID",
    "Ja Stimmen",
    "Nein Stimmen",
    "Stimmberechtigte",
    "Leere Stimmzettel",
    "Ungültige Stimmzettel",
];

/// Parser for hand-made spreadsheets with one row per entity.
///
/// The file carries a single ballot chosen by the caller. Every row is
/// treated as counted; the status is left as unknown.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultParser;

impl RowParser for DefaultParser {
    fn parse(
        &self,
        table: &Table,
        scope: &EntityScope<'_>,
        context: &BallotContext,
    ) -> ParsedBallots {
        let [id, yeas, nays, eligible_voters, empty, invalid] = match table.header.require(COLUMNS)
        {
            Ok(columns) => columns,
            Err(err) => return ParsedBallots::failed(err),
        };

        let ballot_type = context.ballot_type;
        let mut parsed: ParsedBallots = ParsedBallots::default();
        let mut tracker: DuplicateTracker = DuplicateTracker::new();
        parsed.touch(ballot_type);

        for record in table.rows.iter().filter(|record| !record.is_blank()) {
            let mut row: RowCheck<'_> = RowCheck::new(record);
            let entity: RowEntity = row.entity(&id, scope);
            if matches!(entity, RowEntity::SkipExpats) {
                continue;
            }

            if contains_unknown_token(record, &[&yeas, &nays, &eligible_voters, &empty, &invalid]) {
                parsed.skip_unknown(row, entity.id());
                continue;
            }

            let entity_id: u32 = match entity.id() {
                Some(entity_id) => {
                    row.track(&mut tracker, ballot_type, entity_id);
                    entity_id
                }
                None => 0,
            };

            let before_fields: usize = row.error_count();
            let mut result: EntityResult = EntityResult::not_counted(entity_id, &scope.info(entity_id));
            result.counted = true;
            result.yeas = row.integer(&yeas);
            result.nays = row.integer(&nays);
            result.eligible_voters = row.integer(&eligible_voters);
            result.empty = row.integer(&empty);
            result.invalid = row.integer(&invalid);
            if row.error_count() == before_fields {
                row.sanity(&result);
            }

            parsed.accept(row, vec![(ballot_type, result)]);
        }

        parsed.observe(Status::Unknown);
        parsed
    }
}

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

const COLUMNS: [&str; 9] = [
    "status",
    "type",
    "entity_id",
    "counted",
    "yeas",
    "nays",
    "invalid",
    "empty",
    "eligible_voters",
];

/// Parser for the internal format, the layout of the archive export.
///
/// One file may carry rows for every ballot of a vote; each row names its
/// ballot in the `type` column and its status in the `status` column. Only
/// ballots that receive at least one row are replaced.
#[derive(Debug, Clone, Copy, Default)]
pub struct InternalParser;

impl RowParser for InternalParser {
    fn parse(
        &self,
        table: &Table,
        scope: &EntityScope<'_>,
        context: &BallotContext,
    ) -> ParsedBallots {
        let [status, ballot, id, counted, yeas, nays, invalid, empty, eligible_voters] =
            match table.header.require(COLUMNS) {
                Ok(columns) => columns,
                Err(err) => return ParsedBallots::failed(err),
            };
        let expats: Option<Column> = table.header.column("expats");

        let mut parsed: ParsedBallots = ParsedBallots::default();
        let mut tracker: DuplicateTracker = DuplicateTracker::new();

        for record in table.rows.iter().filter(|record| !record.is_blank()) {
            let mut row: RowCheck<'_> = RowCheck::new(record);

            let ballot_type: Option<BallotType> = record
                .get(&ballot)
                .parse::<BallotType>()
                .ok()
                .filter(|ballot_type| context.owns(*ballot_type));

            let entity: RowEntity = row.entity(&id, scope);
            if matches!(entity, RowEntity::SkipExpats) {
                continue;
            }

            if contains_unknown_token(record, &[&yeas, &nays, &invalid, &empty, &eligible_voters]) {
                if let (Some(ballot_type), Some(_)) = (ballot_type, entity.id()) {
                    parsed.touch(ballot_type);
                }
                parsed.skip_unknown(row, entity.id());
                continue;
            }

            let row_status: Option<Status> = record.get(&status).parse::<Status>().ok();
            if row_status.is_none() {
                row.field_error("Invalid status");
            }
            if ballot_type.is_none() {
                row.field_error("Invalid ballot type");
            }

            let entity_id: u32 = match entity.id() {
                Some(entity_id) => {
                    if let Some(ballot_type) = ballot_type {
                        row.track(&mut tracker, ballot_type, entity_id);
                    }
                    entity_id
                }
                None => 0,
            };

            let before_fields: usize = row.error_count();
            let mut result: EntityResult =
                EntityResult::not_counted(entity_id, &scope.info(entity_id));
            result.counted = record.get(&counted).eq_ignore_ascii_case("true");
            result.yeas = row.integer(&yeas);
            result.nays = row.integer(&nays);
            result.invalid = row.integer(&invalid);
            result.empty = row.integer(&empty);
            result.eligible_voters = row.integer(&eligible_voters);
            if let Some(expats) = &expats {
                result.expats = row.integer(expats);
            }
            if row.error_count() == before_fields {
                row.sanity(&result);
            }

            match (ballot_type, row_status) {
                (Some(ballot_type), Some(row_status)) => {
                    parsed.touch(ballot_type);
                    if row.error_count() == 0 {
                        parsed.observe(row_status);
                    }
                    parsed.accept(row, vec![(ballot_type, result)]);
                }
                _ => parsed.accept(row, Vec::new()),
            }
        }

        parsed
    }
}

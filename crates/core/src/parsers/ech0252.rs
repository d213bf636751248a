// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! eCH-0252 vote result deliveries.
//!
//! Elements are matched by local name so any namespace prefix is accepted.

use crate::context::BallotContext;
use crate::parsed::ParsedBallots;
use roxmltree::{Document, Node};
use tally_domain::{
    BallotType, DuplicateTracker, EntityResolution, EntityResult, EntityScope, ImportError,
    ImportErrorKind, Status, check_sanity, resolve_entity,
};

fn is_named(node: &Node<'_, '_>, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|candidate| is_named(candidate, name))
}

fn path<'a, 'input>(node: Node<'a, 'input>, names: &[&str]) -> Option<Node<'a, 'input>> {
    names
        .iter()
        .try_fold(node, |current, name| child(current, name))
}

fn text<'a>(node: Option<Node<'a, '_>>) -> Option<&'a str> {
    node.and_then(|node| node.text()).map(str::trim)
}

fn line_of(document: &Document<'_>, node: Node<'_, '_>) -> usize {
    usize::try_from(document.text_pos_at(node.range().start).row).unwrap_or_default()
}

/// Reads a count element; a missing element counts as zero.
fn count(
    document: &Document<'_>,
    parent: Node<'_, '_>,
    name: &str,
    errors: &mut Vec<ImportError>,
) -> u32 {
    let Some(node) = child(parent, name) else {
        return 0;
    };
    let value: &str = node.text().map_or("", str::trim);
    if value.is_empty() {
        return 0;
    }
    value.parse::<u32>().unwrap_or_else(|_| {
        errors.push(ImportError::at_row(
            ImportErrorKind::FieldParseError,
            line_of(document, node),
            format!("Invalid integer: {name}"),
        ));
        0
    })
}

fn not_valid(reason: &str) -> ParsedBallots {
    ParsedBallots::failed(ImportError::new(
        ImportErrorKind::HeaderMismatch,
        format!("Not a valid eCH xml file: {reason}"),
    ))
}

/// Parses an eCH-0252 delivery for the vote identified by the context.
///
/// Only `voteInfo` nodes whose vote identification (or main vote
/// identification) equals the context's external id are read. A counting
/// circle without a fully counted result leaves its entity to placeholder
/// synthesis and makes the import interim.
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn parse_ech0252(xml: &str, scope: &EntityScope<'_>, context: &BallotContext) -> ParsedBallots {
    let document: Document<'_> = match Document::parse(xml) {
        Ok(document) => document,
        Err(err) => return not_valid(&err.to_string()),
    };

    let root: Node<'_, '_> = document.root_element();
    let base: Node<'_, '_> = if is_named(&root, "voteBaseDelivery") {
        root
    } else if let Some(base) = child(root, "voteBaseDelivery") {
        base
    } else {
        return not_valid("missing voteBaseDelivery");
    };

    let Some(external_id) = context.external_id.as_deref() else {
        return ParsedBallots::failed(ImportError::no_data());
    };

    let mut parsed: ParsedBallots = ParsedBallots::default();
    let mut tracker: DuplicateTracker = DuplicateTracker::new();
    let mut relevant: bool = false;

    for vote_info in base
        .children()
        .filter(|node| is_named(node, "voteInfo"))
    {
        let Some(vote) = child(vote_info, "vote") else {
            continue;
        };
        let identification: Option<&str> = text(child(vote, "voteIdentification"));
        let main_identification: Option<&str> = text(child(vote, "mainVoteIdentification"));
        if identification != Some(external_id) && main_identification != Some(external_id) {
            continue;
        }
        relevant = true;

        let ballot_type: Option<BallotType> = match text(child(vote, "voteSubType")) {
            None | Some("1") => Some(BallotType::Proposal),
            Some("2") => Some(BallotType::CounterProposal),
            Some("3") => Some(BallotType::TieBreaker),
            Some(_) => None,
        }
        .filter(|ballot_type| context.owns(*ballot_type));
        let Some(ballot_type) = ballot_type else {
            parsed.errors.push(ImportError::at_row(
                ImportErrorKind::FieldParseError,
                line_of(&document, vote),
                "Invalid ballot type",
            ));
            continue;
        };
        parsed.touch(ballot_type);

        for circle in vote_info
            .children()
            .filter(|node| is_named(node, "countingCircleInfo"))
        {
            let line: usize = line_of(&document, circle);
            let mut errors: Vec<ImportError> = Vec::new();

            let raw_id: &str =
                text(path(circle, &["countingCircle", "countingCircleId"])).unwrap_or_default();
            let Ok(raw_id) = raw_id.parse::<u32>() else {
                parsed.errors.push(ImportError::at_row(
                    ImportErrorKind::InvalidId,
                    line,
                    "Invalid integer: countingCircleId",
                ));
                continue;
            };

            let entity_id: u32 = match resolve_entity(raw_id, scope, line) {
                EntityResolution::Resolved(entity_id) => entity_id,
                EntityResolution::SkipExpats => continue,
                EntityResolution::Error(err) => {
                    parsed.errors.push(err);
                    continue;
                }
            };
            if let Err(err) = tracker.check(ballot_type, entity_id, line) {
                parsed.errors.push(err);
                continue;
            }

            let Some(results) = child(circle, "voteResults") else {
                parsed.observe(Status::Interim);
                parsed.skipped += 1;
                continue;
            };
            if text(child(results, "fullyCountedTrue")) != Some("true") {
                parsed.observe(Status::Interim);
                parsed.skipped += 1;
                continue;
            }

            let mut result: EntityResult =
                EntityResult::not_counted(entity_id, &scope.info(entity_id));
            result.counted = true;
            result.eligible_voters = path(results, &["countOfVotersInformation"])
                .map_or(0, |voters| count(&document, voters, "countOfVotersTotal", &mut errors));

            if let Some(ballot) = child(results, "standardBallot") {
                result.yeas = count(&document, ballot, "countOfAnswerYes", &mut errors);
                result.nays = count(&document, ballot, "countOfAnswerNo", &mut errors);
                let answered_empty: u32 = count(&document, ballot, "countOfAnswerEmpty", &mut errors);
                let unaccounted_blank: u32 =
                    count(&document, ballot, "countOfUnaccountedBlankBallots", &mut errors);
                let answered_invalid: u32 =
                    count(&document, ballot, "countOfAnswerInvalid", &mut errors);
                let unaccounted_invalid: u32 =
                    count(&document, ballot, "countOfUnaccountedInvalidBallots", &mut errors);
                result.empty = answered_empty.saturating_add(unaccounted_blank);
                result.invalid = answered_invalid.saturating_add(unaccounted_invalid);
            } else {
                errors.push(ImportError::at_row(
                    ImportErrorKind::FieldParseError,
                    line,
                    "Invalid values",
                ));
            }

            if errors.is_empty() {
                errors.extend(check_sanity(&result, line));
            }
            if errors.is_empty() {
                parsed.observe(Status::Final);
                parsed.ballots.entry(ballot_type).or_default().push(result);
                parsed.processed += 1;
            } else {
                parsed.errors.extend(errors);
            }
        }
    }

    if !relevant {
        return ParsedBallots::failed(ImportError::no_data());
    }
    parsed
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{BallotType, Domain, DomainError, EntityInfo, EntityResult, Status};
use std::str::FromStr;

#[test]
fn test_status_most_conservative() {
    assert_eq!(Status::Final.most_conservative(Status::Interim), Status::Interim);
    assert_eq!(Status::Final.most_conservative(Status::Unknown), Status::Unknown);
    assert_eq!(Status::Unknown.most_conservative(Status::Interim), Status::Interim);
    assert_eq!(Status::Final.most_conservative(Status::Final), Status::Final);
}

#[test]
fn test_status_parsing_is_case_insensitive() {
    assert_eq!(Status::from_str("Final").unwrap(), Status::Final);
    assert_eq!(
        Status::from_str("done"),
        Err(DomainError::InvalidStatus(String::from("done")))
    );
}

#[test]
fn test_ballot_type_round_trips_through_strings() {
    for ballot_type in BallotType::ALL {
        assert_eq!(BallotType::from_str(ballot_type.as_str()).unwrap(), ballot_type);
    }
    assert!(BallotType::from_str("counter_proposal").is_err());
}

#[test]
fn test_ballot_type_serializes_kebab_case() {
    let json: String = serde_json::to_string(&BallotType::TieBreaker).unwrap();
    assert_eq!(json, "\"tie-breaker\"");
}

#[test]
fn test_domain_parsing() {
    assert_eq!(Domain::from_str("district").unwrap(), Domain::District);
    assert_eq!(Domain::from_str("none").unwrap(), Domain::None);
    assert_eq!(
        format!("{}", Domain::from_str("galaxy").unwrap_err()),
        "Invalid domain: galaxy"
    );
}

#[test]
fn test_placeholder_result_is_not_counted() {
    let info: EntityInfo = EntityInfo {
        name: String::from("Baar"),
        district: String::from("Zug"),
        ..EntityInfo::default()
    };
    let result: EntityResult = EntityResult::not_counted(1701, &info);

    assert!(!result.counted);
    assert_eq!(result.name, "Baar");
    assert_eq!(result.cast_votes(), 0);
}

#[test]
fn test_cast_votes_does_not_overflow() {
    let result: EntityResult = EntityResult {
        entity_id: 1,
        name: String::new(),
        district: String::new(),
        counted: true,
        eligible_voters: u32::MAX,
        expats: 0,
        yeas: u32::MAX,
        nays: u32::MAX,
        empty: 0,
        invalid: 0,
    };
    assert_eq!(result.cast_votes(), 2 * u64::from(u32::MAX));
}

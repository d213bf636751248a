// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tally::AcceptedImport;
use tally_domain::EntityRegistry;
use tally_persistence::{NewElection, NewVote, Persistence};

static DIR_COUNTER: AtomicU64 = AtomicU64::new(0);

pub const REGISTRY_JSON: &str = r#"{
    "principal": {"canton": "zg"},
    "entities": {
        "2017": {
            "1701": {"name": "Baar", "district": "Zug"},
            "1702": {"name": "Cham", "district": "Ennetsee"},
            "1703": {"name": "Hünenberg", "district": "Ennetsee"},
            "1704": {"name": "Menzingen", "district": "Zug"},
            "1711": {"name": "Zug", "district": "Zug"}
        }
    }
}"#;

pub const DEFAULT_HEADER: &str =
    "ID,Ja Stimmen,Nein Stimmen,Stimmberechtigte,Leere Stimmzettel,Ungültige Stimmzettel";

pub const ELECTION_HEADER: &str = "election_status,entity_id,entity_counted,\
entity_eligible_voters,entity_received_ballots,entity_blank_ballots,entity_invalid_ballots,\
entity_blank_votes,entity_invalid_votes,candidate_family_name,candidate_first_name,candidate_id,\
candidate_elected,candidate_votes,candidate_party,list_name,list_id,list_number_of_mandates,\
list_votes";

pub fn create_test_registry() -> EntityRegistry {
    EntityRegistry::from_json(REGISTRY_JSON).unwrap()
}

pub fn create_test_persistence() -> Persistence {
    Persistence::new_in_memory().unwrap()
}

pub fn create_test_vote(persistence: &mut Persistence) -> i64 {
    persistence
        .add_vote(&NewVote::new(
            "Änderung des Steuergesetzes",
            2017,
            tally_domain::Domain::Federation,
        ))
        .unwrap()
}

pub fn create_test_election(persistence: &mut Persistence) -> i64 {
    persistence
        .add_election(&NewElection::new("Kantonsratswahl", 2022))
        .unwrap()
}

/// A proportional election in the registry year.
pub fn create_proporz_election(persistence: &mut Persistence) -> i64 {
    persistence
        .add_election(&NewElection::new("Regierungsratswahl", 2017))
        .unwrap()
}

pub fn csv_bytes(lines: &[&str]) -> Vec<u8> {
    lines.join("\n").into_bytes()
}

pub fn accepted(outcome: &tally::ImportOutcome) -> &AcceptedImport {
    match outcome {
        tally::ImportOutcome::Accepted(accepted) => accepted,
        tally::ImportOutcome::Rejected(errors) => panic!("import rejected: {errors:?}"),
    }
}

/// Creates an empty directory unique to this test run.
pub fn temp_dir(name: &str) -> PathBuf {
    let id: u64 = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir: PathBuf = std::env::temp_dir().join(format!(
        "tally-api-{name}-{}-{id}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Builds a minimal XLSX workbook with inline strings.
pub fn xlsx_bytes(sheets: &[(&str, &[&[&str]])]) -> Vec<u8> {
    xlsx_bytes_from_row(sheets, 1)
}

/// Like [`xlsx_bytes`], with the first row of every sheet at `first_row`.
pub fn xlsx_bytes_from_row(sheets: &[(&str, &[&[&str]])], first_row: usize) -> Vec<u8> {
    let mut cursor: std::io::Cursor<Vec<u8>> = std::io::Cursor::new(Vec::new());
    {
        let mut writer: zip::ZipWriter<&mut std::io::Cursor<Vec<u8>>> =
            zip::ZipWriter::new(&mut cursor);
        let options: zip::write::FileOptions = zip::write::FileOptions::default();

        let mut sheet_entries: String = String::new();
        let mut relationships: String = String::new();
        for (index, (name, _)) in sheets.iter().enumerate() {
            let number: usize = index + 1;
            sheet_entries.push_str(&format!(
                r#"<sheet name="{name}" sheetId="{number}" r:id="rId{number}"/>"#
            ));
            relationships.push_str(&format!(
                r#"<Relationship Id="rId{number}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{number}.xml"/>"#
            ));
        }

        writer.start_file("[Content_Types].xml", options).unwrap();
        writer
            .write_all(br#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/></Types>"#)
            .unwrap();

        writer.start_file("xl/workbook.xml", options).unwrap();
        writer
            .write_all(
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>{sheet_entries}</sheets></workbook>"#
                )
                .as_bytes(),
            )
            .unwrap();

        writer.start_file("xl/_rels/workbook.xml.rels", options).unwrap();
        writer
            .write_all(
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{relationships}</Relationships>"#
                )
                .as_bytes(),
            )
            .unwrap();

        for (index, (_, rows)) in sheets.iter().enumerate() {
            let mut data: String = String::new();
            for (row_index, row) in rows.iter().enumerate() {
                let row_number: usize = row_index + first_row;
                data.push_str(&format!(r#"<row r="{row_number}">"#));
                for (column_index, cell) in row.iter().enumerate() {
                    let column: char = char::from(b'A' + u8::try_from(column_index).unwrap());
                    data.push_str(&format!(
                        r#"<c r="{column}{row_number}" t="inlineStr"><is><t>{cell}</t></is></c>"#
                    ));
                }
                data.push_str("</row>");
            }
            writer
                .start_file(format!("xl/worksheets/sheet{}.xml", index + 1), options)
                .unwrap();
            writer
                .write_all(
                    format!(
                        r#"<?xml version="1.0" encoding="UTF-8"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{data}</sheetData></worksheet>"#
                    )
                    .as_bytes(),
                )
                .unwrap();
        }
        writer.finish().unwrap();
    }
    cursor.into_inner()
}

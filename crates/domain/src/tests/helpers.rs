// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{EntityRegistry, LineRecord, Table};

pub const REGISTRY_JSON: &str = r#"{
    "principal": {"canton": "zg"},
    "entities": {
        "2017": {
            "1701": {"name": "Baar", "district": "Zug", "region": "Tal"},
            "1702": {"name": "Cham", "district": "Ennetsee", "region": "Tal"},
            "1703": {"name": "Hünenberg", "district": "Ennetsee", "region": "Tal"},
            "1704": {"name": "Menzingen", "district": "Zug", "region": "Berg"},
            "1711": {"name": "Zug", "district": "Zug", "region": "Tal"}
        },
        "2018": {
            "1701": {"name": "Baar", "district": "Zug", "region": "Tal"}
        }
    }
}"#;

pub fn create_test_registry() -> EntityRegistry {
    EntityRegistry::from_json(REGISTRY_JSON).unwrap()
}

pub fn create_test_table(rows: &[&[&str]]) -> Table {
    Table::from_rows(
        rows.iter()
            .map(|row| row.iter().map(|cell| (*cell).to_string()).collect())
            .collect(),
    )
}

pub fn first_row(table: &Table) -> &LineRecord {
    &table.rows[0]
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Opening and preparing `SQLite` connections for the result store.
//!
//! Result imports are applied inside `BEGIN IMMEDIATE` transactions, so the
//! database write lock orders concurrent writers. File databases wait up to
//! [`BUSY_TIMEOUT_MS`] for that lock and run in WAL mode so readers are not
//! blocked by an import in progress.

use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Integer, Text};
use diesel::{Connection, RunQueryDsl, SqliteConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, info};

use crate::error::PersistenceError;

/// Schema migrations for the result tables.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Milliseconds a writer waits for the database lock before giving up.
pub const BUSY_TIMEOUT_MS: u32 = 5_000;

/// How a connection is backed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    /// A named shared-cache in-memory database.
    Memory,
    /// A database file on disk.
    File,
}

impl StorageMode {
    /// Pragmas applied right after connecting, before migrations run.
    fn pragmas(self) -> Vec<String> {
        let mut pragmas: Vec<String> = vec![String::from("PRAGMA foreign_keys = ON")];
        if self == Self::File {
            pragmas.push(String::from("PRAGMA journal_mode = WAL"));
            pragmas.push(format!("PRAGMA busy_timeout = {BUSY_TIMEOUT_MS}"));
        }
        pragmas
    }
}

// Diesel has no PRAGMA DSL; these rows read raw pragma results.
#[derive(QueryableByName)]
struct ForeignKeysRow {
    #[diesel(sql_type = Integer)]
    foreign_keys: i32,
}

#[derive(QueryableByName)]
struct JournalModeRow {
    #[diesel(sql_type = Text)]
    journal_mode: String,
}

/// Returns the id assigned by the last insert on this connection.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn last_insert_rowid(conn: &mut SqliteConnection) -> Result<i64, PersistenceError> {
    Ok(diesel::select(sql::<BigInt>("last_insert_rowid()")).get_result(conn)?)
}

/// Reports whether foreign key constraints are enforced.
///
/// # Errors
///
/// Returns an error if the pragma cannot be read.
pub fn foreign_keys_enabled(conn: &mut SqliteConnection) -> Result<bool, PersistenceError> {
    let row: ForeignKeysRow = diesel::sql_query("PRAGMA foreign_keys").get_result(conn)?;
    Ok(row.foreign_keys != 0)
}

/// Reports the journal mode of the connection, e.g. `wal` or `memory`.
///
/// # Errors
///
/// Returns an error if the pragma cannot be read.
pub fn journal_mode(conn: &mut SqliteConnection) -> Result<String, PersistenceError> {
    let row: JournalModeRow = diesel::sql_query("PRAGMA journal_mode").get_result(conn)?;
    Ok(row.journal_mode.to_lowercase())
}

/// Connects to a database, prepares it for its storage mode and brings the
/// schema up to date.
///
/// # Arguments
///
/// * `database_url` - A file path or an `SQLite` URI
/// * `mode` - Whether the database lives in memory or on disk
///
/// # Errors
///
/// Returns an error if connecting, configuring or migrating fails, or if
/// foreign keys end up unenforced.
pub fn open(database_url: &str, mode: StorageMode) -> Result<SqliteConnection, PersistenceError> {
    info!(database_url, ?mode, "Opening result database");

    let mut conn: SqliteConnection = SqliteConnection::establish(database_url)?;

    for pragma in mode.pragmas() {
        debug!(pragma = %pragma, "Applying pragma");
        diesel::sql_query(pragma.as_str())
            .execute(&mut conn)
            .map_err(|e| PersistenceError::Pragma(format!("{pragma}: {e}")))?;
    }

    let applied: usize = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| PersistenceError::Migration(e.to_string()))?
        .len();
    debug!(applied, "Migrations applied");

    if !foreign_keys_enabled(&mut conn)? {
        return Err(PersistenceError::ForeignKeysDisabled);
    }

    Ok(conn)
}

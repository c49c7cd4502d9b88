/*!
# Database Schema Management

The complete schema for a GeoDrop store plus initialization and version checks.

Timestamps are unix milliseconds. Amounts are stored as decimal TEXT so no
precision is lost.
*/

use crate::DbResult;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

/// Current database schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize database with complete schema
pub fn initialize_database(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE drops (
            id TEXT PRIMARY KEY,
            latitude REAL NOT NULL,
            longitude REAL NOT NULL,
            amount TEXT NOT NULL,
            message TEXT NOT NULL,
            creator TEXT NOT NULL,
            audience_scope TEXT NOT NULL CHECK (audience_scope IN ('public', 'restricted')),
            audience_group TEXT, -- set only for restricted drops
            expires_at INTEGER,
            created_at INTEGER NOT NULL,
            claim_state TEXT NOT NULL DEFAULT 'unclaimed'
                CHECK (claim_state IN ('unclaimed', 'claimed')),
            claimant TEXT,
            claimed_at INTEGER,
            settlement_ref TEXT,
            CHECK ((claim_state = 'claimed') = (claimant IS NOT NULL AND claimed_at IS NOT NULL)),
            CHECK (settlement_ref IS NULL OR claim_state = 'claimed')
        );

        CREATE INDEX idx_drops_location ON drops(latitude, longitude);
        CREATE INDEX idx_drops_created ON drops(created_at);
        CREATE INDEX idx_drops_unsettled ON drops(claimed_at)
            WHERE claim_state = 'claimed' AND settlement_ref IS NULL;

        CREATE TABLE schema_version (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        );
        "#,
    )?;

    conn.execute(
        "INSERT INTO schema_version (version, applied_at) VALUES (?1, ?2)",
        params![SCHEMA_VERSION, Utc::now().timestamp_millis()],
    )?;

    Ok(())
}

/// Check if database is properly initialized
pub fn check_schema(conn: &Connection) -> DbResult<bool> {
    let found = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type='table' AND name='drops'",
            [],
            |_| Ok(()),
        )
        .optional()?;

    Ok(found.is_some())
}

/// Get current schema version from database
pub fn get_schema_version(conn: &Connection) -> DbResult<Option<i32>> {
    let table_exists = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type='table' AND name='schema_version'",
            [],
            |_| Ok(()),
        )
        .optional()?
        .is_some();

    if !table_exists {
        return Ok(None);
    }

    let version = conn
        .query_row(
            "SELECT version FROM schema_version ORDER BY version DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;

    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_and_version() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(!check_schema(&conn).unwrap());
        assert_eq!(get_schema_version(&conn).unwrap(), None);

        initialize_database(&conn).unwrap();
        assert!(check_schema(&conn).unwrap());
        assert_eq!(get_schema_version(&conn).unwrap(), Some(SCHEMA_VERSION));
    }

    #[test]
    fn test_claim_state_is_constrained() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_database(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO drops (id, latitude, longitude, amount, message, creator, audience_scope, created_at, claim_state)
             VALUES ('a', 0, 0, '1', 'm', 'c', 'public', 0, 'expired')",
            [],
        );
        assert!(result.is_err());
    }
}

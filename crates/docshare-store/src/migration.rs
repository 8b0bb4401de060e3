//! Database schema migrations for SQLite.
//!
//! We use a simple versioned migration system. Each migration is a SQL string
//! that transforms the schema from version N to N+1.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 2;

/// Initialize or migrate the database schema.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    migrate_to(conn, CURRENT_VERSION)
}

/// Migrate up to `target`, which must not exceed [`CURRENT_VERSION`].
fn migrate_to(conn: &mut Connection, target: u32) -> Result<()> {
    // Create migrations table if it doesn't exist
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema version {} is newer than supported version {}",
            current, CURRENT_VERSION
        )));
    }

    if current < target {
        let tx = conn.transaction()?;

        for version in (current + 1)..=target {
            tracing::debug!(version, "applying schema migration");
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
        }

        tx.commit()?;
    }

    Ok(())
}

/// Apply a specific migration version.
fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        2 => apply_v2(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Identity records, owned by the identity provider
        CREATE TABLE users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,         -- normalized lowercase
            user_name TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );

        -- Documents with their content blob
        CREATE TABLE documents (
            id INTEGER PRIMARY KEY AUTOINCREMENT,   -- never reused
            owner_id TEXT NOT NULL REFERENCES users(id),
            file_name TEXT NOT NULL,
            content_type TEXT NOT NULL,
            size_bytes INTEGER NOT NULL,
            content BLOB NOT NULL,
            content_hash BLOB NOT NULL,             -- 32 bytes, Blake3 of content
            description TEXT NOT NULL DEFAULT '',
            category TEXT NOT NULL DEFAULT 'Uncategorized',
            uploaded_at INTEGER NOT NULL            -- Unix ms
        );

        -- Delegated view/download access
        CREATE TABLE permission_grants (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            document_id INTEGER NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
            grantee_id TEXT NOT NULL REFERENCES users(id),
            granted_at INTEGER NOT NULL,

            UNIQUE(document_id, grantee_id)
        );

        -- Indexes for common queries
        CREATE INDEX idx_documents_owner ON documents(owner_id);
        CREATE INDEX idx_documents_uploaded ON documents(uploaded_at);
        CREATE INDEX idx_grants_grantee ON permission_grants(grantee_id);
        "#,
    )?;

    Ok(())
}

/// Migration v2: sign/verify rights on grants, signatures and verifications.
fn apply_v2(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Existing grants stay view/download only
        ALTER TABLE permission_grants ADD COLUMN can_sign INTEGER NOT NULL DEFAULT 0;
        ALTER TABLE permission_grants ADD COLUMN can_verify INTEGER NOT NULL DEFAULT 0;

        -- Attested signatures, one per signer
        CREATE TABLE signatures (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            document_id INTEGER NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
            signer_id TEXT NOT NULL REFERENCES users(id),
            signature_data BLOB NOT NULL,
            content_hash BLOB NOT NULL,             -- content hash when signed
            signed_at INTEGER NOT NULL,
            attested_by BLOB NOT NULL,              -- 32-byte Ed25519 public key
            attestation BLOB NOT NULL,              -- 64-byte Ed25519 signature

            UNIQUE(document_id, signer_id)
        );

        -- Verification history, latest wins
        CREATE TABLE verifications (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            document_id INTEGER NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
            verifier_id TEXT NOT NULL REFERENCES users(id),
            method TEXT NOT NULL,
            notes TEXT NOT NULL DEFAULT '',
            authentic INTEGER NOT NULL,
            signatures_checked INTEGER NOT NULL,
            verified_at INTEGER NOT NULL
        );

        CREATE INDEX idx_signatures_document ON signatures(document_id);
        CREATE INDEX idx_verifications_document ON verifications(document_id, verified_at);
        "#,
    )?;

    Ok(())
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_creates_tables() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"users".to_string()));
        assert!(tables.contains(&"documents".to_string()));
        assert!(tables.contains(&"permission_grants".to_string()));
        assert!(tables.contains(&"signatures".to_string()));
        assert!(tables.contains(&"verifications".to_string()));
        assert!(tables.contains(&"schema_migrations".to_string()));
    }

    #[test]
    fn test_migration_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        migrate(&mut conn).unwrap();
        migrate(&mut conn).unwrap();

        let version: u32 = conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }

    #[test]
    fn test_v1_grants_survive_upgrade() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate_to(&mut conn, 1).unwrap();
        conn.execute_batch(
            "INSERT INTO users VALUES ('1', 'a@example.com', 'a', 0);
             INSERT INTO users VALUES ('2', 'b@example.com', 'b', 0);
             INSERT INTO documents (owner_id, file_name, content_type, size_bytes, content,
                                    content_hash, uploaded_at)
                 VALUES ('1', 'a.pdf', 'application/pdf', 1, x'25', zeroblob(32), 0);
             INSERT INTO permission_grants (document_id, grantee_id, granted_at)
                 VALUES (1, '2', 5);",
        )
        .unwrap();

        migrate(&mut conn).unwrap();

        let (grantee, can_sign, can_verify): (String, bool, bool) = conn
            .query_row(
                "SELECT grantee_id, can_sign, can_verify FROM permission_grants",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert_eq!(grantee, "2");
        assert!(!can_sign && !can_verify);
    }

    #[test]
    fn test_newer_schema_rejected() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        conn.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, 0)",
            [CURRENT_VERSION + 1],
        )
        .unwrap();

        assert!(matches!(migrate(&mut conn), Err(StoreError::Migration(_))));
    }
}

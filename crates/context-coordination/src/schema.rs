//! Forward-only schema migrations, keyed off `schema_version` (spec §6:
//! "Schema is versioned... migrations are forward-only").

use rusqlite::Connection;

use crate::error::{CoordinationError, Result};

/// Highest schema version this build knows how to read. A database stamped
/// with a newer version was written by a newer build; refuse to touch it
/// rather than silently misinterpret rows it doesn't understand.
pub const SUPPORTED_SCHEMA_VERSION: i64 = 1;

const MIGRATIONS: &[&str] = &[
    // v1: agents, tasks, locks, session_events, messages.
    r"
    CREATE TABLE IF NOT EXISTS agents (
        agent_id TEXT NOT NULL,
        project_id TEXT NOT NULL,
        session_id TEXT NOT NULL,
        status TEXT NOT NULL,
        focus TEXT,
        last_heartbeat INTEGER NOT NULL,
        created_at INTEGER NOT NULL,
        PRIMARY KEY (agent_id, project_id)
    );
    CREATE INDEX IF NOT EXISTS idx_agents_project_status ON agents(project_id, status);

    CREATE TABLE IF NOT EXISTS tasks (
        id TEXT PRIMARY KEY,
        project_id TEXT NOT NULL,
        title TEXT NOT NULL,
        description TEXT,
        from_project TEXT,
        from_agent TEXT,
        status TEXT NOT NULL,
        claimed_by TEXT,
        claimed_at INTEGER,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL,
        completed_at INTEGER
    );
    CREATE INDEX IF NOT EXISTS idx_tasks_project_status ON tasks(project_id, status);

    CREATE TABLE IF NOT EXISTS locks (
        resource TEXT NOT NULL,
        project_id TEXT NOT NULL,
        agent_id TEXT NOT NULL,
        acquired_at INTEGER NOT NULL,
        PRIMARY KEY (resource, project_id)
    );

    CREATE TABLE IF NOT EXISTS session_events (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        project_id TEXT NOT NULL,
        session_id TEXT NOT NULL,
        agent_id TEXT,
        event_type TEXT NOT NULL,
        event_data TEXT NOT NULL,
        timestamp INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_session_events_session ON session_events(project_id, session_id, timestamp);

    CREATE TABLE IF NOT EXISTS messages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        from_project TEXT NOT NULL,
        to_project TEXT NOT NULL,
        from_agent TEXT,
        body TEXT NOT NULL,
        created_at INTEGER NOT NULL,
        read_at INTEGER
    );
    CREATE INDEX IF NOT EXISTS idx_messages_to_project ON messages(to_project, read_at);
    ",
];

/// Apply every migration above the database's current `schema_version`,
/// each inside its own transaction. Refuses to run against a database
/// stamped with a version newer than this build supports.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        );",
    )?;

    let current: i64 = conn
        .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))
        .unwrap_or(0);

    if current > SUPPORTED_SCHEMA_VERSION {
        return Err(CoordinationError::SchemaNewerThanSupported {
            found: current,
            supported: SUPPORTED_SCHEMA_VERSION,
        });
    }

    for (idx, migration) in MIGRATIONS.iter().enumerate() {
        let version = (idx as i64) + 1;
        if version <= current {
            continue;
        }
        let tx = conn.transaction()?;
        tx.execute_batch(migration)?;
        tx.execute(
            "INSERT INTO schema_version (version, applied_at) VALUES (?1, strftime('%s','now'))",
            [version],
        )?;
        tx.commit()?;
    }

    Ok(())
}

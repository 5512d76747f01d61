//! Single-host coordination substrate (spec §4.5): a SQLite database shared
//! by every indexer/agent instance on the machine, giving multiple
//! concurrent agents exclusive-per-project active sessions, resource
//! leases, and a project-centric task queue with cross-project delegation.
//!
//! Every state-changing operation here either runs inside one SQLite
//! transaction (so concurrent callers linearize through SQLite's own
//! locking) or is a single statement whose `changes()` count tells the
//! caller whether it actually won a race. Nothing here keeps an in-memory
//! lock across an `.await` point because this crate is synchronous — the
//! index manager is the one that wraps blocking calls for an async caller.

mod error;
mod fs_lock;
mod models;
mod schema;
mod similarity;

pub use error::{CoordinationError, Result};
pub use fs_lock::DirLock;
pub use models::{Agent, AgentStatus, Lock, SessionEvent, Task, TaskCreationOutcome, TaskStatus};
pub use similarity::{normalized_similarity, DESCRIPTION_SIMILARITY_THRESHOLD, TITLE_SIMILARITY_THRESHOLD};

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static AGENT_SUFFIX_COUNTER: AtomicU64 = AtomicU64::new(0);

#[must_use]
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
}

pub struct CoordinationStore {
    pool: Pool<SqliteConnectionManager>,
}

impl CoordinationStore {
    /// Open (creating if absent) the coordination database at `path` and
    /// bring its schema up to date. `path` is normally
    /// `~/.memorybank/agentboard.db` (spec §6), host-global and shared by
    /// every project.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // journal_mode=DELETE (the default) rather than WAL: spec §4.5's
        // "external-reader guarantee" requires that independent read-only
        // processes see durable state without a -wal sidecar and without
        // cooperating with the writer. synchronous=FULL flushes every
        // commit before it returns.
        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.busy_timeout(std::time::Duration::from_secs(5))?;
            conn.pragma_update(None, "journal_mode", "DELETE")?;
            conn.pragma_update(None, "synchronous", "FULL")?;
            conn.pragma_update(None, "foreign_keys", "ON")?;
            Ok(())
        });
        let pool = Pool::builder().max_size(8).build(manager)?;

        {
            let mut conn = pool.get()?;
            schema::migrate(&mut conn)?;
        }

        Ok(Self { pool })
    }

    /// In-memory store, for tests only — still goes through the same
    /// migration path as the on-disk database.
    pub fn open_in_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager)?;
        {
            let mut conn = pool.get()?;
            schema::migrate(&mut conn)?;
        }
        Ok(Self { pool })
    }

    // ---- Agents ------------------------------------------------------

    /// Register a new agent for `project_id`, demoting every currently
    /// ACTIVE agent of that project to INACTIVE first, inside one
    /// transaction (spec §3 Agent invariant: at most one ACTIVE agent per
    /// project; §4.5 `register`). Returns the generated `agentId` and the
    /// `sessionId` (generated if not supplied).
    pub fn register(
        &self,
        project_id: &str,
        base_agent_id: &str,
        session_id: Option<String>,
    ) -> Result<(String, String)> {
        if project_id.trim().is_empty() || base_agent_id.trim().is_empty() {
            return Err(CoordinationError::Validation(
                "project_id and base_agent_id must be non-empty".to_string(),
            ));
        }

        let suffix = AGENT_SUFFIX_COUNTER.fetch_add(1, Ordering::Relaxed);
        let agent_id = format!("{base_agent_id}-{:x}{:x}", now_ms(), suffix);
        let session_id = session_id.unwrap_or_else(|| format!("sess-{:x}{:x}", now_ms(), suffix));
        let now = now_ms();

        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        tx.execute(
            "UPDATE agents SET status = 'INACTIVE' WHERE project_id = ?1 AND status = 'ACTIVE'",
            params![project_id],
        )?;
        tx.execute(
            "INSERT INTO agents (agent_id, project_id, session_id, status, focus, last_heartbeat, created_at)
             VALUES (?1, ?2, ?3, 'ACTIVE', NULL, ?4, ?4)",
            params![agent_id, project_id, session_id, now],
        )?;
        tx.commit()?;

        Ok((agent_id, session_id))
    }

    /// The current ACTIVE agent for `project_id`, if any (spec §3: at most
    /// one may exist; this reads whichever the schema currently allows).
    pub fn get_active_agent(&self, project_id: &str) -> Result<Option<Agent>> {
        let conn = self.pool.get()?;
        conn.query_row(
            "SELECT agent_id, project_id, session_id, status, focus, last_heartbeat, created_at
             FROM agents WHERE project_id = ?1 AND status = 'ACTIVE'
             ORDER BY created_at DESC LIMIT 1",
            params![project_id],
            row_to_agent,
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn update_heartbeat(&self, project_id: &str, agent_id: &str, focus: Option<&str>) -> Result<bool> {
        let conn = self.pool.get()?;
        let changed = conn.execute(
            "UPDATE agents SET last_heartbeat = ?1, focus = COALESCE(?2, focus)
             WHERE agent_id = ?3 AND project_id = ?4",
            params![now_ms(), focus, agent_id, project_id],
        )?;
        Ok(changed > 0)
    }

    pub fn set_agent_status(&self, project_id: &str, agent_id: &str, status: AgentStatus) -> Result<bool> {
        let conn = self.pool.get()?;
        let changed = conn.execute(
            "UPDATE agents SET status = ?1 WHERE agent_id = ?2 AND project_id = ?3",
            params![status.as_str(), agent_id, project_id],
        )?;
        Ok(changed > 0)
    }

    /// Demote every ACTIVE agent whose `last_heartbeat` is older than
    /// `threshold_minutes` (spec §4.5 `cleanupStaleAgents`). Returns the
    /// number of agents demoted.
    pub fn cleanup_stale_agents(&self, threshold_minutes: i64) -> Result<usize> {
        let cutoff = now_ms() - threshold_minutes * 60_000;
        let conn = self.pool.get()?;
        let changed = conn.execute(
            "UPDATE agents SET status = 'INACTIVE' WHERE status = 'ACTIVE' AND last_heartbeat < ?1",
            params![cutoff],
        )?;
        Ok(changed)
    }

    // ---- Tasks ---------------------------------------------------------

    /// Create a task owned by `project_id`. `id_prefix` is `"TASK"` for
    /// locally-originated work and `"EXT"` for cross-project delegation
    /// (spec §3 Task: `id` prefix `TASK-` or `EXT-`).
    pub fn create_task(
        &self,
        id_prefix: &str,
        project_id: &str,
        title: &str,
        description: Option<&str>,
        from_project: Option<&str>,
        from_agent: Option<&str>,
    ) -> Result<Task> {
        let now = now_ms();
        let suffix = AGENT_SUFFIX_COUNTER.fetch_add(1, Ordering::Relaxed);
        let id = format!("{id_prefix}-{:x}{:x}", now, suffix);

        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO tasks (id, project_id, title, description, from_project, from_agent,
                                 status, claimed_by, claimed_at, created_at, updated_at, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'PENDING', NULL, NULL, ?7, ?7, NULL)",
            params![id, project_id, title, description, from_project, from_agent, now],
        )?;

        Ok(Task {
            id,
            project_id: project_id.to_string(),
            title: title.to_string(),
            description: description.map(str::to_string),
            from_project: from_project.map(str::to_string),
            from_agent: from_agent.map(str::to_string),
            status: TaskStatus::Pending,
            claimed_by: None,
            claimed_at: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        })
    }

    /// Create a task in `project_id` on behalf of `from_project`/`from_agent`,
    /// first checking for a near-duplicate already queued there (spec §4.5
    /// "Task deduplication on delegation", testable property 10). Similarity
    /// ≥ 0.85 on the title, or ≥ 0.75 on the description, counts as a
    /// duplicate; no new row is inserted in that case.
    pub fn create_external_task(
        &self,
        project_id: &str,
        title: &str,
        description: Option<&str>,
        from_project: &str,
        from_agent: Option<&str>,
    ) -> Result<TaskCreationOutcome> {
        let existing = self.list_tasks(project_id)?;
        for candidate in &existing {
            let title_sim = normalized_similarity(title, &candidate.title);
            let desc_sim = match (description, &candidate.description) {
                (Some(a), Some(b)) => normalized_similarity(a, b),
                _ => 0.0,
            };
            if title_sim >= TITLE_SIMILARITY_THRESHOLD || desc_sim >= DESCRIPTION_SIMILARITY_THRESHOLD {
                return Ok(TaskCreationOutcome::Duplicate {
                    existing_id: candidate.id.clone(),
                    status: candidate.status,
                });
            }
        }

        let task = self.create_task("EXT", project_id, title, description, Some(from_project), from_agent)?;
        Ok(TaskCreationOutcome::Created(task))
    }

    /// Conditional update: `status = IN_PROGRESS, claimedBy = agentId WHERE
    /// id = taskId AND projectId = projectId AND status = PENDING` (spec
    /// §4.5 `claimTask`). Returns true iff exactly one row changed — never
    /// raises on a lost race (spec §7 `ConcurrencyConflict`).
    pub fn claim_task(&self, project_id: &str, task_id: &str, agent_id: &str) -> Result<bool> {
        let conn = self.pool.get()?;
        let changed = conn.execute(
            "UPDATE tasks SET status = 'IN_PROGRESS', claimed_by = ?1, claimed_at = ?2, updated_at = ?2
             WHERE id = ?3 AND project_id = ?4 AND status = 'PENDING'",
            params![agent_id, now_ms(), task_id, project_id],
        )?;
        Ok(changed > 0)
    }

    /// Succeeds unless the task is already COMPLETED (spec §3 Task state
    /// machine).
    pub fn complete_task(&self, project_id: &str, task_id: &str) -> Result<bool> {
        let conn = self.pool.get()?;
        let changed = conn.execute(
            "UPDATE tasks SET status = 'COMPLETED', completed_at = ?1, updated_at = ?1
             WHERE id = ?2 AND project_id = ?3 AND status != 'COMPLETED'",
            params![now_ms(), task_id, project_id],
        )?;
        Ok(changed > 0)
    }

    /// `PENDING -> CANCELLED` only (spec §3 Task state machine).
    pub fn cancel_task(&self, project_id: &str, task_id: &str) -> Result<bool> {
        let conn = self.pool.get()?;
        let changed = conn.execute(
            "UPDATE tasks SET status = 'CANCELLED', updated_at = ?1
             WHERE id = ?2 AND project_id = ?3 AND status = 'PENDING'",
            params![now_ms(), task_id, project_id],
        )?;
        Ok(changed > 0)
    }

    pub fn get_task(&self, project_id: &str, task_id: &str) -> Result<Option<Task>> {
        let conn = self.pool.get()?;
        conn.query_row(
            "SELECT id, project_id, title, description, from_project, from_agent, status,
                    claimed_by, claimed_at, created_at, updated_at, completed_at
             FROM tasks WHERE id = ?1 AND project_id = ?2",
            params![task_id, project_id],
            row_to_task,
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn list_tasks(&self, project_id: &str) -> Result<Vec<Task>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, project_id, title, description, from_project, from_agent, status,
                    claimed_by, claimed_at, created_at, updated_at, completed_at
             FROM tasks WHERE project_id = ?1 ORDER BY created_at ASC",
        )?;
        let rows = stmt.query_map(params![project_id], row_to_task)?;
        rows.collect::<std::result::Result<Vec<_>, _>>().map_err(Into::into)
    }

    // ---- Locks ---------------------------------------------------------

    /// Inside one transaction: select the existing lock for `(resource,
    /// project_id)`; if absent or already owned by `agent_id`, upsert it.
    /// Returns true iff the caller owns the lock after the call returns
    /// (spec §4.5 `claimResource`, testable property 7: exactly one
    /// concurrent caller wins).
    ///
    /// The transaction is opened `IMMEDIATE` rather than deferred: a
    /// deferred transaction takes only a SHARED lock on the `SELECT` and
    /// upgrades to RESERVED on the `INSERT`, so two genuinely concurrent
    /// callers on a fresh resource can both hold SHARED and then race (and
    /// lose) the upgrade, surfacing as `SQLITE_BUSY`/`SQLITE_CONSTRAINT`
    /// instead of a clean `Ok(false)`. Opening `IMMEDIATE` takes the write
    /// lock at `BEGIN`, so the loser simply waits (via `busy_timeout`),
    /// then reads the committed row and returns `Ok(false)`.
    pub fn claim_resource(&self, project_id: &str, resource: &str, agent_id: &str) -> Result<bool> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        let owner: Option<String> = tx
            .query_row(
                "SELECT agent_id FROM locks WHERE resource = ?1 AND project_id = ?2",
                params![resource, project_id],
                |r| r.get(0),
            )
            .optional()?;

        let won = match owner {
            None => {
                tx.execute(
                    "INSERT INTO locks (resource, project_id, agent_id, acquired_at) VALUES (?1, ?2, ?3, ?4)",
                    params![resource, project_id, agent_id, now_ms()],
                )?;
                true
            }
            Some(ref existing) if existing == agent_id => true,
            Some(_) => false,
        };
        tx.commit()?;
        Ok(won)
    }

    /// Delete the lock iff `agent_id` owns it.
    pub fn release_resource(&self, project_id: &str, resource: &str, agent_id: &str) -> Result<bool> {
        let conn = self.pool.get()?;
        let changed = conn.execute(
            "DELETE FROM locks WHERE resource = ?1 AND project_id = ?2 AND agent_id = ?3",
            params![resource, project_id, agent_id],
        )?;
        Ok(changed > 0)
    }

    pub fn get_locks(&self, project_id: &str) -> Result<Vec<Lock>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT resource, project_id, agent_id, acquired_at FROM locks WHERE project_id = ?1",
        )?;
        let rows = stmt.query_map(params![project_id], |r| {
            Ok(Lock {
                resource: r.get(0)?,
                project_id: r.get(1)?,
                agent_id: r.get(2)?,
                acquired_at: r.get(3)?,
            })
        })?;
        rows.collect::<std::result::Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete locks whose owning agent is not currently ACTIVE for the same
    /// project (spec §4.5 `cleanupOrphanedLocks`).
    pub fn cleanup_orphaned_locks(&self) -> Result<usize> {
        let conn = self.pool.get()?;
        let changed = conn.execute(
            "DELETE FROM locks
             WHERE NOT EXISTS (
                 SELECT 1 FROM agents
                 WHERE agents.agent_id = locks.agent_id
                   AND agents.project_id = locks.project_id
                   AND agents.status = 'ACTIVE'
             )",
            [],
        )?;
        Ok(changed)
    }

    // ---- Session events --------------------------------------------------

    /// Unconditional append (spec §3 SessionEvent: "append-only journal").
    pub fn log_session_event(
        &self,
        project_id: &str,
        session_id: &str,
        agent_id: Option<&str>,
        event_type: &str,
        event_data: &serde_json::Value,
    ) -> Result<i64> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO session_events (project_id, session_id, agent_id, event_type, event_data, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![project_id, session_id, agent_id, event_type, event_data.to_string(), now_ms()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn session_events(&self, project_id: &str, session_id: &str) -> Result<Vec<SessionEvent>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, project_id, session_id, agent_id, event_type, event_data, timestamp
             FROM session_events WHERE project_id = ?1 AND session_id = ?2 ORDER BY timestamp ASC, id ASC",
        )?;
        let rows = stmt.query_map(params![project_id, session_id], |r| {
            Ok(SessionEvent {
                id: r.get(0)?,
                project_id: r.get(1)?,
                session_id: r.get(2)?,
                agent_id: r.get(3)?,
                event_type: r.get(4)?,
                event_data: r.get(5)?,
                timestamp: r.get(6)?,
            })
        })?;
        rows.collect::<std::result::Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete session events older than `older_than_ms` (spec §3 SessionEvent:
    /// "no updates, no deletes (except time-based cleanup)").
    pub fn cleanup_session_events(&self, older_than_ms: i64) -> Result<usize> {
        let conn = self.pool.get()?;
        let changed = conn.execute("DELETE FROM session_events WHERE timestamp < ?1", params![older_than_ms])?;
        Ok(changed)
    }
}

fn row_to_agent(row: &rusqlite::Row) -> rusqlite::Result<Agent> {
    let status: String = row.get(3)?;
    Ok(Agent {
        agent_id: row.get(0)?,
        project_id: row.get(1)?,
        session_id: row.get(2)?,
        status: AgentStatus::from_str(&status),
        focus: row.get(4)?,
        last_heartbeat: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn row_to_task(row: &rusqlite::Row) -> rusqlite::Result<Task> {
    let status: String = row.get(6)?;
    Ok(Task {
        id: row.get(0)?,
        project_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        from_project: row.get(4)?,
        from_agent: row.get(5)?,
        status: TaskStatus::from_str(&status),
        claimed_by: row.get(7)?,
        claimed_at: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
        completed_at: row.get(11)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn s6_register_demotes_prior_active_agent() {
        let store = CoordinationStore::open_in_memory().unwrap();
        let (agent_a, _) = store.register("proj", "Dev", None).unwrap();
        let (agent_b, _) = store.register("proj", "Dev", None).unwrap();

        let active = store.get_active_agent("proj").unwrap().unwrap();
        assert_eq!(active.agent_id, agent_b);

        let conn = store.pool.get().unwrap();
        let status_a: String = conn
            .query_row(
                "SELECT status FROM agents WHERE agent_id = ?1",
                params![agent_a],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(status_a, "INACTIVE");
    }

    #[test]
    fn single_active_agent_invariant_holds_after_many_registrations() {
        let store = CoordinationStore::open_in_memory().unwrap();
        for _ in 0..5 {
            store.register("proj", "Dev", None).unwrap();
        }
        let conn = store.pool.get().unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM agents WHERE project_id = 'proj' AND status = 'ACTIVE'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn claim_task_succeeds_once() {
        let store = CoordinationStore::open_in_memory().unwrap();
        let task = store.create_task("TASK", "proj", "do thing", None, None, None).unwrap();

        assert!(store.claim_task("proj", &task.id, "agent-1").unwrap());
        assert!(!store.claim_task("proj", &task.id, "agent-2").unwrap());

        let reloaded = store.get_task("proj", &task.id).unwrap().unwrap();
        assert_eq!(reloaded.status, TaskStatus::InProgress);
        assert_eq!(reloaded.claimed_by.as_deref(), Some("agent-1"));
    }

    #[test]
    fn complete_task_is_idempotent_false_on_repeat() {
        let store = CoordinationStore::open_in_memory().unwrap();
        let task = store.create_task("TASK", "proj", "do thing", None, None, None).unwrap();
        assert!(store.complete_task("proj", &task.id).unwrap());
        assert!(!store.complete_task("proj", &task.id).unwrap());
    }

    #[test]
    fn s5_claim_resource_exclusivity() {
        let store = CoordinationStore::open_in_memory().unwrap();
        let first = store.claim_resource("proj", "src/auth.rs", "agent-1").unwrap();
        let second = store.claim_resource("proj", "src/auth.rs", "agent-2").unwrap();
        assert!(first);
        assert!(!second);

        let locks = store.get_locks("proj").unwrap();
        assert_eq!(locks.len(), 1);
        assert_eq!(locks[0].agent_id, "agent-1");
    }

    #[test]
    fn release_resource_only_by_owner() {
        let store = CoordinationStore::open_in_memory().unwrap();
        store.claim_resource("proj", "res", "agent-1").unwrap();
        assert!(!store.release_resource("proj", "res", "agent-2").unwrap());
        assert!(store.release_resource("proj", "res", "agent-1").unwrap());
        assert!(store.get_locks("proj").unwrap().is_empty());
    }

    #[test]
    fn cleanup_orphaned_locks_removes_locks_of_inactive_agents() {
        let store = CoordinationStore::open_in_memory().unwrap();
        let (agent_id, _) = store.register("proj", "Dev", None).unwrap();
        store.claim_resource("proj", "res", &agent_id).unwrap();
        store.set_agent_status("proj", &agent_id, AgentStatus::Inactive).unwrap();

        let removed = store.cleanup_orphaned_locks().unwrap();
        assert_eq!(removed, 1);
        assert!(store.get_locks("proj").unwrap().is_empty());
    }

    #[test]
    fn delegation_dedup_blocks_near_duplicate_title() {
        let store = CoordinationStore::open_in_memory().unwrap();
        store.create_task("TASK", "downstream", "Fix login bug", None, None, None).unwrap();

        let outcome = store
            .create_external_task("downstream", "Fix login bugs", None, "upstream", Some("agent-1"))
            .unwrap();

        match outcome {
            TaskCreationOutcome::Duplicate { status, .. } => assert_eq!(status, TaskStatus::Pending),
            TaskCreationOutcome::Created(_) => panic!("expected a duplicate to be detected"),
        }
        assert_eq!(store.list_tasks("downstream").unwrap().len(), 1);
    }

    #[test]
    fn delegation_allows_distinct_titles() {
        let store = CoordinationStore::open_in_memory().unwrap();
        store.create_task("TASK", "downstream", "Fix login bug", None, None, None).unwrap();

        let outcome = store
            .create_external_task("downstream", "Refactor vector store search", None, "upstream", None)
            .unwrap();

        assert!(matches!(outcome, TaskCreationOutcome::Created(_)));
        assert_eq!(store.list_tasks("downstream").unwrap().len(), 2);
    }

    #[test]
    fn session_events_are_append_only_and_ordered() {
        let store = CoordinationStore::open_in_memory().unwrap();
        store
            .log_session_event("proj", "sess-1", Some("agent-1"), "scan_started", &serde_json::json!({}))
            .unwrap();
        store
            .log_session_event("proj", "sess-1", Some("agent-1"), "scan_finished", &serde_json::json!({"files": 2}))
            .unwrap();

        let events = store.session_events("proj", "sess-1").unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, "scan_started");
        assert_eq!(events[1].event_type, "scan_finished");
    }

    #[test]
    fn cleanup_stale_agents_demotes_past_threshold() {
        let store = CoordinationStore::open_in_memory().unwrap();
        let (agent_id, _) = store.register("proj", "Dev", None).unwrap();
        {
            let conn = store.pool.get().unwrap();
            conn.execute(
                "UPDATE agents SET last_heartbeat = 0 WHERE agent_id = ?1",
                params![agent_id],
            )
            .unwrap();
        }

        let demoted = store.cleanup_stale_agents(5).unwrap();
        assert_eq!(demoted, 1);
        assert!(store.get_active_agent("proj").unwrap().is_none());
    }

    #[test]
    fn migrating_twice_is_a_no_op() {
        let store = CoordinationStore::open_in_memory().unwrap();
        let mut conn = store.pool.get().unwrap();
        schema::migrate(&mut conn).unwrap();
    }
}

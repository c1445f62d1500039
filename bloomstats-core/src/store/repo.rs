//! Database repository layer
//!
//! The bundled SQLite reference implementation of [`EventLog`], plus the
//! write path the app's ingestion side uses to record registrations and
//! actions.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection};

use crate::error::Result;
use crate::events::EventLog;
use crate::types::{ActionEvent, ActionKind, DateRange, User, UserId};

/// Database handle with connection pooling (single connection for now)
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Enable foreign keys and WAL mode for better concurrency
        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        super::schema::run_migrations(&conn)
    }

    // ============================================
    // Write path
    // ============================================

    /// Insert a user record.
    pub fn insert_user(&self, user: &User) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO users (id, registered_at, last_activity) VALUES (?1, ?2, ?3)",
            params![
                user.id,
                user.registered_at.to_rfc3339(),
                user.last_activity.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    /// Record an action event and advance the actor's `last_activity`.
    ///
    /// `last_activity` only ever moves forward: recording an out-of-order
    /// event never rewinds the snapshot.
    pub fn record_action(&self, event: &ActionEvent) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO action_events (user_id, kind, occurred_at) VALUES (?1, ?2, ?3)",
            params![
                event.user_id,
                event.kind.as_str(),
                event.occurred_at.to_rfc3339(),
            ],
        )?;
        conn.execute(
            r#"
            UPDATE users SET last_activity = ?2
            WHERE id = ?1
              AND (last_activity IS NULL OR last_activity < ?2)
            "#,
            params![event.user_id, event.occurred_at.to_rfc3339()],
        )?;
        Ok(())
    }

    /// Advance a user's `last_activity` for interactions that are not
    /// action events (opening the app, reading a reminder).
    pub fn touch_activity(&self, user_id: UserId, at: DateTime<Utc>) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            UPDATE users SET last_activity = ?2
            WHERE id = ?1
              AND (last_activity IS NULL OR last_activity < ?2)
            "#,
            params![user_id, at.to_rfc3339()],
        )?;
        Ok(())
    }

    /// Fetch a user's `last_activity` date, if any.
    pub fn last_activity(&self, user_id: UserId) -> Result<Option<NaiveDate>> {
        let conn = self.conn.lock().unwrap();
        let raw: Option<String> = conn.query_row(
            "SELECT date(last_activity) FROM users WHERE id = ?1",
            [user_id],
            |r| r.get(0),
        )?;
        Ok(raw.and_then(|s| s.parse().ok()))
    }

    fn count(&self, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(sql, params, |r| r.get(0))?;
        Ok(count)
    }
}

impl EventLog for Database {
    fn count_registered(&self, window: DateRange) -> Result<i64> {
        self.count(
            "SELECT COUNT(*) FROM users WHERE date(registered_at) BETWEEN ?1 AND ?2",
            &[&window.start.to_string(), &window.end.to_string()],
        )
    }

    fn count_registered_through(&self, end: NaiveDate) -> Result<i64> {
        self.count(
            "SELECT COUNT(*) FROM users WHERE date(registered_at) <= ?1",
            &[&end.to_string()],
        )
    }

    fn count_distinct_actors(&self, kind: ActionKind, window: DateRange) -> Result<i64> {
        self.count(
            r#"
            SELECT COUNT(DISTINCT user_id) FROM action_events
            WHERE kind = ?1 AND date(occurred_at) BETWEEN ?2 AND ?3
            "#,
            &[
                &kind.as_str(),
                &window.start.to_string(),
                &window.end.to_string(),
            ],
        )
    }

    fn actor_ids(
        &self,
        kind: ActionKind,
        window: DateRange,
        registered_in: Option<DateRange>,
    ) -> Result<HashSet<UserId>> {
        let conn = self.conn.lock().unwrap();
        let mut ids = HashSet::new();

        match registered_in {
            Some(cohort) => {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT DISTINCT e.user_id
                    FROM action_events e
                    JOIN users u ON u.id = e.user_id
                    WHERE e.kind = ?1
                      AND date(e.occurred_at) BETWEEN ?2 AND ?3
                      AND date(u.registered_at) BETWEEN ?4 AND ?5
                    "#,
                )?;
                let rows = stmt.query_map(
                    params![
                        kind.as_str(),
                        window.start.to_string(),
                        window.end.to_string(),
                        cohort.start.to_string(),
                        cohort.end.to_string(),
                    ],
                    |r| r.get::<_, UserId>(0),
                )?;
                for row in rows {
                    ids.insert(row?);
                }
            }
            None => {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT DISTINCT user_id FROM action_events
                    WHERE kind = ?1 AND date(occurred_at) BETWEEN ?2 AND ?3
                    "#,
                )?;
                let rows = stmt.query_map(
                    params![
                        kind.as_str(),
                        window.start.to_string(),
                        window.end.to_string(),
                    ],
                    |r| r.get::<_, UserId>(0),
                )?;
                for row in rows {
                    ids.insert(row?);
                }
            }
        }

        Ok(ids)
    }

    fn count_last_activity(
        &self,
        window: DateRange,
        registered_in: Option<DateRange>,
    ) -> Result<i64> {
        match registered_in {
            Some(cohort) => self.count(
                r#"
                SELECT COUNT(*) FROM users
                WHERE last_activity IS NOT NULL
                  AND date(last_activity) BETWEEN ?1 AND ?2
                  AND date(registered_at) BETWEEN ?3 AND ?4
                "#,
                &[
                    &window.start.to_string(),
                    &window.end.to_string(),
                    &cohort.start.to_string(),
                    &cohort.end.to_string(),
                ],
            ),
            None => self.count(
                r#"
                SELECT COUNT(*) FROM users
                WHERE last_activity IS NOT NULL
                  AND date(last_activity) BETWEEN ?1 AND ?2
                "#,
                &[&window.start.to_string(), &window.end.to_string()],
            ),
        }
    }

    fn count_events(&self, kind: ActionKind, window: DateRange) -> Result<i64> {
        self.count(
            r#"
            SELECT COUNT(*) FROM action_events
            WHERE kind = ?1 AND date(occurred_at) BETWEEN ?2 AND ?3
            "#,
            &[
                &kind.as_str(),
                &window.start.to_string(),
                &window.end.to_string(),
            ],
        )
    }
}

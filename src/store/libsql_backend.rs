//! libSQL backend — async `Database` trait implementation.
//!
//! Supports local file and in-memory databases. Raw CGPA and backlog values
//! are kept as JSON so their stored shape survives a round trip; the coerced
//! score is written alongside in an indexed column for the min-score read.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::criteria::{CandidateRecord, DriveConstraint, RawNumber};
use crate::drives::Drive;
use crate::error::DatabaseError;
use crate::notify::NotificationRecord;
use crate::store::migrations;
use crate::store::traits::Database;

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let backend = Self::from_database(db)?;
        backend.run_migrations().await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let backend = Self::from_database(db)?;
        backend.run_migrations().await?;
        Ok(backend)
    }

    fn from_database(db: LibSqlDatabase) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;
        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Canonical write format: fixed-width so text ordering matches time ordering.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

fn raw_to_json(raw: &RawNumber) -> Result<String, DatabaseError> {
    serde_json::to_string(raw).map_err(|e| DatabaseError::Serialization(e.to_string()))
}

/// Unreadable stored JSON degrades to `Missing`, which coerces to zero.
fn json_to_raw(s: &str) -> RawNumber {
    serde_json::from_str(s).unwrap_or_default()
}

const CANDIDATE_COLUMNS: &str = "id, name, cgpa_raw, backlogs_raw, branch, delivery_handle";

fn row_to_candidate(row: &libsql::Row) -> Result<CandidateRecord, libsql::Error> {
    let cgpa_raw: String = row.get(2)?;
    let backlogs_raw: String = row.get(3)?;
    Ok(CandidateRecord {
        id: row.get(0)?,
        name: row.get::<String>(1).unwrap_or_default(),
        cgpa: json_to_raw(&cgpa_raw),
        backlogs: json_to_raw(&backlogs_raw),
        branch: row.get::<String>(4).ok(),
        delivery_handle: row.get::<String>(5).ok(),
    })
}

const DRIVE_COLUMNS: &str = "id, company, role, description, constraint_json, created_by, created_at";

fn row_to_drive(row: &libsql::Row) -> Result<Drive, String> {
    let constraint_json: String = row.get(4).map_err(|e| e.to_string())?;
    let constraint: DriveConstraint =
        serde_json::from_str(&constraint_json).map_err(|e| format!("bad constraint: {e}"))?;
    let created_at: String = row.get(6).map_err(|e| e.to_string())?;
    Ok(Drive {
        id: row.get(0).map_err(|e| e.to_string())?,
        company: row.get(1).map_err(|e| e.to_string())?,
        role: row.get(2).map_err(|e| e.to_string())?,
        description: row.get::<String>(3).unwrap_or_default(),
        constraint,
        created_by: row.get(5).map_err(|e| e.to_string())?,
        created_at: parse_datetime(&created_at),
    })
}

const NOTIFICATION_COLUMNS: &str =
    "id, recipient_id, drive_id, title, body, created_at, read, idempotency_key, delivery_handle";

fn row_to_notification(row: &libsql::Row) -> Result<NotificationRecord, String> {
    let id_str: String = row.get(0).map_err(|e| e.to_string())?;
    let id = Uuid::parse_str(&id_str).map_err(|e| format!("bad id {id_str}: {e}"))?;
    let created_at: String = row.get(5).map_err(|e| e.to_string())?;
    Ok(NotificationRecord {
        id,
        recipient_id: row.get(1).map_err(|e| e.to_string())?,
        drive_id: row.get::<String>(2).ok(),
        title: row.get(3).map_err(|e| e.to_string())?,
        body: row.get(4).map_err(|e| e.to_string())?,
        created_at: parse_datetime(&created_at),
        read: row.get::<i64>(6).unwrap_or(0) != 0,
        idempotency_key: row.get::<String>(7).ok(),
        delivery_handle: row.get::<String>(8).ok(),
    })
}

/// Drain `rows`, decoding each one.
///
/// A failed step aborts with `DatabaseError::Query` so callers never see a
/// truncated result. Rows that fail to decode are skipped with a warning.
async fn collect_rows<T, E, F>(
    mut rows: libsql::Rows,
    context: &str,
    decode: F,
) -> Result<Vec<T>, DatabaseError>
where
    F: Fn(&libsql::Row) -> Result<T, E>,
    E: std::fmt::Display,
{
    let mut items = Vec::new();
    while let Some(row) = rows
        .next()
        .await
        .map_err(|e| DatabaseError::Query(format!("{context}: {e}")))?
    {
        match decode(&row) {
            Ok(item) => items.push(item),
            Err(e) => warn!("Skipping {context} row: {e}"),
        }
    }
    Ok(items)
}

#[async_trait]
impl Database for LibSqlBackend {
    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(self.conn()).await
    }

    // ── Candidates ──────────────────────────────────────────────────

    async fn upsert_candidate(&self, candidate: &CandidateRecord) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO candidates (id, name, cgpa_raw, backlogs_raw, score, branch, delivery_handle, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    cgpa_raw = excluded.cgpa_raw,
                    backlogs_raw = excluded.backlogs_raw,
                    score = excluded.score,
                    branch = excluded.branch,
                    delivery_handle = excluded.delivery_handle,
                    updated_at = excluded.updated_at",
                params![
                    candidate.id.clone(),
                    candidate.name.clone(),
                    raw_to_json(&candidate.cgpa)?,
                    raw_to_json(&candidate.backlogs)?,
                    candidate.score(),
                    candidate.branch.clone(),
                    candidate.delivery_handle.clone(),
                    format_datetime(&Utc::now()),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("upsert_candidate: {e}")))?;
        debug!(candidate_id = %candidate.id, "Candidate upserted");
        Ok(())
    }

    async fn get_candidate(&self, id: &str) -> Result<Option<CandidateRecord>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {CANDIDATE_COLUMNS} FROM candidates WHERE id = ?1"),
                params![id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_candidate: {e}")))?;

        match rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("get_candidate: {e}")))?
        {
            Some(row) => row_to_candidate(&row)
                .map(Some)
                .map_err(|e| DatabaseError::Serialization(format!("candidate {id}: {e}"))),
            None => Ok(None),
        }
    }

    async fn candidates_with_min_score(
        &self,
        min_score: f64,
    ) -> Result<Vec<CandidateRecord>, DatabaseError> {
        let rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {CANDIDATE_COLUMNS} FROM candidates WHERE score >= ?1 ORDER BY rowid ASC"
                ),
                params![min_score],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("candidates_with_min_score: {e}")))?;

        collect_rows(rows, "candidates_with_min_score", row_to_candidate).await
    }

    // ── Drives ──────────────────────────────────────────────────────

    async fn insert_drive(&self, drive: &Drive) -> Result<(), DatabaseError> {
        let constraint_json = serde_json::to_string(&drive.constraint)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?;
        self.conn()
            .execute(
                "INSERT OR REPLACE INTO drives (id, company, role, description, constraint_json, created_by, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    drive.id.clone(),
                    drive.company.clone(),
                    drive.role.clone(),
                    drive.description.clone(),
                    constraint_json,
                    drive.created_by.clone(),
                    format_datetime(&drive.created_at),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("insert_drive: {e}")))?;
        Ok(())
    }

    async fn get_drive(&self, id: &str) -> Result<Option<Drive>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {DRIVE_COLUMNS} FROM drives WHERE id = ?1"),
                params![id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_drive: {e}")))?;

        match rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("get_drive: {e}")))?
        {
            Some(row) => row_to_drive(&row)
                .map(Some)
                .map_err(|e| DatabaseError::Serialization(format!("drive {id}: {e}"))),
            None => Ok(None),
        }
    }

    async fn list_drives(&self) -> Result<Vec<Drive>, DatabaseError> {
        let rows = self
            .conn()
            .query(
                &format!("SELECT {DRIVE_COLUMNS} FROM drives ORDER BY created_at DESC"),
                (),
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_drives: {e}")))?;

        collect_rows(rows, "list_drives", row_to_drive).await
    }

    // ── Notifications ───────────────────────────────────────────────

    async fn insert_notification(
        &self,
        notification: &NotificationRecord,
    ) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                &format!(
                    "INSERT INTO notifications ({NOTIFICATION_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
                ),
                params![
                    notification.id.to_string(),
                    notification.recipient_id.clone(),
                    notification.drive_id.clone(),
                    notification.title.clone(),
                    notification.body.clone(),
                    format_datetime(&notification.created_at),
                    i64::from(notification.read),
                    notification.idempotency_key.clone(),
                    notification.delivery_handle.clone(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("insert_notification: {e}")))?;
        debug!(
            notification_id = %notification.id,
            recipient = %notification.recipient_id,
            "Notification stored"
        );
        Ok(())
    }

    async fn notifications_for(
        &self,
        recipient_id: &str,
    ) -> Result<Vec<NotificationRecord>, DatabaseError> {
        let rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE recipient_id = ?1 ORDER BY created_at DESC"
                ),
                params![recipient_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("notifications_for: {e}")))?;

        collect_rows(rows, "notifications_for", row_to_notification).await
    }

    async fn unread_count(&self, recipient_id: &str) -> Result<usize, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT COUNT(*) FROM notifications WHERE recipient_id = ?1 AND read = 0",
                params![recipient_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("unread_count: {e}")))?;

        let count = match rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("unread_count: {e}")))?
        {
            Some(row) => row.get::<i64>(0).unwrap_or(0),
            None => 0,
        };
        Ok(count.max(0) as usize)
    }

    async fn mark_read(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let affected = self
            .conn()
            .execute(
                "UPDATE notifications SET read = 1 WHERE id = ?1",
                params![id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("mark_read: {e}")))?;
        Ok(affected > 0)
    }
}

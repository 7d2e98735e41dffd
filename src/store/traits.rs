//! `Database` trait — the single async port for all persistence.
//!
//! Services receive an `Arc<dyn Database>` explicitly; nothing in the crate
//! reaches for a global store handle.

use async_trait::async_trait;
use uuid::Uuid;

use crate::criteria::CandidateRecord;
use crate::drives::Drive;
use crate::error::DatabaseError;
use crate::notify::NotificationRecord;

/// Backend-agnostic database trait covering candidates, drives, and notifications.
#[async_trait]
pub trait Database: Send + Sync {
    /// Run all pending schema migrations.
    async fn run_migrations(&self) -> Result<(), DatabaseError>;

    // ── Candidates ──────────────────────────────────────────────────

    /// Insert or replace a student's profile.
    async fn upsert_candidate(&self, candidate: &CandidateRecord) -> Result<(), DatabaseError>;

    /// Get a candidate by ID.
    async fn get_candidate(&self, id: &str) -> Result<Option<CandidateRecord>, DatabaseError>;

    /// Candidates whose coerced CGPA is at least `min_score`, in insertion order.
    ///
    /// Only the score bound is applied here. Backlog and branch checks are the
    /// caller's job.
    async fn candidates_with_min_score(
        &self,
        min_score: f64,
    ) -> Result<Vec<CandidateRecord>, DatabaseError>;

    // ── Drives ──────────────────────────────────────────────────────

    async fn insert_drive(&self, drive: &Drive) -> Result<(), DatabaseError>;

    async fn get_drive(&self, id: &str) -> Result<Option<Drive>, DatabaseError>;

    /// All drives, newest first.
    async fn list_drives(&self) -> Result<Vec<Drive>, DatabaseError>;

    // ── Notifications ───────────────────────────────────────────────

    /// Store a notification. Duplicate idempotency keys are accepted.
    async fn insert_notification(
        &self,
        notification: &NotificationRecord,
    ) -> Result<(), DatabaseError>;

    /// Notifications for a recipient, newest first.
    async fn notifications_for(
        &self,
        recipient_id: &str,
    ) -> Result<Vec<NotificationRecord>, DatabaseError>;

    /// Number of unread notifications for a recipient.
    async fn unread_count(&self, recipient_id: &str) -> Result<usize, DatabaseError>;

    /// Mark a notification read. Returns `false` if it does not exist.
    async fn mark_read(&self, id: Uuid) -> Result<bool, DatabaseError>;
}

//! In-memory store with a broadcast feed of new notifications.
//!
//! Suitable for tests and single-process runs. Listeners call
//! [`MemoryStore::subscribe`] to receive every notification as it is written.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{RwLock, broadcast};
use tracing::debug;
use uuid::Uuid;

use crate::criteria::CandidateRecord;
use crate::drives::Drive;
use crate::error::DatabaseError;
use crate::notify::NotificationRecord;
use crate::store::traits::Database;

/// Default broadcast channel capacity.
const DEFAULT_BROADCAST_CAPACITY: usize = 256;

pub struct MemoryStore {
    candidates: RwLock<Vec<CandidateRecord>>,
    drives: RwLock<Vec<Drive>>,
    notifications: RwLock<Vec<NotificationRecord>>,
    tx: broadcast::Sender<NotificationRecord>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        let (tx, _rx) = broadcast::channel(DEFAULT_BROADCAST_CAPACITY);
        Arc::new(Self {
            candidates: RwLock::new(Vec::new()),
            drives: RwLock::new(Vec::new()),
            notifications: RwLock::new(Vec::new()),
            tx,
        })
    }

    /// Subscribe to notifications written after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<NotificationRecord> {
        self.tx.subscribe()
    }
}

#[async_trait]
impl Database for MemoryStore {
    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn upsert_candidate(&self, candidate: &CandidateRecord) -> Result<(), DatabaseError> {
        let mut candidates = self.candidates.write().await;
        match candidates.iter_mut().find(|c| c.id == candidate.id) {
            Some(existing) => *existing = candidate.clone(),
            None => candidates.push(candidate.clone()),
        }
        debug!(candidate_id = %candidate.id, "Candidate upserted");
        Ok(())
    }

    async fn get_candidate(&self, id: &str) -> Result<Option<CandidateRecord>, DatabaseError> {
        let candidates = self.candidates.read().await;
        Ok(candidates.iter().find(|c| c.id == id).cloned())
    }

    async fn candidates_with_min_score(
        &self,
        min_score: f64,
    ) -> Result<Vec<CandidateRecord>, DatabaseError> {
        let candidates = self.candidates.read().await;
        Ok(candidates
            .iter()
            .filter(|c| c.score() >= min_score)
            .cloned()
            .collect())
    }

    async fn insert_drive(&self, drive: &Drive) -> Result<(), DatabaseError> {
        let mut drives = self.drives.write().await;
        drives.retain(|d| d.id != drive.id);
        drives.push(drive.clone());
        Ok(())
    }

    async fn get_drive(&self, id: &str) -> Result<Option<Drive>, DatabaseError> {
        let drives = self.drives.read().await;
        Ok(drives.iter().find(|d| d.id == id).cloned())
    }

    async fn list_drives(&self) -> Result<Vec<Drive>, DatabaseError> {
        let mut drives = self.drives.read().await.clone();
        drives.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(drives)
    }

    async fn insert_notification(
        &self,
        notification: &NotificationRecord,
    ) -> Result<(), DatabaseError> {
        {
            let mut notifications = self.notifications.write().await;
            notifications.push(notification.clone());
        }
        debug!(
            notification_id = %notification.id,
            recipient = %notification.recipient_id,
            "Notification stored"
        );

        // Ok if no listeners are subscribed yet
        let _ = self.tx.send(notification.clone());
        Ok(())
    }

    async fn notifications_for(
        &self,
        recipient_id: &str,
    ) -> Result<Vec<NotificationRecord>, DatabaseError> {
        let notifications = self.notifications.read().await;
        let mut mine: Vec<NotificationRecord> = notifications
            .iter()
            .filter(|n| n.recipient_id == recipient_id)
            .cloned()
            .collect();
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(mine)
    }

    async fn unread_count(&self, recipient_id: &str) -> Result<usize, DatabaseError> {
        let notifications = self.notifications.read().await;
        Ok(notifications
            .iter()
            .filter(|n| n.recipient_id == recipient_id && !n.read)
            .count())
    }

    async fn mark_read(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let mut notifications = self.notifications.write().await;
        match notifications.iter_mut().find(|n| n.id == id) {
            Some(n) => {
                n.read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::{DriveConstraint, RawNumber};

    #[tokio::test]
    async fn upsert_replaces_in_place() {
        let store = MemoryStore::new();
        store.upsert_candidate(&CandidateRecord::new("a", 6.0, 0)).await.unwrap();
        store.upsert_candidate(&CandidateRecord::new("b", 7.0, 0)).await.unwrap();
        store.upsert_candidate(&CandidateRecord::new("a", 9.0, 0)).await.unwrap();

        let all = store.candidates_with_min_score(0.0).await.unwrap();
        let ids: Vec<&str> = all.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(store.get_candidate("a").await.unwrap().unwrap().score(), 9.0);
    }

    #[tokio::test]
    async fn min_score_uses_coerced_value() {
        let store = MemoryStore::new();
        let mut text = CandidateRecord::new("t", 0.0, 0);
        text.cgpa = RawNumber::Text("8.0".into());
        let mut junk = CandidateRecord::new("j", 0.0, 0);
        junk.cgpa = RawNumber::Text("??".into());
        store.upsert_candidate(&text).await.unwrap();
        store.upsert_candidate(&junk).await.unwrap();

        let above = store.candidates_with_min_score(7.0).await.unwrap();
        assert_eq!(above.len(), 1);
        assert_eq!(above[0].id, "t");
        assert_eq!(store.candidates_with_min_score(0.0).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn subscribers_receive_new_notifications() {
        let store = MemoryStore::new();
        let mut rx = store.subscribe();

        let n = NotificationRecord::new("stu-1", "New drive", "Apply now");
        store.insert_notification(&n).await.unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.id, n.id);
    }

    #[tokio::test]
    async fn mark_read_updates_unread_count() {
        let store = MemoryStore::new();
        let first = NotificationRecord::new("stu-1", "a", "a");
        let second = NotificationRecord::new("stu-1", "b", "b");
        store.insert_notification(&first).await.unwrap();
        store.insert_notification(&second).await.unwrap();
        store
            .insert_notification(&NotificationRecord::new("stu-2", "c", "c"))
            .await
            .unwrap();

        assert_eq!(store.unread_count("stu-1").await.unwrap(), 2);
        assert!(store.mark_read(first.id).await.unwrap());
        assert_eq!(store.unread_count("stu-1").await.unwrap(), 1);
        assert!(!store.mark_read(Uuid::new_v4()).await.unwrap());
        assert_eq!(store.notifications_for("stu-1").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn drives_listed_newest_first() {
        let store = MemoryStore::new();
        let mut older = Drive::new("Old", "SDE", DriveConstraint::new(6.0, 1), "tpo");
        older.created_at = older.created_at - chrono::Duration::days(1);
        let newer = Drive::new("New", "SDE", DriveConstraint::new(6.0, 1), "tpo");
        store.insert_drive(&older).await.unwrap();
        store.insert_drive(&newer).await.unwrap();

        let drives = store.list_drives().await.unwrap();
        assert_eq!(drives[0].company, "New");
        assert_eq!(store.get_drive(&older.id).await.unwrap().unwrap().company, "Old");
    }
}

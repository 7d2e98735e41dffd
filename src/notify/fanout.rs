//! Notification fan-out — one notification per eligible candidate.
//!
//! Flow:
//! 1. Read the population with the drive's score floor pushed to the store
//! 2. Apply the full eligibility check in-process
//! 3. Write each notification independently, unordered
//!
//! Writes are not atomic across the batch and are not retried. A failed write
//! is logged and reported; the other candidates are still notified. Running
//! the same fan-out twice notifies everyone twice.

use std::borrow::Borrow;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{info, warn};
use uuid::Uuid;

use crate::criteria::{CandidateRecord, DriveConstraint, is_eligible};
use crate::drives::Drive;
use crate::error::FanoutError;
use crate::notify::model::{NotificationRecord, NotificationTemplate};
use crate::store::Database;

/// Render one notification per eligible candidate, in input order.
///
/// Pure: nothing is written, and each call mints fresh IDs.
pub fn notify_eligible<I>(
    candidates: I,
    constraint: &DriveConstraint,
    template: &NotificationTemplate,
) -> Vec<NotificationRecord>
where
    I: IntoIterator,
    I::Item: Borrow<CandidateRecord>,
{
    candidates
        .into_iter()
        .filter(|c| is_eligible(c.borrow(), constraint))
        .map(|c| template.render(c.borrow()))
        .collect()
}

/// A notification that could not be written.
#[derive(Debug)]
pub struct FailedDelivery {
    pub candidate_id: String,
    pub error: FanoutError,
}

/// Outcome of a single fan-out.
#[derive(Debug)]
pub struct FanoutReport {
    pub drive_id: String,
    /// Candidates returned by the score-floor read.
    pub scanned: usize,
    /// Candidates that passed every check.
    pub eligible: usize,
    /// IDs of notifications that were written.
    pub delivered: Vec<Uuid>,
    pub failed: Vec<FailedDelivery>,
}

impl FanoutReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Drives notification fan-out against an injected store.
pub struct NotificationFanout {
    db: Arc<dyn Database>,
    concurrency: usize,
}

impl NotificationFanout {
    /// `concurrency` bounds the number of writes in flight (minimum 1).
    pub fn new(db: Arc<dyn Database>, concurrency: usize) -> Self {
        Self {
            db,
            concurrency: concurrency.max(1),
        }
    }

    /// Store a new drive, then notify everyone eligible for it.
    pub async fn create_drive_and_notify(
        &self,
        drive: &Drive,
        template: &NotificationTemplate,
    ) -> Result<FanoutReport, FanoutError> {
        self.db
            .insert_drive(drive)
            .await
            .map_err(|source| FanoutError::DriveWrite {
                drive_id: drive.id.clone(),
                source,
            })?;
        info!(drive_id = %drive.id, company = %drive.company, "Drive created");
        self.publish(drive, template).await
    }

    /// Notify every eligible candidate about `drive`.
    ///
    /// Only the population read can fail the call; write failures end up in
    /// [`FanoutReport::failed`].
    pub async fn publish(
        &self,
        drive: &Drive,
        template: &NotificationTemplate,
    ) -> Result<FanoutReport, FanoutError> {
        // Notifications are always keyed to the drive being published.
        let template = template.clone().for_drive(&drive.id);

        let population = self
            .db
            .candidates_with_min_score(drive.constraint.min_score)
            .await
            .map_err(|source| FanoutError::Read {
                drive_id: drive.id.clone(),
                source,
            })?;

        let scanned = population.len();
        let notifications = notify_eligible(&population, &drive.constraint, &template);
        let eligible = notifications.len();

        info!(
            drive_id = %drive.id,
            scanned,
            eligible,
            "Fanning out drive notifications"
        );

        let results: Vec<_> = stream::iter(notifications)
            .map(|notification| {
                let db = Arc::clone(&self.db);
                async move {
                    let result = db.insert_notification(&notification).await;
                    (notification, result)
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut delivered = Vec::with_capacity(eligible);
        let mut failed = Vec::new();
        for (notification, result) in results {
            match result {
                Ok(()) => delivered.push(notification.id),
                Err(e) => {
                    warn!(
                        drive_id = %drive.id,
                        candidate_id = %notification.recipient_id,
                        error = %e,
                        "Notification write failed"
                    );
                    failed.push(FailedDelivery {
                        candidate_id: notification.recipient_id,
                        error: FanoutError::Write {
                            id: notification.id,
                            reason: e.to_string(),
                        },
                    });
                }
            }
        }

        info!(
            drive_id = %drive.id,
            delivered = delivered.len(),
            failed = failed.len(),
            "Fan-out complete"
        );

        Ok(FanoutReport {
            drive_id: drive.id.clone(),
            scanned,
            eligible,
            delivered,
            failed,
        })
    }
}

//! Notification data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::criteria::CandidateRecord;

/// One in-app notification addressed to a single student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    /// Generated notification ID.
    pub id: Uuid,
    /// Student user ID.
    pub recipient_id: String,
    /// Drive that triggered the notification, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drive_id: Option<String>,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    /// Set once the student opens the notification.
    #[serde(default)]
    pub read: bool,
    /// `"<candidate>:<drive>"`. Stored for callers that want to deduplicate;
    /// nothing in this crate enforces uniqueness.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
    /// Push token copied from the recipient's profile, for the delivery listener.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_handle: Option<String>,
}

impl NotificationRecord {
    /// Create an unread notification.
    pub fn new(
        recipient_id: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            recipient_id: recipient_id.into(),
            drive_id: None,
            title: title.into(),
            body: body.into(),
            created_at: Utc::now(),
            read: false,
            idempotency_key: None,
            delivery_handle: None,
        }
    }

    /// Link the notification to a drive and derive its idempotency key.
    pub fn with_drive(mut self, drive_id: impl Into<String>) -> Self {
        let drive_id = drive_id.into();
        self.idempotency_key = Some(idempotency_key(&self.recipient_id, &drive_id));
        self.drive_id = Some(drive_id);
        self
    }
}

/// Key identifying "this candidate was told about this drive".
pub fn idempotency_key(candidate_id: &str, drive_id: &str) -> String {
    format!("{candidate_id}:{drive_id}")
}

/// Title/body template rendered once per recipient.
///
/// Supported placeholders: `{name}`, `{candidate_id}`, `{branch}`.
/// Anything else in braces is left untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drive_id: Option<String>,
    pub title: String,
    pub body: String,
}

impl NotificationTemplate {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            drive_id: None,
            title: title.into(),
            body: body.into(),
        }
    }

    pub fn for_drive(mut self, drive_id: impl Into<String>) -> Self {
        self.drive_id = Some(drive_id.into());
        self
    }

    /// Render a notification for `candidate`.
    pub fn render(&self, candidate: &CandidateRecord) -> NotificationRecord {
        let mut record = NotificationRecord::new(
            &candidate.id,
            fill(&self.title, candidate),
            fill(&self.body, candidate),
        );
        record.delivery_handle = candidate.delivery_handle.clone();
        match &self.drive_id {
            Some(drive_id) => record.with_drive(drive_id),
            None => record,
        }
    }
}

fn fill(template: &str, candidate: &CandidateRecord) -> String {
    let name = if candidate.name.is_empty() {
        "Student"
    } else {
        candidate.name.as_str()
    };
    template
        .replace("{name}", name)
        .replace("{candidate_id}", &candidate.id)
        .replace("{branch}", candidate.branch.as_deref().unwrap_or(""))
}

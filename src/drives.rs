//! Recruitment drives and the student-side drive board.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::criteria::{CandidateRecord, DriveConstraint, Ineligibility, explain, is_eligible};

/// A recruitment drive posted by a TPO.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drive {
    pub id: String,
    pub company: String,
    pub role: String,
    #[serde(default)]
    pub description: String,
    pub constraint: DriveConstraint,
    /// TPO user ID.
    pub created_by: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Drive {
    /// Create a drive with a generated ID, stamped now.
    pub fn new(
        company: impl Into<String>,
        role: impl Into<String>,
        constraint: DriveConstraint,
        created_by: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            company: company.into(),
            role: role.into(),
            description: String::new(),
            constraint,
            created_by: created_by.into(),
            created_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn is_open_to(&self, candidate: &CandidateRecord) -> bool {
        is_eligible(candidate, &self.constraint)
    }

    /// Why `candidate` cannot apply. Empty when they can.
    pub fn blockers_for(&self, candidate: &CandidateRecord) -> Vec<Ineligibility> {
        explain(candidate, &self.constraint)
    }
}

/// Drives `candidate` is eligible for, newest first.
pub fn eligible_drives<'a>(candidate: &CandidateRecord, drives: &'a [Drive]) -> Vec<&'a Drive> {
    let mut open: Vec<&Drive> = drives.iter().filter(|d| d.is_open_to(candidate)).collect();
    open.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    open
}

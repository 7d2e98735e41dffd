//! Candidate and constraint records consumed by the criteria engine.

use serde::{Deserialize, Serialize};

use crate::criteria::coerce::{
    RawNumber, deserialize_lenient_f64, deserialize_lenient_u32, to_canonical_number,
};

/// A student's eligibility-relevant profile, as read from the store.
///
/// Numeric fields keep their stored representation; use [`score`] and
/// [`backlogs`] for comparisons.
///
/// [`score`]: CandidateRecord::score
/// [`backlogs`]: CandidateRecord::backlogs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    /// Student user ID.
    pub id: String,
    /// Display name, used when rendering notifications.
    #[serde(default)]
    pub name: String,
    /// Cumulative grade-point average (0.0 to 10.0 when well-formed).
    #[serde(default)]
    pub cgpa: RawNumber,
    /// Outstanding failed-course backlogs.
    #[serde(default)]
    pub backlogs: RawNumber,
    /// Branch/department label, e.g. "CSE".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Push token or other delivery address for this student.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_handle: Option<String>,
}

impl CandidateRecord {
    /// Create a candidate with numeric score and backlogs.
    pub fn new(id: impl Into<String>, cgpa: f64, backlogs: u32) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            cgpa: RawNumber::from(cgpa),
            backlogs: RawNumber::from(backlogs),
            branch: None,
            delivery_handle: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn with_delivery_handle(mut self, handle: impl Into<String>) -> Self {
        self.delivery_handle = Some(handle.into());
        self
    }

    /// Canonical CGPA; unreadable values count as 0.0.
    pub fn score(&self) -> f64 {
        to_canonical_number(&self.cgpa, 0.0)
    }

    /// Canonical backlog count as `f64`; unreadable values count as 0.
    pub fn backlogs(&self) -> f64 {
        to_canonical_number(&self.backlogs, 0.0)
    }
}

/// Eligibility constraints a TPO attaches to a drive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriveConstraint {
    /// Minimum acceptable CGPA.
    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub min_score: f64,
    /// Maximum acceptable backlog count.
    #[serde(default, deserialize_with = "deserialize_lenient_u32")]
    pub max_backlogs: u32,
    /// Allowed branch labels. `None` or empty admits every branch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_branches: Option<Vec<String>>,
}

impl DriveConstraint {
    pub fn new(min_score: f64, max_backlogs: u32) -> Self {
        Self {
            min_score,
            max_backlogs,
            allowed_branches: None,
        }
    }

    /// Restrict the drive to the given branches.
    pub fn with_branches<I, S>(mut self, branches: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_branches = Some(branches.into_iter().map(Into::into).collect());
        self
    }

    /// Whether `branch` satisfies the branch restriction.
    pub fn admits_branch(&self, branch: Option<&str>) -> bool {
        match &self.allowed_branches {
            None => true,
            Some(allowed) if allowed.is_empty() => true,
            Some(allowed) => match branch {
                Some(b) => {
                    let b = b.trim();
                    allowed.iter().any(|a| a.trim().eq_ignore_ascii_case(b))
                }
                None => false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_from_mixed_document() {
        let candidate: CandidateRecord = serde_json::from_value(serde_json::json!({
            "id": "stu-1",
            "name": "Asha",
            "cgpa": "8.4",
            "backlogs": 1,
            "branch": "CSE"
        }))
        .unwrap();
        assert_eq!(candidate.score(), 8.4);
        assert_eq!(candidate.backlogs(), 1.0);
        assert_eq!(candidate.delivery_handle, None);
    }

    #[test]
    fn candidate_missing_numbers_default_to_zero() {
        let candidate: CandidateRecord =
            serde_json::from_value(serde_json::json!({ "id": "stu-2" })).unwrap();
        assert_eq!(candidate.cgpa, RawNumber::Missing);
        assert_eq!(candidate.score(), 0.0);
        assert_eq!(candidate.backlogs(), 0.0);
    }

    #[test]
    fn constraint_coerces_text_fields() {
        let constraint: DriveConstraint = serde_json::from_value(serde_json::json!({
            "min_score": "7.5",
            "max_backlogs": "2"
        }))
        .unwrap();
        assert_eq!(constraint, DriveConstraint::new(7.5, 2));
    }

    #[test]
    fn branch_matching_is_case_insensitive() {
        let constraint = DriveConstraint::new(0.0, 0).with_branches(["CSE", " ECE "]);
        assert!(constraint.admits_branch(Some("cse")));
        assert!(constraint.admits_branch(Some("ece ")));
        assert!(!constraint.admits_branch(Some("MECH")));
        assert!(!constraint.admits_branch(None));
    }

    #[test]
    fn empty_branch_list_admits_everyone() {
        let constraint = DriveConstraint::new(0.0, 0).with_branches(Vec::<String>::new());
        assert!(constraint.admits_branch(None));
        assert!(constraint.admits_branch(Some("CIVIL")));
    }
}

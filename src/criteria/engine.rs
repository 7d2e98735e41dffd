//! Eligibility evaluation.

use std::borrow::Borrow;

use serde::Serialize;

use crate::criteria::types::{CandidateRecord, DriveConstraint};

/// A failed eligibility conjunct.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Ineligibility {
    ScoreBelowMinimum { score: f64, min_score: f64 },
    TooManyBacklogs { backlogs: f64, max_backlogs: u32 },
    BranchNotAllowed { branch: Option<String> },
}

impl std::fmt::Display for Ineligibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ScoreBelowMinimum { score, min_score } => {
                write!(f, "CGPA {score} is below the required {min_score}")
            }
            Self::TooManyBacklogs {
                backlogs,
                max_backlogs,
            } => write!(f, "{backlogs} backlogs exceed the allowed {max_backlogs}"),
            Self::BranchNotAllowed { branch: Some(b) } => {
                write!(f, "branch {b} is not eligible for this drive")
            }
            Self::BranchNotAllowed { branch: None } => {
                write!(f, "no branch on profile, drive is branch-restricted")
            }
        }
    }
}

/// Whether `candidate` meets every constraint of the drive.
///
/// Unreadable score or backlog fields count as zero, so a malformed profile
/// can pass a drive with `min_score = 0`.
pub fn is_eligible(candidate: &CandidateRecord, constraint: &DriveConstraint) -> bool {
    candidate.score() >= constraint.min_score
        && candidate.backlogs() <= f64::from(constraint.max_backlogs)
        && constraint.admits_branch(candidate.branch.as_deref())
}

/// Lazily yield the candidates that pass, in input order.
pub fn filter_eligible<'a, I>(
    candidates: I,
    constraint: &'a DriveConstraint,
) -> impl Iterator<Item = I::Item> + 'a
where
    I: IntoIterator,
    I::IntoIter: 'a,
    I::Item: Borrow<CandidateRecord>,
{
    candidates
        .into_iter()
        .filter(move |c| is_eligible(c.borrow(), constraint))
}

/// Every constraint the candidate fails. Empty iff [`is_eligible`].
pub fn explain(candidate: &CandidateRecord, constraint: &DriveConstraint) -> Vec<Ineligibility> {
    let mut reasons = Vec::new();

    let score = candidate.score();
    if score < constraint.min_score {
        reasons.push(Ineligibility::ScoreBelowMinimum {
            score,
            min_score: constraint.min_score,
        });
    }

    let backlogs = candidate.backlogs();
    if backlogs > f64::from(constraint.max_backlogs) {
        reasons.push(Ineligibility::TooManyBacklogs {
            backlogs,
            max_backlogs: constraint.max_backlogs,
        });
    }

    if !constraint.admits_branch(candidate.branch.as_deref()) {
        reasons.push(Ineligibility::BranchNotAllowed {
            branch: candidate.branch.clone(),
        });
    }

    reasons
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::coerce::RawNumber;

    fn population() -> Vec<CandidateRecord> {
        vec![
            CandidateRecord::new("a", 8.5, 0),
            CandidateRecord::new("b", 6.0, 1),
            CandidateRecord::new("c", 7.5, 2),
        ]
    }

    #[test]
    fn matches_numeric_conjunction() {
        let scores = [0.0, 5.5, 6.99, 7.0, 7.01, 9.8, 10.0];
        let backlogs = [0u32, 1, 2, 5];
        let constraints = [
            DriveConstraint::new(0.0, 0),
            DriveConstraint::new(7.0, 1),
            DriveConstraint::new(9.9, 5),
        ];

        for k in &constraints {
            for &s in &scores {
                for &b in &backlogs {
                    let c = CandidateRecord::new("x", s, b);
                    let expected = s >= k.min_score && b <= k.max_backlogs;
                    assert_eq!(is_eligible(&c, k), expected, "score {s} backlogs {b} {k:?}");
                }
            }
        }
    }

    #[test]
    fn scenario_only_first_candidate_passes() {
        let candidates = population();
        let constraint = DriveConstraint::new(7.0, 1);
        let eligible: Vec<_> = filter_eligible(&candidates, &constraint).collect();
        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].id, "a");
    }

    #[test]
    fn filter_preserves_input_order() {
        let candidates = vec![
            CandidateRecord::new("z", 9.0, 0),
            CandidateRecord::new("m", 4.0, 0),
            CandidateRecord::new("a", 8.0, 0),
            CandidateRecord::new("q", 7.0, 0),
        ];
        let constraint = DriveConstraint::new(7.0, 0);
        let ids: Vec<&str> = filter_eligible(&candidates, &constraint)
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, vec!["z", "a", "q"]);
    }

    #[test]
    fn filter_is_repeatable() {
        let constraint = DriveConstraint::new(6.0, 1);
        let candidates = population();
        let first: Vec<_> = filter_eligible(&candidates, &constraint).collect();
        let second: Vec<_> = filter_eligible(&candidates, &constraint).collect();
        assert_eq!(first, second);

        let refiltered: Vec<_> = filter_eligible(first.iter().copied(), &constraint).collect();
        assert_eq!(first, refiltered);
    }

    #[test]
    fn filter_accepts_owned_records() {
        let constraint = DriveConstraint::new(7.0, 2);
        let owned: Vec<CandidateRecord> = filter_eligible(population(), &constraint).collect();
        assert_eq!(owned.len(), 2);
    }

    #[test]
    fn filter_is_lazy() {
        let constraint = DriveConstraint::new(0.0, 0);
        let endless = std::iter::repeat(CandidateRecord::new("r", 1.0, 0));
        let mut iter = filter_eligible(endless, &constraint);
        assert_eq!(iter.next().map(|c| c.id), Some("r".to_string()));
    }

    #[test]
    fn unparseable_score_uses_zero() {
        let mut candidate = CandidateRecord::new("u", 0.0, 0);
        candidate.cgpa = RawNumber::Text("n/a".into());

        assert!(is_eligible(&candidate, &DriveConstraint::new(0.0, 0)));
        assert!(!is_eligible(&candidate, &DriveConstraint::new(0.1, 0)));
    }

    #[test]
    fn unparseable_backlogs_pass_zero_backlog_drive() {
        let mut candidate = CandidateRecord::new("u", 9.0, 0);
        candidate.backlogs = RawNumber::Missing;
        assert!(is_eligible(&candidate, &DriveConstraint::new(8.0, 0)));
    }

    #[test]
    fn branch_restriction_is_an_extra_conjunct() {
        let constraint = DriveConstraint::new(7.0, 1).with_branches(["CSE"]);
        let cse = CandidateRecord::new("a", 8.0, 0).with_branch("CSE");
        let mech = CandidateRecord::new("b", 8.0, 0).with_branch("MECH");
        assert!(is_eligible(&cse, &constraint));
        assert!(!is_eligible(&mech, &constraint));
    }

    #[test]
    fn empty_population_is_not_an_error() {
        let constraint = DriveConstraint::new(7.0, 1);
        let none: Vec<CandidateRecord> = Vec::new();
        assert_eq!(filter_eligible(&none, &constraint).count(), 0);
    }

    #[test]
    fn explain_lists_every_failed_check() {
        let constraint = DriveConstraint::new(7.0, 1).with_branches(["ECE"]);
        let candidate = CandidateRecord::new("c", 6.0, 3).with_branch("CSE");
        let reasons = explain(&candidate, &constraint);
        assert_eq!(reasons.len(), 3);
        assert!(matches!(reasons[0], Ineligibility::ScoreBelowMinimum { .. }));
        assert!(matches!(reasons[1], Ineligibility::TooManyBacklogs { .. }));
        assert!(reasons[2].to_string().contains("CSE"));
    }

    #[test]
    fn explain_empty_iff_eligible() {
        let constraint = DriveConstraint::new(7.0, 1);
        for candidate in population() {
            assert_eq!(
                explain(&candidate, &constraint).is_empty(),
                is_eligible(&candidate, &constraint)
            );
        }
    }
}

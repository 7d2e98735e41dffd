//! Criteria engine: eligibility of candidates for recruitment drives.
//!
//! A candidate passes a drive when
//! 1. their CGPA is at least the drive's minimum score,
//! 2. their backlog count is at most the drive's maximum, and
//! 3. the drive either lists no branches or lists theirs.
//!
//! All checks are pure and synchronous; fan-out to storage lives in `notify`.

pub mod coerce;
pub mod engine;
pub mod types;

pub use coerce::{RawNumber, to_canonical_number};
pub use engine::{Ineligibility, explain, filter_eligible, is_eligible};
pub use types::{CandidateRecord, DriveConstraint};

//! Placement core — drive eligibility and notification fan-out.

pub mod config;
pub mod criteria;
pub mod drives;
pub mod error;
pub mod notify;
pub mod store;

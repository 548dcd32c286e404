/// Daily quota enforcement
///
/// This module provides:
/// - Eligibility checks that reserve a slot without persisting it
/// - Commits that record usage once a disbursement has succeeded
/// - Pruning of entries from previous days

pub mod engine;
pub mod types;

pub use engine::{QuotaEngine, Reservation};
pub use types::{Decision, DenyReason, QuotaUsage, DEFAULT_DAILY_LIMIT};

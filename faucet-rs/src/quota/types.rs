use chrono::NaiveDate;
use serde::Serialize;

use super::engine::Reservation;

/// Requests allowed per identity per day unless configured otherwise
pub const DEFAULT_DAILY_LIMIT: u32 = 2;

/// Why a request was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    QuotaExceeded,
}

/// Outcome of an eligibility check
#[derive(Debug)]
pub enum Decision<'a> {
    /// The identity may proceed. The slot is held until the reservation is
    /// committed or dropped.
    Allowed(Reservation<'a>),
    Denied(DenyReason),
}

impl Decision<'_> {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed(_))
    }
}

/// Snapshot of one identity's usage for a given day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuotaUsage {
    pub identity: String,
    pub day: NaiveDate,
    /// Committed requests
    pub used: u32,
    pub remaining: u32,
    pub limit: u32,
}

impl QuotaUsage {
    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }
}

/// Request handling
///
/// Validates the requested identity, consults the quota engine, calls the
/// disbursement service and records the outcome.

pub mod outcome;
pub mod service;

pub use outcome::FaucetOutcome;
pub use service::FaucetService;

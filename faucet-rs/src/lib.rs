//! faucet-rs: Testnet token faucet with a durable daily quota
//!
//! Sends a fixed amount of tokens to an address at most a configured number
//! of times per calendar day.
//!
//! # Features
//!
//! - Per-address daily quota, safe under concurrent requests
//! - Usage committed only after the transfer succeeds
//! - Atomic JSON snapshot persistence, survives restarts
//! - Nightly pruning of entries from previous days
//! - Pluggable disbursement backend (HTTP signing service or mock)
//!
//! # Example Configuration
//!
//! ```toml
//! [server]
//! listen_addr = "0.0.0.0:3000"
//!
//! [quota]
//! daily_limit = 2
//! ledger_path = "/var/lib/faucet-rs/requests.json"
//! timezone = "local"
//!
//! [disbursement]
//! endpoint = "http://127.0.0.1:1317"
//! amount = 100000
//! denom = "uosmo"
//! address_prefix = "osmo"
//! ```
//!
//! The service credential is usually supplied through the environment as
//! `FAUCET__DISBURSEMENT__API_TOKEN`.

pub mod api;
pub mod clock;
pub mod config;
pub mod disburse;
pub mod error;
pub mod faucet;
pub mod ledger;
pub mod quota;
pub mod scheduler;

pub use clock::Clock;
pub use config::FaucetConfig;
pub use error::{FaucetError, Result};
pub use faucet::{FaucetOutcome, FaucetService};
pub use quota::QuotaEngine;

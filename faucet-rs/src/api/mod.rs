//! HTTP API for faucet-rs
//!
//! Thin transport over [`crate::faucet::FaucetService`]

pub mod handlers;
pub mod server;

pub use handlers::AppState;
pub use server::FaucetServer;

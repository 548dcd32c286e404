//! Mock disburser for testing and local development
//!
//! Outcomes are scripted up front; once the script runs out every call
//! falls back to the default outcome.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

use super::{Coin, Disburser, TxReceipt};
use crate::error::{FaucetError, Result};

/// What a single mock call should do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOutcome {
    Success,
    /// Transaction was broadcast but returned a non-zero code
    FailureCode(u32),
    /// Call failed before a receipt was produced
    Error(String),
}

/// Mock disbursement service
pub struct MockDisburser {
    script: Mutex<VecDeque<MockOutcome>>,
    fallback: MockOutcome,
    delay: Option<Duration>,
    calls: AtomicUsize,
    destinations: Mutex<Vec<String>>,
}

impl MockDisburser {
    /// Mock that always succeeds
    pub fn new() -> Self {
        Self::always(MockOutcome::Success)
    }

    /// Mock that always produces `outcome`
    pub fn always(outcome: MockOutcome) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: outcome,
            delay: None,
            calls: AtomicUsize::new(0),
            destinations: Mutex::new(Vec::new()),
        }
    }

    /// Play `outcomes` in order, then succeed
    pub fn scripted(outcomes: impl IntoIterator<Item = MockOutcome>) -> Self {
        let mock = Self::new();
        if let Ok(mut script) = mock.script.lock() {
            script.extend(outcomes);
        }
        mock
    }

    /// Sleep for `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of disburse calls received
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Destinations of every call, in order
    pub fn destinations(&self) -> Vec<String> {
        self.destinations
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }

    fn next_outcome(&self) -> MockOutcome {
        self.script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front())
            .unwrap_or_else(|| self.fallback.clone())
    }
}

impl Default for MockDisburser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Disburser for MockDisburser {
    async fn disburse(&self, destination: &str, amount: &Coin) -> Result<TxReceipt> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Ok(mut destinations) = self.destinations.lock() {
            destinations.push(destination.to_string());
        }

        debug!("MockDisburser: call {} sending {} to {}", call, amount, destination);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let tx_hash = format!("MOCK{:016X}", call);
        match self.next_outcome() {
            MockOutcome::Success => Ok(TxReceipt {
                tx_hash,
                code: 0,
                raw_log: None,
            }),
            MockOutcome::FailureCode(code) => Ok(TxReceipt {
                tx_hash,
                code,
                raw_log: Some(format!("mock failure code {}", code)),
            }),
            MockOutcome::Error(message) => Err(FaucetError::Disbursement(message)),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

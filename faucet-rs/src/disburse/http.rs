//! Disbursement over a remote signing service's HTTP API

use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::{Coin, Disburser, TxReceipt};
use crate::config::DisbursementConfig;
use crate::error::{FaucetError, Result};

/// Client for a signing service exposing `POST /v1/disburse`
pub struct HttpDisburser {
    endpoint: String,
    api_token: String,
    fee: Coin,
    gas_limit: u64,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct DisburseRequest<'a> {
    destination: &'a str,
    amount: &'a Coin,
    fee: Fee<'a>,
}

#[derive(Debug, Serialize)]
struct Fee<'a> {
    amount: Vec<&'a Coin>,
    gas: u64,
}

impl HttpDisburser {
    pub fn new(
        endpoint: impl Into<String>,
        api_token: impl Into<String>,
        fee: Coin,
        gas_limit: u64,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FaucetError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_token: api_token.into(),
            fee,
            gas_limit,
            client,
        })
    }

    pub fn from_config(config: &DisbursementConfig) -> Result<Self> {
        let api_token = config.api_token.clone().ok_or_else(|| {
            FaucetError::Config("disbursement.api_token is required".to_string())
        })?;

        Self::new(
            config.endpoint.clone(),
            api_token,
            config.fee(),
            config.gas_limit,
            config.timeout(),
        )
    }

    fn url(&self) -> String {
        format!("{}/v1/disburse", self.endpoint)
    }
}

#[async_trait::async_trait]
impl Disburser for HttpDisburser {
    async fn disburse(&self, destination: &str, amount: &Coin) -> Result<TxReceipt> {
        let request = DisburseRequest {
            destination,
            amount,
            fee: Fee {
                amount: vec![&self.fee],
                gas: self.gas_limit,
            },
        };

        debug!("Requesting {} for {} from {}", amount, destination, self.url());

        let response = self
            .client
            .post(self.url())
            .bearer_auth(&self.api_token)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            warn!("Disbursement request failed with status {}: {}", status, error_text);
            return Err(FaucetError::Disbursement(format!(
                "service responded {}: {}",
                status, error_text
            )));
        }

        Ok(response.json::<TxReceipt>().await?)
    }

    fn name(&self) -> &str {
        "http"
    }
}

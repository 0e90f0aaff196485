//! HTTP client for a risk gate running in another process.
//!
//! The client fails closed: a timeout, a refused connection, a non-success
//! status or an unreadable body all become a rejected
//! [`OrderValidationResult`]. An order is never approved because the gate
//! could not be asked.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;

use sentinel_core::config::GateConfig;
use sentinel_core::types::OrderRequest;

use crate::gate::{OrderGate, OrderValidationResult};
use crate::kill_switch::RiskStateSnapshot;
use crate::pipeline::RiskReject;

/// Remote risk gate reached over HTTP.
///
/// Reuses a single `reqwest::Client` for connection pooling; the timeout
/// applies to the whole request, connect included.
pub struct RemoteRiskGate {
    base_url: String,
    client: Client,
}

impl RemoteRiskGate {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build risk gate HTTP client")?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(config: &GateConfig) -> Result<Self> {
        Self::new(&config.url, Duration::from_millis(config.timeout_ms))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Validate `order` on the remote gate. Never returns an approval
    /// unless the remote gate sent one.
    pub async fn validate(&self, order: &OrderRequest) -> OrderValidationResult {
        match self.try_validate(order).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(
                    url = %self.base_url,
                    symbol = %order.symbol,
                    error = %format!("{e:#}"),
                    "risk gate unreachable, rejecting order"
                );
                RiskReject::UnreachableGate {
                    detail: format!("{e:#}"),
                }
                .into()
            }
        }
    }

    async fn try_validate(&self, order: &OrderRequest) -> Result<OrderValidationResult> {
        let url = format!("{}/validate", self.base_url);
        let result = self
            .client
            .post(&url)
            .json(order)
            .send()
            .await
            .context("failed to send validation request")?
            .error_for_status()
            .context("risk gate returned an error status")?
            .json::<OrderValidationResult>()
            .await
            .context("failed to deserialize validation result")?;
        Ok(result)
    }

    /// Fetch the remote gate's risk state.
    pub async fn status(&self) -> Result<RiskStateSnapshot> {
        let url = format!("{}/status", self.base_url);
        let snapshot = self
            .client
            .get(&url)
            .send()
            .await
            .context("failed to send status request")?
            .error_for_status()?
            .json()
            .await
            .context("failed to deserialize risk state")?;
        Ok(snapshot)
    }
}

#[async_trait]
impl OrderGate for RemoteRiskGate {
    async fn validate_order(&self, order: &OrderRequest) -> OrderValidationResult {
        self.validate(order).await
    }
}

//! Payment gateway clients.
//!
//! `HttpPaymentGateway` talks to the platform's payment gateway over HTTP;
//! `DisabledGateway` stands in when no gateway is configured so that every
//! purchase fails loudly instead of silently granting credits.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use nocta_ledger::{GatewayError, PaymentGateway, PaymentRequest};

/// HTTP client for the payment gateway.
#[derive(Debug, Clone)]
pub struct HttpPaymentGateway {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct InitiatePaymentResponse {
    payment_ref: String,
}

#[derive(Debug, Deserialize)]
struct GatewayErrorResponse {
    message: String,
}

impl HttpPaymentGateway {
    /// Create a new gateway client.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    async fn rejection_message(response: reqwest::Response) -> String {
        let status = response.status();
        match response.json::<GatewayErrorResponse>().await {
            Ok(body) => body.message,
            Err(_) => format!("gateway returned {status}"),
        }
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn validate_amount(&self, amount_cents: u64) -> Result<(), GatewayError> {
        let response = self
            .client
            .post(format!("{}/v1/payments/validate", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "amount_cents": amount_cents }))
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else if response.status().is_client_error() {
            Err(GatewayError::Rejected(
                Self::rejection_message(response).await,
            ))
        } else {
            Err(GatewayError::Transport(format!(
                "gateway returned {}",
                response.status()
            )))
        }
    }

    async fn initiate_payment(&self, request: &PaymentRequest) -> Result<String, GatewayError> {
        let response = self
            .client
            .post(format!("{}/v1/payments", self.base_url))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if response.status().is_success() {
            let body: InitiatePaymentResponse = response
                .json()
                .await
                .map_err(|e| GatewayError::Transport(e.to_string()))?;
            Ok(body.payment_ref)
        } else if response.status().is_client_error() {
            Err(GatewayError::Rejected(
                Self::rejection_message(response).await,
            ))
        } else {
            Err(GatewayError::Transport(format!(
                "gateway returned {}",
                response.status()
            )))
        }
    }
}

/// Gateway stand-in for deployments without payment integration.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledGateway;

#[async_trait]
impl PaymentGateway for DisabledGateway {
    async fn validate_amount(&self, _amount_cents: u64) -> Result<(), GatewayError> {
        Err(GatewayError::NotConfigured)
    }

    async fn initiate_payment(&self, _request: &PaymentRequest) -> Result<String, GatewayError> {
        Err(GatewayError::NotConfigured)
    }
}

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors from the payment processor boundary
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("payment processor request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("payment processor rejected the request: {0}")]
    Rejected(String),
}

/// Processor-side object representing an in-progress payment
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// Outbound boundary to the payment processor
///
/// The HTTP implementation talks to the real processor; tests substitute a
/// stub so no checkout call ever leaves the process.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Opens a checkout session for one tour purchase
    async fn create_checkout_session(
        &self,
        reference: Uuid,
        tour_name: &str,
        amount: Decimal,
        customer_email: &str,
        success_url: &str,
    ) -> Result<CheckoutSession, PaymentError>;
}

/// Payment gateway backed by the processor's REST API
pub struct HttpPaymentGateway {
    client: Client,
    base_url: String,
    secret_key: String,
}

impl HttpPaymentGateway {
    pub fn new(base_url: String, secret_key: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            secret_key,
        }
    }
}

#[derive(Debug, Serialize)]
struct SessionRequest<'a> {
    client_reference_id: Uuid,
    name: &'a str,
    amount: Decimal,
    currency: &'a str,
    customer_email: &'a str,
    success_url: &'a str,
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_checkout_session(
        &self,
        reference: Uuid,
        tour_name: &str,
        amount: Decimal,
        customer_email: &str,
        success_url: &str,
    ) -> Result<CheckoutSession, PaymentError> {
        let request = SessionRequest {
            client_reference_id: reference,
            name: tour_name,
            amount,
            currency: "usd",
            customer_email,
            success_url,
        };

        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.base_url))
            .bearer_auth(&self.secret_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PaymentError::Rejected(format!("{}: {}", status, body)));
        }

        Ok(response.json::<CheckoutSession>().await?)
    }
}

use crate::domain::ports::{PaymentGateway, PaymentIntent};
use crate::utils::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

/// Stripe-compatible payment intent client (`POST /v1/payment_intents`, form encoded).
pub struct StripeGateway {
    client: Client,
    api_base: String,
    secret_key: String,
}

#[derive(Debug, Deserialize)]
struct IntentResponse {
    id: String,
    client_secret: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl StripeGateway {
    pub fn new(api_base: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            secret_key: secret_key.into(),
        }
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_payment_intent(&self, amount: i64, currency: &str) -> Result<PaymentIntent> {
        let endpoint = format!("{}/v1/payment_intents", self.api_base);
        tracing::debug!("Creating payment intent: {} {} via {}", amount, currency, endpoint);

        let form = [
            ("amount", amount.to_string()),
            ("currency", currency.to_string()),
            ("payment_method_types[]", "card".to_string()),
        ];

        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            tracing::warn!("💳 Payment provider returned {}: {}", status, message);
            return Err(AppError::PaymentError {
                status: status.as_u16(),
                message,
            });
        }

        let intent: IntentResponse = response.json().await?;
        tracing::info!("💳 Payment intent {} created", intent.id);
        Ok(PaymentIntent {
            id: intent.id,
            client_secret: intent.client_secret,
        })
    }
}

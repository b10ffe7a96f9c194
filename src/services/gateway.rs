//! Payment provider integration.
//!
//! Services depend on the [`PaymentGateway`] trait so tests can swap in a
//! stub. [`StripeGateway`] is the production implementation and talks to
//! the provider's form-encoded REST API.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{error, instrument};

use crate::errors::ServiceError;

/// A payment intent as seen by the application.
#[derive(Debug, Clone)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: Option<String>,
    /// Amount in the currency's minor unit (paise for INR).
    pub amount_minor: i64,
    pub currency: String,
    pub status: String,
}

/// Request to open a hosted checkout session for a recurring plan.
#[derive(Debug, Clone)]
pub struct CheckoutSessionRequest {
    pub price_id: String,
    pub customer_email: Option<String>,
    pub success_url: String,
    pub cancel_url: String,
    pub reference_id: String,
}

/// A hosted checkout session at the provider.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a payment intent for a one-time charge.
    async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        metadata: &[(&str, &str)],
    ) -> Result<PaymentIntent, ServiceError>;

    /// Fetches the current state of a payment intent.
    async fn retrieve_payment_intent(&self, id: &str) -> Result<PaymentIntent, ServiceError>;

    /// Opens a hosted checkout session for a subscription.
    async fn create_checkout_session(
        &self,
        req: CheckoutSessionRequest,
    ) -> Result<CheckoutSession, ServiceError>;
}

/// Stripe-backed gateway.
pub struct StripeGateway {
    client: reqwest::Client,
    base_url: String,
    secret_key: String,
}

impl StripeGateway {
    pub fn new(base_url: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            secret_key: secret_key.into(),
        }
    }

    async fn post_form<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        form: &[(String, String)],
    ) -> Result<T, ServiceError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.secret_key, None::<&str>)
            .form(form)
            .send()
            .await
            .map_err(|e| {
                error!("Payment provider request failed: {}", e);
                ServiceError::ExternalServiceError("Payment provider unreachable".to_string())
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            ServiceError::ExternalServiceError(format!("Failed to read provider response: {}", e))
        })?;

        if !status.is_success() {
            error!(%status, "Payment provider returned an error: {}", body);
            return Err(ServiceError::PaymentFailed(format!(
                "Payment provider rejected the request ({})",
                status
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            ServiceError::ExternalServiceError(format!("Malformed provider response: {}", e))
        })
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ServiceError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.secret_key, None::<&str>)
            .send()
            .await
            .map_err(|e| {
                error!("Payment provider request failed: {}", e);
                ServiceError::ExternalServiceError("Payment provider unreachable".to_string())
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            ServiceError::ExternalServiceError(format!("Failed to read provider response: {}", e))
        })?;

        if !status.is_success() {
            return Err(ServiceError::ExternalServiceError(format!(
                "Payment provider returned {}",
                status
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            ServiceError::ExternalServiceError(format!("Malformed provider response: {}", e))
        })
    }
}

#[derive(Debug, Deserialize)]
struct StripePaymentIntent {
    id: String,
    client_secret: Option<String>,
    amount: i64,
    currency: String,
    status: String,
}

impl From<StripePaymentIntent> for PaymentIntent {
    fn from(pi: StripePaymentIntent) -> Self {
        PaymentIntent {
            id: pi.id,
            client_secret: pi.client_secret,
            amount_minor: pi.amount,
            currency: pi.currency,
            status: pi.status,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StripeCheckoutSession {
    id: String,
    url: Option<String>,
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    #[instrument(skip(self))]
    async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        metadata: &[(&str, &str)],
    ) -> Result<PaymentIntent, ServiceError> {
        let mut form = vec![
            ("amount".to_string(), amount_minor.to_string()),
            ("currency".to_string(), currency.to_lowercase()),
            (
                "automatic_payment_methods[enabled]".to_string(),
                "true".to_string(),
            ),
        ];
        for (key, value) in metadata {
            form.push((format!("metadata[{}]", key), value.to_string()));
        }

        let pi: StripePaymentIntent = self.post_form("/v1/payment_intents", &form).await?;
        Ok(pi.into())
    }

    #[instrument(skip(self))]
    async fn retrieve_payment_intent(&self, id: &str) -> Result<PaymentIntent, ServiceError> {
        let pi: StripePaymentIntent = self.get(&format!("/v1/payment_intents/{}", id)).await?;
        Ok(pi.into())
    }

    #[instrument(skip(self))]
    async fn create_checkout_session(
        &self,
        req: CheckoutSessionRequest,
    ) -> Result<CheckoutSession, ServiceError> {
        let mut form = vec![
            ("mode".to_string(), "subscription".to_string()),
            ("line_items[0][price]".to_string(), req.price_id),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            ("success_url".to_string(), req.success_url),
            ("cancel_url".to_string(), req.cancel_url),
            (
                "client_reference_id".to_string(),
                req.reference_id.clone(),
            ),
        ];
        if let Some(email) = req.customer_email {
            form.push(("customer_email".to_string(), email));
        }

        let session: StripeCheckoutSession = self.post_form("/v1/checkout/sessions", &form).await?;
        Ok(CheckoutSession {
            id: session.id,
            url: session.url,
        })
    }
}

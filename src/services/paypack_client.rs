//! Cliente HTTP de Paypack
//!
//! Autoriza al agente, cachea el access token y expone el cash-in y la
//! consulta de eventos de transacción.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::{
    config::environment::PaymentConfig,
    models::travel::PaymentStatus,
    services::payment_gateway::{
        CashInReceipt, EventFilter, PaymentEnvironment, PaymentGateway, TransactionEvent,
    },
    utils::errors::{AppError, AppResult},
};

/// Token de acceso del agente con su expiración
#[derive(Clone, Debug)]
struct AccessToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    fn new(token: String, expires_in_secs: i64) -> Self {
        // margen para no usar un token a punto de caducar
        let lifetime = (expires_in_secs - 30).max(0);
        Self {
            token,
            expires_at: Utc::now() + chrono::Duration::seconds(lifetime),
        }
    }

    fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct AuthorizeResponse {
    access: String,
    #[serde(default = "default_expires")]
    expires: i64,
}

fn default_expires() -> i64 {
    15 * 60
}

#[derive(Debug, Deserialize)]
struct CashInResponse {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    amount: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct EventsResponse {
    #[serde(default)]
    transactions: Vec<EventEnvelope>,
}

#[derive(Debug, Deserialize)]
struct EventEnvelope {
    data: EventData,
}

#[derive(Debug, Deserialize)]
struct EventData {
    #[serde(rename = "ref")]
    reference: String,
    status: String,
    #[serde(default)]
    amount: f64,
    #[serde(default)]
    client: Option<String>,
    #[serde(default)]
    provider: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl From<EventData> for TransactionEvent {
    fn from(data: EventData) -> Self {
        Self {
            status: PaymentStatus::from_str(&data.status).unwrap_or(PaymentStatus::Pending),
            reference: data.reference,
            amount: data.amount.round() as i64,
            client: data.client,
            provider: data.provider,
            created_at: data.created_at,
        }
    }
}

#[derive(Clone)]
pub struct PaypackClient {
    config: PaymentConfig,
    client: Client,
    token: Arc<RwLock<Option<AccessToken>>>,
}

impl PaypackClient {
    pub fn new(config: PaymentConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .map_err(|e| AppError::ExternalApi(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            client,
            token: Arc::new(RwLock::new(None)),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Token vigente, autorizando de nuevo si no hay o caducó
    async fn access_token(&self) -> AppResult<String> {
        if let Some(token) = self.token.read().await.as_ref() {
            if !token.is_expired() {
                return Ok(token.token.clone());
            }
        }

        info!("🔐 Authorizing payment agent");
        let response = self
            .client
            .post(self.url("/auth/agents/authorize"))
            .json(&json!({
                "client_id": self.config.client_id,
                "client_secret": self.config.client_secret,
            }))
            .send()
            .await
            .map_err(|e| AppError::ExternalApi(format!("Paypack authorize failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("❌ Paypack authorize returned {}: {}", status, body);
            return Err(AppError::ExternalApi(format!(
                "Paypack authorize returned {}",
                status
            )));
        }

        let authorized: AuthorizeResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalApi(format!("Invalid authorize response: {}", e)))?;

        let token = AccessToken::new(authorized.access, authorized.expires);
        let value = token.token.clone();
        *self.token.write().await = Some(token);
        Ok(value)
    }
}

#[async_trait]
impl PaymentGateway for PaypackClient {
    async fn cash_in(
        &self,
        phone_number: &str,
        amount: i64,
        environment: PaymentEnvironment,
    ) -> AppResult<CashInReceipt> {
        let token = self.access_token().await?;
        info!("💸 Requesting cash-in of {} RWF", amount);

        let response = self
            .client
            .post(self.url("/transactions/cashin"))
            .bearer_auth(token)
            .header("X-Webhook-Mode", environment.as_str())
            .json(&json!({ "amount": amount, "number": phone_number }))
            .send()
            .await
            .map_err(|e| AppError::ExternalApi(format!("Paypack cash-in failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("❌ Paypack cash-in returned {}: {}", status, body);
            return Err(AppError::ExternalApi(format!(
                "Paypack cash-in returned {}",
                status
            )));
        }

        let body: CashInResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalApi(format!("Invalid cash-in response: {}", e)))?;

        Ok(CashInReceipt {
            reference: body.reference,
            status: body
                .status
                .as_deref()
                .and_then(PaymentStatus::from_str)
                .unwrap_or(PaymentStatus::Pending),
            amount: body.amount.map(|a| a.round() as i64).unwrap_or(amount),
        })
    }

    async fn query_events(&self, filter: &EventFilter) -> AppResult<Vec<TransactionEvent>> {
        let token = self.access_token().await?;
        debug!("🔍 Querying events for {}", filter.transaction_ref);

        let response = self
            .client
            .get(self.url("/events/transactions"))
            .bearer_auth(token)
            .query(&[("ref", filter.transaction_ref.as_str())])
            .send()
            .await
            .map_err(|e| AppError::ExternalApi(format!("Paypack events failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::ExternalApi(format!(
                "Paypack events returned {}",
                status
            )));
        }

        let body: EventsResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalApi(format!("Invalid events response: {}", e)))?;

        Ok(body
            .transactions
            .into_iter()
            .map(|envelope| envelope.data.into())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_payload_maps_to_transaction_events() {
        let body: EventsResponse = serde_json::from_value(json!({
            "transactions": [{
                "event_id": "e1",
                "event_kind": "transaction:processed",
                "data": {
                    "ref": "d0c1",
                    "status": "successful",
                    "amount": 5000,
                    "client": "0780000000",
                    "provider": "mtn",
                    "created_at": "2025-01-15T06:00:00Z"
                }
            }]
        }))
        .unwrap();

        let events: Vec<TransactionEvent> =
            body.transactions.into_iter().map(|e| e.data.into()).collect();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].reference, "d0c1");
        assert!(events[0].is_successful());
        assert_eq!(events[0].amount, 5000);
    }

    #[test]
    fn test_fresh_access_token_is_valid() {
        assert!(!AccessToken::new("t".into(), 900).is_expired());
    }

    #[test]
    fn test_url_join() {
        let mut config = crate::config::EnvironmentConfig::default().payment;
        config.base_url = "https://payments.example/api/".to_string();
        let client = PaypackClient::new(config).unwrap();
        assert_eq!(
            client.url("/transactions/cashin"),
            "https://payments.example/api/transactions/cashin"
        );
    }
}

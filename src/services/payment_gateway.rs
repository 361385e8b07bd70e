//! Contrato del gateway de pagos móviles
//!
//! El gateway es lento y poco fiable: `cash_in` sólo inicia el cobro y la
//! confirmación siempre llega por `query_events`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    models::travel::{PaymentData, PaymentDetails, PaymentStatus},
    utils::errors::AppResult,
};

/// Modo con el que se marca el cobro (cabecera `X-Webhook-Mode`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentEnvironment {
    Development,
    Production,
}

impl PaymentEnvironment {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentEnvironment::Development => "development",
            PaymentEnvironment::Production => "production",
        }
    }
}

/// Respuesta a un cash-in aceptado
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashInReceipt {
    #[serde(rename = "ref")]
    pub reference: String,
    pub status: PaymentStatus,
    pub amount: i64,
}

#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub transaction_ref: String,
}

/// Evento de transacción reportado por el gateway
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionEvent {
    pub reference: String,
    pub status: PaymentStatus,
    pub amount: i64,
    pub client: Option<String>,
    pub provider: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl TransactionEvent {
    pub fn is_successful(&self) -> bool {
        self.status == PaymentStatus::Successful
    }

    /// Campos autoritativos del gateway, listos para guardarse en el viaje
    pub fn to_payment_details(&self) -> PaymentDetails {
        PaymentDetails {
            status: self.status,
            data: PaymentData {
                reference: self.reference.clone(),
                amount: self.amount,
                client: self.client.clone(),
                provider: self.provider.clone(),
                created_at: self.created_at,
            },
        }
    }
}

/// Primer evento exitoso para la referencia dada
pub fn find_successful<'a>(
    events: &'a [TransactionEvent],
    reference: &str,
) -> Option<&'a TransactionEvent> {
    events
        .iter()
        .find(|event| event.reference == reference && event.is_successful())
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn cash_in(
        &self,
        phone_number: &str,
        amount: i64,
        environment: PaymentEnvironment,
    ) -> AppResult<CashInReceipt>;

    async fn query_events(&self, filter: &EventFilter) -> AppResult<Vec<TransactionEvent>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(reference: &str, status: PaymentStatus) -> TransactionEvent {
        TransactionEvent {
            reference: reference.to_string(),
            status,
            amount: 5000,
            client: Some("250780000000".to_string()),
            provider: Some("mtn".to_string()),
            created_at: None,
        }
    }

    #[test]
    fn test_find_successful_requires_matching_reference() {
        let events = vec![
            event("abc", PaymentStatus::Pending),
            event("other", PaymentStatus::Successful),
            event("abc", PaymentStatus::Successful),
        ];
        let found = find_successful(&events, "abc").unwrap();
        assert_eq!(found.reference, "abc");
        assert!(found.is_successful());

        assert!(find_successful(&events[..2], "abc").is_none());
    }

    #[test]
    fn test_to_payment_details_copies_gateway_fields() {
        let details = event("abc", PaymentStatus::Successful).to_payment_details();
        assert_eq!(details.status, PaymentStatus::Successful);
        assert_eq!(details.data.reference, "abc");
        assert_eq!(details.data.provider.as_deref(), Some("mtn"));
    }
}

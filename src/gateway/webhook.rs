use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::gateway::ReconciliationGateway;
use crate::observability::EngineMetrics;
use crate::services::BookingLifecycleService;

/// Webhook event names consumed by the engine.
pub mod events {
    pub const PAYMENT_CAPTURED: &str = "payment.captured";
    pub const PAYMENT_FAILED: &str = "payment.failed";
    pub const REFUND_CREATED: &str = "refund.created";
}

/// Envelope wrapping a webhook delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEnvelope {
    pub event: String,
    #[serde(default)]
    pub payload: WebhookPayload,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment: Option<EntityWrapper<PaymentEntity>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refund: Option<EntityWrapper<RefundEntity>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityWrapper<T> {
    pub entity: T,
}

/// Payment entity as delivered by the gateway. Amounts arrive in minor
/// units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentEntity {
    pub id: String,
    pub order_id: String,
    pub amount: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundEntity {
    pub id: String,
    pub payment_id: String,
    pub amount: i64,
}

/// Converts a gateway minor-unit amount into the engine's decimal amount.
pub fn amount_from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, 2)
}

/// Outcome of a webhook delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookOutcome {
    pub received: bool,
    /// False for duplicates and events the engine does not consume.
    pub applied: bool,
}

/// Verifies and dispatches webhook deliveries.
///
/// Authenticity is checked over the raw request body before parsing, so a
/// rejected delivery cannot even reach the deserializer, let alone a ledger.
pub struct WebhookHandler {
    gateway: Arc<dyn ReconciliationGateway>,
    service: Arc<BookingLifecycleService>,
    metrics: Arc<EngineMetrics>,
}

impl WebhookHandler {
    pub fn new(gateway: Arc<dyn ReconciliationGateway>, service: Arc<BookingLifecycleService>) -> Self {
        let metrics = service.metrics();
        Self {
            gateway,
            service,
            metrics,
        }
    }

    pub async fn handle(&self, raw_payload: &[u8], signature: &str) -> Result<WebhookOutcome> {
        self.metrics.record_webhook_received();

        if !self.gateway.verify_webhook(raw_payload, signature) {
            self.metrics.record_webhook_rejected();
            return Err(AppError::Unauthorized(
                "invalid webhook signature".to_string(),
            ));
        }

        let envelope: WebhookEnvelope = serde_json::from_slice(raw_payload)
            .map_err(|e| AppError::Validation(format!("malformed webhook payload: {e}")))?;

        match envelope.event.as_str() {
            events::PAYMENT_CAPTURED => {
                let payment = require_payment(&envelope)?;
                let outcome = self
                    .service
                    .handle_capture_event(
                        &payment.order_id,
                        &payment.id,
                        payment.method.clone(),
                    )
                    .await?;
                Ok(WebhookOutcome {
                    received: true,
                    applied: outcome.newly_captured,
                })
            }
            events::PAYMENT_FAILED => {
                let payment = require_payment(&envelope)?;
                let outcome = self.service.handle_failure_event(&payment.order_id).await?;
                Ok(WebhookOutcome {
                    received: true,
                    applied: outcome.newly_failed,
                })
            }
            events::REFUND_CREATED => {
                let refund = envelope
                    .payload
                    .refund
                    .as_ref()
                    .map(|w| &w.entity)
                    .ok_or_else(|| {
                        AppError::Validation("webhook is missing the refund entity".to_string())
                    })?;
                let outcome = self
                    .service
                    .handle_refund_event(
                        &refund.payment_id,
                        &refund.id,
                        amount_from_minor_units(refund.amount),
                    )
                    .await?;
                Ok(WebhookOutcome {
                    received: true,
                    applied: outcome.newly_refunded,
                })
            }
            other => {
                debug!(event = other, "ignoring webhook event");
                Ok(WebhookOutcome {
                    received: true,
                    applied: false,
                })
            }
        }
    }
}

fn require_payment(envelope: &WebhookEnvelope) -> Result<&PaymentEntity> {
    envelope
        .payload
        .payment
        .as_ref()
        .map(|w| &w.entity)
        .ok_or_else(|| AppError::Validation("webhook is missing the payment entity".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_amount_from_minor_units() {
        assert_eq!(amount_from_minor_units(750_000), dec!(7500));
        assert_eq!(amount_from_minor_units(9_999), dec!(99.99));
        assert_eq!(amount_from_minor_units(0), Decimal::ZERO);
    }

    #[test]
    fn test_envelope_parses_capture_payload() {
        let raw = br#"{
            "event": "payment.captured",
            "payload": {
                "payment": {
                    "entity": {
                        "id": "pay_1",
                        "order_id": "order_1",
                        "amount": 750000,
                        "method": "card"
                    }
                }
            }
        }"#;
        let envelope: WebhookEnvelope = serde_json::from_slice(raw).unwrap();
        assert_eq!(envelope.event, events::PAYMENT_CAPTURED);
        let payment = &envelope.payload.payment.unwrap().entity;
        assert_eq!(payment.order_id, "order_1");
        assert_eq!(payment.method.as_deref(), Some("card"));
    }

    #[test]
    fn test_envelope_tolerates_unknown_event() {
        let raw = br#"{"event": "order.paid", "payload": {}}"#;
        let envelope: WebhookEnvelope = serde_json::from_slice(raw).unwrap();
        assert!(envelope.payload.payment.is_none());
        assert!(envelope.payload.refund.is_none());
    }
}

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::config::GatewaySettings;
use crate::error::{AppError, Result};
use crate::gateway::signature;

/// A remote payment intent opened against the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub order_id: String,
}

/// A refund issued by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayRefund {
    pub refund_id: String,
}

/// Narrow contract over the external payment provider.
///
/// The engine only ever consumes these five capabilities; everything else the
/// provider offers stays outside. Verification failures are reported as
/// `false`, never by mutating anything.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReconciliationGateway: Send + Sync {
    /// Opens a remote payment intent for the given amount.
    async fn create_order(
        &self,
        amount: Decimal,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder>;

    /// Checks that a client-submitted success assertion is authentic.
    fn verify_client_proof(&self, order_id: &str, payment_id: &str, signature: &str) -> bool;

    /// Checks a webhook delivery against the raw request body.
    fn verify_webhook(&self, payload: &[u8], signature: &str) -> bool;

    /// Initiates a refund of a captured payment.
    async fn refund(&self, gateway_payment_id: &str, amount: Decimal) -> Result<GatewayRefund>;
}

/// Converts a decimal amount to the gateway's minor units (paise-style).
pub fn to_minor_units(amount: Decimal) -> Result<i64> {
    (amount * Decimal::from(100))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(|| AppError::Validation(format!("amount {} out of range", amount)))
}

#[derive(Debug, Serialize)]
struct CreateOrderBody<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

#[derive(Debug, Serialize)]
struct RefundBody {
    amount: i64,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RefundResponse {
    id: String,
}

/// REST implementation of the gateway contract.
///
/// Speaks a Razorpay-style API: basic auth with the key pair, amounts in
/// minor units, orders at `/orders`, refunds at `/payments/{id}/refund`.
/// Transport and configuration failures surface as `GatewayUnavailable`,
/// which callers must keep distinct from `Unauthorized`.
#[derive(Debug)]
pub struct HttpGateway {
    http: reqwest::Client,
    settings: GatewaySettings,
}

impl HttpGateway {
    pub fn new(settings: GatewaySettings) -> Result<Self> {
        if settings.key_id.is_empty() || settings.key_secret.is_empty() {
            return Err(AppError::GatewayUnavailable(
                "gateway credentials are not configured".to_string(),
            ));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            settings,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.settings.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl ReconciliationGateway for HttpGateway {
    async fn create_order(
        &self,
        amount: Decimal,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder> {
        let body = CreateOrderBody {
            amount: to_minor_units(amount)?,
            currency,
            receipt,
        };

        let response = self
            .http
            .post(self.url("orders"))
            .basic_auth(&self.settings.key_id, Some(&self.settings.key_secret))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::GatewayUnavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| AppError::GatewayUnavailable(e.to_string()))?;

        let order: OrderResponse = response
            .json()
            .await
            .map_err(|e| AppError::GatewayUnavailable(e.to_string()))?;

        Ok(GatewayOrder { order_id: order.id })
    }

    fn verify_client_proof(&self, order_id: &str, payment_id: &str, sig: &str) -> bool {
        signature::verify_client_proof(&self.settings.key_secret, order_id, payment_id, sig)
    }

    fn verify_webhook(&self, payload: &[u8], sig: &str) -> bool {
        signature::verify_webhook_signature(&self.settings.webhook_secret, payload, sig)
    }

    async fn refund(&self, gateway_payment_id: &str, amount: Decimal) -> Result<GatewayRefund> {
        let body = RefundBody {
            amount: to_minor_units(amount)?,
        };

        let response = self
            .http
            .post(self.url(&format!("payments/{gateway_payment_id}/refund")))
            .basic_auth(&self.settings.key_id, Some(&self.settings.key_secret))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::GatewayUnavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| AppError::GatewayUnavailable(e.to_string()))?;

        let refund: RefundResponse = response
            .json()
            .await
            .map_err(|e| AppError::GatewayUnavailable(e.to_string()))?;

        Ok(GatewayRefund { refund_id: refund.id })
    }
}

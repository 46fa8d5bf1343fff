use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::gateway::ReconciliationGateway;
use crate::models::{Booking, PaymentRecord, PaymentStatus};
use crate::observability::{mask_gateway_id, EngineMetrics};
use crate::repositories::PaymentRepository;

/// Result of applying a capture signal.
#[derive(Debug, Clone)]
pub struct CaptureResult {
    pub payment: PaymentRecord,
    /// False when the signal was a duplicate and nothing changed.
    pub newly_captured: bool,
}

/// Result of applying a failure signal.
#[derive(Debug, Clone)]
pub struct FailureResult {
    pub payment: PaymentRecord,
    pub newly_failed: bool,
}

/// Result of applying a refund.
#[derive(Debug, Clone)]
pub struct RefundResult {
    pub payment: PaymentRecord,
    pub newly_refunded: bool,
}

/// Owns payment records keyed by gateway order identifier.
///
/// Every state change here is driven by a verified gateway signal. The
/// webhook channel and the synchronous client-verification path race to
/// deliver the same capture; whichever arrives first wins and the second is
/// a confirmed no-op. That idempotency contract is the sole correctness
/// mechanism for the race, so it lives here and nowhere else.
pub struct PaymentLedger {
    payments: Arc<dyn PaymentRepository>,
    gateway: Arc<dyn ReconciliationGateway>,
    currency: String,
    metrics: Arc<EngineMetrics>,
}

impl PaymentLedger {
    pub fn new(
        payments: Arc<dyn PaymentRepository>,
        gateway: Arc<dyn ReconciliationGateway>,
        currency: String,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            payments,
            gateway,
            currency,
            metrics,
        }
    }

    /// Opens a gateway order for a booking and records a `Created` payment.
    /// Fails with `PaymentAlreadyOpen` while another payment for the booking
    /// sits in created/authorized/captured.
    pub async fn open_order(&self, booking: &Booking, payer_id: Uuid) -> Result<PaymentRecord> {
        if self
            .payments
            .find_blocking_by_booking(booking.id)
            .await?
            .is_some()
        {
            return Err(AppError::PaymentAlreadyOpen(booking.id));
        }

        let order = self
            .gateway
            .create_order(booking.total_amount, &self.currency, &booking.code)
            .await?;

        let payment = PaymentRecord::new(
            booking.id,
            payer_id,
            order.order_id,
            booking.total_amount,
            self.currency.clone(),
        );
        let payment = self.payments.create(payment).await?;

        info!(
            booking = %booking.code,
            order_id = %mask_gateway_id(&payment.order_id),
            amount = %payment.amount,
            "payment order opened"
        );
        Ok(payment)
    }

    /// Verifies a client-submitted capture proof, then applies the capture.
    /// An invalid proof is `Unauthorized` and mutates nothing.
    pub async fn verify_and_capture(
        &self,
        order_id: &str,
        gateway_payment_id: &str,
        signature: &str,
    ) -> Result<CaptureResult> {
        if !self
            .gateway
            .verify_client_proof(order_id, gateway_payment_id, signature)
        {
            return Err(AppError::Unauthorized(
                "invalid payment signature".to_string(),
            ));
        }
        self.apply_capture(order_id, gateway_payment_id, None).await
    }

    /// Applies a capture signal. Idempotent: a re-delivery carrying the same
    /// `gateway_payment_id` returns success with `newly_captured = false`.
    pub async fn apply_capture(
        &self,
        order_id: &str,
        gateway_payment_id: &str,
        method: Option<String>,
    ) -> Result<CaptureResult> {
        let mut payment = self
            .payments
            .find_by_order_id(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("no payment for order '{}'", order_id)))?;

        if payment.is_same_capture(gateway_payment_id) {
            self.metrics.record_duplicate_capture();
            return Ok(CaptureResult {
                payment,
                newly_captured: false,
            });
        }

        match payment.status {
            PaymentStatus::Created | PaymentStatus::Authorized => {
                payment.capture(gateway_payment_id.to_string(), method);
                let payment = self.payments.update(payment).await?;
                self.metrics.record_capture_applied();
                info!(
                    order_id = %mask_gateway_id(order_id),
                    payment_id = %mask_gateway_id(gateway_payment_id),
                    "payment captured"
                );
                Ok(CaptureResult {
                    payment,
                    newly_captured: true,
                })
            }
            PaymentStatus::Captured => Err(AppError::Validation(format!(
                "order '{}' is already captured under a different payment id",
                order_id
            ))),
            PaymentStatus::Failed => Err(AppError::Validation(format!(
                "cannot capture failed order '{}'",
                order_id
            ))),
            PaymentStatus::Refunded => Err(AppError::Validation(format!(
                "cannot capture refunded order '{}'",
                order_id
            ))),
        }
    }

    /// Applies a failure signal. A duplicate failure is a no-op; a failure
    /// arriving after a capture is rejected as out-of-order.
    pub async fn apply_failure(&self, order_id: &str) -> Result<FailureResult> {
        let mut payment = self
            .payments
            .find_by_order_id(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("no payment for order '{}'", order_id)))?;

        match payment.status {
            PaymentStatus::Failed => Ok(FailureResult {
                payment,
                newly_failed: false,
            }),
            PaymentStatus::Created | PaymentStatus::Authorized => {
                payment.fail();
                let payment = self.payments.update(payment).await?;
                warn!(order_id = %mask_gateway_id(order_id), "payment failed");
                Ok(FailureResult {
                    payment,
                    newly_failed: true,
                })
            }
            PaymentStatus::Captured | PaymentStatus::Refunded => Err(AppError::Validation(format!(
                "failure signal for order '{}' arrived after capture",
                order_id
            ))),
        }
    }

    /// Records a refund reported by the gateway. A re-delivery with the same
    /// `refund_id` is a no-op; a second, different refund is
    /// `PaymentAlreadyRefunded`. Excess amounts are rejected, never clamped.
    pub async fn apply_refund(
        &self,
        gateway_payment_id: &str,
        refund_id: &str,
        amount: Decimal,
    ) -> Result<RefundResult> {
        let mut payment = self
            .payments
            .find_by_gateway_payment_id(gateway_payment_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("no payment '{}' found", gateway_payment_id))
            })?;

        if payment.status == PaymentStatus::Refunded {
            if payment.refund_id.as_deref() == Some(refund_id) {
                self.metrics.record_duplicate_refund();
                return Ok(RefundResult {
                    payment,
                    newly_refunded: false,
                });
            }
            return Err(AppError::PaymentAlreadyRefunded(
                gateway_payment_id.to_string(),
            ));
        }

        if payment.status != PaymentStatus::Captured {
            return Err(AppError::Validation(format!(
                "only captured payments can be refunded (payment '{}' is {:?})",
                gateway_payment_id, payment.status
            )));
        }

        if amount > payment.captured_amount {
            return Err(AppError::Validation(format!(
                "refund amount {} exceeds captured amount {}",
                amount, payment.captured_amount
            )));
        }

        payment.refund(refund_id.to_string(), amount);
        let payment = self.payments.update(payment).await?;
        self.metrics.record_refund_applied();
        info!(
            payment_id = %mask_gateway_id(gateway_payment_id),
            refund_id = %mask_gateway_id(refund_id),
            %amount,
            "refund recorded"
        );
        Ok(RefundResult {
            payment,
            newly_refunded: true,
        })
    }

    /// Engine-initiated refund: bounds-checks, asks the gateway for the
    /// refund, then records it.
    pub async fn initiate_refund(
        &self,
        gateway_payment_id: &str,
        amount: Option<Decimal>,
    ) -> Result<RefundResult> {
        let payment = self
            .payments
            .find_by_gateway_payment_id(gateway_payment_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("no payment '{}' found", gateway_payment_id))
            })?;

        if payment.status == PaymentStatus::Refunded {
            return Err(AppError::PaymentAlreadyRefunded(
                gateway_payment_id.to_string(),
            ));
        }
        if payment.status != PaymentStatus::Captured {
            return Err(AppError::Validation(format!(
                "only captured payments can be refunded (payment '{}' is {:?})",
                gateway_payment_id, payment.status
            )));
        }

        let amount = amount.unwrap_or(payment.captured_amount);
        if amount > payment.captured_amount {
            return Err(AppError::Validation(format!(
                "refund amount {} exceeds captured amount {}",
                amount, payment.captured_amount
            )));
        }

        let refund = self.gateway.refund(gateway_payment_id, amount).await?;
        self.apply_refund(gateway_payment_id, &refund.refund_id, amount)
            .await
    }

    pub async fn find_by_order_id(&self, order_id: &str) -> Result<Option<PaymentRecord>> {
        self.payments.find_by_order_id(order_id).await
    }

    pub async fn find_by_gateway_payment_id(
        &self,
        gateway_payment_id: &str,
    ) -> Result<Option<PaymentRecord>> {
        self.payments
            .find_by_gateway_payment_id(gateway_payment_id)
            .await
    }

    /// Most recent payment for a booking, if any.
    pub async fn payment_for_booking(&self, booking_id: Uuid) -> Result<Option<PaymentRecord>> {
        self.payments.latest_by_booking(booking_id).await
    }
}

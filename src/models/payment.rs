use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of a payment in its lifecycle.
///
/// Transitions happen only on verified gateway signals (client proof or
/// webhook), never on a client's bare assertion of success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Order opened against the gateway, nothing collected yet.
    Created,
    /// Funds reserved by the gateway but not captured.
    Authorized,
    /// Funds collected.
    Captured,
    /// Collection failed.
    Failed,
    /// Captured funds returned.
    Refunded,
}

impl PaymentStatus {
    /// Returns true while a capture signal may still apply.
    pub fn is_capturable(&self) -> bool {
        matches!(self, PaymentStatus::Created | PaymentStatus::Authorized)
    }

    /// Returns true if this payment blocks a new order for the same booking.
    /// At most one payment may sit in these states per booking.
    pub fn blocks_new_order(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Created | PaymentStatus::Authorized | PaymentStatus::Captured
        )
    }
}

/// A payment record tied to one gateway order.
///
/// Holds a one-directional reference to its booking; the booking carries only
/// a denormalized payment snapshot, never a reference back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub payer_id: Uuid,
    /// Gateway order identifier, unique across all payments.
    pub order_id: String,
    /// Gateway payment identifier, assigned once captured.
    pub gateway_payment_id: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub status: PaymentStatus,
    pub captured_amount: Decimal,
    pub refund_id: Option<String>,
    pub refund_amount: Decimal,
    /// Instrument reported by the gateway at capture (card, upi, ...).
    pub method: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentRecord {
    pub fn new(
        booking_id: Uuid,
        payer_id: Uuid,
        order_id: String,
        amount: Decimal,
        currency: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            booking_id,
            payer_id,
            order_id,
            gateway_payment_id: None,
            amount,
            currency,
            status: PaymentStatus::Created,
            captured_amount: Decimal::ZERO,
            refund_id: None,
            refund_amount: Decimal::ZERO,
            method: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Marks the payment captured for the full order amount.
    pub fn capture(&mut self, gateway_payment_id: String, method: Option<String>) {
        self.gateway_payment_id = Some(gateway_payment_id);
        self.status = PaymentStatus::Captured;
        self.captured_amount = self.amount;
        if method.is_some() {
            self.method = method;
        }
        self.updated_at = Utc::now();
    }

    pub fn fail(&mut self) {
        self.status = PaymentStatus::Failed;
        self.updated_at = Utc::now();
    }

    /// Records a refund. Callers enforce `amount <= captured_amount`.
    pub fn refund(&mut self, refund_id: String, amount: Decimal) {
        self.status = PaymentStatus::Refunded;
        self.refund_id = Some(refund_id);
        self.refund_amount = amount;
        self.updated_at = Utc::now();
    }

    /// Returns true if `gateway_payment_id` matches the one already captured.
    pub fn is_same_capture(&self, gateway_payment_id: &str) -> bool {
        self.status == PaymentStatus::Captured
            && self.gateway_payment_id.as_deref() == Some(gateway_payment_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn payment() -> PaymentRecord {
        PaymentRecord::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "order_100".to_string(),
            dec!(7500),
            "INR".to_string(),
        )
    }

    #[test]
    fn test_new_payment_defaults() {
        let p = payment();
        assert_eq!(p.status, PaymentStatus::Created);
        assert_eq!(p.captured_amount, Decimal::ZERO);
        assert_eq!(p.refund_amount, Decimal::ZERO);
        assert!(p.gateway_payment_id.is_none());
    }

    #[test]
    fn test_capture_records_full_amount() {
        let mut p = payment();
        p.capture("pay_1".to_string(), Some("card".to_string()));
        assert_eq!(p.status, PaymentStatus::Captured);
        assert_eq!(p.captured_amount, dec!(7500));
        assert_eq!(p.method.as_deref(), Some("card"));
        assert!(p.is_same_capture("pay_1"));
        assert!(!p.is_same_capture("pay_2"));
    }

    #[test]
    fn test_capturable_predicate() {
        assert!(PaymentStatus::Created.is_capturable());
        assert!(PaymentStatus::Authorized.is_capturable());
        assert!(!PaymentStatus::Captured.is_capturable());
        assert!(!PaymentStatus::Failed.is_capturable());
        assert!(!PaymentStatus::Refunded.is_capturable());
    }

    #[test]
    fn test_blocks_new_order() {
        assert!(PaymentStatus::Created.blocks_new_order());
        assert!(PaymentStatus::Captured.blocks_new_order());
        assert!(!PaymentStatus::Failed.blocks_new_order());
        assert!(!PaymentStatus::Refunded.blocks_new_order());
    }

    #[test]
    fn test_refund_records_identifiers() {
        let mut p = payment();
        p.capture("pay_1".to_string(), None);
        p.refund("rfnd_1".to_string(), dec!(7500));
        assert_eq!(p.status, PaymentStatus::Refunded);
        assert_eq!(p.refund_id.as_deref(), Some("rfnd_1"));
        assert_eq!(p.refund_amount, dec!(7500));
    }
}

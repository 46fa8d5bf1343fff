use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::PaymentRecord;

/// Repository for PaymentRecord operations. Lookups run on the gateway's
/// identifiers since every reconciliation signal arrives keyed by them.
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn create(&self, payment: PaymentRecord) -> Result<PaymentRecord>;
    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<PaymentRecord>>;
    async fn find_by_gateway_payment_id(
        &self,
        gateway_payment_id: &str,
    ) -> Result<Option<PaymentRecord>>;
    /// The payment that blocks a new order for this booking, if any
    /// (status in created/authorized/captured).
    async fn find_blocking_by_booking(&self, booking_id: Uuid) -> Result<Option<PaymentRecord>>;
    /// Most recently created payment for a booking.
    async fn latest_by_booking(&self, booking_id: Uuid) -> Result<Option<PaymentRecord>>;
    async fn update(&self, payment: PaymentRecord) -> Result<PaymentRecord>;
}

/// In-memory payment store.
#[derive(Default)]
pub struct InMemoryPaymentRepository {
    records: RwLock<HashMap<Uuid, PaymentRecord>>,
}

impl InMemoryPaymentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentRepository for InMemoryPaymentRepository {
    async fn create(&self, payment: PaymentRecord) -> Result<PaymentRecord> {
        let mut records = self.records.write().await;
        if records.values().any(|p| p.order_id == payment.order_id) {
            return Err(AppError::Validation(format!(
                "duplicate gateway order id '{}'",
                payment.order_id
            )));
        }
        records.insert(payment.id, payment.clone());
        Ok(payment)
    }

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<PaymentRecord>> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .find(|p| p.order_id == order_id)
            .cloned())
    }

    async fn find_by_gateway_payment_id(
        &self,
        gateway_payment_id: &str,
    ) -> Result<Option<PaymentRecord>> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .find(|p| p.gateway_payment_id.as_deref() == Some(gateway_payment_id))
            .cloned())
    }

    async fn find_blocking_by_booking(&self, booking_id: Uuid) -> Result<Option<PaymentRecord>> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .find(|p| p.booking_id == booking_id && p.status.blocks_new_order())
            .cloned())
    }

    async fn latest_by_booking(&self, booking_id: Uuid) -> Result<Option<PaymentRecord>> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|p| p.booking_id == booking_id)
            .max_by_key(|p| p.created_at)
            .cloned())
    }

    async fn update(&self, payment: PaymentRecord) -> Result<PaymentRecord> {
        let mut records = self.records.write().await;
        if !records.contains_key(&payment.id) {
            return Err(AppError::NotFound(format!(
                "payment '{}' not found",
                payment.id
            )));
        }
        records.insert(payment.id, payment.clone());
        Ok(payment)
    }
}

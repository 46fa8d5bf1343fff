use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::Customer;

/// Repository for Customer accounts.
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn create(&self, customer: Customer) -> Result<Customer>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>>;
    async fn update(&self, customer: Customer) -> Result<Customer>;
}

/// In-memory customer store.
#[derive(Default)]
pub struct InMemoryCustomerRepository {
    records: RwLock<HashMap<Uuid, Customer>>,
}

impl InMemoryCustomerRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CustomerRepository for InMemoryCustomerRepository {
    async fn create(&self, customer: Customer) -> Result<Customer> {
        let mut records = self.records.write().await;
        records.insert(customer.id, customer.clone());
        Ok(customer)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn update(&self, customer: Customer) -> Result<Customer> {
        let mut records = self.records.write().await;
        if !records.contains_key(&customer.id) {
            return Err(AppError::NotFound(format!(
                "customer '{}' not found",
                customer.id
            )));
        }
        records.insert(customer.id, customer.clone());
        Ok(customer)
    }
}

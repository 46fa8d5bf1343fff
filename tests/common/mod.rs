#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use booking_engine::error::Result;
use booking_engine::gateway::{
    signature, GatewayOrder, GatewayRefund, ReconciliationGateway, WebhookHandler,
};
use booking_engine::models::{Customer, Role, Vehicle};
use booking_engine::repositories::{
    CustomerRepository, InMemoryBookingRepository, InMemoryCustomerRepository,
    InMemoryPaymentRepository, InMemoryVehicleRepository, VehicleRepository,
};
use booking_engine::services::{BookingLifecycleService, CreateBookingRequest};

pub const KEY_SECRET: &str = "test-key-secret";
pub const WEBHOOK_SECRET: &str = "test-webhook-secret";

/// In-process gateway double. Mints deterministic order/refund ids and
/// verifies real HMAC signatures against the fixed test secrets.
pub struct TestGateway {
    orders: AtomicU64,
    refunds: AtomicU64,
}

impl TestGateway {
    pub fn new() -> Self {
        Self {
            orders: AtomicU64::new(0),
            refunds: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl ReconciliationGateway for TestGateway {
    async fn create_order(
        &self,
        _amount: Decimal,
        _currency: &str,
        _receipt: &str,
    ) -> Result<GatewayOrder> {
        let n = self.orders.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(GatewayOrder {
            order_id: format!("order_TEST{n:04}"),
        })
    }

    fn verify_client_proof(&self, order_id: &str, payment_id: &str, sig: &str) -> bool {
        signature::verify_client_proof(KEY_SECRET, order_id, payment_id, sig)
    }

    fn verify_webhook(&self, payload: &[u8], sig: &str) -> bool {
        signature::verify_webhook_signature(WEBHOOK_SECRET, payload, sig)
    }

    async fn refund(&self, _gateway_payment_id: &str, _amount: Decimal) -> Result<GatewayRefund> {
        let n = self.refunds.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(GatewayRefund {
            refund_id: format!("rfnd_TEST{n:04}"),
        })
    }
}

pub struct TestHarness {
    pub service: Arc<BookingLifecycleService>,
    pub webhooks: WebhookHandler,
    pub gateway: Arc<TestGateway>,
    pub bookings: Arc<InMemoryBookingRepository>,
    pub vehicles: Arc<InMemoryVehicleRepository>,
    pub customers: Arc<InMemoryCustomerRepository>,
    pub customer: Customer,
    pub admin: Customer,
    pub driver: Customer,
    pub vehicle: Vehicle,
}

pub async fn setup() -> TestHarness {
    let bookings = Arc::new(InMemoryBookingRepository::new());
    let payments = Arc::new(InMemoryPaymentRepository::new());
    let vehicles = Arc::new(InMemoryVehicleRepository::new());
    let customers = Arc::new(InMemoryCustomerRepository::new());
    let gateway = Arc::new(TestGateway::new());

    let service = Arc::new(BookingLifecycleService::new(
        bookings.clone(),
        payments,
        vehicles.clone(),
        customers.clone(),
        gateway.clone(),
        "INR".to_string(),
    ));
    let webhooks = WebhookHandler::new(gateway.clone(), service.clone());

    let customer = customers
        .create(Customer::new(
            "Asha Rao".to_string(),
            "asha@example.com".to_string(),
            "+91-9000000001".to_string(),
            Role::User,
        ))
        .await
        .expect("seed customer");
    let admin = customers
        .create(Customer::new(
            "Ops Admin".to_string(),
            "admin@example.com".to_string(),
            "+91-9000000002".to_string(),
            Role::Admin,
        ))
        .await
        .expect("seed admin");
    let driver = customers
        .create(Customer::new(
            "Ravi Driver".to_string(),
            "ravi@example.com".to_string(),
            "+91-9000000003".to_string(),
            Role::Vendor,
        ))
        .await
        .expect("seed driver");
    let vehicle = vehicles
        .create(Vehicle::new(
            "Swift Dzire".to_string(),
            "KA01AB1234".to_string(),
            dec!(2500),
            "Bengaluru".to_string(),
        ))
        .await
        .expect("seed vehicle");

    TestHarness {
        service,
        webhooks,
        gateway,
        bookings,
        vehicles,
        customers,
        customer,
        admin,
        driver,
        vehicle,
    }
}

/// A three-day rental window starting tomorrow.
pub fn three_day_request(customer_id: Uuid, vehicle_id: Uuid) -> CreateBookingRequest {
    let pickup = Utc::now() + Duration::days(1);
    request_for_window(customer_id, vehicle_id, pickup, pickup + Duration::days(3))
}

pub fn request_for_window(
    customer_id: Uuid,
    vehicle_id: Uuid,
    pickup_time: DateTime<Utc>,
    dropoff_time: DateTime<Utc>,
) -> CreateBookingRequest {
    CreateBookingRequest {
        customer_id,
        vehicle_id,
        pickup_time,
        dropoff_time,
        pickup_location: "Airport".to_string(),
        dropoff_location: "Downtown".to_string(),
        services: vec![],
    }
}

/// Signature a legitimate client would attach to a capture proof.
pub fn proof(order_id: &str, payment_id: &str) -> String {
    signature::client_proof_signature(KEY_SECRET, order_id, payment_id)
}

pub fn webhook_sig(body: &[u8]) -> String {
    signature::webhook_signature(WEBHOOK_SECRET, body)
}

pub fn capture_webhook_body(order_id: &str, payment_id: &str, amount_minor: i64) -> Vec<u8> {
    serde_json::json!({
        "event": "payment.captured",
        "payload": {
            "payment": {
                "entity": {
                    "id": payment_id,
                    "order_id": order_id,
                    "amount": amount_minor,
                    "method": "card"
                }
            }
        }
    })
    .to_string()
    .into_bytes()
}

pub fn failure_webhook_body(order_id: &str, payment_id: &str) -> Vec<u8> {
    serde_json::json!({
        "event": "payment.failed",
        "payload": {
            "payment": {
                "entity": {
                    "id": payment_id,
                    "order_id": order_id,
                    "amount": 0
                }
            }
        }
    })
    .to_string()
    .into_bytes()
}

pub fn refund_webhook_body(payment_id: &str, refund_id: &str, amount_minor: i64) -> Vec<u8> {
    serde_json::json!({
        "event": "refund.created",
        "payload": {
            "refund": {
                "entity": {
                    "id": refund_id,
                    "payment_id": payment_id,
                    "amount": amount_minor
                }
            }
        }
    })
    .to_string()
    .into_bytes()
}

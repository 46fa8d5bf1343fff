//! The reconciliation boundary with the external payment provider.
//!
//! The provider is consumed through a narrow trait; the reconciliation
//! policy itself (how gateway events map onto booking state) lives in the
//! services. Signature verification is pure and precedes every mutation.

pub mod client;
pub mod signature;
pub mod webhook;

pub use client::{GatewayOrder, GatewayRefund, HttpGateway, ReconciliationGateway};
pub use webhook::{WebhookEnvelope, WebhookHandler, WebhookOutcome};

#[cfg(test)]
pub use client::MockReconciliationGateway;

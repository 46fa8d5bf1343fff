//! HMAC-SHA256 primitives for gateway signatures.
//!
//! Two distinct secrets are in play: the key secret signs client-side payment
//! proofs over `"{order_id}|{payment_id}"`, and the webhook secret signs the
//! raw webhook body. Verification happens before any ledger mutation.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

fn sign(secret: &str, message: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac key");
    mac.update(message);
    hex::encode(mac.finalize().into_bytes())
}

fn verify(secret: &str, message: &[u8], signature_hex: &str) -> bool {
    let Ok(signature) = hex::decode(signature_hex) else {
        return false;
    };
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac key");
    mac.update(message);
    mac.verify_slice(&signature).is_ok()
}

/// Signature a client must present to prove a successful capture.
pub fn client_proof_signature(key_secret: &str, order_id: &str, payment_id: &str) -> String {
    sign(key_secret, format!("{order_id}|{payment_id}").as_bytes())
}

pub fn verify_client_proof(
    key_secret: &str,
    order_id: &str,
    payment_id: &str,
    signature: &str,
) -> bool {
    verify(
        key_secret,
        format!("{order_id}|{payment_id}").as_bytes(),
        signature,
    )
}

/// Signature the gateway attaches to a webhook delivery, computed over the
/// raw request body.
pub fn webhook_signature(webhook_secret: &str, payload: &[u8]) -> String {
    sign(webhook_secret, payload)
}

pub fn verify_webhook_signature(webhook_secret: &str, payload: &[u8], signature: &str) -> bool {
    verify(webhook_secret, payload, signature)
}

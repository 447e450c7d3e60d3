//! # Payment Webhook Verification
//!
//! Authenticates transaction callbacks from the payment processor and
//! extracts the fields the booking lifecycle acts on.
//!
//! ## Signing Scheme
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /api/webhooks/payment?hmac=<hex>                                  │
//! │  { "type": "TRANSACTION", "obj": { ...transaction... } }                │
//! │                                                                         │
//! │  1. Read the 20 SIGNED_FIELDS from `obj`, in order                      │
//! │  2. Concatenate their text forms (no separator)                         │
//! │  3. HMAC-SHA512(secret, concatenation)                                  │
//! │  4. Compare with hex-decoded `hmac` in constant time                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The field order is the processor's published contract and must not be
//! changed. A missing or null field rejects the callback; it is never read as
//! an empty string.

use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha512;

use crate::error::SignatureError;

type HmacSha512 = Hmac<Sha512>;

/// Transaction fields covered by the signature, in signing order.
/// Dotted names address nested objects.
pub const SIGNED_FIELDS: [&str; 20] = [
    "amount_cents",
    "created_at",
    "currency",
    "error_occured",
    "has_parent_transaction",
    "id",
    "integration_id",
    "is_3d_secure",
    "is_auth",
    "is_capture",
    "is_refunded",
    "is_standalone_payment",
    "is_voided",
    "order.id",
    "owner",
    "pending",
    "source_data.pan",
    "source_data.sub_type",
    "source_data.type",
    "success",
];

// =============================================================================
// Payment Event
// =============================================================================

/// The parts of a verified transaction callback the lifecycle acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentEvent {
    /// Processor transaction id.
    pub transaction_id: String,
    /// `<prefix>-<bookingId>` as sent at checkout.
    pub merchant_order_id: String,
    pub success: bool,
    pub pending: bool,
    pub amount_cents: i64,
}

impl PaymentEvent {
    /// True only for a settled, successful payment.
    #[inline]
    pub fn is_successful(&self) -> bool {
        self.success && !self.pending
    }

    /// Extracts the event from a transaction object.
    pub fn from_transaction(obj: &Value) -> Result<Self, SignatureError> {
        Ok(PaymentEvent {
            transaction_id: field_text(obj, "id")?,
            merchant_order_id: field_text(obj, "order.merchant_order_id")?,
            success: field_bool(obj, "success")?,
            pending: field_bool(obj, "pending")?,
            amount_cents: obj
                .get("amount_cents")
                .and_then(Value::as_i64)
                .ok_or(SignatureError::MissingField("amount_cents"))?,
        })
    }
}

// =============================================================================
// Signing
// =============================================================================

/// Returns the transaction object of a callback body.
pub fn transaction_object(body: &Value) -> Result<&Value, SignatureError> {
    body.get("obj")
        .filter(|obj| obj.is_object())
        .ok_or_else(|| SignatureError::MalformedPayload("missing `obj`".to_string()))
}

/// Builds the canonical string the processor signs.
pub fn signing_string(obj: &Value) -> Result<String, SignatureError> {
    let mut out = String::with_capacity(256);
    for field in SIGNED_FIELDS {
        out.push_str(&field_text(obj, field)?);
    }
    Ok(out)
}

/// Computes the lowercase hex signature of a transaction object.
pub fn sign(obj: &Value, secret: &str) -> Result<String, SignatureError> {
    let mut mac = new_mac(secret)?;
    mac.update(signing_string(obj)?.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verifies a raw callback body against the supplied signature.
///
/// On success returns the event extracted from the (now trusted) payload.
pub fn verify_payload(
    raw_payload: &[u8],
    signature: &str,
    secret: &str,
) -> Result<PaymentEvent, SignatureError> {
    let body: Value = serde_json::from_slice(raw_payload)
        .map_err(|e| SignatureError::MalformedPayload(e.to_string()))?;
    let obj = transaction_object(&body)?;

    let expected = hex::decode(signature.trim()).map_err(|_| SignatureError::InvalidEncoding)?;

    let mut mac = new_mac(secret)?;
    mac.update(signing_string(obj)?.as_bytes());
    // verify_slice compares in constant time
    mac.verify_slice(&expected)
        .map_err(|_| SignatureError::Mismatch)?;

    PaymentEvent::from_transaction(obj)
}

/// Boolean form of [`verify_payload`].
pub fn verify(raw_payload: &[u8], signature: &str, secret: &str) -> bool {
    verify_payload(raw_payload, signature, secret).is_ok()
}

fn new_mac(secret: &str) -> Result<HmacSha512, SignatureError> {
    <HmacSha512 as Mac>::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::Mismatch)
}

// =============================================================================
// Field Access
// =============================================================================

fn lookup<'a>(obj: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(obj, |node, key| node.get(key))
        .filter(|value| !value.is_null())
}

/// Text form of a signed field: strings verbatim, numbers as JSON text,
/// booleans as `true` / `false`.
fn field_text(obj: &Value, path: &'static str) -> Result<String, SignatureError> {
    match lookup(obj, path) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Bool(b)) => Ok(b.to_string()),
        _ => Err(SignatureError::MissingField(path)),
    }
}

fn field_bool(obj: &Value, path: &'static str) -> Result<bool, SignatureError> {
    lookup(obj, path)
        .and_then(Value::as_bool)
        .ok_or(SignatureError::MissingField(path))
}

// =============================================================================
// Unit Tests
// =============================================================================

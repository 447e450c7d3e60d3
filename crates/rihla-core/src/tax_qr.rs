//! # Tax QR Payloads
//!
//! Tag-length-value encoding of a simplified tax invoice, base64-serialized
//! for display as a QR code on the customer's ticket.
//!
//! ## Wire Layout
//! ```text
//! ┌─────┬─────┬───────────────┬─────┬─────┬───────────────┬─── ... ───┐
//! │ 0x01│ len │ seller name   │ 0x02│ len │ VAT number    │  tags 3-5 │
//! └─────┴─────┴───────────────┴─────┴─────┴───────────────┴─── ... ───┘
//!   1 B   1 B   len bytes UTF-8
//!
//! tag 1 = seller name      tag 4 = invoice total (VAT inclusive)
//! tag 2 = VAT number       tag 5 = VAT amount
//! tag 3 = timestamp (ISO 8601)
//! ```
//!
//! `len` is the UTF-8 **byte** count. An Arabic seller name of 10 characters
//! is 20 bytes, and the length byte says 20.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::TaxQrError;

/// Largest value a one-byte length can describe.
pub const MAX_FIELD_BYTES: usize = u8::MAX as usize;

/// The five fields of a tax QR payload, in tag order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxInvoice {
    pub seller_name: String,
    pub vat_number: String,
    pub timestamp: String,
    pub total: String,
    pub vat_amount: String,
}

impl TaxInvoice {
    fn fields(&self) -> [(u8, &str); 5] {
        [
            (1, self.seller_name.as_str()),
            (2, self.vat_number.as_str()),
            (3, self.timestamp.as_str()),
            (4, self.total.as_str()),
            (5, self.vat_amount.as_str()),
        ]
    }

    /// Encodes the invoice as concatenated TLV records.
    ///
    /// Rejects any field longer than 255 bytes instead of truncating it.
    pub fn to_tlv(&self) -> Result<Vec<u8>, TaxQrError> {
        let fields = self.fields();
        let capacity = fields.iter().map(|(_, v)| v.len() + 2).sum();
        let mut out = Vec::with_capacity(capacity);

        for (tag, value) in fields {
            let bytes = value.as_bytes();
            let len = u8::try_from(bytes.len()).map_err(|_| TaxQrError::FieldTooLong {
                tag,
                len: bytes.len(),
            })?;
            out.push(tag);
            out.push(len);
            out.extend_from_slice(bytes);
        }

        Ok(out)
    }

    /// Encodes the invoice as base64 text, ready for a QR code.
    pub fn encode(&self) -> Result<String, TaxQrError> {
        Ok(STANDARD.encode(self.to_tlv()?))
    }

    /// Parses TLV records back into an invoice.
    ///
    /// Every tag from 1 to 5 must appear exactly once, in order.
    pub fn from_tlv(bytes: &[u8]) -> Result<Self, TaxQrError> {
        let mut values: Vec<String> = Vec::with_capacity(5);
        let mut rest = bytes;

        while !rest.is_empty() {
            if values.len() == 5 {
                return Err(TaxQrError::Malformed(
                    "unexpected record after tag 5".to_string(),
                ));
            }
            let [tag, len, tail @ ..] = rest else {
                return Err(TaxQrError::Malformed("truncated record header".to_string()));
            };
            let expected = values.len() as u8 + 1;
            if *tag != expected {
                return Err(TaxQrError::Malformed(format!(
                    "expected tag {}, found {}",
                    expected, tag
                )));
            }
            let len = *len as usize;
            if tail.len() < len {
                return Err(TaxQrError::Malformed(format!("tag {} value truncated", tag)));
            }
            let (value, tail) = tail.split_at(len);
            let value = String::from_utf8(value.to_vec())
                .map_err(|_| TaxQrError::Malformed(format!("tag {} is not UTF-8", tag)))?;
            values.push(value);
            rest = tail;
        }

        let [seller_name, vat_number, timestamp, total, vat_amount]: [String; 5] = values
            .try_into()
            .map_err(|v: Vec<String>| {
                TaxQrError::Malformed(format!("expected 5 records, found {}", v.len()))
            })?;

        Ok(TaxInvoice {
            seller_name,
            vat_number,
            timestamp,
            total,
            vat_amount,
        })
    }

    /// Decodes base64 QR text back into an invoice.
    pub fn decode(encoded: &str) -> Result<Self, TaxQrError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|_| TaxQrError::InvalidBase64)?;
        Self::from_tlv(&bytes)
    }
}

/// Builds the base64 tax QR payload for a transaction.
///
/// ## Example
/// ```rust
/// use rihla_core::tax_qr::generate_tax_qr;
///
/// let qr = generate_tax_qr("Rihla", "300000000000003", "2026-10-19T12:00:00Z", "180.00", "23.48")
///     .unwrap();
/// assert!(!qr.is_empty());
/// ```
pub fn generate_tax_qr(
    seller_name: &str,
    vat_number: &str,
    timestamp: &str,
    total: &str,
    vat_amount: &str,
) -> Result<String, TaxQrError> {
    TaxInvoice {
        seller_name: seller_name.to_string(),
        vat_number: vat_number.to_string(),
        timestamp: timestamp.to_string(),
        total: total.to_string(),
        vat_amount: vat_amount.to_string(),
    }
    .encode()
}

/// Decodes a payload produced by [`generate_tax_qr`].
pub fn decode_tax_qr(encoded: &str) -> Result<TaxInvoice, TaxQrError> {
    TaxInvoice::decode(encoded)
}

// =============================================================================
// Unit Tests
// =============================================================================

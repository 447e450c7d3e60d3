//! # Ticket Codes
//!
//! Opaque bearer credentials minted when a booking is paid.
//!
//! ## Format
//! `TKT-` followed by 32 uppercase hex characters: 128 bits from the
//! operating system CSPRNG. Anyone holding the code can present it, so it
//! must be unguessable; the owning-provider check at redemption is the second
//! line of protection.

use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::validation::normalize_ticket_code;

/// Prefix on every minted ticket code.
pub const TICKET_PREFIX: &str = "TKT-";

/// Random bytes per ticket code.
const TICKET_ENTROPY_BYTES: usize = 16;

/// A minted ticket credential.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketCode(String);

impl TicketCode {
    /// Mints a fresh ticket code.
    pub fn generate() -> Self {
        let mut bytes = [0u8; TICKET_ENTROPY_BYTES];
        OsRng.fill_bytes(&mut bytes);
        TicketCode(format!("{}{}", TICKET_PREFIX, hex::encode_upper(bytes)))
    }

    /// Wraps a scanned code in canonical form.
    ///
    /// No format check happens here: an unknown code is simply not found at
    /// lookup, which keeps every bad scan on the same `InvalidTicket` path.
    pub fn from_scan(raw: &str) -> Self {
        TicketCode(normalize_ticket_code(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TicketCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TicketCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

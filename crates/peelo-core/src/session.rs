//! # Session Store
//!
//! Who is operating which terminal.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Session::init(terminal)                                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  set_shop(shop) ──► sign_in(cashier) ──► ...sales... ──► teardown()     │
//! │                          ▲                                   │          │
//! │                          └───────────────────────────────────┘          │
//! │                     terminal and shop survive a logout                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::{Cashier, PaymentMethod, Shop};
use crate::validation::{validate_keypad_digits, validate_terminal_id, ValidationResult};
use crate::PIN_LENGTH;

// =============================================================================
// Session
// =============================================================================

/// Terminal, shop and signed-in cashier.
#[derive(Debug, Clone)]
pub struct Session {
    terminal_id: String,
    shop: Option<Shop>,
    cashier: Option<Cashier>,
}

impl Session {
    /// Starts a session for a terminal. The identifier is trimmed and validated.
    pub fn init(terminal_id: &str) -> ValidationResult<Self> {
        Ok(Session {
            terminal_id: validate_terminal_id(terminal_id)?,
            shop: None,
            cashier: None,
        })
    }

    pub fn terminal_id(&self) -> &str {
        &self.terminal_id
    }

    pub fn set_shop(&mut self, shop: Shop) {
        self.shop = Some(shop);
    }

    pub fn shop(&self) -> Option<&Shop> {
        self.shop.as_ref()
    }

    /// Shop name for headers and receipts, empty until the shop is loaded.
    pub fn shop_name(&self) -> &str {
        self.shop.as_ref().map(|s| s.name.as_str()).unwrap_or_default()
    }

    pub fn sign_in(&mut self, cashier: Cashier) {
        self.cashier = Some(cashier);
    }

    pub fn cashier(&self) -> Option<&Cashier> {
        self.cashier.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.cashier.is_some()
    }

    /// Signed-in cashier, or `NotAuthenticated`.
    pub fn require_cashier(&self) -> CoreResult<&Cashier> {
        self.cashier.as_ref().ok_or(CoreError::NotAuthenticated)
    }

    /// Logout. Returns the cashier that was signed in.
    pub fn teardown(&mut self) -> Option<Cashier> {
        self.cashier.take()
    }

    /// Methods offered at the tender panel.
    pub fn accepted_methods(&self) -> Vec<PaymentMethod> {
        match &self.shop {
            Some(shop) => shop.accepted_methods(),
            None => PaymentMethod::ALL.to_vec(),
        }
    }

    /// Rejects methods the shop does not take.
    pub fn require_accepted(&self, method: PaymentMethod) -> CoreResult<()> {
        if self.accepted_methods().contains(&method) {
            Ok(())
        } else {
            Err(CoreError::MethodNotAccepted(method.id().to_string()))
        }
    }
}

// =============================================================================
// PIN Pad
// =============================================================================

/// Digit buffer behind the PIN dots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PinPad {
    digits: String,
}

impl PinPad {
    pub fn new() -> Self {
        PinPad::default()
    }

    /// Appends keypad digits; anything past the fourth digit is dropped.
    pub fn press(&mut self, keys: &str) -> ValidationResult<usize> {
        validate_keypad_digits(keys)?;

        for key in keys.chars() {
            if self.digits.len() >= PIN_LENGTH {
                break;
            }
            self.digits.push(key);
        }
        Ok(self.digits.len())
    }

    pub fn backspace(&mut self) {
        self.digits.pop();
    }

    pub fn clear(&mut self) {
        self.digits.clear();
    }

    /// Exactly four digits entered; only then is a login attempted.
    pub fn is_complete(&self) -> bool {
        self.digits.len() == PIN_LENGTH
    }

    pub fn len(&self) -> usize {
        self.digits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.digits
    }
}

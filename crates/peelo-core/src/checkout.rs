//! # Checkout
//!
//! Turns a cart and a covered allocation into a transaction payload, and
//! tracks the one submission a register may have in flight.
//!
//! ## Submission Phases
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │        ┌────────┐  begin   ┌────────────┐  commit   ┌───────────┐       │
//! │  ┌────►│  Idle  │─────────►│ Submitting │──────────►│ Committed │       │
//! │  │     └────────┘          └────────────┘           └─────┬─────┘       │
//! │  │         ▲  ▲               │      │                    │             │
//! │  │ abandon │  │ begin (retry) │ fail │      new_sale      │             │
//! │  │         │  │               │      ▼                    │             │
//! │  │         │  │          ┌────────────┐                   │             │
//! │  │         │  └──────────│   Failed   │                   │             │
//! │  │         │             └────────────┘                   │             │
//! │  │         └──────────────────┘ (abandon)                 │             │
//! │  └────────────────────────────────────────────────────────┘             │
//! │                                                                         │
//! │  begin while Submitting  ─► SubmissionInProgress                        │
//! │  close while Submitting  ─► SubmissionInProgress (nothing changes)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The register clears the cart and allocator only after `commit`. A
//! failed submission keeps both so the cashier can retry.

use serde::Serialize;
use tracing::{debug, warn};
use ts_rs::TS;

use crate::cart::Cart;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::payment::PaymentAllocation;
use crate::receipt::Receipt;
use crate::session::Session;
use crate::types::{PaymentStatus, SaleSource, TaxRate, TransactionRequest};

// =============================================================================
// Totals
// =============================================================================

/// Amounts owed for the current cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutTotals {
    pub subtotal: Money,
    pub tax: Money,
    pub discount: Money,
    /// max(0, subtotal + tax − discount)
    pub total_due: Money,
}

impl CheckoutTotals {
    /// ```rust
    /// use peelo_core::checkout::CheckoutTotals;
    /// use peelo_core::money::Money;
    /// use peelo_core::types::TaxRate;
    ///
    /// let totals = CheckoutTotals::compute(Money::from_units(10000), TaxRate::from_bps(1800), Money::zero());
    /// assert_eq!(totals.total_due.units(), 11800);
    /// ```
    pub fn compute(subtotal: Money, rate: TaxRate, discount: Money) -> Self {
        let tax = subtotal.calculate_tax(rate);
        let total_due = subtotal
            .saturating_add(tax)
            .saturating_sub(discount.non_negative())
            .non_negative();

        CheckoutTotals {
            subtotal,
            tax,
            discount: discount.non_negative(),
            total_due,
        }
    }

    /// Totals for a cart with no discount.
    pub fn for_cart(cart: &Cart, rate: TaxRate) -> Self {
        CheckoutTotals::compute(cart.subtotal(), rate, Money::zero())
    }
}

/// Assembles the transaction payload.
///
/// ## Errors
/// - `NotAuthenticated` when no cashier is signed in
/// - `EmptyCart` when there is nothing to sell
/// - `InsufficientPayment` when allocations do not cover `total_due`
///
/// Zero allocations are left out of `payments`.
pub fn build_request(
    cart: &Cart,
    session: &Session,
    allocation: &PaymentAllocation,
    totals: &CheckoutTotals,
) -> CoreResult<TransactionRequest> {
    let cashier = session.require_cashier()?;

    if cart.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    let tender = allocation.totals(totals.total_due);
    if !allocation.can_checkout(totals.total_due) {
        return Err(CoreError::InsufficientPayment {
            allocated: tender.total_allocated,
            due: totals.total_due,
        });
    }

    Ok(TransactionRequest {
        cashier_id: cashier.id.clone(),
        items: cart.snapshot(),
        subtotal: totals.subtotal,
        tax: totals.tax,
        discount: totals.discount,
        total_amount: totals.total_due,
        payments: allocation.entries(),
        cash_given: tender.total_allocated,
        change: tender.change,
        payment_status: PaymentStatus::Paid,
        source: SaleSource::Pos,
    })
}

// =============================================================================
// Phase
// =============================================================================

/// Why a submission did not go through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutFailure {
    /// Total allocated when the sale was attempted.
    pub attempted: Money,
    pub due: Money,
    /// Diagnostic detail (status code and URL when known).
    pub reason: String,
}

/// Where the current sale is in its submission lifecycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum CheckoutPhase {
    #[default]
    Idle,
    Submitting {
        request: TransactionRequest,
    },
    Committed {
        receipt: Receipt,
    },
    Failed {
        failure: CheckoutFailure,
    },
}

impl CheckoutPhase {
    pub fn name(&self) -> &'static str {
        match self {
            CheckoutPhase::Idle => "idle",
            CheckoutPhase::Submitting { .. } => "submitting",
            CheckoutPhase::Committed { .. } => "committed",
            CheckoutPhase::Failed { .. } => "failed",
        }
    }
}

/// The submission state machine.
#[derive(Debug, Clone, Default)]
pub struct Checkout {
    phase: CheckoutPhase,
}

impl Checkout {
    pub fn new() -> Self {
        Checkout::default()
    }

    pub fn phase(&self) -> &CheckoutPhase {
        &self.phase
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.phase, CheckoutPhase::Submitting { .. })
    }

    /// Enters `Submitting` with the payload about to be sent.
    pub fn begin(&mut self, request: TransactionRequest) -> CoreResult<&TransactionRequest> {
        match self.phase {
            CheckoutPhase::Idle | CheckoutPhase::Failed { .. } => {}
            CheckoutPhase::Submitting { .. } => return Err(CoreError::SubmissionInProgress),
            CheckoutPhase::Committed { .. } => {
                return Err(CoreError::InvalidCheckoutPhase {
                    phase: self.phase.name(),
                    operation: "submit",
                })
            }
        }

        debug!(
            total = request.total_amount.units(),
            lines = request.items.len(),
            "Checkout submitting"
        );
        self.phase = CheckoutPhase::Submitting { request };

        match &self.phase {
            CheckoutPhase::Submitting { request } => Ok(request),
            _ => Err(CoreError::SubmissionInProgress),
        }
    }

    /// The request currently in flight.
    pub fn in_flight(&self) -> Option<&TransactionRequest> {
        match &self.phase {
            CheckoutPhase::Submitting { request } => Some(request),
            _ => None,
        }
    }

    /// Records the server's confirmation.
    pub fn commit(&mut self, receipt: Receipt) -> CoreResult<&Receipt> {
        self.require_submitting("commit")?;
        self.phase = CheckoutPhase::Committed { receipt };

        match &self.phase {
            CheckoutPhase::Committed { receipt } => Ok(receipt),
            other => Err(CoreError::InvalidCheckoutPhase {
                phase: other.name(),
                operation: "commit",
            }),
        }
    }

    /// Records a failed submission against the in-flight request.
    pub fn fail(&mut self, reason: impl Into<String>) -> CoreResult<&CheckoutFailure> {
        let request = self.require_submitting("fail")?;
        let failure = CheckoutFailure {
            attempted: request.cash_given,
            due: request.total_amount,
            reason: reason.into(),
        };
        self.phase = CheckoutPhase::Failed { failure };

        match &self.phase {
            CheckoutPhase::Failed { failure } => Ok(failure),
            other => Err(CoreError::InvalidCheckoutPhase {
                phase: other.name(),
                operation: "fail",
            }),
        }
    }

    /// Gives up on a submission whose outcome never arrived.
    ///
    /// The server may still have recorded the sale, so the snapshot is
    /// logged for reconciliation.
    pub fn abandon(&mut self) -> CoreResult<TransactionRequest> {
        self.require_submitting("abandon")?;

        match std::mem::take(&mut self.phase) {
            CheckoutPhase::Submitting { request } => {
                warn!(
                    cashier_id = %request.cashier_id,
                    total = request.total_amount.units(),
                    cash_given = request.cash_given.units(),
                    lines = request.items.len(),
                    "Submission abandoned, outcome unknown"
                );
                Ok(request)
            }
            other => {
                let phase = other.name();
                self.phase = other;
                Err(CoreError::InvalidCheckoutPhase {
                    phase,
                    operation: "abandon",
                })
            }
        }
    }

    /// Closes the checkout panel. Refused while a submission is in flight.
    pub fn close(&mut self) -> CoreResult<()> {
        if self.is_submitting() {
            return Err(CoreError::SubmissionInProgress);
        }
        self.phase = CheckoutPhase::Idle;
        Ok(())
    }

    /// Leaves `Committed` for the next sale. Other phases are untouched.
    pub fn new_sale(&mut self) {
        if matches!(self.phase, CheckoutPhase::Committed { .. }) {
            self.phase = CheckoutPhase::Idle;
        }
    }

    /// Logout teardown.
    pub fn reset(&mut self) {
        self.phase = CheckoutPhase::Idle;
    }

    fn require_submitting(&self, operation: &'static str) -> CoreResult<&TransactionRequest> {
        self.in_flight().ok_or(CoreError::InvalidCheckoutPhase {
            phase: self.phase.name(),
            operation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::resolve_line;
    use crate::catalog::fixtures::product;
    use crate::types::{Cashier, PaymentMethod, TransactionResponse};
    use chrono::Utc;

    fn signed_in_session() -> Session {
        let mut session = Session::init("t1").unwrap();
        session.sign_in(Cashier {
            id: "c1".into(),
            name: "Awa".into(),
            role: "cashier".into(),
            avatar: None,
            is_active: true,
        });
        session
    }

    fn cart_of(price: i64, quantity: i64) -> Cart {
        let mut cart = Cart::new();
        cart.add_line(
            resolve_line(&product("p1", "Poulet", "Plats", price), None)
                .unwrap()
                .with_quantity(quantity),
        );
        cart
    }

    fn covered_request() -> TransactionRequest {
        let cart = cart_of(2500, 2);
        let totals = CheckoutTotals::for_cart(&cart, TaxRate::zero());
        let mut allocation = PaymentAllocation::new();
        allocation.set_amount(PaymentMethod::Cash, Money::from_units(5000));
        build_request(&cart, &signed_in_session(), &allocation, &totals).unwrap()
    }

    fn response() -> TransactionResponse {
        TransactionResponse {
            id: "t1".into(),
            transaction_number: "TXN-1".into(),
            total_amount: Money::from_units(5000),
            change: Money::zero(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_totals_with_tax_and_discount() {
        let totals = CheckoutTotals::compute(
            Money::from_units(10000),
            TaxRate::from_bps(1800),
            Money::from_units(800),
        );
        assert_eq!(totals.tax.units(), 1800);
        assert_eq!(totals.total_due.units(), 11000);
    }

    #[test]
    fn test_total_due_never_negative() {
        let totals = CheckoutTotals::compute(Money::from_units(500), TaxRate::zero(), Money::from_units(900));
        assert_eq!(totals.total_due, Money::zero());
    }

    #[test]
    fn test_build_request_requires_cashier() {
        let cart = cart_of(1000, 1);
        let totals = CheckoutTotals::for_cart(&cart, TaxRate::zero());
        let mut allocation = PaymentAllocation::new();
        allocation.set_amount(PaymentMethod::Cash, Money::from_units(1000));

        let session = Session::init("t1").unwrap();
        assert!(matches!(
            build_request(&cart, &session, &allocation, &totals),
            Err(CoreError::NotAuthenticated)
        ));
    }

    #[test]
    fn test_build_request_rejects_empty_cart() {
        let cart = Cart::new();
        let totals = CheckoutTotals::for_cart(&cart, TaxRate::zero());
        assert!(matches!(
            build_request(&cart, &signed_in_session(), &PaymentAllocation::new(), &totals),
            Err(CoreError::EmptyCart)
        ));
    }

    #[test]
    fn test_build_request_rejects_insufficient_payment() {
        let cart = cart_of(10000, 1);
        let totals = CheckoutTotals::for_cart(&cart, TaxRate::zero());
        let mut allocation = PaymentAllocation::new();
        allocation.set_amount(PaymentMethod::Cash, Money::from_units(9000));

        match build_request(&cart, &signed_in_session(), &allocation, &totals) {
            Err(CoreError::InsufficientPayment { allocated, due }) => {
                assert_eq!(allocated.units(), 9000);
                assert_eq!(due.units(), 10000);
            }
            other => panic!("expected InsufficientPayment, got {:?}", other),
        }
    }

    #[test]
    fn test_build_request_payload() {
        let cart = cart_of(2500, 3);
        let totals = CheckoutTotals::for_cart(&cart, TaxRate::zero());
        let mut allocation = PaymentAllocation::new();
        allocation.set_amount(PaymentMethod::Cash, Money::from_units(5000));
        allocation.set_amount(PaymentMethod::Wave, Money::from_units(5000));
        allocation.set_amount(PaymentMethod::Card, Money::zero());

        let request = build_request(&cart, &signed_in_session(), &allocation, &totals).unwrap();
        assert_eq!(request.cashier_id, "c1");
        assert_eq!(request.total_amount.units(), 7500);
        assert_eq!(request.cash_given.units(), 10000);
        assert_eq!(request.change.units(), 2500);
        assert_eq!(request.payments.len(), 2);
        assert!(request.payments.iter().all(|p| p.amount.is_positive()));
        assert_eq!(request.items[0].total_price.units(), 7500);
    }

    #[test]
    fn test_request_serializes_camel_case() {
        let json = serde_json::to_value(covered_request()).unwrap();
        assert_eq!(json["cashierId"], "c1");
        assert_eq!(json["totalAmount"], 5000);
        assert_eq!(json["cashGiven"], 5000);
        assert_eq!(json["paymentStatus"], "paid");
        assert_eq!(json["source"], "pos");
        assert_eq!(json["payments"][0]["method"], "cash");
        assert_eq!(json["items"][0]["productId"], "p1");
        assert_eq!(json["items"][0]["variantId"], serde_json::Value::Null);
    }

    #[test]
    fn test_begin_twice_is_rejected() {
        let mut checkout = Checkout::new();
        checkout.begin(covered_request()).unwrap();

        assert!(matches!(
            checkout.begin(covered_request()),
            Err(CoreError::SubmissionInProgress)
        ));
        assert!(matches!(checkout.close(), Err(CoreError::SubmissionInProgress)));
        assert!(checkout.is_submitting());
    }

    #[test]
    fn test_commit_then_new_sale() {
        let mut checkout = Checkout::new();
        let request = checkout.begin(covered_request()).unwrap().clone();
        let receipt = Receipt::build(&request, &response(), "Shop", "Awa");

        checkout.commit(receipt).unwrap();
        assert_eq!(checkout.phase().name(), "committed");
        assert!(checkout.begin(covered_request()).is_err());

        checkout.new_sale();
        assert_eq!(checkout.phase(), &CheckoutPhase::Idle);
    }

    #[test]
    fn test_fail_records_attempt_and_allows_retry() {
        let mut checkout = Checkout::new();
        checkout.begin(covered_request()).unwrap();

        let failure = checkout.fail("HTTP 500 at /transactions").unwrap().clone();
        assert_eq!(failure.attempted.units(), 5000);
        assert_eq!(failure.due.units(), 5000);

        assert!(checkout.begin(covered_request()).is_ok());
    }

    #[test]
    fn test_abandon_returns_snapshot() {
        let mut checkout = Checkout::new();
        checkout.begin(covered_request()).unwrap();

        let abandoned = checkout.abandon().unwrap();
        assert_eq!(abandoned.cashier_id, "c1");
        assert_eq!(checkout.phase(), &CheckoutPhase::Idle);
        assert!(checkout.abandon().is_err());
    }

    #[test]
    fn test_commit_requires_submitting() {
        let mut checkout = Checkout::new();
        let request = covered_request();
        let receipt = Receipt::build(&request, &response(), "Shop", "Awa");
        assert!(matches!(
            checkout.commit(receipt),
            Err(CoreError::InvalidCheckoutPhase { phase: "idle", operation: "commit" })
        ));
    }
}

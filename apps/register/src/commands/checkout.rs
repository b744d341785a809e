//! # Checkout Commands
//!
//! The tender panel and transaction submission.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Checkout Flow                                        │
//! │                                                                         │
//! │  open_checkout ──► tender panel                                         │
//! │                      │  set_tender / add_tender (quick chips)           │
//! │                      │  fill_exact / clear_tender                       │
//! │                      │  press_tender_digits / tender_backspace          │
//! │                      ▼                                                  │
//! │                 canCheckout?                                            │
//! │                      │ yes                                              │
//! │                      ▼                                                  │
//! │  submit ──► Idle/Failed ──► Submitting ──► create_transaction           │
//! │                                  │                                      │
//! │                  ┌───────────────┴───────────────┐                      │
//! │                  ▼                               ▼                      │
//! │              Committed                        Failed                    │
//! │  cart cleared, tender reset,          cart and tender kept,             │
//! │  receipt returned                     CHECKOUT_FAILED returned          │
//! │                                                                         │
//! │  Stuck in Submitting (the call never resolved)?                        │
//! │  abandon_submission logs the snapshot and returns to Idle.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tracing::{debug, error, info};
use uuid::Uuid;

use peelo_api::CommerceApi;
use peelo_core::checkout::{build_request, CheckoutPhase, CheckoutTotals};
use peelo_core::payment::AllocationTotals;
use peelo_core::receipt::Receipt;
use peelo_core::{CoreError, Money, PaymentMethod, PaymentMethodInfo, TenderEntry};

use crate::commands::cart::CartResponse;
use crate::error::{AppError, AppResult};
use crate::state::Register;

/// Everything the tender panel shows.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenderView {
    pub totals: CheckoutTotals,
    pub allocation: AllocationTotals,
    /// Non-zero allocations, in method order.
    pub entries: Vec<TenderEntry>,
    pub methods: Vec<PaymentMethodInfo>,
    pub quick_amounts: Vec<Money>,
    pub can_checkout: bool,
    pub phase: CheckoutPhase,
}

impl TenderView {
    fn from_register<A: CommerceApi>(register: &Register<A>) -> Self {
        let totals = register.totals();
        let allocation = &register.allocation;

        TenderView {
            totals,
            allocation: allocation.totals(totals.total_due),
            entries: allocation.entries(),
            methods: register
                .session
                .accepted_methods()
                .iter()
                .map(|m| m.info())
                .collect(),
            quick_amounts: register.config.quick_amounts(),
            can_checkout: !register.cart.is_empty()
                && allocation.can_checkout(totals.total_due),
            phase: register.checkout.phase().clone(),
        }
    }
}

/// Current tender panel without changing anything.
pub fn tender_view<A: CommerceApi>(register: &Register<A>) -> AppResult<TenderView> {
    register.require_cashier()?;
    Ok(TenderView::from_register(register))
}

/// Opens the tender panel for the current cart.
///
/// ## Errors
/// - `CART_ERROR` when the cart is empty
/// - `SUBMISSION_PENDING` while a transaction is in flight
pub fn open_checkout<A: CommerceApi>(register: &mut Register<A>) -> AppResult<TenderView> {
    debug!("open_checkout command");
    register.begin_edit()?;

    if register.cart.is_empty() {
        return Err(CoreError::EmptyCart.into());
    }

    Ok(TenderView::from_register(register))
}

/// Common gate for every allocation edit.
fn begin_tender<A: CommerceApi>(register: &mut Register<A>, method: PaymentMethod) -> AppResult<()> {
    register.begin_edit()?;
    register.session.require_accepted(method)?;
    Ok(())
}

/// Sets the amount for one method. Zero or negative removes it.
pub fn set_tender<A: CommerceApi>(
    register: &mut Register<A>,
    method: PaymentMethod,
    amount: Money,
) -> AppResult<TenderView> {
    debug!(method = %method, amount = amount.units(), "set_tender command");
    begin_tender(register, method)?;

    register.allocation.set_amount(method, amount);
    Ok(TenderView::from_register(register))
}

/// Adds to one method's amount (quick-amount chips).
pub fn add_tender<A: CommerceApi>(
    register: &mut Register<A>,
    method: PaymentMethod,
    amount: Money,
) -> AppResult<TenderView> {
    debug!(method = %method, amount = amount.units(), "add_tender command");
    begin_tender(register, method)?;

    register.allocation.add_amount(method, amount);
    Ok(TenderView::from_register(register))
}

/// Sets one method to exactly what the other methods leave uncovered.
pub fn fill_exact<A: CommerceApi>(
    register: &mut Register<A>,
    method: PaymentMethod,
) -> AppResult<TenderView> {
    debug!(method = %method, "fill_exact command");
    begin_tender(register, method)?;

    let due = register.totals().total_due;
    register.allocation.fill_exact(method, due);
    Ok(TenderView::from_register(register))
}

pub fn clear_tender<A: CommerceApi>(
    register: &mut Register<A>,
    method: PaymentMethod,
) -> AppResult<TenderView> {
    debug!(method = %method, "clear_tender command");
    begin_tender(register, method)?;

    register.allocation.clear_method(method);
    Ok(TenderView::from_register(register))
}

/// Keypad entry into one method's amount: "1","2","3" → 123.
pub fn press_tender_digits<A: CommerceApi>(
    register: &mut Register<A>,
    method: PaymentMethod,
    keys: &str,
) -> AppResult<TenderView> {
    debug!(method = %method, keys = %keys, "press_tender_digits command");
    begin_tender(register, method)?;

    register.allocation.press_digits(method, keys)?;
    Ok(TenderView::from_register(register))
}

pub fn tender_backspace<A: CommerceApi>(
    register: &mut Register<A>,
    method: PaymentMethod,
) -> AppResult<TenderView> {
    debug!(method = %method, "tender_backspace command");
    begin_tender(register, method)?;

    register.allocation.backspace(method);
    Ok(TenderView::from_register(register))
}

/// Submits the sale.
///
/// ## Behavior
/// 1. The payload is built from the cart snapshot and the allocations
/// 2. The checkout enters `Submitting`; a second submit is refused
/// 3. One request is sent, no retries
/// 4. Success: receipt returned, cart and tender cleared
/// 5. Failure: `CHECKOUT_FAILED` with tendered and due amounts; cart and
///    tender are kept so the cashier can retry
///
/// If the returned future is dropped before it resolves the checkout
/// stays `Submitting` until `abandon_submission`.
pub async fn submit<A: CommerceApi>(register: &mut Register<A>) -> AppResult<Receipt> {
    debug!("submit command");
    register.ensure_idle()?;

    let totals = register.totals();
    let request = build_request(
        &register.cart,
        &register.session,
        &register.allocation,
        &totals,
    )?;
    let cashier_name = register.require_cashier()?.name.clone();

    let attempt = Uuid::new_v4();
    register.checkout.begin(request.clone())?;
    info!(
        attempt = %attempt,
        total = request.total_amount.units(),
        cash_given = request.cash_given.units(),
        lines = request.items.len(),
        "Submitting transaction"
    );

    let terminal_id = register.session.terminal_id().to_string();
    match register.api.create_transaction(&terminal_id, &request).await {
        Ok(response) => {
            let receipt = Receipt::build(
                &request,
                &response,
                register.session.shop_name(),
                &cashier_name,
            );
            register.checkout.commit(receipt.clone())?;
            register.cart.clear();
            register.allocation.reset();

            info!(
                attempt = %attempt,
                transaction_number = %receipt.transaction_number,
                change = receipt.change.units(),
                "Transaction committed"
            );
            Ok(receipt)
        }
        Err(e) => {
            error!(attempt = %attempt, error = %e, "Transaction failed");
            let failure = register.checkout.fail(e.to_string())?;
            Err(AppError::checkout_failed(failure))
        }
    }
}

/// Closes the tender panel. Allocations are dropped, the cart is kept.
pub fn close_checkout<A: CommerceApi>(register: &mut Register<A>) -> AppResult<CartResponse> {
    debug!("close_checkout command");
    register.require_cashier()?;

    register.checkout.close()?;
    register.allocation.reset();
    Ok(CartResponse::from_register(register))
}

/// Gives up waiting for a submission whose outcome never arrived.
///
/// The cart and tender are kept; the sale may or may not have been
/// recorded, so the snapshot is logged for reconciliation.
pub fn abandon_submission<A: CommerceApi>(register: &mut Register<A>) -> AppResult<TenderView> {
    debug!("abandon_submission command");
    register.require_cashier()?;

    register.checkout.abandon()?;
    Ok(TenderView::from_register(register))
}

/// Leaves the receipt screen for the next customer.
pub fn new_sale<A: CommerceApi>(register: &mut Register<A>) -> AppResult<CartResponse> {
    debug!("new_sale command");
    register.begin_edit()?;
    Ok(CartResponse::from_register(register))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::cart::add_to_cart;
    use crate::commands::login::{enter_terminal, logout, press_pin, select_cashier, submit_pin};
    use crate::error::ErrorCode;
    use crate::testing::{register_with, FakeApi};
    use peelo_core::payment::PaymentAllocation;

    async fn signed_in(api: FakeApi) -> Register<FakeApi> {
        let mut register = register_with(api);
        enter_terminal(&mut register, None).await.unwrap();
        select_cashier(&mut register, "c1").unwrap();
        press_pin(&mut register, "1234").unwrap();
        submit_pin(&mut register).await.unwrap();
        register
    }

    /// p1 ×3 + p2 ×1 = 9000 due.
    async fn with_cart(api: FakeApi) -> Register<FakeApi> {
        let mut register = signed_in(api).await;
        for _ in 0..3 {
            add_to_cart(&mut register, "p1", None).unwrap();
        }
        add_to_cart(&mut register, "p2", None).unwrap();
        register
    }

    fn units(n: i64) -> Money {
        Money::from_units(n)
    }

    #[tokio::test]
    async fn test_open_checkout_requires_lines() {
        let mut register = signed_in(FakeApi::default()).await;
        let err = open_checkout(&mut register).unwrap_err();
        assert_eq!(err.code, ErrorCode::CartError);

        add_to_cart(&mut register, "p1", None).unwrap();
        let view = open_checkout(&mut register).unwrap();
        assert_eq!(view.totals.total_due.units(), 2500);
        assert_eq!(view.allocation.remaining.units(), 2500);
        assert!(!view.can_checkout);
        assert_eq!(view.quick_amounts.len(), 4);
    }

    #[tokio::test]
    async fn test_split_payment_and_commit() {
        let mut register = with_cart(FakeApi::default()).await;
        open_checkout(&mut register).unwrap();

        set_tender(&mut register, PaymentMethod::Cash, units(5000)).unwrap();
        let view = add_tender(&mut register, PaymentMethod::Wave, units(2000)).unwrap();
        assert!(!view.can_checkout);
        assert_eq!(view.allocation.remaining.units(), 2000);

        let view = fill_exact(&mut register, PaymentMethod::OrangeMoney).unwrap();
        assert!(view.can_checkout);
        assert_eq!(view.allocation.change.units(), 0);
        assert_eq!(view.entries.len(), 3);

        let receipt = submit(&mut register).await.unwrap();
        assert_eq!(receipt.transaction_number, "TRX-0001");
        assert_eq!(receipt.total.units(), 9000);
        assert_eq!(receipt.change.units(), 0);
        assert_eq!(receipt.cashier_name, "Awa Ndiaye");
        assert_eq!(receipt.shop_name, "Boutique Teranga");
        assert_eq!(receipt.change_message(), "Pas de monnaie à rendre");

        assert!(register.cart().is_empty());
        assert!(register.allocation().is_empty());
        assert!(matches!(register.phase(), CheckoutPhase::Committed { .. }));

        let sent = register.api().submitted();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].cashier_id, "c1");
        assert_eq!(sent[0].items.len(), 2);
        assert_eq!(sent[0].cash_given.units(), 9000);
        assert!(sent[0].payments.iter().all(|p| p.amount.is_positive()));
    }

    #[tokio::test]
    async fn test_cash_change() {
        let mut register = with_cart(FakeApi::default()).await;
        add_tender(&mut register, PaymentMethod::Cash, units(10000)).unwrap();

        let receipt = submit(&mut register).await.unwrap();
        assert_eq!(receipt.change.units(), 1000);
        assert_eq!(receipt.cash_given.units(), 10000);
        assert_eq!(receipt.change_message(), "Monnaie à rendre: 1 000 F");
    }

    #[tokio::test]
    async fn test_insufficient_payment() {
        let mut register = with_cart(FakeApi::default()).await;
        set_tender(&mut register, PaymentMethod::Cash, units(8999)).unwrap();

        let err = submit(&mut register).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentError);
        assert!(register.api().submitted().is_empty());
        assert!(matches!(register.phase(), CheckoutPhase::Idle));
    }

    #[tokio::test]
    async fn test_failed_submission_keeps_sale() {
        let api = FakeApi {
            reject_transactions: true,
            ..FakeApi::default()
        };
        let mut register = with_cart(api).await;
        add_tender(&mut register, PaymentMethod::Cash, units(10000)).unwrap();

        let err = submit(&mut register).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::CheckoutFailed);
        assert!(err.message.contains("10 000 F tendered"));
        assert!(err.message.contains("9 000 F due"));
        assert!(err.message.contains("500"));

        assert_eq!(register.cart().line_count(), 2);
        assert_eq!(register.allocation().total_allocated().units(), 10000);
        assert!(matches!(register.phase(), CheckoutPhase::Failed { .. }));

        // Explicit retry succeeds
        register.api.reject_transactions = false;
        let receipt = submit(&mut register).await.unwrap();
        assert_eq!(receipt.change.units(), 1000);
    }

    #[tokio::test]
    async fn test_in_flight_submission_blocks_edits() {
        let mut register = with_cart(FakeApi::default()).await;
        add_tender(&mut register, PaymentMethod::Cash, units(9000)).unwrap();

        // A submission whose future was dropped before resolving
        let totals = register.totals();
        let request = build_request(
            &register.cart,
            &register.session,
            &register.allocation,
            &totals,
        )
        .unwrap();
        register.checkout.begin(request).unwrap();

        let pending = ErrorCode::SubmissionPending;
        assert_eq!(submit(&mut register).await.unwrap_err().code, pending);
        assert_eq!(add_to_cart(&mut register, "p1", None).unwrap_err().code, pending);
        assert_eq!(
            set_tender(&mut register, PaymentMethod::Cash, units(1)).unwrap_err().code,
            pending
        );
        assert_eq!(close_checkout(&mut register).unwrap_err().code, pending);
        assert_eq!(logout(&mut register).unwrap_err().code, pending);

        let view = abandon_submission(&mut register).unwrap();
        assert!(matches!(view.phase, CheckoutPhase::Idle));
        assert_eq!(register.cart().line_count(), 2);
        assert!(view.can_checkout);

        let err = abandon_submission(&mut register).unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentError);
    }

    #[tokio::test]
    async fn test_close_checkout_resets_tender_keeps_cart() {
        let mut register = with_cart(FakeApi::default()).await;
        open_checkout(&mut register).unwrap();
        set_tender(&mut register, PaymentMethod::Cash, units(4000)).unwrap();

        let cart = close_checkout(&mut register).unwrap();
        assert_eq!(cart.lines.len(), 2);
        assert_eq!(register.allocation(), &PaymentAllocation::new());
    }

    #[tokio::test]
    async fn test_keypad_entry() {
        let mut register = with_cart(FakeApi::default()).await;

        press_tender_digits(&mut register, PaymentMethod::Cash, "9").unwrap();
        let view = press_tender_digits(&mut register, PaymentMethod::Cash, "00").unwrap();
        assert_eq!(view.allocation.total_allocated.units(), 900);

        let view = press_tender_digits(&mut register, PaymentMethod::Cash, "0").unwrap();
        assert!(view.can_checkout);

        let view = tender_backspace(&mut register, PaymentMethod::Cash).unwrap();
        assert_eq!(view.allocation.total_allocated.units(), 900);

        let err = press_tender_digits(&mut register, PaymentMethod::Cash, "1x").unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let view = clear_tender(&mut register, PaymentMethod::Cash).unwrap();
        assert!(view.entries.is_empty());
    }

    #[tokio::test]
    async fn test_method_not_accepted() {
        let mut register = with_cart(FakeApi::default()).await;
        let err = set_tender(&mut register, PaymentMethod::Card, units(9000)).unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentError);
        assert!(register.allocation().is_empty());
    }

    #[tokio::test]
    async fn test_next_sale_after_commit() {
        let mut register = with_cart(FakeApi::default()).await;
        fill_exact(&mut register, PaymentMethod::Cash).unwrap();
        submit(&mut register).await.unwrap();

        let cart = add_to_cart(&mut register, "p2", None).unwrap();
        assert_eq!(cart.lines.len(), 1);
        assert!(matches!(register.phase(), CheckoutPhase::Idle));

        fill_exact(&mut register, PaymentMethod::Wave).unwrap();
        let receipt = submit(&mut register).await.unwrap();
        assert_eq!(receipt.transaction_number, "TRX-0002");

        new_sale(&mut register).unwrap();
        assert!(matches!(register.phase(), CheckoutPhase::Idle));
    }
}

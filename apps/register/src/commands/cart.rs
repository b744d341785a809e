//! # Cart Commands
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Lifecycle                                       │
//! │                                                                         │
//! │  ┌──────────┐     ┌──────────┐     ┌──────────┐     ┌──────────┐       │
//! │  │  Empty   │────►│ In Cart  │────►│  Tender  │────►│ Committed│       │
//! │  │  Cart    │     │          │     │  Panel   │     │   Sale   │       │
//! │  └──────────┘     └──────────┘     └──────────┘     └──────────┘       │
//! │                        │                 │               │              │
//! │                   add_to_cart        submit         next add_to_cart   │
//! │                   adjust_quantity   (checkout.rs)   starts a new sale  │
//! │                   remove_from_cart                                      │
//! │                        │                                                │
//! │                        ▼                                                │
//! │                   clear_cart ──────────────────────►                   │
//! │                                                      (back to empty)   │
//! │                                                                         │
//! │  Every edit is refused while a submission is in flight.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tracing::debug;

use peelo_api::CommerceApi;
use peelo_core::cart::{resolve_line, Cart, CartLine, CartSummary};
use peelo_core::checkout::CheckoutTotals;
use peelo_core::CoreError;

use crate::error::AppResult;
use crate::state::Register;

/// Cart response including lines and totals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub lines: Vec<CartLine>,
    pub summary: CartSummary,
    pub totals: CheckoutTotals,
}

impl CartResponse {
    pub(crate) fn from_register<A: CommerceApi>(register: &Register<A>) -> Self {
        let cart: &Cart = &register.cart;
        CartResponse {
            lines: cart.lines().to_vec(),
            summary: CartSummary::from(cart),
            totals: register.totals(),
        }
    }
}

/// Gets the current cart contents.
pub fn get_cart<A: CommerceApi>(register: &Register<A>) -> AppResult<CartResponse> {
    debug!("get_cart command");
    register.require_cashier()?;
    Ok(CartResponse::from_register(register))
}

/// Adds one unit of a product (or of one of its variants).
///
/// ## Behavior
/// - Same product and variant already in cart: quantity increases
/// - Otherwise a new line is appended
/// - Price is frozen at the time of adding
///
/// ## Errors
/// - `NOT_FOUND` when the product is not in the loaded catalog
/// - `CART_ERROR` when a variant is required, or does not belong to the product
pub fn add_to_cart<A: CommerceApi>(
    register: &mut Register<A>,
    product_id: &str,
    variant_id: Option<&str>,
) -> AppResult<CartResponse> {
    debug!(product_id = %product_id, variant_id = ?variant_id, "add_to_cart command");
    register.begin_edit()?;

    let product = register
        .catalog
        .find(product_id)
        .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

    let variant = match variant_id {
        Some(vid) => Some(product.variant(vid).ok_or_else(|| CoreError::VariantNotFound {
            product_id: product_id.to_string(),
            variant_id: vid.to_string(),
        })?),
        None => None,
    };

    let candidate = resolve_line(product, variant)?;
    let line = register.cart.add_line(candidate);
    debug!(key = %line.key, quantity = line.quantity, "Cart line updated");

    Ok(CartResponse::from_register(register))
}

/// Changes a line's quantity by `delta` (the − and + buttons).
///
/// Quantity never drops below 1; use `remove_from_cart` to drop a line.
/// Unknown keys are ignored.
pub fn adjust_quantity<A: CommerceApi>(
    register: &mut Register<A>,
    key: &str,
    delta: i64,
) -> AppResult<CartResponse> {
    debug!(key = %key, delta = delta, "adjust_quantity command");
    register.begin_edit()?;

    if register.cart.adjust_quantity(key, delta).is_none() {
        debug!(key = %key, "No cart line to adjust");
    }

    Ok(CartResponse::from_register(register))
}

/// Removes a line. Unknown keys are ignored.
pub fn remove_from_cart<A: CommerceApi>(
    register: &mut Register<A>,
    key: &str,
) -> AppResult<CartResponse> {
    debug!(key = %key, "remove_from_cart command");
    register.begin_edit()?;

    register.cart.remove_line(key);
    Ok(CartResponse::from_register(register))
}

/// Empties the cart.
pub fn clear_cart<A: CommerceApi>(register: &mut Register<A>) -> AppResult<CartResponse> {
    debug!("clear_cart command");
    register.begin_edit()?;

    register.cart.clear();
    Ok(CartResponse::from_register(register))
}

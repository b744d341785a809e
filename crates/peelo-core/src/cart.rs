//! # Cart Engine
//!
//! Owns the lines of the sale being rung up.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Cashier Action           Operation                 Cart Change         │
//! │  ──────────────           ─────────                 ───────────         │
//! │                                                                         │
//! │  Tap product ────────────► resolve_line + add_line ► merge or append    │
//! │                                                                         │
//! │  + / − buttons ──────────► adjust_quantity ────────► qty = max(1, q+d)  │
//! │                                                                         │
//! │  Trash icon ─────────────► remove_line ────────────► line dropped       │
//! │                                                                         │
//! │  Sale committed ─────────► clear ──────────────────► empty              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Lines are unique by `key` (adding the same key increases quantity)
//! - Quantity is always >= 1; only `remove_line` takes a line out
//! - Insertion order is preserved, it is the order shown and sent

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Product, TransactionLine, Variant};
use crate::validation::validate_price;

/// Key suffix for products sold without a variant.
const BASE_VARIANT_SUFFIX: &str = "base";

/// One purchasable unit in the cart.
///
/// ## Design Notes
/// Name, price and stock are frozen when the line is created. If the
/// catalog is reloaded afterwards the line keeps what the cashier saw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// `<productId>-<variantId>` or `<productId>-base`.
    pub key: String,
    pub product_id: String,
    pub variant_id: Option<String>,
    pub name: String,
    pub variant_label: Option<String>,
    pub unit_price: Money,
    pub quantity: i64,
    /// Stock reported by the catalog when the line was added.
    pub stock_at_add: i64,
    pub image_ref: Option<String>,
}

impl CartLine {
    /// Builds the line key for a product and optional variant.
    pub fn key_for(product_id: &str, variant_id: Option<&str>) -> String {
        format!(
            "{}-{}",
            product_id,
            variant_id.unwrap_or(BASE_VARIANT_SUFFIX)
        )
    }

    /// Overrides the quantity of a candidate line (minimum 1).
    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = quantity.max(1);
        self
    }

    /// unit price × quantity
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }

    /// Frozen copy of this line for the transaction payload.
    pub fn to_transaction_line(&self) -> TransactionLine {
        TransactionLine {
            product_id: self.product_id.clone(),
            variant_id: self.variant_id.clone(),
            name: self.name.clone(),
            variant: self.variant_label.clone(),
            quantity: self.quantity,
            unit_price: self.unit_price,
            total_price: self.line_total(),
        }
    }
}

/// Turns a catalog product (and the chosen variant, if any) into a cart line.
///
/// Every add-to-cart path goes through here.
///
/// ## Rules
/// ```text
/// product has variants?
///   ├── no  ─► variant must be None
///   │          id/price/stock from product, key "<id>-base",
///   │          image = first product image
///   └── yes ─► variant required, and must belong to the product
///              id/price/stock from variant, key "<id>-<variantId>",
///              image = first variant image, else first product image
/// ```
pub fn resolve_line(product: &Product, variant: Option<&Variant>) -> CoreResult<CartLine> {
    match (product.requires_variant(), variant) {
        (false, None) => {
            validate_price(product.price)?;
            Ok(CartLine {
                key: CartLine::key_for(&product.id, None),
                product_id: product.id.clone(),
                variant_id: None,
                name: product.title.clone(),
                variant_label: None,
                unit_price: product.price,
                quantity: 1,
                stock_at_add: product.stock,
                image_ref: product.primary_image().map(str::to_string),
            })
        }
        (true, None) => Err(CoreError::VariantRequired {
            product_id: product.id.clone(),
        }),
        (_, Some(chosen)) => {
            if product.variant(&chosen.id).is_none() {
                return Err(CoreError::VariantNotFound {
                    product_id: product.id.clone(),
                    variant_id: chosen.id.clone(),
                });
            }
            validate_price(chosen.price)?;

            let image_ref = chosen
                .images
                .first()
                .map(String::as_str)
                .or_else(|| product.primary_image())
                .map(str::to_string);

            Ok(CartLine {
                key: CartLine::key_for(&product.id, Some(&chosen.id)),
                product_id: product.id.clone(),
                variant_id: Some(chosen.id.clone()),
                name: product.title.clone(),
                variant_label: Some(chosen.name.clone()),
                unit_price: chosen.price,
                quantity: 1,
                stock_at_add: chosen.stock,
                image_ref,
            })
        }
    }
}

/// The shopping cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart { lines: Vec::new() }
    }

    /// Adds a line, merging into an existing line with the same key.
    ///
    /// ## Returns
    /// The line as it stands after the add.
    pub fn add_line(&mut self, candidate: CartLine) -> &CartLine {
        let added = candidate.quantity.max(1);

        match self.lines.iter().position(|l| l.key == candidate.key) {
            Some(idx) => {
                let line = &mut self.lines[idx];
                line.quantity = line.quantity.saturating_add(added);
                line
            }
            None => {
                let idx = self.lines.len();
                self.lines.push(candidate.with_quantity(added));
                &self.lines[idx]
            }
        }
    }

    /// Changes a line's quantity by `delta`, never going below 1.
    ///
    /// ## Returns
    /// The new quantity, or `None` if no line has that key.
    pub fn adjust_quantity(&mut self, key: &str, delta: i64) -> Option<i64> {
        let line = self.lines.iter_mut().find(|l| l.key == key)?;
        line.quantity = line.quantity.saturating_add(delta).max(1);
        Some(line.quantity)
    }

    /// Removes the line with this key, returning it if present.
    pub fn remove_line(&mut self, key: &str) -> Option<CartLine> {
        let idx = self.lines.iter().position(|l| l.key == key)?;
        Some(self.lines.remove(idx))
    }

    /// Clears all lines from the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn get(&self, key: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.key == key)
    }

    /// Number of distinct lines (the badge on the cart button).
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Total number of units across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Σ(unit price × quantity), recomputed on every call.
    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Frozen transaction lines, in cart order.
    pub fn snapshot(&self) -> Vec<TransactionLine> {
        self.lines.iter().map(CartLine::to_transaction_line).collect()
    }
}

/// Cart summary for the register header and cart panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub line_count: usize,
    pub total_quantity: i64,
    pub subtotal: Money,
}

impl From<&Cart> for CartSummary {
    fn from(cart: &Cart) -> Self {
        CartSummary {
            line_count: cart.line_count(),
            total_quantity: cart.total_quantity(),
            subtotal: cart.subtotal(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::{product, product_with_variants, variant};

    fn base_line(id: &str, price: i64) -> CartLine {
        resolve_line(&product(id, &format!("Product {}", id), "Divers", price), None).unwrap()
    }

    #[test]
    fn test_resolve_line_without_variant() {
        let p = product("p1", "Bissap 50cl", "Boissons", 500);
        let line = resolve_line(&p, None).unwrap();

        assert_eq!(line.key, "p1-base");
        assert_eq!(line.variant_id, None);
        assert_eq!(line.variant_label, None);
        assert_eq!(line.unit_price.units(), 500);
        assert_eq!(line.quantity, 1);
        assert_eq!(line.stock_at_add, 10);
        assert_eq!(line.image_ref.as_deref(), Some("p1.png"));
    }

    #[test]
    fn test_resolve_line_with_variant_uses_variant_fields() {
        let p = product_with_variants(
            "p2",
            "T-shirt",
            vec![variant("v1", "M", 6000, &["m.png"]), variant("v2", "L", 6500, &[])],
        );

        let line = resolve_line(&p, p.variant("v1")).unwrap();
        assert_eq!(line.key, "p2-v1");
        assert_eq!(line.variant_id.as_deref(), Some("v1"));
        assert_eq!(line.variant_label.as_deref(), Some("M"));
        assert_eq!(line.unit_price.units(), 6000);
        assert_eq!(line.stock_at_add, 4);
        assert_eq!(line.image_ref.as_deref(), Some("m.png"));
    }

    #[test]
    fn test_resolve_line_variant_image_falls_back_to_product() {
        let p = product_with_variants("p2", "T-shirt", vec![variant("v2", "L", 6500, &[])]);
        let line = resolve_line(&p, p.variant("v2")).unwrap();
        assert_eq!(line.image_ref.as_deref(), Some("p2.png"));
    }

    #[test]
    fn test_resolve_line_requires_variant() {
        let p = product_with_variants("p2", "T-shirt", vec![variant("v1", "M", 6000, &[])]);
        assert!(matches!(
            resolve_line(&p, None),
            Err(CoreError::VariantRequired { .. })
        ));
    }

    #[test]
    fn test_resolve_line_rejects_foreign_variant() {
        let p = product_with_variants("p2", "T-shirt", vec![variant("v1", "M", 6000, &[])]);
        let foreign = variant("v9", "XL", 7000, &[]);
        assert!(matches!(
            resolve_line(&p, Some(&foreign)),
            Err(CoreError::VariantNotFound { .. })
        ));

        let plain = product("p1", "Bissap", "Boissons", 500);
        assert!(matches!(
            resolve_line(&plain, Some(&foreign)),
            Err(CoreError::VariantNotFound { .. })
        ));
    }

    #[test]
    fn test_resolve_line_rejects_negative_price() {
        let p = product("p1", "Broken", "Divers", -10);
        assert!(matches!(resolve_line(&p, None), Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_add_same_key_merges() {
        let mut cart = Cart::new();
        cart.add_line(base_line("p1", 2500));
        cart.add_line(base_line("p1", 2500).with_quantity(3));
        cart.add_line(base_line("p1", 2500));

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.get("p1-base").map(|l| l.quantity), Some(5));
    }

    #[test]
    fn test_add_preserves_insertion_order() {
        let mut cart = Cart::new();
        cart.add_line(base_line("b", 100));
        cart.add_line(base_line("a", 100));
        cart.add_line(base_line("b", 100));

        let keys: Vec<&str> = cart.lines().iter().map(|l| l.key.as_str()).collect();
        assert_eq!(keys, vec!["b-base", "a-base"]);
    }

    #[test]
    fn test_variants_of_same_product_are_separate_lines() {
        let p = product_with_variants(
            "p2",
            "T-shirt",
            vec![variant("v1", "M", 6000, &[]), variant("v2", "L", 6500, &[])],
        );

        let mut cart = Cart::new();
        cart.add_line(resolve_line(&p, p.variant("v1")).unwrap());
        cart.add_line(resolve_line(&p, p.variant("v2")).unwrap());

        assert_eq!(cart.line_count(), 2);
        assert_eq!(cart.subtotal().units(), 12500);
    }

    #[test]
    fn test_adjust_quantity_clamps_at_one() {
        let mut cart = Cart::new();
        cart.add_line(base_line("p1", 1000).with_quantity(4));

        assert_eq!(cart.adjust_quantity("p1-base", 2), Some(6));
        assert_eq!(cart.adjust_quantity("p1-base", -100), Some(1));
        assert_eq!(cart.adjust_quantity("p1-base", i64::MIN), Some(1));
        assert_eq!(cart.line_count(), 1);
    }

    #[test]
    fn test_adjust_and_remove_unknown_key_are_noops() {
        let mut cart = Cart::new();
        cart.add_line(base_line("p1", 1000));

        assert_eq!(cart.adjust_quantity("nope", 1), None);
        assert_eq!(cart.remove_line("nope"), None);
        assert_eq!(cart.line_count(), 1);
    }

    #[test]
    fn test_subtotal_is_exact_integer_sum() {
        let mut cart = Cart::new();
        cart.add_line(base_line("p1", 333).with_quantity(3));
        cart.add_line(base_line("p2", 1).with_quantity(7));
        cart.add_line(base_line("p3", 0));

        assert_eq!(cart.subtotal().units(), 999 + 7);
        assert_eq!(cart.total_quantity(), 11);
    }

    #[test]
    fn test_cart_scenario_add_merge_clamp_remove() {
        let mut cart = Cart::new();
        assert_eq!(cart.subtotal(), Money::zero());

        let p = product("P", "Poulet braisé", "Plats", 2500);
        cart.add_line(resolve_line(&p, None).unwrap());
        assert_eq!(cart.subtotal().units(), 2500);

        cart.add_line(resolve_line(&p, None).unwrap());
        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.get("P-base").map(|l| l.quantity), Some(2));
        assert_eq!(cart.subtotal().units(), 5000);

        cart.adjust_quantity("P-base", -5);
        assert_eq!(cart.get("P-base").map(|l| l.quantity), Some(1));
        assert_eq!(cart.subtotal().units(), 2500);

        cart.remove_line("P-base");
        assert!(cart.is_empty());
    }

    #[test]
    fn test_snapshot_freezes_line_totals() {
        let mut cart = Cart::new();
        cart.add_line(base_line("p1", 1250).with_quantity(2));

        let snapshot = cart.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].total_price.units(), 2500);
        assert_eq!(snapshot[0].unit_price.units(), 1250);

        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(snapshot[0].quantity, 2);
    }

    #[test]
    fn test_cart_summary() {
        let mut cart = Cart::new();
        cart.add_line(base_line("p1", 500).with_quantity(2));
        cart.add_line(base_line("p2", 750));

        let summary = CartSummary::from(&cart);
        assert_eq!(summary.line_count, 2);
        assert_eq!(summary.total_quantity, 3);
        assert_eq!(summary.subtotal.units(), 1750);
    }
}

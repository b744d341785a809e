//! # peelo-core: Pure Business Logic for Peelo POS
//!
//! Everything the register decides, with zero I/O. The HTTP client and
//! the register app sit on top of this crate.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Peelo POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 apps/register (peelo-register)                  │   │
//! │  │    login ──► browse catalog ──► cart ──► tender ──► receipt     │   │
//! │  └──────────────┬─────────────────────────────────┬────────────────┘   │
//! │                 │                                 │                     │
//! │  ┌──────────────▼─────────────────┐  ┌────────────▼────────────────┐   │
//! │  │  ★ peelo-core (THIS CRATE) ★   │  │  peelo-api                  │   │
//! │  │                                │  │  reqwest client for the     │   │
//! │  │  catalog   cart     payment    │  │  commerce API               │   │
//! │  │  checkout  session  receipt    │  │                             │   │
//! │  │  money     types    validation │  │  shop · products · cashiers │   │
//! │  │                                │  │  verify-pin · transactions  │   │
//! │  │  NO I/O • NO NETWORK           │  └─────────────────────────────┘   │
//! │  └────────────────────────────────┘                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Wire and domain types (Shop, Product, TransactionRequest, ...)
//! - [`money`] - Whole-unit `Money` with integer arithmetic
//! - [`catalog`] - Product snapshot, category/search filtering, load status
//! - [`cart`] - Cart lines, merging, quantity rules, variant resolution
//! - [`payment`] - Split-tender allocation, keypad entry, change
//! - [`checkout`] - Totals, payload assembly, submission phases
//! - [`session`] - Terminal, shop, signed-in cashier, PIN pad
//! - [`receipt`] - Committed-sale view
//! - [`validation`] - Input rules
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use peelo_core::cart::{resolve_line, Cart};
//! use peelo_core::checkout::CheckoutTotals;
//! use peelo_core::money::Money;
//! use peelo_core::payment::PaymentAllocation;
//! use peelo_core::types::{PaymentMethod, Product, TaxRate};
//!
//! let product: Product = serde_json::from_str(
//!     r#"{ "_id": "p1", "title": "Poulet braisé", "price": 2500 }"#,
//! ).unwrap();
//!
//! let mut cart = Cart::new();
//! cart.add_line(resolve_line(&product, None).unwrap());
//! cart.add_line(resolve_line(&product, None).unwrap());
//!
//! let totals = CheckoutTotals::for_cart(&cart, TaxRate::zero());
//! let mut allocation = PaymentAllocation::new();
//! allocation.set_amount(PaymentMethod::Cash, Money::from_units(10000));
//!
//! assert_eq!(totals.total_due.units(), 5000);
//! assert_eq!(allocation.totals(totals.total_due).change.units(), 5000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod error;
pub mod money;
pub mod payment;
pub mod receipt;
pub mod session;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Digits in a cashier PIN.
pub const PIN_LENGTH: usize = 4;

/// Maximum length of the catalog search box.
pub const MAX_SEARCH_LENGTH: usize = 100;

/// Page size requested from the products endpoint.
///
/// ## Business Reason
/// Terminals carry small catalogs; one page covers them. Larger shops
/// would need pagination, which the API does not expose yet.
pub const PRODUCT_PAGE_LIMIT: u32 = 100;

/// Most digits a keypad-entered tender amount may have.
pub const MAX_TENDER_DIGITS: usize = 9;

/// Quick-amount chips offered when nothing is configured.
pub const DEFAULT_QUICK_AMOUNTS: [i64; 4] = [1000, 2000, 5000, 10000];

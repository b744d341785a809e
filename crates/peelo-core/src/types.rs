//! # Domain Types
//!
//! Core domain types used throughout Peelo POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Catalog (read from API)          Transaction (written to API)          │
//! │  ┌─────────────────┐              ┌──────────────────────┐              │
//! │  │  Shop           │              │  TransactionRequest  │              │
//! │  │  Product        │              │   ├─ TransactionLine │              │
//! │  │   └─ Variant    │              │   └─ TenderEntry     │              │
//! │  │  Cashier        │              │  TransactionResponse │              │
//! │  └─────────────────┘              └──────────────────────┘              │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    TaxRate      │   │ PaymentMethod   │   │ PaymentStatus   │       │
//! │  │  bps (u32)      │   │  Cash           │   │  Paid           │       │
//! │  │  1800 = 18%     │   │  OrangeMoney    │   ├─────────────────┤       │
//! │  └─────────────────┘   │  Wave           │   │ SaleSource      │       │
//! │                        │  Card           │   │  Pos            │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format
//! Catalog types mirror the commerce API's JSON: identifiers arrive as
//! `_id`, everything else is camelCase.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01%, so 1800 bps = 18% VAT. Shops that do not
/// charge tax at the register use the zero rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        f64::from(self.0) / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Shop
// =============================================================================

/// Shop configuration for a terminal.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Shop {
    #[serde(rename = "_id")]
    pub id: String,

    /// Display name shown in the register header and on receipts.
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub logo: Option<String>,

    /// Branding colours.
    #[serde(default)]
    pub style: ShopStyle,

    /// Accepted payment methods and currency.
    #[serde(default)]
    pub payment: ShopPayment,

    #[serde(default)]
    pub categories: Vec<Category>,
}

/// Branding colours for a shop.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ShopStyle {
    pub primary_color: String,
    #[serde(default)]
    pub secondary_color: String,
}

impl Default for ShopStyle {
    fn default() -> Self {
        ShopStyle {
            primary_color: "#075E54".to_string(),
            secondary_color: "#128C7E".to_string(),
        }
    }
}

impl ShopStyle {
    /// Secondary colour, falling back to the primary one when unset.
    pub fn secondary_or_primary(&self) -> &str {
        if self.secondary_color.is_empty() {
            &self.primary_color
        } else {
            &self.secondary_color
        }
    }
}

/// Payment settings for a shop, as raw method ids.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ShopPayment {
    #[serde(default)]
    pub methods: Vec<String>,
    #[serde(default)]
    pub currency: String,
}

/// A product category defined by the shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub order: i32,
}

impl Shop {
    /// Categories in display order.
    pub fn sorted_categories(&self) -> Vec<&Category> {
        let mut categories: Vec<&Category> = self.categories.iter().collect();
        categories.sort_by_key(|c| c.order);
        categories
    }

    /// Payment methods this shop accepts at the register.
    ///
    /// Unknown method ids are dropped with a warning. When the shop lists
    /// nothing we recognise, every method is offered.
    pub fn accepted_methods(&self) -> Vec<PaymentMethod> {
        let mut accepted = Vec::new();

        for raw in &self.payment.methods {
            match raw.parse::<PaymentMethod>() {
                Ok(method) if !accepted.contains(&method) => accepted.push(method),
                Ok(_) => {}
                Err(_) => warn!(shop_id = %self.id, method = %raw, "Ignoring unknown payment method"),
            }
        }

        if accepted.is_empty() {
            return PaymentMethod::ALL.to_vec();
        }

        accepted.sort();
        accepted
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: String,

    /// Display name shown to cashier and on receipt.
    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Base price, used when the product has no variants.
    pub price: Money,

    /// Stock level of the base product.
    #[serde(default)]
    pub stock: i64,

    #[serde(default)]
    pub images: Vec<String>,

    /// Category name, matched exactly by the catalog filter.
    #[serde(default)]
    pub category: String,

    #[serde(default)]
    pub has_variants: bool,

    #[serde(default)]
    pub variants: Vec<Variant>,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Product {
    /// True when a variant must be chosen before the product can be sold.
    ///
    /// A product flagged `hasVariants` with an empty variant list is sold
    /// as its base product.
    pub fn requires_variant(&self) -> bool {
        self.has_variants && !self.variants.is_empty()
    }

    /// Looks up one of this product's variants.
    pub fn variant(&self, variant_id: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.id == variant_id)
    }

    /// First product image, if any.
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

/// A purchasable variant of a product (size, colour, ...).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub price: Money,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub images: Vec<String>,
}

// =============================================================================
// Cashier
// =============================================================================

/// An operator profile that may sign in to a terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Cashier {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Cashier {
    /// First word of the cashier's name, used in the PIN greeting.
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }
}

fn default_true() -> bool {
    true
}

// =============================================================================
// Payment Method
// =============================================================================

/// A way of tendering money at the register.
///
/// The ordering of the variants is the display order of the tender panel,
/// and the iteration order of a [`crate::payment::PaymentAllocation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash.
    Cash,
    /// Orange Money mobile wallet.
    OrangeMoney,
    /// Wave mobile wallet.
    Wave,
    /// Card on an external terminal.
    Card,
}

/// Display metadata for a payment method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodInfo {
    pub id: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
}

impl PaymentMethod {
    /// Every method, in display order.
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::Cash,
        PaymentMethod::OrangeMoney,
        PaymentMethod::Wave,
        PaymentMethod::Card,
    ];

    /// Wire identifier (`cash`, `orange_money`, `wave`, `card`).
    pub const fn id(&self) -> &'static str {
        self.info().id
    }

    /// Display metadata for the tender panel.
    pub const fn info(&self) -> PaymentMethodInfo {
        match self {
            PaymentMethod::Cash => PaymentMethodInfo {
                id: "cash",
                label: "Espèces",
                icon: "cash",
                color: "#000000",
            },
            PaymentMethod::OrangeMoney => PaymentMethodInfo {
                id: "orange_money",
                label: "Orange Money",
                icon: "om",
                color: "#ff6600",
            },
            PaymentMethod::Wave => PaymentMethodInfo {
                id: "wave",
                label: "Wave",
                icon: "wave",
                color: "#1e88e5",
            },
            PaymentMethod::Card => PaymentMethodInfo {
                id: "card",
                label: "Carte",
                icon: "card",
                color: "#6366f1",
            },
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        PaymentMethod::ALL
            .into_iter()
            .find(|m| m.id() == wanted)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "payment method".to_string(),
                allowed: PaymentMethod::ALL.iter().map(|m| m.id().to_string()).collect(),
            })
    }
}

// =============================================================================
// Transaction (write side)
// =============================================================================

/// Payment status marker sent with every register sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Fully paid at the register.
    Paid,
}

/// Channel a sale originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleSource {
    /// Point of sale terminal.
    Pos,
}

/// A line item in a transaction.
/// Uses snapshot pattern to freeze cart data at time of sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TransactionLine {
    pub product_id: String,
    pub variant_id: Option<String>,
    pub name: String,
    /// Variant label at time of sale.
    pub variant: Option<String>,
    pub quantity: i64,
    pub unit_price: Money,
    /// unit_price × quantity
    pub total_price: Money,
}

/// Amount tendered through one payment method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TenderEntry {
    pub method: PaymentMethod,
    pub amount: Money,
}

/// The payload POSTed to the commerce API to commit a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub cashier_id: String,
    pub items: Vec<TransactionLine>,
    pub subtotal: Money,
    pub tax: Money,
    pub discount: Money,
    /// Total due after tax and discount.
    pub total_amount: Money,
    /// Non-zero allocations only.
    pub payments: Vec<TenderEntry>,
    /// Sum of every allocation.
    pub cash_given: Money,
    pub change: Money,
    pub payment_status: PaymentStatus,
    pub source: SaleSource,
}

/// What the commerce API returns for a committed sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub transaction_number: String,
    pub total_amount: Money,
    #[serde(default)]
    pub change: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

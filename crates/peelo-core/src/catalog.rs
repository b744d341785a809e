//! # Catalog Store
//!
//! Holds the product snapshot fetched for a terminal and answers the
//! register's browse queries.
//!
//! ## Load Status
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  NotLoaded ──► load ok ──────► Loaded  (products may be empty)          │
//! │      │                                                                  │
//! │      └──────► load error ────► Failed { reason }  (products empty)      │
//! │                                                                         │
//! │  An empty shop and an unreachable API look the same as a product list,  │
//! │  so the status is kept next to the products and shown to the cashier.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The store never mutates fetched products: filtering returns borrowed
//! views in catalog order.

use serde::Serialize;
use ts_rs::TS;

use crate::types::Product;

/// Outcome of the most recent catalog load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CatalogStatus {
    /// Nothing fetched yet.
    NotLoaded,
    /// Snapshot fetched successfully.
    Loaded,
    /// The fetch failed; products are empty until a reload succeeds.
    Failed { reason: String },
}

/// Tab value that selects every category.
pub const ALL_CATEGORIES: &str = "all";

/// Category side of a catalog query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    /// Every category ("Tout" tab).
    #[default]
    All,
    /// Exact category name.
    Named(String),
}

impl CategoryFilter {
    /// Parses a tab selection; exactly `all` or an empty string means every
    /// category. Any other spelling is a category name.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value == ALL_CATEGORIES {
            CategoryFilter::All
        } else {
            CategoryFilter::Named(value.to_string())
        }
    }

    fn matches(&self, product: &Product) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Named(name) => product.category == *name,
        }
    }
}

/// A browse query: category tab plus search box.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    pub category: CategoryFilter,
    pub search: String,
}

impl CatalogQuery {
    /// Query matching every product.
    pub fn all() -> Self {
        CatalogQuery::default()
    }

    pub fn with_category(mut self, category: CategoryFilter) -> Self {
        self.category = category;
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }
}

/// Filters products by category and case-insensitive title substring.
///
/// ```rust
/// use peelo_core::catalog::{filter_products, CatalogQuery};
///
/// let products: Vec<peelo_core::Product> = Vec::new();
/// assert!(filter_products(&products, &CatalogQuery::all().with_search("x")).is_empty());
/// ```
pub fn filter_products<'a>(products: &'a [Product], query: &CatalogQuery) -> Vec<&'a Product> {
    let needle = query.search.trim().to_lowercase();

    products
        .iter()
        .filter(|p| query.category.matches(p))
        .filter(|p| needle.is_empty() || p.title.to_lowercase().contains(&needle))
        .collect()
}

/// The fetched product snapshot for a terminal.
#[derive(Debug, Clone)]
pub struct Catalog {
    products: Vec<Product>,
    status: CatalogStatus,
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog::new()
    }
}

impl Catalog {
    /// An empty catalog that has not been loaded.
    pub fn new() -> Self {
        Catalog {
            products: Vec::new(),
            status: CatalogStatus::NotLoaded,
        }
    }

    /// Replaces the snapshot after a successful fetch.
    pub fn loaded(&mut self, products: Vec<Product>) {
        self.products = products;
        self.status = CatalogStatus::Loaded;
    }

    /// Records a failed fetch. Previously held products are dropped.
    pub fn failed(&mut self, reason: impl Into<String>) {
        self.products.clear();
        self.status = CatalogStatus::Failed {
            reason: reason.into(),
        };
    }

    /// Forgets the snapshot (terminal teardown).
    pub fn reset(&mut self) {
        *self = Catalog::new();
    }

    pub fn status(&self) -> &CatalogStatus {
        &self.status
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, CatalogStatus::Failed { .. })
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn find(&self, product_id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == product_id)
    }

    pub fn filter(&self, query: &CatalogQuery) -> Vec<&Product> {
        filter_products(&self.products, query)
    }

    /// Distinct product categories, in first-seen order.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for product in &self.products {
            if !product.category.is_empty() && !seen.contains(&product.category.as_str()) {
                seen.push(&product.category);
            }
        }
        seen
    }
}

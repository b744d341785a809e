//! # Catalog Commands
//!
//! Fetching the product snapshot and browsing it.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  [Tout] [Boissons] [Desserts] [Mode]        🔍 "bis"                    │
//! │                                                                         │
//! │  browse("Boissons", "bis")                                              │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  exact category match ──► case-insensitive title match ──► products     │
//! │                                                                         │
//! │  When the last load failed, `status` is Failed and products are empty. │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tracing::{debug, info, warn};

use peelo_api::CommerceApi;
use peelo_core::catalog::{CatalogQuery, CatalogStatus, CategoryFilter};
use peelo_core::validation::validate_search_query;
use peelo_core::{Category, Product};

use crate::error::{AppError, AppResult};
use crate::state::Register;

/// Products shown on the catalog grid.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogView {
    pub status: CatalogStatus,
    /// Category tabs derived from the products, first-seen order.
    pub categories: Vec<String>,
    pub products: Vec<Product>,
}

/// (Re)loads the product snapshot for the current terminal.
///
/// ## Errors
/// - `NOT_AUTHENTICATED` without a signed-in cashier
/// - `LOAD_FAILED` when the fetch fails; the catalog is then empty and
///   its status is `Failed`
pub async fn load_catalog<A: CommerceApi>(register: &mut Register<A>) -> AppResult<CatalogView> {
    debug!("load_catalog command");
    register.require_cashier()?;

    let terminal_id = register.session.terminal_id().to_string();
    match register.api.get_products(&terminal_id).await {
        Ok(products) => {
            info!(terminal_id = %terminal_id, count = products.len(), "Catalog loaded");
            register.catalog.loaded(products);
        }
        Err(e) => {
            warn!(terminal_id = %terminal_id, error = %e, "Catalog load failed");
            let err = AppError::load_failed("products", &e);
            register.catalog.failed(err.message.clone());
            return Err(err);
        }
    }

    browse(register, "", "")
}

/// Filters the loaded catalog.
///
/// `category` is a tab name, or empty / `all` for every category.
pub fn browse<A: CommerceApi>(
    register: &Register<A>,
    category: &str,
    search: &str,
) -> AppResult<CatalogView> {
    debug!(category = %category, search = %search, "browse command");
    register.require_cashier()?;

    let search = validate_search_query(search)?;
    let query = CatalogQuery::all()
        .with_category(CategoryFilter::parse(category))
        .with_search(search);

    let catalog = &register.catalog;
    Ok(CatalogView {
        status: catalog.status().clone(),
        categories: catalog.categories().into_iter().map(String::from).collect(),
        products: catalog.filter(&query).into_iter().cloned().collect(),
    })
}

/// The shop's own category list, by display order.
pub fn shop_categories<A: CommerceApi>(register: &Register<A>) -> Vec<Category> {
    register
        .session
        .shop()
        .map(|shop| shop.sorted_categories().into_iter().cloned().collect())
        .unwrap_or_default()
}

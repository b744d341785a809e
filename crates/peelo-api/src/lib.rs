//! # peelo-api: Commerce API Client for Peelo POS
//!
//! The register never talks HTTP itself. It holds something implementing
//! [`CommerceApi`]; in production that is [`CommerceClient`], in tests an
//! in-memory fake.
//!
//! ## Call Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Terminal entry ──► get_shop ─┐                                         │
//! │                               ├─► (concurrent)                          │
//! │                  get_cashiers ┘                                         │
//! │                                                                         │
//! │  PIN entered ─────► verify_pin ──► get_products                         │
//! │                                                                         │
//! │  Tender covered ──► create_transaction                                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//! - [`client`] - reqwest implementation
//! - [`config`] - base URL and timeout
//! - [`error`] - `ClientError`

pub mod client;
pub mod config;
pub mod error;

pub use client::CommerceClient;
pub use config::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
pub use error::{ClientError, ClientResult};

use peelo_core::types::{Cashier, Product, Shop, TransactionRequest, TransactionResponse};

/// Operations the register needs from the commerce backend.
///
/// One request per call, no retries.
pub trait CommerceApi {
    /// Shop configuration for a terminal, `None` when it does not exist.
    async fn get_shop(&self, terminal_id: &str) -> ClientResult<Option<Shop>>;

    /// Products sold on a terminal.
    async fn get_products(&self, terminal_id: &str) -> ClientResult<Vec<Product>>;

    /// Cashiers allowed to sign in on a terminal.
    async fn get_cashiers(&self, terminal_id: &str) -> ClientResult<Vec<Cashier>>;

    /// Checks a cashier's PIN. `Ok(false)` means the PIN is wrong.
    async fn verify_pin(&self, cashier_id: &str, pin: &str) -> ClientResult<bool>;

    /// Commits a sale.
    async fn create_transaction(
        &self,
        terminal_id: &str,
        request: &TransactionRequest,
    ) -> ClientResult<TransactionResponse>;
}

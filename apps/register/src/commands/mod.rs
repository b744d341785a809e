//! # Register Commands
//!
//! Every operation the cashier can trigger.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs       ◄─── You are here (exports)
//! ├── login.rs     ◄─── Terminal entry, cashier selection, PIN, logout
//! ├── catalog.rs   ◄─── Product load and browsing
//! ├── cart.rs      ◄─── Cart manipulation
//! └── checkout.rs  ◄─── Tender panel and submission
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  shell line "add p1"                                                    │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  commands::add_to_cart(&mut register, "p1", None)                       │
//! │         │                                                               │
//! │         ├── guard: cashier signed in, no submission in flight           │
//! │         ├── peelo-core does the work                                    │
//! │         ▼                                                               │
//! │  Result<CartResponse, AppError>  (both serializable)                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod login;

pub use cart::{add_to_cart, adjust_quantity, clear_cart, get_cart, remove_from_cart, CartResponse};
pub use catalog::{browse, load_catalog, shop_categories, CatalogView};
pub use checkout::{
    abandon_submission, add_tender, clear_tender, close_checkout, fill_exact, new_sale,
    open_checkout, press_tender_digits, set_tender, submit, tender_backspace, tender_view,
    TenderView,
};
pub use login::{
    enter_terminal, logout, pin_backspace, pin_clear, press_pin, select_cashier, submit_pin,
    terminal_view, LoginView, PinView, TerminalView,
};

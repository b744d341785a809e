//! # State Module
//!
//! The register's application state, passed explicitly to every command.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Register<A: CommerceApi>                             │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────────────────┐  │
//! │  │   Session    │  │   Roster     │  │   PinPad                     │  │
//! │  │  terminal    │  │  cashiers    │  │   selected cashier + digits  │  │
//! │  │  shop        │  │  load error  │  │                              │  │
//! │  │  cashier     │  │              │  │                              │  │
//! │  └──────────────┘  └──────────────┘  └──────────────────────────────┘  │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐  ┌────────────┐  │
//! │  │   Catalog    │  │    Cart      │  │  Allocation  │  │  Checkout  │  │
//! │  └──────────────┘  └──────────────┘  └──────────────┘  └────────────┘  │
//! │                                                                         │
//! │  OWNERSHIP:                                                            │
//! │  • Every command takes `&mut Register`, so commands never interleave.  │
//! │  • A submission holds the checkout in `Submitting` until it resolves   │
//! │    or is explicitly abandoned.                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;

pub use config::{ConfigError, ConfigResult, PricingSettings, RegisterConfig, TerminalSettings};

use tracing::info;

use peelo_api::CommerceApi;
use peelo_core::cart::Cart;
use peelo_core::catalog::Catalog;
use peelo_core::checkout::{Checkout, CheckoutPhase, CheckoutTotals};
use peelo_core::payment::PaymentAllocation;
use peelo_core::session::{PinPad, Session};
use peelo_core::Cashier;

use crate::error::{AppError, AppResult};

/// Everything one register terminal holds in memory.
pub struct Register<A> {
    pub(crate) api: A,
    pub(crate) config: RegisterConfig,
    pub(crate) session: Session,
    pub(crate) roster: Vec<Cashier>,
    pub(crate) roster_error: Option<String>,
    pub(crate) selected_cashier: Option<String>,
    pub(crate) pin_pad: PinPad,
    pub(crate) catalog: Catalog,
    pub(crate) cart: Cart,
    pub(crate) allocation: PaymentAllocation,
    pub(crate) checkout: Checkout,
}

impl<A: CommerceApi> Register<A> {
    /// Creates the register for the configured terminal.
    ///
    /// Nothing is fetched yet; call `commands::enter_terminal` next.
    pub fn new(api: A, config: RegisterConfig) -> AppResult<Self> {
        let session = Session::init(config.terminal_id())?;

        Ok(Register {
            api,
            config,
            session,
            roster: Vec::new(),
            roster_error: None,
            selected_cashier: None,
            pin_pad: PinPad::new(),
            catalog: Catalog::new(),
            cart: Cart::new(),
            allocation: PaymentAllocation::new(),
            checkout: Checkout::new(),
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn config(&self) -> &RegisterConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn roster(&self) -> &[Cashier] {
        &self.roster
    }

    pub fn roster_error(&self) -> Option<&str> {
        self.roster_error.as_deref()
    }

    pub fn pin_pad(&self) -> &PinPad {
        &self.pin_pad
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn allocation(&self) -> &PaymentAllocation {
        &self.allocation
    }

    pub fn phase(&self) -> &CheckoutPhase {
        self.checkout.phase()
    }

    /// Subtotal, tax and total due for the current cart.
    pub fn totals(&self) -> CheckoutTotals {
        CheckoutTotals::for_cart(&self.cart, self.config.tax_rate())
    }

    // =========================================================================
    // Guards
    // =========================================================================

    /// The signed-in cashier, or `NOT_AUTHENTICATED`.
    pub(crate) fn require_cashier(&self) -> AppResult<&Cashier> {
        Ok(self.session.require_cashier()?)
    }

    /// Refuses anything that would change the sale while it is in flight.
    pub(crate) fn ensure_idle(&self) -> AppResult<()> {
        if self.checkout.is_submitting() {
            return Err(AppError::submission_pending());
        }
        Ok(())
    }

    /// Gate for cart and tender edits.
    ///
    /// A committed sale is left behind automatically: the next edit starts
    /// a new one.
    pub(crate) fn begin_edit(&mut self) -> AppResult<()> {
        self.require_cashier()?;
        self.ensure_idle()?;
        self.checkout.new_sale();
        Ok(())
    }

    /// Logout teardown: cashier, sale and catalog are dropped.
    ///
    /// The terminal, shop and roster stay so the next cashier can sign in.
    pub(crate) fn teardown(&mut self) -> Option<Cashier> {
        let cashier = self.session.teardown();

        self.cart.clear();
        self.allocation.reset();
        self.checkout.reset();
        self.catalog.reset();
        self.pin_pad.clear();
        self.selected_cashier = None;

        if let Some(cashier) = &cashier {
            info!(cashier_id = %cashier.id, "Cashier signed out");
        }
        cashier
    }
}

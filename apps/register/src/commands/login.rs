//! # Login Commands
//!
//! Terminal entry, cashier selection and PIN sign-in.
//!
//! ## Login Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Login Flow                                           │
//! │                                                                         │
//! │  enter_terminal(id)                                                     │
//! │      ├── get_shop ───────┐   (concurrent)                               │
//! │      └── get_cashiers ───┘                                              │
//! │             │                                                           │
//! │             ▼                                                           │
//! │  select_cashier(id) ──► PIN pad cleared                                 │
//! │             │                                                           │
//! │             ▼                                                           │
//! │  press_pin("1") ×4                                                      │
//! │             │                                                           │
//! │             ▼                                                           │
//! │  submit_pin ──► verify_pin ──┬── true  ──► sign in ──► load catalog     │
//! │                              ├── false ──► INCORRECT_PIN                │
//! │                              └── error ──► INCORRECT_PIN (warn logged)  │
//! │                                                                         │
//! │  The PIN pad is empty after every verification attempt.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tracing::{debug, info, warn};

use peelo_api::CommerceApi;
use peelo_core::catalog::CatalogStatus;
use peelo_core::session::Session;
use peelo_core::{Cashier, PaymentMethodInfo, Shop};

use crate::commands::catalog::load_catalog;
use crate::error::{AppError, AppResult};
use crate::state::Register;

/// What the cashier-selection screen shows.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalView {
    pub terminal_id: String,
    pub shop: Option<Shop>,
    pub cashiers: Vec<Cashier>,
    /// Set when the roster could not be fetched.
    pub roster_error: Option<String>,
    pub payment_methods: Vec<PaymentMethodInfo>,
}

impl TerminalView {
    fn from_register<A: CommerceApi>(register: &Register<A>) -> Self {
        TerminalView {
            terminal_id: register.session.terminal_id().to_string(),
            shop: register.session.shop().cloned(),
            cashiers: register.roster.clone(),
            roster_error: register.roster_error.clone(),
            payment_methods: register
                .session
                .accepted_methods()
                .iter()
                .map(|m| m.info())
                .collect(),
        }
    }
}

/// PIN pad state for the selected cashier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PinView {
    pub cashier_id: Option<String>,
    /// "Bonjour Awa"
    pub greeting: Option<String>,
    /// Number of dots to fill.
    pub entered: usize,
    pub complete: bool,
}

impl PinView {
    fn from_register<A: CommerceApi>(register: &Register<A>) -> Self {
        let cashier = register
            .selected_cashier
            .as_deref()
            .and_then(|id| register.roster.iter().find(|c| c.id == id));

        PinView {
            cashier_id: cashier.map(|c| c.id.clone()),
            greeting: cashier.map(|c| format!("Bonjour {}", c.first_name())),
            entered: register.pin_pad.len(),
            complete: register.pin_pad.is_complete(),
        }
    }
}

/// Result of a successful sign-in.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginView {
    pub cashier: Cashier,
    pub shop_name: String,
    /// A failed catalog load does not fail the login.
    pub catalog: CatalogStatus,
}

/// Enters a terminal: loads its shop and cashier roster.
///
/// `terminal_id` defaults to the configured terminal. Entering a terminal
/// signs out whoever was signed in.
///
/// ## Errors
/// - `VALIDATION_ERROR` for a malformed terminal id
/// - `NOT_FOUND` when the terminal has no shop
/// - `LOAD_FAILED` when the shop could not be fetched
///
/// A roster failure is not an error: the roster is empty and
/// `rosterError` says why.
pub async fn enter_terminal<A: CommerceApi>(
    register: &mut Register<A>,
    terminal_id: Option<&str>,
) -> AppResult<TerminalView> {
    debug!(terminal_id = ?terminal_id, "enter_terminal command");
    register.ensure_idle()?;

    let requested = terminal_id.unwrap_or(register.config.terminal_id()).to_string();
    let mut session = Session::init(&requested)?;

    register.teardown();
    register.roster.clear();
    register.roster_error = None;

    let api = &register.api;
    let (shop, roster) = tokio::join!(
        api.get_shop(session.terminal_id()),
        api.get_cashiers(session.terminal_id())
    );

    match shop {
        Ok(Some(shop)) => session.set_shop(shop),
        Ok(None) => return Err(AppError::not_found("Shop", session.terminal_id())),
        Err(e) => {
            warn!(terminal_id = %session.terminal_id(), error = %e, "Shop load failed");
            return Err(AppError::load_failed("shop", &e));
        }
    }

    // Session and roster always belong to the same terminal.
    let (cashiers, roster_error): (Vec<Cashier>, Option<String>) = match roster {
        Ok(cashiers) => (cashiers.into_iter().filter(|c| c.is_active).collect(), None),
        Err(e) => {
            warn!(terminal_id = %session.terminal_id(), error = %e, "Cashier roster load failed");
            (Vec::new(), Some(AppError::load_failed("cashiers", &e).message))
        }
    };

    info!(
        terminal_id = %session.terminal_id(),
        shop = %session.shop_name(),
        cashiers = cashiers.len(),
        "Terminal entered"
    );
    register.session = session;
    register.roster = cashiers;
    register.roster_error = roster_error;

    Ok(TerminalView::from_register(register))
}

/// Current terminal screen without refetching.
pub fn terminal_view<A: CommerceApi>(register: &Register<A>) -> TerminalView {
    TerminalView::from_register(register)
}

/// Picks a cashier from the roster and resets the PIN pad.
pub fn select_cashier<A: CommerceApi>(
    register: &mut Register<A>,
    cashier_id: &str,
) -> AppResult<PinView> {
    debug!(cashier_id = %cashier_id, "select_cashier command");

    if !register.roster.iter().any(|c| c.id == cashier_id) {
        return Err(AppError::not_found("Cashier", cashier_id));
    }

    register.selected_cashier = Some(cashier_id.to_string());
    register.pin_pad.clear();

    Ok(PinView::from_register(register))
}

/// Appends digits to the PIN pad. Digits past the fourth are dropped.
pub fn press_pin<A: CommerceApi>(register: &mut Register<A>, keys: &str) -> AppResult<PinView> {
    debug!(digits = keys.len(), "press_pin command");
    register.pin_pad.press(keys)?;
    Ok(PinView::from_register(register))
}

pub fn pin_backspace<A: CommerceApi>(register: &mut Register<A>) -> PinView {
    register.pin_pad.backspace();
    PinView::from_register(register)
}

pub fn pin_clear<A: CommerceApi>(register: &mut Register<A>) -> PinView {
    register.pin_pad.clear();
    PinView::from_register(register)
}

/// Verifies the entered PIN and signs the selected cashier in.
///
/// ## Behavior
/// - Nothing is sent until exactly four digits are entered
/// - The PIN pad is cleared after every verification attempt
/// - An unreachable verifier is treated as a wrong PIN, never as success
/// - On success the catalog is loaded; a catalog failure is reported in
///   the returned view, not as an error
pub async fn submit_pin<A: CommerceApi>(register: &mut Register<A>) -> AppResult<LoginView> {
    debug!("submit_pin command");
    register.ensure_idle()?;

    let cashier = register
        .selected_cashier
        .as_deref()
        .and_then(|id| register.roster.iter().find(|c| c.id == id))
        .cloned()
        .ok_or_else(|| AppError::validation("Select a cashier first"))?;

    if !register.pin_pad.is_complete() {
        return Err(AppError::validation("PIN must have 4 digits"));
    }

    let pin = register.pin_pad.as_str().to_string();
    register.pin_pad.clear();

    match register.api.verify_pin(&cashier.id, &pin).await {
        Ok(true) => {}
        Ok(false) => {
            info!(cashier_id = %cashier.id, "PIN rejected");
            return Err(AppError::incorrect_pin());
        }
        Err(e) => {
            warn!(cashier_id = %cashier.id, error = %e, "PIN verification unreachable");
            return Err(AppError::incorrect_pin());
        }
    }

    if register.session.is_authenticated() {
        register.teardown();
    }
    register.session.sign_in(cashier.clone());
    register.selected_cashier = None;
    info!(cashier_id = %cashier.id, terminal_id = %register.session.terminal_id(), "Cashier signed in");

    if let Err(e) = load_catalog(register).await {
        debug!(error = %e, "Continuing sign-in without a catalog");
    }

    Ok(LoginView {
        cashier,
        shop_name: register.session.shop_name().to_string(),
        catalog: register.catalog.status().clone(),
    })
}

/// Signs the cashier out and drops the sale.
///
/// Refused while a transaction is in flight.
pub fn logout<A: CommerceApi>(register: &mut Register<A>) -> AppResult<Option<Cashier>> {
    debug!("logout command");
    register.ensure_idle()?;
    Ok(register.teardown())
}

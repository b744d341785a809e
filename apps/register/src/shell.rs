//! # Register Shell
//!
//! A line-driven front-end over the register commands. One line in, one
//! rendered screen out.
//!
//! ```text
//! > cashier c1
//! Bonjour Awa (0/4)
//! > pin 1234
//! Bonjour Awa (4/4)
//! > login
//! Awa Ndiaye connecté(e) · Boutique Teranga · catalogue chargé
//! > add p1
//!   p1-base  Bissap 50cl          x1     2 500 F
//!   Total                                2 500 F
//! > chip cash 5000
//! > submit
//! Vente TRX-0001 · 2 500 F · Monnaie à rendre: 2 500 F
//! ```

use std::fmt::Write as _;
use std::str::FromStr;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::debug;

use peelo_api::CommerceApi;
use peelo_core::catalog::CatalogStatus;
use peelo_core::receipt::Receipt;
use peelo_core::{Money, PaymentMethod};

use crate::commands::{self, CartResponse, CatalogView, PinView, TenderView, TerminalView};
use crate::error::{AppError, AppResult};
use crate::state::Register;

const HELP: &str = "\
Commandes:
  terminal [id]            entrer dans un terminal
  cashiers                 liste des caissiers
  cashier <id>             choisir un caissier
  pin <chiffres>           saisir le code PIN
  pin-back | pin-clear     corriger le code PIN
  login                    valider le code PIN
  logout                   se déconnecter
  reload                   recharger le catalogue
  products [catégorie]     parcourir le catalogue
  search <texte>           chercher un produit
  categories               catégories de la boutique
  add <produit> [variante] ajouter au panier
  qty <ligne> <+/-n>       modifier la quantité
  rm <ligne>               retirer une ligne
  clear                    vider le panier
  cart                     afficher le panier
  checkout                 ouvrir l'encaissement
  pay <méthode> <montant>  montant exact pour une méthode
  chip <méthode> <montant> ajouter un montant rapide
  exact <méthode>          compléter avec une méthode
  keys <méthode> <chiffres> saisie clavier
  back <méthode>           effacer le dernier chiffre
  void <méthode>           annuler une méthode
  tender                   afficher l'encaissement
  submit                   valider la vente
  close                    fermer l'encaissement
  abandon                  abandonner une soumission bloquée
  new                      nouvelle vente
  quit                     quitter";

// =============================================================================
// Parsing
// =============================================================================

/// One parsed shell line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Help,
    Terminal(Option<String>),
    Cashiers,
    SelectCashier(String),
    Pin(String),
    PinBackspace,
    PinClear,
    Login,
    Logout,
    Reload,
    Products(Option<String>),
    Search(String),
    Categories,
    Add {
        product_id: String,
        variant_id: Option<String>,
    },
    Quantity {
        key: String,
        delta: i64,
    },
    Remove(String),
    Clear,
    Cart,
    Checkout,
    Pay(PaymentMethod, Money),
    Chip(PaymentMethod, Money),
    Exact(PaymentMethod),
    Keys(PaymentMethod, String),
    Back(PaymentMethod),
    Void(PaymentMethod),
    Tender,
    Submit,
    Close,
    Abandon,
    NewSale,
    Quit,
}

fn arg<'a>(args: &[&'a str], idx: usize, name: &str) -> AppResult<&'a str> {
    args.get(idx)
        .copied()
        .ok_or_else(|| AppError::validation(format!("Missing argument: {}", name)))
}

fn method_arg(args: &[&str], idx: usize) -> AppResult<PaymentMethod> {
    Ok(arg(args, idx, "méthode")?.parse::<PaymentMethod>()?)
}

fn number_arg(args: &[&str], idx: usize, name: &str) -> AppResult<i64> {
    let raw = arg(args, idx, name)?;
    raw.trim_start_matches('+')
        .parse::<i64>()
        .map_err(|_| AppError::validation(format!("{} must be a whole number: {}", name, raw)))
}

impl FromStr for ShellCommand {
    type Err = AppError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let verb = words
            .next()
            .ok_or_else(|| AppError::validation("Empty command"))?
            .to_lowercase();
        let args: Vec<&str> = words.collect();
        let rest = || args.join(" ");

        let command = match verb.as_str() {
            "help" | "?" => ShellCommand::Help,
            "terminal" => ShellCommand::Terminal(args.first().map(|s| s.to_string())),
            "cashiers" => ShellCommand::Cashiers,
            "cashier" => ShellCommand::SelectCashier(arg(&args, 0, "caissier")?.to_string()),
            "pin" => ShellCommand::Pin(arg(&args, 0, "chiffres")?.to_string()),
            "pin-back" => ShellCommand::PinBackspace,
            "pin-clear" => ShellCommand::PinClear,
            "login" => ShellCommand::Login,
            "logout" => ShellCommand::Logout,
            "reload" => ShellCommand::Reload,
            "products" => ShellCommand::Products((!args.is_empty()).then(rest)),
            "search" => ShellCommand::Search(rest()),
            "categories" => ShellCommand::Categories,
            "add" => ShellCommand::Add {
                product_id: arg(&args, 0, "produit")?.to_string(),
                variant_id: args.get(1).map(|s| s.to_string()),
            },
            "qty" => ShellCommand::Quantity {
                key: arg(&args, 0, "ligne")?.to_string(),
                delta: number_arg(&args, 1, "quantité")?,
            },
            "rm" => ShellCommand::Remove(arg(&args, 0, "ligne")?.to_string()),
            "clear" => ShellCommand::Clear,
            "cart" => ShellCommand::Cart,
            "checkout" => ShellCommand::Checkout,
            "pay" => ShellCommand::Pay(
                method_arg(&args, 0)?,
                Money::from_units(number_arg(&args, 1, "montant")?),
            ),
            "chip" => ShellCommand::Chip(
                method_arg(&args, 0)?,
                Money::from_units(number_arg(&args, 1, "montant")?),
            ),
            "exact" => ShellCommand::Exact(method_arg(&args, 0)?),
            "keys" => ShellCommand::Keys(method_arg(&args, 0)?, arg(&args, 1, "chiffres")?.to_string()),
            "back" => ShellCommand::Back(method_arg(&args, 0)?),
            "void" => ShellCommand::Void(method_arg(&args, 0)?),
            "tender" => ShellCommand::Tender,
            "submit" => ShellCommand::Submit,
            "close" => ShellCommand::Close,
            "abandon" => ShellCommand::Abandon,
            "new" => ShellCommand::NewSale,
            "quit" | "exit" => ShellCommand::Quit,
            other => {
                return Err(AppError::validation(format!(
                    "Unknown command: {} (try `help`)",
                    other
                )))
            }
        };

        Ok(command)
    }
}

// =============================================================================
// Shell
// =============================================================================

/// What one line produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Output(String),
    Quit,
}

/// Owns the register and renders command results as text.
pub struct Shell<A> {
    register: Register<A>,
}

impl<A: CommerceApi> Shell<A> {
    pub fn new(register: Register<A>) -> Self {
        Shell { register }
    }

    pub fn register(&self) -> &Register<A> {
        &self.register
    }

    /// Reads stdin until `quit` or EOF.
    pub async fn run(&mut self) -> AppResult<()> {
        let mut stdout = tokio::io::stdout();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        let banner = match commands::enter_terminal(&mut self.register, None).await {
            Ok(view) => self.render_terminal(&view),
            Err(e) => render_error(&e),
        };
        write_out(&mut stdout, &format!("{}\n(help pour l'aide)\n", banner)).await?;

        loop {
            write_out(&mut stdout, "> ").await?;

            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => return Err(AppError::internal(format!("stdin: {}", e))),
            };

            if line.trim().is_empty() {
                continue;
            }

            match self.execute(&line).await {
                Step::Output(text) => write_out(&mut stdout, &format!("{}\n", text)).await?,
                Step::Quit => break,
            }
        }

        if self.register.session().is_authenticated() {
            if let Err(e) = commands::logout(&mut self.register) {
                write_out(&mut stdout, &format!("{}\n", render_error(&e))).await?;
            }
        }
        Ok(())
    }

    /// Runs one line. Errors are rendered, never propagated.
    pub async fn execute(&mut self, line: &str) -> Step {
        debug!(line = %line, "shell line");

        let command = match line.parse::<ShellCommand>() {
            Ok(command) => command,
            Err(e) => return Step::Output(render_error(&e)),
        };

        if command == ShellCommand::Quit {
            return Step::Quit;
        }

        match self.dispatch(command).await {
            Ok(text) => Step::Output(text),
            Err(e) => Step::Output(render_error(&e)),
        }
    }

    async fn dispatch(&mut self, command: ShellCommand) -> AppResult<String> {
        let reg = &mut self.register;

        let text = match command {
            ShellCommand::Help => HELP.to_string(),
            ShellCommand::Terminal(id) => {
                let view = commands::enter_terminal(reg, id.as_deref()).await?;
                self.render_terminal(&view)
            }
            ShellCommand::Cashiers => {
                let view = commands::terminal_view(reg);
                self.render_terminal(&view)
            }
            ShellCommand::SelectCashier(id) => render_pin(&commands::select_cashier(reg, &id)?),
            ShellCommand::Pin(keys) => render_pin(&commands::press_pin(reg, &keys)?),
            ShellCommand::PinBackspace => render_pin(&commands::pin_backspace(reg)),
            ShellCommand::PinClear => render_pin(&commands::pin_clear(reg)),
            ShellCommand::Login => {
                let view = commands::submit_pin(reg).await?;
                let catalog = match &view.catalog {
                    CatalogStatus::Loaded => "catalogue chargé".to_string(),
                    CatalogStatus::NotLoaded => "catalogue non chargé".to_string(),
                    CatalogStatus::Failed { reason } => format!("catalogue indisponible ({})", reason),
                };
                format!("{} connecté(e) · {} · {}", view.cashier.name, view.shop_name, catalog)
            }
            ShellCommand::Logout => match commands::logout(reg)? {
                Some(cashier) => format!("Au revoir {}", cashier.first_name()),
                None => "Aucun caissier connecté".to_string(),
            },
            ShellCommand::Reload => {
                let view = commands::load_catalog(reg).await?;
                self.render_catalog(&view)
            }
            ShellCommand::Products(category) => {
                let view = commands::browse(reg, category.as_deref().unwrap_or(""), "")?;
                self.render_catalog(&view)
            }
            ShellCommand::Search(text) => {
                let view = commands::browse(reg, "", &text)?;
                self.render_catalog(&view)
            }
            ShellCommand::Categories => {
                let names: Vec<String> = commands::shop_categories(reg)
                    .into_iter()
                    .map(|c| c.name)
                    .collect();
                if names.is_empty() {
                    "Aucune catégorie".to_string()
                } else {
                    names.join(" · ")
                }
            }
            ShellCommand::Add {
                product_id,
                variant_id,
            } => {
                let cart = commands::add_to_cart(reg, &product_id, variant_id.as_deref())?;
                self.render_cart(&cart)
            }
            ShellCommand::Quantity { key, delta } => {
                let cart = commands::adjust_quantity(reg, &key, delta)?;
                self.render_cart(&cart)
            }
            ShellCommand::Remove(key) => {
                let cart = commands::remove_from_cart(reg, &key)?;
                self.render_cart(&cart)
            }
            ShellCommand::Clear => {
                let cart = commands::clear_cart(reg)?;
                self.render_cart(&cart)
            }
            ShellCommand::Cart => {
                let cart = commands::get_cart(reg)?;
                self.render_cart(&cart)
            }
            ShellCommand::Checkout => {
                let view = commands::open_checkout(reg)?;
                self.render_tender(&view)
            }
            ShellCommand::Pay(method, amount) => {
                let view = commands::set_tender(reg, method, amount)?;
                self.render_tender(&view)
            }
            ShellCommand::Chip(method, amount) => {
                let view = commands::add_tender(reg, method, amount)?;
                self.render_tender(&view)
            }
            ShellCommand::Exact(method) => {
                let view = commands::fill_exact(reg, method)?;
                self.render_tender(&view)
            }
            ShellCommand::Keys(method, keys) => {
                let view = commands::press_tender_digits(reg, method, &keys)?;
                self.render_tender(&view)
            }
            ShellCommand::Back(method) => {
                let view = commands::tender_backspace(reg, method)?;
                self.render_tender(&view)
            }
            ShellCommand::Void(method) => {
                let view = commands::clear_tender(reg, method)?;
                self.render_tender(&view)
            }
            ShellCommand::Tender => {
                let view = commands::tender_view(reg)?;
                self.render_tender(&view)
            }
            ShellCommand::Submit => {
                let receipt = commands::submit(reg).await?;
                self.render_receipt(&receipt)
            }
            ShellCommand::Close => {
                let cart = commands::close_checkout(reg)?;
                self.render_cart(&cart)
            }
            ShellCommand::Abandon => {
                let view = commands::abandon_submission(reg)?;
                format!("Soumission abandonnée\n{}", self.render_tender(&view))
            }
            ShellCommand::NewSale => {
                let cart = commands::new_sale(reg)?;
                self.render_cart(&cart)
            }
            ShellCommand::Quit => String::new(),
        };

        Ok(text)
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    fn money(&self, amount: Money) -> String {
        self.register.config().format_currency(amount)
    }

    fn render_terminal(&self, view: &TerminalView) -> String {
        let mut out = String::new();
        let shop = view.shop.as_ref().map(|s| s.name.as_str()).unwrap_or("?");
        let _ = writeln!(out, "{} · terminal {}", shop, view.terminal_id);

        if let Some(reason) = &view.roster_error {
            let _ = writeln!(out, "  Caissiers indisponibles: {}", reason);
        }
        for cashier in &view.cashiers {
            let _ = writeln!(out, "  {:<26} {}", cashier.id, cashier.name);
        }

        let methods: Vec<&str> = view.payment_methods.iter().map(|m| m.label).collect();
        let _ = write!(out, "Paiements: {}", methods.join(", "));
        out
    }

    fn render_catalog(&self, view: &CatalogView) -> String {
        let mut out = String::new();

        if let CatalogStatus::Failed { reason } = &view.status {
            let _ = writeln!(out, "Catalogue indisponible: {}", reason);
        }
        if !view.categories.is_empty() {
            let _ = writeln!(out, "[Tout] [{}]", view.categories.join("] ["));
        }
        if view.products.is_empty() {
            out.push_str("Aucun produit");
            return out;
        }

        for product in &view.products {
            if product.requires_variant() {
                let _ = writeln!(out, "  {:<12} {:<28}", product.id, product.title);
                for variant in &product.variants {
                    let _ = writeln!(
                        out,
                        "    {:<10} {:<26} {:>12}",
                        variant.id,
                        variant.name,
                        self.money(variant.price)
                    );
                }
            } else {
                let _ = writeln!(
                    out,
                    "  {:<12} {:<28} {:>12}",
                    product.id,
                    product.title,
                    self.money(product.price)
                );
            }
        }
        out.trim_end().to_string()
    }

    fn render_cart(&self, cart: &CartResponse) -> String {
        if cart.lines.is_empty() {
            return "Panier vide".to_string();
        }

        let mut out = String::new();
        for line in &cart.lines {
            let name = match &line.variant_label {
                Some(label) => format!("{} ({})", line.name, label),
                None => line.name.clone(),
            };
            let _ = writeln!(
                out,
                "  {:<14} {:<28} x{:<4} {:>12}",
                line.key,
                name,
                line.quantity,
                self.money(line.line_total())
            );
        }

        let totals = &cart.totals;
        if totals.tax.is_positive() {
            let _ = writeln!(out, "  {:<49} {:>12}", "Sous-total", self.money(totals.subtotal));
            let _ = writeln!(out, "  {:<49} {:>12}", "Taxe", self.money(totals.tax));
        }
        let _ = write!(out, "  {:<49} {:>12}", "Total", self.money(totals.total_due));
        out
    }

    fn render_tender(&self, view: &TenderView) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "À payer: {}", self.money(view.totals.total_due));

        for entry in &view.entries {
            let _ = writeln!(
                out,
                "  {:<14} {:>12}",
                entry.method.info().label,
                self.money(entry.amount)
            );
        }

        let allocation = &view.allocation;
        let _ = writeln!(out, "Reçu: {}", self.money(allocation.total_allocated));
        if allocation.remaining.is_positive() {
            let _ = writeln!(out, "Reste: {}", self.money(allocation.remaining));
        }
        if allocation.change.is_positive() {
            let _ = writeln!(out, "Monnaie: {}", self.money(allocation.change));
        }

        let chips: Vec<String> = view.quick_amounts.iter().map(|a| self.money(*a)).collect();
        let _ = writeln!(out, "Montants rapides: {}", chips.join(" | "));
        let _ = write!(
            out,
            "{}",
            if view.can_checkout {
                "Prêt à valider"
            } else {
                "Paiement incomplet"
            }
        );
        out
    }

    fn render_receipt(&self, receipt: &Receipt) -> String {
        let symbol = &self.register.config().pricing.currency_symbol;
        format!(
            "Vente {} · {} · {}",
            receipt.transaction_number,
            self.money(receipt.total),
            receipt.change_message_with(symbol)
        )
    }
}

fn render_pin(view: &PinView) -> String {
    format!(
        "{} ({}/4)",
        view.greeting.as_deref().unwrap_or("Choisissez un caissier"),
        view.entered
    )
}

fn render_error(err: &AppError) -> String {
    format!("Erreur [{:?}]: {}", err.code, err.message)
}

async fn write_out(stdout: &mut tokio::io::Stdout, text: &str) -> AppResult<()> {
    stdout
        .write_all(text.as_bytes())
        .await
        .map_err(|e| AppError::internal(format!("stdout: {}", e)))?;
    stdout
        .flush()
        .await
        .map_err(|e| AppError::internal(format!("stdout: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::register;

    fn output(step: Step) -> String {
        match step {
            Step::Output(text) => text,
            Step::Quit => panic!("unexpected quit"),
        }
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!("help".parse::<ShellCommand>().unwrap(), ShellCommand::Help);
        assert_eq!(
            "ADD p3 v1".parse::<ShellCommand>().unwrap(),
            ShellCommand::Add {
                product_id: "p3".into(),
                variant_id: Some("v1".into()),
            }
        );
        assert_eq!(
            "qty p1-base -2".parse::<ShellCommand>().unwrap(),
            ShellCommand::Quantity {
                key: "p1-base".into(),
                delta: -2,
            }
        );
        assert_eq!(
            "qty p1-base +3".parse::<ShellCommand>().unwrap(),
            ShellCommand::Quantity {
                key: "p1-base".into(),
                delta: 3,
            }
        );
        assert_eq!(
            "chip orange_money 5000".parse::<ShellCommand>().unwrap(),
            ShellCommand::Chip(PaymentMethod::OrangeMoney, Money::from_units(5000))
        );
        assert_eq!(
            "search jus de bouye".parse::<ShellCommand>().unwrap(),
            ShellCommand::Search("jus de bouye".into())
        );
        assert_eq!(
            "products".parse::<ShellCommand>().unwrap(),
            ShellCommand::Products(None)
        );
        assert_eq!("exit".parse::<ShellCommand>().unwrap(), ShellCommand::Quit);
    }

    #[test]
    fn test_parse_errors() {
        assert!("".parse::<ShellCommand>().is_err());
        assert!("dance".parse::<ShellCommand>().is_err());
        assert!("add".parse::<ShellCommand>().is_err());
        assert!("pay bitcoin 100".parse::<ShellCommand>().is_err());
        assert!("pay cash lots".parse::<ShellCommand>().is_err());
    }

    #[tokio::test]
    async fn test_full_sale_through_shell() {
        let mut shell = Shell::new(register());

        let text = output(shell.execute("terminal").await);
        assert!(text.contains("Boutique Teranga"));
        assert!(text.contains("Awa Ndiaye"));

        output(shell.execute("cashier c1").await);
        assert_eq!(output(shell.execute("pin 1234").await), "Bonjour Awa (4/4)");

        let text = output(shell.execute("login").await);
        assert!(text.contains("catalogue chargé"));

        let text = output(shell.execute("add p1").await);
        assert!(text.contains("2 500 F"));

        let text = output(shell.execute("chip cash 5000").await);
        assert!(text.contains("Monnaie: 2 500 F"));
        assert!(text.contains("Prêt à valider"));

        let text = output(shell.execute("submit").await);
        assert_eq!(text, "Vente TRX-0001 · 2 500 F · Monnaie à rendre: 2 500 F");
        assert!(shell.register().cart().is_empty());

        assert_eq!(shell.execute("quit").await, Step::Quit);
    }

    #[tokio::test]
    async fn test_errors_are_rendered() {
        let mut shell = Shell::new(register());
        let text = output(shell.execute("cart").await);
        assert!(text.starts_with("Erreur [NotAuthenticated]"));

        let text = output(shell.execute("frobnicate").await);
        assert!(text.starts_with("Erreur [ValidationError]"));
    }
}

//! In-memory `CommerceApi` for command tests.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;

use peelo_api::{ClientError, ClientResult, CommerceApi};
use peelo_core::{
    Cashier, Money, Product, Shop, ShopPayment, ShopStyle, TransactionRequest,
    TransactionResponse, Variant,
};

use crate::state::{Register, RegisterConfig};

pub const TERMINAL: &str = "69177048073213c297170052";

/// Scripted backend. Flip the public knobs between calls to change outcomes.
pub struct FakeApi {
    pub shop: Option<Shop>,
    pub products: Vec<Product>,
    pub cashiers: Vec<Cashier>,
    /// cashier id → PIN
    pub pins: HashMap<String, String>,
    pub products_unreachable: bool,
    pub cashiers_unreachable: bool,
    pub verify_unreachable: bool,
    pub reject_transactions: bool,
    pub verify_calls: Mutex<Vec<(String, String)>>,
    pub submitted: Mutex<Vec<TransactionRequest>>,
}

fn unreachable(path: &str) -> ClientError {
    ClientError::Transport {
        url: format!("https://api.test/{}", path),
        message: "connection refused".into(),
    }
}

impl Default for FakeApi {
    fn default() -> Self {
        let mut pins = HashMap::new();
        pins.insert("c1".to_string(), "1234".to_string());
        pins.insert("c2".to_string(), "0000".to_string());

        FakeApi {
            shop: Some(shop(&["cash", "wave", "orange_money"])),
            products: vec![
                product("p1", "Bissap 50cl", "Boissons", 2500),
                product("p2", "Thiakry", "Desserts", 1500),
                product_with_variants(
                    "p3",
                    "T-shirt Peelo",
                    vec![variant("v1", "M", 5000), variant("v2", "XL", 6000)],
                ),
            ],
            cashiers: vec![cashier("c1", "Awa Ndiaye"), cashier("c2", "Moussa Fall")],
            pins,
            products_unreachable: false,
            cashiers_unreachable: false,
            verify_unreachable: false,
            reject_transactions: false,
            verify_calls: Mutex::new(Vec::new()),
            submitted: Mutex::new(Vec::new()),
        }
    }
}

impl FakeApi {
    pub fn submitted(&self) -> Vec<TransactionRequest> {
        self.submitted.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn verify_count(&self) -> usize {
        self.verify_calls.lock().map(|c| c.len()).unwrap_or_default()
    }
}

impl CommerceApi for FakeApi {
    async fn get_shop(&self, _terminal_id: &str) -> ClientResult<Option<Shop>> {
        Ok(self.shop.clone())
    }

    async fn get_products(&self, terminal_id: &str) -> ClientResult<Vec<Product>> {
        if self.products_unreachable {
            return Err(unreachable(&format!("chatbots/{}/products", terminal_id)));
        }
        Ok(self.products.clone())
    }

    async fn get_cashiers(&self, terminal_id: &str) -> ClientResult<Vec<Cashier>> {
        if self.cashiers_unreachable {
            return Err(unreachable(&format!("chatbots/{}/cashiers", terminal_id)));
        }
        Ok(self.cashiers.clone())
    }

    async fn verify_pin(&self, cashier_id: &str, pin: &str) -> ClientResult<bool> {
        if let Ok(mut calls) = self.verify_calls.lock() {
            calls.push((cashier_id.to_string(), pin.to_string()));
        }
        if self.verify_unreachable {
            return Err(unreachable(&format!("cashiers/{}/verify-pin", cashier_id)));
        }
        Ok(self.pins.get(cashier_id).map(|p| p == pin).unwrap_or(false))
    }

    async fn create_transaction(
        &self,
        terminal_id: &str,
        request: &TransactionRequest,
    ) -> ClientResult<TransactionResponse> {
        if self.reject_transactions {
            return Err(ClientError::Status {
                status: 500,
                url: format!("https://api.test/chatbots/{}/transactions", terminal_id),
                body: "internal error".into(),
            });
        }

        let mut submitted = self
            .submitted
            .lock()
            .map_err(|_| ClientError::Config("poisoned".into()))?;
        submitted.push(request.clone());

        Ok(TransactionResponse {
            id: format!("tx{}", submitted.len()),
            transaction_number: format!("TRX-{:04}", submitted.len()),
            total_amount: request.total_amount,
            change: request.change,
            created_at: Utc::now(),
        })
    }
}

// =============================================================================
// Fixtures
// =============================================================================

pub fn shop(methods: &[&str]) -> Shop {
    Shop {
        id: "s1".into(),
        name: "Boutique Teranga".into(),
        description: None,
        logo: None,
        style: ShopStyle::default(),
        payment: ShopPayment {
            methods: methods.iter().map(|m| m.to_string()).collect(),
            currency: "XOF".into(),
        },
        categories: Vec::new(),
    }
}

pub fn cashier(id: &str, name: &str) -> Cashier {
    Cashier {
        id: id.into(),
        name: name.into(),
        role: "cashier".into(),
        avatar: None,
        is_active: true,
    }
}

pub fn product(id: &str, title: &str, category: &str, price: i64) -> Product {
    Product {
        id: id.into(),
        title: title.into(),
        description: String::new(),
        price: Money::from_units(price),
        stock: 10,
        images: vec![format!("{}.png", id)],
        category: category.into(),
        has_variants: false,
        variants: Vec::new(),
        is_active: true,
    }
}

pub fn variant(id: &str, name: &str, price: i64) -> Variant {
    Variant {
        id: id.into(),
        name: name.into(),
        price: Money::from_units(price),
        stock: 3,
        images: Vec::new(),
    }
}

pub fn product_with_variants(id: &str, title: &str, variants: Vec<Variant>) -> Product {
    Product {
        has_variants: true,
        variants,
        ..product(id, title, "Mode", 0)
    }
}

pub fn config() -> RegisterConfig {
    let mut config = RegisterConfig::default();
    config.terminal.id = TERMINAL.into();
    config
}

pub fn register() -> Register<FakeApi> {
    register_with(FakeApi::default())
}

pub fn register_with(api: FakeApi) -> Register<FakeApi> {
    match Register::new(api, config()) {
        Ok(register) => register,
        Err(e) => panic!("test register: {}", e),
    }
}

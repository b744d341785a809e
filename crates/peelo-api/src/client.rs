//! # Commerce HTTP Client
//!
//! reqwest-backed implementation of [`CommerceApi`].
//!
//! ## Routes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GET  /chatbots/{terminal}/peelo-shop          { success, shop }        │
//! │  GET  /chatbots/{terminal}/products?limit=100  { success, products }    │
//! │  GET  /chatbots/{terminal}/cashiers?active=true{ success, cashiers }    │
//! │  POST /cashiers/{cashier}/verify-pin  {pin}    { success }              │
//! │  POST /chatbots/{terminal}/transactions        { success, transaction } │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Status mapping: 401/403 → `Unauthorized`, 404 → `NotFound`, other
//! non-2xx → `Status`. What each endpoint does with those is documented
//! on the method.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use peelo_core::money::Money;
use peelo_core::types::{Cashier, Product, Shop, TransactionRequest, TransactionResponse};
use peelo_core::PRODUCT_PAGE_LIMIT;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::CommerceApi;

// =============================================================================
// Envelopes
// =============================================================================

#[derive(Debug, Deserialize)]
struct ShopEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    shop: Option<Shop>,
}

#[derive(Debug, Deserialize)]
struct ProductsEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    products: Vec<Product>,
}

#[derive(Debug, Deserialize)]
struct CashiersEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    cashiers: Vec<Cashier>,
}

#[derive(Debug, Deserialize)]
struct VerifyPinEnvelope {
    #[serde(default)]
    success: bool,
}

/// Kept loose: once `success` is true the sale is recorded server-side,
/// whatever shape the `transaction` object has.
#[derive(Debug, Deserialize)]
struct TransactionEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    transaction: Option<Value>,
}

#[derive(Serialize)]
struct VerifyPinBody<'a> {
    pin: &'a str,
}

// =============================================================================
// Client
// =============================================================================

/// HTTP client for the commerce API.
///
/// Cloning is cheap; clones share the connection pool and the shop cache.
#[derive(Debug, Clone)]
pub struct CommerceClient {
    http: Client,
    base_url: Url,
    shop_cache: Arc<RwLock<HashMap<String, Shop>>>,
}

impl CommerceClient {
    /// Builds a client from validated configuration.
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let base_url = config.validate()?;

        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(CommerceClient {
            http,
            base_url,
            shop_cache: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Drops the cached shop for a terminal so the next lookup refetches it.
    pub async fn invalidate_shop(&self, terminal_id: &str) {
        self.shop_cache.write().await.remove(terminal_id);
    }

    /// Base URL plus percent-encoded path segments.
    fn endpoint(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::Config(format!("base URL cannot carry a path: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder, url: &Url) -> ClientResult<T> {
        let response = request
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(e, url.as_str()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(url = %url, status = status.as_u16(), "Commerce API returned an error status");

            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::Unauthorized {
                    url: url.to_string(),
                },
                StatusCode::NOT_FOUND => ClientError::NotFound {
                    url: url.to_string(),
                },
                _ => ClientError::Status {
                    status: status.as_u16(),
                    url: url.to_string(),
                    body,
                },
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::InvalidResponse {
                url: url.to_string(),
                message: e.to_string(),
            })
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> ClientResult<T> {
        debug!(url = %url, "GET");
        self.execute(self.http.get(url.clone()), &url).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(&self, url: Url, body: &B) -> ClientResult<T> {
        debug!(url = %url, "POST");
        self.execute(self.http.post(url.clone()).json(body), &url).await
    }
}

impl CommerceApi for CommerceClient {
    /// Shop for a terminal. `success: false` and 404 both mean "no shop".
    ///
    /// Found shops are cached for the life of the client.
    async fn get_shop(&self, terminal_id: &str) -> ClientResult<Option<Shop>> {
        if let Some(shop) = self.shop_cache.read().await.get(terminal_id) {
            debug!(terminal_id, "Shop served from cache");
            return Ok(Some(shop.clone()));
        }

        let url = self.endpoint(&["chatbots", terminal_id, "peelo-shop"])?;
        let envelope: ShopEnvelope = match self.get(url).await {
            Ok(envelope) => envelope,
            Err(ClientError::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };

        match envelope.shop {
            Some(shop) if envelope.success => {
                info!(terminal_id, shop = %shop.name, "Shop loaded");
                self.shop_cache
                    .write()
                    .await
                    .insert(terminal_id.to_string(), shop.clone());
                Ok(Some(shop))
            }
            _ => Ok(None),
        }
    }

    /// First page of the terminal's products. `success: false` is an empty list.
    async fn get_products(&self, terminal_id: &str) -> ClientResult<Vec<Product>> {
        let mut url = self.endpoint(&["chatbots", terminal_id, "products"])?;
        url.query_pairs_mut()
            .append_pair("limit", &PRODUCT_PAGE_LIMIT.to_string());

        let envelope: ProductsEnvelope = self.get(url).await?;
        if !envelope.success {
            warn!(terminal_id, "Products endpoint reported failure, treating as empty");
            return Ok(Vec::new());
        }
        Ok(envelope.products)
    }

    /// Active cashiers for the terminal. `success: false` is an empty roster.
    async fn get_cashiers(&self, terminal_id: &str) -> ClientResult<Vec<Cashier>> {
        let mut url = self.endpoint(&["chatbots", terminal_id, "cashiers"])?;
        url.query_pairs_mut().append_pair("active", "true");

        let envelope: CashiersEnvelope = self.get(url).await?;
        if !envelope.success {
            warn!(terminal_id, "Cashiers endpoint reported failure, treating as empty");
            return Ok(Vec::new());
        }
        Ok(envelope.cashiers)
    }

    /// `Ok(false)` for a wrong PIN, including a 401/403 answer.
    /// Transport failures are errors and never count as a match.
    async fn verify_pin(&self, cashier_id: &str, pin: &str) -> ClientResult<bool> {
        let url = self.endpoint(&["cashiers", cashier_id, "verify-pin"])?;

        match self.post::<VerifyPinEnvelope, _>(url, &VerifyPinBody { pin }).await {
            Ok(envelope) => Ok(envelope.success),
            Err(ClientError::Unauthorized { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Commits a sale.
    ///
    /// `success: false` is `Rejected`; HTTP and transport failures keep
    /// their own variants. A `success: true` reply always yields a
    /// response: fields the server left out or malformed are filled from
    /// the submitted request (see [`accepted_transaction`]).
    async fn create_transaction(
        &self,
        terminal_id: &str,
        request: &TransactionRequest,
    ) -> ClientResult<TransactionResponse> {
        let url = self.endpoint(&["chatbots", terminal_id, "transactions"])?;
        let url_text = url.to_string();

        let envelope: TransactionEnvelope = self.post(url, request).await?;
        if !envelope.success {
            return Err(ClientError::Rejected {
                url: url_text,
                message: envelope
                    .message
                    .unwrap_or_else(|| "transaction not accepted".into()),
            });
        }

        Ok(accepted_transaction(envelope.transaction, request, &url_text))
    }
}

// =============================================================================
// Accepted Transactions
// =============================================================================

/// Response for a sale the server accepted.
///
/// Strict decoding first. On failure each field is picked out on its own,
/// falling back to the request's totals and the local clock.
fn accepted_transaction(
    transaction: Option<Value>,
    request: &TransactionRequest,
    url: &str,
) -> TransactionResponse {
    let value = match transaction {
        Some(value) => match serde_json::from_value::<TransactionResponse>(value.clone()) {
            Ok(response) => return response,
            Err(e) => {
                warn!(url, error = %e, "Accepted transaction has an unexpected shape");
                value
            }
        },
        None => {
            warn!(url, "Accepted transaction carries no details");
            Value::Null
        }
    };

    let text = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);
    let units = |key: &str| value.get(key).and_then(Value::as_i64).map(Money::from_units);

    let id = text("_id").unwrap_or_default();
    TransactionResponse {
        transaction_number: text("transactionNumber").unwrap_or_else(|| id.clone()),
        id,
        total_amount: units("totalAmount").unwrap_or(request.total_amount),
        change: units("change").unwrap_or(request.change),
        created_at: value
            .get("createdAt")
            .and_then(Value::as_str)
            .and_then(parse_timestamp)
            .unwrap_or_else(Utc::now),
    }
}

/// RFC 3339, or a bare `YYYY-MM-DD HH:MM:SS` taken as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

//! # Receipt View
//!
//! What the cashier sees after a committed sale. Totals come from the
//! request we submitted; identifiers and timestamp come from the server.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;
use ts_rs::TS;

use crate::money::{format_grouped, Money};
use crate::types::{TenderEntry, TransactionLine, TransactionRequest, TransactionResponse};

/// A committed sale, ready to display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub transaction_id: String,
    pub transaction_number: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub shop_name: String,
    pub cashier_name: String,
    pub lines: Vec<TransactionLine>,
    pub payments: Vec<TenderEntry>,
    pub subtotal: Money,
    pub tax: Money,
    pub discount: Money,
    /// Total due at submission.
    pub total: Money,
    pub cash_given: Money,
    /// allocated − due at submission.
    pub change: Money,
}

impl Receipt {
    /// Combines the submitted request with the server's confirmation.
    ///
    /// The server echoes `totalAmount` and `change`; if they disagree with
    /// what we sent, the submitted figures win and the mismatch is logged.
    pub fn build(
        request: &TransactionRequest,
        response: &TransactionResponse,
        shop_name: &str,
        cashier_name: &str,
    ) -> Self {
        if response.total_amount != request.total_amount || response.change != request.change {
            warn!(
                transaction_number = %response.transaction_number,
                submitted_total = request.total_amount.units(),
                echoed_total = response.total_amount.units(),
                submitted_change = request.change.units(),
                echoed_change = response.change.units(),
                "Server totals differ from submitted totals"
            );
        }

        Receipt {
            transaction_id: response.id.clone(),
            transaction_number: response.transaction_number.clone(),
            created_at: response.created_at,
            shop_name: shop_name.to_string(),
            cashier_name: cashier_name.to_string(),
            lines: request.items.clone(),
            payments: request.payments.clone(),
            subtotal: request.subtotal,
            tax: request.tax,
            discount: request.discount,
            total: request.total_amount,
            cash_given: request.cash_given,
            change: request.change,
        }
    }

    /// Change line, rendered with the default franc symbol.
    pub fn change_message(&self) -> String {
        self.change_message_with("F")
    }

    /// Change line with a configured currency symbol.
    pub fn change_message_with(&self, currency_symbol: &str) -> String {
        if self.change.is_positive() {
            format!(
                "Monnaie à rendre: {} {}",
                format_grouped(self.change.units()),
                currency_symbol
            )
        } else {
            "Pas de monnaie à rendre".to_string()
        }
    }
}

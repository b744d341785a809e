//! # Register Error Type
//!
//! Unified error type for register commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Peelo POS                              │
//! │                                                                         │
//! │  Command Function                                                       │
//! │  Result<T, AppError>                                                    │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Commerce API error? ── ClientError::Status{..} ─────┐                  │
//! │         │                                            │                  │
//! │         ▼                                            ▼                  │
//! │  Business rule?  ────── CoreError::EmptyCart ───── AppError ──► cashier │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Success ─────────────────────────────────────────────────────► cashier │
//! │                                                                         │
//! │  Three failure families get special handling:                          │
//! │  • load failure      → LOAD_FAILED, screen keeps working (empty)       │
//! │  • PIN rejected      → INCORRECT_PIN, PIN pad cleared                  │
//! │  • checkout failure  → CHECKOUT_FAILED, cart and tender kept           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;

use peelo_api::ClientError;
use peelo_core::checkout::CheckoutFailure;
use peelo_core::money::format_grouped;
use peelo_core::{CoreError, ValidationError};

use crate::state::ConfigError;

/// Result type alias for register commands.
pub type AppResult<T> = Result<T, AppError>;

/// Error returned from register commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "INCORRECT_PIN",
///   "message": "Code PIN incorrect"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for register responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Shop, product, variant or cashier does not exist
    NotFound,

    /// Input validation failed
    ValidationError,

    /// No cashier signed in
    NotAuthenticated,

    /// PIN did not verify (wrong PIN or verification unreachable)
    IncorrectPin,

    /// Shop, roster or catalog could not be fetched
    LoadFailed,

    /// Cart operation failed
    CartError,

    /// Tender operation failed
    PaymentError,

    /// Transaction was not recorded by the commerce API
    CheckoutFailed,

    /// A transaction is in flight
    SubmissionPending,

    /// Anything else
    Internal,
}

impl AppError {
    /// Creates a new register error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        AppError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        AppError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        AppError::new(ErrorCode::Internal, message)
    }

    /// Wrong PIN. Also used when verification could not be reached.
    pub fn incorrect_pin() -> Self {
        AppError::new(ErrorCode::IncorrectPin, "Code PIN incorrect")
    }

    /// A fetch that the screen recovers from.
    pub fn load_failed(what: &str, err: &ClientError) -> Self {
        AppError::new(
            ErrorCode::LoadFailed,
            format!("Failed to load {}: {}", what, err),
        )
    }

    /// Submission failure with attempted vs. due amounts.
    pub fn checkout_failed(failure: &CheckoutFailure) -> Self {
        AppError::new(
            ErrorCode::CheckoutFailed,
            format!(
                "Transaction failed ({} F tendered, {} F due): {}",
                format_grouped(failure.attempted.units()),
                format_grouped(failure.due.units()),
                failure.reason
            ),
        )
    }

    pub fn submission_pending() -> Self {
        AppError::new(
            ErrorCode::SubmissionPending,
            "A transaction is being submitted; abandon it explicitly to continue",
        )
    }
}

/// Converts core errors to register errors.
impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::ProductNotFound(_) => ErrorCode::NotFound,
            CoreError::VariantRequired { .. }
            | CoreError::VariantNotFound { .. }
            | CoreError::EmptyCart => ErrorCode::CartError,
            CoreError::InsufficientPayment { .. }
            | CoreError::MethodNotAccepted(_)
            | CoreError::InvalidCheckoutPhase { .. } => ErrorCode::PaymentError,
            CoreError::NotAuthenticated => ErrorCode::NotAuthenticated,
            CoreError::SubmissionInProgress => return AppError::submission_pending(),
            CoreError::Validation(_) => ErrorCode::ValidationError,
        };
        AppError::new(code, err.to_string())
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::validation(err.to_string())
    }
}

/// Converts client errors to register errors.
///
/// Call sites with a more specific meaning (PIN verification, checkout)
/// build their error explicitly instead.
impl From<ClientError> for AppError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::NotFound { url } => AppError::not_found("Resource", &url),
            ClientError::Config(message) => {
                tracing::error!("Commerce client misconfigured: {}", message);
                AppError::internal(format!("Invalid client configuration: {}", message))
            }
            other => AppError::new(ErrorCode::LoadFailed, other.to_string()),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::validation(err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {}

//! # Error Types
//!
//! Domain-specific error types for peelo-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  peelo-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  peelo-api errors (separate crate)                                     │
//! │  └── ClientError      - Commerce API call failures                     │
//! │                                                                         │
//! │  Register app errors                                                   │
//! │  └── AppError         - What the cashier sees (serialized)             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → AppError → Cashier                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations. The register maps each
/// of them to an actionable message.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product is not in the loaded catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// A product with variants was added without choosing one.
    ///
    /// ## User Workflow
    /// ```text
    /// Tap "T-shirt" (has variants)
    ///      │
    ///      ▼
    /// VariantRequired { product_id }
    ///      │
    ///      ▼
    /// UI opens the variant picker, then retries with the chosen variant
    /// ```
    #[error("Product {product_id} requires a variant to be selected")]
    VariantRequired { product_id: String },

    /// The chosen variant does not belong to the product.
    #[error("Variant {variant_id} does not belong to product {product_id}")]
    VariantNotFound {
        product_id: String,
        variant_id: String,
    },

    /// Checkout was attempted with nothing in the cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Allocations do not cover the total due.
    #[error("Payment incomplete: {allocated} allocated, {due} due")]
    InsufficientPayment { allocated: Money, due: Money },

    /// The operation requires a signed-in cashier.
    #[error("No cashier is signed in")]
    NotAuthenticated,

    /// The shop does not accept this payment method.
    #[error("Payment method {0} is not accepted by this shop")]
    MethodNotAccepted(String),

    /// A transaction is already in flight for this cart.
    #[error("A transaction is already being submitted")]
    SubmissionInProgress,

    /// Checkout transition not valid from the current phase.
    #[error("Checkout is {phase}, cannot {operation}")]
    InvalidCheckoutPhase {
        phase: &'static str,
        operation: &'static str,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., non-digit PIN).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

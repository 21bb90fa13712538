//! # Error Types
//!
//! Domain-specific error types for magasin-core.
//!
//! ## Error Hierarchy
//! ```text
//! magasin-core errors (this file)
//! ├── CoreError        - Business rule violations (auth, stock, catalog)
//! └── ValidationError  - Input validation failures
//!
//! magasin-db errors (separate crate)
//! ├── DbError          - Database operation failures
//! └── ServiceError     - CoreError or DbError, the service surface
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (article code, username, quantities)
//! 3. Errors are enum variants, never String

use thiserror::Error;

use crate::types::Role;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These represent business rule violations. Each variant maps to a message
/// a UI layer can surface directly.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A username is already taken.
    ///
    /// Registration never overwrites: the existing account is left untouched.
    #[error("Username '{0}' is already taken")]
    DuplicateUser(String),

    /// No account exists for the given username or id.
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// The password does not match the stored hash.
    ///
    /// Deliberately carries no detail. The login flow reports which account
    /// was tried through its own logging, never through this error.
    #[error("Incorrect password")]
    BadPassword,

    /// The session's role is below the required level.
    ///
    /// Role checks are minimum-role checks: an admin session passes every
    /// manager and seller gate.
    #[error("Permission denied: requires {required} role or higher")]
    PermissionDenied { required: Role },

    /// Article code does not exist in the catalog.
    #[error("Article not found: {0}")]
    ArticleNotFound(String),

    /// Supplier id does not exist.
    #[error("Supplier not found: {0}")]
    SupplierNotFound(i64),

    /// Not enough stock on hand to issue the requested quantity.
    ///
    /// The ledger invariant: on-hand quantity never goes below zero. An
    /// over-issue fails with this error and mutates nothing.
    #[error("Insufficient stock for {code}: available {available}, requested {requested}")]
    InsufficientStock {
        code: String,
        available: i64,
        requested: i64,
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
/// Raised when user input does not meet requirements, before any business
/// logic runs.
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

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (bad characters, unknown role name).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

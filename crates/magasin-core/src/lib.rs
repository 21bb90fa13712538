//! # magasin-core: Pure Business Logic for Magasin
//!
//! Domain types and rules for a local inventory system, with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Desktop shell (out of scope)                               │
//! │       │                                                     │
//! │       ▼                                                     │
//! │  magasin-db   SQLite queries, repositories, auth service    │
//! │       │                                                     │
//! │       ▼                                                     │
//! │  magasin-core (THIS CRATE)                                  │
//! │                                                             │
//! │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌─────────────┐    │
//! │   │  types   │ │  money   │ │  error   │ │ validation  │    │
//! │   │ Article  │ │  Money   │ │CoreError │ │   rules     │    │
//! │   │ Session  │ │  cents   │ │Validation│ │   checks    │    │
//! │   └──────────┘ └──────────┘ └──────────┘ └─────────────┘    │
//! │                                                             │
//! │   NO I/O • NO DATABASE • PURE FUNCTIONS                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Article, Supplier, Movement, Session, Role)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation rules
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: deterministic, no side effects
//! 2. **Integer Money**: all prices are cents (i64) to avoid float errors
//! 3. **Explicit Errors**: typed enums, never strings or panics
//! 4. **Explicit Sessions**: authorization is answered by a [`types::Session`]
//!    value handed to callers at login, not by process-global state

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity accepted for a single stock movement.
///
/// Guards against fat-fingered entries (e.g. a scanned barcode landing in the
/// quantity field). Large restocks are still possible as several movements.
pub const MAX_MOVEMENT_QUANTITY: i64 = 1_000_000;

/// Stock location used when the caller does not specify one.
pub const DEFAULT_LOCATION: &str = "main";

/// Username of the bootstrap administrator account.
pub const BOOTSTRAP_ADMIN_USERNAME: &str = "admin";

//! # Repository Implementations
//!
//! One repository per aggregate. Each holds a clone of the shared
//! [`sqlx::SqlitePool`] and is cheap to construct from a
//! [`crate::Database`] accessor.
//!
//! ## Error Surfaces
//! - [`article`], [`supplier`], [`stock`] enforce domain rules (input
//!   validation, typed not-found, the non-negative stock invariant) and
//!   return [`crate::error::ServiceResult`].
//! - [`report`] and [`user`] are pure storage access and return
//!   [`crate::error::DbResult`]; the user repository is wrapped by
//!   [`crate::auth::AuthService`], which owns the credential rules.

pub mod article;
pub mod report;
pub mod stock;
pub mod supplier;
pub mod user;

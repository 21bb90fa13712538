//! # magasin-db: Database Layer for Magasin
//!
//! Database access for the Magasin inventory system. Uses SQLite for local
//! storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │  Caller (desktop shell, seed binary, tests)                    │
//! │       │                                                        │
//! │       ▼                                                        │
//! │  magasin-db (THIS CRATE)                                       │
//! │                                                                │
//! │   ┌─────────────┐  ┌────────────────┐  ┌──────────────┐        │
//! │   │  Database   │  │  Repositories  │  │  Migrations  │        │
//! │   │  (pool.rs)  │  │ article, stock │  │  (embedded)  │        │
//! │   │             │◄─│ supplier, user │  │ 001_init.sql │        │
//! │   │ SqlitePool  │  │ report         │  └──────────────┘        │
//! │   └─────────────┘  └────────────────┘                          │
//! │                    ┌────────────────┐                          │
//! │                    │  AuthService   │  hashing + sessions      │
//! │                    └────────────────┘                          │
//! │       │                                                        │
//! │       ▼                                                        │
//! │  SQLite database file (WAL mode, foreign keys on)              │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and service error types
//! - [`repository`] - Repository implementations (article, supplier, stock,
//!   report, user)
//! - [`auth`] - Password hashing, login, and admin-gated user management
//!
//! ## Usage
//!
//! ```rust,ignore
//! use magasin_db::{Database, DbConfig};
//! use magasin_core::Role;
//!
//! let db = Database::new(DbConfig::new("path/to/magasin.db")).await?;
//!
//! let session = db.auth().login("alice", "secret").await?;
//! let new_on_hand = db.stock().receive("ART-001", 10, None, session.user_id).await?;
//! let alerts = db.stock().low_stock().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod auth;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use auth::AuthService;
pub use error::{DbError, ServiceError};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::article::ArticleRepository;
pub use repository::report::ReportRepository;
pub use repository::stock::StockRepository;
pub use repository::supplier::SupplierRepository;
pub use repository::user::UserRepository;

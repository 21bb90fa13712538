//! # Domain Types
//!
//! Core domain types used throughout Magasin.
//!
//! ## Type Hierarchy
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                             │
//! │                                                                  │
//! │  ┌───────────────┐  ┌───────────────┐  ┌───────────────┐         │
//! │  │    Article    │  │   Movement    │  │     User      │         │
//! │  │  ───────────  │  │  ───────────  │  │  ───────────  │         │
//! │  │  code (PK)    │  │  kind         │  │  id           │         │
//! │  │  name         │  │  article_code │  │  username     │         │
//! │  │  prices cents │  │  quantity     │  │  password_hash│         │
//! │  │  threshold    │  │  recorded_at  │  │  role         │         │
//! │  └───────────────┘  └───────────────┘  └───────────────┘         │
//! │                                                                  │
//! │  ┌───────────────┐  ┌───────────────┐  ┌───────────────┐         │
//! │  │     Role      │  │ MovementKind  │  │    Session    │         │
//! │  │  ───────────  │  │  ───────────  │  │  ───────────  │         │
//! │  │  Admin   = 3  │  │  Entry        │  │ login snapshot│         │
//! │  │  Manager = 2  │  │  Exit         │  │ has_permission│         │
//! │  │  Seller  = 1  │  └───────────────┘  └───────────────┘         │
//! │  └───────────────┘                                               │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Articles use their `code` as business key; everything else carries an
//! integer rowid assigned by the database.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Role
// =============================================================================

/// User role, ordered by privilege.
///
/// ## Minimum-Role Checks
/// Authorization is a *minimum-role* check, not an exact-role check: a role
/// grants everything the roles below it grant. This lets higher roles reuse
/// lower-role screens.
///
/// ```text
/// Admin (3)  ⊇  Manager (2)  ⊇  Seller (1)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access, including user management.
    Admin,
    /// Catalog, suppliers, stock and reporting.
    Manager,
    /// Day-to-day stock entries and exits.
    Seller,
}

impl Role {
    /// Numeric privilege level. Higher level includes all lower ones.
    #[inline]
    pub const fn level(&self) -> u8 {
        match self {
            Role::Admin => 3,
            Role::Manager => 2,
            Role::Seller => 1,
        }
    }

    /// Canonical lowercase identifier, as stored in the database.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Seller => "seller",
        }
    }

    /// True when this role grants at least the privileges of `required`.
    #[inline]
    pub const fn satisfies(&self, required: Role) -> bool {
        self.level() >= required.level()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "seller" => Ok(Role::Seller),
            other => Err(ValidationError::InvalidFormat {
                field: "role".to_string(),
                reason: format!("unknown role '{}'", other),
            }),
        }
    }
}

// =============================================================================
// User
// =============================================================================

/// A user row, including the password hash.
///
/// Stays inside the database layer; anything handed to a UI should be the
/// hash-free [`UserAccount`] instead.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub display_name: Option<String>,
    /// Set on bootstrap accounts; cleared by the first password change.
    pub must_change_password: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A user as shown in management screens. No password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct UserAccount {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub display_name: Option<String>,
    pub must_change_password: bool,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<User> for UserAccount {
    fn from(user: User) -> Self {
        UserAccount {
            id: user.id,
            username: user.username,
            role: user.role,
            display_name: user.display_name,
            must_change_password: user.must_change_password,
            last_login: user.last_login,
        }
    }
}

// =============================================================================
// Session
// =============================================================================

/// Snapshot of a logged-in user.
///
/// Returned by `login` and passed explicitly to every operation that needs
/// authorization. There is no process-global "current user": holding a
/// `Session` *is* being authenticated, and dropping it is logout. This keeps
/// parallel logical sessions (tests, future multi-window shells) from
/// interfering with each other.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
    pub display_name: Option<String>,
    /// Last login *before* this one, for "welcome back" displays.
    pub previous_login: Option<DateTime<Utc>>,
    /// When this session was opened.
    pub logged_in_at: DateTime<Utc>,
    /// True when the account must set a new password before real work.
    pub must_change_password: bool,
}

impl Session {
    /// Minimum-role check. True when this session's role level is at least
    /// the required level.
    #[inline]
    pub fn has_permission(&self, required: Role) -> bool {
        self.role.satisfies(required)
    }

    /// Like [`Session::has_permission`], but as a guard clause.
    pub fn require(&self, required: Role) -> Result<(), crate::error::CoreError> {
        if self.has_permission(required) {
            Ok(())
        } else {
            Err(crate::error::CoreError::PermissionDenied { required })
        }
    }
}

// =============================================================================
// Supplier
// =============================================================================

/// An article supplier. Only the name is mandatory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Supplier {
    pub id: i64,
    pub name: String,
    pub contact: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

// =============================================================================
// Article
// =============================================================================

/// A catalog item (SKU).
///
/// `code` is the business key used everywhere: stock rows, movements and
/// barcode lookups all reference it. Prices are integer cents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Article {
    pub code: String,
    pub name: String,
    pub category: Option<String>,
    pub purchase_price_cents: i64,
    pub sale_price_cents: i64,
    /// On-hand quantity at or below this value raises a low-stock alert.
    pub alert_threshold: i64,
    /// Barcode *string* for lookups. Image generation and camera scanning
    /// live outside this workspace.
    pub barcode: Option<String>,
    pub supplier_id: Option<i64>,
}

impl Article {
    /// Purchase price as a Money value.
    #[inline]
    pub fn purchase_price(&self) -> Money {
        Money::from_cents(self.purchase_price_cents)
    }

    /// Sale price as a Money value.
    #[inline]
    pub fn sale_price(&self) -> Money {
        Money::from_cents(self.sale_price_cents)
    }
}

/// An article joined with its supplier name, for catalog listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ArticleListing {
    pub code: String,
    pub name: String,
    pub category: Option<String>,
    pub purchase_price_cents: i64,
    pub sale_price_cents: i64,
    pub alert_threshold: i64,
    pub barcode: Option<String>,
    pub supplier_id: Option<i64>,
    /// NULL when the article has no supplier.
    pub supplier_name: Option<String>,
}

// =============================================================================
// Stock
// =============================================================================

/// Current on-hand quantity for an article. One row per article.
///
/// This is a materialized aggregate of the movement ledger, maintained in the
/// same transaction as each movement insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockLevel {
    pub id: i64,
    pub article_code: String,
    pub quantity: i64,
    pub location: Option<String>,
}

/// The direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    /// Goods received into stock.
    Entry,
    /// Goods issued out of stock.
    Exit,
}

impl MovementKind {
    /// Canonical lowercase identifier, as stored in the database.
    pub const fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Entry => "entry",
            MovementKind::Exit => "exit",
        }
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ledger entry. Movements are append-only: the repository exposes no
/// update or delete for them, so the ledger doubles as an audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Movement {
    pub id: i64,
    pub kind: MovementKind,
    pub article_code: String,
    pub quantity: i64,
    pub recorded_at: DateTime<Utc>,
    /// Acting user. NULL when the account was deleted after the fact.
    pub user_id: Option<i64>,
}

// =============================================================================
// Reporting Rows
// =============================================================================

/// An article at or below its alert threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LowStockAlert {
    pub code: String,
    pub name: String,
    pub alert_threshold: i64,
    /// 0 when the article has no stock row yet.
    pub on_hand: i64,
}

/// One line of the stock overview report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockOverviewRow {
    pub code: String,
    pub name: String,
    pub quantity: i64,
}

/// One line of the top-sellers report: total quantity issued per article.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TopSellerRow {
    pub code: String,
    pub name: String,
    pub total_issued: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_levels_are_ordered() {
        assert!(Role::Admin.level() > Role::Manager.level());
        assert!(Role::Manager.level() > Role::Seller.level());
    }

    #[test]
    fn test_role_satisfies_is_monotonic() {
        // Every role satisfies itself and everything below it.
        for role in [Role::Admin, Role::Manager, Role::Seller] {
            assert!(role.satisfies(role));
        }
        assert!(Role::Admin.satisfies(Role::Manager));
        assert!(Role::Admin.satisfies(Role::Seller));
        assert!(Role::Manager.satisfies(Role::Seller));

        assert!(!Role::Seller.satisfies(Role::Manager));
        assert!(!Role::Seller.satisfies(Role::Admin));
        assert!(!Role::Manager.satisfies(Role::Admin));
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("Manager".parse::<Role>().unwrap(), Role::Manager);
        assert_eq!(" seller ".parse::<Role>().unwrap(), Role::Seller);
        assert!("cashier".parse::<Role>().is_err());
    }

    #[test]
    fn test_session_permission_checks() {
        let session = Session {
            user_id: 1,
            username: "alice".to_string(),
            role: Role::Seller,
            display_name: Some("Alice A".to_string()),
            previous_login: None,
            logged_in_at: Utc::now(),
            must_change_password: false,
        };

        assert!(session.has_permission(Role::Seller));
        assert!(!session.has_permission(Role::Manager));
        assert!(!session.has_permission(Role::Admin));
        assert!(session.require(Role::Admin).is_err());
        assert!(session.require(Role::Seller).is_ok());
    }

    #[test]
    fn test_movement_kind_identifiers() {
        assert_eq!(MovementKind::Entry.as_str(), "entry");
        assert_eq!(MovementKind::Exit.to_string(), "exit");
    }

    #[test]
    fn test_enum_wire_format_is_lowercase() {
        // Serialized identifiers match the database TEXT representation, so
        // a shell layer and the schema agree on one canonical set.
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(serde_json::to_string(&Role::Manager).unwrap(), "\"manager\"");
        assert_eq!(serde_json::to_string(&Role::Seller).unwrap(), "\"seller\"");
        assert_eq!(
            serde_json::to_string(&MovementKind::Entry).unwrap(),
            "\"entry\""
        );
        assert_eq!(
            serde_json::to_string(&MovementKind::Exit).unwrap(),
            "\"exit\""
        );
    }
}

//! # Stock Ledger
//!
//! On-hand quantities and the append-only movement history.
//!
//! ## Ledger Discipline
//! ```text
//! receive("ART-001", 10)            issue("ART-001", 4)
//!      │                                 │
//!      ▼                                 ▼
//! ┌─────────────────── one transaction ───────────────────┐
//! │  stock_levels: upsert +10        check available >= 4 │
//! │  stock_movements: append entry   stock_levels: -4     │
//! │                                  stock_movements: exit│
//! └───────────────────────────────────────────────────────┘
//! ```
//! The materialized quantity and the ledger row commit together or not at
//! all; a failure halfway can never leave them inconsistent.
//!
//! ## The One Invariant
//! On-hand quantity never goes below zero. An over-issue fails with
//! `InsufficientStock`, mutates nothing, and the schema's CHECK constraint
//! backs the application-level test.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, ServiceResult};
use magasin_core::validation::validate_quantity;
use magasin_core::{CoreError, LowStockAlert, Movement, MovementKind, StockLevel, DEFAULT_LOCATION};

/// Repository for stock levels and the movement ledger.
///
/// Movements are append-only: this type exposes no update or delete for
/// them, so the ledger doubles as the audit trail.
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    /// Creates a new StockRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    /// Records a stock entry: increments the on-hand quantity and appends an
    /// `entry` movement, atomically.
    ///
    /// ## Arguments
    /// * `article_code` - catalog code; must exist
    /// * `quantity` - units received, must be positive
    /// * `location` - storage location for a first-time stock row;
    ///   [`DEFAULT_LOCATION`] when `None`
    /// * `user_id` - the acting user, recorded on the ledger entry
    ///
    /// ## Returns
    /// The new on-hand quantity.
    pub async fn receive(
        &self,
        article_code: &str,
        quantity: i64,
        location: Option<&str>,
        user_id: i64,
    ) -> ServiceResult<i64> {
        validate_quantity(quantity)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Self::require_article(&mut tx, article_code).await?;

        // Upsert: first entry creates the row, later entries increment it.
        sqlx::query(
            r#"
            INSERT INTO stock_levels (article_code, quantity, location)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (article_code)
            DO UPDATE SET quantity = quantity + excluded.quantity
            "#,
        )
        .bind(article_code)
        .bind(quantity)
        .bind(location.unwrap_or(DEFAULT_LOCATION))
        .execute(&mut *tx)
        .await?;

        let recorded_at = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO stock_movements (kind, article_code, quantity, recorded_at, user_id)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(MovementKind::Entry)
        .bind(article_code)
        .bind(quantity)
        .bind(recorded_at)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        let on_hand: i64 =
            sqlx::query_scalar("SELECT quantity FROM stock_levels WHERE article_code = ?1")
                .bind(article_code)
                .fetch_one(&mut *tx)
                .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(code = %article_code, quantity = %quantity, on_hand = %on_hand, "Stock received");
        Ok(on_hand)
    }

    /// Records a stock exit: decrements the on-hand quantity and appends an
    /// `exit` movement, atomically.
    ///
    /// ## Errors
    /// `CoreError::InsufficientStock` when the article has no stock row or
    /// less than `quantity` on hand. Nothing is mutated in that case.
    ///
    /// ## Returns
    /// The remaining on-hand quantity.
    pub async fn issue(
        &self,
        article_code: &str,
        quantity: i64,
        user_id: i64,
    ) -> ServiceResult<i64> {
        validate_quantity(quantity)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Self::require_article(&mut tx, article_code).await?;

        // Missing row counts as zero on hand.
        let available: i64 =
            sqlx::query_scalar("SELECT quantity FROM stock_levels WHERE article_code = ?1")
                .bind(article_code)
                .fetch_optional(&mut *tx)
                .await?
                .unwrap_or(0);

        if available < quantity {
            // Dropping the transaction rolls it back; state is untouched.
            warn!(
                code = %article_code,
                available = %available,
                requested = %quantity,
                "Stock exit refused"
            );
            return Err(CoreError::InsufficientStock {
                code: article_code.to_string(),
                available,
                requested: quantity,
            }
            .into());
        }

        sqlx::query(
            "UPDATE stock_levels SET quantity = quantity - ?2 WHERE article_code = ?1",
        )
        .bind(article_code)
        .bind(quantity)
        .execute(&mut *tx)
        .await?;

        let recorded_at = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO stock_movements (kind, article_code, quantity, recorded_at, user_id)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(MovementKind::Exit)
        .bind(article_code)
        .bind(quantity)
        .bind(recorded_at)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let remaining = available - quantity;
        info!(code = %article_code, quantity = %quantity, remaining = %remaining, "Stock issued");
        Ok(remaining)
    }

    /// Current on-hand quantity for an article. 0 when no stock row exists.
    pub async fn on_hand(&self, article_code: &str) -> ServiceResult<i64> {
        let quantity: Option<i64> =
            sqlx::query_scalar("SELECT quantity FROM stock_levels WHERE article_code = ?1")
                .bind(article_code)
                .fetch_optional(&self.pool)
                .await?;

        Ok(quantity.unwrap_or(0))
    }

    /// The full stock row for an article, if one exists.
    pub async fn level(&self, article_code: &str) -> ServiceResult<Option<StockLevel>> {
        let level = sqlx::query_as::<_, StockLevel>(
            "SELECT id, article_code, quantity, location FROM stock_levels WHERE article_code = ?1",
        )
        .bind(article_code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(level)
    }

    /// Articles at or below their alert threshold.
    ///
    /// LEFT JOIN so articles with no stock row are treated as quantity 0:
    /// a zero-stock article always alerts (its threshold is >= 0).
    pub async fn low_stock(&self) -> ServiceResult<Vec<LowStockAlert>> {
        let alerts = sqlx::query_as::<_, LowStockAlert>(
            r#"
            SELECT a.code, a.name, a.alert_threshold,
                   IFNULL(s.quantity, 0) AS on_hand
            FROM articles a
            LEFT JOIN stock_levels s ON a.code = s.article_code
            WHERE IFNULL(s.quantity, 0) <= a.alert_threshold
            ORDER BY a.code
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = alerts.len(), "Low stock alerts computed");
        Ok(alerts)
    }

    /// Ledger entries, newest first, optionally bounded by an inclusive
    /// timestamp range. Either bound may be given on its own.
    pub async fn history(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> ServiceResult<Vec<Movement>> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, kind, article_code, quantity, recorded_at, user_id FROM stock_movements",
        );

        if let Some(start) = start {
            query.push(" WHERE recorded_at >= ");
            query.push_bind(start);
        }
        if let Some(end) = end {
            query.push(if start.is_some() { " AND " } else { " WHERE " });
            query.push("recorded_at <= ");
            query.push_bind(end);
        }
        query.push(" ORDER BY recorded_at DESC, id DESC");

        let movements = query
            .build_query_as::<Movement>()
            .fetch_all(&self.pool)
            .await?;

        Ok(movements)
    }

    /// Guard: the article must exist before any ledger work.
    ///
    /// The movement FK would also refuse unknown codes, but as an opaque
    /// constraint string rather than a typed error.
    async fn require_article(
        tx: &mut sqlx::Transaction<'_, Sqlite>,
        article_code: &str,
    ) -> ServiceResult<()> {
        let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM articles WHERE code = ?1")
            .bind(article_code)
            .fetch_optional(&mut **tx)
            .await?;

        if exists.is_none() {
            return Err(CoreError::ArticleNotFound(article_code.to_string()).into());
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use crate::error::ServiceError;
    use crate::pool::{Database, DbConfig};
    use magasin_core::{Article, CoreError, MovementKind, Role};

    /// In-memory database with one seller and articles ART-001 / ART-002.
    async fn test_db() -> (Database, i64) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let user = db
            .users()
            .insert("alice", "hash", Role::Seller, Some("Alice A"), false)
            .await
            .unwrap();

        for (code, threshold) in [("ART-001", 10), ("ART-002", 0)] {
            db.articles()
                .insert(&Article {
                    code: code.to_string(),
                    name: format!("Article {}", code),
                    category: None,
                    purchase_price_cents: 250,
                    sale_price_cents: 500,
                    alert_threshold: threshold,
                    barcode: None,
                    supplier_id: None,
                })
                .await
                .unwrap();
        }

        (db, user.id)
    }

    #[tokio::test]
    async fn test_receive_creates_then_increments() {
        let (db, user_id) = test_db().await;
        let stock = db.stock();

        assert_eq!(stock.receive("ART-001", 10, None, user_id).await.unwrap(), 10);
        assert_eq!(stock.receive("ART-001", 5, None, user_id).await.unwrap(), 15);
        assert_eq!(stock.on_hand("ART-001").await.unwrap(), 15);

        let level = stock.level("ART-001").await.unwrap().unwrap();
        assert_eq!(level.location.as_deref(), Some("main"));
    }

    #[tokio::test]
    async fn test_issue_never_goes_negative() {
        let (db, user_id) = test_db().await;
        let stock = db.stock();

        stock.receive("ART-001", 10, None, user_id).await.unwrap();

        // Over-issue fails and leaves the state untouched.
        let err = stock.issue("ART-001", 15, user_id).await.unwrap_err();
        match err {
            ServiceError::Core(CoreError::InsufficientStock {
                available,
                requested,
                ..
            }) => {
                assert_eq!(available, 10);
                assert_eq!(requested, 15);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(stock.on_hand("ART-001").await.unwrap(), 10);

        // The refused exit left no ledger entry either.
        let history = stock.history(None, None).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].kind, MovementKind::Entry);
    }

    #[tokio::test]
    async fn test_issue_without_stock_row() {
        let (db, user_id) = test_db().await;

        let err = db.stock().issue("ART-002", 1, user_id).await.unwrap_err();
        assert!(err.is_insufficient_stock());
    }

    #[tokio::test]
    async fn test_receive_then_issue_ledger() {
        let (db, user_id) = test_db().await;
        let stock = db.stock();

        stock.receive("ART-001", 10, None, user_id).await.unwrap();
        assert_eq!(stock.issue("ART-001", 4, user_id).await.unwrap(), 6);
        assert_eq!(stock.on_hand("ART-001").await.unwrap(), 6);

        // Two ledger rows, newest first: exit 4 then entry 10.
        let history = stock.history(None, None).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].kind, MovementKind::Exit);
        assert_eq!(history[0].quantity, 4);
        assert_eq!(history[1].kind, MovementKind::Entry);
        assert_eq!(history[1].quantity, 10);
        assert_eq!(history[0].user_id, Some(user_id));
    }

    #[tokio::test]
    async fn test_issue_down_to_zero_is_allowed() {
        let (db, user_id) = test_db().await;
        let stock = db.stock();

        stock.receive("ART-001", 3, None, user_id).await.unwrap();
        assert_eq!(stock.issue("ART-001", 3, user_id).await.unwrap(), 0);
        assert_eq!(stock.on_hand("ART-001").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_invalid_quantities_rejected() {
        let (db, user_id) = test_db().await;
        let stock = db.stock();

        assert!(stock.receive("ART-001", 0, None, user_id).await.is_err());
        assert!(stock.receive("ART-001", -5, None, user_id).await.is_err());
        assert!(stock.issue("ART-001", 0, user_id).await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_article_rejected() {
        let (db, user_id) = test_db().await;

        let err = db
            .stock()
            .receive("ART-404", 5, None, user_id)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::ArticleNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_low_stock_includes_missing_rows() {
        let (db, user_id) = test_db().await;
        let stock = db.stock();

        // ART-001: threshold 10, stocked above it. ART-002: threshold 0 and
        // no stock row at all, which must still alert as quantity 0.
        stock.receive("ART-001", 50, None, user_id).await.unwrap();

        let alerts = stock.low_stock().await.unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].code, "ART-002");
        assert_eq!(alerts[0].on_hand, 0);

        // Drain ART-001 to its threshold; now both alert.
        stock.issue("ART-001", 40, user_id).await.unwrap();
        let alerts = stock.low_stock().await.unwrap();
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].code, "ART-001");
        assert_eq!(alerts[0].on_hand, 10);
    }

    #[tokio::test]
    async fn test_history_date_range_is_inclusive() {
        let (db, user_id) = test_db().await;
        let stock = db.stock();

        stock.receive("ART-001", 10, None, user_id).await.unwrap();
        stock.issue("ART-001", 2, user_id).await.unwrap();

        let now = Utc::now();
        let hour = Duration::hours(1);

        assert_eq!(stock.history(Some(now - hour), Some(now + hour)).await.unwrap().len(), 2);
        assert_eq!(stock.history(Some(now - hour), None).await.unwrap().len(), 2);
        assert_eq!(stock.history(None, Some(now - hour)).await.unwrap().len(), 0);
        assert_eq!(stock.history(Some(now + hour), None).await.unwrap().len(), 0);
    }
}

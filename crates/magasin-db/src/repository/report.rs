//! # Reporting Repository
//!
//! Read-only aggregate queries for dashboards and exports. A rendering layer
//! (tables, spreadsheets) would consume these rows; rendering itself lives
//! outside this workspace.

use sqlx::SqlitePool;

use crate::error::DbResult;
use magasin_core::{Money, Movement, StockOverviewRow, TopSellerRow};

/// Repository for reporting queries. Everything here is read-only.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Every article with its on-hand quantity, absent stock rows as 0.
    pub async fn stock_overview(&self) -> DbResult<Vec<StockOverviewRow>> {
        let rows = sqlx::query_as::<_, StockOverviewRow>(
            r#"
            SELECT a.code, a.name, IFNULL(s.quantity, 0) AS quantity
            FROM articles a
            LEFT JOIN stock_levels s ON a.code = s.article_code
            ORDER BY a.code
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// The full movement ledger, newest first.
    pub async fn movement_log(&self) -> DbResult<Vec<Movement>> {
        let movements = sqlx::query_as::<_, Movement>(
            r#"
            SELECT id, kind, article_code, quantity, recorded_at, user_id
            FROM stock_movements
            ORDER BY recorded_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Total stock valuation: sum of on-hand quantity times purchase price.
    pub async fn total_stock_value(&self) -> DbResult<Money> {
        let cents: i64 = sqlx::query_scalar(
            r#"
            SELECT IFNULL(SUM(s.quantity * a.purchase_price_cents), 0)
            FROM stock_levels s
            JOIN articles a ON s.article_code = a.code
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(Money::from_cents(cents))
    }

    /// Articles ranked by total quantity issued, descending.
    pub async fn top_selling(&self, limit: u32) -> DbResult<Vec<TopSellerRow>> {
        let rows = sqlx::query_as::<_, TopSellerRow>(
            r#"
            SELECT a.code, a.name, SUM(m.quantity) AS total_issued
            FROM stock_movements m
            JOIN articles a ON m.article_code = a.code
            WHERE m.kind = 'exit'
            GROUP BY a.code, a.name
            ORDER BY total_issued DESC
            LIMIT ?1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use magasin_core::{Article, MovementKind, Role};

    /// Database with two stocked articles and some exit traffic.
    async fn reporting_db() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let user = db
            .users()
            .insert("alice", "hash", Role::Seller, None, false)
            .await
            .unwrap();

        for (code, purchase) in [("ART-001", 250), ("ART-002", 1000)] {
            db.articles()
                .insert(&Article {
                    code: code.to_string(),
                    name: format!("Article {}", code),
                    category: None,
                    purchase_price_cents: purchase,
                    sale_price_cents: purchase * 2,
                    alert_threshold: 5,
                    barcode: None,
                    supplier_id: None,
                })
                .await
                .unwrap();
        }

        // ART-003 stays without any stock row.
        db.articles()
            .insert(&Article {
                code: "ART-003".to_string(),
                name: "Article ART-003".to_string(),
                category: None,
                purchase_price_cents: 100,
                sale_price_cents: 200,
                alert_threshold: 5,
                barcode: None,
                supplier_id: None,
            })
            .await
            .unwrap();

        let stock = db.stock();
        stock.receive("ART-001", 20, None, user.id).await.unwrap();
        stock.receive("ART-002", 10, None, user.id).await.unwrap();
        stock.issue("ART-001", 8, user.id).await.unwrap();
        stock.issue("ART-002", 2, user.id).await.unwrap();
        stock.issue("ART-001", 1, user.id).await.unwrap();

        db
    }

    #[tokio::test]
    async fn test_stock_overview_counts_missing_rows_as_zero() {
        let db = reporting_db().await;

        let rows = db.reports().stock_overview().await.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].quantity, 11); // 20 - 8 - 1
        assert_eq!(rows[1].quantity, 8); // 10 - 2
        assert_eq!(rows[2].quantity, 0); // no stock row
    }

    #[tokio::test]
    async fn test_movement_log_is_newest_first() {
        let db = reporting_db().await;

        let log = db.reports().movement_log().await.unwrap();
        assert_eq!(log.len(), 5);
        assert_eq!(log[0].kind, MovementKind::Exit);
        assert_eq!(log[0].quantity, 1);
        assert_eq!(log[4].kind, MovementKind::Entry);
        assert_eq!(log[4].quantity, 20);
    }

    #[tokio::test]
    async fn test_total_stock_value() {
        let db = reporting_db().await;

        // 11 * 250 + 8 * 1000 = 10750 cents.
        let value = db.reports().total_stock_value().await.unwrap();
        assert_eq!(value.cents(), 10_750);
    }

    #[tokio::test]
    async fn test_total_stock_value_empty_database() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let value = db.reports().total_stock_value().await.unwrap();
        assert!(value.is_zero());
    }

    #[tokio::test]
    async fn test_top_selling_ranks_by_issued_quantity() {
        let db = reporting_db().await;

        let top = db.reports().top_selling(10).await.unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].code, "ART-001");
        assert_eq!(top[0].total_issued, 9); // 8 + 1
        assert_eq!(top[1].code, "ART-002");
        assert_eq!(top[1].total_issued, 2);

        let top_one = db.reports().top_selling(1).await.unwrap();
        assert_eq!(top_one.len(), 1);
        assert_eq!(top_one[0].code, "ART-001");
    }
}

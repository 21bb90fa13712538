//! # Article Repository
//!
//! Database operations for the catalog.
//!
//! ## Key Operations
//! - CRUD keyed by the article `code` (business key)
//! - Barcode string lookup (scanners hand back a string; imaging is out of
//!   scope for this workspace)
//! - Listing with the supplier name joined in

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::ServiceResult;
use magasin_core::validation::{
    validate_article_code, validate_name, validate_price_cents, validate_threshold,
};
use magasin_core::{Article, ArticleListing, CoreError};

/// Repository for article database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.articles();
/// repo.insert(&article).await?;
/// let listing = repo.list().await?;
/// ```
#[derive(Debug, Clone)]
pub struct ArticleRepository {
    pool: SqlitePool,
}

impl ArticleRepository {
    /// Creates a new ArticleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ArticleRepository { pool }
    }

    fn validate(article: &Article) -> ServiceResult<()> {
        validate_article_code(&article.code)?;
        validate_name(&article.name)?;
        validate_price_cents(article.purchase_price_cents)?;
        validate_price_cents(article.sale_price_cents)?;
        validate_threshold(article.alert_threshold)?;
        Ok(())
    }

    /// Inserts a new article.
    ///
    /// ## Errors
    /// - Validation failure on code, name, prices, or threshold
    /// - `DbError::UniqueViolation` when the code or barcode already exists
    /// - `DbError::ForeignKeyViolation` when `supplier_id` is dangling
    pub async fn insert(&self, article: &Article) -> ServiceResult<()> {
        Self::validate(article)?;

        debug!(code = %article.code, "Inserting article");

        sqlx::query(
            r#"
            INSERT INTO articles (
                code, name, category,
                purchase_price_cents, sale_price_cents, alert_threshold,
                barcode, supplier_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&article.code)
        .bind(&article.name)
        .bind(&article.category)
        .bind(article.purchase_price_cents)
        .bind(article.sale_price_cents)
        .bind(article.alert_threshold)
        .bind(&article.barcode)
        .bind(article.supplier_id)
        .execute(&self.pool)
        .await
        .map_err(crate::error::DbError::from)?;

        Ok(())
    }

    /// Updates an existing article, matched by its code.
    ///
    /// ## Errors
    /// - `CoreError::ArticleNotFound` when the code does not exist
    pub async fn update(&self, article: &Article) -> ServiceResult<()> {
        Self::validate(article)?;

        debug!(code = %article.code, "Updating article");

        let result = sqlx::query(
            r#"
            UPDATE articles SET
                name = ?2,
                category = ?3,
                purchase_price_cents = ?4,
                sale_price_cents = ?5,
                alert_threshold = ?6,
                barcode = ?7,
                supplier_id = ?8
            WHERE code = ?1
            "#,
        )
        .bind(&article.code)
        .bind(&article.name)
        .bind(&article.category)
        .bind(article.purchase_price_cents)
        .bind(article.sale_price_cents)
        .bind(article.alert_threshold)
        .bind(&article.barcode)
        .bind(article.supplier_id)
        .execute(&self.pool)
        .await
        .map_err(crate::error::DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ArticleNotFound(article.code.clone()).into());
        }

        Ok(())
    }

    /// Deletes an article by code.
    ///
    /// Articles referenced by ledger entries cannot be deleted (RESTRICT);
    /// the attempt fails with a foreign key violation, keeping the audit
    /// trail intact.
    pub async fn delete(&self, code: &str) -> ServiceResult<()> {
        debug!(code = %code, "Deleting article");

        let result = sqlx::query("DELETE FROM articles WHERE code = ?1")
            .bind(code)
            .execute(&self.pool)
            .await
            .map_err(crate::error::DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ArticleNotFound(code.to_string()).into());
        }

        Ok(())
    }

    /// Gets an article by its code.
    pub async fn get_by_code(&self, code: &str) -> ServiceResult<Option<Article>> {
        let article = sqlx::query_as::<_, Article>(
            r#"
            SELECT code, name, category,
                   purchase_price_cents, sale_price_cents, alert_threshold,
                   barcode, supplier_id
            FROM articles
            WHERE code = ?1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(article)
    }

    /// Looks an article up by its barcode string.
    ///
    /// A camera or scanner feeds the decoded string here; this is the whole
    /// extent of barcode support in the data layer.
    pub async fn find_by_barcode(&self, barcode: &str) -> ServiceResult<Option<Article>> {
        let article = sqlx::query_as::<_, Article>(
            r#"
            SELECT code, name, category,
                   purchase_price_cents, sale_price_cents, alert_threshold,
                   barcode, supplier_id
            FROM articles
            WHERE barcode = ?1
            "#,
        )
        .bind(barcode)
        .fetch_optional(&self.pool)
        .await?;

        Ok(article)
    }

    /// Lists the catalog with supplier names, ordered by code.
    ///
    /// LEFT JOIN: articles without a supplier list with a NULL name instead
    /// of disappearing.
    pub async fn list(&self) -> ServiceResult<Vec<ArticleListing>> {
        let listings = sqlx::query_as::<_, ArticleListing>(
            r#"
            SELECT a.code, a.name, a.category,
                   a.purchase_price_cents, a.sale_price_cents, a.alert_threshold,
                   a.barcode, a.supplier_id,
                   f.name AS supplier_name
            FROM articles a
            LEFT JOIN suppliers f ON a.supplier_id = f.id
            ORDER BY a.code
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(listings)
    }

    /// Counts catalog entries (for diagnostics and seeding guards).
    pub async fn count(&self) -> ServiceResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

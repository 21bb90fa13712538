//! # Supplier Repository
//!
//! Database operations for suppliers. Only the name is mandatory; contact,
//! email and address are free-form optional fields.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::ServiceResult;
use magasin_core::validation::validate_name;
use magasin_core::{CoreError, Supplier};

/// Repository for supplier database operations.
#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    /// Creates a new SupplierRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    /// Inserts a new supplier and returns it with its assigned id.
    pub async fn insert(
        &self,
        name: &str,
        contact: Option<&str>,
        email: Option<&str>,
        address: Option<&str>,
    ) -> ServiceResult<Supplier> {
        validate_name(name)?;

        debug!(name = %name, "Inserting supplier");

        let result = sqlx::query(
            r#"
            INSERT INTO suppliers (name, contact, email, address)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(name)
        .bind(contact)
        .bind(email)
        .bind(address)
        .execute(&self.pool)
        .await
        .map_err(crate::error::DbError::from)?;

        Ok(Supplier {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            contact: contact.map(str::to_string),
            email: email.map(str::to_string),
            address: address.map(str::to_string),
        })
    }

    /// Updates an existing supplier.
    ///
    /// ## Errors
    /// - `CoreError::SupplierNotFound` when the id does not exist
    pub async fn update(&self, supplier: &Supplier) -> ServiceResult<()> {
        validate_name(&supplier.name)?;

        debug!(id = %supplier.id, "Updating supplier");

        let result = sqlx::query(
            r#"
            UPDATE suppliers SET
                name = ?2,
                contact = ?3,
                email = ?4,
                address = ?5
            WHERE id = ?1
            "#,
        )
        .bind(supplier.id)
        .bind(&supplier.name)
        .bind(&supplier.contact)
        .bind(&supplier.email)
        .bind(&supplier.address)
        .execute(&self.pool)
        .await
        .map_err(crate::error::DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::SupplierNotFound(supplier.id).into());
        }

        Ok(())
    }

    /// Deletes a supplier.
    ///
    /// Suppliers still referenced by articles cannot be deleted (RESTRICT);
    /// the attempt fails with a foreign key violation.
    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        debug!(id = %id, "Deleting supplier");

        let result = sqlx::query("DELETE FROM suppliers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(crate::error::DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::SupplierNotFound(id).into());
        }

        Ok(())
    }

    /// Gets a supplier by id.
    pub async fn get_by_id(&self, id: i64) -> ServiceResult<Option<Supplier>> {
        let supplier = sqlx::query_as::<_, Supplier>(
            "SELECT id, name, contact, email, address FROM suppliers WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(supplier)
    }

    /// Lists all suppliers, ordered by name.
    pub async fn list(&self) -> ServiceResult<Vec<Supplier>> {
        let suppliers = sqlx::query_as::<_, Supplier>(
            "SELECT id, name, contact, email, address FROM suppliers ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(suppliers)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

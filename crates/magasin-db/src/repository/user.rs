//! # User Repository
//!
//! Raw database operations for user rows. Credential rules (hashing,
//! duplicate checks, permission gates) live in [`crate::auth::AuthService`];
//! this module only moves rows.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use magasin_core::{Role, User, UserAccount};

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts a new user row and returns it with its assigned id.
    ///
    /// The caller supplies an already-hashed password. Uniqueness of the
    /// username is enforced by the schema; violations surface as
    /// [`crate::error::DbError::UniqueViolation`].
    pub async fn insert(
        &self,
        username: &str,
        password_hash: &str,
        role: Role,
        display_name: Option<&str>,
        must_change_password: bool,
    ) -> DbResult<User> {
        debug!(username = %username, role = %role, "Inserting user");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO users (
                username, password_hash, role, display_name,
                must_change_password, last_login, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6)
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(role)
        .bind(display_name)
        .bind(must_change_password)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(User {
            id: result.last_insert_rowid(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            role,
            display_name: display_name.map(str::to_string),
            must_change_password,
            last_login: None,
            created_at: now,
        })
    }

    /// Finds a user by username.
    pub async fn find_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, role, display_name,
                   must_change_password, last_login, created_at
            FROM users
            WHERE username = ?1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Gets a user by id.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, role, display_name,
                   must_change_password, last_login, created_at
            FROM users
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Lists all accounts, hash-free, ordered by username.
    pub async fn list(&self) -> DbResult<Vec<UserAccount>> {
        let accounts = sqlx::query_as::<_, UserAccount>(
            r#"
            SELECT id, username, role, display_name,
                   must_change_password, last_login
            FROM users
            ORDER BY username
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(accounts)
    }

    /// Updates role and/or display name. Absent fields keep their value.
    ///
    /// ## Returns
    /// Number of rows affected (0 when the id does not exist).
    pub async fn update_profile(
        &self,
        id: i64,
        role: Option<Role>,
        display_name: Option<&str>,
    ) -> DbResult<u64> {
        debug!(id = %id, "Updating user profile");

        let result = sqlx::query(
            r#"
            UPDATE users SET
                role = COALESCE(?2, role),
                display_name = COALESCE(?3, display_name)
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(role)
        .bind(display_name)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Replaces the password hash and clears the must-change flag.
    ///
    /// ## Returns
    /// Number of rows affected (0 when the id does not exist).
    pub async fn set_password(&self, id: i64, password_hash: &str) -> DbResult<u64> {
        debug!(id = %id, "Setting password");

        let result = sqlx::query(
            r#"
            UPDATE users SET
                password_hash = ?2,
                must_change_password = 0
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Records a successful login.
    pub async fn touch_last_login(&self, id: i64, when: DateTime<Utc>) -> DbResult<()> {
        sqlx::query("UPDATE users SET last_login = ?2 WHERE id = ?1")
            .bind(id)
            .bind(when)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Deletes a user row.
    ///
    /// Ledger entries recorded by the user survive: the movements table
    /// keeps its rows and nulls the user reference (ON DELETE SET NULL).
    ///
    /// ## Returns
    /// Number of rows affected (0 when the id does not exist).
    pub async fn delete(&self, id: i64) -> DbResult<u64> {
        debug!(id = %id, "Deleting user");

        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Counts accounts holding exactly the given role.
    pub async fn count_with_role(&self, role: Role) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = ?1")
            .bind(role)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use magasin_core::Role;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let db = test_db().await;
        let repo = db.users();

        let user = repo
            .insert("alice", "not-a-real-hash", Role::Seller, Some("Alice A"), false)
            .await
            .unwrap();
        assert!(user.id > 0);
        assert!(user.last_login.is_none());

        let found = repo.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(found.role, Role::Seller);
        assert_eq!(found.display_name.as_deref(), Some("Alice A"));

        assert!(repo.find_by_username("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_profile_keeps_absent_fields() {
        let db = test_db().await;
        let repo = db.users();

        let user = repo
            .insert("carol", "h", Role::Seller, Some("Carol"), false)
            .await
            .unwrap();

        let affected = repo
            .update_profile(user.id, Some(Role::Manager), None)
            .await
            .unwrap();
        assert_eq!(affected, 1);

        let updated = repo.get_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(updated.role, Role::Manager);
        // Display name untouched by the partial update.
        assert_eq!(updated.display_name.as_deref(), Some("Carol"));
    }

    #[tokio::test]
    async fn test_set_password_clears_flag() {
        let db = test_db().await;
        let repo = db.users();

        let user = repo.insert("dave", "h1", Role::Admin, None, true).await.unwrap();
        assert!(user.must_change_password);

        repo.set_password(user.id, "h2").await.unwrap();

        let updated = repo.get_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(updated.password_hash, "h2");
        assert!(!updated.must_change_password);
    }

    #[tokio::test]
    async fn test_count_with_role() {
        let db = test_db().await;
        let repo = db.users();

        repo.insert("a1", "h", Role::Admin, None, false).await.unwrap();
        repo.insert("s1", "h", Role::Seller, None, false).await.unwrap();
        repo.insert("s2", "h", Role::Seller, None, false).await.unwrap();

        assert_eq!(repo.count_with_role(Role::Admin).await.unwrap(), 1);
        assert_eq!(repo.count_with_role(Role::Seller).await.unwrap(), 2);
        assert_eq!(repo.count_with_role(Role::Manager).await.unwrap(), 0);
    }
}

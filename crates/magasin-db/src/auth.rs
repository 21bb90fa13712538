//! # Authentication Service
//!
//! Password hashing, login, and admin-gated user management.
//!
//! ## Session Model
//! ```text
//! login("alice", "pw")
//!      │
//!      ▼
//! Session { user_id, role, ... }     an explicit value, not global state
//!      │
//!      ├──► session.has_permission(Role::Manager)   minimum-role check
//!      │
//!      └──► auth.list_users(&session)               admin-gated operations
//!                                                   take the session
//! ```
//! Operations that need authorization take `&Session`; an unauthenticated
//! caller simply has nothing to pass. Several logical sessions can coexist
//! (tests, future multi-window shells) without interfering.
//!
//! ## Hashing
//! Argon2 with a fresh random salt per call: hashing the same password twice
//! yields two different strings that both verify. Parameters travel inside
//! the PHC-format hash string, so they can be tuned without invalidating
//! stored hashes.

use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use chrono::Utc;
use tracing::{info, warn};

use crate::error::{DbError, ServiceError, ServiceResult};
use magasin_core::validation::{validate_password, validate_username};
use magasin_core::{
    CoreError, Role, Session, UserAccount, ValidationError, BOOTSTRAP_ADMIN_USERNAME,
};

use crate::repository::user::UserRepository;

/// Authentication and user management service.
///
/// ## Usage
/// ```rust,ignore
/// let auth = db.auth();
/// auth.register("alice", "secret", Role::Seller, Some("Alice A")).await?;
/// let session = auth.login("alice", "secret").await?;
/// let users = auth.list_users(&admin_session).await?;
/// ```
#[derive(Debug, Clone)]
pub struct AuthService {
    users: UserRepository,
}

impl AuthService {
    /// Creates a new AuthService over the user repository.
    pub fn new(users: UserRepository) -> Self {
        AuthService { users }
    }

    // =========================================================================
    // Hashing
    // =========================================================================

    /// Hashes a password with a fresh random salt.
    ///
    /// Non-deterministic by design: two calls on the same password produce
    /// different strings, and both verify.
    pub fn hash_password(password: &str) -> ServiceResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| ServiceError::PasswordHash(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// True iff the password matches the stored hash.
    ///
    /// Unparseable hashes verify as false rather than erroring; a corrupted
    /// row reads as a wrong password, not a crash.
    pub fn verify_password(password: &str, hash: &str) -> bool {
        PasswordHash::new(hash)
            .map(|parsed| {
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }

    // =========================================================================
    // Registration & Login
    // =========================================================================

    /// Registers a new user.
    ///
    /// ## Errors
    /// - `CoreError::DuplicateUser` when the username is taken; the existing
    ///   account is left untouched
    /// - Validation failure on the username or an empty password
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        role: Role,
        display_name: Option<&str>,
    ) -> ServiceResult<UserAccount> {
        validate_username(username)?;
        validate_password(password)?;

        let username = username.trim();

        if self.users.find_by_username(username).await?.is_some() {
            return Err(CoreError::DuplicateUser(username.to_string()).into());
        }

        let hash = Self::hash_password(password)?;

        // The UNIQUE index also guards the race between the check above and
        // this insert; translate it to the same domain error.
        let user = self
            .users
            .insert(username, &hash, role, display_name, false)
            .await
            .map_err(|e| match e {
                DbError::UniqueViolation { .. } => {
                    ServiceError::Core(CoreError::DuplicateUser(username.to_string()))
                }
                other => ServiceError::Db(other),
            })?;

        info!(username = %username, role = %role, "User registered");
        Ok(user.into())
    }

    /// Authenticates a user and opens a session.
    ///
    /// On success the last-login timestamp is updated and a [`Session`]
    /// snapshot is returned. `previous_login` carries the login before this
    /// one, for "welcome back" displays.
    ///
    /// ## Errors
    /// - `CoreError::UserNotFound` for unknown usernames
    /// - `CoreError::BadPassword` for a wrong password
    pub async fn login(&self, username: &str, password: &str) -> ServiceResult<Session> {
        let user = self
            .users
            .find_by_username(username.trim())
            .await?
            .ok_or_else(|| CoreError::UserNotFound(username.trim().to_string()))?;

        if !Self::verify_password(password, &user.password_hash) {
            warn!(username = %user.username, "Login refused: bad password");
            return Err(CoreError::BadPassword.into());
        }

        let now = Utc::now();
        self.users.touch_last_login(user.id, now).await?;

        info!(username = %user.username, role = %user.role, "Login successful");

        Ok(Session {
            user_id: user.id,
            username: user.username,
            role: user.role,
            display_name: user.display_name,
            previous_login: user.last_login,
            logged_in_at: now,
            must_change_password: user.must_change_password,
        })
    }

    /// Closes a session.
    ///
    /// Sessions are plain values, so this only consumes and logs; there is
    /// no server-side state to clear.
    pub fn logout(&self, session: Session) {
        info!(username = %session.username, "Logout");
    }

    // =========================================================================
    // Password Changes
    // =========================================================================

    /// Changes a user's password.
    ///
    /// Two paths:
    /// - a user changes their own password and must supply the current one;
    /// - an admin session resets any password without the current one.
    ///
    /// Either way the account's must-change flag is cleared.
    pub async fn change_password(
        &self,
        session: &Session,
        user_id: i64,
        current_password: Option<&str>,
        new_password: &str,
    ) -> ServiceResult<()> {
        let is_admin = session.has_permission(Role::Admin);
        let is_own_account = session.user_id == user_id;

        if !(is_admin || is_own_account) {
            return Err(CoreError::PermissionDenied {
                required: Role::Admin,
            }
            .into());
        }

        validate_password(new_password)?;

        let user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| CoreError::UserNotFound(user_id.to_string()))?;

        if !is_admin {
            let current = current_password.ok_or(ValidationError::Required {
                field: "current_password".to_string(),
            })?;
            if !Self::verify_password(current, &user.password_hash) {
                warn!(username = %user.username, "Password change refused: bad current password");
                return Err(CoreError::BadPassword.into());
            }
        }

        let hash = Self::hash_password(new_password)?;
        self.users.set_password(user_id, &hash).await?;

        info!(username = %user.username, by = %session.username, "Password changed");
        Ok(())
    }

    // =========================================================================
    // Admin-Gated Management
    // =========================================================================

    /// Lists all accounts. Admin only.
    pub async fn list_users(&self, session: &Session) -> ServiceResult<Vec<UserAccount>> {
        session.require(Role::Admin)?;
        Ok(self.users.list().await?)
    }

    /// Updates a user's role and/or display name. Admin only.
    ///
    /// At least one field must be provided.
    pub async fn update_user(
        &self,
        session: &Session,
        user_id: i64,
        role: Option<Role>,
        display_name: Option<&str>,
    ) -> ServiceResult<()> {
        session.require(Role::Admin)?;

        if role.is_none() && display_name.is_none() {
            return Err(ValidationError::Required {
                field: "role or display_name".to_string(),
            }
            .into());
        }

        let affected = self.users.update_profile(user_id, role, display_name).await?;
        if affected == 0 {
            return Err(CoreError::UserNotFound(user_id.to_string()).into());
        }

        info!(user_id = %user_id, by = %session.username, "User updated");
        Ok(())
    }

    /// Deletes a user account. Admin only.
    ///
    /// The user's ledger entries survive with a nulled user reference.
    pub async fn delete_user(&self, session: &Session, user_id: i64) -> ServiceResult<()> {
        session.require(Role::Admin)?;

        let affected = self.users.delete(user_id).await?;
        if affected == 0 {
            return Err(CoreError::UserNotFound(user_id.to_string()).into());
        }

        info!(user_id = %user_id, by = %session.username, "User deleted");
        Ok(())
    }

    // =========================================================================
    // Bootstrap
    // =========================================================================

    /// First-run provisioning: creates the `admin` account when no
    /// admin-role user exists yet.
    ///
    /// The initial password comes from the caller (an installer prompt, a
    /// seed flag), never from a built-in default, and the account is flagged
    /// must-change-password so the first login forces a reset.
    ///
    /// ## Returns
    /// `true` when an account was created, `false` when an admin already
    /// existed (idempotent).
    pub async fn bootstrap_admin(&self, initial_password: &str) -> ServiceResult<bool> {
        if self.users.count_with_role(Role::Admin).await? > 0 {
            return Ok(false);
        }

        validate_password(initial_password)?;
        let hash = Self::hash_password(initial_password)?;

        self.users
            .insert(
                BOOTSTRAP_ADMIN_USERNAME,
                &hash,
                Role::Admin,
                Some("Administrator"),
                true,
            )
            .await?;

        info!(username = %BOOTSTRAP_ADMIN_USERNAME, "Bootstrap admin account created");
        Ok(true)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    /// Registers an admin and returns a logged-in admin session.
    async fn admin_session(auth: &AuthService) -> Session {
        auth.register("root", "rootpw", Role::Admin, None)
            .await
            .unwrap();
        auth.login("root", "rootpw").await.unwrap()
    }

    #[test]
    fn test_hash_verify_roundtrip() {
        let hash = AuthService::hash_password("secret").unwrap();
        assert!(AuthService::verify_password("secret", &hash));
        assert!(!AuthService::verify_password("not-secret", &hash));
    }

    #[test]
    fn test_hash_is_salted() {
        // Fresh salt per call: different strings, both verify.
        let h1 = AuthService::hash_password("secret").unwrap();
        let h2 = AuthService::hash_password("secret").unwrap();
        assert_ne!(h1, h2);
        assert!(AuthService::verify_password("secret", &h1));
        assert!(AuthService::verify_password("secret", &h2));
    }

    #[test]
    fn test_verify_garbage_hash_is_false() {
        assert!(!AuthService::verify_password("secret", "not-a-phc-string"));
    }

    #[tokio::test]
    async fn test_register_login_permissions() {
        let db = test_db().await;
        let auth = db.auth();

        auth.register("alice", "pw1", Role::Seller, Some("Alice A"))
            .await
            .unwrap();

        let session = auth.login("alice", "pw1").await.unwrap();
        assert_eq!(session.role, Role::Seller);
        assert_eq!(session.display_name.as_deref(), Some("Alice A"));
        assert!(session.previous_login.is_none());

        assert!(session.has_permission(Role::Seller));
        assert!(!session.has_permission(Role::Admin));

        auth.logout(session);
    }

    #[tokio::test]
    async fn test_login_failures() {
        let db = test_db().await;
        let auth = db.auth();

        auth.register("alice", "pw1", Role::Seller, None).await.unwrap();

        let err = auth.login("nobody", "pw1").await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::UserNotFound(_))));

        let err = auth.login("alice", "wrong").await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::BadPassword)));
    }

    #[tokio::test]
    async fn test_login_records_previous_login() {
        let db = test_db().await;
        let auth = db.auth();

        auth.register("alice", "pw1", Role::Seller, None).await.unwrap();

        let first = auth.login("alice", "pw1").await.unwrap();
        let second = auth.login("alice", "pw1").await.unwrap();

        // Storage precision may differ from the in-memory timestamp, so
        // compare within a second rather than exactly.
        let previous = second.previous_login.expect("previous login recorded");
        assert!((previous - first.logged_in_at).num_milliseconds().abs() < 1000);
    }

    #[tokio::test]
    async fn test_duplicate_registration_mutates_nothing() {
        let db = test_db().await;
        let auth = db.auth();

        auth.register("alice", "pw1", Role::Seller, None).await.unwrap();
        let err = auth
            .register("alice", "other", Role::Admin, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::DuplicateUser(_))));

        // The original account still works and kept its role.
        let session = auth.login("alice", "pw1").await.unwrap();
        assert_eq!(session.role, Role::Seller);
    }

    #[tokio::test]
    async fn test_admin_gates() {
        let db = test_db().await;
        let auth = db.auth();

        let admin = admin_session(&auth).await;
        auth.register("alice", "pw1", Role::Seller, None).await.unwrap();
        let seller = auth.login("alice", "pw1").await.unwrap();

        // Admin passes every gate.
        let users = auth.list_users(&admin).await.unwrap();
        assert_eq!(users.len(), 2);

        // Seller is refused everywhere.
        assert!(auth.list_users(&seller).await.unwrap_err().is_permission_denied());
        assert!(auth
            .update_user(&seller, admin.user_id, Some(Role::Seller), None)
            .await
            .unwrap_err()
            .is_permission_denied());
        assert!(auth
            .delete_user(&seller, admin.user_id)
            .await
            .unwrap_err()
            .is_permission_denied());
    }

    #[tokio::test]
    async fn test_update_and_delete_user() {
        let db = test_db().await;
        let auth = db.auth();

        let admin = admin_session(&auth).await;
        let alice = auth
            .register("alice", "pw1", Role::Seller, None)
            .await
            .unwrap();

        auth.update_user(&admin, alice.id, Some(Role::Manager), Some("Alice A"))
            .await
            .unwrap();
        let session = auth.login("alice", "pw1").await.unwrap();
        assert_eq!(session.role, Role::Manager);
        assert_eq!(session.display_name.as_deref(), Some("Alice A"));

        // No-field update is refused.
        assert!(auth.update_user(&admin, alice.id, None, None).await.is_err());

        auth.delete_user(&admin, alice.id).await.unwrap();
        let err = auth.login("alice", "pw1").await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_change_own_password_requires_current() {
        let db = test_db().await;
        let auth = db.auth();

        auth.register("alice", "pw1", Role::Seller, None).await.unwrap();
        let session = auth.login("alice", "pw1").await.unwrap();

        // Wrong current password refused.
        let err = auth
            .change_password(&session, session.user_id, Some("wrong"), "pw2")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::BadPassword)));

        // Missing current password refused.
        assert!(auth
            .change_password(&session, session.user_id, None, "pw2")
            .await
            .is_err());

        // Correct current password works.
        auth.change_password(&session, session.user_id, Some("pw1"), "pw2")
            .await
            .unwrap();
        assert!(auth.login("alice", "pw1").await.is_err());
        auth.login("alice", "pw2").await.unwrap();
    }

    #[tokio::test]
    async fn test_admin_resets_password_without_current() {
        let db = test_db().await;
        let auth = db.auth();

        let admin = admin_session(&auth).await;
        let alice = auth
            .register("alice", "pw1", Role::Seller, None)
            .await
            .unwrap();

        auth.change_password(&admin, alice.id, None, "fresh").await.unwrap();
        auth.login("alice", "fresh").await.unwrap();
    }

    #[tokio::test]
    async fn test_seller_cannot_change_another_users_password() {
        let db = test_db().await;
        let auth = db.auth();

        auth.register("alice", "pw1", Role::Seller, None).await.unwrap();
        let bob = auth.register("bob", "pw2", Role::Seller, None).await.unwrap();
        let alice = auth.login("alice", "pw1").await.unwrap();

        let err = auth
            .change_password(&alice, bob.id, Some("pw2"), "hijacked")
            .await
            .unwrap_err();
        assert!(err.is_permission_denied());
    }

    #[tokio::test]
    async fn test_bootstrap_admin_is_idempotent() {
        let db = test_db().await;
        let auth = db.auth();

        assert!(auth.bootstrap_admin("initial").await.unwrap());
        assert!(!auth.bootstrap_admin("initial").await.unwrap());
        assert!(!auth.bootstrap_admin("another").await.unwrap());

        // Exactly one admin, flagged for a forced password change.
        let session = auth.login(BOOTSTRAP_ADMIN_USERNAME, "initial").await.unwrap();
        assert_eq!(session.role, Role::Admin);
        assert!(session.must_change_password);

        // The forced change clears the flag.
        auth.change_password(&session, session.user_id, None, "chosen")
            .await
            .unwrap();
        let session = auth.login(BOOTSTRAP_ADMIN_USERNAME, "chosen").await.unwrap();
        assert!(!session.must_change_password);
    }
}

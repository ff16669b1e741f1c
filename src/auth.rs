//! Authentication and session management
//!
//! User directory plus the current-session pointer. The session is a
//! per-handle cache of the signed-in user, re-derived from the store on
//! attach; the store only persists `current_user_id`.
//!
//! Passwords are compared in plaintext equality. That is the preserved MVP
//! contract, not an oversight to fix here.

use crate::store::types::User;
use crate::store::PersistentStore;
use crate::util;
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors that can occur in authentication and profile operations
#[derive(Debug, Error)]
pub enum AuthError {
    /// Malformed or missing input
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The email is already registered (case-sensitive match)
    #[error("This email is already registered")]
    DuplicateEmail,

    /// Wrong email or wrong password; deliberately indistinguishable
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// No signed-in user
    #[error("Not signed in")]
    NotAuthenticated,

    /// The session points at a user that no longer exists
    #[error("User not found")]
    UserNotFound,
}

/// Input for [`AuthManager::signup`]
#[derive(Debug, Clone)]
pub struct SignupData {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: Option<String>,
}

/// Field-whitelist patch for [`AuthManager::update_profile`]
///
/// Only the fields below can be changed; unknown fields cannot be injected
/// into the stored record.
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl ProfilePatch {
    fn apply(self, user: &mut User) {
        if let Some(full_name) = self.full_name {
            user.full_name = full_name;
        }
        if let Some(phone) = self.phone {
            user.phone = Some(phone);
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(password) = self.password {
            user.password = password;
        }
    }
}

/// User registration, login/logout, and profile updates
pub struct AuthManager {
    store: Arc<PersistentStore>,
    /// Cached copy of the signed-in user for this handle's lifetime
    current: RwLock<Option<User>>,
}

impl AuthManager {
    /// Attach to a store, re-deriving the session from `current_user_id`
    pub async fn attach(store: Arc<PersistentStore>) -> Self {
        let current = store.read(|s| s.current_user().cloned()).await;
        if let Some(user) = &current {
            tracing::debug!(user_id = %user.id, "restored session from store");
        }
        Self {
            store,
            current: RwLock::new(current),
        }
    }

    /// Register a new user and establish their session
    pub async fn signup(&self, data: SignupData) -> Result<User, AuthError> {
        if data.email.trim().is_empty()
            || data.password.is_empty()
            || data.full_name.trim().is_empty()
        {
            return Err(AuthError::Validation("all fields are required".to_string()));
        }
        if !util::is_valid_email(&data.email) {
            return Err(AuthError::Validation("invalid email address".to_string()));
        }
        if data.password.len() < 6 {
            return Err(AuthError::Validation(
                "password must be at least 6 characters".to_string(),
            ));
        }
        if let Some(phone) = &data.phone {
            if !util::is_valid_phone(phone) {
                return Err(AuthError::Validation("invalid phone number".to_string()));
            }
        }

        let user = User {
            id: util::generate_id(),
            email: data.email,
            password: data.password,
            full_name: data.full_name,
            phone: data.phone,
            created_at: Utc::now(),
            appointments: Vec::new(),
            tickets: Vec::new(),
        };

        // Uniqueness check and insert run in one closure under the write
        // lock, so two concurrent signups cannot both claim one email
        self.store
            .update_if(|s| {
                if s.user_by_email(&user.email).is_some() {
                    return (false, Err(AuthError::DuplicateEmail));
                }
                s.users.push(user.clone());
                s.current_user_id = Some(user.id.clone());
                (true, Ok(()))
            })
            .await?;

        *self.current.write().await = Some(user.clone());
        tracing::info!(user_id = %user.id, "user signed up");

        Ok(user)
    }

    /// Sign in with exact email and password equality
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let user = self
            .store
            .read(|s| {
                s.users
                    .iter()
                    .find(|u| u.email == email && u.password == password)
                    .cloned()
            })
            .await
            .ok_or(AuthError::InvalidCredentials)?;

        self.store
            .update(|s| s.current_user_id = Some(user.id.clone()))
            .await;

        *self.current.write().await = Some(user.clone());
        tracing::info!(user_id = %user.id, "user logged in");

        Ok(user)
    }

    /// Clear the session
    pub async fn logout(&self) {
        self.store.update(|s| s.current_user_id = None).await;
        *self.current.write().await = None;
        tracing::info!("user logged out");
    }

    /// Whether this handle has a cached signed-in user
    pub async fn is_authenticated(&self) -> bool {
        self.current.read().await.is_some()
    }

    /// Cached copy of the signed-in user
    pub async fn current_user(&self) -> Option<User> {
        self.current.read().await.clone()
    }

    /// Merge a whitelisted patch into the signed-in user's record
    pub async fn update_profile(&self, patch: ProfilePatch) -> Result<User, AuthError> {
        let current_id = self
            .current
            .read()
            .await
            .as_ref()
            .map(|u| u.id.clone())
            .ok_or(AuthError::NotAuthenticated)?;

        // Defensive: the directory entry can only be missing if the blob
        // was rewritten underneath us
        let exists = self
            .store
            .read(|s| s.user_by_id(&current_id).is_some())
            .await;
        if !exists {
            return Err(AuthError::UserNotFound);
        }

        let updated = self
            .store
            .update(move |s| {
                let user = s.user_by_id_mut(&current_id)?;
                patch.apply(user);
                Some(user.clone())
            })
            .await
            .ok_or(AuthError::UserNotFound)?;

        *self.current.write().await = Some(updated.clone());
        tracing::debug!(user_id = %updated.id, "profile updated");

        Ok(updated)
    }

    /// Re-read the cached user from the store
    ///
    /// Called after another manager appends to the session user's
    /// back-reference lists, and after remote changes are applied.
    pub async fn refresh(&self) {
        let mut current = self.current.write().await;
        if let Some(cached) = current.as_ref() {
            let id = cached.id.clone();
            if let Some(fresh) = self.store.read(|s| s.user_by_id(&id).cloned()).await {
                *current = Some(fresh);
            }
        }
    }
}

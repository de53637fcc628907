//! Admin authentication.
//!
//! A single admin account is configured through the environment. A successful
//! login issues an opaque bearer token held in memory until logout or restart.

use crate::{
    config::admin::AdminCredentials,
    errors::{Error, Result},
};
use std::{collections::HashSet, sync::Arc};
use tokio::sync::RwLock;

/// Checks a login attempt against the configured admin account.
///
/// The email is compared case-insensitively after trimming; the password must
/// match exactly.
pub fn verify_admin(
    admin: Option<&AdminCredentials>,
    email: &str,
    password: &str,
) -> Result<()> {
    let admin = admin.ok_or(Error::AdminNotConfigured)?;
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(Error::InvalidCredentials);
    }
    if !email.eq_ignore_ascii_case(&admin.email) || password != admin.password {
        tracing::warn!(email, "rejected admin login");
        return Err(Error::InvalidCredentials);
    }
    Ok(())
}

/// Live admin session tokens; clones share the same set.
#[derive(Debug, Clone, Default)]
pub struct AdminSessions {
    tokens: Arc<RwLock<HashSet<String>>>,
}

impl AdminSessions {
    /// Verifies the credentials and opens a session.
    ///
    /// Returns the new bearer token.
    pub async fn login(
        &self,
        admin: Option<&AdminCredentials>,
        email: &str,
        password: &str,
    ) -> Result<String> {
        verify_admin(admin, email, password)?;
        let token = uuid::Uuid::new_v4().to_string();
        self.tokens.write().await.insert(token.clone());
        tracing::info!("admin logged in");
        Ok(token)
    }

    /// Whether `token` belongs to an open session
    pub async fn is_valid(&self, token: &str) -> bool {
        self.tokens.read().await.contains(token)
    }

    /// Closes a session. Returns `false` if it was not open.
    pub async fn logout(&self, token: &str) -> bool {
        self.tokens.write().await.remove(token)
    }
}

//! Admin account configuration.
//!
//! The storefront has a single admin account whose credentials live in the
//! `ADMIN_EMAIL` and `ADMIN_PASSWORD` environment variables (usually via `.env`).

/// Configured admin email and password
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminCredentials {
    /// Login email
    pub email: String,
    /// Login password
    pub password: String,
}

/// Reads the admin credentials from the environment.
///
/// Returns `None` unless both variables are set and non-empty.
#[must_use]
pub fn get_admin_credentials() -> Option<AdminCredentials> {
    let email = std::env::var("ADMIN_EMAIL").ok()?;
    let password = std::env::var("ADMIN_PASSWORD").ok()?;
    if email.trim().is_empty() || password.is_empty() {
        tracing::warn!("ADMIN_EMAIL or ADMIN_PASSWORD is empty; admin login disabled");
        return None;
    }
    Some(AdminCredentials {
        email: email.trim().to_string(),
        password,
    })
}

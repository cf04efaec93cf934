//! Admin user management commands.
//!
//! # Usage
//!
//! ```bash
//! # Create a new admin account
//! kanak-cli admin create -e admin@kanakjewels.in -n "Store Admin" -p 'long-password'
//!
//! # Promote an existing account (optionally resetting its password)
//! kanak-cli admin create -e owner@kanakjewels.in -n "Owner" --promote
//! ```

use kanak_core::{Email, UserId, UserRole};
use kanak_storefront::db::UserRepository;
use kanak_storefront::services::auth::{
    AuthError, AuthService, Registration, hash_password, validate_password,
};
use thiserror::Error;

use super::{ConnectError, connect};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// Account creation or password rules failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// User already exists and `--promote` wasn't given.
    #[error("User already exists with email: {0} (use --promote)")]
    UserExists(String),

    /// `--promote` on an email with no account, and no password to create one.
    #[error("No user with email {0}; pass --password to create one")]
    PasswordRequired(String),
}

/// Create an admin account, or promote an existing one when `promote` is set.
///
/// Returns the id of the admin user.
///
/// # Errors
///
/// Returns `AdminError::UserExists` if the email is taken and `promote` is false.
/// Returns `AdminError::Auth` if the password or name is rejected.
pub async fn create_user(
    email: &str,
    name: &str,
    password: Option<&str>,
    promote: bool,
) -> Result<UserId, AdminError> {
    let parsed = Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;
    if let Some(password) = password {
        validate_password(password)?;
    }

    let pool = connect().await?;
    let users = UserRepository::new(&pool);

    if let Some(existing) = users.get_by_email(&parsed).await.map_err(AuthError::from)? {
        if !promote {
            return Err(AdminError::UserExists(email.to_owned()));
        }

        let user = users
            .set_role(existing.id, UserRole::Admin)
            .await
            .map_err(AuthError::from)?;
        if let Some(password) = password {
            let hash = hash_password(password)?;
            users
                .set_password_hash(user.id, &hash)
                .await
                .map_err(AuthError::from)?;
            tracing::info!("Password reset for {}", user.email);
        }

        tracing::info!(
            "User promoted to admin! ID: {}, Email: {}, Previous role: {}",
            user.id,
            user.email,
            existing.role
        );
        return Ok(user.id);
    }

    let password = password.ok_or_else(|| AdminError::PasswordRequired(email.to_owned()))?;
    let user = AuthService::new(&pool)
        .create_account(
            &Registration {
                email,
                password,
                name,
                phone: None,
            },
            UserRole::Admin,
        )
        .await?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );

    Ok(user.id)
}

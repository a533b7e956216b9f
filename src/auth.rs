//! Password hashing and account helpers.
//!
//! Hashing uses bcrypt at a fixed cost. Both hashing and verification are
//! CPU-bound, so they run on the blocking thread pool.

use chrono::Utc;
use tokio::task;
use tracing::warn;
use uuid::Uuid;

use crate::{
    db::models::{Role, User},
    error::{StoreError, StoreResult},
};

/// bcrypt work factor.
pub const BCRYPT_COST: u32 = 10;

/// Shortest password accepted for new or changed accounts.
pub const MIN_PASSWORD_LEN: usize = 6;

pub const DEFAULT_USERNAME: &str = "admin";
pub const DEFAULT_EMAIL: &str = "admin@metertracker.com";
pub const DEFAULT_PASSWORD: &str = "admin123";

/// Cost-10 bcrypt hash checked when a login names an unknown user, so that
/// path costs the same as a wrong password. No password is known to match it.
pub const UNKNOWN_USER_HASH: &str = "$2b$10$abcdefghijklmnopqrstuuGiyufoQMe2v6ebEjuAqN07Mo4IiRnnq";

pub async fn hash_password(password: &str) -> StoreResult<String> {
    let password = password.to_owned();
    task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST))
        .await
        .map_err(|e| StoreError::Hashing(e.to_string()))?
        .map_err(|e| StoreError::Hashing(e.to_string()))
}

/// Check `password` against a stored bcrypt hash.
///
/// Every failure, including a malformed hash, is reported as `false`.
pub async fn verify_password(password: &str, password_hash: &str) -> bool {
    let password = password.to_owned();
    let password_hash = password_hash.to_owned();

    match task::spawn_blocking(move || bcrypt::verify(password, &password_hash)).await {
        Ok(Ok(valid)) => valid,
        Ok(Err(e)) => {
            warn!(error = %e, "Stored password hash could not be checked");
            false
        }
        Err(e) => {
            warn!(error = %e, "Password verification task failed");
            false
        }
    }
}

/// Loose `local@domain.tld` shape check: one `@`, no whitespace, and a dot
/// inside the domain with text on both sides.
pub fn validate_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// The bootstrap administrator created when no accounts exist.
pub async fn create_default_user() -> StoreResult<User> {
    Ok(User {
        id: Uuid::new_v4(),
        username: DEFAULT_USERNAME.to_owned(),
        email: DEFAULT_EMAIL.to_owned(),
        password_hash: hash_password(DEFAULT_PASSWORD).await?,
        role: Role::Admin,
        is_default: true,
        created_at: Utc::now(),
        last_login: None,
    })
}

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use super::errors::{AppError, Unauthorized};
use crate::{db::models::User, store::AppStore};

/// Header carrying the id of the user a request acts for.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The user named by the [`USER_ID_HEADER`] header.
///
/// Rejects with 401 when the header is missing, malformed, or names an
/// unknown account.
#[derive(Debug, Clone)]
pub struct Actor(pub User);

impl FromRequestParts<AppStore> for Actor {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, store: &AppStore) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| Unauthorized(format!("missing {USER_ID_HEADER} header")))?;

        let id = Uuid::parse_str(raw.trim())
            .map_err(|_| Unauthorized(format!("malformed {USER_ID_HEADER} header")))?;

        let user = store
            .user(id)
            .await
            .map_err(|_| Unauthorized("unknown user".to_owned()))?;

        Ok(Self(user))
    }
}

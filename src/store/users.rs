use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{AppStore, Collection, State};
use crate::{
    auth,
    db::models::{ActivityAction, EntityType, Role, User},
    error::{StoreError, StoreResult},
};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Changes to an existing account. The password is only replaced when given.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UserUpdate {
    pub username: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub password: Option<String>,
}

/// Field checks that do not depend on other accounts.
fn validate_fields(username: &str, email: &str, password: Option<&str>) -> StoreResult<()> {
    if username.trim().is_empty() {
        return Err(StoreError::validation("username is required"));
    }
    if email.trim().is_empty() {
        return Err(StoreError::validation("email is required"));
    }
    if !auth::validate_email(email) {
        return Err(StoreError::validation("email is not valid"));
    }
    if let Some(password) = password {
        if password.chars().count() < auth::MIN_PASSWORD_LEN {
            return Err(StoreError::validation(format!(
                "password must be at least {} characters",
                auth::MIN_PASSWORD_LEN
            )));
        }
    }
    Ok(())
}

/// Username and email must be unique among all accounts other than `exclude`.
fn check_unique(state: &State, username: &str, email: &str, exclude: Option<Uuid>) -> StoreResult<()> {
    let others = || state.users.iter().filter(move |u| Some(u.id) != exclude);
    if others().any(|u| u.username == username) {
        return Err(StoreError::conflict("username already exists"));
    }
    if others().any(|u| u.email == email) {
        return Err(StoreError::conflict("email already exists"));
    }
    Ok(())
}

fn require_admin(actor: &User) -> StoreResult<()> {
    match actor.role {
        Role::Admin => Ok(()),
        Role::User => Err(StoreError::Forbidden(
            "only administrators can manage users".to_owned(),
        )),
    }
}

impl AppStore {
    pub async fn list_users(&self) -> Vec<User> {
        self.inner.read().await.users.clone()
    }

    pub async fn user(&self, id: Uuid) -> StoreResult<User> {
        self.inner
            .read()
            .await
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(StoreError::not_found("user"))
    }

    /// Create the default administrator if there are no accounts yet.
    ///
    /// Returns `true` when an account was created.
    pub async fn ensure_default_user(&self) -> StoreResult<bool> {
        if !self.inner.read().await.users.is_empty() {
            return Ok(false);
        }

        let user = auth::create_default_user().await?;

        let mut state = self.inner.write().await;
        // Another caller may have created it while we were hashing.
        if !state.users.is_empty() {
            return Ok(false);
        }
        state.users.push(user);
        self.persist(&state, &[Collection::Users]).await?;

        warn!(
            username = auth::DEFAULT_USERNAME,
            "Created default administrator account; change its password"
        );
        Ok(true)
    }

    pub async fn create_user(&self, actor: &User, input: NewUser) -> StoreResult<User> {
        require_admin(actor)?;
        validate_fields(&input.username, &input.email, Some(&input.password))?;
        check_unique(&*self.inner.read().await, &input.username, &input.email, None)?;

        let password_hash = auth::hash_password(&input.password).await?;
        let user = User {
            id: Uuid::new_v4(),
            username: input.username,
            email: input.email,
            password_hash,
            role: input.role,
            is_default: false,
            created_at: Utc::now(),
            last_login: None,
        };

        let mut state = self.inner.write().await;
        check_unique(&state, &user.username, &user.email, None)?;
        state.users.push(user.clone());
        state.activities.record(
            actor,
            ActivityAction::Create,
            EntityType::User,
            format!("Created user {}", user.username),
            Some(user.id),
        );
        self.persist(&state, &[Collection::Users, Collection::Activities])
            .await?;

        info!(user_id = %user.id, username = %user.username, "User created");
        Ok(user)
    }

    pub async fn update_user(&self, actor: &User, id: Uuid, input: UserUpdate) -> StoreResult<User> {
        require_admin(actor)?;
        let password = input.password.as_deref().filter(|p| !p.is_empty());
        validate_fields(&input.username, &input.email, password)?;

        let password_hash = match password {
            Some(p) => Some(auth::hash_password(p).await?),
            None => None,
        };

        let mut state = self.inner.write().await;
        check_unique(&state, &input.username, &input.email, Some(id))?;
        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(StoreError::not_found("user"))?;

        user.username = input.username;
        user.email = input.email;
        user.role = input.role;
        if let Some(hash) = password_hash {
            user.password_hash = hash;
        }
        let updated = user.clone();

        state.activities.record(
            actor,
            ActivityAction::Update,
            EntityType::User,
            format!("Updated user {}", updated.username),
            Some(id),
        );
        self.persist(&state, &[Collection::Users, Collection::Activities])
            .await?;

        Ok(updated)
    }

    /// Remove an account. The default administrator cannot be removed.
    pub async fn delete_user(&self, actor: &User, id: Uuid) -> StoreResult<User> {
        require_admin(actor)?;

        let mut state = self.inner.write().await;
        let index = state
            .users
            .iter()
            .position(|u| u.id == id)
            .ok_or(StoreError::not_found("user"))?;
        if state.users[index].is_default {
            return Err(StoreError::Forbidden(
                "the default account cannot be deleted".to_owned(),
            ));
        }

        let removed = state.users.remove(index);
        state.activities.record(
            actor,
            ActivityAction::Delete,
            EntityType::User,
            format!("Deleted user {}", removed.username),
            Some(id),
        );
        self.persist(&state, &[Collection::Users, Collection::Activities])
            .await?;

        Ok(removed)
    }

    /// Check credentials and record the login.
    ///
    /// An unknown username and a wrong password both yield
    /// [`StoreError::InvalidCredentials`].
    pub async fn login(&self, username: &str, password: &str) -> StoreResult<User> {
        let candidate = self
            .inner
            .read()
            .await
            .users
            .iter()
            .find(|u| u.username == username)
            .map(|u| (u.id, u.password_hash.clone()));

        let Some((id, password_hash)) = candidate else {
            auth::verify_password(password, auth::UNKNOWN_USER_HASH).await;
            return Err(StoreError::InvalidCredentials);
        };
        if !auth::verify_password(password, &password_hash).await {
            return Err(StoreError::InvalidCredentials);
        }

        let mut state = self.inner.write().await;
        // Deleted between the check and now.
        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(StoreError::InvalidCredentials)?;
        user.last_login = Some(Utc::now());
        let user = user.clone();

        state.activities.record(
            &user,
            ActivityAction::Login,
            EntityType::User,
            format!("User {} logged in", user.username),
            None,
        );
        self.persist(&state, &[Collection::Users, Collection::Activities])
            .await?;

        info!(user_id = %user.id, "User logged in");
        Ok(user)
    }

    pub async fn logout(&self, actor: &User) -> StoreResult<()> {
        let mut state = self.inner.write().await;
        state.activities.record(
            actor,
            ActivityAction::Logout,
            EntityType::User,
            format!("User {} logged out", actor.username),
            None,
        );
        self.persist(&state, &[Collection::Activities]).await?;
        Ok(())
    }
}

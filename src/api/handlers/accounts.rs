use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    api::{
        dto::{LoginRequest, UserDto},
        errors::AppError,
        extract::Actor,
    },
    db::models::UserActivity,
    store::{AppStore, NewUser, UserUpdate},
};

#[derive(Debug, Deserialize)]
pub struct ActivityParams {
    pub limit: Option<usize>,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Check credentials and return the account. Its `id` goes into the
/// `x-user-id` header of later requests.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = UserDto),
        (status = 401, description = "Invalid credentials"),
    ),
    tag = "auth"
)]
pub async fn login(
    State(store): State<AppStore>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<UserDto>, AppError> {
    let user = store.login(&req.username, &req.password).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    params(("x-user-id" = Uuid, Header, description = "Acting user")),
    responses(
        (status = 204, description = "Logged out"),
        (status = 401, description = "Unknown acting user"),
    ),
    tag = "auth"
)]
pub async fn logout(
    State(store): State<AppStore>,
    Actor(actor): Actor,
) -> Result<StatusCode, AppError> {
    store.logout(&actor).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/users",
    params(("x-user-id" = Uuid, Header, description = "Acting user")),
    responses(
        (status = 200, description = "All accounts", body = Vec<UserDto>),
        (status = 401, description = "Unknown acting user"),
    ),
    tag = "users"
)]
pub async fn list_users(
    State(store): State<AppStore>,
    _actor: Actor,
) -> Json<Vec<UserDto>> {
    let users = store.list_users().await;
    Json(users.into_iter().map(Into::into).collect())
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    params(
        ("id" = Uuid, Path, description = "User ID"),
        ("x-user-id" = Uuid, Header, description = "Acting user"),
    ),
    responses(
        (status = 200, description = "Account", body = UserDto),
        (status = 404, description = "User not found"),
    ),
    tag = "users"
)]
pub async fn get_user(
    State(store): State<AppStore>,
    _actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<UserDto>, AppError> {
    Ok(Json(store.user(id).await?.into()))
}

#[utoipa::path(
    post,
    path = "/users",
    params(("x-user-id" = Uuid, Header, description = "Acting user (admin)")),
    request_body = NewUser,
    responses(
        (status = 201, description = "Account created", body = UserDto),
        (status = 403, description = "Acting user is not an administrator"),
        (status = 409, description = "Username or email already taken"),
        (status = 422, description = "Invalid field"),
    ),
    tag = "users"
)]
pub async fn create_user(
    State(store): State<AppStore>,
    Actor(actor): Actor,
    Json(input): Json<NewUser>,
) -> Result<(StatusCode, Json<UserDto>), AppError> {
    let user = store.create_user(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[utoipa::path(
    put,
    path = "/users/{id}",
    params(
        ("id" = Uuid, Path, description = "User ID"),
        ("x-user-id" = Uuid, Header, description = "Acting user (admin)"),
    ),
    request_body = UserUpdate,
    responses(
        (status = 200, description = "Account updated", body = UserDto),
        (status = 403, description = "Acting user is not an administrator"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Username or email already taken"),
    ),
    tag = "users"
)]
pub async fn update_user(
    State(store): State<AppStore>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
    Json(input): Json<UserUpdate>,
) -> Result<Json<UserDto>, AppError> {
    Ok(Json(store.update_user(&actor, id, input).await?.into()))
}

/// The default account cannot be deleted.
#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(
        ("id" = Uuid, Path, description = "User ID"),
        ("x-user-id" = Uuid, Header, description = "Acting user (admin)"),
    ),
    responses(
        (status = 200, description = "The removed account", body = UserDto),
        (status = 403, description = "Not an administrator, or the default account"),
        (status = 404, description = "User not found"),
    ),
    tag = "users"
)]
pub async fn delete_user(
    State(store): State<AppStore>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<UserDto>, AppError> {
    Ok(Json(store.delete_user(&actor, id).await?.into()))
}

// ---------------------------------------------------------------------------
// Activity log
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/activities",
    params(("limit" = Option<usize>, Query, description = "Maximum number of entries")),
    responses(
        (status = 200, description = "Activity entries, newest first", body = Vec<UserActivity>),
    ),
    tag = "activities"
)]
pub async fn list_activities(
    State(store): State<AppStore>,
    Query(params): Query<ActivityParams>,
) -> Json<Vec<UserActivity>> {
    Json(store.activities(params.limit).await)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use axum::http::{HeaderName, HeaderValue, StatusCode};
    use serde_json::{json, Value};

    use crate::{
        api::{
            extract::USER_ID_HEADER,
            handlers::test_support::{as_user, test_server},
        },
        auth,
    };

    #[tokio::test]
    async fn login_with_default_credentials() {
        let (server, _, admin) = test_server().await;
        let resp = server
            .post("/auth/login")
            .json(&json!({
                "username": auth::DEFAULT_USERNAME,
                "password": auth::DEFAULT_PASSWORD,
            }))
            .await;
        resp.assert_status_ok();

        let body: Value = resp.json();
        assert_eq!(body["id"], admin.id.to_string());
        assert_eq!(body["role"], "admin");
        assert!(body["last_login"].is_string());
        assert!(body.get("password_hash").is_none());
    }

    #[tokio::test]
    async fn login_failures_look_the_same() {
        let (server, _, _) = test_server().await;

        let wrong_password = server
            .post("/auth/login")
            .json(&json!({ "username": "admin", "password": "nope" }))
            .await;
        wrong_password.assert_status(StatusCode::UNAUTHORIZED);

        let unknown_user = server
            .post("/auth/login")
            .json(&json!({ "username": "ghost", "password": "admin123" }))
            .await;
        unknown_user.assert_status(StatusCode::UNAUTHORIZED);

        assert_eq!(
            wrong_password.json::<Value>()["error"],
            unknown_user.json::<Value>()["error"]
        );
    }

    #[tokio::test]
    async fn logout_records_activity() {
        let (server, _, admin) = test_server().await;
        let (name, value) = as_user(admin.id);
        server
            .post("/auth/logout")
            .add_header(name, value)
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let activities: Vec<Value> = server.get("/activities?limit=1").await.json();
        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0]["action"], "logout");
    }

    #[tokio::test]
    async fn malformed_actor_header_is_rejected() {
        let (server, _, _) = test_server().await;
        server
            .post("/auth/logout")
            .add_header(
                HeaderName::from_static(USER_ID_HEADER),
                HeaderValue::from_static("not-a-uuid"),
            )
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn admin_manages_users() {
        let (server, _, admin) = test_server().await;

        let (name, value) = as_user(admin.id);
        let resp = server
            .post("/users")
            .add_header(name, value)
            .json(&json!({
                "username": "reader",
                "email": "reader@example.com",
                "password": "secret1",
                "role": "user",
            }))
            .await;
        resp.assert_status(StatusCode::CREATED);
        let created: Value = resp.json();
        let id = created["id"].as_str().unwrap().to_owned();

        let (name, value) = as_user(admin.id);
        let updated: Value = server
            .put(&format!("/users/{id}"))
            .add_header(name, value)
            .json(&json!({
                "username": "reader2",
                "email": "reader@example.com",
                "role": "user",
            }))
            .await
            .json();
        assert_eq!(updated["username"], "reader2");

        let (name, value) = as_user(admin.id);
        let users: Vec<Value> = server.get("/users").add_header(name, value).await.json();
        assert_eq!(users.len(), 2);

        let (name, value) = as_user(admin.id);
        server
            .delete(&format!("/users/{id}"))
            .add_header(name, value)
            .await
            .assert_status_ok();

        let (name, value) = as_user(admin.id);
        server
            .get(&format!("/users/{id}"))
            .add_header(name, value)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let (server, _, admin) = test_server().await;
        let (name, value) = as_user(admin.id);
        server
            .post("/users")
            .add_header(name, value)
            .json(&json!({
                "username": "admin",
                "email": "other@example.com",
                "password": "secret1",
                "role": "user",
            }))
            .await
            .assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn default_user_cannot_be_deleted() {
        let (server, _, admin) = test_server().await;
        let (name, value) = as_user(admin.id);
        server
            .delete(&format!("/users/{}", admin.id))
            .add_header(name, value)
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn regular_user_cannot_create_users() {
        let (server, _, admin) = test_server().await;

        let (name, value) = as_user(admin.id);
        let reader: Value = server
            .post("/users")
            .add_header(name, value)
            .json(&json!({
                "username": "reader",
                "email": "reader@example.com",
                "password": "secret1",
                "role": "user",
            }))
            .await
            .json();
        let reader_id = reader["id"].as_str().unwrap().parse().unwrap();

        let (name, value) = as_user(reader_id);
        server
            .post("/users")
            .add_header(name, value)
            .json(&json!({
                "username": "another",
                "email": "another@example.com",
                "password": "secret1",
                "role": "user",
            }))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }
}

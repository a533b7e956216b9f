use axum::{extract::State, http::StatusCode, Json};
use uuid::Uuid;

use crate::{
    api::{errors::AppError, extract::Actor},
    db::models::{Category, Settings},
    store::{AppStore, CategoryInput},
};

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/categories",
    responses(
        (status = 200, description = "Meter categories", body = Vec<Category>),
    ),
    tag = "categories"
)]
pub async fn list_categories(State(store): State<AppStore>) -> Json<Vec<Category>> {
    Json(store.categories().await)
}

/// Names are unique, compared case-insensitively.
///
/// Categories are presentation data; adding one leaves no activity entry.
#[utoipa::path(
    post,
    path = "/categories",
    params(("x-user-id" = Uuid, Header, description = "Acting user")),
    request_body = CategoryInput,
    responses(
        (status = 201, description = "Category added", body = Category),
        (status = 409, description = "A category with that name exists"),
        (status = 422, description = "Empty name"),
    ),
    tag = "categories"
)]
pub async fn add_category(
    State(store): State<AppStore>,
    _actor: Actor,
    Json(input): Json<CategoryInput>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    let category = store.add_category(input).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/settings",
    responses(
        (status = 200, description = "Current settings", body = Settings),
    ),
    tag = "settings"
)]
pub async fn get_settings(State(store): State<AppStore>) -> Json<Settings> {
    Json(store.settings().await)
}

/// Replace the settings. Not recorded in the activity log.
#[utoipa::path(
    put,
    path = "/settings",
    params(("x-user-id" = Uuid, Header, description = "Acting user")),
    request_body = Settings,
    responses(
        (status = 200, description = "Settings saved", body = Settings),
    ),
    tag = "settings"
)]
pub async fn update_settings(
    State(store): State<AppStore>,
    _actor: Actor,
    Json(settings): Json<Settings>,
) -> Result<Json<Settings>, AppError> {
    Ok(Json(store.update_settings(settings).await?))
}

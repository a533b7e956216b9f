use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    api::{errors::AppError, extract::Actor},
    db::models::Reminder,
    store::{AppStore, ReminderInput},
};

#[utoipa::path(
    get,
    path = "/reminders",
    responses(
        (status = 200, description = "All reminders", body = Vec<Reminder>),
    ),
    tag = "reminders"
)]
pub async fn list_reminders(State(store): State<AppStore>) -> Json<Vec<Reminder>> {
    Json(store.list_reminders().await)
}

/// Enabled reminders whose next notification is not in the future.
#[utoipa::path(
    get,
    path = "/reminders/due",
    responses(
        (status = 200, description = "Reminders due now", body = Vec<Reminder>),
    ),
    tag = "reminders"
)]
pub async fn list_due_reminders(State(store): State<AppStore>) -> Json<Vec<Reminder>> {
    Json(store.due_reminders(Utc::now()).await)
}

#[utoipa::path(
    post,
    path = "/reminders",
    params(("x-user-id" = Uuid, Header, description = "Acting user")),
    request_body = ReminderInput,
    responses(
        (status = 201, description = "Reminder created", body = Reminder),
        (status = 404, description = "Meter not found"),
    ),
    tag = "reminders"
)]
pub async fn create_reminder(
    State(store): State<AppStore>,
    Actor(actor): Actor,
    Json(input): Json<ReminderInput>,
) -> Result<(StatusCode, Json<Reminder>), AppError> {
    let reminder = store.create_reminder(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(reminder)))
}

#[utoipa::path(
    put,
    path = "/reminders/{id}",
    params(
        ("id" = Uuid, Path, description = "Reminder ID"),
        ("x-user-id" = Uuid, Header, description = "Acting user"),
    ),
    request_body = ReminderInput,
    responses(
        (status = 200, description = "Reminder updated", body = Reminder),
        (status = 404, description = "Reminder or meter not found"),
    ),
    tag = "reminders"
)]
pub async fn update_reminder(
    State(store): State<AppStore>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
    Json(input): Json<ReminderInput>,
) -> Result<Json<Reminder>, AppError> {
    Ok(Json(store.update_reminder(&actor, id, input).await?))
}

#[utoipa::path(
    delete,
    path = "/reminders/{id}",
    params(
        ("id" = Uuid, Path, description = "Reminder ID"),
        ("x-user-id" = Uuid, Header, description = "Acting user"),
    ),
    responses(
        (status = 200, description = "The removed reminder", body = Reminder),
        (status = 404, description = "Reminder not found"),
    ),
    tag = "reminders"
)]
pub async fn delete_reminder(
    State(store): State<AppStore>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<Reminder>, AppError> {
    Ok(Json(store.delete_reminder(&actor, id).await?))
}

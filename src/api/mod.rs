pub mod dto;
pub mod errors;
pub mod extract;
pub mod handlers;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use crate::store::AppStore;
use handlers::{accounts, meters, reminders, settings, ApiDoc};

/// The OpenAPI document as pretty-printed JSON.
pub fn openapi_json() -> Result<String, serde_json::Error> {
    ApiDoc::openapi().to_pretty_json()
}

pub fn router(store: AppStore) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .route("/health", get(handlers::health))
        // Session and accounts
        .route("/auth/login", post(accounts::login))
        .route("/auth/logout", post(accounts::logout))
        .route("/users", get(accounts::list_users).post(accounts::create_user))
        .route(
            "/users/{id}",
            get(accounts::get_user)
                .put(accounts::update_user)
                .delete(accounts::delete_user),
        )
        .route("/activities", get(accounts::list_activities))
        // Meters, readings, consumption
        .route("/meters", get(meters::list_meters).post(meters::create_meter))
        .route("/meters/summary", get(meters::get_summary))
        .route("/meters/number/{number}", get(meters::get_meter_by_number))
        .route("/meters/category/{category}", get(meters::get_meters_by_category))
        .route("/meters/{id}", get(meters::get_meter).put(meters::update_meter))
        .route("/meters/{id}/readings", post(meters::add_reading))
        .route("/meters/{id}/readings/current", get(meters::get_current_reading))
        .route(
            "/meters/{id}/readings/{reading_id}",
            delete(meters::delete_reading),
        )
        .route("/meters/{id}/consumption/monthly", get(meters::get_monthly_consumption))
        .route("/meters/{id}/consumption/daily", get(meters::get_daily_consumption))
        .route("/meters/{id}/consumption/range", get(meters::get_range_consumption))
        .route("/meters/{id}/consumption/period", get(meters::get_period_consumption))
        .route("/meters/{id}/consumption/average", get(meters::get_average_consumption))
        // Reminders
        .route(
            "/reminders",
            get(reminders::list_reminders).post(reminders::create_reminder),
        )
        .route("/reminders/due", get(reminders::list_due_reminders))
        .route(
            "/reminders/{id}",
            put(reminders::update_reminder).delete(reminders::delete_reminder),
        )
        // Categories and settings
        .route(
            "/categories",
            get(settings::list_categories).post(settings::add_category),
        )
        .route(
            "/settings",
            get(settings::get_settings).put(settings::update_settings),
        )
        .with_state(store)
        .split_for_parts();

    router.route(
        "/api-docs/openapi.json",
        get(move || async move { axum::Json(api) }),
    )
}

pub mod accounts;
pub mod meters;
pub mod reminders;
pub mod settings;

use axum::Json;
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

use super::dto::{
    AverageConsumptionDto, DailyConsumptionDto, LoginRequest, PeriodConsumptionDto,
    RangeConsumptionDto, UserDto,
};
use crate::{
    consumption::{MeterSummary, MeterSummaryEntry},
    db::models::{
        ActivityAction, Category, ConsumptionPoint, EntityType, Meter, NotificationSettings,
        Reading, Reminder, ReminderKind, Role, Settings, UserActivity,
    },
    store::{CategoryInput, MeterInput, NewUser, ReadingInput, ReminderInput, UserUpdate},
};

#[derive(Debug, Serialize, ToSchema)]
pub struct Health {
    pub status: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = Health),
    ),
    tag = "health"
)]
pub async fn health() -> Json<Health> {
    Json(Health {
        status: "ok".to_owned(),
    })
}

// ---------------------------------------------------------------------------
// OpenAPI spec struct (used in api/mod.rs)
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        accounts::login,
        accounts::logout,
        accounts::list_users,
        accounts::get_user,
        accounts::create_user,
        accounts::update_user,
        accounts::delete_user,
        accounts::list_activities,
        meters::list_meters,
        meters::create_meter,
        meters::get_meter,
        meters::update_meter,
        meters::get_meter_by_number,
        meters::get_meters_by_category,
        meters::get_summary,
        meters::add_reading,
        meters::delete_reading,
        meters::get_current_reading,
        meters::get_monthly_consumption,
        meters::get_daily_consumption,
        meters::get_range_consumption,
        meters::get_period_consumption,
        meters::get_average_consumption,
        reminders::list_reminders,
        reminders::list_due_reminders,
        reminders::create_reminder,
        reminders::update_reminder,
        reminders::delete_reminder,
        settings::list_categories,
        settings::add_category,
        settings::get_settings,
        settings::update_settings,
    ),
    components(schemas(
        Health,
        Meter, Reading, Category, ConsumptionPoint,
        MeterSummary, MeterSummaryEntry,
        Role, UserDto, LoginRequest, NewUser, UserUpdate,
        ReminderKind, Reminder, ReminderInput,
        ActivityAction, EntityType, UserActivity,
        Settings, NotificationSettings,
        MeterInput, ReadingInput, CategoryInput,
        DailyConsumptionDto, RangeConsumptionDto, PeriodConsumptionDto, AverageConsumptionDto,
    )),
    tags(
        (name = "health", description = "Liveness"),
        (name = "auth", description = "Login and logout"),
        (name = "users", description = "Account management"),
        (name = "activities", description = "Audit trail of user actions"),
        (name = "meters", description = "Meter registry"),
        (name = "readings", description = "Meter readings"),
        (name = "consumption", description = "Derived consumption figures"),
        (name = "reminders", description = "Reading reminders"),
        (name = "categories", description = "Meter categories"),
        (name = "settings", description = "Application settings"),
    ),
    info(
        title = "Meter Tracker API",
        version = "0.1.0",
        description = "REST API for recording utility meter readings"
    )
)]
pub struct ApiDoc;

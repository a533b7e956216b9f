use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::models::{Role, User};

/// Public view of a [`User`]; the password hash is never exposed.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserDto {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<User> for UserDto {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            role: u.role,
            is_default: u.is_default,
            created_at: u.created_at,
            last_login: u.last_login,
        }
    }
}

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response for `GET /meters/{id}/consumption/daily`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DailyConsumptionDto {
    pub meter_id: Uuid,
    /// Units per day between the two most recent readings.
    pub daily_consumption: f64,
}

/// Response for `GET /meters/{id}/consumption/range`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RangeConsumptionDto {
    pub meter_id: Uuid,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub consumption: f64,
}

/// Response for `GET /meters/{id}/consumption/period`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PeriodConsumptionDto {
    pub meter_id: Uuid,
    pub year: i32,
    /// Absent for a whole-year total.
    pub month: Option<u32>,
    pub consumption: f64,
}

/// Response for `GET /meters/{id}/consumption/average`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AverageConsumptionDto {
    pub meter_id: Uuid,
    pub days: u32,
    pub average_daily_consumption: f64,
}

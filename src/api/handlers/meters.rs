use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    api::{
        dto::{AverageConsumptionDto, DailyConsumptionDto, PeriodConsumptionDto, RangeConsumptionDto},
        errors::AppError,
        extract::Actor,
    },
    consumption::{self, MeterSummary},
    db::models::{ConsumptionPoint, Meter, Reading},
    error::StoreError,
    store::{AppStore, MeterInput, ReadingInput},
};

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RangeParams {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct PeriodParams {
    pub year: i32,
    pub month: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct AverageParams {
    pub days: Option<u32>,
}

const DEFAULT_AVERAGE_DAYS: u32 = 30;

// ---------------------------------------------------------------------------
// Meters
// ---------------------------------------------------------------------------

/// List every meter with its readings in entry order.
#[utoipa::path(
    get,
    path = "/meters",
    responses(
        (status = 200, description = "All meters", body = Vec<Meter>),
    ),
    tag = "meters"
)]
pub async fn list_meters(State(store): State<AppStore>) -> Json<Vec<Meter>> {
    Json(store.list_meters().await)
}

#[utoipa::path(
    post,
    path = "/meters",
    params(("x-user-id" = Uuid, Header, description = "Acting user")),
    request_body = MeterInput,
    responses(
        (status = 201, description = "Meter created", body = Meter),
        (status = 401, description = "Unknown acting user"),
        (status = 422, description = "A required field is empty"),
    ),
    tag = "meters"
)]
pub async fn create_meter(
    State(store): State<AppStore>,
    Actor(actor): Actor,
    Json(input): Json<MeterInput>,
) -> Result<(StatusCode, Json<Meter>), AppError> {
    let meter = store.create_meter(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(meter)))
}

#[utoipa::path(
    get,
    path = "/meters/{id}",
    params(("id" = Uuid, Path, description = "Meter ID")),
    responses(
        (status = 200, description = "Meter", body = Meter),
        (status = 404, description = "Meter not found"),
    ),
    tag = "meters"
)]
pub async fn get_meter(
    State(store): State<AppStore>,
    Path(id): Path<Uuid>,
) -> Result<Json<Meter>, AppError> {
    Ok(Json(store.meter(id).await?))
}

#[utoipa::path(
    put,
    path = "/meters/{id}",
    params(
        ("id" = Uuid, Path, description = "Meter ID"),
        ("x-user-id" = Uuid, Header, description = "Acting user"),
    ),
    request_body = MeterInput,
    responses(
        (status = 200, description = "Meter updated", body = Meter),
        (status = 404, description = "Meter not found"),
        (status = 422, description = "A required field is empty"),
    ),
    tag = "meters"
)]
pub async fn update_meter(
    State(store): State<AppStore>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
    Json(input): Json<MeterInput>,
) -> Result<Json<Meter>, AppError> {
    Ok(Json(store.update_meter(&actor, id, input).await?))
}

/// Look a meter up by the number printed on it.
#[utoipa::path(
    get,
    path = "/meters/number/{number}",
    params(("number" = String, Path, description = "Meter number")),
    responses(
        (status = 200, description = "Meter", body = Meter),
        (status = 404, description = "Meter not found"),
    ),
    tag = "meters"
)]
pub async fn get_meter_by_number(
    State(store): State<AppStore>,
    Path(number): Path<String>,
) -> Result<Json<Meter>, AppError> {
    Ok(Json(store.meter_by_number(&number).await?))
}

/// Meters in a category; the name is matched case-insensitively.
#[utoipa::path(
    get,
    path = "/meters/category/{category}",
    params(("category" = String, Path, description = "Category name")),
    responses(
        (status = 200, description = "Matching meters", body = Vec<Meter>),
    ),
    tag = "meters"
)]
pub async fn get_meters_by_category(
    State(store): State<AppStore>,
    Path(category): Path<String>,
) -> Json<Vec<Meter>> {
    Json(store.meters_by_category(&category).await)
}

#[utoipa::path(
    get,
    path = "/meters/summary",
    responses(
        (status = 200, description = "Counts and current values across all meters", body = MeterSummary),
    ),
    tag = "meters"
)]
pub async fn get_summary(State(store): State<AppStore>) -> Json<MeterSummary> {
    Json(store.meter_summary().await)
}

// ---------------------------------------------------------------------------
// Readings
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/meters/{id}/readings",
    params(
        ("id" = Uuid, Path, description = "Meter ID"),
        ("x-user-id" = Uuid, Header, description = "Acting user"),
    ),
    request_body = ReadingInput,
    responses(
        (status = 201, description = "Reading added", body = Reading),
        (status = 404, description = "Meter not found"),
        (status = 422, description = "Value lower than the previous reading"),
    ),
    tag = "readings"
)]
pub async fn add_reading(
    State(store): State<AppStore>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
    Json(input): Json<ReadingInput>,
) -> Result<(StatusCode, Json<Reading>), AppError> {
    let reading = store.add_reading(&actor, id, input).await?;
    Ok((StatusCode::CREATED, Json(reading)))
}

#[utoipa::path(
    delete,
    path = "/meters/{id}/readings/{reading_id}",
    params(
        ("id" = Uuid, Path, description = "Meter ID"),
        ("reading_id" = Uuid, Path, description = "Reading ID"),
        ("x-user-id" = Uuid, Header, description = "Acting user"),
    ),
    responses(
        (status = 200, description = "The removed reading", body = Reading),
        (status = 404, description = "Meter or reading not found"),
    ),
    tag = "readings"
)]
pub async fn delete_reading(
    State(store): State<AppStore>,
    Actor(actor): Actor,
    Path((id, reading_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Reading>, AppError> {
    Ok(Json(store.delete_reading(&actor, id, reading_id).await?))
}

/// The reading with the latest date.
#[utoipa::path(
    get,
    path = "/meters/{id}/readings/current",
    params(("id" = Uuid, Path, description = "Meter ID")),
    responses(
        (status = 200, description = "Latest reading", body = Reading),
        (status = 404, description = "Meter not found or no readings"),
    ),
    tag = "readings"
)]
pub async fn get_current_reading(
    State(store): State<AppStore>,
    Path(id): Path<Uuid>,
) -> Result<Json<Reading>, AppError> {
    let meter = store.meter(id).await?;
    let reading = consumption::current_reading(&meter)
        .cloned()
        .ok_or(StoreError::not_found("reading"))?;
    Ok(Json(reading))
}

// ---------------------------------------------------------------------------
// Consumption
// ---------------------------------------------------------------------------

/// Twelve monthly points ending with the current month.
#[utoipa::path(
    get,
    path = "/meters/{id}/consumption/monthly",
    params(("id" = Uuid, Path, description = "Meter ID")),
    responses(
        (status = 200, description = "Monthly consumption, oldest first", body = Vec<ConsumptionPoint>),
        (status = 404, description = "Meter not found"),
    ),
    tag = "consumption"
)]
pub async fn get_monthly_consumption(
    State(store): State<AppStore>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ConsumptionPoint>>, AppError> {
    let meter = store.meter(id).await?;
    Ok(Json(consumption::generate_monthly_consumption(&meter)))
}

#[utoipa::path(
    get,
    path = "/meters/{id}/consumption/daily",
    params(("id" = Uuid, Path, description = "Meter ID")),
    responses(
        (status = 200, description = "Per-day consumption between the two latest readings", body = DailyConsumptionDto),
        (status = 404, description = "Meter not found"),
    ),
    tag = "consumption"
)]
pub async fn get_daily_consumption(
    State(store): State<AppStore>,
    Path(id): Path<Uuid>,
) -> Result<Json<DailyConsumptionDto>, AppError> {
    let meter = store.meter(id).await?;
    Ok(Json(DailyConsumptionDto {
        meter_id: id,
        daily_consumption: consumption::get_daily_consumption(&meter),
    }))
}

/// Consumption between two instants, both inclusive.
#[utoipa::path(
    get,
    path = "/meters/{id}/consumption/range",
    params(
        ("id" = Uuid, Path, description = "Meter ID"),
        ("from" = DateTime<Utc>, Query, description = "Start of range (RFC3339)"),
        ("to"   = DateTime<Utc>, Query, description = "End of range (RFC3339)"),
    ),
    responses(
        (status = 200, description = "Consumption in range", body = RangeConsumptionDto),
        (status = 404, description = "Meter not found"),
        (status = 422, description = "`from` is after `to`"),
    ),
    tag = "consumption"
)]
pub async fn get_range_consumption(
    State(store): State<AppStore>,
    Path(id): Path<Uuid>,
    Query(params): Query<RangeParams>,
) -> Result<Json<RangeConsumptionDto>, AppError> {
    if params.from > params.to {
        return Err(StoreError::validation("`from` must not be after `to`").into());
    }
    let meter = store.meter(id).await?;
    Ok(Json(RangeConsumptionDto {
        meter_id: id,
        from: params.from,
        to: params.to,
        consumption: consumption::consumption_between(&meter, params.from, params.to),
    }))
}

/// Consumption in a calendar month, or a whole year when `month` is omitted.
#[utoipa::path(
    get,
    path = "/meters/{id}/consumption/period",
    params(
        ("id" = Uuid, Path, description = "Meter ID"),
        ("year" = i32, Query, description = "Calendar year"),
        ("month" = Option<u32>, Query, description = "Month 1-12"),
    ),
    responses(
        (status = 200, description = "Consumption in period", body = PeriodConsumptionDto),
        (status = 404, description = "Meter not found"),
        (status = 422, description = "Invalid year or month"),
    ),
    tag = "consumption"
)]
pub async fn get_period_consumption(
    State(store): State<AppStore>,
    Path(id): Path<Uuid>,
    Query(params): Query<PeriodParams>,
) -> Result<Json<PeriodConsumptionDto>, AppError> {
    let meter = store.meter(id).await?;
    let total = match params.month {
        Some(month) => consumption::monthly_total(&meter, params.year, month),
        None => consumption::yearly_total(&meter, params.year),
    }
    .ok_or(StoreError::validation("invalid year or month"))?;

    Ok(Json(PeriodConsumptionDto {
        meter_id: id,
        year: params.year,
        month: params.month,
        consumption: total,
    }))
}

#[utoipa::path(
    get,
    path = "/meters/{id}/consumption/average",
    params(
        ("id" = Uuid, Path, description = "Meter ID"),
        ("days" = Option<u32>, Query, description = "Trailing window in days (default 30)"),
    ),
    responses(
        (status = 200, description = "Average consumption per day", body = AverageConsumptionDto),
        (status = 404, description = "Meter not found"),
    ),
    tag = "consumption"
)]
pub async fn get_average_consumption(
    State(store): State<AppStore>,
    Path(id): Path<Uuid>,
    Query(params): Query<AverageParams>,
) -> Result<Json<AverageConsumptionDto>, AppError> {
    let meter = store.meter(id).await?;
    let days = params.days.unwrap_or(DEFAULT_AVERAGE_DAYS);
    Ok(Json(AverageConsumptionDto {
        meter_id: id,
        days,
        average_daily_consumption: consumption::average_daily_consumption(&meter, days),
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    use crate::api::handlers::test_support::{as_user, test_server};

    fn meter_body(number: &str) -> Value {
        json!({
            "number": number,
            "description": "Main",
            "assignment": "House",
            "category": "Electricity",
        })
    }

    #[tokio::test]
    async fn list_meters_empty() {
        let (server, _, _) = test_server().await;
        let resp = server.get("/meters").await;
        resp.assert_status_ok();
        assert_eq!(resp.json::<Value>(), json!([]));
    }

    #[tokio::test]
    async fn create_meter_requires_actor() {
        let (server, _, _) = test_server().await;
        let resp = server.post("/meters").json(&meter_body("1")).await;
        resp.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn create_and_fetch_meter() {
        let (server, _, admin) = test_server().await;
        let (name, value) = as_user(admin.id);

        let resp = server
            .post("/meters")
            .add_header(name, value)
            .json(&meter_body("123"))
            .await;
        resp.assert_status(StatusCode::CREATED);
        let created: Value = resp.json();
        let id = created["id"].as_str().unwrap().to_owned();
        assert_eq!(created["created_by"], admin.id.to_string());

        let by_id: Value = server.get(&format!("/meters/{id}")).await.json();
        assert_eq!(by_id["number"], "123");

        let by_number: Value = server.get("/meters/number/123").await.json();
        assert_eq!(by_number["id"], id.as_str());

        let by_category: Vec<Value> = server.get("/meters/category/ELECTRICITY").await.json();
        assert_eq!(by_category.len(), 1);
    }

    #[tokio::test]
    async fn unknown_meter_is_404() {
        let (server, _, _) = test_server().await;
        let resp = server
            .get("/meters/00000000-0000-0000-0000-000000000000")
            .await;
        resp.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(resp.json::<Value>()["error"], "meter not found");
    }

    #[tokio::test]
    async fn readings_and_consumption() {
        let (server, _, admin) = test_server().await;

        let (name, header) = as_user(admin.id);
        let meter: Value = server
            .post("/meters")
            .add_header(name, header)
            .json(&meter_body("9"))
            .await
            .json();
        let id = meter["id"].as_str().unwrap().to_owned();

        for (date, value) in [("2026-01-01T00:00:00Z", 100.0), ("2026-02-01T00:00:00Z", 150.0)] {
            let (name, header) = as_user(admin.id);
            server
                .post(&format!("/meters/{id}/readings"))
                .add_header(name, header)
                .json(&json!({ "date": date, "value": value }))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let (name, header) = as_user(admin.id);
        let rejected = server
            .post(&format!("/meters/{id}/readings"))
            .add_header(name, header)
            .json(&json!({ "date": "2026-03-01T00:00:00Z", "value": 120.0 }))
            .await;
        rejected.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let current: Value = server.get(&format!("/meters/{id}/readings/current")).await.json();
        assert_eq!(current["value"], 150.0);
        assert_eq!(current["difference"], 50.0);

        let daily: Value = server.get(&format!("/meters/{id}/consumption/daily")).await.json();
        let per_day = daily["daily_consumption"].as_f64().unwrap();
        assert!((per_day - 50.0 / 31.0).abs() < 1e-9);

        let monthly: Vec<Value> = server.get(&format!("/meters/{id}/consumption/monthly")).await.json();
        assert_eq!(monthly.len(), 12);

        let range: Value = server
            .get(&format!(
                "/meters/{id}/consumption/range?from=2026-01-01T00:00:00Z&to=2026-02-01T00:00:00Z"
            ))
            .await
            .json();
        assert_eq!(range["consumption"], 50.0);

        let year: Value = server
            .get(&format!("/meters/{id}/consumption/period?year=2026"))
            .await
            .json();
        assert_eq!(year["consumption"], 50.0);

        server
            .get(&format!("/meters/{id}/consumption/period?year=2026&month=13"))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let average = server
            .get(&format!("/meters/{id}/consumption/average?days=7"))
            .await;
        average.assert_status_ok();
        assert_eq!(average.json::<Value>()["days"], 7);
    }

    #[tokio::test]
    async fn average_with_largest_window_is_answered() {
        let (server, _, admin) = test_server().await;
        let (name, header) = as_user(admin.id);
        let meter: Value = server
            .post("/meters")
            .add_header(name, header)
            .json(&meter_body("8"))
            .await
            .json();
        let id = meter["id"].as_str().unwrap().to_owned();

        for (date, value) in [("2026-01-01T00:00:00Z", 10.0), ("2026-02-01T00:00:00Z", 20.0)] {
            let (name, header) = as_user(admin.id);
            server
                .post(&format!("/meters/{id}/readings"))
                .add_header(name, header)
                .json(&json!({ "date": date, "value": value }))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let resp = server
            .get(&format!("/meters/{id}/consumption/average?days={}", u32::MAX))
            .await;
        resp.assert_status_ok();
        let body: Value = resp.json();
        assert_eq!(body["days"], u32::MAX);
        assert!(body["average_daily_consumption"].as_f64().unwrap() > 0.0);
    }

    #[tokio::test]
    async fn current_reading_missing_is_404() {
        let (server, _, admin) = test_server().await;
        let (name, header) = as_user(admin.id);
        let meter: Value = server
            .post("/meters")
            .add_header(name, header)
            .json(&meter_body("5"))
            .await
            .json();
        let id = meter["id"].as_str().unwrap();

        server
            .get(&format!("/meters/{id}/readings/current"))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_reading_endpoint() {
        let (server, store, admin) = test_server().await;
        let (name, header) = as_user(admin.id);
        let meter: Value = server
            .post("/meters")
            .add_header(name, header)
            .json(&meter_body("6"))
            .await
            .json();
        let id = meter["id"].as_str().unwrap().to_owned();

        let (name, header) = as_user(admin.id);
        let reading: Value = server
            .post(&format!("/meters/{id}/readings"))
            .add_header(name, header)
            .json(&json!({ "date": "2026-01-01T00:00:00Z", "value": 1.0, "remarks": "initial" }))
            .await
            .json();
        assert_eq!(reading["remarks"], "initial");
        let reading_id = reading["id"].as_str().unwrap();

        let (name, header) = as_user(admin.id);
        server
            .delete(&format!("/meters/{id}/readings/{reading_id}"))
            .add_header(name, header)
            .await
            .assert_status_ok();

        assert_eq!(store.meter_summary().await.total_readings, 0);
    }

    #[tokio::test]
    async fn summary_endpoint() {
        let (server, _, admin) = test_server().await;
        let (name, header) = as_user(admin.id);
        server
            .post("/meters")
            .add_header(name, header)
            .json(&meter_body("77"))
            .await
            .assert_status(StatusCode::CREATED);

        let summary: Value = server.get("/meters/summary").await.json();
        assert_eq!(summary["total_meters"], 1);
        assert_eq!(summary["active_meters"], 0);
        assert_eq!(summary["meters"][0]["current_value"], Value::Null);
    }
}

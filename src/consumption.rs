//! Consumption arithmetic over a meter's reading history.
//!
//! All functions are pure. Readings are never assumed to be sorted; each
//! function orders what it needs by `date`. Functions that depend on the
//! current time have an `_at` variant taking `now` explicitly.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::models::{ConsumptionPoint, Meter, Reading};

/// Length of the consumption chart window, current month included.
pub const TRAILING_MONTHS: u32 = 12;

/// Monthly estimate used when a meter has exactly one reading and no
/// average can be derived yet.
pub const DEFAULT_MONTHLY_ESTIMATE: f64 = 50.0;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Consumption implied by entering `new_value` after the last entered reading.
///
/// "Last" is entry order, not date order. Returns 0 for an empty history.
/// A value below the previous one yields a negative result; validating that
/// is up to the caller.
pub fn calculate_difference(readings: &[Reading], new_value: f64) -> f64 {
    readings.last().map_or(0.0, |last| new_value - last.value)
}

/// Twelve monthly points ending with the current month.
pub fn generate_monthly_consumption(meter: &Meter) -> Vec<ConsumptionPoint> {
    generate_monthly_consumption_at(meter, Utc::now())
}

/// Twelve monthly points ending with the month containing `now`.
///
/// A month with at least two readings gets its measured consumption (last
/// minus first reading within the month). Any other month is forecasted from
/// the average delta between consecutive readings over the whole history.
/// With fewer than two readings overall every month is forecasted at a fixed
/// estimate.
pub fn generate_monthly_consumption_at(meter: &Meter, now: DateTime<Utc>) -> Vec<ConsumptionPoint> {
    let readings = sorted_ascending(&meter.readings);
    let months = trailing_months(now);

    if readings.len() < 2 {
        let estimate = if readings.is_empty() {
            0.0
        } else {
            DEFAULT_MONTHLY_ESTIMATE
        };
        return months
            .into_iter()
            .map(|(start, _, is_current)| point(start, estimate, true, is_current))
            .collect();
    }

    let average = average_delta(&readings);

    months
        .into_iter()
        .map(|(start, end, is_current)| {
            let in_month: Vec<&Reading> = readings
                .iter()
                .copied()
                .filter(|r| r.date >= start && r.date < end)
                .collect();

            match (in_month.first(), in_month.last()) {
                (Some(first), Some(last)) if in_month.len() >= 2 => {
                    point(start, last.value - first.value, false, is_current)
                }
                _ => point(start, average, true, is_current),
            }
        })
        .collect()
}

/// Consumption per day between the two most recent readings.
///
/// The elapsed time is rounded up to whole days and never less than one.
/// Returns 0 with fewer than two readings.
pub fn get_daily_consumption(meter: &Meter) -> f64 {
    let readings = sorted_descending(&meter.readings);
    let (Some(latest), Some(previous)) = (readings.first(), readings.get(1)) else {
        return 0.0;
    };

    let elapsed_ms = (latest.date - previous.date).num_milliseconds() as f64;
    let days = (elapsed_ms / MILLIS_PER_DAY).ceil().max(1.0);

    (latest.value - previous.value) / days
}

/// The reading with the latest date.
pub fn current_reading(meter: &Meter) -> Option<&Reading> {
    sorted_descending(&meter.readings).first().copied()
}

/// Consumption between `from` and `to`, both inclusive.
///
/// Computed as the last minus the first reading inside the range; 0 when the
/// range holds fewer than two readings.
pub fn consumption_between(meter: &Meter, from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    delta_where(meter, |date| date >= from && date <= to)
}

/// Consumption within calendar month `month` (1-12) of `year`.
///
/// Returns `None` for an invalid month.
pub fn monthly_total(meter: &Meter, year: i32, month: u32) -> Option<f64> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let end = start.checked_add_months(Months::new(1))?;
    let (start, end) = (midnight(start), midnight(end));
    Some(delta_where(meter, |date| date >= start && date < end))
}

/// Consumption within calendar year `year`.
pub fn yearly_total(meter: &Meter, year: i32) -> Option<f64> {
    let start = midnight(NaiveDate::from_ymd_opt(year, 1, 1)?);
    let end = midnight(NaiveDate::from_ymd_opt(year + 1, 1, 1)?);
    Some(delta_where(meter, |date| date >= start && date < end))
}

/// Average consumption per day over the trailing `days` days.
pub fn average_daily_consumption(meter: &Meter, days: u32) -> f64 {
    average_daily_consumption_at(meter, days, Utc::now())
}

pub fn average_daily_consumption_at(meter: &Meter, days: u32, now: DateTime<Utc>) -> f64 {
    if meter.readings.len() < 2 || days == 0 {
        return 0.0;
    }
    // Windows reaching past chrono's calendar start from its earliest date.
    let from = now
        .checked_sub_signed(Duration::days(i64::from(days)))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    consumption_between(meter, from, now) / f64::from(days)
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MeterSummary {
    pub total_meters: usize,
    /// Meters with at least one reading.
    pub active_meters: usize,
    pub total_readings: usize,
    /// Distinct category names, in first-seen order.
    pub categories: Vec<String>,
    pub meters: Vec<MeterSummaryEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MeterSummaryEntry {
    pub id: Uuid,
    pub number: String,
    pub description: String,
    pub category: String,
    pub current_value: Option<f64>,
    pub last_reading_date: Option<DateTime<Utc>>,
}

pub fn summary(meters: &[Meter]) -> MeterSummary {
    let mut categories: Vec<String> = Vec::new();
    for meter in meters {
        if !categories.contains(&meter.category) {
            categories.push(meter.category.clone());
        }
    }

    MeterSummary {
        total_meters: meters.len(),
        active_meters: meters.iter().filter(|m| !m.readings.is_empty()).count(),
        total_readings: meters.iter().map(|m| m.readings.len()).sum(),
        categories,
        meters: meters
            .iter()
            .map(|m| {
                let current = current_reading(m);
                MeterSummaryEntry {
                    id: m.id,
                    number: m.number.clone(),
                    description: m.description.clone(),
                    category: m.category.clone(),
                    current_value: current.map(|r| r.value),
                    last_reading_date: current.map(|r| r.date),
                }
            })
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Stable sort, so readings sharing a date keep their entry order.
fn sorted_ascending(readings: &[Reading]) -> Vec<&Reading> {
    let mut sorted: Vec<&Reading> = readings.iter().collect();
    sorted.sort_by_key(|r| r.date);
    sorted
}

fn sorted_descending(readings: &[Reading]) -> Vec<&Reading> {
    let mut sorted: Vec<&Reading> = readings.iter().collect();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));
    sorted
}

/// Mean delta between consecutive readings; requires at least two.
fn average_delta(sorted: &[&Reading]) -> f64 {
    let total: f64 = sorted.windows(2).map(|w| w[1].value - w[0].value).sum();
    total / (sorted.len() - 1) as f64
}

fn delta_where(meter: &Meter, include: impl Fn(DateTime<Utc>) -> bool) -> f64 {
    let in_range: Vec<&Reading> = sorted_ascending(&meter.readings)
        .into_iter()
        .filter(|r| include(r.date))
        .collect();

    match (in_range.first(), in_range.last()) {
        (Some(first), Some(last)) if in_range.len() >= 2 => last.value - first.value,
        _ => 0.0,
    }
}

/// `(month_start, next_month_start, is_current)` for the trailing window,
/// oldest first.
fn trailing_months(now: DateTime<Utc>) -> Vec<(DateTime<Utc>, DateTime<Utc>, bool)> {
    let today = now.date_naive();
    let current = NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today);

    (0..TRAILING_MONTHS)
        .rev()
        .filter_map(|back| {
            let start = current.checked_sub_months(Months::new(back))?;
            let end = start.checked_add_months(Months::new(1))?;
            Some((midnight(start), midnight(end), back == 0))
        })
        .collect()
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn point(start: DateTime<Utc>, consumption: f64, is_forecasted: bool, is_current: bool) -> ConsumptionPoint {
    ConsumptionPoint {
        label: start.format("%b %Y").to_string(),
        month_start: start,
        consumption,
        is_forecasted,
        is_current,
    }
}

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Meters and readings
// ---------------------------------------------------------------------------

/// A tracked utility counter.
///
/// `readings` are kept in entry order, which is not necessarily
/// chronological: a user may back-fill an older reading after a newer one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Meter {
    pub id: Uuid,
    /// Number printed on the physical meter.
    pub number: String,
    pub description: String,
    /// Free-text label, e.g. the flat or building the meter belongs to.
    pub assignment: String,
    /// Name of a [`Category`].
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub created_by: Uuid,
    pub last_modified_by: Uuid,
    pub last_modified_at: DateTime<Utc>,
    #[serde(default)]
    pub readings: Vec<Reading>,
}

/// A value recorded against a meter.
///
/// Meter values are cumulative counters, so `value` is expected to be
/// non-decreasing in date order for a single meter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Reading {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    /// Delta to the previously entered reading, computed on insert.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difference: Option<f64>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub icon: String,
}

/// The categories a fresh installation starts with.
pub fn default_categories() -> Vec<Category> {
    [
        ("Electricity", "#F59E0B", "zap"),
        ("Water", "#3B82F6", "droplets"),
        ("Gas", "#EF4444", "flame"),
        ("Heating", "#DC2626", "thermometer"),
        ("District Heating", "#7C3AED", "thermometer"),
        ("Heat Pump", "#059669", "thermometer"),
    ]
    .into_iter()
    .map(|(name, color, icon)| Category {
        id: Uuid::new_v4(),
        name: name.to_owned(),
        color: color.to_owned(),
        icon: icon.to_owned(),
    })
    .collect()
}

/// One month of the consumption chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ConsumptionPoint {
    /// Month label, e.g. `"Mar 2026"`.
    pub label: String,
    pub month_start: DateTime<Utc>,
    pub consumption: f64,
    /// `true` when the value is an estimate rather than measured.
    pub is_forecasted: bool,
    pub is_current: bool,
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// bcrypt hash. Never leaves the store except through [`crate::auth`].
    pub password_hash: String,
    pub role: Role,
    /// The bootstrap account; it cannot be deleted.
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Reminders
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    Daily,
    Monthly,
    Yearly,
}

impl fmt::Display for ReminderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReminderKind::Daily => "daily",
            ReminderKind::Monthly => "monthly",
            ReminderKind::Yearly => "yearly",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Reminder {
    pub id: Uuid,
    pub meter_id: Uuid,
    pub kind: ReminderKind,
    pub enabled: bool,
    #[serde(default)]
    pub last_notified: Option<DateTime<Utc>>,
    pub next_notification: DateTime<Utc>,
    pub created_by: Uuid,
}

// ---------------------------------------------------------------------------
// Activity log
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    Create,
    Update,
    Delete,
    Login,
    Logout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Meter,
    Reading,
    User,
    Reminder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserActivity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub action: ActivityAction,
    pub entity_type: EntityType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<Uuid>,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Persisted application settings. Fields missing from a stored document
/// take their default value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct Settings {
    pub notifications: NotificationSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct NotificationSettings {
    pub enabled: bool,
    pub sound: bool,
    pub desktop: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            sound: true,
            desktop: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_categories_have_unique_names() {
        let cats = default_categories();
        assert_eq!(cats.len(), 6);
        let mut names: Vec<_> = cats.iter().map(|c| c.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 6);
    }

    #[test]
    fn partial_settings_document_fills_defaults() {
        let s: Settings = serde_json::from_str(r#"{"notifications":{"enabled":false}}"#).unwrap();
        assert!(!s.notifications.enabled);
        assert!(s.notifications.sound);
        assert!(s.notifications.desktop);

        let empty: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, Settings::default());
    }

    #[test]
    fn enums_serialize_snake_case() {
        assert_eq!(serde_json::to_string(&ReminderKind::Monthly).unwrap(), "\"monthly\"");
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(serde_json::to_string(&ActivityAction::Logout).unwrap(), "\"logout\"");
        assert_eq!(ReminderKind::Yearly.to_string(), "yearly");
    }
}

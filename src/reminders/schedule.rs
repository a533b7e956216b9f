use chrono::{DateTime, Days, Months, Utc};

use crate::db::models::{Reminder, ReminderKind};

/// When a reminder of `kind` fires next, counted from `last_notified`
/// (or from now if it never fired).
pub fn calculate_next_notification(
    kind: ReminderKind,
    last_notified: Option<DateTime<Utc>>,
) -> DateTime<Utc> {
    calculate_next_notification_at(kind, last_notified, Utc::now())
}

/// Adds one calendar unit to the base date.
///
/// Month and year steps clamp the day-of-month to the end of the target
/// month: Jan 31 + 1 month is Feb 28 (or 29), Feb 29 + 1 year is Feb 28.
pub fn calculate_next_notification_at(
    kind: ReminderKind,
    last_notified: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    let base = last_notified.unwrap_or(now);
    let next = match kind {
        ReminderKind::Daily => base.checked_add_days(Days::new(1)),
        ReminderKind::Monthly => base.checked_add_months(Months::new(1)),
        ReminderKind::Yearly => base.checked_add_months(Months::new(12)),
    };
    // Only out-of-range dates near the end of chrono's calendar get here.
    next.unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Enabled reminders whose next notification is at or before `now`.
pub fn check_due_reminders(reminders: &[Reminder], now: DateTime<Utc>) -> Vec<&Reminder> {
    reminders
        .iter()
        .filter(|r| r.enabled && r.next_notification <= now)
        .collect()
}

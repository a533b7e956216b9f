use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{AppStore, Collection};
use crate::{
    db::models::{ActivityAction, EntityType, Meter, Reminder, ReminderKind, User},
    error::{StoreError, StoreResult},
    reminders::schedule,
};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ReminderInput {
    pub meter_id: Uuid,
    pub kind: ReminderKind,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

/// A reminder that fired, with the meter it points at.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DueNotification {
    pub reminder_id: Uuid,
    pub meter_id: Uuid,
    pub meter_number: String,
    pub meter_description: String,
    pub kind: ReminderKind,
    /// When the reminder fires again.
    pub next_notification: DateTime<Utc>,
}

fn meter_number(meters: &[Meter], meter_id: Uuid) -> String {
    meters
        .iter()
        .find(|m| m.id == meter_id)
        .map_or_else(|| "Unknown".to_owned(), |m| m.number.clone())
}

impl AppStore {
    pub async fn list_reminders(&self) -> Vec<Reminder> {
        self.inner.read().await.reminders.clone()
    }

    /// Enabled reminders due at `now`.
    pub async fn due_reminders(&self, now: DateTime<Utc>) -> Vec<Reminder> {
        let state = self.inner.read().await;
        schedule::check_due_reminders(&state.reminders, now)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Create a reminder for an existing meter. It first fires one period
    /// from now.
    pub async fn create_reminder(&self, actor: &User, input: ReminderInput) -> StoreResult<Reminder> {
        let mut state = self.inner.write().await;
        if !state.meters.iter().any(|m| m.id == input.meter_id) {
            return Err(StoreError::not_found("meter"));
        }

        let reminder = Reminder {
            id: Uuid::new_v4(),
            meter_id: input.meter_id,
            kind: input.kind,
            enabled: input.enabled,
            last_notified: None,
            next_notification: schedule::calculate_next_notification(input.kind, None),
            created_by: actor.id,
        };
        state.reminders.push(reminder.clone());

        let number = meter_number(&state.meters, reminder.meter_id);
        state.activities.record(
            actor,
            ActivityAction::Create,
            EntityType::Reminder,
            format!("Created {} reminder for meter {number}", reminder.kind),
            Some(reminder.id),
        );
        self.persist(&state, &[Collection::Reminders, Collection::Activities])
            .await?;

        Ok(reminder)
    }

    /// Replace a reminder's settings. The schedule restarts from now.
    pub async fn update_reminder(&self, actor: &User, id: Uuid, input: ReminderInput) -> StoreResult<Reminder> {
        let mut state = self.inner.write().await;
        if !state.meters.iter().any(|m| m.id == input.meter_id) {
            return Err(StoreError::not_found("meter"));
        }

        let reminder = state
            .reminders
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::not_found("reminder"))?;
        reminder.meter_id = input.meter_id;
        reminder.kind = input.kind;
        reminder.enabled = input.enabled;
        reminder.next_notification = schedule::calculate_next_notification(input.kind, None);
        let updated = reminder.clone();

        let number = meter_number(&state.meters, updated.meter_id);
        state.activities.record(
            actor,
            ActivityAction::Update,
            EntityType::Reminder,
            format!("Updated {} reminder for meter {number}", updated.kind),
            Some(id),
        );
        self.persist(&state, &[Collection::Reminders, Collection::Activities])
            .await?;

        Ok(updated)
    }

    pub async fn delete_reminder(&self, actor: &User, id: Uuid) -> StoreResult<Reminder> {
        let mut state = self.inner.write().await;
        let index = state
            .reminders
            .iter()
            .position(|r| r.id == id)
            .ok_or(StoreError::not_found("reminder"))?;
        let removed = state.reminders.remove(index);

        let number = meter_number(&state.meters, removed.meter_id);
        state.activities.record(
            actor,
            ActivityAction::Delete,
            EntityType::Reminder,
            format!("Deleted {} reminder for meter {number}", removed.kind),
            Some(id),
        );
        self.persist(&state, &[Collection::Reminders, Collection::Activities])
            .await?;

        Ok(removed)
    }

    /// Advance every reminder due at `now` whose meter still exists.
    ///
    /// Fired reminders get `last_notified = now` and their next date one
    /// period after `now`. Reminders pointing at a missing meter are left
    /// as they are.
    pub async fn fire_due_reminders(&self, now: DateTime<Utc>) -> StoreResult<Vec<DueNotification>> {
        let mut guard = self.inner.write().await;
        let state = &mut *guard;

        let mut fired = Vec::new();
        for reminder in state
            .reminders
            .iter_mut()
            .filter(|r| r.enabled && r.next_notification <= now)
        {
            let Some(meter) = state.meters.iter().find(|m| m.id == reminder.meter_id) else {
                continue;
            };
            reminder.last_notified = Some(now);
            reminder.next_notification = schedule::calculate_next_notification_at(reminder.kind, Some(now), now);

            fired.push(DueNotification {
                reminder_id: reminder.id,
                meter_id: meter.id,
                meter_number: meter.number.clone(),
                meter_description: meter.description.clone(),
                kind: reminder.kind,
                next_notification: reminder.next_notification,
            });
        }

        if !fired.is_empty() {
            self.persist(state, &[Collection::Reminders]).await?;
        }
        Ok(fired)
    }
}

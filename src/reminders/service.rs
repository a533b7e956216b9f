use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time;
use tracing::{debug, error, info};

use crate::{
    error::StoreResult,
    store::{AppStore, DueNotification},
};

/// Periodically fires due reminders.
///
/// A fired reminder is reported as a structured `info!` event and its next
/// notification is pushed one period ahead.
pub struct ReminderService {
    store: AppStore,
    interval: Duration,
}

impl ReminderService {
    pub fn new(store: AppStore, interval_secs: u64) -> Self {
        Self {
            store,
            interval: Duration::from_secs(interval_secs.max(1)),
        }
    }

    /// Runs the reminder loop indefinitely.
    /// Spawn this via `tokio::spawn`.
    pub async fn run(self) {
        info!(interval_secs = self.interval.as_secs(), "Reminder loop started");
        let mut ticker = time::interval(self.interval);

        loop {
            ticker.tick().await;
            if let Err(e) = self.run_once(Utc::now()).await {
                error!(error = %e, "Reminder loop iteration failed");
            }
        }
    }

    /// One check at `now`. Returns the reminders that fired.
    pub async fn run_once(&self, now: DateTime<Utc>) -> StoreResult<Vec<DueNotification>> {
        if !self.store.settings().await.notifications.enabled {
            debug!("Notifications disabled; skipping reminder check");
            return Ok(Vec::new());
        }

        let fired = self.store.fire_due_reminders(now).await?;
        for n in &fired {
            info!(
                reminder_id = %n.reminder_id,
                meter_id = %n.meter_id,
                kind = %n.kind,
                next_notification = %n.next_notification,
                "Meter reading reminder: time to read meter {} - {}",
                n.meter_number,
                n.meter_description
            );
        }
        Ok(fired)
    }
}
